//! What the editor surface shows, derived from session state alone.

use std::fmt;

use draftdesk_core::*;

use super::state::{Alert, OperationFlags};

/// A render-ready picture of the session.
///
/// Built by [`EditorView::render`] from the snapshot cache, the draft buffers
/// and the operation flags; it holds no other state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorView {
    pub status: ViewStatus,
    /// A fetch is outstanding while a snapshot is already shown.
    pub reloading: bool,
    /// Export triggers are disabled while this is set.
    pub exporting: Option<ExportFormat>,
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewStatus {
    /// Nothing to show yet.
    Loading,
    /// The first load failed; shown in place of the document.
    Failed(String),
    Ready(DocumentView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentView {
    pub title: String,
    pub doc_type: DocType,
    pub topic: Option<String>,
    pub outline: Vec<OutlineEntry>,
    pub sections: Vec<SectionView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionView {
    pub id: SectionId,
    pub number: usize,
    /// `"<number>. <title>"`
    pub heading: String,
    pub anchor: String,
    pub content: String,
    pub likes: u32,
    pub dislikes: u32,
    pub refinement_draft: String,
    pub comment_draft: String,
    pub refining: bool,
    pub sending_feedback: bool,
}

impl EditorView {
    pub fn render(
        snapshot: Option<&Project>,
        drafts: &DraftStore,
        flags: &OperationFlags,
        load_error: Option<&str>,
        alerts: &[Alert],
    ) -> Self {
        let status = match (snapshot, load_error) {
            (Some(project), _) => ViewStatus::Ready(DocumentView::render(project, drafts, flags)),
            (None, Some(error)) if !flags.is_loading() => ViewStatus::Failed(error.to_string()),
            (None, _) => ViewStatus::Loading,
        };

        Self {
            reloading: snapshot.is_some() && flags.is_loading(),
            status,
            exporting: flags.exporting(),
            alerts: alerts.to_vec(),
        }
    }

    pub fn document(&self) -> Option<&DocumentView> {
        match self.status {
            ViewStatus::Ready(ref doc) => Some(doc),
            _ => None,
        }
    }

    /// Whether export buttons should accept a click.
    pub fn can_export(&self) -> bool {
        self.document().is_some() && self.exporting.is_none()
    }
}

impl DocumentView {
    fn render(project: &Project, drafts: &DraftStore, flags: &OperationFlags) -> Self {
        let sections = project
            .sections
            .iter()
            .enumerate()
            .map(|(i, s)| SectionView {
                id: s.id,
                number: i + 1,
                heading: format!("{}. {}", i + 1, s.title),
                anchor: s.anchor(),
                content: s.content.clone(),
                likes: s.likes,
                dislikes: s.dislikes,
                refinement_draft: drafts.refinement(s.id).to_string(),
                comment_draft: drafts.comment(s.id).to_string(),
                refining: flags.is_refining(s.id),
                sending_feedback: flags.is_sending_feedback(s.id),
            })
            .collect();

        Self {
            title: project.title.clone(),
            doc_type: project.doc_type,
            topic: project.topic.clone().filter(|t| !t.is_empty()),
            outline: project.outline(),
            sections,
        }
    }

    pub fn section(&self, id: SectionId) -> Option<&SectionView> {
        self.sections.iter().find(|s| s.id == id)
    }
}

impl fmt::Display for EditorView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            ViewStatus::Loading => writeln!(f, "Loading document...")?,
            ViewStatus::Failed(ref error) => writeln!(f, "{}", error)?,
            ViewStatus::Ready(ref doc) => write!(f, "{}", doc)?,
        }
        for alert in &self.alerts {
            writeln!(f, "! {}", alert)?;
        }
        Ok(())
    }
}

impl fmt::Display for DocumentView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.title, self.doc_type)?;
        if let Some(ref topic) = self.topic {
            writeln!(f, "Topic: {}", topic)?;
        }
        for section in &self.sections {
            writeln!(f)?;
            writeln!(f, "{}", section.heading)?;
            writeln!(f, "{}", section.content)?;
            writeln!(f, "  likes {} | dislikes {}", section.likes, section.dislikes)?;
            if !section.refinement_draft.is_empty() {
                writeln!(f, "  refine draft: {}", section.refinement_draft)?;
            }
            if !section.comment_draft.is_empty() {
                writeln!(f, "  comment draft: {}", section.comment_draft)?;
            }
        }
        Ok(())
    }
}
