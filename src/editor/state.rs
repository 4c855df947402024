//! Session-owned state: snapshot cache, draft buffers, operation flags, alerts.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use draftdesk_core::*;

/// Which operation raised an [`Alert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Refine,
    Feedback,
    Export,
    /// A reload failed while an older snapshot was still on screen.
    Reload,
}

impl AlertKind {
    /// The user-facing headline for this kind of failure.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Refine => "Refinement failed",
            Self::Feedback => "Feedback failed",
            Self::Export => "Export failed",
            Self::Reload => "Reload failed",
        }
    }
}

/// A transient, non-blocking failure signal.
///
/// Alerts never replace the document; the view shows them alongside it until
/// the caller drains them with [`Editor::take_alerts`](super::Editor::take_alerts).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub section_id: Option<SectionId>,
    pub message: String,
    pub detail: Option<String>,
    pub raised_at: DateTime<Utc>,
}

impl Alert {
    pub fn new(kind: AlertKind, section_id: Option<SectionId>, detail: Option<String>) -> Self {
        Self {
            kind,
            section_id,
            message: kind.message().to_string(),
            detail,
            raised_at: Utc::now(),
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(section) = self.section_id {
            write!(f, " (section {})", section)?;
        }
        if let Some(ref detail) = self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}

/// Pending alerts kept per session. The view layer is expected to drain them
/// with `take_alerts` once shown; older ones are discarded past this limit.
pub const MAX_ALERTS: usize = 16;

/// In-flight request markers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationFlags {
    loads: usize,
    export: Option<ExportFormat>,
    refining: BTreeSet<SectionId>,
    sending_feedback: BTreeSet<SectionId>,
}

impl OperationFlags {
    /// True while any snapshot fetch is outstanding.
    pub fn is_loading(&self) -> bool {
        self.loads > 0
    }

    /// The format currently being exported, if any.
    pub fn exporting(&self) -> Option<ExportFormat> {
        self.export
    }

    pub fn is_refining(&self, id: SectionId) -> bool {
        self.refining.contains(&id)
    }

    pub fn is_sending_feedback(&self, id: SectionId) -> bool {
        self.sending_feedback.contains(&id)
    }

    pub(crate) fn begin_load(&mut self) {
        self.loads += 1;
    }

    pub(crate) fn end_load(&mut self) {
        self.loads = self.loads.saturating_sub(1);
    }

    /// Returns false if an export is already outstanding.
    pub(crate) fn begin_export(&mut self, format: ExportFormat) -> bool {
        if self.export.is_some() {
            return false;
        }
        self.export = Some(format);
        true
    }

    pub(crate) fn end_export(&mut self) {
        self.export = None;
    }

    /// Returns false if this section is already being refined.
    pub(crate) fn begin_refine(&mut self, id: SectionId) -> bool {
        self.refining.insert(id)
    }

    pub(crate) fn end_refine(&mut self, id: SectionId) {
        self.refining.remove(&id);
    }

    /// Returns false if feedback for this section is already outstanding.
    pub(crate) fn begin_feedback(&mut self, id: SectionId) -> bool {
        self.sending_feedback.insert(id)
    }

    pub(crate) fn end_feedback(&mut self, id: SectionId) {
        self.sending_feedback.remove(&id);
    }
}

/// Everything one editing session owns.
#[derive(Debug, Default)]
pub(crate) struct EditorState {
    pub snapshot: Option<Project>,
    pub drafts: DraftStore,
    pub load_error: Option<String>,
    pub flags: OperationFlags,
    pub alerts: Vec<Alert>,
    /// Number of snapshots installed so far.
    pub generation: u64,
}

impl EditorState {
    /// Install a fresh snapshot, discarding the previous one entirely.
    pub fn replace_snapshot(&mut self, project: Project) {
        self.snapshot = Some(project);
        self.load_error = None;
        self.generation += 1;
    }

    /// Queue an alert, dropping the oldest once [`MAX_ALERTS`] are pending.
    pub fn raise(&mut self, alert: Alert) {
        if self.alerts.len() >= MAX_ALERTS {
            let overflow = self.alerts.len() + 1 - MAX_ALERTS;
            self.alerts.drain(..overflow);
        }
        self.alerts.push(alert);
    }
}
