use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ProjectId, SectionId, UnknownFormat};

/// A project as last reported by the document service.
///
/// This is the full, server-authoritative snapshot. The editor never patches
/// it in place: every change arrives as a complete replacement fetched after
/// the mutating call succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    #[serde(default)]
    pub topic: Option<String>,
    pub doc_type: DocType,
    /// Ordered as the server returns them. The order is fixed at creation time
    /// and drives both sidebar navigation and document rendering.
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// One addressable unit of document content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub title: String,
    /// Plain text body, empty until the generation step has run.
    #[serde(default)]
    pub content: String,
    /// Position assigned in the outline at creation time.
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub dislikes: u32,
}

/// The kind of document a project produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    Docx,
    Pptx,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Pptx => "pptx",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocType {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "docx" => Ok(Self::Docx),
            "pptx" => Ok(Self::Pptx),
            other => Err(UnknownFormat(other.to_string())),
        }
    }
}

/// A numbered sidebar entry pointing at a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    pub section_id: SectionId,
    /// 1-based position in the project's section order.
    pub number: usize,
    pub label: String,
    pub anchor: String,
}

impl Project {
    /// Look up a section by id.
    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// Sidebar navigation entries, in section order.
    pub fn outline(&self) -> Vec<OutlineEntry> {
        self.sections
            .iter()
            .enumerate()
            .map(|(i, s)| OutlineEntry {
                section_id: s.id,
                number: i + 1,
                label: format!("{}. {}", i + 1, s.title),
                anchor: s.anchor(),
            })
            .collect()
    }
}

impl Section {
    /// Jump target used by the sidebar (`section-<id>`).
    pub fn anchor(&self) -> String {
        format!("section-{}", self.id)
    }
}
