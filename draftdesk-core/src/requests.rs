use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{DocType, ProjectId};

/// Returned when a string names neither `docx` nor `pptx`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown document format '{0}', expected 'docx' or 'pptx'")]
pub struct UnknownFormat(pub String);

/// Body of a section refinement request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefineInput {
    /// Natural-language instruction, sent exactly as typed.
    pub instruction: String,
}

/// Body of a section feedback request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackInput {
    pub action: FeedbackAction,
    /// Serialized as `null` when the user left no comment.
    pub comment: Option<String>,
}

/// Like and dislike are independent counters on the server, not a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackAction {
    Like,
    Dislike,
}

impl FeedbackAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Dislike => "dislike",
        }
    }
}

impl fmt::Display for FeedbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary rendition requested from the export endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Docx,
    Pptx,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Pptx => "pptx",
        }
    }

    /// File extension of the downloaded artifact.
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    /// MIME type the export endpoint answers with.
    pub fn media_type(&self) -> &'static str {
        match self {
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "docx" => Ok(Self::Docx),
            "pptx" => Ok(Self::Pptx),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

impl From<DocType> for ExportFormat {
    fn from(doc_type: DocType) -> Self {
        match doc_type {
            DocType::Docx => Self::Docx,
            DocType::Pptx => Self::Pptx,
        }
    }
}

/// Name of the downloaded file: `project_<id>.<format>`.
pub fn export_file_name(project_id: ProjectId, format: ExportFormat) -> String {
    format!("project_{}.{}", project_id, format.extension())
}
