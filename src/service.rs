//! The remote operations the editor depends on.

use async_trait::async_trait;
use draftdesk_core::*;

use crate::client::ClientError;

/// Remote document service as seen by the editor.
///
/// The editor only talks to the service through this trait. [`DocumentClient`]
/// is the HTTP implementation; tests substitute in-memory fakes. Timeouts are
/// the implementation's business and surface as ordinary errors.
///
/// [`DocumentClient`]: crate::client::DocumentClient
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Fetch the full snapshot of a project owned by the caller.
    async fn load_project(&self, id: ProjectId) -> Result<Project, ClientError>;

    /// Rewrite one section according to a natural-language instruction.
    async fn refine_section(
        &self,
        project_id: ProjectId,
        section_id: SectionId,
        input: &RefineInput,
    ) -> Result<(), ClientError>;

    /// Record a like or dislike (and optional comment) against a section.
    async fn submit_feedback(
        &self,
        project_id: ProjectId,
        section_id: SectionId,
        input: &FeedbackInput,
    ) -> Result<(), ClientError>;

    /// Render the whole project in the requested format.
    async fn export_project(
        &self,
        project_id: ProjectId,
        format: ExportFormat,
    ) -> Result<Vec<u8>, ClientError>;
}
