//! The editing and refinement session controller.
//!
//! One [`Editor`] owns one project's session: the last fetched snapshot, the
//! per-section draft buffers and the in-flight flags. User input only touches
//! the drafts. Submitting a draft goes through a dispatcher that calls the
//! [`DocumentService`] and, once the service acknowledges, reloads the whole
//! snapshot rather than patching it locally.
//!
//! # Concurrency
//!
//! Every operation takes `&self` and the state lock is never held across a
//! remote call, so dispatches for different sections may be awaited together.
//! A reload that follows a mutation is sequenced after that mutation's
//! acknowledgement and therefore observes it. Between two concurrent
//! mutations there is no ordering: whichever reload completes last installs
//! its snapshot.
//!
//! # Failures
//!
//! Remote errors stop here. A failed first load is reported through
//! [`Editor::error`] and the view's `Failed` status; every other failure
//! leaves state as it was and raises an [`Alert`].

mod state;
mod view;

pub use state::{Alert, AlertKind, OperationFlags, MAX_ALERTS};
pub use view::{DocumentView, EditorView, SectionView, ViewStatus};

use std::path::PathBuf;
use std::sync::Arc;

use draftdesk_core::*;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::client::ClientError;
use crate::download::DownloadSink;
use crate::service::DocumentService;
use state::EditorState;

/// Shown when a load fails without a `detail` from the service.
pub const LOAD_FAILED: &str = "Failed to load project";

/// Result of fetching the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Failed(String),
    /// Another user-triggered load was already running.
    Skipped,
}

/// Why a dispatch did not reach the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The refinement draft was empty or whitespace-only.
    EmptyDraft,
    /// The same operation is already outstanding.
    InFlight,
    /// The operation needs a snapshot and none has been loaded.
    NotLoaded,
}

/// Result of a refine or feedback dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The service accepted the change; `reload` reports the follow-up fetch.
    Completed { reload: LoadOutcome },
    Skipped(SkipReason),
    Failed(Alert),
}

/// Result of an export dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Saved(PathBuf),
    Skipped(SkipReason),
    Failed(Alert),
}

impl DispatchOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Editing session for one project.
pub struct Editor {
    project_id: ProjectId,
    service: Arc<dyn DocumentService>,
    sink: Arc<dyn DownloadSink>,
    state: Mutex<EditorState>,
}

/// Clears an in-flight flag when dropped, including when the owning future is
/// dropped mid-request.
struct InFlight<'a> {
    state: &'a Mutex<EditorState>,
    release: Option<Box<dyn FnOnce(&mut EditorState) + Send + 'a>>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            let mut state = self.state.lock();
            release(&mut *state);
        }
    }
}

impl Editor {
    /// Create an unmounted session. Call [`Editor::mount`] to fetch the project.
    pub fn new(
        project_id: ProjectId,
        service: Arc<dyn DocumentService>,
        sink: Arc<dyn DownloadSink>,
    ) -> Self {
        Self {
            project_id,
            service,
            sink,
            state: Mutex::new(EditorState::default()),
        }
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    fn in_flight(&self, release: impl FnOnce(&mut EditorState) + Send + 'static) -> InFlight<'_> {
        InFlight {
            state: &self.state,
            release: Some(Box::new(release)),
        }
    }

    // ============================================================
    // Session Loader
    // ============================================================

    /// Initial load. A failure here is what the view shows instead of the document.
    pub async fn mount(&self) -> LoadOutcome {
        self.reload().await
    }

    /// User-triggered refresh; skipped while another fetch is outstanding.
    pub async fn reload(&self) -> LoadOutcome {
        {
            let state = self.state.lock();
            if state.flags.is_loading() {
                debug!(project = %self.project_id, "reload skipped, load in flight");
                return LoadOutcome::Skipped;
            }
        }
        self.load().await
    }

    /// Fetch and install the snapshot. The only writer of the snapshot cache.
    async fn load(&self) -> LoadOutcome {
        self.state.lock().flags.begin_load();
        let guard = self.in_flight(|s| s.flags.end_load());

        let result = self.service.load_project(self.project_id).await;
        drop(guard);

        let mut state = self.state.lock();
        match result {
            Ok(project) => {
                state.replace_snapshot(project);
                debug!(
                    project = %self.project_id,
                    generation = state.generation,
                    "snapshot installed"
                );
                LoadOutcome::Loaded
            }
            Err(e) => {
                let message = e.detail().unwrap_or(LOAD_FAILED).to_string();
                warn!(project = %self.project_id, error = %e, "project load failed");
                if state.snapshot.is_some() {
                    state.raise(Alert::new(AlertKind::Reload, None, Some(message.clone())));
                }
                state.load_error = Some(message.clone());
                LoadOutcome::Failed(message)
            }
        }
    }

    // ============================================================
    // Refinement Dispatcher
    // ============================================================

    /// Submit the section's refinement draft.
    ///
    /// The draft is kept after success so the same instruction can be issued
    /// again.
    pub async fn refine(&self, section_id: SectionId) -> DispatchOutcome {
        let instruction = {
            let mut state = self.state.lock();
            let Some(instruction) = state.drafts.pending_refinement(section_id) else {
                debug!(section = %section_id, "refine skipped, empty instruction");
                return DispatchOutcome::Skipped(SkipReason::EmptyDraft);
            };
            if !state.flags.begin_refine(section_id) {
                return DispatchOutcome::Skipped(SkipReason::InFlight);
            }
            instruction
        };
        let guard = self.in_flight(move |s| s.flags.end_refine(section_id));

        let input = RefineInput { instruction };
        let result = self
            .service
            .refine_section(self.project_id, section_id, &input)
            .await;
        drop(guard);

        match result {
            Ok(()) => {
                info!(project = %self.project_id, section = %section_id, "section refined");
                let reload = self.load().await;
                DispatchOutcome::Completed { reload }
            }
            Err(e) => DispatchOutcome::Failed(self.raise(AlertKind::Refine, Some(section_id), &e)),
        }
    }

    // ============================================================
    // Feedback Dispatcher
    // ============================================================

    /// Submit a like or dislike with the section's comment draft.
    ///
    /// Repeated submissions are not deduplicated; each one counts.
    ///
    /// On success the comment draft is cleared only if it still holds the text
    /// that was sent. Unlike a plain clear, text typed while the request was in
    /// flight survives; with no concurrent edit the draft ends up empty.
    pub async fn feedback(&self, section_id: SectionId, action: FeedbackAction) -> DispatchOutcome {
        let (sent, comment) = {
            let mut state = self.state.lock();
            if !state.flags.begin_feedback(section_id) {
                return DispatchOutcome::Skipped(SkipReason::InFlight);
            }
            (
                state.drafts.comment(section_id).to_string(),
                state.drafts.pending_comment(section_id),
            )
        };
        let guard = self.in_flight(move |s| s.flags.end_feedback(section_id));

        let input = FeedbackInput { action, comment };
        let result = self
            .service
            .submit_feedback(self.project_id, section_id, &input)
            .await;
        drop(guard);

        match result {
            Ok(()) => {
                info!(
                    project = %self.project_id,
                    section = %section_id,
                    %action,
                    "feedback recorded"
                );
                // Compare-and-clear rather than an unconditional clear.
                if !self.state.lock().drafts.clear_comment_if(section_id, &sent) {
                    debug!(section = %section_id, "comment edited while sending, kept");
                }
                let reload = self.load().await;
                DispatchOutcome::Completed { reload }
            }
            Err(e) => {
                DispatchOutcome::Failed(self.raise(AlertKind::Feedback, Some(section_id), &e))
            }
        }
    }

    // ============================================================
    // Export Dispatcher
    // ============================================================

    /// Download the whole project as `project_<id>.<format>`.
    ///
    /// Reflects what the server has persisted, not local drafts, and does not
    /// touch the snapshot.
    pub async fn export(&self, format: ExportFormat) -> ExportOutcome {
        if !self.state.lock().flags.begin_export(format) {
            debug!(%format, "export skipped, another export in flight");
            return ExportOutcome::Skipped(SkipReason::InFlight);
        }
        let guard = self.in_flight(|s| s.flags.end_export());

        let result = self.service.export_project(self.project_id, format).await;
        drop(guard);

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => return ExportOutcome::Failed(self.raise(AlertKind::Export, None, &e)),
        };

        let file_name = export_file_name(self.project_id, format);
        let sink = Arc::clone(&self.sink);
        let delivered =
            tokio::task::spawn_blocking(move || sink.deliver(&file_name, &bytes)).await;
        let saved = match delivered {
            Ok(saved) => saved.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match saved {
            Ok(path) => {
                info!(project = %self.project_id, path = %path.display(), "export saved");
                ExportOutcome::Saved(path)
            }
            Err(e) => {
                warn!(project = %self.project_id, error = %e, "export could not be saved");
                let alert = Alert::new(AlertKind::Export, None, Some(e));
                self.state.lock().raise(alert.clone());
                ExportOutcome::Failed(alert)
            }
        }
    }

    /// Export in the project's own document type.
    pub async fn export_native(&self) -> ExportOutcome {
        let doc_type = self.state.lock().snapshot.as_ref().map(|p| p.doc_type);
        match doc_type {
            Some(doc_type) => self.export(doc_type.into()).await,
            None => ExportOutcome::Skipped(SkipReason::NotLoaded),
        }
    }

    fn raise(&self, kind: AlertKind, section_id: Option<SectionId>, error: &ClientError) -> Alert {
        warn!(
            project = %self.project_id,
            section = ?section_id,
            error = %error,
            "{}",
            kind.message()
        );
        let detail = error
            .detail()
            .map(str::to_string)
            .or_else(|| error.is_transport().then(|| error.to_string()));
        let alert = Alert::new(kind, section_id, detail);
        self.state.lock().raise(alert.clone());
        alert
    }

    // ============================================================
    // Draft Buffers
    // ============================================================

    pub fn set_refinement(&self, section_id: SectionId, text: impl Into<String>) {
        self.state.lock().drafts.set_refinement(section_id, text);
    }

    pub fn set_comment(&self, section_id: SectionId, text: impl Into<String>) {
        self.state.lock().drafts.set_comment(section_id, text);
    }

    pub fn refinement(&self, section_id: SectionId) -> String {
        self.state.lock().drafts.refinement(section_id).to_string()
    }

    pub fn comment(&self, section_id: SectionId) -> String {
        self.state.lock().drafts.comment(section_id).to_string()
    }

    /// A copy of every draft buffer. Later edits do not show up in it.
    pub fn drafts(&self) -> DraftStore {
        self.state.lock().drafts.clone()
    }

    // ============================================================
    // Snapshot, Flags and Alerts
    // ============================================================

    pub fn snapshot(&self) -> Option<Project> {
        self.state.lock().snapshot.clone()
    }

    /// Number of snapshots installed by this session.
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// The most recent load failure, cleared by the next successful load.
    pub fn error(&self) -> Option<String> {
        self.state.lock().load_error.clone()
    }

    pub fn flags(&self) -> OperationFlags {
        self.state.lock().flags.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().flags.is_loading()
    }

    pub fn exporting(&self) -> Option<ExportFormat> {
        self.state.lock().flags.exporting()
    }

    /// Pending alerts, oldest first. At most [`MAX_ALERTS`] are kept; callers
    /// that poll this repeatedly should drain with [`Editor::take_alerts`].
    pub fn alerts(&self) -> Vec<Alert> {
        self.state.lock().alerts.clone()
    }

    /// Drain pending alerts once they have been shown.
    pub fn take_alerts(&self) -> Vec<Alert> {
        std::mem::take(&mut self.state.lock().alerts)
    }

    pub fn view(&self) -> EditorView {
        let state = self.state.lock();
        EditorView::render(
            state.snapshot.as_ref(),
            &state.drafts,
            &state.flags,
            state.load_error.as_deref(),
            &state.alerts,
        )
    }
}
