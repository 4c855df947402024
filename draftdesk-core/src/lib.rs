//! Domain models for draftdesk.
//!
//! # Core Concepts
//!
//! ## Server-authoritative entities
//!
//! - [`Project`]: A user's document-generation unit with an ordered list of sections
//!   and a target [`DocType`]. Only ever replaced wholesale by a fresh snapshot.
//! - [`Section`]: One addressable unit of content (a prose section for `docx`, a slide
//!   for `pptx`) with its like/dislike counters.
//!
//! ## Local-only entities
//!
//! These never leave the editing session unless explicitly submitted:
//!
//! - [`DraftStore`]: Per-section refinement instructions and feedback comments.
//! - [`RefineInput`] / [`FeedbackInput`]: Request bodies built from drafts at submit time.

mod drafts;
mod ids;
mod project;
mod requests;

pub use drafts::*;
pub use ids::*;
pub use project::*;
pub use requests::*;
