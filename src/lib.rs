//! Accessible file summarizer: validate a local file, upload it to a
//! generative-AI service, and hold a follow-up conversation about it.
//!
//! Presentation layers (screen-reader plugins, dialogs, the bundled CLI)
//! call [`files::validate`], [`workflow::QueryWorkflow`] and the task
//! helpers in [`query_task`], and render `ConversationState::response_text`.

pub mod ai;
pub mod connectivity;
pub mod files;
pub mod query_task;
pub mod settings;
pub mod workflow;

pub use ai::{ErrorKind, GenerativeBackend, QueryError};
pub use files::{validate, AttachedFile, FileCategory, ValidationError};
pub use settings::Settings;
pub use workflow::{ConversationState, FollowUpExchange, Phase, QueryWorkflow};
