// workflow.rs — Upload → generate → extract, plus follow-up continuation.
//
// Every call re-validates the file and re-uploads it; content handles are
// never reused across calls. `ConversationState` is owned by the caller and
// only changes when a call succeeds.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::ai::prompt::{build_follow_up_prompt, build_summary_prompt, Persona};
use crate::ai::{ContentHandle, GenerateRequest, GenerativeBackend, QueryError, MAX_FOLLOW_UP_CHARS};
use crate::files::{self, AttachedFile};

/// Per-call progress. Calls are independent; there is no cross-call state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Uploading,
    Generating,
    Completed,
    Failed,
}

/// One follow-up question and the answer it produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowUpExchange {
    pub prompt: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

/// Conversation about one attached file.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationState {
    file: AttachedFile,
    handle: ContentHandle,
    prompt: String,
    response_text: String,
    follow_ups: Vec<FollowUpExchange>,
}

impl ConversationState {
    pub fn file(&self) -> &AttachedFile {
        &self.file
    }

    pub fn handle(&self) -> &ContentHandle {
        &self.handle
    }

    /// The prompt the conversation started with.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Latest generated text (summary, or the last follow-up answer).
    pub fn response_text(&self) -> &str {
        &self.response_text
    }

    pub fn follow_ups(&self) -> &[FollowUpExchange] {
        &self.follow_ups
    }
}

/// Sink for phase updates. `None` means nobody is listening.
pub type PhaseSender = mpsc::UnboundedSender<Phase>;

fn report(progress: Option<&PhaseSender>, phase: Phase) {
    if let Some(tx) = progress {
        let _ = tx.send(phase);
    }
}

/// Check a follow-up prompt and return it trimmed.
pub fn check_follow_up_prompt(prompt: &str) -> Result<&str, QueryError> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(QueryError::PromptRequired);
    }
    let len = trimmed.chars().count();
    if len > MAX_FOLLOW_UP_CHARS {
        return Err(QueryError::PromptTooLong {
            len,
            max: MAX_FOLLOW_UP_CHARS,
        });
    }
    Ok(trimmed)
}

/// One parameterised workflow: the backend and persona are injected, so
/// product variants differ only in configuration.
pub struct QueryWorkflow {
    backend: Arc<dyn GenerativeBackend>,
    persona: Persona,
}

impl QueryWorkflow {
    pub fn new(backend: Arc<dyn GenerativeBackend>, persona: Persona) -> Self {
        Self { backend, persona }
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Validate, upload, generate. Returns a fresh conversation on success.
    pub async fn summarize(
        &self,
        path: impl AsRef<Path>,
        user_prompt: &str,
    ) -> Result<ConversationState, QueryError> {
        self.summarize_with_progress(path.as_ref(), user_prompt, None)
            .await
    }

    pub async fn summarize_with_progress(
        &self,
        path: &Path,
        user_prompt: &str,
        progress: Option<&PhaseSender>,
    ) -> Result<ConversationState, QueryError> {
        let result = self.run_summary(path, user_prompt, progress).await;
        finish(progress, &result);
        result
    }

    async fn run_summary(
        &self,
        path: &Path,
        user_prompt: &str,
        progress: Option<&PhaseSender>,
    ) -> Result<ConversationState, QueryError> {
        if user_prompt.trim().is_empty() {
            return Err(QueryError::PromptRequired);
        }
        let file = files::validate(path)?;
        let handle = self.upload(&file, progress).await?;

        let text = build_summary_prompt(&self.persona, user_prompt);
        let response_text = self.generate(text, &handle, &file, progress).await?;

        log::info!(
            "Summary generated for {} ({} chars)",
            file.file_name(),
            response_text.chars().count()
        );
        Ok(ConversationState {
            file,
            handle,
            prompt: user_prompt.to_string(),
            response_text,
            follow_ups: Vec::new(),
        })
    }

    /// Ask a follow-up about the same file. Updates `state` only on success.
    pub async fn follow_up(
        &self,
        state: &mut ConversationState,
        follow_up_prompt: &str,
    ) -> Result<String, QueryError> {
        self.follow_up_with_progress(state, follow_up_prompt, None)
            .await
    }

    pub async fn follow_up_with_progress(
        &self,
        state: &mut ConversationState,
        follow_up_prompt: &str,
        progress: Option<&PhaseSender>,
    ) -> Result<String, QueryError> {
        let result = self.run_follow_up(state, follow_up_prompt, progress).await;
        finish(progress, &result);
        let (handle, prompt, response) = result?;

        state.handle = handle;
        state.response_text = response.clone();
        state.follow_ups.push(FollowUpExchange {
            prompt,
            response: response.clone(),
            timestamp: Utc::now(),
        });
        log::info!("Follow-up #{} answered", state.follow_ups.len());
        Ok(response)
    }

    async fn run_follow_up(
        &self,
        state: &ConversationState,
        follow_up_prompt: &str,
        progress: Option<&PhaseSender>,
    ) -> Result<(ContentHandle, String, String), QueryError> {
        let prompt = check_follow_up_prompt(follow_up_prompt)?;
        let file = files::validate(&state.file.path)?;
        let handle = self.upload(&file, progress).await?;

        let text = build_follow_up_prompt(&self.persona, &state.response_text, prompt);
        let response = self.generate(text, &handle, &file, progress).await?;
        Ok((handle, prompt.to_string(), response))
    }

    /// Re-run the original prompt against the same file. On success the
    /// summary and handle are replaced and the follow-up history is cleared.
    pub async fn regenerate(&self, state: &mut ConversationState) -> Result<String, QueryError> {
        self.regenerate_with_progress(state, None).await
    }

    pub async fn regenerate_with_progress(
        &self,
        state: &mut ConversationState,
        progress: Option<&PhaseSender>,
    ) -> Result<String, QueryError> {
        let path = state.file.path.clone();
        let fresh = self
            .summarize_with_progress(&path, &state.prompt, progress)
            .await?;
        *state = fresh;
        Ok(state.response_text.clone())
    }

    async fn upload(
        &self,
        file: &AttachedFile,
        progress: Option<&PhaseSender>,
    ) -> Result<ContentHandle, QueryError> {
        report(progress, Phase::Uploading);
        self.backend.upload(file).await
    }

    async fn generate(
        &self,
        text: String,
        handle: &ContentHandle,
        file: &AttachedFile,
        progress: Option<&PhaseSender>,
    ) -> Result<String, QueryError> {
        report(progress, Phase::Generating);
        let request = GenerateRequest::new(text, handle, &file.content_type);
        let response = self.backend.generate(&request).await?;
        response.first_text()
    }
}

fn finish<T>(progress: Option<&PhaseSender>, result: &Result<T, QueryError>) {
    match result {
        Ok(_) => report(progress, Phase::Completed),
        Err(e) => {
            log::warn!("Query failed: {}", e);
            report(progress, Phase::Failed);
        }
    }
}

/// Write the latest response to `path` as UTF-8 text.
pub fn export_response(state: &ConversationState, path: &Path) -> std::io::Result<PathBuf> {
    std::fs::write(path, state.response_text.as_bytes())?;
    log::info!("Response exported to {}", path.display());
    Ok(path.to_path_buf())
}
