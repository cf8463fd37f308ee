// query_task.rs — Runs workflow calls on tokio tasks so a UI thread never blocks.
//
// Each spawn returns a `QueryTask`: a phase receiver the presentation layer
// can watch (Uploading → Generating → Completed | Failed) and a join handle
// for the outcome. Follow-up and regenerate tasks take the conversation by
// value and hand it back, so two calls can never race on one conversation.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::ai::QueryError;
use crate::workflow::{ConversationState, Phase, QueryWorkflow};

/// Result of a follow-up or regenerate task. `state` is unchanged when
/// `result` is an error.
#[derive(Debug)]
pub struct ContinuationOutcome {
    pub state: ConversationState,
    pub result: Result<String, QueryError>,
}

/// A workflow call running in the background.
pub struct QueryTask<T> {
    phases: mpsc::UnboundedReceiver<Phase>,
    last_phase: Phase,
    handle: JoinHandle<T>,
}

impl<T> QueryTask<T> {
    fn new(phases: mpsc::UnboundedReceiver<Phase>, handle: JoinHandle<T>) -> Self {
        Self {
            phases,
            last_phase: Phase::Idle,
            handle,
        }
    }

    /// Next phase update, or `None` once the task has finished reporting.
    pub async fn next_phase(&mut self) -> Option<Phase> {
        let phase = self.phases.recv().await?;
        self.last_phase = phase;
        Some(phase)
    }

    /// Most recent phase seen through `next_phase`.
    pub fn last_phase(&self) -> Phase {
        self.last_phase
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the outcome. A panicked task surfaces as `Unexpected`.
    pub async fn wait(self) -> Result<T, QueryError> {
        self.handle.await.map_err(|e| {
            log::error!("Query task ended abnormally: {}", e);
            QueryError::Unexpected(format!("query task failed: {}", e))
        })
    }
}

pub fn spawn_summarize(
    workflow: Arc<QueryWorkflow>,
    path: impl Into<PathBuf>,
    prompt: impl Into<String>,
) -> QueryTask<Result<ConversationState, QueryError>> {
    let path = path.into();
    let prompt = prompt.into();
    let (tx, rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(async move {
        log::info!("Summarize task started for {}", path.display());
        workflow
            .summarize_with_progress(&path, &prompt, Some(&tx))
            .await
    });
    QueryTask::new(rx, handle)
}

pub fn spawn_follow_up(
    workflow: Arc<QueryWorkflow>,
    mut state: ConversationState,
    prompt: impl Into<String>,
) -> QueryTask<ContinuationOutcome> {
    let prompt = prompt.into();
    let (tx, rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(async move {
        let result = workflow
            .follow_up_with_progress(&mut state, &prompt, Some(&tx))
            .await;
        ContinuationOutcome { state, result }
    });
    QueryTask::new(rx, handle)
}

pub fn spawn_regenerate(
    workflow: Arc<QueryWorkflow>,
    mut state: ConversationState,
) -> QueryTask<ContinuationOutcome> {
    let (tx, rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(async move {
        let result = workflow
            .regenerate_with_progress(&mut state, Some(&tx))
            .await;
        ContinuationOutcome { state, result }
    });
    QueryTask::new(rx, handle)
}
