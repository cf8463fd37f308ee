//! Integration tests for the summarize / follow-up workflow using a scripted
//! backend. Fully deterministic — no network, no API key.
//!
//! Run: cargo test --test workflow_test

use ai_summarizer::ai::prompt::Persona;
use ai_summarizer::ai::{
    ContentHandle, GenerateRequest, GenerateResponse, GenerativeBackend, QueryError,
};
use ai_summarizer::files::AttachedFile;
use ai_summarizer::workflow::export_response;
use ai_summarizer::QueryWorkflow;
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const MIB: u64 = 1024 * 1024;

// ---------------------------------------------------------------------------
// Mock backend
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ScriptedBackend {
    uploads: Mutex<VecDeque<Result<ContentHandle, QueryError>>>,
    generations: Mutex<VecDeque<Result<GenerateResponse, QueryError>>>,
    uploaded: Mutex<Vec<AttachedFile>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedBackend {
    fn upload_ok(self, handle: &str) -> Self {
        self.uploads
            .lock()
            .unwrap()
            .push_back(Ok(ContentHandle(handle.into())));
        self
    }

    fn upload_err(self, err: QueryError) -> Self {
        self.uploads.lock().unwrap().push_back(Err(err));
        self
    }

    fn text(self, text: &str) -> Self {
        let resp = serde_json::from_value(json!({
            "candidates": [ { "content": { "parts": [ { "text": text } ] } } ]
        }))
        .unwrap();
        self.generations.lock().unwrap().push_back(Ok(resp));
        self
    }

    fn generate_err(self, err: QueryError) -> Self {
        self.generations.lock().unwrap().push_back(Err(err));
        self
    }

    fn upload_count(&self) -> usize {
        self.uploaded.lock().unwrap().len()
    }

    fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeBackend for ScriptedBackend {
    async fn upload(&self, file: &AttachedFile) -> Result<ContentHandle, QueryError> {
        self.uploaded.lock().unwrap().push(file.clone());
        self.uploads
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(QueryError::Unexpected("no scripted upload".into())))
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, QueryError> {
        self.requests.lock().unwrap().push(request.clone());
        self.generations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(QueryError::Unexpected("no scripted generation".into())))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn workflow(backend: &Arc<ScriptedBackend>) -> QueryWorkflow {
    QueryWorkflow::new(backend.clone(), Persona::default())
}

fn sized_file(dir: &Path, name: &str, size: u64) -> PathBuf {
    let path = dir.join(name);
    File::create(&path).unwrap().set_len(size).unwrap();
    path
}

fn file_uri(request: &GenerateRequest) -> String {
    let value = serde_json::to_value(request).unwrap();
    value["contents"][0]["parts"][1]["fileData"]["fileUri"]
        .as_str()
        .unwrap()
        .to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

/// PNG under the image limit → "A cat." → follow-up "What color?" → "Orange."
#[tokio::test]
async fn summarize_then_follow_up_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let png = sized_file(dir.path(), "cat.png", 5 * MIB);
    let backend = Arc::new(
        ScriptedBackend::default()
            .upload_ok("h1")
            .text("A cat.")
            .upload_ok("h2")
            .text("Orange."),
    );
    let wf = workflow(&backend);

    let mut state = wf.summarize(&png, "Describe this image").await.unwrap();
    assert_eq!(state.response_text(), "A cat.");
    assert_eq!(state.handle().as_str(), "h1");
    assert_eq!(state.prompt(), "Describe this image");
    assert_eq!(state.file().content_type, "image/png");
    assert!(state.follow_ups().is_empty());

    let answer = wf.follow_up(&mut state, "What color?").await.unwrap();
    assert_eq!(answer, "Orange.");
    assert_eq!(state.response_text(), "Orange.");
    assert_eq!(state.handle().as_str(), "h2");
    assert_eq!(state.follow_ups().len(), 1);
    assert_eq!(state.follow_ups()[0].prompt, "What color?");
    assert_eq!(state.follow_ups()[0].response, "Orange.");

    // Each call uploads again and references its own handle.
    assert_eq!(backend.upload_count(), 2);
    let requests = backend.requests();
    assert_eq!(file_uri(&requests[0]), "h1");
    assert_eq!(file_uri(&requests[1]), "h2");

    // The follow-up prompt carries the previous response as context.
    assert!(requests[0].text().contains("**User Prompt**: Describe this image"));
    assert!(requests[1].text().contains("**Previous Summary**: A cat."));
    assert!(requests[1].text().contains("**User Prompt**: What color?"));
}

/// Upload without a handle → UploadFailed and no generation request.
#[tokio::test]
async fn upload_without_handle_skips_generation() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = sized_file(dir.path(), "doc.pdf", 1024);
    let backend = Arc::new(
        ScriptedBackend::default()
            .upload_err(QueryError::UploadFailed("response carried no file URI".into())),
    );

    let err = workflow(&backend).summarize(&pdf, "Summarize").await.unwrap_err();
    assert!(matches!(err, QueryError::UploadFailed(_)));
    assert!(backend.requests().is_empty());
}

/// Empty generated text → EmptyResponse, no conversation created.
#[tokio::test]
async fn empty_generation_is_empty_response() {
    let dir = tempfile::tempdir().unwrap();
    let txt = sized_file(dir.path(), "notes.txt", 10);
    let backend = Arc::new(ScriptedBackend::default().upload_ok("h1").text(""));

    let result = workflow(&backend).summarize(&txt, "Summarize").await;
    assert!(matches!(result, Err(QueryError::EmptyResponse)));
}

/// Validation failures surface before any network call.
#[tokio::test]
async fn invalid_files_never_reach_backend() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(ScriptedBackend::default());
    let wf = workflow(&backend);

    let exe = sized_file(dir.path(), "tool.exe", 10);
    assert!(matches!(
        wf.summarize(&exe, "go").await,
        Err(QueryError::UnsupportedFormat(ext)) if ext == "exe"
    ));

    let huge = sized_file(dir.path(), "big.jpg", 10 * MIB + 1);
    assert!(matches!(
        wf.summarize(&huge, "go").await,
        Err(QueryError::SizeExceeded { .. })
    ));

    assert!(matches!(
        wf.summarize(dir.path().join("missing.mp3"), "go").await,
        Err(QueryError::NotFound(_))
    ));

    assert_eq!(backend.upload_count(), 0);
    assert!(backend.requests().is_empty());
}

/// A blank summarize prompt is rejected locally.
#[tokio::test]
async fn blank_summary_prompt_is_prompt_required() {
    let dir = tempfile::tempdir().unwrap();
    let png = sized_file(dir.path(), "a.png", 10);
    let backend = Arc::new(ScriptedBackend::default());

    let err = workflow(&backend).summarize(&png, "   ").await.unwrap_err();
    assert_eq!(err, QueryError::PromptRequired);
    assert_eq!(backend.upload_count(), 0);
}

/// Whitespace-only and over-long follow-ups fail without network calls;
/// exactly 1000 characters goes through.
#[tokio::test]
async fn follow_up_prompt_limits() {
    let dir = tempfile::tempdir().unwrap();
    let png = sized_file(dir.path(), "a.png", 10);
    let backend = Arc::new(
        ScriptedBackend::default()
            .upload_ok("h1")
            .text("Summary")
            .upload_ok("h2")
            .text("Answer"),
    );
    let wf = workflow(&backend);
    let mut state = wf.summarize(&png, "Summarize").await.unwrap();
    let uploads_before = backend.upload_count();

    for blank in ["", "   ", "\n\t"] {
        assert_eq!(
            wf.follow_up(&mut state, blank).await,
            Err(QueryError::PromptRequired)
        );
    }
    let too_long = "x".repeat(1001);
    assert!(matches!(
        wf.follow_up(&mut state, &too_long).await,
        Err(QueryError::PromptTooLong { len: 1001, max: 1000 })
    ));
    assert_eq!(backend.upload_count(), uploads_before);
    assert!(state.follow_ups().is_empty());

    let exact = "y".repeat(1000);
    assert_eq!(wf.follow_up(&mut state, &exact).await.unwrap(), "Answer");
    assert_eq!(state.follow_ups().len(), 1);
}

/// A failed follow-up leaves the conversation exactly as it was.
#[tokio::test]
async fn failed_follow_up_does_not_mutate_state() {
    let dir = tempfile::tempdir().unwrap();
    let mp3 = sized_file(dir.path(), "talk.mp3", 2048);
    let backend = Arc::new(
        ScriptedBackend::default()
            .upload_ok("h1")
            .text("Transcript")
            .upload_ok("h2")
            .generate_err(QueryError::RateLimited)
            .upload_ok("h3")
            .text(""),
    );
    let wf = workflow(&backend);
    let mut state = wf.summarize(&mp3, "Transcribe").await.unwrap();

    assert_eq!(
        wf.follow_up(&mut state, "Who spoke?").await,
        Err(QueryError::RateLimited)
    );
    assert_eq!(
        wf.follow_up(&mut state, "Who spoke?").await,
        Err(QueryError::EmptyResponse)
    );

    assert_eq!(state.response_text(), "Transcript");
    assert_eq!(state.handle().as_str(), "h1");
    assert!(state.follow_ups().is_empty());
}

/// The file is re-validated before each follow-up upload.
#[tokio::test]
async fn follow_up_revalidates_file() {
    let dir = tempfile::tempdir().unwrap();
    let png = sized_file(dir.path(), "a.png", 10);
    let backend = Arc::new(ScriptedBackend::default().upload_ok("h1").text("Summary"));
    let wf = workflow(&backend);
    let mut state = wf.summarize(&png, "Summarize").await.unwrap();

    std::fs::remove_file(&png).unwrap();
    assert!(matches!(
        wf.follow_up(&mut state, "More?").await,
        Err(QueryError::NotFound(_))
    ));

    // Grown past the image limit since it was attached.
    sized_file(dir.path(), "a.png", 10 * MIB + 1);
    assert!(matches!(
        wf.follow_up(&mut state, "More?").await,
        Err(QueryError::SizeExceeded { .. })
    ));
    assert_eq!(backend.upload_count(), 1);
}

/// Remote errors pass through untouched and are not retried.
#[tokio::test]
async fn remote_errors_surface_once() {
    let dir = tempfile::tempdir().unwrap();
    let mp4 = sized_file(dir.path(), "clip.mp4", 100);
    let backend = Arc::new(
        ScriptedBackend::default()
            .upload_err(QueryError::Unauthorized("API key not valid".into())),
    );

    let err = workflow(&backend).summarize(&mp4, "Summarize").await.unwrap_err();
    assert_eq!(err, QueryError::Unauthorized("API key not valid".into()));
    assert_eq!(backend.upload_count(), 1);
}

/// Regenerate replaces the summary and clears follow-ups; export writes it out.
#[tokio::test]
async fn regenerate_and_export() {
    let dir = tempfile::tempdir().unwrap();
    let code = sized_file(dir.path(), "main.py", 300);
    let backend = Arc::new(
        ScriptedBackend::default()
            .upload_ok("h1")
            .text("First take")
            .upload_ok("h2")
            .text("Answer")
            .upload_ok("h3")
            .text("Second take"),
    );
    let wf = workflow(&backend);
    let mut state = wf.summarize(&code, "Explain this code").await.unwrap();
    wf.follow_up(&mut state, "Any bugs?").await.unwrap();

    let text = wf.regenerate(&mut state).await.unwrap();
    assert_eq!(text, "Second take");
    assert_eq!(state.handle().as_str(), "h3");
    assert_eq!(state.prompt(), "Explain this code");
    assert!(state.follow_ups().is_empty());
    assert!(backend.requests()[2]
        .text()
        .contains("**User Prompt**: Explain this code"));

    let out = dir.path().join("summary.txt");
    export_response(&state, &out).unwrap();
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "Second take");
}
