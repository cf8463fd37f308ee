use serde::{Deserialize, Serialize};

use crate::files::{capitalize, FileCategory, ValidationError};

/// Maximum follow-up prompt length in characters.
pub const MAX_FOLLOW_UP_CHARS: usize = 1000;

/// Opaque server-side reference to uploaded file bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentHandle(pub String);

impl ContentHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error type for every workflow call. Each variant surfaces once; nothing
/// is retried automatically.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error("File does not exist: {0}")]
    NotFound(String),
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("{} file exceeds {}MB limit", capitalize(.category.as_str()), .limit / (1024 * 1024))]
    SizeExceeded { category: FileCategory, limit: u64 },
    #[error("Failed to upload file: {0}")]
    UploadFailed(String),
    #[error("No response generated. The file content may not be supported.")]
    EmptyResponse,
    #[error("Please enter a prompt")]
    PromptRequired,
    #[error("Prompt is too long ({len} characters). Please keep it under {max} characters.")]
    PromptTooLong { len: usize, max: usize },
    #[error("Invalid API key. Please configure a valid API key. ({0})")]
    Unauthorized(String),
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,
    #[error("Invalid file or request format. Please check the file and try again. ({0})")]
    BadRequest(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Stable category of a `QueryError`, for presentation layers that pick a
/// title or sound per failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    UnsupportedFormat,
    SizeExceeded,
    UploadFailed,
    EmptyResponse,
    PromptRequired,
    PromptTooLong,
    Unauthorized,
    RateLimited,
    BadRequest,
    NetworkError,
    Unexpected,
}

impl QueryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            Self::SizeExceeded { .. } => ErrorKind::SizeExceeded,
            Self::UploadFailed(_) => ErrorKind::UploadFailed,
            Self::EmptyResponse => ErrorKind::EmptyResponse,
            Self::PromptRequired => ErrorKind::PromptRequired,
            Self::PromptTooLong { .. } => ErrorKind::PromptTooLong,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::RateLimited => ErrorKind::RateLimited,
            Self::BadRequest(_) => ErrorKind::BadRequest,
            Self::NetworkError(_) => ErrorKind::NetworkError,
            Self::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    /// True for errors caused by the local input rather than the remote
    /// service. Repeating the call without changing the input fails the same way.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::NotFound
                | ErrorKind::UnsupportedFormat
                | ErrorKind::SizeExceeded
                | ErrorKind::PromptRequired
                | ErrorKind::PromptTooLong
        )
    }
}

impl From<ValidationError> for QueryError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::NotFound(path) => Self::NotFound(path.display().to_string()),
            ValidationError::UnsupportedFormat(ext) => Self::UnsupportedFormat(ext),
            ValidationError::SizeExceeded { category, limit } => {
                Self::SizeExceeded { category, limit }
            }
        }
    }
}

// ── Wire types ──────────────────────────────────────────────────────

/// Fixed sampling parameters. Not user-configurable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

pub const GENERATION_CONFIG: GenerationConfig = GenerationConfig {
    temperature: 0.7,
    top_p: 0.95,
    max_output_tokens: 1024,
};

/// One `generateContent` request: a single user turn with a text part and
/// a file reference part.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

impl GenerateRequest {
    pub fn new(text: String, handle: &ContentHandle, mime_type: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![
                    Part::Text { text },
                    Part::FileData {
                        file_data: FileData {
                            file_uri: handle.0.clone(),
                            mime_type: mime_type.to_string(),
                        },
                    },
                ],
            }],
            generation_config: GENERATION_CONFIG,
        }
    }

    /// The prompt text carried by the request.
    pub fn text(&self) -> &str {
        self.contents
            .iter()
            .flat_map(|c| c.parts.iter())
            .find_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                Part::FileData { .. } => None,
            })
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    pub file_uri: String,
    pub mime_type: String,
}

/// `generateContent` response. Everything is optional so that partial or
/// blocked responses still decode and can be reported as `EmptyResponse`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

impl GenerateResponse {
    /// Text of the first candidate's first part.
    pub fn first_text(&self) -> Result<String, QueryError> {
        let text = self
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .and_then(|p| p.text.clone())
            .unwrap_or_default();

        if text.is_empty() {
            if let Some(reason) = self
                .prompt_feedback
                .as_ref()
                .and_then(|f| f.block_reason.as_deref())
            {
                log::warn!("Generation blocked: {}", reason);
            } else if let Some(reason) = self
                .candidates
                .first()
                .and_then(|c| c.finish_reason.as_deref())
            {
                log::warn!("Generation finished without text: {}", reason);
            }
            return Err(QueryError::EmptyResponse);
        }
        Ok(text)
    }
}

/// Upload response: `{"file": {"uri": ..., ...}}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub file: Option<UploadedFile>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

impl UploadResponse {
    pub fn handle(&self) -> Result<ContentHandle, QueryError> {
        self.file
            .as_ref()
            .and_then(|f| f.uri.as_deref())
            .filter(|uri| !uri.is_empty())
            .map(|uri| ContentHandle(uri.to_string()))
            .ok_or_else(|| QueryError::UploadFailed("response carried no file URI".into()))
    }
}
