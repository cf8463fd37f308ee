use async_trait::async_trait;

use crate::files::AttachedFile;

pub mod gemini;
pub mod prompt;
pub mod types;
pub use types::*;

/// Remote generative service (Gemini, or a stub in tests).
/// The workflow drives it with one upload followed by one generation per call.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Send the file's bytes and return a handle to the stored content.
    async fn upload(&self, file: &AttachedFile) -> Result<ContentHandle, QueryError>;

    /// Run one generation request and return the decoded response.
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, QueryError>;

    /// Backend name for logging/display
    fn name(&self) -> &str;
}
