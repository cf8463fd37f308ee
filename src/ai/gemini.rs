use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

use super::{ContentHandle, GenerateRequest, GenerateResponse, GenerativeBackend, QueryError, UploadResponse};
use crate::files::AttachedFile;
use crate::settings::Settings;

pub const DEFAULT_UPLOAD_URL: &str = "https://generativelanguage.googleapis.com/upload/v1beta/files";
pub const DEFAULT_GENERATE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-pro:generateContent";

const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_GENERATE_TIMEOUT: Duration = Duration::from_secs(60);

/// Gemini Files upload + `generateContent` client. The API key goes in the
/// `key` query parameter.
pub struct GeminiClient {
    api_key: String,
    upload_url: String,
    generate_url: String,
    upload_timeout: Duration,
    generate_timeout: Duration,
    client: Client,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        upload_url: impl Into<String>,
        generate_url: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            upload_url: upload_url.into(),
            generate_url: generate_url.into(),
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
            generate_timeout: DEFAULT_GENERATE_TIMEOUT,
            client: Client::new(),
        }
    }

    /// Swap in a preconfigured HTTP client (proxy settings, TLS roots).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_timeouts(mut self, upload: Duration, generate: Duration) -> Self {
        self.upload_timeout = upload;
        self.generate_timeout = generate;
        self
    }

    /// Build a client from settings. Fails with `Unauthorized` when no API
    /// key is configured, before any request is made.
    pub fn from_settings(settings: &Settings) -> Result<Self, QueryError> {
        if settings.api_key.trim().is_empty() {
            return Err(QueryError::Unauthorized(
                "no API key configured; set apiKey in settings or GEMINI_API_KEY".into(),
            ));
        }
        Ok(Self::new(
            settings.api_key.trim(),
            &settings.upload_url,
            &settings.generate_url,
        )
        .with_timeouts(
            Duration::from_secs(settings.upload_timeout_secs),
            Duration::from_secs(settings.generate_timeout_secs),
        ))
    }

    fn endpoint_url(&self, base: &str) -> Result<Url, QueryError> {
        Url::parse_with_params(base, &[("key", self.api_key.as_str())])
            .map_err(|e| QueryError::Unexpected(format!("invalid endpoint URL {base}: {e}")))
    }
}

/// Map a non-success HTTP status to an error kind.
fn classify_status(status: StatusCode, body: &str) -> QueryError {
    match status.as_u16() {
        400 => QueryError::BadRequest(error_message(body)),
        401 | 403 => QueryError::Unauthorized(error_message(body)),
        429 => QueryError::RateLimited,
        _ => QueryError::Unexpected(format!("HTTP {}: {}", status, error_message(body))),
    }
}

/// Pull `error.message` out of a Google API error body, falling back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

fn classify_transport(err: reqwest::Error) -> QueryError {
    if err.is_builder() {
        QueryError::Unexpected(err.to_string())
    } else {
        QueryError::NetworkError(err.without_url().to_string())
    }
}

async fn read_success_body(response: reqwest::Response) -> Result<String, QueryError> {
    let status = response.status();
    // A connection dropped mid-body reports as a decode error; it is still transport.
    let body = response
        .text()
        .await
        .map_err(|e| QueryError::NetworkError(e.without_url().to_string()))?;
    if !status.is_success() {
        let err = classify_status(status, &body);
        log::error!("Gemini request failed with HTTP {}: {}", status, err);
        return Err(err);
    }
    Ok(body)
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn upload(&self, file: &AttachedFile) -> Result<ContentHandle, QueryError> {
        let url = self.endpoint_url(&self.upload_url)?;

        let bytes = tokio::fs::read(&file.path).await.map_err(|e| {
            QueryError::UploadFailed(format!("cannot read {}: {}", file.path.display(), e))
        })?;
        log::info!(
            "Uploading {} ({} bytes, {}) to {}",
            file.file_name(),
            bytes.len(),
            file.content_type,
            self.upload_url
        );

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file.file_name())
            .mime_str(&file.content_type)
            .map_err(|e| QueryError::UploadFailed(format!("MIME error: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(url)
            .timeout(self.upload_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(classify_transport)?;

        let body = read_success_body(response).await?;
        let parsed: UploadResponse = serde_json::from_str(&body)
            .map_err(|e| QueryError::UploadFailed(format!("unreadable upload response: {}", e)))?;
        let handle = parsed.handle()?;
        log::info!("Upload complete: {}", handle);
        Ok(handle)
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, QueryError> {
        let url = self.endpoint_url(&self.generate_url)?;
        log::debug!(
            "Requesting generation from {} ({} prompt chars)",
            self.generate_url,
            request.text().chars().count()
        );

        let response = self
            .client
            .post(url)
            .timeout(self.generate_timeout)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(classify_transport)?;

        let body = read_success_body(response).await?;
        log::debug!("Generation response received ({} bytes)", body.len());
        serde_json::from_str(&body).map_err(|e| {
            QueryError::Unexpected(format!("unparseable generation response: {}; body: {}", e, body))
        })
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
