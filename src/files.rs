// files.rs — Supported-format table, per-category size limits, and the
// validator that turns a user-selected path into an `AttachedFile`.
//
// Validation is pure and synchronous. The workflow calls it again right
// before every upload, since the file may have changed since it was picked.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

const MIB: u64 = 1024 * 1024;

/// Broad file categories. Size limits apply per category, not per extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Audio,
    Video,
    Image,
    Document,
    Code,
}

impl FileCategory {
    pub const ALL: [FileCategory; 5] = [
        Self::Video,
        Self::Audio,
        Self::Document,
        Self::Code,
        Self::Image,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Image => "image",
            Self::Document => "document",
            Self::Code => "code",
        }
    }

    /// Maximum accepted size in bytes (inclusive).
    pub fn max_size(&self) -> u64 {
        match self {
            Self::Audio | Self::Video => 300 * MIB,
            Self::Image => 10 * MIB,
            Self::Document | Self::Code => 50 * MIB,
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// (extension, content type, category). Extensions are lowercase, no dot.
const SUPPORTED_FORMATS: &[(&str, &str, FileCategory)] = &[
    ("mp3", "audio/mpeg", FileCategory::Audio),
    ("wav", "audio/wav", FileCategory::Audio),
    ("mp4", "video/mp4", FileCategory::Video),
    ("webm", "video/webm", FileCategory::Video),
    ("png", "image/png", FileCategory::Image),
    ("jpeg", "image/jpeg", FileCategory::Image),
    ("jpg", "image/jpeg", FileCategory::Image),
    ("ico", "image/x-icon", FileCategory::Image),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        FileCategory::Document,
    ),
    ("pdf", "application/pdf", FileCategory::Document),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        FileCategory::Document,
    ),
    ("txt", "text/plain", FileCategory::Document),
    ("py", "text/x-python", FileCategory::Code),
    ("ts", "application/typescript", FileCategory::Code),
    ("php", "application/x-php", FileCategory::Code),
    ("html", "text/html", FileCategory::Code),
    ("css", "text/css", FileCategory::Code),
    ("js", "application/javascript", FileCategory::Code),
    ("java", "text/x-java-source", FileCategory::Code),
    ("cpp", "text/x-c++src", FileCategory::Code),
    ("c", "text/x-csrc", FileCategory::Code),
    ("cs", "text/x-csharp", FileCategory::Code),
];

/// Look up an extension (any case, leading dot tolerated).
pub fn lookup_extension(ext: &str) -> Option<(&'static str, FileCategory)> {
    let ext = ext.trim_start_matches('.').to_ascii_lowercase();
    SUPPORTED_FORMATS
        .iter()
        .find(|(e, _, _)| *e == ext)
        .map(|(_, mime, category)| (*mime, *category))
}

/// All supported extensions, in table order. Used for file-picker filters.
pub fn supported_extensions() -> Vec<&'static str> {
    SUPPORTED_FORMATS.iter().map(|(e, _, _)| *e).collect()
}

/// Human-readable summary of supported formats and their limits.
pub fn describe_supported() -> String {
    let mut lines = Vec::new();
    for category in FileCategory::ALL {
        let exts: Vec<&str> = SUPPORTED_FORMATS
            .iter()
            .filter(|(_, _, c)| *c == category)
            .map(|(e, _, _)| *e)
            .collect();
        lines.push(format!(
            "Supported {} formats: {} (up to {}MB)",
            category,
            exts.join(", "),
            category.max_size() / MIB
        ));
    }
    lines.join("\n")
}

/// A file that passed validation at the moment it was checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedFile {
    pub path: PathBuf,
    pub extension: String,
    pub content_type: String,
    pub category: FileCategory,
    pub size: u64,
}

impl AttachedFile {
    /// File name without directories, used as the multipart filename.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("upload.{}", self.extension))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("File does not exist: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("{} file exceeds {}MB limit", capitalize(.category.as_str()), .limit / MIB)]
    SizeExceeded { category: FileCategory, limit: u64 },
}

pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Classify and size-check `path`.
pub fn validate(path: impl AsRef<Path>) -> Result<AttachedFile, ValidationError> {
    let path = path.as_ref();

    let metadata = match std::fs::metadata(path) {
        Ok(m) if m.is_file() => m,
        _ => return Err(ValidationError::NotFound(path.to_path_buf())),
    };

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    let (content_type, category) = lookup_extension(&extension)
        .ok_or_else(|| ValidationError::UnsupportedFormat(extension.clone()))?;

    let size = metadata.len();
    let limit = category.max_size();
    if size > limit {
        return Err(ValidationError::SizeExceeded { category, limit });
    }

    Ok(AttachedFile {
        path: std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()),
        extension,
        content_type: content_type.to_string(),
        category,
        size,
    })
}
