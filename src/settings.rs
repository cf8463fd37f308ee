use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ai::gemini::{DEFAULT_GENERATE_URL, DEFAULT_UPLOAD_URL};
use crate::ai::prompt::Persona;

/// Environment variable that overrides `apiKey` from the settings file.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Settings I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("No configuration directory available on this platform")]
    NoConfigDir,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_upload_url")]
    pub upload_url: String,
    #[serde(default = "default_generate_url")]
    pub generate_url: String,
    #[serde(default = "default_upload_timeout")]
    pub upload_timeout_secs: u64,
    #[serde(default = "default_generate_timeout")]
    pub generate_timeout_secs: u64,
    #[serde(default = "default_connectivity_host")]
    pub connectivity_host: String,
    #[serde(default = "default_connectivity_timeout")]
    pub connectivity_timeout_secs: u64,
    #[serde(default)]
    pub persona: Persona,
}

fn default_upload_url() -> String {
    DEFAULT_UPLOAD_URL.into()
}
fn default_generate_url() -> String {
    DEFAULT_GENERATE_URL.into()
}
fn default_upload_timeout() -> u64 {
    30
}
fn default_generate_timeout() -> u64 {
    60
}
fn default_connectivity_host() -> String {
    "www.google.com:80".into()
}
fn default_connectivity_timeout() -> u64 {
    5
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            upload_url: default_upload_url(),
            generate_url: default_generate_url(),
            upload_timeout_secs: default_upload_timeout(),
            generate_timeout_secs: default_generate_timeout(),
            connectivity_host: default_connectivity_host(),
            connectivity_timeout_secs: default_connectivity_timeout(),
            persona: Persona::default(),
        }
    }
}

/// `<config dir>/ai-summarizer/settings.toml`
pub fn default_config_path() -> Result<PathBuf, SettingsError> {
    let dir = dirs::config_dir().ok_or(SettingsError::NoConfigDir)?;
    Ok(dir.join("ai-summarizer").join("settings.toml"))
}

impl Settings {
    /// Load settings from `path`, or defaults when the file does not exist.
    /// `GEMINI_API_KEY` overrides the stored key either way.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let mut settings = Self::read_file(path)?;
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                settings.api_key = key;
            }
        }
        Ok(settings)
    }

    fn read_file(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            log::debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(io_err)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
