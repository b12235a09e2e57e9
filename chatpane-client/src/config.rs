use std::{
    fs, io,
    path::{Path, PathBuf},
};

use clap::Parser;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{app_data_dir, with_retry};

pub const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:8080/ws";
pub const MAX_SERVER_URL_LEN: usize = 2048;
pub const MAX_RECEIVER_LEN: usize = 128;
pub const MAX_CONFIG_BYTES: u64 = 64 * 1024;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "chatpane", about = "Desktop chat window")]
pub struct ClientArgs {
    /// WebSocket endpoint of the chat server. Defaults to the saved value.
    #[arg(long)]
    pub server_url: Option<String>,

    /// Join immediately with this username.
    #[arg(long)]
    pub username: Option<String>,

    /// Pre-fill the receiver field.
    #[arg(long)]
    pub receiver: Option<String>,

    /// Do not write the merged settings back to disk.
    #[arg(long, default_value_t = false)]
    pub no_save: bool,
}

/// What is persisted between runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavedClientConfig {
    pub server_url: String,
    #[serde(default)]
    pub receiver: String,
}

impl Default for SavedClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_owned(),
            receiver: String::new(),
        }
    }
}

/// Settings in effect for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub server_url: String,
    pub receiver: String,
    pub username: Option<String>,
}

impl ClientConfig {
    pub fn to_saved(&self) -> SavedClientConfig {
        SavedClientConfig {
            server_url: self.server_url.clone(),
            receiver: self.receiver.clone(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigLoadError {
    Metadata(io::Error),
    TooLarge { size: u64, max: u64 },
    Read(io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigLoadError::Metadata(e) => write!(f, "metadata read failed: {e}"),
            ConfigLoadError::TooLarge { size, max } => {
                write!(f, "file too large: {size} bytes (max {max})")
            }
            ConfigLoadError::Read(e) => write!(f, "read failed: {e}"),
            ConfigLoadError::Parse(e) => write!(f, "parse failed: {e}"),
            ConfigLoadError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigLoadError::Metadata(e) | ConfigLoadError::Read(e) => Some(e),
            ConfigLoadError::Parse(e) => Some(e),
            ConfigLoadError::TooLarge { .. } | ConfigLoadError::Invalid(_) => None,
        }
    }
}

#[derive(Debug)]
pub enum ConfigSaveError {
    Invalid(String),
    Serialize(serde_json::Error),
    WriteTmp(io::Error),
    Rename(io::Error),
}

impl std::fmt::Display for ConfigSaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSaveError::Invalid(msg) => write!(f, "refusing to save invalid config: {msg}"),
            ConfigSaveError::Serialize(e) => write!(f, "serialize failed: {e}"),
            ConfigSaveError::WriteTmp(e) => write!(f, "tmp write failed: {e}"),
            ConfigSaveError::Rename(e) => write!(f, "rename failed: {e}"),
        }
    }
}

impl std::error::Error for ConfigSaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigSaveError::Serialize(e) => Some(e),
            ConfigSaveError::WriteTmp(e) | ConfigSaveError::Rename(e) => Some(e),
            ConfigSaveError::Invalid(_) => None,
        }
    }
}

pub fn config_path() -> PathBuf {
    app_data_dir().join("config.json")
}

/// Check every field and report all problems at once.
pub fn validate_saved_config(cfg: &SavedClientConfig) -> Result<(), String> {
    let mut errors: Vec<String> = Vec::new();

    let server_url = cfg.server_url.trim();
    if server_url.is_empty() {
        errors.push("Server URL is required.".to_string());
    } else if server_url.len() > MAX_SERVER_URL_LEN {
        errors.push(format!(
            "Server URL is too long ({} > {} chars).",
            server_url.len(),
            MAX_SERVER_URL_LEN
        ));
    } else {
        match Url::parse(server_url) {
            Ok(url) => {
                let scheme = url.scheme();
                if scheme != "ws" && scheme != "wss" {
                    errors.push(
                        "Server URL must start with ws:// or wss:// (WebSocket).".to_string(),
                    );
                }
            }
            Err(err) => {
                errors.push(format!("Server URL is invalid: {err}"));
            }
        }
    }

    if cfg.receiver.len() > MAX_RECEIVER_LEN {
        errors.push(format!(
            "Receiver is too long ({} > {} chars).",
            cfg.receiver.len(),
            MAX_RECEIVER_LEN
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "Please fix the following:\n\n- {}",
            errors.join("\n- ")
        ))
    }
}

/// `Ok(None)` when no config has been saved yet.
pub fn load_config_from_path(path: &Path) -> Result<Option<SavedClientConfig>, ConfigLoadError> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(ConfigLoadError::Metadata(err)),
    };
    if meta.len() > MAX_CONFIG_BYTES {
        return Err(ConfigLoadError::TooLarge {
            size: meta.len(),
            max: MAX_CONFIG_BYTES,
        });
    }

    let data = fs::read_to_string(path).map_err(ConfigLoadError::Read)?;
    let cfg: SavedClientConfig = serde_json::from_str(&data).map_err(ConfigLoadError::Parse)?;
    validate_saved_config(&cfg).map_err(ConfigLoadError::Invalid)?;
    Ok(Some(cfg))
}

pub fn save_config_to_path(path: &Path, cfg: &SavedClientConfig) -> Result<(), ConfigSaveError> {
    validate_saved_config(cfg).map_err(ConfigSaveError::Invalid)?;

    let tmp = path.with_extension("json.tmp");
    let payload = serde_json::to_string_pretty(cfg).map_err(ConfigSaveError::Serialize)?;
    fs::write(&tmp, payload.as_bytes()).map_err(ConfigSaveError::WriteTmp)?;

    if path.exists() {
        let _ = fs::remove_file(path);
    }
    fs::rename(&tmp, path).map_err(ConfigSaveError::Rename)
}

pub fn save_config_with_retry(path: &Path, cfg: &SavedClientConfig) -> Result<(), ConfigSaveError> {
    validate_saved_config(cfg).map_err(ConfigSaveError::Invalid)?;
    with_retry(|| save_config_to_path(path, cfg))
}

/// Command line first, then the saved file, then built-in defaults.
pub fn resolve_config(
    args: &ClientArgs,
    saved: Option<SavedClientConfig>,
) -> Result<ClientConfig, String> {
    let saved = saved.unwrap_or_default();

    let cfg = ClientConfig {
        server_url: args
            .server_url
            .as_deref()
            .map(str::trim)
            .map(str::to_owned)
            .unwrap_or(saved.server_url),
        receiver: args.receiver.clone().unwrap_or(saved.receiver),
        username: args
            .username
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned),
    };

    validate_saved_config(&cfg.to_saved())?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_reports_every_problem() {
        let cfg = SavedClientConfig {
            server_url: "http://example.com/chat".to_owned(),
            receiver: "r".repeat(MAX_RECEIVER_LEN + 1),
        };
        let err = validate_saved_config(&cfg).unwrap_err();
        assert!(err.contains("ws:// or wss://"), "{err}");
        assert!(err.contains("Receiver is too long"), "{err}");
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate_saved_config(&SavedClientConfig::default()).is_ok());
    }

    #[test]
    fn save_does_not_retry_invalid_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        let cfg = SavedClientConfig {
            server_url: String::new(),
            receiver: String::new(),
        };

        let err = save_config_with_retry(&path, &cfg).unwrap_err();
        assert!(matches!(err, ConfigSaveError::Invalid(_)));
        assert!(!path.exists());
    }
}
