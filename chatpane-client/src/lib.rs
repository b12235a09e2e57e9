use std::{fs, path::PathBuf, time::Duration};

pub mod bridge;
pub mod config;
pub mod logging;
pub mod runtime;
pub mod ui_state;
pub mod wire;

pub const APP_DIR_NAME: &str = "ChatPane";

/// Directory holding `config.json`, `ui_state.json` and `logs/`.
///
/// `CHATPANE_CONFIG_DIR` overrides the platform location.
pub fn app_data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("CHATPANE_CONFIG_DIR") {
        let dir = PathBuf::from(override_dir);
        let _ = fs::create_dir_all(&dir);
        return dir;
    }

    let base = std::env::var_os("LOCALAPPDATA")
        .or_else(|| std::env::var_os("XDG_CONFIG_HOME"))
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .unwrap_or_else(|| PathBuf::from("."));
    let dir = base.join(APP_DIR_NAME);
    let _ = fs::create_dir_all(&dir);
    dir
}

/// Run `op` up to three times with 50 ms, 100 ms backoff between attempts.
pub(crate) fn with_retry<T, E>(mut op: impl FnMut() -> Result<T, E>) -> Result<T, E> {
    const MAX_ATTEMPTS: u32 = 3;
    const BACKOFF_BASE_MS: u64 = 50;

    let mut attempt: u32 = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= MAX_ATTEMPTS => return Err(err),
            Err(_) => {
                let backoff_ms = BACKOFF_BASE_MS.saturating_mul(1_u64 << (attempt - 1));
                std::thread::sleep(Duration::from_millis(backoff_ms));
                attempt += 1;
            }
        }
    }
}
