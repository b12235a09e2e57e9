use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{app_data_dir, with_retry};

/// `ui_state.json` only holds a window rectangle; anything bigger is corrupt.
pub const MAX_UI_STATE_BYTES: u64 = 64 * 1024;

pub const DEFAULT_WINDOW_W: f32 = 520.0;
pub const DEFAULT_WINDOW_H: f32 = 550.0;
pub const MIN_WINDOW_W: f32 = 400.0;
pub const MIN_WINDOW_H: f32 = 360.0;

/// Chat window position and inner size, in logical points.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct WindowPlacement {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SavedUiState {
    #[serde(default)]
    pub window: Option<WindowPlacement>,
}

/// Failure reading or writing `ui_state.json`.
#[derive(Debug)]
pub enum UiStateError {
    Io {
        action: &'static str,
        path: PathBuf,
        source: io::Error,
    },
    TooLarge { size: u64 },
    Json(serde_json::Error),
}

impl UiStateError {
    fn io(action: &'static str, path: &Path) -> impl FnOnce(io::Error) -> Self {
        let path = path.to_path_buf();
        move |source| UiStateError::Io {
            action,
            path,
            source,
        }
    }
}

impl std::fmt::Display for UiStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UiStateError::Io {
                action,
                path,
                source,
            } => write!(f, "could not {action} {}: {source}", path.display()),
            UiStateError::TooLarge { size } => write!(
                f,
                "window state is {size} bytes, over the {MAX_UI_STATE_BYTES} byte limit"
            ),
            UiStateError::Json(e) => write!(f, "window state is not valid JSON: {e}"),
        }
    }
}

impl std::error::Error for UiStateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UiStateError::Io { source, .. } => Some(source),
            UiStateError::Json(e) => Some(e),
            UiStateError::TooLarge { .. } => None,
        }
    }
}

pub fn ui_state_path() -> PathBuf {
    app_data_dir().join("ui_state.json")
}

pub fn load_ui_state_from_path(path: &Path) -> Result<SavedUiState, UiStateError> {
    let size = fs::metadata(path)
        .map_err(UiStateError::io("stat", path))?
        .len();
    if size > MAX_UI_STATE_BYTES {
        return Err(UiStateError::TooLarge { size });
    }

    let data = fs::read_to_string(path).map_err(UiStateError::io("read", path))?;
    serde_json::from_str(&data).map_err(UiStateError::Json)
}

/// Missing or unreadable state falls back to defaults.
pub fn load_ui_state() -> SavedUiState {
    load_ui_state_from_path(&ui_state_path()).unwrap_or_default()
}

pub fn save_ui_state_to_path(path: &Path, state: &SavedUiState) -> Result<(), UiStateError> {
    let tmp = path.with_extension("json.tmp");
    let payload = serde_json::to_string_pretty(state).map_err(UiStateError::Json)?;
    fs::write(&tmp, payload.as_bytes()).map_err(UiStateError::io("write", &tmp))?;

    if path.exists() {
        let _ = fs::remove_file(path);
    }

    fs::rename(&tmp, path).map_err(UiStateError::io("replace", path))
}

pub fn save_ui_state_with_retry(state: &SavedUiState) -> Result<(), UiStateError> {
    let path = ui_state_path();
    with_retry(|| save_ui_state_to_path(&path, state))
}

/// Keep a restored window inside the monitor `[left, top, right, bottom]`.
///
/// Size is clamped between the minimum window size and the monitor minus
/// `margin` on each side; position is clamped so the whole window is visible.
pub fn clamp_placement_in_rect(
    placement: WindowPlacement,
    min_w: f32,
    min_h: f32,
    margin: f32,
    rect: [f32; 4],
) -> WindowPlacement {
    let [left, top, right, bottom] = rect;
    let max_w = (right - left - margin * 2.0).max(min_w);
    let max_h = (bottom - top - margin * 2.0).max(min_h);

    let w = sanitize(placement.w, min_w).clamp(min_w, max_w);
    let h = sanitize(placement.h, min_h).clamp(min_h, max_h);

    let x = sanitize(placement.x, left).clamp(left, (right - w).max(left));
    let y = sanitize(placement.y, top).clamp(top, (bottom - h).max(top));

    WindowPlacement { x, y, w, h }
}

fn sanitize(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}
