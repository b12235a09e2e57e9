//! Presentation core of the ChatPane desktop client.
//!
//! The crate holds everything the chat window does that is worth testing
//! without a window: the append-only transcript, the compose buffer, the
//! one-shot connect gate and the outbound request pipeline that hands work to
//! an external [`ChatController`].

use thiserror::Error;

pub mod compose;
pub mod controller;
pub mod emoji;
pub mod image_render;
pub mod outbound;
pub mod session;
pub mod surface;
pub mod transcript;

pub use compose::ComposeBuffer;
pub use controller::ChatController;
pub use emoji::{EMOJI_PALETTE, is_palette_emoji};
pub use image_render::{ScaledImage, decode_scaled};
pub use outbound::{MessageBody, OutboundRequest};
pub use session::{SessionGate, SessionState};
pub use surface::ChatSurface;
pub use transcript::{Transcript, TranscriptEntry, TranscriptView};

/// Width, in logical pixels, every inline image is scaled to.
pub const IMAGE_DISPLAY_WIDTH: u32 = 200;
/// Upper bound for an image file picked from disk.
pub const MAX_IMAGE_FILE_BYTES: u64 = 16 * 1024 * 1024;
/// Decoded images wider or taller than this are treated as undecodable.
pub const MAX_DECODE_DIMENSION: u32 = 8192;

pub const IMAGE_ERROR_NOTICE: &str = "[Error displaying image]";
pub const IMAGE_FILE_ERROR_PREFIX: &str = "Error reading image file: ";

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("image payload is empty")]
    EmptyImage,
    #[error("image format not recognised")]
    UnrecognizedImage,
    #[error("{0}")]
    ImageDecode(String),
    #[error("{0}")]
    ImageFile(#[from] std::io::Error),
    #[error("image file too large: {size} bytes (max {max})")]
    ImageTooLarge { size: u64, max: u64 },
    #[error("message body must not be empty")]
    EmptyMessage,
    #[error("username must not be empty")]
    EmptyUsername,
    #[error("already connected as {0}")]
    AlreadyConnected(String),
    #[error("{0:?} is not in the emoji palette")]
    UnknownEmoji(String),
}
