use bytes::Bytes;
use tracing::{debug, warn};

use crate::{CoreError, IMAGE_DISPLAY_WIDTH, IMAGE_ERROR_NOTICE, ScaledImage, decode_scaled};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEntry {
    /// `sender` is `None` for lines produced locally, such as error notices.
    Text {
        sender: Option<String>,
        body: String,
    },
    Image {
        sender: String,
        image: ScaledImage,
    },
}

impl TranscriptEntry {
    pub fn sender(&self) -> Option<&str> {
        match self {
            TranscriptEntry::Text { sender, .. } => sender.as_deref(),
            TranscriptEntry::Image { sender, .. } => Some(sender),
        }
    }

    pub fn text_body(&self) -> Option<&str> {
        match self {
            TranscriptEntry::Text { body, .. } => Some(body),
            TranscriptEntry::Image { .. } => None,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, TranscriptEntry::Image { .. })
    }
}

/// The two operations a chat display has to support.
pub trait TranscriptView {
    fn append_text(&mut self, message: &str);
    fn append_image(&mut self, image_bytes: Bytes, sender: &str);
}

/// Ordered, append-only log of everything shown in the chat area.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    revision: u64,
    scroll_pending: bool,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bumped on every append.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns `true` once after one or more appends, telling the view to
    /// move to the newest entry.
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_pending)
    }

    pub fn append_text(&mut self, message: impl Into<String>) {
        self.push(TranscriptEntry::Text {
            sender: None,
            body: message.into(),
        });
    }

    pub fn append_message(&mut self, sender: impl Into<String>, body: impl Into<String>) {
        self.push(TranscriptEntry::Text {
            sender: Some(sender.into()),
            body: body.into(),
        });
    }

    /// Decode and append an image. A payload that does not decode becomes a
    /// text notice instead; this never fails.
    pub fn append_image(&mut self, image_bytes: Bytes, sender: impl Into<String>) {
        let sender = sender.into();
        match decode_scaled(&image_bytes, IMAGE_DISPLAY_WIDTH) {
            Ok(image) => {
                debug!(
                    sender = %sender,
                    width = image.width,
                    height = image.height,
                    "image appended"
                );
                self.push(TranscriptEntry::Image { sender, image });
            }
            Err(err) => {
                warn!(sender = %sender, bytes = image_bytes.len(), "image decode failed: {err}");
                self.append_text(image_error_notice(&err));
            }
        }
    }

    /// Plain-text rendering of the log, one block per entry.
    pub fn render_plain(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            match entry {
                TranscriptEntry::Text {
                    sender: Some(sender),
                    body,
                } => out.push_str(&format!("{sender}: {body}")),
                TranscriptEntry::Text { sender: None, body } => out.push_str(body),
                TranscriptEntry::Image { sender, image } => {
                    out.push_str(&format!("{sender}: [image {}x{}]", image.width, image.height));
                }
            }
            out.push_str("\n\n");
        }
        out
    }

    fn push(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
        self.revision += 1;
        self.scroll_pending = true;
    }
}

impl TranscriptView for Transcript {
    fn append_text(&mut self, message: &str) {
        Transcript::append_text(self, message);
    }

    fn append_image(&mut self, image_bytes: Bytes, sender: &str) {
        Transcript::append_image(self, image_bytes, sender);
    }
}

fn image_error_notice(err: &CoreError) -> String {
    match err {
        CoreError::EmptyImage | CoreError::UnrecognizedImage => IMAGE_ERROR_NOTICE.to_owned(),
        other => format!("[Error displaying image: {other}]"),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgba, RgbaImage};

    use super::*;

    fn tiny_png() -> Bytes {
        let img = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 255, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).expect("encode png");
        Bytes::from(out.into_inner())
    }

    #[test]
    fn appends_keep_insertion_order() {
        let mut transcript = Transcript::new();
        transcript.append_message("bob", "hi");
        transcript.append_text("notice");
        transcript.append_message("alice", "hello");

        let bodies: Vec<_> = transcript
            .entries()
            .iter()
            .filter_map(TranscriptEntry::text_body)
            .collect();
        assert_eq!(bodies, ["hi", "notice", "hello"]);
        assert_eq!(transcript.revision(), 3);
    }

    #[test]
    fn scroll_request_is_raised_once_per_batch() {
        let mut transcript = Transcript::new();
        assert!(!transcript.take_scroll_request());

        transcript.append_text("one");
        transcript.append_text("two");
        assert!(transcript.take_scroll_request());
        assert!(!transcript.take_scroll_request());

        transcript.append_image(Bytes::new(), "bob");
        assert!(transcript.take_scroll_request());
    }

    #[test]
    fn valid_image_becomes_scaled_image_entry() {
        let mut transcript = Transcript::new();
        transcript.append_image(tiny_png(), "bob");

        assert_eq!(transcript.len(), 1);
        match transcript.last() {
            Some(TranscriptEntry::Image { sender, image }) => {
                assert_eq!(sender, "bob");
                assert_eq!(image.width, IMAGE_DISPLAY_WIDTH);
            }
            other => panic!("unexpected entry: {other:?}"),
        }
    }

    #[test]
    fn image_wider_than_decode_limit_becomes_error_notice() {
        let img = RgbaImage::from_pixel(crate::MAX_DECODE_DIMENSION + 1, 1, Rgba([9, 9, 9, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).expect("encode png");

        let mut transcript = Transcript::new();
        transcript.append_image(Bytes::from(out.into_inner()), "bob");

        assert_eq!(transcript.len(), 1);
        let entry = transcript.last().expect("entry");
        assert!(!entry.is_image());
        let body = entry.text_body().expect("text entry");
        assert!(body.starts_with("[Error displaying image: "), "{body}");
    }

    #[test]
    fn malformed_image_becomes_single_error_notice() {
        let mut transcript = Transcript::new();
        transcript.append_image(Bytes::from_static(b"\x00\x01\x02"), "bob");
        transcript.append_image(Bytes::new(), "bob");

        assert_eq!(transcript.len(), 2);
        for entry in transcript.entries() {
            assert_eq!(
                entry,
                &TranscriptEntry::Text {
                    sender: None,
                    body: IMAGE_ERROR_NOTICE.to_owned(),
                }
            );
        }
    }

    #[test]
    fn corrupt_image_notice_carries_reason() {
        let png = tiny_png();
        let mut transcript = Transcript::new();
        transcript.append_image(png.slice(..png.len() / 2), "bob");

        let body = transcript
            .last()
            .and_then(TranscriptEntry::text_body)
            .expect("text notice");
        assert!(body.starts_with("[Error displaying image: "), "{body}");
        assert!(body.ends_with(']'));
    }

    #[test]
    fn plain_rendering_separates_entries_with_blank_lines() {
        let mut transcript = Transcript::new();
        transcript.append_message("bob", "hi");
        transcript.append_text("notice");
        transcript.append_image(tiny_png(), "alice");

        assert_eq!(
            transcript.render_plain(),
            "bob: hi\n\nnotice\n\nalice: [image 200x200]\n\n"
        );
    }

    #[test]
    fn view_trait_routes_to_transcript() {
        fn feed(view: &mut dyn TranscriptView) {
            view.append_text("through the view");
            view.append_image(Bytes::new(), "bob");
        }

        let mut transcript = Transcript::new();
        feed(&mut transcript);
        assert_eq!(transcript.len(), 2);
        assert_eq!(
            transcript.entries()[0].text_body(),
            Some("through the view")
        );
    }
}
