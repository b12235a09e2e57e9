use crate::{CoreError, MessageBody, is_palette_emoji};

/// The not-yet-sent text in the message box.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeBuffer {
    text: String,
}

impl ComposeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Direct access for text editing widgets.
    pub fn buffer_mut(&mut self) -> &mut String {
        &mut self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn insert_emoji(&mut self, glyph: &str) -> Result<(), CoreError> {
        if !is_palette_emoji(glyph) {
            return Err(CoreError::UnknownEmoji(glyph.to_owned()));
        }
        self.text.push_str(glyph);
        Ok(())
    }

    /// Take the trimmed text for sending and clear the buffer.
    ///
    /// Whitespace-only input yields `None` and the buffer is left as it was.
    pub fn take_submission(&mut self) -> Option<MessageBody> {
        let body = MessageBody::new(&self.text).ok()?;
        self.text.clear();
        Some(body)
    }
}
