use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Trimmed, non-empty text of an outgoing chat message.
///
/// The only way to build one is [`MessageBody::new`], deserialization
/// included.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MessageBody(String);

impl MessageBody {
    pub fn new(raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CoreError::EmptyMessage);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MessageBody {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<MessageBody> for String {
    fn from(value: MessageBody) -> Self {
        value.0
    }
}

impl AsRef<str> for MessageBody {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One unit of work handed to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundRequest {
    Text { body: MessageBody, recipient: String },
    Image { bytes: Bytes, recipient: String },
    /// Recording is up to the controller; the request only names the target.
    Audio { recipient: String },
}

impl OutboundRequest {
    pub fn text(body: &str, recipient: impl Into<String>) -> Result<Self, CoreError> {
        Ok(OutboundRequest::Text {
            body: MessageBody::new(body)?,
            recipient: recipient.into(),
        })
    }

    pub fn recipient(&self) -> &str {
        match self {
            OutboundRequest::Text { recipient, .. }
            | OutboundRequest::Image { recipient, .. }
            | OutboundRequest::Audio { recipient } => recipient,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            OutboundRequest::Text { .. } => "text",
            OutboundRequest::Image { .. } => "image",
            OutboundRequest::Audio { .. } => "audio",
        }
    }
}
