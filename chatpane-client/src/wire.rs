//! JSON text frames exchanged with the chat server.
//!
//! Every frame is `{"type": <variant>, "data": {..}}`. Image payloads travel
//! as standard base64.

use base64::Engine;
use bytes::Bytes;
use chatpane_core::{MessageBody, OutboundRequest};
use serde::{Deserialize, Serialize};

/// Frames above this size are dropped unread.
pub const MAX_FRAME_BYTES: usize = 24 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum ClientFrame {
    Hello { username: String },
    Text { body: MessageBody, recipient: String },
    Image { image_b64: String, recipient: String },
    Audio { recipient: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum ServerFrame {
    Text { sender: String, body: String },
    Image { sender: String, image_b64: String },
    Error { message: String },
}

#[derive(Debug)]
pub enum WireError {
    TooLarge { size: usize, max: usize },
    Json(serde_json::Error),
    Base64(base64::DecodeError),
}

impl std::fmt::Display for WireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WireError::TooLarge { size, max } => {
                write!(f, "frame too large: {size} bytes (max {max})")
            }
            WireError::Json(e) => write!(f, "invalid frame: {e}"),
            WireError::Base64(e) => write!(f, "invalid image payload: {e}"),
        }
    }
}

impl std::error::Error for WireError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WireError::Json(e) => Some(e),
            WireError::Base64(e) => Some(e),
            WireError::TooLarge { .. } => None,
        }
    }
}

impl From<&OutboundRequest> for ClientFrame {
    fn from(request: &OutboundRequest) -> Self {
        match request {
            OutboundRequest::Text { body, recipient } => ClientFrame::Text {
                body: body.clone(),
                recipient: recipient.clone(),
            },
            OutboundRequest::Image { bytes, recipient } => ClientFrame::Image {
                image_b64: encode_image(bytes),
                recipient: recipient.clone(),
            },
            OutboundRequest::Audio { recipient } => ClientFrame::Audio {
                recipient: recipient.clone(),
            },
        }
    }
}

impl ClientFrame {
    /// The request this frame carries; `None` for `Hello`.
    pub fn into_request(self) -> Result<Option<OutboundRequest>, WireError> {
        let request = match self {
            ClientFrame::Hello { .. } => return Ok(None),
            ClientFrame::Text { body, recipient } => OutboundRequest::Text { body, recipient },
            ClientFrame::Image {
                image_b64,
                recipient,
            } => OutboundRequest::Image {
                bytes: decode_image(&image_b64)?,
                recipient,
            },
            ClientFrame::Audio { recipient } => OutboundRequest::Audio { recipient },
        };
        Ok(Some(request))
    }
}

pub fn encode_client_frame(frame: &ClientFrame) -> Result<String, WireError> {
    serde_json::to_string(frame).map_err(WireError::Json)
}

pub fn decode_client_frame(text: &str) -> Result<ClientFrame, WireError> {
    check_size(text)?;
    serde_json::from_str(text).map_err(WireError::Json)
}

pub fn encode_server_frame(frame: &ServerFrame) -> Result<String, WireError> {
    serde_json::to_string(frame).map_err(WireError::Json)
}

pub fn decode_server_frame(text: &str) -> Result<ServerFrame, WireError> {
    check_size(text)?;
    serde_json::from_str(text).map_err(WireError::Json)
}

pub fn encode_image(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

pub fn decode_image(image_b64: &str) -> Result<Bytes, WireError> {
    base64::engine::general_purpose::STANDARD
        .decode(image_b64)
        .map(Bytes::from)
        .map_err(WireError::Base64)
}

fn check_size(text: &str) -> Result<(), WireError> {
    if text.len() > MAX_FRAME_BYTES {
        return Err(WireError::TooLarge {
            size: text.len(),
            max: MAX_FRAME_BYTES,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_survive_the_wire() {
        let requests = [
            OutboundRequest::text("hello", "bob").unwrap(),
            OutboundRequest::Image {
                bytes: Bytes::from_static(&[0, 159, 146, 150]),
                recipient: "bob".to_owned(),
            },
            OutboundRequest::Audio {
                recipient: "carol".to_owned(),
            },
        ];

        for request in requests {
            let text = encode_client_frame(&ClientFrame::from(&request)).expect("encode");
            let decoded = decode_client_frame(&text)
                .expect("decode")
                .into_request()
                .expect("request");
            assert_eq!(decoded, Some(request));
        }
    }

    #[test]
    fn frames_use_type_and_data_tags() {
        let text = encode_client_frame(&ClientFrame::Hello {
            username: "alice".to_owned(),
        })
        .expect("encode");
        assert_eq!(text, r#"{"type":"Hello","data":{"username":"alice"}}"#);
    }

    #[test]
    fn blank_text_body_is_rejected() {
        let err = decode_client_frame(r#"{"type":"Text","data":{"body":"   ","recipient":"bob"}}"#)
            .unwrap_err();
        assert!(matches!(err, WireError::Json(_)));
    }

    #[test]
    fn bad_base64_is_reported() {
        let frame = ClientFrame::Image {
            image_b64: "***".to_owned(),
            recipient: "bob".to_owned(),
        };
        assert!(matches!(frame.into_request(), Err(WireError::Base64(_))));
    }

    #[test]
    fn oversized_frames_are_refused_unparsed() {
        let text = " ".repeat(MAX_FRAME_BYTES + 1);
        match decode_server_frame(&text) {
            Err(WireError::TooLarge { size, max }) => {
                assert_eq!(size, MAX_FRAME_BYTES + 1);
                assert_eq!(max, MAX_FRAME_BYTES);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(
            decode_client_frame(&text),
            Err(WireError::TooLarge { .. })
        ));
    }

    #[test]
    fn server_error_frame_decodes() {
        let frame = decode_server_frame(r#"{"type":"Error","data":{"message":"no such user"}}"#)
            .expect("decode");
        assert_eq!(
            frame,
            ServerFrame::Error {
                message: "no such user".to_owned()
            }
        );
    }
}
