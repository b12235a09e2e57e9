use std::{fs, path::Path};

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::{
    ChatController, ComposeBuffer, CoreError, IMAGE_FILE_ERROR_PREFIX, MAX_IMAGE_FILE_BYTES,
    OutboundRequest, SessionGate, Transcript,
};

/// Chat window state minus the widgets: what the user typed, what has been
/// shown, whether they have joined, and who to hand outgoing work to.
///
/// All methods take `&mut self`; the window drives them from its single UI
/// thread, one at a time.
#[derive(Debug)]
pub struct ChatSurface<C> {
    controller: C,
    transcript: Transcript,
    compose: ComposeBuffer,
    session: SessionGate,
}

impl<C: ChatController> ChatSurface<C> {
    pub fn new(controller: C) -> Self {
        Self {
            controller,
            transcript: Transcript::new(),
            compose: ComposeBuffer::new(),
            session: SessionGate::new(),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn transcript_mut(&mut self) -> &mut Transcript {
        &mut self.transcript
    }

    pub fn compose(&self) -> &ComposeBuffer {
        &self.compose
    }

    pub fn compose_mut(&mut self) -> &mut ComposeBuffer {
        &mut self.compose
    }

    pub fn session(&self) -> &SessionGate {
        &self.session
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }

    pub fn insert_emoji(&mut self, glyph: &str) -> Result<(), CoreError> {
        self.compose.insert_emoji(glyph)
    }

    /// Join once. Later calls are rejected and never reach the controller.
    pub fn connect(&mut self, username: &str) -> Result<(), CoreError> {
        let accepted = self.session.connect(username)?;
        info!(username = %accepted, "joining");
        self.controller.connect(accepted);
        Ok(())
    }

    /// Send the compose buffer. Blank input is dropped silently and the
    /// buffer is left alone; otherwise the buffer is cleared.
    pub fn submit_text(&mut self, recipient: &str) -> Option<OutboundRequest> {
        let body = self.compose.take_submission()?;
        let request = OutboundRequest::Text {
            body,
            recipient: recipient.to_owned(),
        };
        self.dispatch(request)
    }

    pub fn submit_image(&mut self, bytes: Bytes, recipient: &str) -> Option<OutboundRequest> {
        self.dispatch(OutboundRequest::Image {
            bytes,
            recipient: recipient.to_owned(),
        })
    }

    /// Read `path` and send it as an image. A read failure is reported in
    /// the transcript and nothing is sent.
    pub fn submit_image_file(&mut self, path: &Path, recipient: &str) -> Option<OutboundRequest> {
        match read_image_file(path) {
            Ok(bytes) => self.submit_image(bytes, recipient),
            Err(err) => {
                warn!(path = %path.display(), "reading image file failed: {err}");
                self.transcript
                    .append_text(format!("{IMAGE_FILE_ERROR_PREFIX}{err}"));
                None
            }
        }
    }

    pub fn submit_audio(&mut self, recipient: &str) -> Option<OutboundRequest> {
        self.dispatch(OutboundRequest::Audio {
            recipient: recipient.to_owned(),
        })
    }

    pub fn on_text_received(&mut self, sender: &str, body: &str) {
        self.transcript.append_message(sender, body);
    }

    pub fn on_image_received(&mut self, sender: &str, image_bytes: Bytes) {
        self.transcript.append_image(image_bytes, sender);
    }

    fn dispatch(&mut self, request: OutboundRequest) -> Option<OutboundRequest> {
        debug!(kind = request.kind(), recipient = %request.recipient(), "dispatching");
        self.controller.dispatch(&request);
        Some(request)
    }
}

/// Read a whole image file, refusing anything over [`MAX_IMAGE_FILE_BYTES`].
pub fn read_image_file(path: &Path) -> Result<Bytes, CoreError> {
    let meta = fs::metadata(path)?;
    if meta.len() > MAX_IMAGE_FILE_BYTES {
        return Err(CoreError::ImageTooLarge {
            size: meta.len(),
            max: MAX_IMAGE_FILE_BYTES,
        });
    }

    let data = fs::read(path)?;
    Ok(Bytes::from(data))
}
