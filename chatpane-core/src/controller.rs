use bytes::Bytes;

use crate::OutboundRequest;

/// The network side of the client.
///
/// Implementations must not block the calling (UI) thread; how they reach the
/// server, and when, is their own business.
pub trait ChatController {
    fn connect(&mut self, username: &str);
    fn send_message(&mut self, body: &str, recipient: &str);
    fn send_image(&mut self, image: Bytes, recipient: &str);
    fn record_and_send_audio(&mut self, recipient: &str);

    fn dispatch(&mut self, request: &OutboundRequest) {
        match request {
            OutboundRequest::Text { body, recipient } => self.send_message(body.as_str(), recipient),
            OutboundRequest::Image { bytes, recipient } => self.send_image(bytes.clone(), recipient),
            OutboundRequest::Audio { recipient } => self.record_and_send_audio(recipient),
        }
    }
}

impl<C: ChatController + ?Sized> ChatController for &mut C {
    fn connect(&mut self, username: &str) {
        (**self).connect(username);
    }

    fn send_message(&mut self, body: &str, recipient: &str) {
        (**self).send_message(body, recipient);
    }

    fn send_image(&mut self, image: Bytes, recipient: &str) {
        (**self).send_image(image, recipient);
    }

    fn record_and_send_audio(&mut self, recipient: &str) {
        (**self).record_and_send_audio(recipient);
    }

    fn dispatch(&mut self, request: &OutboundRequest) {
        (**self).dispatch(request);
    }
}

impl<C: ChatController + ?Sized> ChatController for Box<C> {
    fn connect(&mut self, username: &str) {
        (**self).connect(username);
    }

    fn send_message(&mut self, body: &str, recipient: &str) {
        (**self).send_message(body, recipient);
    }

    fn send_image(&mut self, image: Bytes, recipient: &str) {
        (**self).send_image(image, recipient);
    }

    fn record_and_send_audio(&mut self, recipient: &str) {
        (**self).record_and_send_audio(recipient);
    }

    fn dispatch(&mut self, request: &OutboundRequest) {
        (**self).dispatch(request);
    }
}
