use std::io::Cursor;

use bytes::Bytes;
use chatpane_core::{
    ChatController, ChatSurface, CoreError, EMOJI_PALETTE, IMAGE_DISPLAY_WIDTH, OutboundRequest,
    TranscriptEntry,
};
use image::{ImageFormat, Rgba, RgbaImage};

#[derive(Debug, Default)]
struct RecordingController {
    connects: Vec<String>,
    sent: Vec<OutboundRequest>,
}

impl ChatController for RecordingController {
    fn connect(&mut self, username: &str) {
        self.connects.push(username.to_owned());
    }

    fn send_message(&mut self, body: &str, recipient: &str) {
        self.sent
            .push(OutboundRequest::text(body, recipient).expect("surface only sends non-empty text"));
    }

    fn send_image(&mut self, image: Bytes, recipient: &str) {
        self.sent.push(OutboundRequest::Image {
            bytes: image,
            recipient: recipient.to_owned(),
        });
    }

    fn record_and_send_audio(&mut self, recipient: &str) {
        self.sent.push(OutboundRequest::Audio {
            recipient: recipient.to_owned(),
        });
    }
}

fn bitmap_10x10() -> Bytes {
    let img = RgbaImage::from_pixel(10, 10, Rgba([10, 200, 10, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Bmp).expect("encode bmp");
    Bytes::from(out.into_inner())
}

#[test]
fn hello_to_bob_is_sent_exactly_once() {
    let mut surface = ChatSurface::new(RecordingController::default());
    surface.compose_mut().set_text("hello");

    surface.submit_text("bob");

    assert_eq!(
        surface.controller().sent,
        vec![OutboundRequest::text("hello", "bob").unwrap()]
    );
    assert!(surface.transcript().is_empty());
    assert!(surface.compose().is_empty());
}

#[test]
fn non_blank_text_is_sent_trimmed() {
    for raw in ["x", "  padded  ", "multi\nline\n", "\t😀 emoji"] {
        let mut surface = ChatSurface::new(RecordingController::default());
        surface.compose_mut().set_text(raw);

        let sent = surface.submit_text("bob").expect("non-blank input is sent");
        match sent {
            OutboundRequest::Text { body, .. } => assert_eq!(body.as_str(), raw.trim()),
            other => panic!("unexpected request: {other:?}"),
        }
        assert!(surface.compose().is_empty());
    }
}

#[test]
fn blank_text_changes_nothing() {
    for raw in ["", " ", "\n\n", " \t \r\n"] {
        let mut surface = ChatSurface::new(RecordingController::default());
        surface.on_text_received("bob", "earlier");
        surface.compose_mut().set_text(raw);

        assert!(surface.submit_text("bob").is_none());
        assert_eq!(surface.transcript().len(), 1);
        assert_eq!(surface.compose().text(), raw);
        assert!(surface.controller().sent.is_empty());
    }
}

#[test]
fn emoji_palette_appends_to_compose_buffer() {
    let mut surface = ChatSurface::new(RecordingController::default());
    surface.compose_mut().set_text("look ");
    surface.insert_emoji(EMOJI_PALETTE[9]).expect("palette glyph");
    surface.insert_emoji(EMOJI_PALETTE[39]).expect("palette glyph");
    assert_eq!(surface.compose().text(), "look 😊😝");

    assert!(matches!(
        surface.insert_emoji("x"),
        Err(CoreError::UnknownEmoji(_))
    ));
    assert_eq!(surface.compose().text(), "look 😊😝");
}

#[test]
fn inbound_text_becomes_last_entry() {
    let mut surface = ChatSurface::new(RecordingController::default());
    surface.on_text_received("bob", "hi");

    assert_eq!(
        surface.transcript().last(),
        Some(&TranscriptEntry::Text {
            sender: Some("bob".to_owned()),
            body: "hi".to_owned(),
        })
    );
}

#[test]
fn inbound_bitmap_is_rendered_at_display_width() {
    let mut surface = ChatSurface::new(RecordingController::default());
    surface.on_image_received("bob", bitmap_10x10());

    assert_eq!(surface.transcript().len(), 1);
    match surface.transcript().last() {
        Some(TranscriptEntry::Image { image, sender }) => {
            assert_eq!(sender, "bob");
            assert_eq!(image.width, IMAGE_DISPLAY_WIDTH);
            assert_eq!(image.height, IMAGE_DISPLAY_WIDTH);
        }
        other => panic!("unexpected entry: {other:?}"),
    }
}

#[test]
fn inbound_garbage_image_becomes_one_text_entry() {
    let mut surface = ChatSurface::new(RecordingController::default());
    surface.on_image_received("bob", Bytes::from_static(b"GIF89a-but-not-really"));

    assert_eq!(surface.transcript().len(), 1);
    let entry = surface.transcript().last().expect("entry");
    assert!(!entry.is_image());
    assert!(
        entry
            .text_body()
            .is_some_and(|body| body.starts_with("[Error displaying image"))
    );
}

#[test]
fn second_connect_is_rejected() {
    let mut surface = ChatSurface::new(RecordingController::default());
    surface.connect("alice").expect("first connect");
    assert!(!surface.session().is_editable());

    assert!(surface.connect("alice").is_err());
    assert!(surface.connect("bob").is_err());
    assert_eq!(surface.controller().connects, ["alice"]);
    assert_eq!(surface.session().username(), Some("alice"));
}

#[test]
fn surface_accepts_borrowed_controller() {
    let mut controller = RecordingController::default();
    {
        let mut surface = ChatSurface::new(&mut controller);
        surface.submit_audio("bob");
    }
    assert_eq!(
        controller.sent,
        vec![OutboundRequest::Audio {
            recipient: "bob".to_owned()
        }]
    );
}
