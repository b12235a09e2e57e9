use std::sync::{Arc, mpsc as std_mpsc};

use bytes::Bytes;
use chatpane_core::{ChatController, MessageBody, OutboundRequest};
use tokio::sync::mpsc;
use tracing::warn;

/// Work for the network runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCommand {
    Connect { username: String },
    Send(OutboundRequest),
}

/// Things the runtime tells the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    ConnectionStatus(String),
    TextReceived { sender: String, body: String },
    ImageReceived { sender: String, bytes: Bytes },
    RuntimeError(String),
}

/// Callback that asks the window to repaint.
pub type Wake = Arc<dyn Fn() + Send + Sync>;

/// Sending half of the UI event queue. Every send also wakes the window so
/// it repaints without waiting for input.
#[derive(Clone)]
pub struct UiEventSender {
    tx: std_mpsc::Sender<UiEvent>,
    wake: Option<Wake>,
}

impl UiEventSender {
    /// Returns `false` once the window has gone away.
    pub fn send(&self, event: UiEvent) -> bool {
        let delivered = self.tx.send(event).is_ok();
        if let Some(wake) = &self.wake {
            wake();
        }
        delivered
    }
}

impl std::fmt::Debug for UiEventSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiEventSender")
            .field("wake", &self.wake.is_some())
            .finish_non_exhaustive()
    }
}

/// [`ChatController`] that queues everything for the async runtime and
/// returns immediately.
#[derive(Debug)]
pub struct BridgeController {
    cmd_tx: mpsc::UnboundedSender<RuntimeCommand>,
    ui_events: UiEventSender,
}

impl BridgeController {
    pub fn new(cmd_tx: mpsc::UnboundedSender<RuntimeCommand>, ui_events: UiEventSender) -> Self {
        Self { cmd_tx, ui_events }
    }

    fn submit(&self, command: RuntimeCommand) {
        if self.cmd_tx.send(command).is_err() {
            warn!("runtime not available; dropping command");
            self.ui_events.send(UiEvent::RuntimeError(
                "Send failed: runtime not available".to_owned(),
            ));
        }
    }
}

impl ChatController for BridgeController {
    fn connect(&mut self, username: &str) {
        self.submit(RuntimeCommand::Connect {
            username: username.to_owned(),
        });
    }

    fn send_message(&mut self, body: &str, recipient: &str) {
        match MessageBody::new(body) {
            Ok(body) => self.submit(RuntimeCommand::Send(OutboundRequest::Text {
                body,
                recipient: recipient.to_owned(),
            })),
            Err(err) => warn!("not sending message: {err}"),
        }
    }

    fn send_image(&mut self, image: Bytes, recipient: &str) {
        self.submit(RuntimeCommand::Send(OutboundRequest::Image {
            bytes: image,
            recipient: recipient.to_owned(),
        }));
    }

    fn record_and_send_audio(&mut self, recipient: &str) {
        self.submit(RuntimeCommand::Send(OutboundRequest::Audio {
            recipient: recipient.to_owned(),
        }));
    }

    fn dispatch(&mut self, request: &OutboundRequest) {
        self.submit(RuntimeCommand::Send(request.clone()));
    }
}

/// Both ends of a fresh bridge: the controller for the window, the command
/// receiver for the runtime, and the UI event channel.
#[derive(Debug)]
pub struct BridgeEnds {
    pub controller: BridgeController,
    pub commands: mpsc::UnboundedReceiver<RuntimeCommand>,
    pub events_tx: UiEventSender,
    pub events: std_mpsc::Receiver<UiEvent>,
}

pub fn bridge(wake: Option<Wake>) -> BridgeEnds {
    let (cmd_tx, commands) = mpsc::unbounded_channel();
    let (tx, events) = std_mpsc::channel();
    let events_tx = UiEventSender { tx, wake };

    BridgeEnds {
        controller: BridgeController::new(cmd_tx, events_tx.clone()),
        commands,
        events_tx,
        events,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn controller_calls_become_runtime_commands() {
        let mut ends = bridge(None);

        ends.controller.connect("alice");
        ends.controller.send_message("hi", "bob");
        ends.controller.record_and_send_audio("bob");

        assert_eq!(
            ends.commands.try_recv().unwrap(),
            RuntimeCommand::Connect {
                username: "alice".to_owned()
            }
        );
        assert_eq!(
            ends.commands.try_recv().unwrap(),
            RuntimeCommand::Send(OutboundRequest::text("hi", "bob").unwrap())
        );
        assert_eq!(
            ends.commands.try_recv().unwrap(),
            RuntimeCommand::Send(OutboundRequest::Audio {
                recipient: "bob".to_owned()
            })
        );
    }

    #[test]
    fn closed_runtime_is_reported_to_ui() {
        let ends = bridge(None);
        let BridgeEnds {
            mut controller,
            commands,
            events,
            ..
        } = ends;
        drop(commands);

        controller.send_image(Bytes::from_static(b"img"), "bob");
        assert!(matches!(events.try_recv(), Ok(UiEvent::RuntimeError(_))));
    }

    #[test]
    fn every_event_wakes_the_window() {
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&wakes);
        let ends = bridge(Some(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })));

        ends.events_tx
            .send(UiEvent::ConnectionStatus("Connected".to_owned()));
        ends.events_tx.send(UiEvent::RuntimeError("boom".to_owned()));

        assert_eq!(wakes.load(Ordering::SeqCst), 2);
        assert_eq!(ends.events.try_iter().count(), 2);
    }
}
