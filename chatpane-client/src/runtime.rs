use std::time::Duration;

use chatpane_core::OutboundRequest;
use futures::{Sink, SinkExt, StreamExt};
use tokio::{sync::mpsc, time::timeout};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async_with_config,
    tungstenite::{Message, protocol::WebSocketConfig},
};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{
    bridge::{RuntimeCommand, UiEvent, UiEventSender},
    wire::{
        ClientFrame, MAX_FRAME_BYTES, ServerFrame, WireError, decode_image, decode_server_frame,
        encode_client_frame,
    },
};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;
type WsRead = futures::stream::SplitStream<WsStream>;

/// A frame waiting for the socket, and what to show locally once it is written.
#[derive(Debug)]
struct Outgoing {
    frame: ClientFrame,
    echo: Option<UiEvent>,
}

const MAX_CONNECT_ATTEMPTS: u32 = 3;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(12);
const BACKOFF_BASE_MS: u64 = 200;

/// Network side of the window: waits for the user to join, connects, then
/// moves frames between the command queue, the socket and the UI.
pub async fn run_client_runtime(
    server_url: String,
    mut runtime_cmd_rx: mpsc::UnboundedReceiver<RuntimeCommand>,
    ui_events: UiEventSender,
) {
    let username = loop {
        match runtime_cmd_rx.recv().await {
            Some(RuntimeCommand::Connect { username }) => break username,
            Some(RuntimeCommand::Send(request)) => {
                warn!(kind = request.kind(), "dropping request sent before joining");
                ui_events.send(UiEvent::RuntimeError(
                    "Not connected yet: enter your username first".to_owned(),
                ));
            }
            None => return,
        }
    };

    info!(server_url = %server_url, username = %username, "runtime starting");

    if let Err(err) = Url::parse(&server_url) {
        error!(server_url = %server_url, "invalid server url: {err}");
        ui_events.send(UiEvent::RuntimeError(format!("invalid server URL: {err}")));
        return;
    }

    ui_events.send(UiEvent::ConnectionStatus("Connecting".to_owned()));

    let Some(ws_stream) = connect_with_retry(&server_url, &ui_events).await else {
        return;
    };

    info!("connected");
    ui_events.send(UiEvent::ConnectionStatus("Connected".to_owned()));

    let (write_half, read_half) = ws_stream.split();
    let (network_send_tx, network_send_rx) = mpsc::unbounded_channel::<Outgoing>();

    let hello = Outgoing {
        frame: ClientFrame::Hello {
            username: username.clone(),
        },
        echo: None,
    };
    if network_send_tx.send(hello).is_err() {
        error!("failed to queue hello");
        ui_events.send(UiEvent::RuntimeError("failed to queue hello".to_owned()));
        return;
    }

    let mut send_task = tokio::spawn(network_send_task(
        write_half,
        network_send_rx,
        ui_events.clone(),
    ));
    let mut receive_task = tokio::spawn(network_receive_task(read_half, ui_events.clone()));
    let command_task = tokio::spawn(runtime_command_task(
        runtime_cmd_rx,
        network_send_tx,
        username,
        ui_events.clone(),
    ));

    tokio::select! {
        _ = &mut send_task => receive_task.abort(),
        _ = &mut receive_task => send_task.abort(),
    }

    command_task.abort();
    info!("disconnected");
    ui_events.send(UiEvent::ConnectionStatus("Disconnected".to_owned()));
}

async fn connect_with_retry(server_url: &str, ui_events: &UiEventSender) -> Option<WsStream> {
    let mut attempt: u32 = 1;
    loop {
        info!(
            attempt,
            max_attempts = MAX_CONNECT_ATTEMPTS,
            server_url = %server_url,
            "connecting"
        );

        let connect = connect_async_with_config(server_url, Some(socket_config()), false);
        let msg = match timeout(CONNECT_TIMEOUT, connect).await {
            Ok(Ok((stream, _response))) => return Some(stream),
            Ok(Err(err)) => format!("connect failed: {err}"),
            Err(_) => format!("connect timed out after {CONNECT_TIMEOUT:?}"),
        };

        error!(attempt, server_url = %server_url, "{msg}");
        if attempt >= MAX_CONNECT_ATTEMPTS {
            ui_events.send(UiEvent::RuntimeError(msg));
            return None;
        }

        let backoff_ms = BACKOFF_BASE_MS.saturating_mul(1_u64 << (attempt - 1));
        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
        attempt += 1;
    }
}

/// Messages up to this size are read off the socket. Anything over
/// [`MAX_FRAME_BYTES`] is then dropped by the wire layer without closing the
/// connection.
const MAX_SOCKET_MESSAGE_BYTES: usize = MAX_FRAME_BYTES * 2;

fn socket_config() -> WebSocketConfig {
    WebSocketConfig::default()
        .max_message_size(Some(MAX_SOCKET_MESSAGE_BYTES))
        .max_frame_size(Some(MAX_SOCKET_MESSAGE_BYTES))
}

async fn runtime_command_task(
    mut runtime_cmd_rx: mpsc::UnboundedReceiver<RuntimeCommand>,
    network_send_tx: mpsc::UnboundedSender<Outgoing>,
    username: String,
    ui_events: UiEventSender,
) {
    while let Some(command) = runtime_cmd_rx.recv().await {
        match command {
            RuntimeCommand::Connect { username: again } => {
                warn!(username = %again, "already joined; ignoring connect");
            }
            RuntimeCommand::Send(request) => {
                debug!(kind = request.kind(), recipient = %request.recipient(), "sending");
                let outgoing = Outgoing {
                    frame: ClientFrame::from(&request),
                    echo: local_echo(&request, &username),
                };
                if network_send_tx.send(outgoing).is_err() {
                    ui_events.send(UiEvent::RuntimeError(
                        "Send failed: connection closed".to_owned(),
                    ));
                    break;
                }
            }
        }
    }
}

/// The user's own text and images, as shown once they are on the wire.
fn local_echo(request: &OutboundRequest, username: &str) -> Option<UiEvent> {
    match request {
        OutboundRequest::Text { body, .. } => Some(UiEvent::TextReceived {
            sender: username.to_owned(),
            body: body.to_string(),
        }),
        OutboundRequest::Image { bytes, .. } => Some(UiEvent::ImageReceived {
            sender: username.to_owned(),
            bytes: bytes.clone(),
        }),
        OutboundRequest::Audio { .. } => None,
    }
}

/// Write queued frames in order. A frame's echo is shown only after the
/// write succeeded.
async fn network_send_task<W>(
    mut write_half: W,
    mut network_send_rx: mpsc::UnboundedReceiver<Outgoing>,
    ui_events: UiEventSender,
) where
    W: Sink<Message> + Unpin,
    W::Error: std::fmt::Display,
{
    while let Some(Outgoing { frame, echo }) = network_send_rx.recv().await {
        let text = match encode_client_frame(&frame) {
            Ok(text) => text,
            Err(err) => {
                warn!("failed to encode outgoing frame: {}", err);
                continue;
            }
        };

        if let Err(err) = write_half.send(Message::Text(text.into())).await {
            warn!("socket write failed: {}", err);
            ui_events.send(UiEvent::RuntimeError(format!("Send failed: {err}")));
            break;
        }

        if let Some(echo) = echo {
            ui_events.send(echo);
        }
    }

    let _ = write_half.close().await;
}

async fn network_receive_task(mut read_half: WsRead, ui_events: UiEventSender) {
    while let Some(message) = read_half.next().await {
        match message {
            Ok(Message::Text(text)) => match server_frame_to_event(text.as_str()) {
                Ok(event) => {
                    if !ui_events.send(event) {
                        break;
                    }
                }
                Err(err) => warn!("dropping inbound frame: {}", err),
            },
            Ok(Message::Close(_)) => break,
            Ok(Message::Binary(data)) => {
                debug!(bytes = data.len(), "ignoring binary frame");
            }
            Ok(_) => {}
            Err(err) => {
                warn!("socket read failed: {}", err);
                ui_events.send(UiEvent::RuntimeError(format!("connection lost: {err}")));
                break;
            }
        }
    }
}

fn server_frame_to_event(text: &str) -> Result<UiEvent, WireError> {
    let event = match decode_server_frame(text)? {
        ServerFrame::Text { sender, body } => UiEvent::TextReceived { sender, body },
        ServerFrame::Image { sender, image_b64 } => UiEvent::ImageReceived {
            sender,
            bytes: decode_image(&image_b64)?,
        },
        ServerFrame::Error { message } => UiEvent::RuntimeError(message),
    };
    Ok(event)
}
