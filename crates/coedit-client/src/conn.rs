//! Reconnecting sync session.
//!
//! One task owns the socket, the document mirror and the debouncer. The
//! embedding UI talks to it through a [`SyncHandle`] and listens on the
//! event stream. On transport loss the session waits a fixed delay,
//! reconnects and lets the server's init snapshot replace whatever the
//! local buffer drifted to; the stale buffer is never pushed back up.

use std::future::pending;

use coedit_protocol::{ClientMessage, ServerMessage};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{interval_at, sleep, sleep_until, Instant};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::debounce::EditDebouncer;
use crate::reconcile::{DocumentMirror, RemoteOutcome};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid server url: {0}")]
    Url(#[from] url::ParseError),
    #[error("websocket error: {0}")]
    Ws(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        ClientError::Ws(Box::new(e))
    }
}

/// Notifications surfaced to the embedding UI.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// Fresh authoritative snapshot (first connect and every reconnect).
    Synced { content: String, version: i64 },
    /// A peer's edit was applied to the mirror.
    RemoteChange {
        from: String,
        content: String,
        version: i64,
    },
    /// A peer moved its cursor.
    RemoteCursor { from: String, cursor: Value },
    /// Transport dropped; a reconnect is scheduled.
    Disconnected,
}

enum LocalInput {
    Edit(String),
    Cursor(Value),
}

/// Cheap cloneable handle for feeding local activity into a running session.
#[derive(Clone)]
pub struct SyncHandle {
    input_tx: mpsc::Sender<LocalInput>,
}

impl SyncHandle {
    /// Queue a local edit (the full buffer). Coalesced and sent after the
    /// debounce window. Returns false once the session has shut down.
    pub async fn edit(&self, content: impl Into<String>) -> bool {
        self.input_tx
            .send(LocalInput::Edit(content.into()))
            .await
            .is_ok()
    }

    /// Send a cursor signal immediately (no debounce).
    pub async fn cursor(&self, cursor: Value) -> bool {
        self.input_tx.send(LocalInput::Cursor(cursor)).await.is_ok()
    }
}

enum ConnectionEnd {
    /// Server closed or transport failed; reconnect after the delay.
    Dropped,
    /// Every handle is gone; shut down for good.
    InputClosed,
}

/// A sync session for one document. Built with [`SyncClient::new`], then
/// driven to completion with [`SyncClient::run`].
pub struct SyncClient {
    config: ClientConfig,
    mirror: DocumentMirror,
    debouncer: EditDebouncer,
    input_rx: mpsc::Receiver<LocalInput>,
    events_tx: mpsc::Sender<SyncEvent>,
}

impl SyncClient {
    pub fn new(config: ClientConfig) -> (Self, SyncHandle, mpsc::Receiver<SyncEvent>) {
        let (input_tx, input_rx) = mpsc::channel(64);
        let (events_tx, events_rx) = mpsc::channel(256);
        let client = Self {
            mirror: DocumentMirror::new(config.client_id.clone()),
            debouncer: EditDebouncer::new(config.debounce_window),
            config,
            input_rx,
            events_tx,
        };
        (client, SyncHandle { input_tx }, events_rx)
    }

    /// Run until every handle is dropped, reconnecting forever on transport
    /// loss. Each rejoin starts from the server's snapshot.
    pub async fn run(mut self) -> Result<(), ClientError> {
        let url = self.config.ws_url()?;
        loop {
            match self.run_connection(url.as_str()).await {
                Ok(ConnectionEnd::InputClosed) => {
                    info!("all handles dropped, sync session ending");
                    return Ok(());
                }
                Ok(ConnectionEnd::Dropped) => {
                    debug!("connection dropped");
                }
                Err(e) => {
                    warn!("connection failed: {}", e);
                }
            }

            // An edit held back during the outage would be stale next to the
            // rejoin snapshot, so it is dropped, not replayed.
            self.debouncer.clear();
            let _ = self.events_tx.send(SyncEvent::Disconnected).await;
            sleep(self.config.reconnect_delay).await;
        }
    }

    async fn run_connection(&mut self, url: &str) -> Result<ConnectionEnd, ClientError> {
        let (mut ws, _response) = connect_async(url).await?;
        info!(doc_id = %self.config.doc_id, "connected");

        let mut keepalive = interval_at(
            Instant::now() + self.config.keepalive_interval,
            self.config.keepalive_interval,
        );

        loop {
            let flush_at = self.debouncer.deadline();

            tokio::select! {
                frame = ws.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => self.handle_frame(text.as_str()).await,
                        Some(Ok(Message::Close(_))) => {
                            debug!("server closed the connection");
                            return Ok(ConnectionEnd::Dropped);
                        }
                        // Transport ping/pong is handled by tungstenite.
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            debug!("socket error: {}", e);
                            return Ok(ConnectionEnd::Dropped);
                        }
                        None => return Ok(ConnectionEnd::Dropped),
                    }
                }

                input = self.input_rx.recv() => {
                    match input {
                        Some(LocalInput::Edit(content)) => {
                            self.mirror.record_local_edit(content.clone());
                            self.debouncer.record(content);
                        }
                        Some(LocalInput::Cursor(cursor)) => {
                            send_json(&mut ws, &ClientMessage::Cursor { cursor }).await?;
                        }
                        None => {
                            // Flush a pending edit so the final keystrokes
                            // are not lost on an orderly shutdown.
                            if let Some(content) = self.debouncer.flush() {
                                let _ = send_json(&mut ws, &ClientMessage::Change { content }).await;
                            }
                            let _ = ws.close(None).await;
                            return Ok(ConnectionEnd::InputClosed);
                        }
                    }
                }

                _ = async { match flush_at { Some(at) => sleep_until(at).await, None => pending().await } } => {
                    if let Some(content) = self.debouncer.take_ready() {
                        send_json(&mut ws, &ClientMessage::Change { content }).await?;
                    }
                }

                _ = keepalive.tick() => {
                    send_json(&mut ws, &ClientMessage::Ping {}).await?;
                }
            }
        }
    }

    async fn handle_frame(&mut self, raw: &str) {
        let message: ServerMessage = match serde_json::from_str(raw) {
            Ok(message) => message,
            Err(e) => {
                debug!(error = %e, "ignoring unparseable frame");
                return;
            }
        };

        match message {
            ServerMessage::Init { content, version } => {
                self.mirror.apply_init(content.clone(), version);
                let _ = self
                    .events_tx
                    .send(SyncEvent::Synced { content, version })
                    .await;
            }
            ServerMessage::Change {
                from,
                content,
                version,
                ..
            } => match self.mirror.apply_remote_change(&from, &content, version) {
                RemoteOutcome::Echo => {}
                RemoteOutcome::Noop | RemoteOutcome::Replaced => {
                    let _ = self
                        .events_tx
                        .send(SyncEvent::RemoteChange {
                            from,
                            content,
                            version,
                        })
                        .await;
                }
            },
            ServerMessage::Cursor { from, cursor } => {
                let _ = self
                    .events_tx
                    .send(SyncEvent::RemoteCursor { from, cursor })
                    .await;
            }
        }
    }
}

async fn send_json(ws: &mut Ws, message: &ClientMessage) -> Result<(), ClientError> {
    let json = serde_json::to_string(message)?;
    ws.send(Message::Text(json.into())).await?;
    Ok(())
}
