//! WebSocket connection to the relay.
//!
//! Splits the socket into a writer task fed by an outbound channel and a
//! reader task that parses frames into `ServerMessage`s, so callers deal in
//! protocol messages only.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, warn};

use chesslink_core::{ClientMessage, ServerMessage};

/// Client connection errors.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// WebSocket connect or handshake failure.
    #[error("connection failed: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),

    /// The connection is gone; sends can no longer be delivered.
    #[error("connection closed")]
    ConnectionClosed,
}

/// A live connection to the relay.
pub struct Connection {
    outgoing: mpsc::Sender<ClientMessage>,
    incoming: mpsc::Receiver<ServerMessage>,
}

impl Connection {
    /// Connect to the relay at `url` (e.g. `ws://127.0.0.1:8080`).
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let (ws_stream, _) = connect_async(url).await?;
        debug!("Connected to {}", url);

        let (mut write, mut read) = ws_stream.split();
        let (outgoing, mut outgoing_rx) = mpsc::channel::<ClientMessage>(32);
        let (incoming_tx, incoming) = mpsc::channel::<ServerMessage>(32);

        // Writer task: drain the outbound channel onto the socket.
        tokio::spawn(async move {
            while let Some(msg) = outgoing_rx.recv().await {
                let text = match msg.to_json() {
                    Ok(t) => t,
                    Err(e) => {
                        error!("Failed to serialize message: {}", e);
                        continue;
                    }
                };
                if write.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        });

        // Reader task: parse frames into protocol messages.
        tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(Message::Text(text)) => match ServerMessage::from_json(&text) {
                        Ok(msg) => {
                            if incoming_tx.send(msg).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            warn!("Failed to parse server message: {} - {}", e, text);
                        }
                    },
                    Ok(Message::Close(_)) => {
                        debug!("Server closed connection");
                        break;
                    }
                    Err(e) => {
                        error!("WebSocket read error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
        });

        Ok(Self { outgoing, incoming })
    }

    /// Send a message to the relay.
    pub async fn send(&self, msg: ClientMessage) -> Result<(), ClientError> {
        self.outgoing
            .send(msg)
            .await
            .map_err(|_| ClientError::ConnectionClosed)
    }

    /// Receive the next message from the relay. `None` once the connection
    /// is gone and all buffered messages are drained.
    pub async fn recv(&mut self) -> Option<ServerMessage> {
        self.incoming.recv().await
    }
}
