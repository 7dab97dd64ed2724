//! WebSocket Relay Server
//!
//! Async WebSocket server that mediates between the wire protocol and the
//! session store. One task per connection parses intents, enforces the
//! connection's seat binding, and forwards authoritative state to every
//! participant of the affected session.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, error, info, instrument, warn};

use chesslink_core::types::{Color, UciMove};
use chesslink_core::{ClientMessage, ServerMessage};

use crate::network::session::{SessionError, SessionId, SessionManager, SessionState};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".parse().expect("static address"),
            max_connections: 256,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Relay server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// The relay server.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// Session store.
    sessions: Arc<SessionManager>,
    /// Live connection count.
    connections: Arc<AtomicUsize>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new relay server.
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            sessions: Arc::new(SessionManager::new()),
            connections: Arc::new(AtomicUsize::new(0)),
            shutdown_tx,
        }
    }

    /// Bind the configured address and serve until shutdown.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!("Relay listening on {}", self.config.bind_addr);
        self.serve(listener).await
    }

    /// Serve connections from an already-bound listener.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), GameServerError> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            if self.connection_count() >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                continue;
                            }

                            debug!("New connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let sessions = self.sessions.clone();
        let connections = self.connections.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    return;
                }
            };

            connections.fetch_add(1, Ordering::SeqCst);

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(64);

            // Spawn message sender task
            let sender_task = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    let text = match msg.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            error!("Failed to serialize message: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
            });

            // The seat this connection holds, bound at most once by create/join
            // and held for the connection's lifetime.
            let mut seat: Option<(SessionId, Color)> = None;

            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                let client_msg = match ClientMessage::from_json(&text) {
                                    Ok(m) => m,
                                    Err(e) => {
                                        debug!("Invalid message from {}: {}", addr, e);
                                        let _ = msg_tx.send(ServerMessage::Error {
                                            message: "invalid message format".to_string(),
                                        }).await;
                                        continue;
                                    }
                                };

                                Self::handle_client_message(
                                    addr,
                                    client_msg,
                                    &mut seat,
                                    &sessions,
                                    &msg_tx,
                                ).await;
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Client {} disconnected", addr);
                                break;
                            }
                            Some(Err(e)) => {
                                error!("WebSocket error for {}: {}", addr, e);
                                break;
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }

            // Cleanup: transport close is the only fatal-to-the-connection
            // signal, handled as a normal lifecycle transition.
            sender_task.abort();

            if let Some((session_id, color)) = seat.take() {
                sessions.remove_participant(&session_id, color).await;
            }

            connections.fetch_sub(1, Ordering::SeqCst);
            debug!("Client {} cleaned up", addr);
        });
    }

    /// Handle a client message.
    async fn handle_client_message(
        addr: SocketAddr,
        msg: ClientMessage,
        seat: &mut Option<(SessionId, Color)>,
        sessions: &Arc<SessionManager>,
        sender: &mpsc::Sender<ServerMessage>,
    ) {
        match msg {
            ClientMessage::Create => {
                Self::handle_create(addr, seat, sessions, sender).await;
            }
            ClientMessage::Join { session_id } => {
                Self::handle_join(addr, session_id, seat, sessions, sender).await;
            }
            ClientMessage::Move { uci } => {
                Self::handle_move(addr, uci, seat, sessions, sender).await;
            }
        }
    }

    /// Handle session creation.
    async fn handle_create(
        addr: SocketAddr,
        seat: &mut Option<(SessionId, Color)>,
        sessions: &Arc<SessionManager>,
        sender: &mpsc::Sender<ServerMessage>,
    ) {
        if seat.is_some() {
            let _ = sender.send(ServerMessage::Error {
                message: SessionError::AlreadyInSession.to_string(),
            }).await;
            return;
        }

        let session_id = sessions.create_session(sender.clone()).await;
        info!("Client {} created session {}", addr, session_id);

        *seat = Some((session_id.clone(), Color::White));
        let _ = sender.send(ServerMessage::SessionCreated { session_id }).await;
    }

    /// Handle a join request.
    async fn handle_join(
        addr: SocketAddr,
        session_id: String,
        seat: &mut Option<(SessionId, Color)>,
        sessions: &Arc<SessionManager>,
        sender: &mpsc::Sender<ServerMessage>,
    ) {
        if seat.is_some() {
            let _ = sender.send(ServerMessage::Error {
                message: SessionError::AlreadyInSession.to_string(),
            }).await;
            return;
        }

        // Joining an unregistered code fails; sessions are only ever minted
        // through an explicit create.
        let Some(session) = sessions.get(&session_id).await else {
            let _ = sender.send(ServerMessage::Error {
                message: SessionError::SessionNotFound.to_string(),
            }).await;
            return;
        };

        let mut session_guard = session.write().await;
        match session_guard.join(sender.clone()) {
            Ok(color) => {
                *seat = Some((session_id.clone(), color));
                info!("Client {} joined session {} as {}", addr, session_id, color);

                // The pair is complete: start both sides, each told its own
                // color and the authoritative position.
                if session_guard.state() == SessionState::Active {
                    let fen = session_guard.fen();
                    for (seat_color, seat_sender) in session_guard.seats() {
                        let _ = seat_sender.send(ServerMessage::GameStart {
                            color: seat_color,
                            fen: fen.clone(),
                        }).await;
                    }
                }
            }
            Err(e) => {
                let _ = sender.send(ServerMessage::Error {
                    message: e.to_string(),
                }).await;
            }
        }
    }

    /// Handle a move intent.
    async fn handle_move(
        addr: SocketAddr,
        uci: String,
        seat: &mut Option<(SessionId, Color)>,
        sessions: &Arc<SessionManager>,
        sender: &mpsc::Sender<ServerMessage>,
    ) {
        let Some((session_id, color)) = seat.as_ref() else {
            let _ = sender.send(ServerMessage::Error {
                message: SessionError::NotInSession.to_string(),
            }).await;
            return;
        };

        let uci = match UciMove::new(uci) {
            Ok(m) => m,
            Err(reason) => {
                let _ = sender.send(ServerMessage::Error {
                    message: format!("invalid move: {reason}"),
                }).await;
                return;
            }
        };

        let Some(session) = sessions.get(session_id).await else {
            let _ = sender.send(ServerMessage::Error {
                message: SessionError::SessionNotFound.to_string(),
            }).await;
            return;
        };

        let mut session_guard = session.write().await;
        match session_guard.apply_move(*color, &uci) {
            Ok(outcome) => {
                debug!("Session {}: {} played {}", session_id, color, uci);

                // Broadcast while still holding the session lock so message
                // order matches apply order. Every seat receives the update,
                // the mover included.
                let message = ServerMessage::Move {
                    fen: outcome.fen,
                    status: outcome.status,
                    move_history: outcome.move_history,
                };
                let failed = session_guard.broadcast(message).await;
                drop(session_guard);

                // A seat whose channel is gone counts as disconnected; its
                // own task will repeat the removal as a no-op.
                for failed_color in failed {
                    debug!(
                        "Session {}: send to {} failed, treating as disconnected",
                        session_id, failed_color
                    );
                    sessions.remove_participant(session_id, failed_color).await;
                }
            }
            Err(e) => {
                debug!("Session {}: rejected move from {} ({}): {}", session_id, addr, color, e);
                let _ = sender.send(ServerMessage::Error {
                    message: e.to_string(),
                }).await;
            }
        }
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Get active session count.
    pub async fn session_count(&self) -> usize {
        self.sessions.session_count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.max_connections, 256);
        assert_eq!(config.bind_addr.port(), 8080);
    }

    #[tokio::test]
    async fn test_server_creation() {
        let config = ServerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            ..Default::default()
        };
        let server = GameServer::new(config);

        assert_eq!(server.connection_count(), 0);
        assert_eq!(server.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_server_shutdown() {
        let config = ServerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            ..Default::default()
        };
        let server = GameServer::new(config);
        server.shutdown();
        // Should not panic
    }
}
