//! Game Session Management
//!
//! Owns the authoritative state of every live game: position, move history,
//! and the two color-bound seats. All turn and color authorization happens
//! here, behind a per-session lock, so racing move intents serialize and only
//! the one matching the color-to-move can apply.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use chesslink_core::rules::{ChessPosition, RulesError};
use chesslink_core::types::{Color, GameStatus, UciMove};
use chesslink_core::ServerMessage;

/// Unique session identifier: a short opaque code shared out-of-band.
pub type SessionId = String;

/// Length of a minted session code.
const SESSION_CODE_LEN: usize = 6;

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Host seated, waiting for the second player.
    AwaitingOpponent,
    /// Both seats filled, game in progress.
    Active,
    /// Game over or a participant left. No moves, no rebinding.
    Terminated,
}

/// Session errors. All are recoverable and local to the offending request:
/// they are reported to the sender and never affect the other participant.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// No session registered under the given code.
    #[error("session not found")]
    SessionNotFound,

    /// Both colors are already bound.
    #[error("session is full")]
    SessionFull,

    /// The session is not in a playable state.
    #[error("game is not active")]
    SessionNotActive,

    /// The submitting color is not the color-to-move.
    #[error("not your turn")]
    NotYourTurn,

    /// The origin square holds an opposing piece.
    #[error("that piece is not yours")]
    WrongColor,

    /// The rules engine rejected the move.
    #[error(transparent)]
    IllegalMove(#[from] RulesError),

    /// The connection is already bound to a session.
    #[error("already in a session")]
    AlreadyInSession,

    /// The connection has not created or joined a session.
    #[error("not in a session")]
    NotInSession,
}

/// Authoritative state resulting from a successfully applied move.
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    /// Position after the move.
    pub fen: String,
    /// Classification of the new position.
    pub status: GameStatus,
    /// Full move history in SAN.
    pub move_history: Vec<String>,
}

/// What a seat removal left behind.
#[derive(Debug)]
pub enum SeatRemoval {
    /// The color was not seated; nothing changed.
    NotSeated,
    /// A peer is still seated and should be notified.
    PeerRemains(mpsc::Sender<ServerMessage>),
    /// The session is now empty and should be evicted.
    Empty,
}

/// One two-player game.
pub struct GameSession {
    /// Session code.
    pub id: SessionId,
    /// Lifecycle state.
    state: SessionState,
    /// Authoritative position. Mutated only by [`GameSession::apply_move`].
    position: ChessPosition,
    /// Applied moves in SAN. Length parity determines the color to move.
    move_history: Vec<String>,
    /// Seated participants, each with an outbound message channel.
    seats: BTreeMap<Color, mpsc::Sender<ServerMessage>>,
}

impl GameSession {
    /// Create a session with the host seated as white.
    pub fn new(id: SessionId, host: mpsc::Sender<ServerMessage>) -> Self {
        let mut seats = BTreeMap::new();
        seats.insert(Color::White, host);

        Self {
            id,
            state: SessionState::AwaitingOpponent,
            position: ChessPosition::new(),
            move_history: Vec::new(),
            seats,
        }
    }

    /// Session lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Authoritative position as FEN.
    pub fn fen(&self) -> String {
        self.position.to_fen()
    }

    /// Applied moves in SAN.
    pub fn move_history(&self) -> &[String] {
        &self.move_history
    }

    /// The color whose turn it is, from move-count parity.
    pub fn color_to_move(&self) -> Color {
        Color::to_move(self.move_history.len())
    }

    /// Number of bound seats.
    pub fn seat_count(&self) -> usize {
        self.seats.len()
    }

    /// Seated participants with their outbound channels.
    pub fn seats(&self) -> impl Iterator<Item = (Color, &mpsc::Sender<ServerMessage>)> {
        self.seats.iter().map(|(color, sender)| (*color, sender))
    }

    /// Bind the joining connection to the unassigned color.
    ///
    /// The second join activates the session. A terminated session is no
    /// longer joinable and reads as gone.
    pub fn join(&mut self, sender: mpsc::Sender<ServerMessage>) -> Result<Color, SessionError> {
        match self.state {
            SessionState::Terminated => return Err(SessionError::SessionNotFound),
            SessionState::Active => return Err(SessionError::SessionFull),
            SessionState::AwaitingOpponent => {}
        }

        let color = if self.seats.contains_key(&Color::White) {
            Color::Black
        } else {
            Color::White
        };
        self.seats.insert(color, sender);

        if self.seats.len() == 2 {
            self.state = SessionState::Active;
        }

        Ok(color)
    }

    /// Validate and apply a move intent from `color`.
    ///
    /// Rejections leave position and history untouched. A terminal position
    /// moves the session to [`SessionState::Terminated`].
    pub fn apply_move(&mut self, color: Color, uci: &UciMove) -> Result<MoveOutcome, SessionError> {
        if self.state != SessionState::Active {
            return Err(SessionError::SessionNotActive);
        }

        if color != self.color_to_move() {
            return Err(SessionError::NotYourTurn);
        }

        if self.position.piece_color_at(uci.from_square()) == Some(color.opposite()) {
            return Err(SessionError::WrongColor);
        }

        let san = self.position.apply_move(uci)?;
        self.move_history.push(san);

        let status = self.position.status();
        if status.is_terminal() {
            self.state = SessionState::Terminated;
        }

        Ok(MoveOutcome {
            fen: self.position.to_fen(),
            status,
            move_history: self.move_history.clone(),
        })
    }

    /// Unbind a color's seat. Idempotent: removing a vacant seat is a no-op.
    ///
    /// Any removal makes the session unplayable; rebinding a color is not
    /// supported.
    pub fn remove_seat(&mut self, color: Color) -> SeatRemoval {
        if self.seats.remove(&color).is_none() {
            return SeatRemoval::NotSeated;
        }

        self.state = SessionState::Terminated;

        match self.seats.values().next() {
            Some(peer) => SeatRemoval::PeerRemains(peer.clone()),
            None => SeatRemoval::Empty,
        }
    }

    /// Send a message to every seated participant.
    ///
    /// Returns the colors whose channel was gone; a failed send must not
    /// keep the message from the other seat.
    pub async fn broadcast(&self, message: ServerMessage) -> Vec<Color> {
        let mut failed = Vec::new();
        for (color, sender) in &self.seats {
            if sender.send(message.clone()).await.is_err() {
                failed.push(*color);
            }
        }
        failed
    }
}

// =============================================================================
// SESSION MANAGER
// =============================================================================

/// Registry of all active sessions, keyed by session code.
///
/// Injected into the protocol handler as a dependency; there is no ambient
/// global. Independent sessions proceed in parallel, while every mutation of
/// a single session serializes through its own lock.
pub struct SessionManager {
    sessions: RwLock<BTreeMap<SessionId, Arc<RwLock<GameSession>>>>,
}

impl SessionManager {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(BTreeMap::new()),
        }
    }

    /// Mint a fresh session code and register a session with the creator
    /// seated as white.
    pub async fn create_session(&self, host: mpsc::Sender<ServerMessage>) -> SessionId {
        let mut sessions = self.sessions.write().await;

        let id = loop {
            let candidate = mint_session_code();
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };

        let session = GameSession::new(id.clone(), host);
        sessions.insert(id.clone(), Arc::new(RwLock::new(session)));

        id
    }

    /// Look up a session by code.
    pub async fn get(&self, id: &str) -> Option<Arc<RwLock<GameSession>>> {
        let sessions = self.sessions.read().await;
        sessions.get(id).cloned()
    }

    /// Unbind a color from a session and drive the lifecycle forward:
    /// a remaining peer is notified once, an empty session is evicted.
    pub async fn remove_participant(&self, id: &str, color: Color) {
        let Some(session) = self.get(id).await else {
            return;
        };

        let removal = {
            let mut session = session.write().await;
            session.remove_seat(color)
        };

        match removal {
            SeatRemoval::NotSeated => {}
            SeatRemoval::PeerRemains(peer) => {
                let _ = peer.send(ServerMessage::OpponentDisconnected).await;
            }
            SeatRemoval::Empty => {
                let mut sessions = self.sessions.write().await;
                sessions.remove(id);
            }
        }
    }

    /// Number of registered sessions.
    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

fn mint_session_code() -> SessionId {
    use rand::distributions::Alphanumeric;
    use rand::Rng;

    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_CODE_LEN)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect()
}
