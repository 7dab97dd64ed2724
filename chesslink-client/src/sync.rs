//! Client-side state synchronization.
//!
//! Keeps the board responsive by applying gestures to a local optimistic
//! position, while treating every authoritative message from the relay as
//! the final word. Reconciliation never diffs or merges: the authoritative
//! FEN simply overwrites local state, so the two can only disagree between a
//! sent intent and its confirming broadcast.
//!
//! All handlers are plain methods invoked by whatever drives the transport
//! and the rendering surface; the synchronizer itself never blocks and never
//! touches the network.

use tracing::warn;

use chesslink_core::rules::ChessPosition;
use chesslink_core::types::{Color, GameStatus, UciMove};
use chesslink_core::ServerMessage;

/// Result of a drop gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// Gesture rejected locally; the piece snaps back. No message is sent.
    Snapback,
    /// The optimistic position advanced; the intent must be sent to the
    /// relay. It is not reverted while awaiting confirmation.
    Intent(UciMove),
}

/// Mirror of the authoritative session state plus the optimistic local copy.
pub struct ClientSynchronizer {
    /// Session code, once created or joined.
    session: Option<String>,
    /// Color assigned by the relay at game start.
    color: Option<Color>,
    /// Optimistic position: advances on local gestures, overwritten by every
    /// authoritative message.
    local: ChessPosition,
    /// Last authoritative FEN received from the relay.
    authoritative_fen: Option<String>,
    /// Displayed move history in SAN.
    move_history: Vec<String>,
    /// Status from the last authoritative update.
    status: GameStatus,
    /// Interactive surface lock. Locked until game start, and again once the
    /// opponent is gone.
    locked: bool,
    /// Most recent relay-reported error, awaiting display.
    last_error: Option<String>,
}

impl ClientSynchronizer {
    /// Create a synchronizer with a locked surface and the starting position.
    pub fn new() -> Self {
        Self {
            session: None,
            color: None,
            local: ChessPosition::new(),
            authoritative_fen: None,
            move_history: Vec::new(),
            status: GameStatus::Ongoing,
            locked: true,
            last_error: None,
        }
    }

    // -------------------------------------------------------------------------
    // Authoritative message handlers
    // -------------------------------------------------------------------------

    /// Dispatch one message from the relay.
    pub fn handle_message(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::SessionCreated { session_id } => self.on_session_created(session_id),
            ServerMessage::GameStart { color, fen } => self.on_game_start(color, &fen),
            ServerMessage::Move {
                fen,
                status,
                move_history,
            } => self.on_move(&fen, status, move_history),
            ServerMessage::Error { message } => self.on_error(message),
            ServerMessage::OpponentDisconnected => self.on_opponent_disconnected(),
        }
    }

    /// A session was minted for this connection; remember the code so the
    /// user can share it.
    pub fn on_session_created(&mut self, session_id: String) {
        self.session = Some(session_id);
    }

    /// Both seats are filled: bind color and orientation, load the starting
    /// position, unlock the surface.
    pub fn on_game_start(&mut self, color: Color, fen: &str) {
        let Some(position) = Self::parse_authoritative(fen) else {
            return;
        };
        self.color = Some(color);
        self.local = position;
        self.authoritative_fen = Some(fen.to_string());
        self.move_history.clear();
        self.status = self.local.status();
        self.locked = false;
    }

    /// Reconcile against an authoritative move broadcast. Local optimistic
    /// state is unconditionally overwritten, which makes re-delivery of the
    /// same state a no-op.
    pub fn on_move(&mut self, fen: &str, status: GameStatus, move_history: Vec<String>) {
        let Some(position) = Self::parse_authoritative(fen) else {
            return;
        };
        self.local = position;
        self.authoritative_fen = Some(fen.to_string());
        self.status = status;
        self.move_history = move_history;
    }

    /// Surface a relay-reported rejection. State is untouched; the next
    /// authoritative broadcast governs.
    pub fn on_error(&mut self, message: String) {
        self.last_error = Some(message);
    }

    /// The peer is gone: lock the surface and reset session selection.
    pub fn on_opponent_disconnected(&mut self) {
        self.locked = true;
        self.session = None;
    }

    // -------------------------------------------------------------------------
    // Gesture handlers
    // -------------------------------------------------------------------------

    /// Whether a drag may begin on `square`: a color must be assigned, the
    /// game must be live, and the piece must be the player's own. Rejected
    /// gestures cost no network round-trip.
    pub fn on_drag_start(&self, square: &str) -> bool {
        if self.locked || self.status.is_terminal() {
            return false;
        }
        let Some(color) = self.color else {
            return false;
        };
        self.local.piece_color_at(square) == Some(color)
    }

    /// Resolve a drop gesture against the local optimistic position.
    ///
    /// A legal move advances the local position immediately and yields the
    /// intent to send; anything else snaps back with no message.
    pub fn on_drop(&mut self, from: &str, to: &str) -> DropOutcome {
        if from == to || self.locked || self.status.is_terminal() {
            return DropOutcome::Snapback;
        }

        let Ok(uci) = UciMove::from_squares(from, to) else {
            return DropOutcome::Snapback;
        };

        match self.local.apply_move(&uci) {
            Ok(_san) => DropOutcome::Intent(uci),
            Err(_) => DropOutcome::Snapback,
        }
    }

    /// Legal destination squares for the piece on `square`, for move hints.
    pub fn hint_targets(&self, square: &str) -> Vec<String> {
        if self.locked {
            return Vec::new();
        }
        self.local.legal_targets(square)
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Session code, once known.
    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }

    /// Assigned color, once the game has started.
    pub fn color(&self) -> Option<Color> {
        self.color
    }

    /// Board orientation: the assigned color, white before assignment.
    pub fn orientation(&self) -> Color {
        self.color.unwrap_or(Color::White)
    }

    /// Current (optimistic) position as FEN.
    pub fn fen(&self) -> String {
        self.local.to_fen()
    }

    /// Last authoritative FEN received, if any.
    pub fn authoritative_fen(&self) -> Option<&str> {
        self.authoritative_fen.as_deref()
    }

    /// Status from the last authoritative update.
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Displayed move history.
    pub fn move_history(&self) -> &[String] {
        &self.move_history
    }

    /// Whether the interactive surface is locked.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Take the pending error message for display, if any.
    pub fn take_error(&mut self) -> Option<String> {
        self.last_error.take()
    }

    fn parse_authoritative(fen: &str) -> Option<ChessPosition> {
        match ChessPosition::from_fen(fen) {
            Ok(position) => Some(position),
            Err(e) => {
                warn!("Discarding unparseable authoritative position: {}", e);
                None
            }
        }
    }
}

impl Default for ClientSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chesslink_core::START_FEN;

    fn started(color: Color) -> ClientSynchronizer {
        let mut sync = ClientSynchronizer::new();
        sync.on_game_start(color, START_FEN);
        sync
    }

    #[test]
    fn test_locked_until_game_start() {
        let sync = ClientSynchronizer::new();
        assert!(sync.is_locked());
        assert!(!sync.on_drag_start("e2"));
        assert!(sync.hint_targets("e2").is_empty());
    }

    #[test]
    fn test_game_start_unlocks_and_orients() {
        let sync = started(Color::Black);
        assert!(!sync.is_locked());
        assert_eq!(sync.color(), Some(Color::Black));
        assert_eq!(sync.orientation(), Color::Black);
        assert_eq!(sync.fen(), START_FEN);
    }

    #[test]
    fn test_drag_only_own_pieces() {
        let sync = started(Color::White);
        assert!(sync.on_drag_start("e2"));
        assert!(!sync.on_drag_start("e7"));
        assert!(!sync.on_drag_start("e4"));
    }

    #[test]
    fn test_drop_same_square_snaps_back() {
        let mut sync = started(Color::White);
        assert_eq!(sync.on_drop("e2", "e2"), DropOutcome::Snapback);
        assert_eq!(sync.fen(), START_FEN);
    }

    #[test]
    fn test_illegal_drop_snaps_back() {
        let mut sync = started(Color::White);
        assert_eq!(sync.on_drop("e2", "e5"), DropOutcome::Snapback);
        assert_eq!(sync.fen(), START_FEN);
    }

    #[test]
    fn test_legal_drop_advances_optimistically() {
        let mut sync = started(Color::White);
        let outcome = sync.on_drop("e2", "e4");
        assert_eq!(outcome, DropOutcome::Intent(UciMove::new("e2e4").unwrap()));
        assert_ne!(sync.fen(), START_FEN);
    }

    #[test]
    fn test_confirmation_matches_optimistic_state() {
        let mut sync = started(Color::White);
        sync.on_drop("e2", "e4");
        let optimistic = sync.fen();

        // the relay confirms with the identical authoritative position
        sync.on_move(&optimistic.clone(), GameStatus::Ongoing, vec!["e4".to_string()]);
        assert_eq!(sync.fen(), optimistic);
        assert_eq!(sync.authoritative_fen(), Some(optimistic.as_str()));
        assert_eq!(sync.move_history(), ["e4".to_string()]);
    }

    #[test]
    fn test_reconciliation_is_idempotent() {
        let mut sync = started(Color::White);
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";

        sync.on_move(fen, GameStatus::Ongoing, vec!["e4".to_string()]);
        let first = (sync.fen(), sync.status(), sync.move_history().to_vec());

        sync.on_move(fen, GameStatus::Ongoing, vec!["e4".to_string()]);
        let second = (sync.fen(), sync.status(), sync.move_history().to_vec());

        assert_eq!(first, second);
    }

    #[test]
    fn test_authoritative_overwrites_drifted_local() {
        let mut sync = started(Color::White);
        sync.on_drop("e2", "e4");

        // a broadcast disagreeing with the optimistic copy wins outright
        let authoritative = "rnbqkbnr/pppppppp/8/8/3P4/8/PPP1PPPP/RNBQKBNR b KQkq - 0 1";
        sync.on_move(authoritative, GameStatus::Ongoing, vec!["d4".to_string()]);
        assert_eq!(sync.fen(), authoritative);
    }

    #[test]
    fn test_error_leaves_state_untouched() {
        let mut sync = started(Color::White);
        sync.on_error("not your turn".to_string());

        assert_eq!(sync.fen(), START_FEN);
        assert!(sync.move_history().is_empty());
        assert_eq!(sync.take_error().as_deref(), Some("not your turn"));
        assert!(sync.take_error().is_none());
    }

    #[test]
    fn test_terminal_status_freezes_gestures() {
        let mut sync = started(Color::White);
        let mate = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";
        sync.on_move(mate, GameStatus::Checkmate, vec![]);

        assert!(!sync.on_drag_start("e2"));
        assert_eq!(sync.on_drop("e2", "e3"), DropOutcome::Snapback);
    }

    #[test]
    fn test_opponent_disconnected_locks_and_resets() {
        let mut sync = started(Color::White);
        sync.on_session_created("abc123".to_string());
        sync.on_opponent_disconnected();

        assert!(sync.is_locked());
        assert!(sync.session().is_none());
        assert!(!sync.on_drag_start("e2"));
    }

    #[test]
    fn test_hint_targets_follow_local_position() {
        let sync = started(Color::White);
        let mut targets = sync.hint_targets("g1");
        targets.sort();
        assert_eq!(targets, vec!["f3", "h3"]);
    }

    #[test]
    fn test_handle_message_dispatch() {
        let mut sync = ClientSynchronizer::new();
        sync.handle_message(ServerMessage::SessionCreated {
            session_id: "xyz789".to_string(),
        });
        assert_eq!(sync.session(), Some("xyz789"));

        sync.handle_message(ServerMessage::GameStart {
            color: Color::White,
            fen: START_FEN.to_string(),
        });
        assert!(!sync.is_locked());

        sync.handle_message(ServerMessage::OpponentDisconnected);
        assert!(sync.is_locked());
    }
}
