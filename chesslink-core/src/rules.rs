//! Rules engine integration with shakmaty.
//!
//! Thin wrapper exposing exactly what the relay and the client need:
//! FEN handling, move validation and application, legal-move lookup, and
//! terminal-state classification. Both endpoints link this module, so local
//! and authoritative legality can never drift apart.

use shakmaty::{
    fen::Fen, san::San, uci::UciMove as ShakmatyUciMove, CastlingMode, Chess, Move, Position, Rank,
    Role,
};
use thiserror::Error;

use crate::types::{Color, GameStatus, UciMove};

/// Errors from parsing or applying moves and positions.
#[derive(Debug, Clone, Error)]
pub enum RulesError {
    /// FEN string could not be parsed into a position.
    #[error("invalid position: {0}")]
    InvalidFen(String),

    /// Move string could not be interpreted in the current position.
    #[error("invalid move: {0}")]
    InvalidMove(String),

    /// Move is well-formed but not legal in the current position.
    #[error("illegal move: {0}")]
    IllegalMove(String),
}

/// A chess position with validation and status classification.
#[derive(Debug, Clone)]
pub struct ChessPosition {
    position: Chess,
}

impl ChessPosition {
    /// The standard starting position.
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Chess::default(),
        }
    }

    /// Parse a position from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, RulesError> {
        let fen: Fen = fen
            .parse()
            .map_err(|e| RulesError::InvalidFen(format!("{e}")))?;
        let position: Chess = fen
            .into_position(CastlingMode::Standard)
            .map_err(|e| RulesError::InvalidFen(format!("{e}")))?;
        Ok(Self { position })
    }

    /// Serialize the position to FEN.
    #[must_use]
    pub fn to_fen(&self) -> String {
        Fen::from_position(self.position.clone(), shakmaty::EnPassantMode::Legal).to_string()
    }

    /// Whose turn it is to move.
    #[must_use]
    pub fn turn(&self) -> Color {
        self.position.turn().into()
    }

    /// Color of the piece on `square`, if any. `square` is coordinate
    /// notation (`"e2"`); anything unparseable reads as an empty square.
    #[must_use]
    pub fn piece_color_at(&self, square: &str) -> Option<Color> {
        let sq: shakmaty::Square = square.parse().ok()?;
        self.position.board().piece_at(sq).map(|p| p.color.into())
    }

    /// Classify the current position.
    #[must_use]
    pub fn status(&self) -> GameStatus {
        if self.position.is_checkmate() {
            GameStatus::Checkmate
        } else if self.position.is_stalemate() {
            GameStatus::Stalemate
        } else if self.position.is_insufficient_material() {
            GameStatus::Draw
        } else if self.position.is_check() {
            GameStatus::Check
        } else {
            GameStatus::Ongoing
        }
    }

    /// True when no further moves can be played.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.status().is_terminal()
    }

    /// Validate and apply a move, returning its SAN notation.
    ///
    /// The position is untouched when the move is rejected. Promotion is not
    /// negotiated: a pawn arriving on the last rank always queens, whatever
    /// suffix the intent carried.
    pub fn apply_move(&mut self, uci: &UciMove) -> Result<String, RulesError> {
        if self.is_game_over() {
            return Err(RulesError::IllegalMove(uci.to_string()));
        }

        let m = self.parse_uci(uci)?;

        // SAN depends on the position, so derive it before playing
        let san = San::from_move(&self.position, &m);

        if !self.position.is_legal(&m) {
            return Err(RulesError::IllegalMove(uci.to_string()));
        }

        self.position = self
            .position
            .clone()
            .play(&m)
            .map_err(|_| RulesError::IllegalMove(uci.to_string()))?;

        Ok(san.to_string())
    }

    /// Validate a move without applying it.
    pub fn validate_move(&self, uci: &UciMove) -> Result<(), RulesError> {
        if self.is_game_over() {
            return Err(RulesError::IllegalMove(uci.to_string()));
        }
        let m = self.parse_uci(uci)?;
        if !self.position.is_legal(&m) {
            return Err(RulesError::IllegalMove(uci.to_string()));
        }
        Ok(())
    }

    /// All legal moves in the current position, in coordinate notation.
    #[must_use]
    pub fn legal_moves(&self) -> Vec<UciMove> {
        self.position
            .legal_moves()
            .iter()
            .filter_map(|m| {
                let uci = ShakmatyUciMove::from_move(m, CastlingMode::Standard).to_string();
                UciMove::new(uci).ok()
            })
            .collect()
    }

    /// Destination squares of every legal move starting on `square`.
    #[must_use]
    pub fn legal_targets(&self, square: &str) -> Vec<String> {
        let mut targets: Vec<String> = Vec::new();
        for m in self.legal_moves() {
            if m.from_square() == square && !targets.iter().any(|t| t == m.to_square()) {
                targets.push(m.to_square().to_string());
            }
        }
        targets
    }

    // --- Private helper methods ---

    /// Parse a coordinate move, resolving implicit promotion to a queen.
    fn parse_uci(&self, uci: &UciMove) -> Result<Move, RulesError> {
        let parsed: ShakmatyUciMove = uci
            .as_str()
            .parse()
            .map_err(|_| RulesError::InvalidMove(uci.to_string()))?;

        let parsed = match parsed {
            ShakmatyUciMove::Normal { from, to, .. } if self.is_promotion_push(from, to) => {
                ShakmatyUciMove::Normal {
                    from,
                    to,
                    promotion: Some(Role::Queen),
                }
            }
            other => other,
        };

        parsed
            .to_move(&self.position)
            .map_err(|_| RulesError::IllegalMove(uci.to_string()))
    }

    fn is_promotion_push(&self, from: shakmaty::Square, to: shakmaty::Square) -> bool {
        self.position
            .board()
            .piece_at(from)
            .is_some_and(|p| p.role == Role::Pawn)
            && matches!(to.rank(), Rank::First | Rank::Eighth)
    }
}

impl Default for ChessPosition {
    fn default() -> Self {
        Self::new()
    }
}
