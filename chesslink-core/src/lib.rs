//! # Chesslink Core
//!
//! Types shared by the chesslink relay and client:
//!
//! - `protocol`: JSON wire messages exchanged over the WebSocket transport
//! - `rules`: move validation and status classification via shakmaty
//! - `types`: colors, move notation, game status
//!
//! Both endpoints validate moves through the same [`rules::ChessPosition`],
//! which is what keeps client-side optimistic legality and server-side
//! authoritative legality in agreement.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod protocol;
pub mod rules;
pub mod types;

pub use protocol::{ClientMessage, ServerMessage};
pub use rules::{ChessPosition, RulesError};
pub use types::{Color, GameStatus, UciMove};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// FEN of the standard starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
