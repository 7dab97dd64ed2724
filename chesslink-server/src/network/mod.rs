//! Network Layer
//!
//! WebSocket relay for real-time session synchronization. All rules
//! evaluation goes through `chesslink_core`; this layer only routes and
//! authorizes.

pub mod server;
pub mod session;

pub use server::{GameServer, GameServerError, ServerConfig};
pub use session::{
    GameSession, MoveOutcome, SeatRemoval, SessionError, SessionId, SessionManager, SessionState,
};
