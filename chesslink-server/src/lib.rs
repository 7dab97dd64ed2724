//! # Chesslink Relay
//!
//! Authoritative relay for two-player chess sessions.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      CHESSLINK RELAY                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  network/          - Networking and authoritative state      │
//! │  ├── server.rs     - WebSocket accept loop, per-connection   │
//! │  │                   protocol handler                        │
//! │  └── session.rs    - Session store: positions, seats, turn   │
//! │                      and color authorization                 │
//! │                                                              │
//! │  chesslink_core    - Shared wire protocol and rules engine   │
//! │                      (also linked by the client)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Authority Guarantee
//!
//! The position held by the session store is the single source of truth.
//! Clients validate optimistically for responsiveness, but every move is
//! re-validated here against the same rules contract before it is applied
//! and broadcast. Within one session all mutations serialize through the
//! session lock; independent sessions proceed in parallel.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod network;

pub use network::{GameServer, GameServerError, ServerConfig, SessionManager};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
