//! Chesslink client: board synchronization against the authoritative relay.
//!
//! `sync` holds the optimistic/authoritative state machine, `network` the
//! WebSocket plumbing. A front-end renders whatever the synchronizer reports
//! and forwards user gestures to it; it never talks to the relay directly.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod network;
pub mod sync;

pub use network::{ClientError, Connection};
pub use sync::{ClientSynchronizer, DropOutcome};
