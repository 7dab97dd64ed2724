//! Protocol messages.
//!
//! Wire format for client-relay communication over WebSocket. Every frame is
//! a JSON object with a `type` discriminator.

use serde::{Deserialize, Serialize};

use crate::types::{Color, GameStatus};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Mint a fresh session and take the white seat.
    Create,

    /// Join an existing session by its shared code.
    Join {
        /// Session code obtained out-of-band from the host.
        session_id: String,
    },

    /// Move intent: origin and destination squares in coordinate notation
    /// (promotion is implicit and always resolves to a queen).
    Move {
        /// The candidate move, e.g. `"e2e4"`.
        #[serde(rename = "move")]
        uci: String,
    },
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A session was created for this connection; share the code with the
    /// intended opponent.
    SessionCreated {
        /// The freshly minted session code.
        session_id: String,
    },

    /// Both seats are filled; play begins from `fen`.
    GameStart {
        /// Color assigned to the receiving connection.
        color: Color,
        /// Authoritative starting position.
        fen: String,
    },

    /// Authoritative state after a successfully applied move. Broadcast to
    /// every participant, the mover included.
    Move {
        /// Authoritative position after the move.
        fen: String,
        /// Terminal-state classification of the new position.
        status: GameStatus,
        /// Full move history in standard algebraic notation.
        move_history: Vec<String>,
    },

    /// A rejected intent or join failure. Sent to the offending connection
    /// only; never terminates the session.
    Error {
        /// Human-readable reason.
        message: String,
    },

    /// The peer's connection was lost. The session is no longer playable.
    OpponentDisconnected,
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_json_roundtrip() {
        let msg = ClientMessage::Move {
            uci: "e2e4".to_string(),
        };

        let json = msg.to_json().unwrap();
        let parsed = ClientMessage::from_json(&json).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_server_message_json_roundtrip() {
        let msg = ServerMessage::Move {
            fen: "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1".to_string(),
            status: GameStatus::Ongoing,
            move_history: vec!["e4".to_string()],
        };

        let json = msg.to_json().unwrap();
        let parsed = ServerMessage::from_json(&json).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_create_wire_shape() {
        let json = ClientMessage::Create.to_json().unwrap();
        assert_eq!(json, r#"{"type":"create"}"#);
    }

    #[test]
    fn test_move_intent_field_named_move() {
        let json = ClientMessage::Move {
            uci: "e2e4".to_string(),
        }
        .to_json()
        .unwrap();
        assert_eq!(json, r#"{"type":"move","move":"e2e4"}"#);
    }

    #[test]
    fn test_game_start_wire_shape() {
        let json = ServerMessage::GameStart {
            color: Color::Black,
            fen: "fen".to_string(),
        }
        .to_json()
        .unwrap();
        assert!(json.contains(r#""type":"game_start""#));
        assert!(json.contains(r#""color":"black""#));
    }

    #[test]
    fn test_move_broadcast_wire_shape() {
        let json = ServerMessage::Move {
            fen: "fen".to_string(),
            status: GameStatus::Checkmate,
            move_history: vec![],
        }
        .to_json()
        .unwrap();
        assert!(json.contains(r#""type":"move""#));
        assert!(json.contains(r#""status":"checkmate""#));
    }

    #[test]
    fn test_opponent_disconnected_wire_shape() {
        let json = ServerMessage::OpponentDisconnected.to_json().unwrap();
        assert_eq!(json, r#"{"type":"opponent_disconnected"}"#);
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(ClientMessage::from_json(r#"{"type":"shout"}"#).is_err());
        assert!(ClientMessage::from_json("not json").is_err());
    }
}
