//! Domain types shared by the relay and the client.
//!
//! Everything here is serializable and free of engine internals so the wire
//! protocol and both endpoints can agree on a single vocabulary.

use serde::{Deserialize, Serialize};

/// Side of the board a participant plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    /// White pieces. Moves first.
    White,
    /// Black pieces.
    Black,
}

impl Color {
    /// Get the opposite color.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    /// The color to move after `moves_played` moves have been applied.
    ///
    /// This parity rule is the entire turn-enforcement logic: an even number
    /// of applied moves means white is to move. The relay and the client must
    /// both derive turns from this function so they can never disagree.
    #[must_use]
    pub const fn to_move(moves_played: usize) -> Self {
        if moves_played % 2 == 0 {
            Self::White
        } else {
            Self::Black
        }
    }
}

impl From<shakmaty::Color> for Color {
    fn from(c: shakmaty::Color) -> Self {
        match c {
            shakmaty::Color::White => Self::White,
            shakmaty::Color::Black => Self::Black,
        }
    }
}

impl From<Color> for shakmaty::Color {
    fn from(c: Color) -> Self {
        match c {
            Color::White => Self::White,
            Color::Black => Self::Black,
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::White => write!(f, "white"),
            Self::Black => write!(f, "black"),
        }
    }
}

/// Classification of a position after a move has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Game continues, side to move is not in check.
    Ongoing,
    /// Game continues, side to move is in check.
    Check,
    /// Side to move is checkmated.
    Checkmate,
    /// Side to move has no legal moves but is not in check.
    Stalemate,
    /// Drawn by insufficient material.
    Draw,
}

impl GameStatus {
    /// True when no further moves can be played.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Checkmate | Self::Stalemate | Self::Draw)
    }
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ongoing => write!(f, "ongoing"),
            Self::Check => write!(f, "check"),
            Self::Checkmate => write!(f, "checkmate"),
            Self::Stalemate => write!(f, "stalemate"),
            Self::Draw => write!(f, "draw"),
        }
    }
}

/// A move intent in coordinate notation: origin and destination squares,
/// optionally a promotion piece letter (e.g. `"e2e4"`, `"e7e8q"`).
///
/// Construction validates the format only; legality is the rules engine's
/// business.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UciMove(String);

impl UciMove {
    /// Create a move from a coordinate string.
    pub fn new(s: impl Into<String>) -> Result<Self, &'static str> {
        let s = s.into();
        if !s.is_ascii() || s.len() < 4 || s.len() > 5 {
            return Err("move must be 4-5 characters");
        }
        validate_square(&s[0..2])?;
        validate_square(&s[2..4])?;
        if s.len() == 5 {
            let promo = s.as_bytes()[4] as char;
            if !['q', 'r', 'b', 'n'].contains(&promo) {
                return Err("promotion must be q, r, b, or n");
            }
        }
        Ok(Self(s))
    }

    /// Create a move from separate origin and destination squares.
    pub fn from_squares(from: &str, to: &str) -> Result<Self, &'static str> {
        Self::new(format!("{from}{to}"))
    }

    /// The move as a coordinate string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The origin square (e.g. `"e2"`).
    #[must_use]
    pub fn from_square(&self) -> &str {
        &self.0[0..2]
    }

    /// The destination square (e.g. `"e4"`).
    #[must_use]
    pub fn to_square(&self) -> &str {
        &self.0[2..4]
    }

    /// The promotion piece letter, if one was given.
    #[must_use]
    pub fn promotion(&self) -> Option<char> {
        self.0.chars().nth(4)
    }
}

fn validate_square(s: &str) -> Result<(), &'static str> {
    let bytes = s.as_bytes();
    if !(b'a'..=b'h').contains(&bytes[0]) {
        return Err("file must be a-h");
    }
    if !(b'1'..=b'8').contains(&bytes[1]) {
        return Err("rank must be 1-8");
    }
    Ok(())
}

impl std::fmt::Display for UciMove {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UciMove {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_opposite() {
        assert_eq!(Color::White.opposite(), Color::Black);
        assert_eq!(Color::Black.opposite(), Color::White);
    }

    #[test]
    fn test_turn_parity() {
        assert_eq!(Color::to_move(0), Color::White);
        assert_eq!(Color::to_move(1), Color::Black);
        assert_eq!(Color::to_move(2), Color::White);
        assert_eq!(Color::to_move(15), Color::Black);
    }

    #[test]
    fn test_color_wire_names() {
        assert_eq!(serde_json::to_string(&Color::White).unwrap(), "\"white\"");
        assert_eq!(serde_json::to_string(&Color::Black).unwrap(), "\"black\"");
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_string(&GameStatus::Ongoing).unwrap(), "\"ongoing\"");
        assert_eq!(serde_json::to_string(&GameStatus::Checkmate).unwrap(), "\"checkmate\"");
    }

    #[test]
    fn test_status_terminal() {
        assert!(!GameStatus::Ongoing.is_terminal());
        assert!(!GameStatus::Check.is_terminal());
        assert!(GameStatus::Checkmate.is_terminal());
        assert!(GameStatus::Stalemate.is_terminal());
        assert!(GameStatus::Draw.is_terminal());
    }

    #[test]
    fn test_uci_move_valid() {
        let m = UciMove::new("e2e4").unwrap();
        assert_eq!(m.from_square(), "e2");
        assert_eq!(m.to_square(), "e4");
        assert!(m.promotion().is_none());

        let promo = UciMove::new("e7e8q").unwrap();
        assert_eq!(promo.promotion(), Some('q'));
    }

    #[test]
    fn test_uci_move_invalid() {
        assert!(UciMove::new("e2").is_err());
        assert!(UciMove::new("e2e4e5").is_err());
        assert!(UciMove::new("e2e4x").is_err());
        assert!(UciMove::new("i2i4").is_err());
        assert!(UciMove::new("e0e4").is_err());
    }

    #[test]
    fn test_uci_from_squares() {
        let m = UciMove::from_squares("g1", "f3").unwrap();
        assert_eq!(m.as_str(), "g1f3");
        assert!(UciMove::from_squares("g1", "zz").is_err());
    }
}
