//! Marks and Coordinates
//!
//! The smallest units of play: a sign placed at a grid coordinate.

use std::fmt;
use serde::{Serialize, Deserialize};

/// Grid coordinate.
///
/// Not bounds-checked against any board; the mock opponent may step
/// off the grid and the relay forwards whatever it receives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Coordinate {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Coordinate {
    /// Create a coordinate.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Coordinate one column to the right, or `None` on overflow.
    #[inline]
    pub fn checked_right(self) -> Option<Self> {
        Some(Self::new(self.x.checked_add(1)?, self.y))
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Player marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sign {
    /// Crosses. Always moves first.
    X,
    /// Noughts.
    O,
}

impl Sign {
    /// The other player's sign.
    #[inline]
    pub const fn opponent(self) -> Self {
        match self {
            Sign::X => Sign::O,
            Sign::O => Sign::X,
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sign::X => f.write_str("X"),
            Sign::O => f.write_str("O"),
        }
    }
}

/// A sign placed at a coordinate. Immutable once created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mark {
    /// Where the sign was placed.
    pub coordinate: Coordinate,
    /// Which sign was placed.
    pub sign: Sign,
}

impl Mark {
    /// Create a mark from raw coordinates.
    #[inline]
    pub const fn new(x: i32, y: i32, sign: Sign) -> Self {
        Self {
            coordinate: Coordinate::new(x, y),
            sign,
        }
    }

    /// Serialize to the JSON wire form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from the JSON wire form.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.sign, self.coordinate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_opponent() {
        assert_eq!(Sign::X.opponent(), Sign::O);
        assert_eq!(Sign::O.opponent(), Sign::X);
        assert_eq!(Sign::X.opponent().opponent(), Sign::X);
    }

    #[test]
    fn test_checked_right() {
        assert_eq!(Coordinate::new(2, 3).checked_right(), Some(Coordinate::new(3, 3)));
        assert_eq!(Coordinate::new(i32::MAX, 0).checked_right(), None);
    }

    #[test]
    fn test_mark_wire_shape() {
        let json = Mark::new(1, 2, Sign::X).to_json().unwrap();
        assert_eq!(json, r#"{"coordinate":{"x":1,"y":2},"sign":"X"}"#);
    }

    #[test]
    fn test_mark_json_roundtrip() {
        let mark = Mark::new(-4, 17, Sign::O);
        let parsed = Mark::from_json(&mark.to_json().unwrap()).unwrap();
        assert_eq!(parsed, mark);
    }

    #[test]
    fn test_mark_rejects_unknown_sign() {
        let result = Mark::from_json(r#"{"coordinate":{"x":0,"y":0},"sign":"Z"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Mark::new(0, 4, Sign::O).to_string(), "O@(0, 4)");
    }
}
