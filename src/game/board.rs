//! Board State
//!
//! Fixed-size grid plus the marks placed on it, in play order.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::game::mark::{Coordinate, Mark};
use crate::{BOARD_HEIGHT, BOARD_WIDTH};

/// Board size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    /// Columns.
    pub width: u32,
    /// Rows.
    pub height: u32,
}

impl Dimensions {
    /// Create dimensions.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of cells (`width * height`).
    pub fn cells(&self) -> usize {
        (u64::from(self.width) * u64::from(self.height)) as usize
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self::new(BOARD_WIDTH, BOARD_HEIGHT)
    }
}

/// Final outcome carried by a game-ended message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    /// The local player won.
    Won,
    /// The local player lost.
    Lost,
    /// Nobody won.
    Draw,
}

/// Board placement errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    /// Another mark already sits on this coordinate.
    #[error("coordinate {0} is already occupied")]
    Occupied(Coordinate),

    /// Every cell has been used.
    #[error("board is full ({capacity} marks)")]
    Full {
        /// Maximum number of marks.
        capacity: usize,
    },
}

/// Game board.
///
/// Marks are kept in insertion order, which is play order. Placement
/// through [`Board::place`] and [`Board::place_all`] enforces two
/// invariants: at most `width * height` marks, and no two marks on the
/// same coordinate. [`Board::record`] and boards decoded from the wire
/// skip these checks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// Board size.
    pub dimensions: Dimensions,
    marks: Vec<Mark>,
}

impl Board {
    /// Create an empty board.
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            marks: Vec::new(),
        }
    }

    /// Marks in play order.
    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    /// Number of marks placed.
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    /// Whether no marks are placed.
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Maximum number of marks.
    pub fn capacity(&self) -> usize {
        self.dimensions.cells()
    }

    /// Mark at a coordinate, if any.
    pub fn mark_at(&self, coordinate: Coordinate) -> Option<&Mark> {
        self.marks.iter().find(|m| m.coordinate == coordinate)
    }

    /// Place a single mark.
    pub fn place(&mut self, mark: Mark) -> Result<(), BoardError> {
        self.place_all(&[mark])
    }

    /// Place several marks at once. Either all are placed or none.
    pub fn place_all(&mut self, marks: &[Mark]) -> Result<(), BoardError> {
        let capacity = self.capacity();
        if self.marks.len() + marks.len() > capacity {
            return Err(BoardError::Full { capacity });
        }

        for (i, mark) in marks.iter().enumerate() {
            let clashes_earlier = marks[..i].iter().any(|m| m.coordinate == mark.coordinate);
            if clashes_earlier || self.mark_at(mark.coordinate).is_some() {
                return Err(BoardError::Occupied(mark.coordinate));
            }
        }

        self.marks.extend_from_slice(marks);
        Ok(())
    }

    /// Append marks as played, without any checks.
    pub fn record(&mut self, marks: &[Mark]) {
        self.marks.extend_from_slice(marks);
    }

    /// Remove every mark, keeping the dimensions.
    pub fn clear(&mut self) {
        self.marks.clear();
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(Dimensions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::mark::Sign;

    #[test]
    fn test_default_board_is_five_by_five() {
        let board = Board::default();
        assert_eq!(board.dimensions, Dimensions::new(5, 5));
        assert_eq!(board.capacity(), 25);
        assert!(board.is_empty());
    }

    #[test]
    fn test_place_keeps_play_order() {
        let mut board = Board::default();
        board.place(Mark::new(2, 2, Sign::X)).unwrap();
        board.place(Mark::new(0, 1, Sign::O)).unwrap();
        board.place(Mark::new(1, 0, Sign::X)).unwrap();

        let coords: Vec<_> = board.marks().iter().map(|m| m.coordinate).collect();
        assert_eq!(
            coords,
            vec![Coordinate::new(2, 2), Coordinate::new(0, 1), Coordinate::new(1, 0)]
        );
    }

    #[test]
    fn test_record_skips_checks() {
        let mut board = Board::new(Dimensions::new(1, 1));
        board.place(Mark::new(0, 0, Sign::X)).unwrap();
        board.record(&[Mark::new(0, 0, Sign::O), Mark::new(7, 7, Sign::X)]);
        assert_eq!(board.len(), 3);
        assert_eq!(board.marks()[1], Mark::new(0, 0, Sign::O));
    }

    #[test]
    fn test_occupied_coordinate_rejected() {
        let mut board = Board::default();
        board.place(Mark::new(1, 1, Sign::X)).unwrap();

        let result = board.place(Mark::new(1, 1, Sign::O));
        assert_eq!(result, Err(BoardError::Occupied(Coordinate::new(1, 1))));
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn test_place_all_is_atomic() {
        let mut board = Board::default();
        board.place(Mark::new(3, 0, Sign::X)).unwrap();

        let result = board.place_all(&[Mark::new(2, 0, Sign::O), Mark::new(3, 0, Sign::X)]);
        assert!(matches!(result, Err(BoardError::Occupied(_))));
        assert_eq!(board.len(), 1);
        assert!(board.mark_at(Coordinate::new(2, 0)).is_none());
    }

    #[test]
    fn test_place_all_rejects_duplicates_within_batch() {
        let mut board = Board::default();
        let result = board.place_all(&[Mark::new(0, 0, Sign::X), Mark::new(0, 0, Sign::O)]);
        assert_eq!(result, Err(BoardError::Occupied(Coordinate::new(0, 0))));
        assert!(board.is_empty());
    }

    #[test]
    fn test_full_board_rejected() {
        let mut board = Board::new(Dimensions::new(2, 1));
        board.place_all(&[Mark::new(0, 0, Sign::X), Mark::new(1, 0, Sign::O)]).unwrap();

        let result = board.place(Mark::new(5, 5, Sign::X));
        assert_eq!(result, Err(BoardError::Full { capacity: 2 }));
    }

    #[test]
    fn test_clear_keeps_dimensions() {
        let mut board = Board::new(Dimensions::new(3, 4));
        board.place(Mark::new(0, 0, Sign::X)).unwrap();
        board.clear();
        assert!(board.is_empty());
        assert_eq!(board.dimensions, Dimensions::new(3, 4));
    }

    #[test]
    fn test_board_wire_shape() {
        let mut board = Board::new(Dimensions::new(5, 5));
        board.place(Mark::new(0, 0, Sign::X)).unwrap();

        let value = serde_json::to_value(&board).unwrap();
        assert_eq!(value["dimensions"]["width"], 5);
        assert_eq!(value["dimensions"]["height"], 5);
        assert_eq!(value["marks"][0]["sign"], "X");
    }

    #[test]
    fn test_wire_board_is_not_validated() {
        let json = r#"{"dimensions":{"width":1,"height":1},"marks":[
            {"coordinate":{"x":0,"y":0},"sign":"X"},
            {"coordinate":{"x":0,"y":0},"sign":"O"}]}"#;
        let board: Board = serde_json::from_str(json).unwrap();
        assert_eq!(board.len(), 2);
    }
}
