//! Game Data Module
//!
//! Value types shared by the session bridge and the wire protocol.
//!
//! ## Module Structure
//!
//! - `mark`: Coordinates, signs and marks
//! - `board`: Board dimensions, placement invariants, results

pub mod mark;
pub mod board;

// Re-export key types
pub use mark::{Coordinate, Mark, Sign};
pub use board::{Board, BoardError, Dimensions, GameResult};
