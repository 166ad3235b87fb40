//! Protocol Messages
//!
//! Messages delivered to the display layer, and the wire format used
//! by the relay transport. Every message is a plain JSON object, one per
//! WebSocket text frame. Variants are told apart by their field names
//! (no tag field), which keeps the shapes the display layer expects.

use serde::{Serialize, Deserialize};

use crate::game::board::{Board, Dimensions, GameResult};
use crate::game::mark::{Mark, Sign};

// =============================================================================
// INBOUND (TO DISPLAY LAYER) MESSAGES
// =============================================================================

/// Game-state messages forwarded to the display layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GameMessage {
    /// Connected, waiting for an opponent.
    Waiting(WaitingInfo),

    /// Opponent found, game starts.
    GameOn(GameOnInfo),

    /// Opponent placed a mark.
    MarkPlaced(MarkPlacedInfo),

    /// Game finished.
    GameEnded(GameEndedInfo),
}

/// Waiting for an opponent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitingInfo {
    /// Opaque placeholder; carries no meaning.
    pub waiting: String,
}

/// Game start information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOnInfo {
    /// Sign assigned to the local player.
    pub your_sign: Sign,
    /// Sign that moves next.
    pub now_has_turn: Sign,
    /// Starting board.
    pub board: Board,
}

/// A mark placed by the opponent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkPlacedInfo {
    /// The new mark.
    pub new_mark: Mark,
}

/// Game end information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEndedInfo {
    /// Final board.
    pub board: Board,
    /// Outcome for the local player.
    pub result: GameResult,
}

impl GameMessage {
    /// Waiting message with the given placeholder.
    pub fn waiting(placeholder: impl Into<String>) -> Self {
        Self::Waiting(WaitingInfo { waiting: placeholder.into() })
    }

    /// Game-on message: local player is `X`, `X` moves first, empty board.
    pub fn game_on(dimensions: Dimensions) -> Self {
        Self::GameOn(GameOnInfo {
            your_sign: Sign::X,
            now_has_turn: Sign::X,
            board: Board::new(dimensions),
        })
    }

    /// Mark-placed message.
    pub fn mark_placed(new_mark: Mark) -> Self {
        Self::MarkPlaced(MarkPlacedInfo { new_mark })
    }

    /// Game-ended message.
    pub fn game_ended(board: Board, result: GameResult) -> Self {
        Self::GameEnded(GameEndedInfo { board, result })
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            GameMessage::Waiting(_) => "waiting",
            GameMessage::GameOn(_) => "game_on",
            GameMessage::MarkPlaced(_) => "mark_placed",
            GameMessage::GameEnded(_) => "game_ended",
        }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

// =============================================================================
// DEBUG COMMANDS
// =============================================================================

/// Free-text commands fed through the display layer's debug channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugCommand {
    /// Open a connection (relay) or pretend to (simulated).
    Connect,
    /// Find an opponent (simulated only).
    SearchOpponent,
    /// Close the connection (relay only).
    Close,
}

impl DebugCommand {
    /// Parse a command, ignoring case. Unknown strings yield `None`.
    pub fn parse(command: &str) -> Option<Self> {
        match command.to_lowercase().as_str() {
            "connect" => Some(Self::Connect),
            "searchopponent" => Some(Self::SearchOpponent),
            "close" => Some(Self::Close),
            _ => None,
        }
    }
}
