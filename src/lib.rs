//! # Tictac Relay
//!
//! Game session bridge for a two-player mark-placing board game.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       TICTAC RELAY                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  game/              - Plain data                             │
//! │  ├── mark.rs        - Coordinates, signs, marks              │
//! │  └── board.rs       - Board and placement invariants         │
//! │                                                              │
//! │  network/           - Session and transports                 │
//! │  ├── protocol.rs    - Message types and debug commands       │
//! │  ├── session.rs     - Session bridge, mock opponent          │
//! │  ├── transport.rs   - Transport selection and errors         │
//! │  ├── simulated.rs   - Delayed delivery scheduler             │
//! │  └── relay.rs       - WebSocket relay client                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Message Flow
//!
//! The display layer submits marks and debug commands to a
//! [`SessionBridge`]. The bridge hands them to its transport, which
//! eventually produces [`GameMessage`]s on the display channel: after a
//! fixed delay in simulated mode, or whenever the relay peer sends one.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod game;
pub mod network;

// Re-export commonly used types
pub use game::{Board, BoardError, Coordinate, Dimensions, GameResult, Mark, Sign};
pub use network::{
    BridgeConfig, GameMessage, SessionBridge, SessionConfig, SessionError, TransportError,
    TransportMode,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default board width.
pub const BOARD_WIDTH: u32 = 5;

/// Default board height.
pub const BOARD_HEIGHT: u32 = 5;

/// Simulated exchanges before the game ends.
pub const END_GAME_AFTER_MESSAGES: u32 = 3;

/// Simulated opponent reply delay (ms).
pub const DEFAULT_OPPONENT_DELAY_MS: u64 = 1000;

/// Simulated connect / search reply delay (ms).
pub const DEFAULT_CONNECT_DELAY_MS: u64 = 1500;
