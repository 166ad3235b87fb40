//! Network Layer
//!
//! Session bridge plus the transports it drives: a timer-driven
//! simulator and a WebSocket relay client.

pub mod protocol;
pub mod session;
pub mod transport;
pub mod simulated;
pub mod relay;

pub use protocol::{
    GameMessage, WaitingInfo, GameOnInfo, MarkPlacedInfo, GameEndedInfo, DebugCommand,
};
pub use session::{
    SessionBridge, SessionConfig, SessionState, SessionError, SessionId, BridgeConfig,
    ConfigError, Exchange, derive_opponent_mark,
};
pub use transport::{Transport, TransportMode, TransportError};
pub use simulated::{SimulatedTransport, DeliveryHandle, DeliveryId};
pub use relay::{RelayTransport, RelayConfig, ConnectionState};
