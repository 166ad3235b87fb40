//! Transport Adapter
//!
//! Two delivery modes behind one shape: a timer-driven simulator and a
//! WebSocket relay. The mode is fixed when the bridge is built.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::network::protocol::GameMessage;
use crate::network::relay::{RelayConfig, RelayTransport};
use crate::network::simulated::SimulatedTransport;

/// Which transport to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    /// Fake opponent driven by timers.
    #[default]
    Simulated,
    /// Live WebSocket relay.
    Relay,
}

impl FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simulated" | "sim" => Ok(Self::Simulated),
            "relay" => Ok(Self::Relay),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::Simulated => f.write_str("simulated"),
            TransportMode::Relay => f.write_str("relay"),
        }
    }
}

/// Transport errors surfaced to the session bridge.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No open relay connection.
    #[error("not connected")]
    NotConnected,

    /// Outgoing frame queue is full.
    #[error("outgoing queue is full")]
    QueueFull,

    /// Opening the WebSocket failed.
    #[error("connect failed: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),

    /// The relay did not complete the handshake in time.
    #[error("connect timed out after {0:?}")]
    ConnectTimeout(std::time::Duration),

    /// Encoding an outgoing frame failed.
    #[error("encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The active transport.
pub enum Transport {
    /// Timer-driven simulator.
    Simulated(SimulatedTransport),
    /// WebSocket relay.
    Relay(RelayTransport),
}

impl Transport {
    /// Build a transport for `mode`. Inbound messages go to `sink`.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(mode: TransportMode, relay: RelayConfig, sink: mpsc::Sender<GameMessage>) -> Self {
        match mode {
            TransportMode::Simulated => Transport::Simulated(SimulatedTransport::new(sink)),
            TransportMode::Relay => Transport::Relay(RelayTransport::new(relay, sink)),
        }
    }

    /// Mode of this transport.
    pub fn mode(&self) -> TransportMode {
        match self {
            Transport::Simulated(_) => TransportMode::Simulated,
            Transport::Relay(_) => TransportMode::Relay,
        }
    }

    /// Whether messages can currently be sent. The simulator always can.
    pub fn is_connected(&self) -> bool {
        match self {
            Transport::Simulated(_) => true,
            Transport::Relay(relay) => relay.is_connected(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse() {
        assert_eq!("simulated".parse::<TransportMode>(), Ok(TransportMode::Simulated));
        assert_eq!("RELAY".parse::<TransportMode>(), Ok(TransportMode::Relay));
        let unknown = "carrier-pigeon".parse::<TransportMode>();
        assert_eq!(unknown, Err("carrier-pigeon".to_string()));
    }

    #[test]
    fn test_mode_default_and_display() {
        assert_eq!(TransportMode::default(), TransportMode::Simulated);
        assert_eq!(TransportMode::Relay.to_string(), "relay");
    }

    #[tokio::test]
    async fn test_transport_new_picks_mode() {
        let (tx, _rx) = mpsc::channel(8);
        let sim = Transport::new(TransportMode::Simulated, RelayConfig::default(), tx.clone());
        assert_eq!(sim.mode(), TransportMode::Simulated);
        assert!(sim.is_connected());

        let relay = Transport::new(TransportMode::Relay, RelayConfig::default(), tx);
        assert_eq!(relay.mode(), TransportMode::Relay);
        assert!(!relay.is_connected());
    }
}
