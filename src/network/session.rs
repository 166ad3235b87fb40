//! Game Session Bridge
//!
//! Sits between the display layer and the active transport. Outgoing
//! marks go to the transport; in simulated mode the bridge also plays
//! the opponent and decides when the game ends. Inbound messages reach
//! the display layer through the channel given at construction.

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, info_span, warn};

use crate::game::board::{Board, Dimensions, GameResult};
use crate::game::mark::{Coordinate, Mark};
use crate::network::protocol::{DebugCommand, GameMessage};
use crate::network::relay::RelayConfig;
use crate::network::transport::{Transport, TransportError, TransportMode};
use crate::{
    BOARD_HEIGHT, BOARD_WIDTH, DEFAULT_CONNECT_DELAY_MS, DEFAULT_OPPONENT_DELAY_MS,
    END_GAME_AFTER_MESSAGES,
};

/// Unique session identifier.
pub type SessionId = [u8; 16];

/// Placeholder carried by the waiting message.
pub const WAITING_PLACEHOLDER: &str = "searching";

/// Configuration for a game session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Board size.
    pub dimensions: Dimensions,
    /// Exchanges after which the simulated game ends.
    pub end_game_after_messages: u32,
    /// Delay before a simulated opponent move is delivered.
    pub opponent_delay: Duration,
    /// Delay before simulated connect / search replies are delivered.
    pub connect_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dimensions: Dimensions::new(BOARD_WIDTH, BOARD_HEIGHT),
            end_game_after_messages: END_GAME_AFTER_MESSAGES,
            opponent_delay: Duration::from_millis(DEFAULT_OPPONENT_DELAY_MS),
            connect_delay: Duration::from_millis(DEFAULT_CONNECT_DELAY_MS),
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by `TICTAC_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            dimensions: Dimensions::new(
                env_or("TICTAC_BOARD_WIDTH", defaults.dimensions.width)?,
                env_or("TICTAC_BOARD_HEIGHT", defaults.dimensions.height)?,
            ),
            end_game_after_messages: env_or(
                "TICTAC_END_GAME_AFTER",
                defaults.end_game_after_messages,
            )?,
            opponent_delay: Duration::from_millis(env_or(
                "TICTAC_OPPONENT_DELAY_MS",
                DEFAULT_OPPONENT_DELAY_MS,
            )?),
            connect_delay: Duration::from_millis(env_or(
                "TICTAC_CONNECT_DELAY_MS",
                DEFAULT_CONNECT_DELAY_MS,
            )?),
        })
    }
}

/// Everything needed to build a bridge.
#[derive(Debug, Clone, Default)]
pub struct BridgeConfig {
    /// Transport to run.
    pub mode: TransportMode,
    /// Session settings.
    pub session: SessionConfig,
    /// Relay settings (used in relay mode).
    pub relay: RelayConfig,
}

impl BridgeConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mode = match std::env::var("TICTAC_MODE") {
            Ok(value) => TransportMode::from_str(&value).map_err(ConfigError::UnknownMode)?,
            Err(_) => TransportMode::default(),
        };

        Ok(Self {
            mode,
            session: SessionConfig::from_env()?,
            relay: RelayConfig::from_env(),
        })
    }
}

/// Read and parse an environment variable, falling back to `default`.
fn env_or<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Variable set but not parseable.
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },

    /// Unknown transport mode.
    #[error("unknown transport mode: {0:?}")]
    UnknownMode(String),
}

/// Session errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// No opponent move can be derived from this coordinate.
    #[error("no opponent move next to {0}")]
    OpponentOutOfRange(Coordinate),
}

/// Simulated opponent's reply to `last`: one column right, other sign.
///
/// Mock behavior only; there are no game rules behind it.
pub fn derive_opponent_mark(last: &Mark) -> Option<Mark> {
    Some(Mark {
        coordinate: last.coordinate.checked_right()?,
        sign: last.sign.opponent(),
    })
}

/// Messages produced by one simulated exchange, in delivery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// The opponent's reply.
    pub placed: GameMessage,
    /// Present when this exchange ended the game.
    pub ended: Option<GameMessage>,
}

impl Exchange {
    /// Messages in delivery order.
    pub fn into_messages(self) -> Vec<GameMessage> {
        std::iter::once(self.placed).chain(self.ended).collect()
    }
}

/// Per-session counters and board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// Exchanges since the last reset.
    pub message_count: u32,
    /// Marks accumulated since the last reset.
    pub board: Board,
}

impl SessionState {
    /// Empty state.
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            message_count: 0,
            board: Board::new(dimensions),
        }
    }

    /// Back to `(0, empty)`.
    pub fn reset(&mut self) {
        self.message_count = 0;
        self.board.clear();
    }

    /// Record the player's mark and the opponent's reply.
    ///
    /// Both marks are appended as played, even onto occupied or
    /// off-grid cells. Fails only when no reply can be derived, and
    /// then nothing changes.
    pub fn record_exchange(
        &mut self,
        mark: Mark,
        config: &SessionConfig,
    ) -> Result<Exchange, SessionError> {
        let reply = derive_opponent_mark(&mark)
            .ok_or(SessionError::OpponentOutOfRange(mark.coordinate))?;
        self.board.record(&[mark, reply]);
        self.message_count += 1;

        let ended = if self.message_count >= config.end_game_after_messages {
            let message = GameMessage::game_ended(self.board.clone(), GameResult::Won);
            self.reset();
            Some(message)
        } else {
            None
        };

        Ok(Exchange {
            placed: GameMessage::mark_placed(reply),
            ended,
        })
    }
}

/// Bridge between the display layer and one transport.
pub struct SessionBridge {
    id: SessionId,
    config: SessionConfig,
    state: SessionState,
    transport: Transport,
}

impl SessionBridge {
    /// Build a bridge. Inbound messages are sent to `display`.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(config: BridgeConfig, display: mpsc::Sender<GameMessage>) -> Self {
        let transport = Transport::new(config.mode, config.relay, display);
        Self::with_transport(config.session, transport)
    }

    /// Build a bridge around an existing transport.
    pub fn with_transport(config: SessionConfig, transport: Transport) -> Self {
        let id = uuid::Uuid::new_v4().into_bytes();
        info!(session = %hex::encode(&id[..4]), mode = %transport.mode(), "Session created");

        Self {
            id,
            state: SessionState::new(config.dimensions),
            config,
            transport,
        }
    }

    /// Session identifier.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Current counters and board.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Active transport mode.
    pub fn mode(&self) -> TransportMode {
        self.transport.mode()
    }

    /// Whether the transport can currently send.
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Submit the local player's mark.
    pub fn submit_mark(&mut self, mark: Mark) -> Result<(), SessionError> {
        let session = hex::encode(&self.id[..4]);
        let _span = info_span!("submit_mark", %session, %mark).entered();

        match &mut self.transport {
            Transport::Simulated(sim) => {
                let exchange = self.state.record_exchange(mark, &self.config)?;
                if exchange.ended.is_some() {
                    info!("Simulated game ended");
                }
                for message in exchange.into_messages() {
                    sim.deliver_after(self.config.opponent_delay, message);
                }
                debug!(count = self.state.message_count, "Exchange recorded");
            }
            Transport::Relay(relay) => {
                relay.send(&mark)?;
            }
        }

        Ok(())
    }

    /// Handle a free-text debug command. Unknown commands are ignored.
    pub async fn issue_debug_command(&mut self, command: &str) -> Result<(), SessionError> {
        let Some(parsed) = DebugCommand::parse(command) else {
            debug!(command, "Ignoring unrecognized debug command");
            return Ok(());
        };

        let mode = self.transport.mode();
        match (&mut self.transport, parsed) {
            (Transport::Simulated(sim), DebugCommand::Connect) => {
                let message = GameMessage::waiting(WAITING_PLACEHOLDER);
                sim.deliver_after(self.config.connect_delay, message);
            }
            (Transport::Simulated(sim), DebugCommand::SearchOpponent) => {
                let message = GameMessage::game_on(self.config.dimensions);
                sim.deliver_after(self.config.connect_delay, message);
            }
            (Transport::Relay(relay), DebugCommand::Connect) => {
                relay.connect().await?;
            }
            (Transport::Relay(relay), DebugCommand::Close) => {
                relay.close().await;
            }
            (Transport::Simulated(_), DebugCommand::Close)
            | (Transport::Relay(_), DebugCommand::SearchOpponent) => {
                debug!(?parsed, %mode, "Command not supported by transport");
            }
        }

        Ok(())
    }

    /// Clear the session and cancel every pending simulated delivery.
    pub fn reset(&mut self) {
        if let Transport::Simulated(sim) = &self.transport {
            sim.cancel_all();
        }
        if !self.state.board.is_empty() {
            warn!(marks = self.state.board.len(), "Resetting session mid-game");
        }
        self.state.reset();
    }
}
