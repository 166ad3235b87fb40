//! Tictac Relay
//!
//! Line-based stand-in for the display layer. Reads marks (JSON objects)
//! and debug commands from stdin, writes every game message it receives
//! to stdout as one JSON line. Logs go to stderr.
//!
//! ```text
//! $ tictac-relay
//! connect
//! searchopponent
//! {"coordinate":{"x":0,"y":0},"sign":"X"}
//! ```

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use tictac_relay::{BridgeConfig, GameMessage, Mark, SessionBridge, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = BridgeConfig::from_env()?;
    info!("Tictac Relay v{}", VERSION);
    info!("Mode: {}", config.mode);
    info!(
        "Opponent delay: {:?}, connect delay: {:?}, relay connect timeout: {:?}",
        config.session.opponent_delay, config.session.connect_delay, config.relay.connect_timeout
    );

    let (display_tx, mut display_rx) = mpsc::channel::<GameMessage>(64);
    let mut bridge = SessionBridge::new(config, display_tx);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => handle_line(&mut bridge, line.trim()).await,
                    None => {
                        info!("stdin closed, shutting down");
                        break;
                    }
                }
            }
            Some(message) = display_rx.recv() => {
                let mut json = message.to_json()?;
                json.push('\n');
                stdout.write_all(json.as_bytes()).await?;
                stdout.flush().await?;
            }
        }
    }

    Ok(())
}

/// Route one input line: JSON objects are marks, anything else is a
/// debug command.
async fn handle_line(bridge: &mut SessionBridge, line: &str) {
    if line.is_empty() {
        return;
    }

    if line.starts_with('{') {
        let mark = match Mark::from_json(line) {
            Ok(mark) => mark,
            Err(e) => {
                warn!("Invalid mark: {} - {}", e, line);
                return;
            }
        };
        if let Err(e) = bridge.submit_mark(mark) {
            warn!("Mark {} rejected: {}", mark, e);
        }
    } else if let Err(e) = bridge.issue_debug_command(line).await {
        warn!("Command {:?} failed: {}", line, e);
    }
}
