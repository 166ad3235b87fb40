//! Simulated Transport
//!
//! Delivers messages to the display layer after fixed delays, standing
//! in for a remote opponent. A single scheduler task owns the pending
//! queue, ordered by `(deadline, sequence)`: deliveries with the same
//! deadline leave in the order they were scheduled.

use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, trace};

use crate::network::protocol::GameMessage;

/// Identifier of one scheduled delivery.
pub type DeliveryId = u64;

/// Scheduler commands.
#[derive(Debug)]
enum Command {
    Schedule {
        id: DeliveryId,
        deadline: Instant,
        message: GameMessage,
    },
    Cancel(DeliveryId),
    CancelAll,
}

/// Cancellation handle for one scheduled delivery.
#[derive(Debug, Clone)]
pub struct DeliveryHandle {
    id: DeliveryId,
    commands: mpsc::UnboundedSender<Command>,
}

impl DeliveryHandle {
    /// Delivery identifier.
    pub fn id(&self) -> DeliveryId {
        self.id
    }

    /// Cancel the delivery. No effect if it already fired.
    pub fn cancel(&self) {
        let _ = self.commands.send(Command::Cancel(self.id));
    }
}

/// Timer-driven transport.
///
/// Dropping it stops the scheduler; anything still pending is dropped.
pub struct SimulatedTransport {
    commands: mpsc::UnboundedSender<Command>,
    next_id: DeliveryId,
    task: JoinHandle<()>,
}

impl SimulatedTransport {
    /// Spawn the scheduler. Due messages are sent to `sink`.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(sink: mpsc::Sender<GameMessage>) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_scheduler(rx, sink));

        Self {
            commands,
            next_id: 0,
            task,
        }
    }

    /// Deliver `message` once `delay` has elapsed.
    pub fn deliver_after(&mut self, delay: Duration, message: GameMessage) -> DeliveryHandle {
        let id = self.next_id;
        self.next_id += 1;

        let delay_ms = delay.as_millis() as u64;
        trace!(id, kind = message.kind(), delay_ms, "scheduling delivery");
        let _ = self.commands.send(Command::Schedule {
            id,
            deadline: Instant::now() + delay,
            message,
        });

        DeliveryHandle {
            id,
            commands: self.commands.clone(),
        }
    }

    /// Cancel every pending delivery.
    pub fn cancel_all(&self) {
        let _ = self.commands.send(Command::CancelAll);
    }
}

impl Drop for SimulatedTransport {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Scheduler loop: accept commands, fire due deliveries in order.
async fn run_scheduler(
    mut commands: mpsc::UnboundedReceiver<Command>,
    sink: mpsc::Sender<GameMessage>,
) {
    let mut pending: BTreeMap<(Instant, DeliveryId), GameMessage> = BTreeMap::new();

    loop {
        let next_deadline = pending.keys().next().map(|(deadline, _)| *deadline);
        let wake_at = next_deadline.unwrap_or_else(Instant::now);

        tokio::select! {
            command = commands.recv() => {
                match command {
                    Some(Command::Schedule { id, deadline, message }) => {
                        pending.insert((deadline, id), message);
                    }
                    Some(Command::Cancel(id)) => {
                        pending.retain(|(_, pending_id), _| *pending_id != id);
                    }
                    Some(Command::CancelAll) => {
                        if !pending.is_empty() {
                            debug!(count = pending.len(), "cancelling pending deliveries");
                        }
                        pending.clear();
                    }
                    None => break,
                }
            }
            _ = sleep_until(wake_at), if next_deadline.is_some() => {
                let now = Instant::now();
                while let Some(entry) = pending.first_entry() {
                    if entry.key().0 > now {
                        break;
                    }
                    let ((_, id), message) = entry.remove_entry();
                    trace!(id, kind = message.kind(), "delivering");
                    if sink.send(message).await.is_err() {
                        debug!("display channel closed, stopping scheduler");
                        return;
                    }
                }
            }
        }
    }
}
