//! Server-wide events

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use crate::findmy::LocationRecord;

/// Capacity of the event channel; slow subscribers see `Lagged`.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Something other subsystems may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    /// Friend locations accepted into the cache from a helper push.
    FriendLocationsUpdated(Vec<LocationRecord>),
}

/// Create the event channel.
pub fn channel() -> (broadcast::Sender<BridgeEvent>, broadcast::Receiver<BridgeEvent>) {
    broadcast::channel(EVENT_CHANNEL_CAPACITY)
}

/// Log every event until all senders are gone. Returns how many were seen.
pub async fn log_events(mut rx: broadcast::Receiver<BridgeEvent>) -> usize {
    let mut seen = 0;
    loop {
        match rx.recv().await {
            Ok(BridgeEvent::FriendLocationsUpdated(records)) => {
                seen += 1;
                for record in &records {
                    debug!(
                        handle = record.key().unwrap_or_default(),
                        status = ?record.status,
                        last_updated = record.last_updated_or_zero(),
                        "Friend location updated"
                    );
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Event logger fell behind");
            }
            Err(RecvError::Closed) => return seen,
        }
    }
}
