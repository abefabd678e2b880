//! Periodic position broadcast.
//!
//! Every interval the loop snapshots the store and publishes one
//! `userLocationUpdate` event to every connected stream. A failing or
//! panicking cycle is logged and the next tick still fires.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use geosync_core::ServerEvent;
use tokio::sync::broadcast;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::state::{Fanout, FanoutError, LocationStore};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// What one cycle published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Entries in the broadcast
    pub locations: usize,
    /// Streams the broadcast reached
    pub delivered: usize,
}

/// Start the broadcast loop. Returns when `shutdown` fires or its sender is dropped.
///
/// Shutdown is only observed between cycles, so a cycle that has started
/// always finishes.
pub async fn run_broadcast_loop(
    store: Arc<LocationStore>,
    fanout: Arc<dyn Fanout>,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    // `interval_at` panics on a zero period.
    let period = period.max(MIN_PERIOD);
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tracing::info!("Broadcast loop started (every {:?})", period);

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Broadcast loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                let cycle = panic::catch_unwind(AssertUnwindSafe(|| {
                    broadcast_once(&store, fanout.as_ref())
                }));
                match cycle {
                    Ok(Ok(report)) => {
                        tracing::debug!(
                            "Broadcast {} location(s) to {} subscriber(s)",
                            report.locations,
                            report.delivered
                        );
                    }
                    Ok(Err(err)) => {
                        tracing::error!("Location broadcast failed: {}", err);
                    }
                    Err(_) => {
                        tracing::error!("Location broadcast panicked; continuing");
                    }
                }
            }
        }
    }
}

/// Run one broadcast cycle: snapshot, map to wire records, publish.
pub fn broadcast_once(
    store: &LocationStore,
    fanout: &dyn Fanout,
) -> Result<CycleReport, FanoutError> {
    let snapshot = store.snapshot();
    let event = ServerEvent::from_records(snapshot.iter().map(|record| &**record));
    let delivered = fanout.publish(&event)?;
    Ok(CycleReport {
        locations: snapshot.len(),
        delivered,
    })
}
