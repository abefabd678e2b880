//! Delivery of server events to every connected stream.
//!
//! Uses a single `tokio::sync::broadcast` channel. Each event is serialized
//! once and every WebSocket task forwards the shared text frame.

use geosync_core::ServerEvent;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

#[derive(Debug, Error)]
pub enum FanoutError {
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("fan-out unavailable: {0}")]
    Unavailable(String),
}

/// Something that can deliver one event to all current subscribers.
pub trait Fanout: Send + Sync {
    /// Returns the number of subscribers the event was handed to.
    fn publish(&self, event: &ServerEvent) -> Result<usize, FanoutError>;
}

/// Broadcast hub shared by all stream connections.
#[derive(Debug, Clone)]
pub struct BroadcastHub {
    tx: broadcast::Sender<Arc<str>>,
}

impl BroadcastHub {
    /// Slow receivers that fall more than `capacity` frames behind skip ahead.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Each stream connection subscribes once.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<str>> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Fanout for BroadcastHub {
    fn publish(&self, event: &ServerEvent) -> Result<usize, FanoutError> {
        let payload: Arc<str> = serde_json::to_string(event)?.into();
        // send() errors only when nobody is listening.
        Ok(self.tx.send(payload).unwrap_or(0))
    }
}
