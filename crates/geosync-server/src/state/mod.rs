//! Shared application state.

pub mod fanout;
pub mod store;

pub use fanout::{BroadcastHub, Fanout, FanoutError};
pub use store::LocationStore;

use anyhow::Result;
use dashmap::DashMap;
use geosync_core::TokenValidator;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::config::Config;
use crate::persistence::{locations as locations_db, Database};

/// Application state injected into every handler and loop.
pub struct AppState {
    config: Config,
    store: Arc<LocationStore>,
    validator: TokenValidator,
    hub: BroadcastHub,
    database: Option<Database>,
    write_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl AppState {
    /// In-memory only state.
    pub fn new(config: Config) -> Self {
        Self {
            validator: TokenValidator::new(config.jwt_secret.as_bytes(), config.jwt_leeway_secs),
            hub: BroadcastHub::new(config.broadcast_capacity),
            store: Arc::new(LocationStore::new()),
            database: None,
            write_locks: DashMap::new(),
            config,
        }
    }

    /// State with write-through persistence.
    pub fn with_database(db: Database, config: Config) -> Self {
        Self {
            database: Some(db),
            ..Self::new(config)
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<LocationStore> {
        &self.store
    }

    pub fn validator(&self) -> &TokenValidator {
        &self.validator
    }

    pub fn hub(&self) -> &BroadcastHub {
        &self.hub
    }

    pub fn database(&self) -> Option<&Database> {
        self.database.as_ref()
    }

    /// Load persisted positions into the store.
    pub async fn load_from_database(&self) -> Result<usize> {
        let Some(db) = &self.database else {
            return Ok(0);
        };
        let records = locations_db::load_all_locations(db.pool()).await?;
        let count = self.store.load(records);
        tracing::info!("Loaded {} persisted location(s)", count);
        Ok(count)
    }

    /// Serialize writers for one user so the persisted row and the in-memory
    /// record are always updated in the same order. Other users are unaffected.
    pub async fn lock_user(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .write_locks
            .entry(user_id.to_string())
            .or_default()
            .clone();
        lock.lock_owned().await
    }
}
