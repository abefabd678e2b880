//! In-memory location store using DashMap.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use geosync_core::PositionRecord;
use std::sync::Arc;

/// Latest known position per user.
///
/// Records are immutable once written; an upsert swaps in a fresh `Arc`, so a
/// snapshot only clones pointers and can never observe a half-written record.
/// DashMap shards keys, so writers on different users do not contend.
#[derive(Debug, Default)]
pub struct LocationStore {
    records: DashMap<String, Arc<PositionRecord>>,
}

impl LocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite the record for `user_id`.
    pub fn upsert(&self, user_id: &str, latitude: f64, longitude: f64, observed_at: DateTime<Utc>) {
        self.put(PositionRecord::new(user_id, latitude, longitude, observed_at));
    }

    /// Insert a complete record, replacing any previous one for the same user.
    pub fn put(&self, record: PositionRecord) {
        self.records
            .insert(record.user_id.clone(), Arc::new(record));
    }

    /// Seed the store from persisted records.
    pub fn load<I>(&self, records: I) -> usize
    where
        I: IntoIterator<Item = PositionRecord>,
    {
        let mut count = 0;
        for record in records {
            self.put(record);
            count += 1;
        }
        count
    }

    pub fn get(&self, user_id: &str) -> Option<Arc<PositionRecord>> {
        self.records.get(user_id).map(|r| Arc::clone(r.value()))
    }

    /// Point-in-time copy of every record, in no particular order.
    pub fn snapshot(&self) -> Vec<Arc<PositionRecord>> {
        self.records.iter().map(|r| Arc::clone(r.value())).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
