//! User location persistence operations.

use anyhow::Result;
use chrono::{DateTime, Utc};
use geosync_core::PositionRecord;
use sqlx::SqlitePool;

/// Upsert the latest position for a user.
pub async fn upsert_location(pool: &SqlitePool, record: &PositionRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO user_locations (user_id, latitude, longitude, timestamp)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(user_id) DO UPDATE SET
            latitude = ?2, longitude = ?3, timestamp = ?4
        "#,
    )
    .bind(&record.user_id)
    .bind(record.latitude)
    .bind(record.longitude)
    .bind(record.observed_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load all persisted positions.
pub async fn load_all_locations(pool: &SqlitePool) -> Result<Vec<PositionRecord>> {
    let rows = sqlx::query_as::<_, LocationRow>(
        "SELECT user_id, latitude, longitude, timestamp FROM user_locations",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().filter_map(LocationRow::into_record).collect())
}

// Internal row type for SQLx
#[derive(sqlx::FromRow)]
struct LocationRow {
    user_id: String,
    latitude: f64,
    longitude: f64,
    timestamp: String,
}

impl LocationRow {
    /// A row whose timestamp cannot be read is skipped; broadcasting it with
    /// a fresh time would present a stale position as current.
    fn into_record(self) -> Option<PositionRecord> {
        let observed_at = match DateTime::parse_from_rfc3339(&self.timestamp) {
            Ok(ts) => ts.with_timezone(&Utc),
            Err(err) => {
                tracing::warn!(
                    user_id = %self.user_id,
                    "Skipping persisted location with unreadable timestamp {:?}: {}",
                    self.timestamp,
                    err
                );
                return None;
            }
        };

        Some(PositionRecord::new(
            self.user_id,
            self.latitude,
            self.longitude,
            observed_at,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::init_database;

    #[tokio::test]
    async fn upsert_overwrites_and_loads() {
        let db = init_database(":memory:", 1).await.unwrap();
        let first = PositionRecord::new("alice", 1.0, 2.0, Utc::now());
        upsert_location(db.pool(), &first).await.unwrap();

        let latest = PositionRecord::new("alice", 37.7, -122.4, Utc::now());
        upsert_location(db.pool(), &latest).await.unwrap();
        upsert_location(db.pool(), &PositionRecord::new("bob", 0.0, 0.0, Utc::now()))
            .await
            .unwrap();

        let mut rows = load_all_locations(db.pool()).await.unwrap();
        rows.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], latest);
        assert_eq!(rows[1].user_id, "bob");
    }

    #[tokio::test]
    async fn rows_with_unreadable_timestamps_are_skipped() {
        let db = init_database(":memory:", 1).await.unwrap();
        upsert_location(db.pool(), &PositionRecord::new("alice", 1.0, 2.0, Utc::now()))
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO user_locations (user_id, latitude, longitude, timestamp) \
             VALUES ('mallory', 3.0, 4.0, 'yesterday')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let rows = load_all_locations(db.pool()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, "alice");
    }

    #[tokio::test]
    async fn closed_pool_reports_failure() {
        let db = init_database(":memory:", 1).await.unwrap();
        db.pool().close().await;

        let record = PositionRecord::new("alice", 1.0, 2.0, Utc::now());
        assert!(upsert_location(db.pool(), &record).await.is_err());
    }
}
