//! `update_location` handling: authenticate, validate, write through.

use chrono::Utc;
use geosync_core::{LocationUpdate, PositionRecord};
use thiserror::Error;
use tracing::{debug, error};

use crate::persistence::locations as locations_db;
use crate::state::AppState;

/// Rejection reported back to the originating connection.
/// The `Display` text is the exact client-visible message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UpdateError {
    #[error("Invalid or expired token")]
    Unauthorized,
    #[error("Invalid latitude or longitude")]
    InvalidCoordinates,
    #[error("Failed to update location")]
    Storage,
}

/// Apply one position update.
///
/// The identity always comes from the verified token; a `user_id` sent in
/// the payload is never read. On any error the store is left untouched.
pub async fn handle_update_location(
    state: &AppState,
    update: LocationUpdate,
) -> Result<PositionRecord, UpdateError> {
    let Some(token) = update.token.as_deref() else {
        debug!("Rejected location update without a token");
        return Err(UpdateError::Unauthorized);
    };
    let user_id = state.validator().validate(token).map_err(|err| {
        debug!("Rejected location update: {}", err);
        UpdateError::Unauthorized
    })?;

    let (latitude, longitude) = match (update.latitude, update.longitude) {
        (Some(lat), Some(lon)) if state.config().bounds.contains(lat, lon) => (lat, lon),
        (lat, lon) => {
            debug!(
                "Rejected location update for {}: lat={:?} lon={:?}",
                user_id, lat, lon
            );
            return Err(UpdateError::InvalidCoordinates);
        }
    };

    let _guard = state.lock_user(&user_id).await;
    let record = PositionRecord::new(user_id, latitude, longitude, Utc::now());

    if let Some(db) = state.database() {
        if let Err(err) = locations_db::upsert_location(db.pool(), &record).await {
            error!("Failed to persist location for {}: {:#}", record.user_id, err);
            return Err(UpdateError::Storage);
        }
    }
    state.store().put(record.clone());

    debug!(
        "Updated location for user {}: ({}, {})",
        record.user_id, record.latitude, record.longitude
    );
    Ok(record)
}
