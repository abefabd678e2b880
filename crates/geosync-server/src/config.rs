//! Server configuration from environment.

use geosync_core::CoordinateBounds;
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEV_JWT_SECRET: &str = "geosync-dev-secret";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub jwt_secret: String,
    pub jwt_leeway_secs: u64,
    pub broadcast_interval: Duration,
    pub broadcast_capacity: usize,
    pub persistence_enabled: bool,
    pub database_path: String,
    pub database_max_connections: u32,
    pub require_stream_token: bool,
    pub bounds: CoordinateBounds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_leeway_secs: 0,
            broadcast_interval: Duration::from_secs(5),
            broadcast_capacity: 256,
            persistence_enabled: true,
            database_path: "data/geosync.db".to_string(),
            database_max_connections: 5,
            require_stream_token: false,
            bounds: CoordinateBounds::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let jwt_secret = match env::var("GEOSYNC_JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ => {
                tracing::warn!("GEOSYNC_JWT_SECRET not set; using the development secret");
                defaults.jwt_secret
            }
        };

        Self {
            server_port: parse_env("GEOSYNC_PORT").unwrap_or(defaults.server_port),
            jwt_secret,
            jwt_leeway_secs: parse_env("GEOSYNC_JWT_LEEWAY_SECS")
                .unwrap_or(defaults.jwt_leeway_secs),
            broadcast_interval: parse_env::<u64>("GEOSYNC_BROADCAST_INTERVAL_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.broadcast_interval),
            broadcast_capacity: parse_env::<usize>("GEOSYNC_BROADCAST_CAPACITY")
                .filter(|cap| *cap > 0)
                .unwrap_or(defaults.broadcast_capacity),
            persistence_enabled: parse_bool_env("GEOSYNC_PERSISTENCE")
                .unwrap_or(defaults.persistence_enabled),
            database_path: env::var("GEOSYNC_DATABASE_PATH")
                .unwrap_or(defaults.database_path),
            database_max_connections: parse_env("GEOSYNC_DATABASE_MAX_CONNECTIONS")
                .unwrap_or(defaults.database_max_connections),
            require_stream_token: parse_bool_env("GEOSYNC_REQUIRE_STREAM_TOKEN")
                .unwrap_or(defaults.require_stream_token),
            bounds: CoordinateBounds {
                min_lat: parse_env("GEOSYNC_LAT_MIN").unwrap_or(defaults.bounds.min_lat),
                max_lat: parse_env("GEOSYNC_LAT_MAX").unwrap_or(defaults.bounds.max_lat),
                min_lon: parse_env("GEOSYNC_LON_MIN").unwrap_or(defaults.bounds.min_lon),
                max_lon: parse_env("GEOSYNC_LON_MAX").unwrap_or(defaults.bounds.max_lon),
            },
        }
    }
}

fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn parse_bool_env(key: &str) -> Option<bool> {
    let value = env::var(key).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
