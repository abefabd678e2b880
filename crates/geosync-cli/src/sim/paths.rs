//! Simulated movement paths for test clients.

use std::f64::consts::PI;

const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

/// Trait for path implementations.
pub trait MovementPath: Send + Sync {
    /// Get (lat, lon) at time t seconds from start.
    fn get_position(&self, t: f64) -> (f64, f64);
}

/// Circular path around a center point.
pub struct CircularPath {
    pub center_lat: f64,
    pub center_lon: f64,
    pub radius_m: f64,
    pub speed_mps: f64,
    period: f64,
}

impl CircularPath {
    /// Create a new circular path. A non-positive speed stays at the start point.
    pub fn new(center_lat: f64, center_lon: f64, radius_m: f64, speed_mps: f64) -> Self {
        let circumference = 2.0 * PI * radius_m;
        let period = if speed_mps > 0.0 {
            circumference / speed_mps
        } else {
            f64::INFINITY
        };

        Self {
            center_lat,
            center_lon,
            radius_m,
            speed_mps,
            period,
        }
    }
}

impl MovementPath for CircularPath {
    fn get_position(&self, t: f64) -> (f64, f64) {
        let angle_rad = 2.0 * PI * t / self.period;

        // Convert radius from meters to degrees (approximate)
        let lat_offset = (self.radius_m / METERS_PER_DEGREE_LAT) * angle_rad.cos();
        let lon_scale = METERS_PER_DEGREE_LAT * self.center_lat.to_radians().cos().max(1e-6);
        let lon_offset = (self.radius_m / lon_scale) * angle_rad.sin();

        (
            (self.center_lat + lat_offset).clamp(-90.0, 90.0),
            wrap_longitude(self.center_lon + lon_offset),
        )
    }
}

fn wrap_longitude(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        lon
    } else {
        (lon + 180.0).rem_euclid(360.0) - 180.0
    }
}
