//! Geozone position type.

use serde::{Deserialize, Serialize};

/// A device position, as reported by the platform location provider.
///
/// Ephemeral: positions are sent to the backend and dropped, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl GeoPosition {
    /// Creates a position.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}
