//! Station model

use serde::{Deserialize, Serialize};

/// A railway station
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Station {
    /// Canonical uppercase station code (e.g. "NDLS")
    pub code: String,

    pub name: String,

    /// Latitude in degrees, absent for stations without survey data
    pub latitude: Option<f64>,

    /// Longitude in degrees
    pub longitude: Option<f64>,

    pub state: Option<String>,

    /// Railway zone (e.g. "NR")
    pub zone: Option<String>,
}

impl Station {
    /// Coordinates as a (lat, lon) pair when both are known
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Normalise a station code for lookup.
pub fn normalize_station_code(code: &str) -> String {
    code.trim().to_uppercase()
}
