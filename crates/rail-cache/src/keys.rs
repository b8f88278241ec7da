//! Cache key builders
//!
//! # Key Patterns
//!
//! - `station:{code}` - Station by uppercase code
//! - `train:{number}` - Train with its route
//! - `coaches:{number}:{class}` - Coach layouts of one class on a train
//!
//! Availability and occupancy are never cached.
//!
//! # Example
//!
//! ```
//! use rail_cache::keys;
//!
//! assert_eq!(keys::station_key("ndls"), "station:NDLS");
//! assert_eq!(keys::train_key("12951"), "train:12951");
//! ```

use rail_core::models::{normalize_station_code, ClassType};

/// Prefix for cached stations
pub const STATION_PREFIX: &str = "station";

/// Prefix for cached trains
pub const TRAIN_PREFIX: &str = "train";

/// Prefix for cached coach layouts
pub const COACHES_PREFIX: &str = "coaches";

/// Default TTL for reference data (1 hour)
pub const REFERENCE_TTL_SECS: u64 = 3600;

pub fn station_key(code: &str) -> String {
    format!("{}:{}", STATION_PREFIX, normalize_station_code(code))
}

pub fn train_key(number: &str) -> String {
    format!("{}:{}", TRAIN_PREFIX, number.trim())
}

pub fn coaches_key(train_number: &str, class_type: ClassType) -> String {
    format!("{}:{}:{}", COACHES_PREFIX, train_number.trim(), class_type.code())
}
