//! Application configuration
//!
//! Centralized configuration loaded with the `config` crate from defaults,
//! optional files under `config/` and `RAIL__*` environment variables.

use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub fare: FareConfig,
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Allowed CORS origins, empty allows any
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    /// Whether a browser origin may call the API. An empty list allows any.
    pub fn allows_origin(&self, origin: &str) -> bool {
        self.cors_origins.is_empty()
            || self
                .cors_origins
                .iter()
                .any(|allowed| allowed.trim() == origin)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    num_cpus::get()
}

/// Database configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    /// Idle connection timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Run embedded migrations at startup
    #[serde(default)]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    2
}

fn default_acquire_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    600
}

/// Redis configuration
///
/// Redis only caches station and train reference data. Without a URL the
/// catalog is read straight from the database.
#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    /// Redis connection URL
    #[serde(default)]
    pub url: Option<String>,

    /// TTL for cached reference data in seconds
    #[serde(default = "default_cache_ttl")]
    pub default_ttl_secs: u64,
}

fn default_cache_ttl() -> u64 {
    300
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: None,
            default_ttl_secs: default_cache_ttl(),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// JWT signing secret shared with the identity provider
    pub jwt_secret: String,

    /// JWT token expiration in minutes
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_minutes: i64,
}

fn default_jwt_expiration() -> i64 {
    1440 // 24 hours
}

/// Booking policy
#[derive(Debug, Deserialize, Clone)]
pub struct BookingConfig {
    /// Seat numbers held back for disabled and senior passengers in every coach
    #[serde(default = "default_reserved_seats")]
    pub reserved_seat_numbers: Vec<i32>,

    /// RAC buffer as a percentage of confirmed capacity
    #[serde(default = "default_rac_percent")]
    pub rac_percent: u32,

    /// Maximum passengers on one booking
    #[serde(default = "default_max_passengers")]
    pub max_passengers_per_booking: usize,

    /// PNR draws before giving up
    #[serde(default = "default_max_pnr_attempts")]
    pub max_pnr_attempts: u32,

    /// Allocation attempts when a concurrent booking takes a seat first
    #[serde(default = "default_max_booking_attempts")]
    pub max_booking_attempts: u32,

    /// Offset of the railway's local calendar from UTC, in minutes
    #[serde(default = "default_utc_offset")]
    pub utc_offset_minutes: i32,
}

fn default_reserved_seats() -> Vec<i32> {
    vec![1, 4]
}

fn default_rac_percent() -> u32 {
    10
}

fn default_max_passengers() -> usize {
    6
}

fn default_max_pnr_attempts() -> u32 {
    5
}

fn default_max_booking_attempts() -> u32 {
    3
}

fn default_utc_offset() -> i32 {
    330 // IST
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            reserved_seat_numbers: default_reserved_seats(),
            rac_percent: default_rac_percent(),
            max_passengers_per_booking: default_max_passengers(),
            max_pnr_attempts: default_max_pnr_attempts(),
            max_booking_attempts: default_max_booking_attempts(),
            utc_offset_minutes: default_utc_offset(),
        }
    }
}

/// Per-km multiplier for each travel class
#[derive(Debug, Deserialize, Clone)]
pub struct ClassMultipliers {
    #[serde(default = "default_first_ac")]
    pub first_ac: Decimal,
    #[serde(default = "default_second_ac")]
    pub second_ac: Decimal,
    #[serde(default = "default_third_ac")]
    pub third_ac: Decimal,
    #[serde(default = "default_sleeper")]
    pub sleeper: Decimal,
    #[serde(default = "default_chair_car")]
    pub chair_car: Decimal,
    #[serde(default = "default_second_sitting")]
    pub second_sitting: Decimal,
}

fn default_first_ac() -> Decimal {
    Decimal::new(40, 1)
}

fn default_second_ac() -> Decimal {
    Decimal::new(30, 1)
}

fn default_third_ac() -> Decimal {
    Decimal::new(25, 1)
}

fn default_sleeper() -> Decimal {
    Decimal::ONE
}

fn default_chair_car() -> Decimal {
    Decimal::new(25, 1)
}

fn default_second_sitting() -> Decimal {
    Decimal::new(8, 1)
}

impl Default for ClassMultipliers {
    fn default() -> Self {
        Self {
            first_ac: default_first_ac(),
            second_ac: default_second_ac(),
            third_ac: default_third_ac(),
            sleeper: default_sleeper(),
            chair_car: default_chair_car(),
            second_sitting: default_second_sitting(),
        }
    }
}

/// Flat surcharge per train category
#[derive(Debug, Deserialize, Clone)]
pub struct CategorySurcharges {
    #[serde(default = "default_rajdhani")]
    pub rajdhani: Decimal,
    #[serde(default = "default_duronto")]
    pub duronto: Decimal,
    #[serde(default = "default_shatabdi")]
    pub shatabdi: Decimal,
    #[serde(default = "default_superfast")]
    pub superfast: Decimal,
    #[serde(default)]
    pub express: Decimal,
}

fn default_rajdhani() -> Decimal {
    Decimal::new(500, 0)
}

fn default_duronto() -> Decimal {
    Decimal::new(400, 0)
}

fn default_shatabdi() -> Decimal {
    Decimal::new(300, 0)
}

fn default_superfast() -> Decimal {
    Decimal::new(50, 0)
}

impl Default for CategorySurcharges {
    fn default() -> Self {
        Self {
            rajdhani: default_rajdhani(),
            duronto: default_duronto(),
            shatabdi: default_shatabdi(),
            superfast: default_superfast(),
            express: Decimal::ZERO,
        }
    }
}

/// Rate reduction applied to every kilometre beyond `above_km`
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TelescopicStep {
    pub above_km: Decimal,
    pub factor: Decimal,
}

/// Fare rules
#[derive(Debug, Deserialize, Clone)]
pub struct FareConfig {
    /// Base rate per kilometre before the class multiplier
    #[serde(default = "default_base_rate")]
    pub base_rate_per_km: Decimal,

    /// Distances below this are charged as this
    #[serde(default = "default_min_distance")]
    pub min_distance_km: Decimal,

    #[serde(default)]
    pub class_multipliers: ClassMultipliers,

    /// Cumulative rate reductions, applied per kilometre above each threshold
    #[serde(default = "default_telescopic_steps")]
    pub telescopic_steps: Vec<TelescopicStep>,

    #[serde(default)]
    pub surcharges: CategorySurcharges,

    /// Tatkal loading as a fraction of the running total
    #[serde(default = "default_tatkal_rate")]
    pub tatkal_rate: Decimal,

    /// Minimum tatkal loading
    #[serde(default = "default_tatkal_minimum")]
    pub tatkal_minimum: Decimal,

    /// Tax rate on air-conditioned classes
    #[serde(default = "default_gst_rate")]
    pub gst_rate: Decimal,

    /// Totals are rounded up to a multiple of this
    #[serde(default = "default_rounding_step")]
    pub rounding_step: Decimal,
}

fn default_base_rate() -> Decimal {
    Decimal::new(15, 1)
}

fn default_min_distance() -> Decimal {
    Decimal::new(50, 0)
}

fn default_telescopic_steps() -> Vec<TelescopicStep> {
    vec![
        TelescopicStep {
            above_km: Decimal::new(500, 0),
            factor: Decimal::new(9, 1),
        },
        TelescopicStep {
            above_km: Decimal::new(1000, 0),
            factor: Decimal::new(8, 1),
        },
    ]
}

fn default_tatkal_rate() -> Decimal {
    Decimal::new(30, 2)
}

fn default_tatkal_minimum() -> Decimal {
    Decimal::new(150, 0)
}

fn default_gst_rate() -> Decimal {
    Decimal::new(5, 2)
}

fn default_rounding_step() -> Decimal {
    Decimal::new(5, 0)
}

impl Default for FareConfig {
    fn default() -> Self {
        Self {
            base_rate_per_km: default_base_rate(),
            min_distance_km: default_min_distance(),
            class_multipliers: ClassMultipliers::default(),
            telescopic_steps: default_telescopic_steps(),
            surcharges: CategorySurcharges::default(),
            tatkal_rate: default_tatkal_rate(),
            tatkal_minimum: default_tatkal_minimum(),
            gst_rate: default_gst_rate(),
            rounding_step: default_rounding_step(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("redis.default_ttl_secs", 300)?
            .set_default("auth.jwt_expiration_minutes", 1440)?
            .set_default("booking.rac_percent", 10)?
            .set_default("booking.max_passengers_per_booking", 6)?
            .set_default("booking.max_pnr_attempts", 5)?
            .set_default("booking.max_booking_attempts", 3)?
            .set_default("booking.utc_offset_minutes", 330)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(
                Environment::with_prefix("RAIL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("RAIL").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Get the server bind address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn server(origins: &[&str]) -> ServerConfig {
        ServerConfig {
            host: default_host(),
            port: default_port(),
            workers: 1,
            cors_origins: origins.iter().map(|o| o.to_string()).collect(),
        }
    }

    #[test]
    fn test_cors_origins() {
        assert!(server(&[]).allows_origin("https://anywhere.example"));

        let restricted = server(&["https://rail.example", " http://localhost:5173 "]);
        assert!(restricted.allows_origin("https://rail.example"));
        assert!(restricted.allows_origin("http://localhost:5173"));
        assert!(!restricted.allows_origin("https://evil.example"));
    }

    #[test]
    fn test_default_booking_config() {
        let config = BookingConfig::default();
        assert_eq!(config.reserved_seat_numbers, vec![1, 4]);
        assert_eq!(config.rac_percent, 10);
        assert_eq!(config.max_passengers_per_booking, 6);
    }

    #[test]
    fn test_default_fare_config() {
        let config = FareConfig::default();
        assert_eq!(config.base_rate_per_km, dec!(1.5));
        assert_eq!(config.class_multipliers.first_ac, dec!(4.0));
        assert_eq!(config.class_multipliers.second_sitting, dec!(0.8));
        assert_eq!(config.surcharges.rajdhani, dec!(500));
        assert_eq!(config.telescopic_steps.len(), 2);
        assert_eq!(config.telescopic_steps[1].above_km, dec!(1000));
    }

    #[test]
    fn test_fare_section_overrides() {
        let config = Config::builder()
            .set_override("fare.base_rate_per_km", "2.0")
            .and_then(|b| b.set_override("fare.surcharges.rajdhani", "650"))
            .and_then(|b| b.build())
            .unwrap();

        let fare: FareConfig = config.get("fare").unwrap();
        assert_eq!(fare.base_rate_per_km, dec!(2.0));
        assert_eq!(fare.surcharges.rajdhani, dec!(650));
        assert_eq!(fare.surcharges.shatabdi, dec!(300));
        assert_eq!(fare.min_distance_km, dec!(50));
    }
}
