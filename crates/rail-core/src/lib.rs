//! Rail booking core library
//!
//! Foundational types shared by every crate in the workspace:
//!
//! - Domain models (stations, trains, coaches, bookings)
//! - Repository and cache traits
//! - Unified error handling with HTTP response mapping
//! - Application configuration

pub mod config;
pub mod error;
pub mod models;
pub mod traits;

pub use config::AppConfig;
pub use error::AppError;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
