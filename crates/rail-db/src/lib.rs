//! Rail booking database layer
//!
//! PostgreSQL access and repository implementations:
//!
//! - Connection pool management and embedded migrations with sqlx
//! - Catalog repository for stations, trains and coaches
//! - Booking repository with transactional insert and cancel
//! - In-memory repositories with the same guarantees, for tests and demos

pub mod memory;
pub mod pool;
pub mod repositories;

pub use memory::{MemoryBookingRepository, MemoryCatalogRepository};
pub use pool::{create_pool, run_migrations};
pub use repositories::*;

// Re-export commonly used types
pub use rail_core::{AppError, AppResult};
pub use sqlx::{PgPool, Postgres, Transaction};
