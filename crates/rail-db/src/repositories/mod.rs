//! Repository implementations
//!
//! Concrete implementations of the repository traits defined in rail-core,
//! using sqlx for PostgreSQL access.

pub mod booking_repo;
pub mod catalog_repo;

pub use booking_repo::PgBookingRepository;
pub use catalog_repo::PgCatalogRepository;
