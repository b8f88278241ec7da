//! API layer for the rail booking engine
//!
//! HTTP handlers for fares, availability and bookings. Handlers are generic
//! over the catalog and booking stores so the same routes run against
//! PostgreSQL in production and the in-memory stores in tests.

#![forbid(unsafe_code)]

pub mod dto;
pub mod handlers;
pub mod state;

pub use dto::{ApiResponse, PaginationParams};
pub use handlers::configure;
pub use state::AppState;
