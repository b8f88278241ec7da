//! Common traits for repositories and services
//!
//! Defines abstractions for reference data lookup, booking storage and
//! caching. Implementations live in `rail-db` and `rail-cache`.

use crate::error::AppError;
use crate::models::{Booking, ClassType, Coach, SeatKey, Station, Train};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Read-only reference data: stations, trains and coaches
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Find station by code. Codes are matched case-insensitively.
    async fn find_station(&self, code: &str) -> Result<Option<Station>, AppError>;

    /// Find train by number, including its route
    async fn find_train(&self, number: &str) -> Result<Option<Train>, AppError>;

    /// Coaches of one class on a train, ordered by coach code
    async fn find_coaches(
        &self,
        train_number: &str,
        class_type: ClassType,
    ) -> Result<Vec<Coach>, AppError>;
}

/// Booking storage
///
/// `insert` must reject a booking whose confirmed seats are already held by a
/// non-cancelled booking on the same train, class and date with
/// `AppError::SeatConflict`, and a duplicate PNR with `AppError::PnrConflict`.
/// Nothing is written when either check fails.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Seats held by confirmed passengers of non-cancelled bookings
    async fn occupied_seats(
        &self,
        train_number: &str,
        class_type: ClassType,
        journey_date: NaiveDate,
    ) -> Result<HashSet<SeatKey>, AppError>;

    /// Passenger slots (confirmed, RAC and waitlisted) on non-cancelled bookings
    async fn count_booked_passengers(
        &self,
        train_number: &str,
        class_type: ClassType,
        journey_date: NaiveDate,
    ) -> Result<i64, AppError>;

    /// Persist a booking and its passengers atomically
    async fn insert(&self, booking: &Booking) -> Result<Booking, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, AppError>;

    async fn find_by_pnr(&self, pnr: &str) -> Result<Option<Booking>, AppError>;

    /// Bookings made by a user, newest first, with the total count
    async fn list_by_user(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Booking>, i64), AppError>;

    /// Cancel a booking that is still booked.
    ///
    /// Returns `Ok(None)` when the booking exists but is no longer in the
    /// booked state, so two concurrent cancellations cannot both succeed.
    async fn cancel(&self, id: Uuid) -> Result<Option<Booking>, AppError>;
}

/// Cache service trait
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Get value from cache
    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError>;

    /// Set value in cache with TTL
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: u64,
    ) -> Result<(), AppError>;
}

/// Pagination parameters
#[derive(Debug, Clone, Default)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
}

impl Pagination {
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 100),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize)]
pub struct PaginationMeta {
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl PaginationMeta {
    pub fn new(total: i64, page: i64, per_page: i64) -> Self {
        let total_pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };

        Self {
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination() {
        let p = Pagination::new(3, 20);
        assert_eq!(p.offset(), 40);
        assert_eq!(p.limit(), 20);

        let p = Pagination::new(0, 500);
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, 100);
    }

    #[test]
    fn test_pagination_meta() {
        assert_eq!(PaginationMeta::new(0, 1, 10).total_pages, 0);
        assert_eq!(PaginationMeta::new(21, 1, 10).total_pages, 3);
    }
}
