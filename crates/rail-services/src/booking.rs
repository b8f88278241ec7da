//! Booking orchestration
//!
//! `book` validates the request, prices it, then allocates and persists under
//! the inventory lock:
//!
//! ```text
//! lock(train, class, date) -> snapshot -> allocate -> insert -> unlock
//! ```
//!
//! Storage is the final arbiter. A seat claimed concurrently by another
//! process surfaces as `SeatConflict` and is retried with a fresh snapshot; a
//! PNR collision surfaces as `PnrConflict` and is retried with a new draw.

use chrono::NaiveDate;
use rail_core::{
    config::BookingConfig,
    models::{
        normalize_station_code, Booking, BookingStatus, ClassType, Contact, InventoryKey,
        Passenger, PassengerInput, Quota, Train,
    },
    traits::{BookingRepository, CatalogRepository, PaginatedResponse, Pagination, PaginationMeta},
    AppError, AppResult,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::allocator::{allocate, AllocationRequest};
use crate::availability::rac_capacity;
use crate::clock::{Clock, SystemClock};
use crate::fare::FareCalculator;
use crate::inventory::InventoryService;
use crate::locks::InventoryLocks;
use crate::pnr::{PnrGenerator, RandomPnrGenerator};

/// A booking request as submitted by an authenticated user
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BookingRequest {
    #[validate(length(min = 1, max = 10))]
    pub train_number: String,

    #[validate(length(min = 1, max = 10))]
    pub source_code: String,

    #[validate(length(min = 1, max = 10))]
    pub destination_code: String,

    pub journey_date: NaiveDate,

    pub class_type: ClassType,

    #[serde(default)]
    pub quota: Quota,

    #[validate(nested)]
    pub passengers: Vec<PassengerInput>,

    #[validate(nested)]
    pub contact: Contact,
}

pub struct BookingService<C: CatalogRepository, B: BookingRepository> {
    catalog: Arc<C>,
    bookings: Arc<B>,
    inventory: InventoryService<C, B>,
    fares: Arc<FareCalculator<C>>,
    locks: InventoryLocks,
    pnrs: Arc<dyn PnrGenerator>,
    clock: Arc<dyn Clock>,
    policy: BookingConfig,
}

impl<C: CatalogRepository, B: BookingRepository> BookingService<C, B> {
    pub fn new(
        catalog: Arc<C>,
        bookings: Arc<B>,
        fares: Arc<FareCalculator<C>>,
        policy: BookingConfig,
    ) -> Self {
        let clock = SystemClock::new(policy.utc_offset_minutes);
        Self {
            inventory: InventoryService::new(catalog.clone(), bookings.clone()),
            catalog,
            bookings,
            fares,
            locks: InventoryLocks::new(),
            pnrs: Arc::new(RandomPnrGenerator),
            clock: Arc::new(clock),
            policy,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_pnr_generator(mut self, pnrs: Arc<dyn PnrGenerator>) -> Self {
        self.pnrs = pnrs;
        self
    }

    pub fn policy(&self) -> &BookingConfig {
        &self.policy
    }

    fn validate_request(&self, request: &BookingRequest) -> AppResult<()> {
        request.validate()?;

        let count = request.passengers.len();
        if count == 0 || count > self.policy.max_passengers_per_booking {
            return Err(AppError::Validation(format!(
                "A booking must have between 1 and {} passengers, got {}",
                self.policy.max_passengers_per_booking, count
            )));
        }
        Ok(())
    }

    async fn train_for(&self, request: &BookingRequest) -> AppResult<Train> {
        let train = self
            .catalog
            .find_train(&request.train_number)
            .await?
            .ok_or_else(|| AppError::TrainNotFound(request.train_number.clone()))?;

        if !train.runs_on(request.journey_date) {
            return Err(AppError::TrainNotRunning {
                train: train.number,
                date: request.journey_date.to_string(),
            });
        }

        train.validate_direction(&request.source_code, &request.destination_code)?;

        if !train.offers_class(request.class_type) {
            return Err(AppError::NoCoachesForClass {
                train: train.number,
                class: request.class_type.to_string(),
            });
        }
        Ok(train)
    }

    /// Book seats for every passenger on the request
    ///
    /// RAC and waitlist outcomes are successful bookings.
    ///
    /// # Errors
    ///
    /// - `Validation` for malformed passengers, contact or party size
    /// - `TrainNotFound`, `TrainNotRunning`, `InvalidRoute`, `UnknownStation`
    /// - `NoCoachesForClass` when the class has no coaches on the train
    /// - `BookingFailed` when concurrent bookings kept taking the chosen seats
    /// - `PnrGenerationFailed` when no unique PNR could be drawn
    #[instrument(skip(self, request), fields(train = %request.train_number, date = %request.journey_date, class = %request.class_type))]
    pub async fn book(&self, request: BookingRequest, user_id: &str) -> AppResult<Booking> {
        self.validate_request(&request)?;
        let train = self.train_for(&request).await?;

        let quote = self
            .fares
            .compute_fare(
                &request.source_code,
                &request.destination_code,
                train.category,
                request.class_type,
                request.quota,
            )
            .await?;
        let total_fare = quote.total_fare * Decimal::from(request.passengers.len());

        let key = InventoryKey::new(train.number.as_str(), request.class_type, request.journey_date);
        let _guard = self.locks.acquire(&key).await;

        let mut seat_attempts = 0u32;
        let mut pnr_attempts = 0u32;

        loop {
            let snapshot = self.inventory.snapshot(&key).await?;
            let total = snapshot.total_capacity();

            let allocation = allocate(&AllocationRequest {
                passengers: &request.passengers,
                coaches: &snapshot.coaches,
                occupied: &snapshot.occupied,
                booked: snapshot.booked,
                rac_capacity: rac_capacity(total, self.policy.rac_percent),
                reserved_seat_numbers: &self.policy.reserved_seat_numbers,
                as_of: self.clock.today(),
                journey_date: request.journey_date,
            });

            let now = self.clock.now();
            let booking = Booking {
                id: Uuid::now_v7(),
                pnr: self.pnrs.generate(),
                user_id: user_id.to_string(),
                train_number: train.number.clone(),
                train_name: train.name.clone(),
                journey_date: request.journey_date,
                class_type: request.class_type,
                quota: request.quota,
                source_code: normalize_station_code(&request.source_code),
                destination_code: normalize_station_code(&request.destination_code),
                passengers: request
                    .passengers
                    .iter()
                    .cloned()
                    .zip(allocation.assignments)
                    .map(|(input, assignment)| Passenger::new(input, assignment))
                    .collect(),
                contact: request.contact.clone(),
                total_fare,
                status: BookingStatus::Booked,
                created_at: now,
                updated_at: now,
            };

            match self.bookings.insert(&booking).await {
                Ok(stored) => {
                    info!(
                        "Booked PNR {} for {} passengers on {} ({} confirmed)",
                        stored.pnr,
                        stored.passengers.len(),
                        key,
                        stored.confirmed_seats().len()
                    );
                    return Ok(stored);
                }
                Err(AppError::SeatConflict(seat)) => {
                    seat_attempts += 1;
                    warn!(
                        "Seat {} taken concurrently on {} (attempt {}/{})",
                        seat, key, seat_attempts, self.policy.max_booking_attempts
                    );
                    if seat_attempts >= self.policy.max_booking_attempts {
                        return Err(AppError::BookingFailed {
                            attempts: seat_attempts,
                        });
                    }
                }
                Err(AppError::PnrConflict(pnr)) => {
                    pnr_attempts += 1;
                    debug!("PNR {} already issued (attempt {})", pnr, pnr_attempts);
                    if pnr_attempts >= self.policy.max_pnr_attempts {
                        return Err(AppError::PnrGenerationFailed {
                            attempts: pnr_attempts,
                        });
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Cancel a booking owned by `user_id`
    ///
    /// Freed seats are available to the next allocation. RAC and waitlisted
    /// passengers on other bookings are not promoted.
    #[instrument(skip(self))]
    pub async fn cancel(&self, booking_id: Uuid, user_id: &str) -> AppResult<Booking> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::BookingNotFound(booking_id.to_string()))?;

        if !booking.is_owned_by(user_id) {
            warn!("User {} tried to cancel booking {}", user_id, booking.pnr);
            return Err(AppError::NotOwner);
        }
        if booking.is_cancelled() {
            return Err(AppError::AlreadyCancelled(booking.pnr));
        }

        let key = InventoryKey::new(
            booking.train_number.as_str(),
            booking.class_type,
            booking.journey_date,
        );
        let _guard = self.locks.acquire(&key).await;

        // A concurrent cancel may have won between the read and the lock
        let cancelled = self
            .bookings
            .cancel(booking_id)
            .await?
            .ok_or_else(|| AppError::AlreadyCancelled(booking.pnr.clone()))?;

        info!("Cancelled PNR {} on {}", cancelled.pnr, key);
        Ok(cancelled)
    }

    /// Public lookup by PNR
    #[instrument(skip(self))]
    pub async fn get_by_pnr(&self, pnr: &str) -> AppResult<Booking> {
        let pnr = pnr.trim();
        self.bookings
            .find_by_pnr(pnr)
            .await?
            .ok_or_else(|| AppError::BookingNotFound(pnr.to_string()))
    }

    /// A user's bookings, newest first
    #[instrument(skip(self))]
    pub async fn list_for_user(
        &self,
        user_id: &str,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<Booking>> {
        let (data, total) = self
            .bookings
            .list_by_user(user_id, pagination.limit(), pagination.offset())
            .await?;

        Ok(PaginatedResponse {
            data,
            pagination: PaginationMeta::new(total, pagination.page, pagination.per_page),
        })
    }
}
