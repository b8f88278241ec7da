//! Business logic services for the rail booking engine
//!
//! Leaf-first:
//!
//! - `FareCalculator` - distance and fare from station coordinates
//! - `InventoryService` - coach layouts and live seat occupancy
//! - `AvailabilityService` - confirmed / RAC / waitlist counters
//! - `allocator` - pure seat assignment for one booking request
//! - `BookingService` - book, cancel and look up reservations
//!
//! Fare and allocation are CPU-only. Everything that touches storage is
//! async and instrumented with tracing.

pub mod allocator;
pub mod availability;
pub mod booking;
pub mod clock;
pub mod fare;
pub mod inventory;
pub mod locks;
pub mod pnr;

pub use allocator::{allocate, AllocationRequest, AllocationResult};
pub use availability::{Availability, AvailabilityService, AvailabilityStatus};
pub use booking::{BookingRequest, BookingService};
pub use clock::{Clock, FixedClock, SystemClock};
pub use fare::{FareCalculator, FareQuote};
pub use inventory::{CoachVacancy, InventoryService, InventorySnapshot};
pub use locks::InventoryLocks;
pub use pnr::{PnrGenerator, RandomPnrGenerator, SequencePnrGenerator};

/// Business logic constants
pub mod constants {
    /// Passengers older than this are seniors
    pub const SENIOR_AGE: i32 = 51;

    /// Female passengers this age or older are seniors
    pub const SENIOR_FEMALE_AGE: i32 = 45;

    /// Digits in a PNR
    pub const PNR_LENGTH: usize = 10;

    /// Mean Earth radius for the haversine distance
    pub const EARTH_RADIUS_KM: f64 = 6371.0;
}
