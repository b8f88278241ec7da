//! Domain models for the booking engine
//!
//! Reference data (stations, trains, coaches) is read-only at runtime.
//! Bookings and their passengers are the only state the engine writes.

pub mod booking;
pub mod coach;
pub mod journey;
pub mod station;
pub mod train;

pub use booking::{
    Booking, BookingStatus, Contact, Gender, Passenger, PassengerInput, PassengerStatus, Quota,
    SeatAssignment,
};
pub use coach::{BerthPreference, BerthType, ClassType, Coach, Seat, SeatKey};
pub use journey::{parse_journey_date, InventoryKey};
pub use station::{normalize_station_code, Station};
pub use train::{RouteStop, Train, TrainCategory};
