//! Booking and passenger models
//!
//! A booking is created atomically with all of its passengers. Seat
//! assignments are decided once at booking time and only ever change by
//! cancellation, which releases every seat the booking held.

use crate::models::coach::{BerthPreference, BerthType, ClassType, SeatKey};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Booking status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Booked,
    Cancelled,
    Completed,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Booked => "booked",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "booked" => Some(BookingStatus::Booked),
            "cancelled" => Some(BookingStatus::Cancelled),
            "completed" => Some(BookingStatus::Completed),
            _ => None,
        }
    }
}

/// Per-passenger outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassengerStatus {
    #[serde(rename = "CNF")]
    Confirmed,
    #[serde(rename = "RAC")]
    Rac,
    #[serde(rename = "WL")]
    Waitlisted,
    #[serde(rename = "CAN")]
    Cancelled,
}

impl fmt::Display for PassengerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl PassengerStatus {
    pub fn code(&self) -> &'static str {
        match self {
            PassengerStatus::Confirmed => "CNF",
            PassengerStatus::Rac => "RAC",
            PassengerStatus::Waitlisted => "WL",
            PassengerStatus::Cancelled => "CAN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "CNF" => Some(PassengerStatus::Confirmed),
            "RAC" => Some(PassengerStatus::Rac),
            "WL" => Some(PassengerStatus::Waitlisted),
            "CAN" => Some(PassengerStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "male" | "m" => Some(Gender::Male),
            "female" | "f" => Some(Gender::Female),
            "other" | "o" => Some(Gender::Other),
            _ => None,
        }
    }
}

/// Booking quota
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Quota {
    #[default]
    #[serde(rename = "GN")]
    General,
    #[serde(rename = "TQ")]
    Tatkal,
    #[serde(rename = "LD")]
    Ladies,
    #[serde(rename = "SS")]
    SeniorCitizen,
}

impl Quota {
    pub fn code(&self) -> &'static str {
        match self {
            Quota::General => "GN",
            Quota::Tatkal => "TQ",
            Quota::Ladies => "LD",
            Quota::SeniorCitizen => "SS",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GN" => Some(Quota::General),
            "TQ" => Some(Quota::Tatkal),
            "LD" => Some(Quota::Ladies),
            "SS" => Some(Quota::SeniorCitizen),
            _ => None,
        }
    }
}

impl fmt::Display for Quota {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn validate_mobile(value: &str) -> Result<(), ValidationError> {
    let digits = value.strip_prefix('+').unwrap_or(value);
    if digits.len() < 10 || digits.len() > 15 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new("mobile"));
    }
    Ok(())
}

/// Contact details for a booking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct Contact {
    #[validate(custom(function = "validate_mobile"))]
    pub mobile: String,

    #[validate(email)]
    #[serde(default)]
    pub email: Option<String>,
}

/// Passenger as requested by the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct PassengerInput {
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    pub name: String,

    #[validate(range(min = 1, max = 125))]
    pub age: i32,

    pub gender: Gender,

    #[serde(default)]
    pub is_disabled: bool,

    #[serde(default)]
    pub berth_preference: BerthPreference,
}

/// Outcome of allocation for one passenger
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeatAssignment {
    pub status: PassengerStatus,
    pub coach_code: Option<String>,
    pub seat_number: Option<i32>,
    pub berth: Option<BerthType>,

    /// RAC or waitlist position, 1-based
    pub position: Option<i32>,
}

impl SeatAssignment {
    pub fn confirmed(coach_code: impl Into<String>, seat_number: i32, berth: BerthType) -> Self {
        Self {
            status: PassengerStatus::Confirmed,
            coach_code: Some(coach_code.into()),
            seat_number: Some(seat_number),
            berth: Some(berth),
            position: None,
        }
    }

    pub fn rac(position: i32) -> Self {
        Self {
            status: PassengerStatus::Rac,
            coach_code: None,
            seat_number: None,
            berth: None,
            position: Some(position),
        }
    }

    pub fn waitlisted(position: i32) -> Self {
        Self {
            status: PassengerStatus::Waitlisted,
            coach_code: None,
            seat_number: None,
            berth: None,
            position: Some(position),
        }
    }

    /// Cancelled assignments hold no seat
    pub fn cancelled() -> Self {
        Self {
            status: PassengerStatus::Cancelled,
            coach_code: None,
            seat_number: None,
            berth: None,
            position: None,
        }
    }

    /// The physical seat held, only for confirmed passengers
    pub fn seat_key(&self) -> Option<SeatKey> {
        match (self.status, &self.coach_code, self.seat_number) {
            (PassengerStatus::Confirmed, Some(coach), Some(seat)) => {
                Some(SeatKey::new(coach.clone(), seat))
            }
            _ => None,
        }
    }
}

/// Passenger on a persisted booking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Passenger {
    pub name: String,
    pub age: i32,
    pub gender: Gender,
    pub is_disabled: bool,
    pub berth_preference: BerthPreference,

    #[serde(flatten)]
    pub assignment: SeatAssignment,
}

impl Passenger {
    pub fn new(input: PassengerInput, assignment: SeatAssignment) -> Self {
        Self {
            name: input.name.trim().to_string(),
            age: input.age,
            gender: input.gender,
            is_disabled: input.is_disabled,
            berth_preference: input.berth_preference,
            assignment,
        }
    }
}

/// Booking entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: Uuid,

    /// 10-digit passenger name record
    pub pnr: String,

    /// Subject of the authenticated identity that made the booking
    pub user_id: String,

    pub train_number: String,
    pub train_name: String,
    pub journey_date: NaiveDate,
    pub class_type: ClassType,
    pub quota: Quota,
    pub source_code: String,
    pub destination_code: String,

    /// Passengers in request order
    pub passengers: Vec<Passenger>,

    pub contact: Contact,
    pub total_fare: Decimal,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == BookingStatus::Cancelled
    }

    /// Seats held by confirmed passengers
    pub fn confirmed_seats(&self) -> Vec<SeatKey> {
        self.passengers
            .iter()
            .filter_map(|p| p.assignment.seat_key())
            .collect()
    }

    /// Apply cancellation to the booking and every passenger
    pub fn mark_cancelled(&mut self, at: DateTime<Utc>) {
        self.status = BookingStatus::Cancelled;
        for passenger in &mut self.passengers {
            passenger.assignment = SeatAssignment::cancelled();
        }
        self.updated_at = at;
    }
}
