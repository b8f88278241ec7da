//! Booking DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rail_core::models::{
    parse_journey_date, BerthPreference, BerthType, Booking, BookingStatus, ClassType, Contact,
    Gender, Passenger, PassengerInput, PassengerStatus, Quota,
};
use rail_core::AppResult;
use rail_services::BookingRequest;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Create booking request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBookingRequest {
    #[validate(length(min = 1, max = 10))]
    pub train_number: String,

    #[serde(alias = "from")]
    #[validate(length(min = 1, max = 10))]
    pub source_code: String,

    #[serde(alias = "to")]
    #[validate(length(min = 1, max = 10))]
    pub destination_code: String,

    /// `YYYY-MM-DD` or an RFC 3339 timestamp
    pub journey_date: String,

    pub class_type: ClassType,

    #[serde(default)]
    pub quota: Quota,

    #[validate(nested)]
    pub passengers: Vec<PassengerInput>,

    #[validate(nested)]
    pub contact: Contact,
}

impl CreateBookingRequest {
    pub fn into_booking_request(self) -> AppResult<BookingRequest> {
        Ok(BookingRequest {
            journey_date: parse_journey_date(&self.journey_date)?,
            train_number: self.train_number.trim().to_string(),
            source_code: self.source_code,
            destination_code: self.destination_code,
            class_type: self.class_type,
            quota: self.quota,
            passengers: self.passengers,
            contact: self.contact,
        })
    }
}

/// Passenger outcome
#[derive(Debug, Clone, Serialize)]
pub struct PassengerResponse {
    pub name: String,
    pub age: i32,
    pub gender: Gender,
    pub is_disabled: bool,
    pub berth_preference: BerthPreference,
    pub status: PassengerStatus,
    pub coach_code: Option<String>,
    pub seat_number: Option<i32>,
    pub berth: Option<BerthType>,
    pub position: Option<i32>,

    /// Human readable outcome, e.g. "CNF/B1/23/Lower", "RAC 4" or "WL 12"
    pub status_label: String,
}

fn status_label(passenger: &Passenger) -> String {
    let a = &passenger.assignment;
    match (a.status, &a.coach_code, a.seat_number, a.berth) {
        (PassengerStatus::Confirmed, Some(coach), Some(seat), Some(berth)) => {
            format!("CNF/{}/{}/{}", coach, seat, berth)
        }
        (PassengerStatus::Confirmed, Some(coach), Some(seat), None) => {
            format!("CNF/{}/{}", coach, seat)
        }
        (status, _, _, _) => match a.position {
            Some(position) => format!("{} {}", status, position),
            None => status.to_string(),
        },
    }
}

impl From<Passenger> for PassengerResponse {
    fn from(p: Passenger) -> Self {
        let status_label = status_label(&p);
        Self {
            name: p.name,
            age: p.age,
            gender: p.gender,
            is_disabled: p.is_disabled,
            berth_preference: p.berth_preference,
            status: p.assignment.status,
            coach_code: p.assignment.coach_code,
            seat_number: p.assignment.seat_number,
            berth: p.assignment.berth,
            position: p.assignment.position,
            status_label,
        }
    }
}

/// Booking response
#[derive(Debug, Clone, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub pnr: String,
    pub train_number: String,
    pub train_name: String,
    pub journey_date: NaiveDate,
    pub class_type: ClassType,
    pub quota: Quota,
    pub source_code: String,
    pub destination_code: String,
    pub status: BookingStatus,
    pub total_fare: Decimal,
    pub passengers: Vec<PassengerResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            pnr: b.pnr,
            train_number: b.train_number,
            train_name: b.train_name,
            journey_date: b.journey_date,
            class_type: b.class_type,
            quota: b.quota,
            source_code: b.source_code,
            destination_code: b.destination_code,
            status: b.status,
            total_fare: b.total_fare,
            passengers: b.passengers.into_iter().map(PassengerResponse::from).collect(),
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rail_core::models::SeatAssignment;

    fn passenger(assignment: SeatAssignment) -> Passenger {
        Passenger {
            name: "Ravi".to_string(),
            age: 30,
            gender: Gender::Male,
            is_disabled: false,
            berth_preference: BerthPreference::NoPreference,
            assignment,
        }
    }

    #[test]
    fn test_status_labels_never_confuse_tiers() {
        let labels: Vec<String> = [
            SeatAssignment::confirmed("B1", 23, BerthType::Lower),
            SeatAssignment::rac(4),
            SeatAssignment::waitlisted(12),
            SeatAssignment::cancelled(),
        ]
        .into_iter()
        .map(|a| PassengerResponse::from(passenger(a)).status_label)
        .collect();

        assert_eq!(labels, vec!["CNF/B1/23/Lower", "RAC 4", "WL 12", "CAN"]);
    }

    #[test]
    fn test_create_request_parses_timestamp_dates() {
        let req: CreateBookingRequest = serde_json::from_value(serde_json::json!({
            "train_number": "12951",
            "from": "MMCT",
            "to": "NDLS",
            "journey_date": "2026-11-03T18:30:00+05:30",
            "class_type": "3A",
            "passengers": [{"name": "Ravi", "age": 30, "gender": "Male"}],
            "contact": {"mobile": "+919876543210"}
        }))
        .unwrap();
        assert!(req.validate().is_ok());

        let booking = req.into_booking_request().unwrap();
        assert_eq!(booking.journey_date, NaiveDate::from_ymd_opt(2026, 11, 3).unwrap());
        assert_eq!(booking.quota, Quota::General);
        assert!(!booking.passengers[0].is_disabled);
        assert_eq!(booking.passengers[0].berth_preference, BerthPreference::NoPreference);
    }

    #[test]
    fn test_create_request_validates_passengers() {
        let req: CreateBookingRequest = serde_json::from_value(serde_json::json!({
            "train_number": "12951",
            "source_code": "MMCT",
            "destination_code": "NDLS",
            "journey_date": "2026-11-03",
            "class_type": "3A",
            "passengers": [{"name": "Ravi", "age": 130, "gender": "Male"}],
            "contact": {"mobile": "9876543210"}
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }
}
