//! Journey dates and inventory keys

use crate::error::AppError;
use crate::models::coach::ClassType;
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parse a client-supplied journey date.
///
/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp. A timestamp is reduced to
/// the calendar date in its own offset, so `2026-10-20T23:30:00+05:30` is the
/// 20th regardless of the server's timezone.
pub fn parse_journey_date(input: &str) -> Result<NaiveDate, AppError> {
    let input = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date);
    }

    DateTime::parse_from_rfc3339(input)
        .map(|dt| dt.date_naive())
        .map_err(|_| AppError::InvalidInput(format!("Invalid journey date: {}", input)))
}

/// One bookable inventory: a class on a train on a travel date
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InventoryKey {
    pub train_number: String,
    pub class_type: ClassType,
    pub journey_date: NaiveDate,
}

impl InventoryKey {
    pub fn new(train_number: impl Into<String>, class_type: ClassType, journey_date: NaiveDate) -> Self {
        Self {
            train_number: train_number.into(),
            class_type,
            journey_date,
        }
    }
}

impl fmt::Display for InventoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.train_number, self.class_type, self.journey_date
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_date() {
        let date = parse_journey_date("2026-11-03").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 11, 3).unwrap());
    }

    #[test]
    fn test_parse_timestamp_keeps_local_day() {
        let date = parse_journey_date("2026-11-03T23:45:10+05:30").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 11, 3).unwrap());

        let date = parse_journey_date("2026-11-03T00:00:00.000Z").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 11, 3).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_journey_date("next tuesday"),
            Err(AppError::InvalidInput(_))
        ));
        assert!(parse_journey_date("2026-02-30").is_err());
    }

    #[test]
    fn test_inventory_key_display() {
        let key = InventoryKey::new(
            "12951",
            ClassType::ThirdAc,
            NaiveDate::from_ymd_opt(2026, 11, 3).unwrap(),
        );
        assert_eq!(key.to_string(), "12951:3A:2026-11-03");
    }
}
