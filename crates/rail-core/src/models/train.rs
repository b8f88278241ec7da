//! Train and route models

use crate::error::AppError;
use crate::models::coach::ClassType;
use crate::models::station::normalize_station_code;
use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Service category, drives the fare surcharge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TrainCategory {
    #[default]
    Express,
    Superfast,
    Rajdhani,
    Shatabdi,
    Duronto,
    #[serde(other)]
    Other,
}

impl TrainCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrainCategory::Express => "Express",
            TrainCategory::Superfast => "Superfast",
            TrainCategory::Rajdhani => "Rajdhani",
            TrainCategory::Shatabdi => "Shatabdi",
            TrainCategory::Duronto => "Duronto",
            TrainCategory::Other => "Other",
        }
    }

    /// Parse from string. Unrecognised categories map to `Other`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "express" | "mail" => TrainCategory::Express,
            "superfast" => TrainCategory::Superfast,
            "rajdhani" => TrainCategory::Rajdhani,
            "shatabdi" => TrainCategory::Shatabdi,
            "duronto" => TrainCategory::Duronto,
            _ => TrainCategory::Other,
        }
    }
}

impl fmt::Display for TrainCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intermediate halt on a train's route
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteStop {
    pub station_code: String,
    pub arrival: Option<NaiveTime>,
    pub departure: Option<NaiveTime>,

    /// Cumulative distance from the source station
    pub distance_km: Option<Decimal>,

    /// Days after the departure day this halt falls on
    #[serde(default)]
    pub day_offset: i32,
}

/// A train with its fixed route
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Train {
    /// Train number, unique (e.g. "12951")
    pub number: String,
    pub name: String,
    pub category: TrainCategory,
    pub source_code: String,
    pub destination_code: String,

    /// Intermediate halts in travel order
    #[serde(default)]
    pub route: Vec<RouteStop>,

    /// Classes offered on this train
    #[serde(default)]
    pub classes: Vec<ClassType>,

    /// Weekdays the train departs its source. Empty means daily.
    #[serde(default)]
    pub days_of_operation: Vec<Weekday>,
}

impl Train {
    /// Position of a station in `[source, stops..., destination]`
    pub fn route_index(&self, station_code: &str) -> Option<usize> {
        let code = normalize_station_code(station_code);

        if self.source_code == code {
            return Some(0);
        }
        if let Some(i) = self.route.iter().position(|s| s.station_code == code) {
            return Some(i + 1);
        }
        if self.destination_code == code {
            return Some(self.route.len() + 1);
        }
        None
    }

    /// Check that `from` strictly precedes `to` on this train's route
    pub fn validate_direction(&self, from: &str, to: &str) -> Result<(), AppError> {
        let from_idx = self.route_index(from).ok_or_else(|| {
            AppError::InvalidRoute(format!("{} is not on the route of train {}", from, self.number))
        })?;
        let to_idx = self.route_index(to).ok_or_else(|| {
            AppError::InvalidRoute(format!("{} is not on the route of train {}", to, self.number))
        })?;

        if from_idx >= to_idx {
            return Err(AppError::InvalidRoute(format!(
                "train {} does not run from {} to {}",
                self.number, from, to
            )));
        }
        Ok(())
    }

    /// Whether the train departs on the given date
    pub fn runs_on(&self, date: NaiveDate) -> bool {
        self.days_of_operation.is_empty() || self.days_of_operation.contains(&date.weekday())
    }

    pub fn offers_class(&self, class_type: ClassType) -> bool {
        self.classes.is_empty() || self.classes.contains(&class_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rajdhani() -> Train {
        Train {
            number: "12951".to_string(),
            name: "Mumbai Rajdhani".to_string(),
            category: TrainCategory::Rajdhani,
            source_code: "MMCT".to_string(),
            destination_code: "NDLS".to_string(),
            route: vec![
                RouteStop {
                    station_code: "BRC".to_string(),
                    arrival: None,
                    departure: None,
                    distance_km: None,
                    day_offset: 0,
                },
                RouteStop {
                    station_code: "KOTA".to_string(),
                    arrival: None,
                    departure: None,
                    distance_km: None,
                    day_offset: 1,
                },
            ],
            classes: vec![ClassType::FirstAc, ClassType::SecondAc, ClassType::ThirdAc],
            days_of_operation: vec![Weekday::Mon, Weekday::Wed],
        }
    }

    #[test]
    fn test_route_index() {
        let train = rajdhani();
        assert_eq!(train.route_index("MMCT"), Some(0));
        assert_eq!(train.route_index("brc"), Some(1));
        assert_eq!(train.route_index("KOTA"), Some(2));
        assert_eq!(train.route_index("NDLS"), Some(3));
        assert_eq!(train.route_index("HWH"), None);
    }

    #[test]
    fn test_validate_direction() {
        let train = rajdhani();
        assert!(train.validate_direction("BRC", "NDLS").is_ok());
        assert!(matches!(
            train.validate_direction("NDLS", "BRC"),
            Err(AppError::InvalidRoute(_))
        ));
        assert!(matches!(
            train.validate_direction("KOTA", "KOTA"),
            Err(AppError::InvalidRoute(_))
        ));
        assert!(matches!(
            train.validate_direction("HWH", "NDLS"),
            Err(AppError::InvalidRoute(_))
        ));
    }

    #[test]
    fn test_runs_on() {
        let mut train = rajdhani();
        let monday = NaiveDate::from_ymd_opt(2026, 10, 12).unwrap();
        let tuesday = NaiveDate::from_ymd_opt(2026, 10, 13).unwrap();
        assert!(train.runs_on(monday));
        assert!(!train.runs_on(tuesday));

        train.days_of_operation.clear();
        assert!(train.runs_on(tuesday));
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(TrainCategory::parse("Rajdhani"), TrainCategory::Rajdhani);
        assert_eq!(TrainCategory::parse("SUPERFAST"), TrainCategory::Superfast);
        assert_eq!(TrainCategory::parse("Vande Bharat"), TrainCategory::Other);

        let parsed: TrainCategory = serde_json::from_str("\"Garib Rath\"").unwrap();
        assert_eq!(parsed, TrainCategory::Other);
    }
}
