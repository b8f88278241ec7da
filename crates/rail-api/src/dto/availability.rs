//! Availability DTOs

use chrono::NaiveDate;
use rail_core::models::ClassType;
use rail_services::{Availability, CoachVacancy};
use serde::{Deserialize, Serialize};

/// `?class_type=SL&date=2026-11-03`
#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityQuery {
    #[serde(alias = "classType")]
    pub class_type: ClassType,

    /// `YYYY-MM-DD` or an RFC 3339 timestamp
    pub date: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityResponse {
    pub train_number: String,
    pub class_type: ClassType,
    pub journey_date: NaiveDate,

    #[serde(flatten)]
    pub availability: Availability,
}

/// Coach chart for one class on one date
#[derive(Debug, Clone, Serialize)]
pub struct CoachChartResponse {
    pub train_number: String,
    pub class_type: ClassType,
    pub journey_date: NaiveDate,
    pub coaches: Vec<CoachVacancy>,
}
