//! Fare DTOs

use rail_core::models::{ClassType, Quota, TrainCategory};
use rail_services::FareQuote;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Fare enquiry between two stations
///
/// The surcharge category comes from `train_number` when given, otherwise
/// from `train_type`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FareRequest {
    #[validate(length(min = 1, max = 10))]
    pub from: String,

    #[validate(length(min = 1, max = 10))]
    pub to: String,

    #[serde(default)]
    pub train_number: Option<String>,

    #[serde(default, alias = "trainType")]
    pub train_type: TrainCategory,

    #[serde(default = "default_class", alias = "classType")]
    pub class_type: ClassType,

    #[serde(default)]
    pub quota: Quota,
}

fn default_class() -> ClassType {
    ClassType::Sleeper
}

#[derive(Debug, Clone, Serialize)]
pub struct FareResponse {
    pub from: String,
    pub to: String,
    pub train_type: TrainCategory,
    pub class_type: ClassType,
    pub quota: Quota,
    pub distance_km: Decimal,
    pub base_fare: Decimal,
    pub surcharge: Decimal,
    pub quota_charge: Decimal,
    pub tax: Decimal,
    pub total_fare: Decimal,
}

impl FareResponse {
    pub fn new(
        from: String,
        to: String,
        train_type: TrainCategory,
        class_type: ClassType,
        quota: Quota,
        quote: FareQuote,
    ) -> Self {
        Self {
            from,
            to,
            train_type,
            class_type,
            quota,
            distance_km: quote.distance_km,
            base_fare: quote.base_fare,
            surcharge: quote.surcharge,
            quota_charge: quote.quota_charge,
            tax: quote.tax,
            total_fare: quote.total_fare,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fare_request_defaults() {
        let req: FareRequest =
            serde_json::from_value(serde_json::json!({"from": "NDLS", "to": "AGC"})).unwrap();
        assert_eq!(req.train_type, TrainCategory::Express);
        assert_eq!(req.class_type, ClassType::Sleeper);
        assert_eq!(req.quota, Quota::General);
        assert!(req.train_number.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_fare_request_accepts_camel_case_aliases() {
        let req: FareRequest = serde_json::from_value(serde_json::json!({
            "from": "NDLS",
            "to": "BCT",
            "trainType": "Rajdhani",
            "classType": "2A",
            "quota": "TQ"
        }))
        .unwrap();
        assert_eq!(req.train_type, TrainCategory::Rajdhani);
        assert_eq!(req.class_type, ClassType::SecondAc);
        assert_eq!(req.quota, Quota::Tatkal);
    }

    #[test]
    fn test_fare_request_requires_stations() {
        let req: FareRequest =
            serde_json::from_value(serde_json::json!({"from": "", "to": "AGC"})).unwrap();
        assert!(req.validate().is_err());

        let missing = serde_json::from_value::<FareRequest>(serde_json::json!({"to": "AGC"}));
        assert!(missing.is_err());
    }
}
