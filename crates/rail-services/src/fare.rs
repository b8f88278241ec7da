//! Distance and fare calculation
//!
//! Fares are a pure function of the two stations, the train category, the
//! class and the quota. Money is carried in `Decimal` throughout; only the
//! great-circle distance is computed in `f64`.

use rail_core::{
    config::FareConfig,
    models::{ClassType, Quota, Station, TrainCategory},
    traits::CatalogRepository,
    AppError, AppResult,
};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::constants::EARTH_RADIUS_KM;

/// Fare breakdown for one passenger
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FareQuote {
    /// Charged distance, whole kilometres
    pub distance_km: Decimal,
    /// Distance fare after telescoping, whole units
    pub base_fare: Decimal,
    /// Train category surcharge
    pub surcharge: Decimal,
    /// Quota loading (tatkal)
    pub quota_charge: Decimal,
    pub tax: Decimal,
    /// Rounded up to the configured step
    pub total_fare: Decimal,
}

/// Great-circle distance between two (lat, lon) points in kilometres
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lon2) = (to.0.to_radians(), to.1.to_radians());

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Fare calculator over a station catalog
pub struct FareCalculator<C: CatalogRepository> {
    catalog: Arc<C>,
    policy: FareConfig,
}

impl<C: CatalogRepository> FareCalculator<C> {
    pub fn new(catalog: Arc<C>, mut policy: FareConfig) -> Self {
        policy
            .telescopic_steps
            .sort_by(|a, b| a.above_km.cmp(&b.above_km));
        Self { catalog, policy }
    }

    pub fn policy(&self) -> &FareConfig {
        &self.policy
    }

    /// Charged distance between two stations.
    ///
    /// Missing coordinates on either end charge the minimum distance.
    pub fn distance_between(&self, from: &Station, to: &Station) -> Decimal {
        let measured = match (from.coordinates(), to.coordinates()) {
            (Some(a), Some(b)) => Decimal::from_f64(haversine_km(a, b))
                .map(|d| d.round_dp(2))
                .unwrap_or(Decimal::ZERO),
            _ => Decimal::ZERO,
        };

        measured.max(self.policy.min_distance_km)
    }

    fn class_multiplier(&self, class: ClassType) -> Decimal {
        let m = &self.policy.class_multipliers;
        match class {
            ClassType::FirstAc => m.first_ac,
            ClassType::SecondAc => m.second_ac,
            ClassType::ThirdAc => m.third_ac,
            ClassType::Sleeper => m.sleeper,
            ClassType::ChairCar => m.chair_car,
            ClassType::SecondSitting => m.second_sitting,
        }
    }

    fn category_surcharge(&self, category: TrainCategory) -> Decimal {
        let s = &self.policy.surcharges;
        match category {
            TrainCategory::Rajdhani => s.rajdhani,
            TrainCategory::Duronto => s.duronto,
            TrainCategory::Shatabdi => s.shatabdi,
            TrainCategory::Superfast => s.superfast,
            TrainCategory::Express => s.express,
            TrainCategory::Other => Decimal::ZERO,
        }
    }

    /// Distance fare with each telescopic factor applied to the kilometres
    /// beyond its threshold only
    fn telescoped(&self, distance: Decimal, rate: Decimal) -> Decimal {
        let mut fare = Decimal::ZERO;
        let mut charged_to = Decimal::ZERO;
        let mut factor = Decimal::ONE;

        for step in &self.policy.telescopic_steps {
            if distance <= step.above_km {
                break;
            }
            let upto = step.above_km.max(charged_to);
            fare += (upto - charged_to) * rate * factor;
            charged_to = upto;
            factor *= step.factor;
        }

        fare + (distance - charged_to) * rate * factor
    }

    fn round_up(&self, amount: Decimal) -> Decimal {
        let step = self.policy.rounding_step;
        if step <= Decimal::ZERO {
            return amount.ceil();
        }
        (amount / step).ceil() * step
    }

    /// Price a journey of known distance
    pub fn fare_for_distance(
        &self,
        distance_km: Decimal,
        category: TrainCategory,
        class: ClassType,
        quota: Quota,
    ) -> FareQuote {
        let distance = distance_km.max(self.policy.min_distance_km);
        let rate = self.policy.base_rate_per_km * self.class_multiplier(class);

        let base = self.telescoped(distance, rate);
        let surcharge = self.category_surcharge(category);
        let running = base + surcharge;

        let quota_charge = match quota {
            Quota::Tatkal => (running * self.policy.tatkal_rate).max(self.policy.tatkal_minimum),
            Quota::General | Quota::Ladies | Quota::SeniorCitizen => Decimal::ZERO,
        };

        let tax = if class.is_air_conditioned() {
            (running + quota_charge) * self.policy.gst_rate
        } else {
            Decimal::ZERO
        };

        let total_fare = self.round_up(running + quota_charge + tax);

        FareQuote {
            distance_km: distance.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
            base_fare: base.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
            surcharge,
            quota_charge: quota_charge.round_dp(2),
            tax: tax.round_dp(2),
            total_fare,
        }
    }

    async fn station(&self, code: &str) -> AppResult<Station> {
        self.catalog
            .find_station(code)
            .await?
            .ok_or_else(|| AppError::UnknownStation(code.to_string()))
    }

    /// Price a journey between two stations
    ///
    /// # Errors
    ///
    /// `UnknownStation` when either code is not in the catalog
    #[instrument(skip(self))]
    pub async fn compute_fare(
        &self,
        from: &str,
        to: &str,
        category: TrainCategory,
        class: ClassType,
        quota: Quota,
    ) -> AppResult<FareQuote> {
        let origin = self.station(from).await?;
        let destination = self.station(to).await?;

        let distance = self.distance_between(&origin, &destination);
        let quote = self.fare_for_distance(distance, category, class, quota);

        debug!(
            "Fare {} -> {}: {} km, total {}",
            origin.code, destination.code, quote.distance_km, quote.total_fare
        );
        Ok(quote)
    }
}
