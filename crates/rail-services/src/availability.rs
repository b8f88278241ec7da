//! Confirmed / RAC / waitlist counters
//!
//! Recomputed on every call from live reservations. Never cached.

use rail_core::{
    models::InventoryKey,
    traits::{BookingRepository, CatalogRepository},
    AppResult,
};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::instrument;

use crate::inventory::{CoachVacancy, InventoryService, InventorySnapshot};

/// Which tier the next passenger would land in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "tier", content = "count")]
pub enum AvailabilityStatus {
    #[serde(rename = "AVL")]
    Available(i64),
    #[serde(rename = "RAC")]
    Rac(i64),
    #[serde(rename = "WL")]
    Waitlist(i64),
}

impl fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvailabilityStatus::Available(n) => write!(f, "AVL {}", n),
            AvailabilityStatus::Rac(n) => write!(f, "RAC {}", n),
            AvailabilityStatus::Waitlist(n) => write!(f, "WL {}", n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Availability {
    pub total_capacity: i64,
    pub rac_capacity: i64,
    pub booked: i64,
    pub available: i64,
    pub rac_count: i64,
    pub waitlist_count: i64,
    pub status_label: String,
}

/// RAC buffer for a capacity, rounded up
pub fn rac_capacity(total_capacity: i64, rac_percent: u32) -> i64 {
    let scaled = total_capacity.max(0) * i64::from(rac_percent);
    (scaled + 99) / 100
}

impl Availability {
    pub fn compute(total_capacity: i64, rac_capacity: i64, booked: i64) -> Self {
        let status = if booked < total_capacity {
            AvailabilityStatus::Available(total_capacity - booked)
        } else if booked < total_capacity + rac_capacity {
            AvailabilityStatus::Rac(total_capacity + rac_capacity - booked)
        } else {
            AvailabilityStatus::Waitlist(booked - (total_capacity + rac_capacity) + 1)
        };

        let (available, rac_count, waitlist_count) = match status {
            AvailabilityStatus::Available(n) => (n, 0, 0),
            AvailabilityStatus::Rac(n) => (0, n, 0),
            AvailabilityStatus::Waitlist(n) => (0, 0, n),
        };

        Self {
            total_capacity,
            rac_capacity,
            booked,
            available,
            rac_count,
            waitlist_count,
            status_label: status.to_string(),
        }
    }

    pub fn from_snapshot(snapshot: &InventorySnapshot, rac_percent: u32) -> Self {
        let total = snapshot.total_capacity();
        Self::compute(total, rac_capacity(total, rac_percent), snapshot.booked)
    }
}

pub struct AvailabilityService<C: CatalogRepository, B: BookingRepository> {
    inventory: Arc<InventoryService<C, B>>,
    rac_percent: u32,
}

impl<C: CatalogRepository, B: BookingRepository> AvailabilityService<C, B> {
    pub fn new(inventory: Arc<InventoryService<C, B>>, rac_percent: u32) -> Self {
        Self {
            inventory,
            rac_percent,
        }
    }

    /// # Errors
    ///
    /// `NoCoachesForClass` when the class is not configured on the train
    #[instrument(skip(self))]
    pub async fn get_availability(&self, key: &InventoryKey) -> AppResult<Availability> {
        let snapshot = self.inventory.snapshot(key).await?;
        Ok(Availability::from_snapshot(&snapshot, self.rac_percent))
    }

    /// Per-coach seat and vacancy counts on the key's date
    #[instrument(skip(self))]
    pub async fn coach_chart(&self, key: &InventoryKey) -> AppResult<Vec<CoachVacancy>> {
        Ok(self.inventory.snapshot(key).await?.coach_chart())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rac_capacity_rounds_up() {
        assert_eq!(rac_capacity(72, 10), 8);
        assert_eq!(rac_capacity(70, 10), 7);
        assert_eq!(rac_capacity(0, 10), 0);
        assert_eq!(rac_capacity(64, 0), 0);
    }

    #[test]
    fn test_tiers() {
        let open = Availability::compute(72, 8, 10);
        assert_eq!(open.available, 62);
        assert_eq!(open.status_label, "AVL 62");

        let rac = Availability::compute(72, 8, 72);
        assert_eq!(rac.rac_count, 8);
        assert_eq!(rac.available, 0);
        assert_eq!(rac.status_label, "RAC 8");

        let waitlist = Availability::compute(72, 8, 80);
        assert_eq!(waitlist.waitlist_count, 1);
        assert_eq!(waitlist.status_label, "WL 1");

        assert_eq!(Availability::compute(72, 8, 95).status_label, "WL 16");
    }

    #[test]
    fn test_status_serializes_with_tier() {
        let json = serde_json::to_value(AvailabilityStatus::Rac(3)).unwrap();
        assert_eq!(json, serde_json::json!({"tier": "RAC", "count": 3}));
    }
}
