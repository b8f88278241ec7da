//! Seat inventory
//!
//! Coaches and seats are reference data from the catalog. Occupancy is
//! always derived from live reservations, so a cancellation is visible to the
//! very next read.

use rail_core::{
    models::{ClassType, Coach, InventoryKey, SeatKey},
    traits::{BookingRepository, CatalogRepository},
    AppError, AppResult,
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Point-in-time view of one (train, class, date) inventory
#[derive(Debug, Clone)]
pub struct InventorySnapshot {
    pub key: InventoryKey,

    /// Coaches in code order
    pub coaches: Vec<Coach>,

    /// Seats held by confirmed passengers
    pub occupied: HashSet<SeatKey>,

    /// Passenger slots on live reservations (confirmed, RAC and waitlisted)
    pub booked: i64,
}

/// One row of the coach chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoachVacancy {
    pub code: String,
    pub class_type: ClassType,
    pub seat_count: usize,
    pub vacant_count: usize,
}

impl InventorySnapshot {
    /// Seat and vacancy counts per coach, in code order
    pub fn coach_chart(&self) -> Vec<CoachVacancy> {
        self.coaches
            .iter()
            .map(|coach| {
                let taken = coach
                    .seats
                    .iter()
                    .filter(|s| {
                        self.occupied
                            .contains(&SeatKey::new(coach.code.as_str(), s.number))
                    })
                    .count();

                CoachVacancy {
                    code: coach.code.clone(),
                    class_type: coach.class_type,
                    seat_count: coach.capacity(),
                    vacant_count: coach.capacity() - taken,
                }
            })
            .collect()
    }

    pub fn total_capacity(&self) -> i64 {
        self.coaches.iter().map(|c| c.capacity() as i64).sum()
    }

    pub fn free_seats(&self) -> i64 {
        self.total_capacity() - self.occupied.len() as i64
    }
}

pub struct InventoryService<C: CatalogRepository, B: BookingRepository> {
    catalog: Arc<C>,
    bookings: Arc<B>,
}

impl<C: CatalogRepository, B: BookingRepository> InventoryService<C, B> {
    pub fn new(catalog: Arc<C>, bookings: Arc<B>) -> Self {
        Self { catalog, bookings }
    }

    /// Coaches of a class on a train, ordered by code
    ///
    /// # Errors
    ///
    /// `NoCoachesForClass` when the train has no coaches of that class
    #[instrument(skip(self))]
    pub async fn coaches(&self, train_number: &str, class_type: ClassType) -> AppResult<Vec<Coach>> {
        let mut coaches = self.catalog.find_coaches(train_number, class_type).await?;

        if coaches.is_empty() {
            return Err(AppError::NoCoachesForClass {
                train: train_number.to_string(),
                class: class_type.to_string(),
            });
        }

        coaches.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(coaches)
    }

    #[instrument(skip(self))]
    pub async fn occupied_seats(&self, key: &InventoryKey) -> AppResult<HashSet<SeatKey>> {
        self.bookings
            .occupied_seats(&key.train_number, key.class_type, key.journey_date)
            .await
    }

    #[instrument(skip(self))]
    pub async fn snapshot(&self, key: &InventoryKey) -> AppResult<InventorySnapshot> {
        let coaches = self.coaches(&key.train_number, key.class_type).await?;
        let occupied = self.occupied_seats(key).await?;
        let booked = self
            .bookings
            .count_booked_passengers(&key.train_number, key.class_type, key.journey_date)
            .await?;

        debug!(
            "Inventory {}: {} coaches, {} occupied, {} booked",
            key,
            coaches.len(),
            occupied.len(),
            booked
        );

        Ok(InventorySnapshot {
            key: key.clone(),
            coaches,
            occupied,
            booked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rail_db::{MemoryBookingRepository, MemoryCatalogRepository};

    fn service() -> InventoryService<MemoryCatalogRepository, MemoryBookingRepository> {
        let catalog = MemoryCatalogRepository::new();
        catalog.add_coach(Coach::with_layout("12951", "B2", ClassType::ThirdAc, 64));
        catalog.add_coach(Coach::with_layout("12951", "B1", ClassType::ThirdAc, 64));
        InventoryService::new(Arc::new(catalog), Arc::new(MemoryBookingRepository::new()))
    }

    #[tokio::test]
    async fn test_snapshot_of_empty_inventory() {
        let key = InventoryKey::new(
            "12951",
            ClassType::ThirdAc,
            NaiveDate::from_ymd_opt(2026, 11, 3).unwrap(),
        );
        let snapshot = service().snapshot(&key).await.unwrap();

        assert_eq!(snapshot.coaches[0].code, "B1");
        assert_eq!(snapshot.total_capacity(), 128);
        assert_eq!(snapshot.free_seats(), 128);
        assert_eq!(snapshot.booked, 0);
    }

    #[test]
    fn test_coach_chart_counts_vacancies_per_coach() {
        let b1 = Coach::with_layout("12951", "B1", ClassType::ThirdAc, 8);
        let b2 = Coach::with_layout("12951", "B2", ClassType::ThirdAc, 8);
        let snapshot = InventorySnapshot {
            key: InventoryKey::new(
                "12951",
                ClassType::ThirdAc,
                NaiveDate::from_ymd_opt(2026, 11, 3).unwrap(),
            ),
            coaches: vec![b1, b2],
            occupied: [SeatKey::new("B1", 2), SeatKey::new("B1", 3), SeatKey::new("B2", 8)]
                .into_iter()
                .collect(),
            booked: 3,
        };

        let chart = snapshot.coach_chart();
        assert_eq!(chart.len(), 2);
        assert_eq!(chart[0].code, "B1");
        assert_eq!(chart[0].seat_count, 8);
        assert_eq!(chart[0].vacant_count, 6);
        assert_eq!(chart[1].code, "B2");
        assert_eq!(chart[1].vacant_count, 7);
        assert_eq!(chart[1].class_type, ClassType::ThirdAc);
    }

    #[tokio::test]
    async fn test_missing_class_is_not_fully_booked() {
        let result = service().coaches("12951", ClassType::FirstAc).await;
        assert!(matches!(result, Err(AppError::NoCoachesForClass { .. })));
    }
}
