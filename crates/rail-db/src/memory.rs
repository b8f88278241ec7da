//! In-memory repositories
//!
//! Same contract as the PostgreSQL repositories, including the seat and PNR
//! uniqueness checks on insert, which run under the store's write lock.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;
use rail_core::{
    models::{
        normalize_station_code, Booking, BookingStatus, ClassType, Coach, PassengerStatus, SeatKey,
        Station, Train,
    },
    traits::{BookingRepository, CatalogRepository},
    AppError, AppResult,
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};
use uuid::Uuid;

/// Reference data held in memory
#[derive(Default)]
pub struct MemoryCatalogRepository {
    stations: RwLock<HashMap<String, Station>>,
    trains: RwLock<HashMap<String, Train>>,
    coaches: RwLock<HashMap<(String, ClassType), Vec<Coach>>>,
}

impl MemoryCatalogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_station(&self, mut station: Station) {
        station.code = normalize_station_code(&station.code);
        self.stations.write().insert(station.code.clone(), station);
    }

    pub fn add_train(&self, train: Train) {
        self.trains.write().insert(train.number.clone(), train);
    }

    /// Add a coach, keeping each class's coaches ordered by code
    pub fn add_coach(&self, coach: Coach) {
        let mut coaches = self.coaches.write();
        let list = coaches
            .entry((coach.train_number.clone(), coach.class_type))
            .or_default();
        list.retain(|c| c.code != coach.code);
        list.push(coach);
        list.sort_by(|a, b| a.code.cmp(&b.code));
    }
}

#[async_trait]
impl CatalogRepository for MemoryCatalogRepository {
    async fn find_station(&self, code: &str) -> AppResult<Option<Station>> {
        Ok(self
            .stations
            .read()
            .get(&normalize_station_code(code))
            .cloned())
    }

    async fn find_train(&self, number: &str) -> AppResult<Option<Train>> {
        Ok(self.trains.read().get(number).cloned())
    }

    async fn find_coaches(&self, train_number: &str, class_type: ClassType) -> AppResult<Vec<Coach>> {
        Ok(self
            .coaches
            .read()
            .get(&(train_number.to_string(), class_type))
            .cloned()
            .unwrap_or_default())
    }
}

/// Bookings held in memory
#[derive(Default)]
pub struct MemoryBookingRepository {
    bookings: RwLock<HashMap<Uuid, Booking>>,
}

impl MemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bookings.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookings.read().is_empty()
    }

    fn same_inventory(
        booking: &Booking,
        train_number: &str,
        class_type: ClassType,
        journey_date: NaiveDate,
    ) -> bool {
        booking.status != BookingStatus::Cancelled
            && booking.train_number == train_number
            && booking.class_type == class_type
            && booking.journey_date == journey_date
    }

    fn occupied_in(
        bookings: &HashMap<Uuid, Booking>,
        train_number: &str,
        class_type: ClassType,
        journey_date: NaiveDate,
    ) -> HashSet<SeatKey> {
        bookings
            .values()
            .filter(|b| Self::same_inventory(b, train_number, class_type, journey_date))
            .flat_map(|b| b.confirmed_seats())
            .collect()
    }
}

#[async_trait]
impl BookingRepository for MemoryBookingRepository {
    async fn occupied_seats(
        &self,
        train_number: &str,
        class_type: ClassType,
        journey_date: NaiveDate,
    ) -> AppResult<HashSet<SeatKey>> {
        let bookings = self.bookings.read();
        Ok(Self::occupied_in(&bookings, train_number, class_type, journey_date))
    }

    async fn count_booked_passengers(
        &self,
        train_number: &str,
        class_type: ClassType,
        journey_date: NaiveDate,
    ) -> AppResult<i64> {
        let count = self
            .bookings
            .read()
            .values()
            .filter(|b| Self::same_inventory(b, train_number, class_type, journey_date))
            .flat_map(|b| b.passengers.iter())
            .filter(|p| p.assignment.status != PassengerStatus::Cancelled)
            .count();

        Ok(count as i64)
    }

    async fn insert(&self, booking: &Booking) -> AppResult<Booking> {
        let mut bookings = self.bookings.write();

        if bookings.values().any(|b| b.pnr == booking.pnr) {
            warn!("PNR collision on {}", booking.pnr);
            return Err(AppError::PnrConflict(booking.pnr.clone()));
        }

        let mut taken = Self::occupied_in(
            &bookings,
            &booking.train_number,
            booking.class_type,
            booking.journey_date,
        );
        for seat in booking.confirmed_seats() {
            if !taken.insert(seat.clone()) {
                warn!("Seat {} already taken", seat);
                return Err(AppError::SeatConflict(seat.to_string()));
            }
        }

        debug!("Storing booking {}", booking.pnr);
        bookings.insert(booking.id, booking.clone());
        Ok(booking.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Booking>> {
        Ok(self.bookings.read().get(&id).cloned())
    }

    async fn find_by_pnr(&self, pnr: &str) -> AppResult<Option<Booking>> {
        Ok(self
            .bookings
            .read()
            .values()
            .find(|b| b.pnr == pnr)
            .cloned())
    }

    async fn list_by_user(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Booking>, i64)> {
        let mut mine: Vec<Booking> = self
            .bookings
            .read()
            .values()
            .filter(|b| b.is_owned_by(user_id))
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = mine.len() as i64;
        let page = mine
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();

        Ok((page, total))
    }

    async fn cancel(&self, id: Uuid) -> AppResult<Option<Booking>> {
        let mut bookings = self.bookings.write();

        match bookings.get_mut(&id) {
            Some(booking) if booking.status == BookingStatus::Booked => {
                booking.mark_cancelled(Utc::now());
                Ok(Some(booking.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rail_core::models::{
        BerthPreference, BerthType, Contact, Gender, Passenger, Quota, SeatAssignment,
    };
    use rust_decimal_macros::dec;

    fn journey_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 11, 3).unwrap()
    }

    fn booking(pnr: &str, assignments: Vec<SeatAssignment>) -> Booking {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            pnr: pnr.to_string(),
            user_id: "user-1".to_string(),
            train_number: "12951".to_string(),
            train_name: "Mumbai Rajdhani".to_string(),
            journey_date: journey_date(),
            class_type: ClassType::ThirdAc,
            quota: Quota::General,
            source_code: "MMCT".to_string(),
            destination_code: "NDLS".to_string(),
            passengers: assignments
                .into_iter()
                .map(|assignment| Passenger {
                    name: "Ravi".to_string(),
                    age: 30,
                    gender: Gender::Male,
                    is_disabled: false,
                    berth_preference: BerthPreference::NoPreference,
                    assignment,
                })
                .collect(),
            contact: Contact {
                mobile: "9876543210".to_string(),
                email: None,
            },
            total_fare: dec!(2500),
            status: BookingStatus::Booked,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_rejects_taken_seat() {
        let repo = MemoryBookingRepository::new();
        repo.insert(&booking(
            "1000000001",
            vec![SeatAssignment::confirmed("B1", 5, BerthType::Middle)],
        ))
        .await
        .unwrap();

        let result = repo
            .insert(&booking(
                "1000000002",
                vec![
                    SeatAssignment::confirmed("B1", 6, BerthType::Upper),
                    SeatAssignment::confirmed("B1", 5, BerthType::Middle),
                ],
            ))
            .await;

        assert!(matches!(result, Err(AppError::SeatConflict(_))));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_pnr() {
        let repo = MemoryBookingRepository::new();
        repo.insert(&booking("1000000001", vec![SeatAssignment::waitlisted(1)]))
            .await
            .unwrap();

        let result = repo
            .insert(&booking("1000000001", vec![SeatAssignment::waitlisted(2)]))
            .await;
        assert!(matches!(result, Err(AppError::PnrConflict(_))));
    }

    #[tokio::test]
    async fn test_cancel_releases_seats_once() {
        let repo = MemoryBookingRepository::new();
        let stored = repo
            .insert(&booking(
                "1000000001",
                vec![
                    SeatAssignment::confirmed("B1", 5, BerthType::Middle),
                    SeatAssignment::rac(1),
                ],
            ))
            .await
            .unwrap();

        let date = journey_date();
        assert_eq!(
            repo.count_booked_passengers("12951", ClassType::ThirdAc, date)
                .await
                .unwrap(),
            2
        );

        let cancelled = repo.cancel(stored.id).await.unwrap().unwrap();
        assert!(cancelled.is_cancelled());
        assert!(cancelled
            .passengers
            .iter()
            .all(|p| p.assignment.status == PassengerStatus::Cancelled && p.assignment.seat_number.is_none()));

        assert!(repo.cancel(stored.id).await.unwrap().is_none());
        assert!(repo
            .occupied_seats("12951", ClassType::ThirdAc, date)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            repo.count_booked_passengers("12951", ClassType::ThirdAc, date)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_occupancy_is_per_date() {
        let repo = MemoryBookingRepository::new();
        repo.insert(&booking(
            "1000000001",
            vec![SeatAssignment::confirmed("B1", 5, BerthType::Middle)],
        ))
        .await
        .unwrap();

        let next_day = journey_date().succ_opt().unwrap();
        assert!(repo
            .occupied_seats("12951", ClassType::ThirdAc, next_day)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_catalog_orders_coaches_by_code() {
        let catalog = MemoryCatalogRepository::new();
        catalog.add_coach(Coach::with_layout("12951", "B2", ClassType::ThirdAc, 64));
        catalog.add_coach(Coach::with_layout("12951", "B1", ClassType::ThirdAc, 64));

        let coaches = catalog
            .find_coaches("12951", ClassType::ThirdAc)
            .await
            .unwrap();
        assert_eq!(coaches[0].code, "B1");
        assert_eq!(coaches[1].code, "B2");
        assert!(catalog
            .find_coaches("12951", ClassType::FirstAc)
            .await
            .unwrap()
            .is_empty());
    }
}
