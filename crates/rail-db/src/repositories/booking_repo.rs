//! Booking repository implementation
//!
//! Bookings and their passengers are written in one transaction. A partial
//! unique index on confirmed passengers (`ux_confirmed_seat`) is the last line
//! against double allocation across processes; its violations surface as
//! `AppError::SeatConflict` so the caller can re-snapshot and retry.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rail_core::{
    models::{
        BerthPreference, BerthType, Booking, BookingStatus, ClassType, Contact, Gender,
        InventoryKey, Passenger, PassengerStatus, Quota, SeatAssignment, SeatKey,
    },
    traits::BookingRepository,
    AppError, AppResult,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

const SEAT_INDEX: &str = "ux_confirmed_seat";
const PNR_CONSTRAINT: &str = "uq_bookings_pnr";

const BOOKING_SELECT_COLUMNS: &str = r#"
    id, pnr, user_id, train_number, train_name, journey_date, class_type, quota,
    source_code, destination_code, contact_mobile, contact_email, total_fare,
    status, created_at, updated_at
"#;

const PASSENGER_SELECT_COLUMNS: &str = r#"
    booking_id, seq, name, age, gender, is_disabled, berth_preference,
    status, coach_code, seat_number, berth, position
"#;

/// PostgreSQL implementation of BookingRepository
pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    /// Create a new booking repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Map a write failure, recognising the seat and PNR uniqueness guards
    fn map_write_error(e: sqlx::Error, context: &str) -> AppError {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                match db.constraint() {
                    Some(SEAT_INDEX) => {
                        warn!("Seat already taken while {}", context);
                        return AppError::SeatConflict(db.message().to_string());
                    }
                    Some(PNR_CONSTRAINT) => {
                        warn!("PNR collision while {}", context);
                        return AppError::PnrConflict(db.message().to_string());
                    }
                    _ => {}
                }
            }
        }

        error!("Database error {}: {}", context, e);
        AppError::Database(format!("Failed {}: {}", context, e))
    }

    /// Load passengers for a set of bookings, keyed by booking id
    async fn load_passengers(&self, ids: &[Uuid]) -> AppResult<HashMap<Uuid, Vec<Passenger>>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let query = format!(
            "SELECT {} FROM booking_passengers WHERE booking_id = ANY($1) ORDER BY booking_id, seq",
            PASSENGER_SELECT_COLUMNS
        );

        let rows = sqlx::query_as::<sqlx::Postgres, PassengerRow>(&query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error loading passengers: {}", e);
                AppError::Database(format!("Failed to load passengers: {}", e))
            })?;

        let mut grouped: HashMap<Uuid, Vec<Passenger>> = HashMap::new();
        for row in rows {
            grouped.entry(row.booking_id).or_default().push(row.into());
        }
        Ok(grouped)
    }

    async fn attach_passengers(&self, rows: Vec<BookingRow>) -> AppResult<Vec<Booking>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut passengers = self.load_passengers(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let list = passengers.remove(&row.id).unwrap_or_default();
                row.into_booking(list)
            })
            .collect()
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    #[instrument(skip(self))]
    async fn occupied_seats(
        &self,
        train_number: &str,
        class_type: ClassType,
        journey_date: NaiveDate,
    ) -> AppResult<HashSet<SeatKey>> {
        let rows: Vec<(String, i32)> = sqlx::query_as(
            r#"
            SELECT p.coach_code, p.seat_number
            FROM booking_passengers p
            JOIN bookings b ON b.id = p.booking_id
            WHERE b.train_number = $1
                AND b.class_type = $2
                AND b.journey_date = $3
                AND b.status <> 'cancelled'
                AND p.status = 'CNF'
                AND p.coach_code IS NOT NULL
                AND p.seat_number IS NOT NULL
            "#,
        )
        .bind(train_number)
        .bind(class_type.code())
        .bind(journey_date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error loading occupied seats: {}", e);
            AppError::Database(format!("Failed to load occupied seats: {}", e))
        })?;

        debug!("{} seats occupied", rows.len());

        Ok(rows
            .into_iter()
            .map(|(coach, seat)| SeatKey::new(coach, seat))
            .collect())
    }

    #[instrument(skip(self))]
    async fn count_booked_passengers(
        &self,
        train_number: &str,
        class_type: ClassType,
        journey_date: NaiveDate,
    ) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM booking_passengers p
            JOIN bookings b ON b.id = p.booking_id
            WHERE b.train_number = $1
                AND b.class_type = $2
                AND b.journey_date = $3
                AND b.status <> 'cancelled'
                AND p.status <> 'CAN'
            "#,
        )
        .bind(train_number)
        .bind(class_type.code())
        .bind(journey_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error counting booked passengers: {}", e);
            AppError::Database(format!("Failed to count booked passengers: {}", e))
        })?;

        Ok(result.0)
    }

    #[instrument(skip(self, booking), fields(pnr = %booking.pnr))]
    async fn insert(&self, booking: &Booking) -> AppResult<Booking> {
        debug!("Inserting booking {} with {} passengers", booking.id, booking.passengers.len());

        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            AppError::Transaction(format!("Failed to begin transaction: {}", e))
        })?;

        // Queues concurrent inserts on one inventory behind each other. The
        // snapshot was read outside this transaction, so a stale seat is
        // still caught only by ux_confirmed_seat
        let key = InventoryKey::new(&booking.train_number, booking.class_type, booking.journey_date);
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1)::bigint)")
            .bind(key.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| Self::map_write_error(e, "taking inventory lock"))?;

        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, pnr, user_id, train_number, train_name, journey_date, class_type,
                quota, source_code, destination_code, contact_mobile, contact_email,
                total_fare, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(booking.id)
        .bind(&booking.pnr)
        .bind(&booking.user_id)
        .bind(&booking.train_number)
        .bind(&booking.train_name)
        .bind(booking.journey_date)
        .bind(booking.class_type.code())
        .bind(booking.quota.code())
        .bind(&booking.source_code)
        .bind(&booking.destination_code)
        .bind(&booking.contact.mobile)
        .bind(&booking.contact.email)
        .bind(booking.total_fare)
        .bind(booking.status.as_str())
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| Self::map_write_error(e, "inserting booking"))?;

        for (seq, passenger) in booking.passengers.iter().enumerate() {
            let assignment = &passenger.assignment;
            sqlx::query(
                r#"
                INSERT INTO booking_passengers (
                    booking_id, seq, name, age, gender, is_disabled, berth_preference,
                    status, coach_code, seat_number, berth, position,
                    train_number, class_type, journey_date
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
                "#,
            )
            .bind(booking.id)
            .bind(seq as i32)
            .bind(&passenger.name)
            .bind(passenger.age)
            .bind(passenger.gender.as_str())
            .bind(passenger.is_disabled)
            .bind(passenger.berth_preference.label())
            .bind(assignment.status.code())
            .bind(&assignment.coach_code)
            .bind(assignment.seat_number)
            .bind(assignment.berth.map(|b| b.label()))
            .bind(assignment.position)
            .bind(&booking.train_number)
            .bind(booking.class_type.code())
            .bind(booking.journey_date)
            .execute(&mut *tx)
            .await
            .map_err(|e| Self::map_write_error(e, "inserting passenger"))?;
        }

        tx.commit().await.map_err(|e| {
            error!("Failed to commit booking transaction: {}", e);
            AppError::Transaction(format!("Failed to commit: {}", e))
        })?;

        info!("Booking {} stored", booking.pnr);

        Ok(booking.clone())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Booking>> {
        let query = format!("SELECT {} FROM bookings WHERE id = $1", BOOKING_SELECT_COLUMNS);

        let row = sqlx::query_as::<sqlx::Postgres, BookingRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding booking {}: {}", id, e);
                AppError::Database(format!("Failed to find booking: {}", e))
            })?;

        match row {
            Some(row) => Ok(self.attach_passengers(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn find_by_pnr(&self, pnr: &str) -> AppResult<Option<Booking>> {
        let query = format!("SELECT {} FROM bookings WHERE pnr = $1", BOOKING_SELECT_COLUMNS);

        let row = sqlx::query_as::<sqlx::Postgres, BookingRow>(&query)
            .bind(pnr)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding booking by PNR: {}", e);
                AppError::Database(format!("Failed to find booking: {}", e))
            })?;

        match row {
            Some(row) => Ok(self.attach_passengers(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn list_by_user(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Booking>, i64)> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bookings WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting bookings: {}", e);
                AppError::Database(format!("Failed to count bookings: {}", e))
            })?;

        let query = format!(
            "SELECT {} FROM bookings WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            BOOKING_SELECT_COLUMNS
        );

        let rows = sqlx::query_as::<sqlx::Postgres, BookingRow>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error listing bookings: {}", e);
                AppError::Database(format!("Failed to list bookings: {}", e))
            })?;

        Ok((self.attach_passengers(rows).await?, total.0))
    }

    #[instrument(skip(self))]
    async fn cancel(&self, id: Uuid) -> AppResult<Option<Booking>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            AppError::Transaction(format!("Failed to begin transaction: {}", e))
        })?;

        let query = format!(
            r#"
            UPDATE bookings
            SET status = 'cancelled', updated_at = NOW()
            WHERE id = $1 AND status = 'booked'
            RETURNING {}
            "#,
            BOOKING_SELECT_COLUMNS
        );

        let row = sqlx::query_as::<sqlx::Postgres, BookingRow>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                error!("Database error cancelling booking {}: {}", id, e);
                AppError::Database(format!("Failed to cancel booking: {}", e))
            })?;

        let Some(row) = row else {
            debug!("Booking {} is not in booked state", id);
            return Ok(None);
        };

        let released = sqlx::query(
            r#"
            UPDATE booking_passengers
            SET status = 'CAN', coach_code = NULL, seat_number = NULL,
                berth = NULL, position = NULL
            WHERE booking_id = $1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("Database error releasing seats of booking {}: {}", id, e);
            AppError::Database(format!("Failed to release seats: {}", e))
        })?;

        tx.commit().await.map_err(|e| {
            error!("Failed to commit cancellation: {}", e);
            AppError::Transaction(format!("Failed to commit: {}", e))
        })?;

        info!(
            "Booking {} cancelled, {} passengers released",
            row.pnr,
            released.rows_affected()
        );

        Ok(self.attach_passengers(vec![row]).await?.pop())
    }
}

/// Helper structs for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    pnr: String,
    user_id: String,
    train_number: String,
    train_name: String,
    journey_date: NaiveDate,
    class_type: String,
    quota: String,
    source_code: String,
    destination_code: String,
    contact_mobile: String,
    contact_email: Option<String>,
    total_fare: Decimal,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BookingRow {
    fn into_booking(self, passengers: Vec<Passenger>) -> AppResult<Booking> {
        let class_type = ClassType::from_code(&self.class_type).ok_or_else(|| {
            error!("Booking {} has unknown class {}", self.id, self.class_type);
            AppError::Database(format!("Unknown class type: {}", self.class_type))
        })?;

        Ok(Booking {
            id: self.id,
            pnr: self.pnr.trim().to_string(),
            user_id: self.user_id,
            train_number: self.train_number,
            train_name: self.train_name,
            journey_date: self.journey_date,
            class_type,
            quota: Quota::parse(&self.quota).unwrap_or_default(),
            source_code: self.source_code,
            destination_code: self.destination_code,
            passengers,
            contact: Contact {
                mobile: self.contact_mobile,
                email: self.contact_email,
            },
            total_fare: self.total_fare,
            status: BookingStatus::parse(&self.status).unwrap_or_default(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PassengerRow {
    booking_id: Uuid,
    #[allow(dead_code)]
    seq: i32,
    name: String,
    age: i32,
    gender: String,
    is_disabled: bool,
    berth_preference: String,
    status: String,
    coach_code: Option<String>,
    seat_number: Option<i32>,
    berth: Option<String>,
    position: Option<i32>,
}

impl From<PassengerRow> for Passenger {
    fn from(row: PassengerRow) -> Self {
        Self {
            name: row.name,
            age: row.age,
            gender: Gender::parse(&row.gender).unwrap_or(Gender::Other),
            is_disabled: row.is_disabled,
            berth_preference: BerthPreference::from_label(&row.berth_preference),
            assignment: SeatAssignment {
                status: PassengerStatus::parse(&row.status).unwrap_or(PassengerStatus::Cancelled),
                coach_code: row.coach_code,
                seat_number: row.seat_number,
                berth: row.berth.as_deref().and_then(BerthType::from_label),
                position: row.position,
            },
        }
    }
}
