//! Reference data repository implementation
//!
//! Stations, trains with their routes, and coach layouts. This data is
//! seeded externally and only read at runtime.

use chrono::{NaiveTime, Weekday};
use rail_core::{
    models::{
        normalize_station_code, BerthType, ClassType, Coach, RouteStop, Seat, Station, Train,
        TrainCategory,
    },
    traits::CatalogRepository,
    AppError, AppResult,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument, warn};

/// PostgreSQL implementation of CatalogRepository
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    /// Create a new catalog repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn parse_classes(codes: &[String]) -> Vec<ClassType> {
        codes
            .iter()
            .filter_map(|c| {
                let parsed = ClassType::from_code(c);
                if parsed.is_none() {
                    warn!("Ignoring unknown class code in catalog: {}", c);
                }
                parsed
            })
            .collect()
    }

    fn parse_days(days: &[String]) -> Vec<Weekday> {
        days.iter().filter_map(|d| d.parse::<Weekday>().ok()).collect()
    }
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    #[instrument(skip(self))]
    async fn find_station(&self, code: &str) -> AppResult<Option<Station>> {
        let code = normalize_station_code(code);
        debug!("Finding station by code: {}", code);

        let row = sqlx::query_as::<sqlx::Postgres, StationRow>(
            r#"
            SELECT code, name, latitude, longitude, state, zone
            FROM stations
            WHERE code = $1
            "#,
        )
        .bind(&code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding station {}: {}", code, e);
            AppError::Database(format!("Failed to find station: {}", e))
        })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_train(&self, number: &str) -> AppResult<Option<Train>> {
        debug!("Finding train by number: {}", number);

        let row = sqlx::query_as::<sqlx::Postgres, TrainRow>(
            r#"
            SELECT number, name, category, source_code, destination_code,
                   classes, days_of_operation
            FROM trains
            WHERE number = $1
            "#,
        )
        .bind(number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding train {}: {}", number, e);
            AppError::Database(format!("Failed to find train: {}", e))
        })?;

        let Some(row) = row else {
            return Ok(None);
        };

        let stops = sqlx::query_as::<sqlx::Postgres, StopRow>(
            r#"
            SELECT station_code, arrival, departure, distance_km, day_offset
            FROM train_stops
            WHERE train_number = $1
            ORDER BY seq
            "#,
        )
        .bind(number)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error loading route of train {}: {}", number, e);
            AppError::Database(format!("Failed to load train route: {}", e))
        })?;

        Ok(Some(Train {
            number: row.number,
            name: row.name,
            category: TrainCategory::parse(&row.category),
            source_code: row.source_code,
            destination_code: row.destination_code,
            route: stops.into_iter().map(Into::into).collect(),
            classes: Self::parse_classes(&row.classes),
            days_of_operation: Self::parse_days(&row.days_of_operation),
        }))
    }

    #[instrument(skip(self))]
    async fn find_coaches(&self, train_number: &str, class_type: ClassType) -> AppResult<Vec<Coach>> {
        debug!("Finding {} coaches for train {}", class_type, train_number);

        let rows = sqlx::query_as::<sqlx::Postgres, SeatRow>(
            r#"
            SELECT c.code AS coach_code, s.seat_number, s.berth
            FROM coaches c
            JOIN seats s ON s.train_number = c.train_number AND s.coach_code = c.code
            WHERE c.train_number = $1 AND c.class_type = $2
            ORDER BY c.code, s.seat_number
            "#,
        )
        .bind(train_number)
        .bind(class_type.code())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error loading coaches for {}: {}", train_number, e);
            AppError::Database(format!("Failed to load coaches: {}", e))
        })?;

        let mut coaches: Vec<Coach> = Vec::new();
        for row in rows {
            let berth = BerthType::from_label(&row.berth)
                .unwrap_or_else(|| BerthType::for_seat(class_type, row.seat_number));
            let seat = Seat {
                number: row.seat_number,
                berth,
            };

            match coaches.last_mut() {
                Some(coach) if coach.code == row.coach_code => coach.seats.push(seat),
                _ => coaches.push(Coach {
                    train_number: train_number.to_string(),
                    code: row.coach_code,
                    class_type,
                    seats: vec![seat],
                }),
            }
        }

        Ok(coaches)
    }
}

/// Helper structs for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct StationRow {
    code: String,
    name: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    state: Option<String>,
    zone: Option<String>,
}

impl From<StationRow> for Station {
    fn from(row: StationRow) -> Self {
        Self {
            code: row.code,
            name: row.name,
            latitude: row.latitude,
            longitude: row.longitude,
            state: row.state,
            zone: row.zone,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TrainRow {
    number: String,
    name: String,
    category: String,
    source_code: String,
    destination_code: String,
    classes: Vec<String>,
    days_of_operation: Vec<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct StopRow {
    station_code: String,
    arrival: Option<NaiveTime>,
    departure: Option<NaiveTime>,
    distance_km: Option<Decimal>,
    day_offset: i32,
}

impl From<StopRow> for RouteStop {
    fn from(row: StopRow) -> Self {
        Self {
            station_code: row.station_code,
            arrival: row.arrival,
            departure: row.departure,
            distance_km: row.distance_km,
            day_offset: row.day_offset,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SeatRow {
    coach_code: String,
    seat_number: i32,
    berth: String,
}
