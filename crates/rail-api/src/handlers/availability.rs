//! Availability handlers

use crate::dto::{ApiResponse, AvailabilityQuery, AvailabilityResponse, CoachChartResponse};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use rail_core::models::{parse_journey_date, InventoryKey};
use rail_core::traits::{BookingRepository, CatalogRepository};
use rail_core::AppError;
use tracing::{debug, instrument};

/// Live availability for one class on one date
///
/// GET /api/v1/trains/{number}/availability?class_type=SL&date=2026-11-03
#[instrument(skip(state))]
pub async fn get_availability<C, B>(
    state: web::Data<AppState<C, B>>,
    path: web::Path<String>,
    query: web::Query<AvailabilityQuery>,
) -> Result<HttpResponse, AppError>
where
    C: CatalogRepository + 'static,
    B: BookingRepository + 'static,
{
    let train_number = path.into_inner();
    let journey_date = parse_journey_date(&query.date)?;

    let train = state
        .catalog
        .find_train(&train_number)
        .await?
        .ok_or_else(|| AppError::TrainNotFound(train_number.clone()))?;

    let key = InventoryKey::new(train.number.as_str(), query.class_type, journey_date);
    let availability = state.availability.get_availability(&key).await?;

    debug!(%key, status = %availability.status_label, "Availability computed");

    Ok(HttpResponse::Ok().json(ApiResponse::success(AvailabilityResponse {
        train_number: train.number,
        class_type: query.class_type,
        journey_date,
        availability,
    })))
}

/// Seat and vacancy counts per coach
///
/// GET /api/v1/trains/{number}/coaches?class_type=3A&date=2026-11-03
#[instrument(skip(state))]
pub async fn get_coach_chart<C, B>(
    state: web::Data<AppState<C, B>>,
    path: web::Path<String>,
    query: web::Query<AvailabilityQuery>,
) -> Result<HttpResponse, AppError>
where
    C: CatalogRepository + 'static,
    B: BookingRepository + 'static,
{
    let train_number = path.into_inner();
    let journey_date = parse_journey_date(&query.date)?;

    let train = state
        .catalog
        .find_train(&train_number)
        .await?
        .ok_or_else(|| AppError::TrainNotFound(train_number.clone()))?;

    let key = InventoryKey::new(train.number.as_str(), query.class_type, journey_date);
    let coaches = state.availability.coach_chart(&key).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(CoachChartResponse {
        train_number: train.number,
        class_type: query.class_type,
        journey_date,
        coaches,
    })))
}

pub fn configure<C, B>(cfg: &mut web::ServiceConfig)
where
    C: CatalogRepository + 'static,
    B: BookingRepository + 'static,
{
    cfg.route(
        "/trains/{number}/availability",
        web::get().to(get_availability::<C, B>),
    )
    .route(
        "/trains/{number}/coaches",
        web::get().to(get_coach_chart::<C, B>),
    );
}
