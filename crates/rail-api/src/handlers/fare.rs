//! Fare enquiry handlers

use crate::dto::{ApiResponse, FareRequest, FareResponse};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use rail_core::models::normalize_station_code;
use rail_core::traits::{BookingRepository, CatalogRepository};
use rail_core::AppError;
use tracing::{debug, instrument, warn};
use validator::Validate;

/// Calculate the fare for one passenger
///
/// POST /api/v1/fares/calculate
#[instrument(skip(state, req))]
pub async fn calculate_fare<C, B>(
    state: web::Data<AppState<C, B>>,
    req: web::Json<FareRequest>,
) -> Result<HttpResponse, AppError>
where
    C: CatalogRepository + 'static,
    B: BookingRepository + 'static,
{
    req.validate().map_err(|e| {
        warn!("Fare request validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;
    let req = req.into_inner();

    let category = match &req.train_number {
        Some(number) => {
            state
                .catalog
                .find_train(number)
                .await?
                .ok_or_else(|| AppError::TrainNotFound(number.clone()))?
                .category
        }
        None => req.train_type,
    };

    debug!(from = %req.from, to = %req.to, %category, "Calculating fare");

    let quote = state
        .fares
        .compute_fare(&req.from, &req.to, category, req.class_type, req.quota)
        .await?;

    let response = FareResponse::new(
        normalize_station_code(&req.from),
        normalize_station_code(&req.to),
        category,
        req.class_type,
        req.quota,
        quote,
    );
    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

pub fn configure<C, B>(cfg: &mut web::ServiceConfig)
where
    C: CatalogRepository + 'static,
    B: BookingRepository + 'static,
{
    cfg.service(web::scope("/fares").route("/calculate", web::post().to(calculate_fare::<C, B>)));
}
