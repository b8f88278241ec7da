//! Booking handlers
//!
//! Creating, listing and cancelling bookings need an authenticated user. PNR
//! lookup is public.

use crate::dto::{ApiResponse, BookingResponse, CreateBookingRequest, PaginationParams};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use rail_auth::AuthenticatedUser;
use rail_core::traits::{BookingRepository, CatalogRepository, PaginatedResponse, Pagination};
use rail_core::AppError;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Book seats
///
/// POST /api/v1/bookings
#[instrument(skip(state, user, req), fields(user_id = %user.user_id))]
pub async fn create_booking<C, B>(
    state: web::Data<AppState<C, B>>,
    user: AuthenticatedUser,
    req: web::Json<CreateBookingRequest>,
) -> Result<HttpResponse, AppError>
where
    C: CatalogRepository + 'static,
    B: BookingRepository + 'static,
{
    req.validate().map_err(|e| {
        warn!("Booking validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let request = req.into_inner().into_booking_request()?;
    let booking = state.bookings.book(request, &user.user_id).await?;

    info!(pnr = %booking.pnr, "Booking created");

    Ok(HttpResponse::Created().json(ApiResponse::success(BookingResponse::from(booking))))
}

/// The caller's bookings, newest first
///
/// GET /api/v1/bookings/mine
#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn list_my_bookings<C, B>(
    state: web::Data<AppState<C, B>>,
    user: AuthenticatedUser,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse, AppError>
where
    C: CatalogRepository + 'static,
    B: BookingRepository + 'static,
{
    query.validate().map_err(|e| {
        warn!("Pagination validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let page = state
        .bookings
        .list_for_user(&user.user_id, &Pagination::from(&*query))
        .await?;

    Ok(HttpResponse::Ok().json(PaginatedResponse {
        data: page.data.into_iter().map(BookingResponse::from).collect::<Vec<_>>(),
        pagination: page.pagination,
    }))
}

/// Cancel one of the caller's bookings
///
/// POST /api/v1/bookings/{id}/cancel
#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn cancel_booking<C, B>(
    state: web::Data<AppState<C, B>>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError>
where
    C: CatalogRepository + 'static,
    B: BookingRepository + 'static,
{
    let booking = state.bookings.cancel(path.into_inner(), &user.user_id).await?;

    info!(pnr = %booking.pnr, "Booking cancelled");

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        BookingResponse::from(booking),
        "Booking cancelled successfully",
    )))
}

/// Public PNR status
///
/// GET /api/v1/bookings/pnr/{pnr}
#[instrument(skip(state))]
pub async fn get_booking_by_pnr<C, B>(
    state: web::Data<AppState<C, B>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError>
where
    C: CatalogRepository + 'static,
    B: BookingRepository + 'static,
{
    let booking = state.bookings.get_by_pnr(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(BookingResponse::from(booking))))
}

pub fn configure<C, B>(cfg: &mut web::ServiceConfig)
where
    C: CatalogRepository + 'static,
    B: BookingRepository + 'static,
{
    cfg.service(
        web::scope("/bookings")
            .route("", web::post().to(create_booking::<C, B>))
            .route("/mine", web::get().to(list_my_bookings::<C, B>))
            .route("/pnr/{pnr}", web::get().to(get_booking_by_pnr::<C, B>))
            .route("/{id}/cancel", web::post().to(cancel_booking::<C, B>)),
    );
}
