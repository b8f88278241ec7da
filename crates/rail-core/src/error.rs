//! Unified error handling for the booking engine
//!
//! One error type covers every failure the engine can report, with automatic
//! HTTP response mapping. Capacity outcomes (RAC, waitlist) are not errors.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Main application error type
///
/// All errors in the application should be converted to this type.
/// It implements `ResponseError` for automatic HTTP response generation.
#[derive(Error, Debug)]
pub enum AppError {
    // ==================== Storage Errors ====================
    #[error("Database error: {0}")]
    Database(String),

    #[error("Database pool error: {0}")]
    Pool(String),

    #[error("Transaction failed: {0}")]
    Transaction(String),

    // ==================== Cache Errors ====================
    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Cache connection failed: {0}")]
    CacheConnection(String),

    // ==================== Authentication Errors ====================
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // ==================== Reference Data Errors ====================
    #[error("Unknown station: {0}")]
    UnknownStation(String),

    #[error("Train not found: {0}")]
    TrainNotFound(String),

    #[error("No coaches configured for train {train} class {class}")]
    NoCoachesForClass { train: String, class: String },

    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    #[error("Train {train} does not run on {date}")]
    TrainNotRunning { train: String, date: String },

    // ==================== Booking Errors ====================
    #[error("Booking not found: {0}")]
    BookingNotFound(String),

    #[error("Not authorized to modify this booking")]
    NotOwner,

    #[error("Booking already cancelled: {0}")]
    AlreadyCancelled(String),

    #[error("Could not generate a unique PNR after {attempts} attempts")]
    PnrGenerationFailed { attempts: u32 },

    #[error("Booking could not be completed after {attempts} attempts, please retry")]
    BookingFailed { attempts: u32 },

    /// A seat in the decided assignment was claimed by a concurrent booking.
    #[error("Seat conflict: {0}")]
    SeatConflict(String),

    /// The generated PNR collided with an existing booking.
    #[error("PNR conflict: {0}")]
    PnrConflict(String),

    // ==================== Validation Errors ====================
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation(_)
            | AppError::InvalidInput(_)
            | AppError::InvalidRoute(_)
            | AppError::TrainNotRunning { .. } => StatusCode::BAD_REQUEST,

            // 401 Unauthorized
            AppError::InvalidToken(_) | AppError::TokenExpired | AppError::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }

            // 403 Forbidden
            AppError::NotOwner => StatusCode::FORBIDDEN,

            // 404 Not Found
            AppError::UnknownStation(_)
            | AppError::TrainNotFound(_)
            | AppError::BookingNotFound(_) => StatusCode::NOT_FOUND,

            // 409 Conflict
            AppError::AlreadyCancelled(_) | AppError::SeatConflict(_) | AppError::PnrConflict(_) => {
                StatusCode::CONFLICT
            }

            // 422 Unprocessable Entity
            AppError::NoCoachesForClass { .. } => StatusCode::UNPROCESSABLE_ENTITY,

            // 503 Service Unavailable
            AppError::BookingFailed { .. } => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database_error",
            AppError::Pool(_) => "pool_error",
            AppError::Transaction(_) => "transaction_error",
            AppError::Cache(_) => "cache_error",
            AppError::CacheConnection(_) => "cache_connection_error",
            AppError::TokenExpired => "token_expired",
            AppError::InvalidToken(_) => "invalid_token",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::UnknownStation(_) => "unknown_station",
            AppError::TrainNotFound(_) => "train_not_found",
            AppError::NoCoachesForClass { .. } => "no_coaches_for_class",
            AppError::InvalidRoute(_) => "invalid_route",
            AppError::TrainNotRunning { .. } => "train_not_running",
            AppError::BookingNotFound(_) => "booking_not_found",
            AppError::NotOwner => "not_owner",
            AppError::AlreadyCancelled(_) => "already_cancelled",
            AppError::PnrGenerationFailed { .. } => "pnr_generation_failed",
            AppError::BookingFailed { .. } => "booking_failed",
            AppError::SeatConflict(_) => "seat_conflict",
            AppError::PnrConflict(_) => "pnr_conflict",
            AppError::Validation(_) => "validation_error",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::Serialization(_) => "serialization_error",
        }
    }

    /// True for failures whose detail must stay in the logs.
    pub fn is_internal(&self) -> bool {
        self.status_code() == StatusCode::INTERNAL_SERVER_ERROR
            && !matches!(self, AppError::PnrGenerationFailed { .. })
    }

    /// Message safe to hand to API clients.
    pub fn public_message(&self) -> String {
        if self.is_internal() {
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        AppError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = json!({
            "error": self.error_code(),
            "message": self.public_message(),
            "status": status.as_u16(),
        });

        HttpResponse::build(status).json(body)
    }
}

// ==================== From implementations ====================

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}
