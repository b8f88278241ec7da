//! Actix-web request extractor for the authenticated booking owner

use crate::jwt::JwtService;
use crate::Claims;
use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use rail_core::error::AppError;
use std::sync::Arc;
use tracing::{debug, warn};

/// Bearer token from `Authorization`, else the `token` cookie
fn bearer_token(req: &HttpRequest) -> Option<String> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());

    header.or_else(|| req.cookie("token").map(|c| c.value().to_string()))
}

/// Authenticated user extractor
///
/// ```no_run
/// use actix_web::HttpResponse;
/// use rail_auth::AuthenticatedUser;
///
/// async fn my_bookings(user: AuthenticatedUser) -> HttpResponse {
///     HttpResponse::Ok().json(serde_json::json!({ "user_id": user.user_id }))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Subject of the validated token
    pub user_id: String,

    /// Full claims from the JWT token
    pub claims: Claims,
}

impl AuthenticatedUser {
    fn authenticate(req: &HttpRequest) -> Result<Self, AppError> {
        let jwt = req.app_data::<web::Data<Arc<JwtService>>>().ok_or_else(|| {
            warn!("JwtService missing from app data");
            AppError::Unauthorized("Authentication service not configured".to_string())
        })?;

        let token = bearer_token(req).ok_or_else(|| {
            debug!("Request carries no token");
            AppError::Unauthorized("No authentication token provided".to_string())
        })?;

        let claims = jwt.validate_token(&token)?;
        Ok(Self {
            user_id: claims.sub.clone(),
            claims,
        })
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::authenticate(req).map_err(actix_web::Error::from))
    }
}
