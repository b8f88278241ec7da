//! HS256 token validation
//!
//! Tokens are issued by the identity provider; `create_token` exists for
//! local tooling and tests.

use crate::claims::Claims;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use rail_core::error::AppError;
use tracing::{debug, error, warn};

/// JWT Service for token creation and validation
#[derive(Clone)]
pub struct JwtService {
    /// Default token expiration time in seconds
    expiration_secs: i64,

    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    /// Create a new JWT service
    pub fn new(secret: &str, expiration_secs: i64) -> Self {
        Self {
            expiration_secs,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Sign claims, stamping the default lifetime when `exp` is unset
    pub fn create_token(&self, claims: &Claims) -> Result<String, AppError> {
        let mut token_claims = claims.clone();

        if token_claims.exp == 0 {
            let exp = Utc::now() + Duration::seconds(self.expiration_secs);
            token_claims.exp = exp.timestamp();
        }

        encode(&Header::default(), &token_claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "Failed to sign token");
            AppError::InvalidToken(format!("Token creation failed: {}", e))
        })
    }

    /// Validate a bearer token and return its claims
    ///
    /// Tokens must carry `sub` and `exp`. An expired signature maps to
    /// `TokenExpired`; anything else wrong with the token is `InvalidToken`.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::default();
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AppError::TokenExpired,
                _ => {
                    warn!(error = %e, "Rejected token");
                    AppError::InvalidToken(e.to_string())
                }
            })?;

        if claims.sub.trim().is_empty() {
            warn!("Token carries an empty subject");
            return Err(AppError::InvalidToken("Missing subject".to_string()));
        }

        debug!(user_id = %claims.sub, "Token accepted");
        Ok(claims)
    }

    pub fn expiration_secs(&self) -> i64 {
        self.expiration_secs
    }
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("expiration_secs", &self.expiration_secs)
            .finish_non_exhaustive()
    }
}
