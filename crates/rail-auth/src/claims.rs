//! JWT Claims structure

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

/// JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create claims for a user; expiration is filled in by `JwtService`
    pub fn new(user_id: &str) -> Self {
        Self {
            sub: user_id.to_string(),
            iat: Utc::now().timestamp(),
            exp: 0,
        }
    }

    /// Create claims with custom expiration duration
    pub fn with_expiration(user_id: &str, expires_in_secs: i64) -> Self {
        let now = Utc::now();
        let exp = now + Duration::seconds(expires_in_secs);

        Self {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.exp <= Utc::now().timestamp()
    }

    pub fn user_id(&self) -> &str {
        &self.sub
    }
}
