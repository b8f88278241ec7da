//! Authentication for the rail booking API
//!
//! Users authenticate with an external identity provider that issues signed
//! JWTs. This crate only validates those tokens and exposes the subject as
//! the booking owner.
//!
//! ```no_run
//! use rail_auth::{Claims, JwtService};
//!
//! let jwt_service = JwtService::new("your-secret-key", 3600);
//! let token = jwt_service.create_token(&Claims::new("user-42"))?;
//! let claims = jwt_service.validate_token(&token)?;
//! assert_eq!(claims.sub, "user-42");
//! # Ok::<(), rail_core::error::AppError>(())
//! ```

pub mod claims;
pub mod jwt;
pub mod middleware;

pub use claims::Claims;
pub use jwt::JwtService;
pub use middleware::AuthenticatedUser;
