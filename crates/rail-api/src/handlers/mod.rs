//! HTTP request handlers

pub mod availability;
pub mod booking;
pub mod fare;
pub mod health;

use actix_web::web;
use rail_core::traits::{BookingRepository, CatalogRepository};

/// Configure every route under `/api/v1`
pub fn configure<C, B>(cfg: &mut web::ServiceConfig)
where
    C: CatalogRepository + 'static,
    B: BookingRepository + 'static,
{
    cfg.service(
        web::scope("/api/v1")
            .configure(health::configure)
            .configure(fare::configure::<C, B>)
            .configure(availability::configure::<C, B>)
            .configure(booking::configure::<C, B>),
    );
}
