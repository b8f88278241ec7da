//! Shared application state

use rail_core::{
    config::{BookingConfig, FareConfig},
    traits::{BookingRepository, CatalogRepository},
};
use rail_services::{AvailabilityService, BookingService, FareCalculator, InventoryService};
use std::sync::Arc;

/// Services shared by every worker
pub struct AppState<C: CatalogRepository, B: BookingRepository> {
    pub catalog: Arc<C>,
    pub fares: Arc<FareCalculator<C>>,
    pub availability: AvailabilityService<C, B>,
    pub bookings: BookingService<C, B>,
}

impl<C: CatalogRepository, B: BookingRepository> AppState<C, B> {
    pub fn new(catalog: Arc<C>, bookings: Arc<B>, booking: BookingConfig, fare: FareConfig) -> Self {
        let fares = Arc::new(FareCalculator::new(catalog.clone(), fare));
        let inventory = Arc::new(InventoryService::new(catalog.clone(), bookings.clone()));

        Self {
            availability: AvailabilityService::new(inventory, booking.rac_percent),
            bookings: BookingService::new(catalog.clone(), bookings, fares.clone(), booking),
            catalog,
            fares,
        }
    }
}
