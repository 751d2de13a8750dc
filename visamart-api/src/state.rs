use std::sync::Arc;
use visamart_booking::{BookingCoordinator, BookingLifecycle, BookingRepository, ReadTracker};
use visamart_offer::{OfferManager, OfferRepository};
use visamart_store::app_config::BusinessRules;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub offers: Arc<dyn OfferRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub offer_manager: Arc<OfferManager>,
    pub coordinator: Arc<BookingCoordinator>,
    pub lifecycle: Arc<BookingLifecycle>,
    pub reader: Arc<ReadTracker>,
    pub auth: AuthConfig,
    pub rules: BusinessRules,
}
