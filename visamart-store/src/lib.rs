pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod offer_repo;

pub use booking_repo::PostgresBookingRepository;
pub use database::DbClient;
pub use offer_repo::PostgresOfferRepository;
