pub mod manager;
pub mod memory;
pub mod models;
pub mod repository;

pub use manager::OfferManager;
pub use memory::InMemoryOfferRepository;
pub use models::{OfferStatus, OfferTerms, VisaOffer};
pub use repository::{DeleteOutcome, OfferRepository, ReserveOutcome};
