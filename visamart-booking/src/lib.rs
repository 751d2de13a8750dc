pub mod coordinator;
pub mod lifecycle;
pub mod memory;
pub mod models;
pub mod notify;
pub mod reference;
pub mod repository;

pub use coordinator::{BookingCoordinator, BookingReceipt, PlaceBookingRequest};
pub use lifecycle::BookingLifecycle;
pub use memory::InMemoryBookingRepository;
pub use models::{Applicant, Booking, BookingStatus};
pub use notify::ReadTracker;
pub use repository::{BookingRepository, InsertOutcome, RejectOutcome, UnreadCounts};
