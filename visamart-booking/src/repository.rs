use crate::models::{Booking, BookingStatus};
use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;
use visamart_core::PartyRole;

/// Result of a booking insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The generated reference already exists; regenerate and retry.
    DuplicateReference,
}

/// Result of the atomic reject-and-restock pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectOutcome {
    Rejected { restored_available: i32 },
    /// The booking was no longer in an expected source status; nothing was
    /// written, the stock was not touched.
    StaleStatus,
}

/// Aggregate unread counts for one agency.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct UnreadCounts {
    pub sales: i64,
    pub purchases: i64,
}

/// Repository trait for booking data access.
///
/// `transition_status` and `reject_restocking` are conditional writes keyed
/// on the expected current status, so two seller sessions racing each other
/// cannot produce a lost update or a double restock.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create_booking(
        &self,
        booking: &Booking,
    ) -> Result<InsertOutcome, Box<dyn std::error::Error + Send + Sync>>;

    async fn get_booking(
        &self,
        id: Uuid,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>>;

    /// Newest-first page of bookings where the agency plays the given role,
    /// plus the total count for that filter.
    async fn list_for_party(
        &self,
        agency_id: Uuid,
        role: PartyRole,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Booking>, i64), Box<dyn std::error::Error + Send + Sync>>;

    /// Status write guarded by the expected current status. Returns false
    /// when the guard failed (the booking moved underneath the caller).
    async fn transition_status(
        &self,
        id: Uuid,
        expected: &[BookingStatus],
        to: BookingStatus,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;

    /// Flip the booking to REJECTED and restore its quantity to the offer,
    /// committing both writes or neither.
    async fn reject_restocking(
        &self,
        id: Uuid,
        expected: &[BookingStatus],
    ) -> Result<RejectOutcome, Box<dyn std::error::Error + Send + Sync>>;

    /// Bulk-set the read flag for the given party. Idempotent; returns the
    /// number of bookings actually flipped.
    async fn mark_read(
        &self,
        agency_id: Uuid,
        role: PartyRole,
    ) -> Result<u64, Box<dyn std::error::Error + Send + Sync>>;

    async fn unread_counts(
        &self,
        agency_id: Uuid,
    ) -> Result<UnreadCounts, Box<dyn std::error::Error + Send + Sync>>;
}
