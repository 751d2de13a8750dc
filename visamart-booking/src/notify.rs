use crate::repository::{BookingRepository, UnreadCounts};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use visamart_core::{MarketError, MarketResult, PartyRole};

/// Read/unread tracking over the booking list, used as a lightweight
/// notification badge. `sales` counts only new incoming requests (unread and
/// still SUBMITTED); `purchases` counts every unread outgoing booking, since
/// any status change is news to the buyer.
pub struct ReadTracker {
    bookings: Arc<dyn BookingRepository>,
}

impl ReadTracker {
    pub fn new(bookings: Arc<dyn BookingRepository>) -> Self {
        Self { bookings }
    }

    /// Bulk mark-as-read for one side of the ledger. Idempotent.
    pub async fn mark_read(&self, agency_id: Uuid, role: PartyRole) -> MarketResult<u64> {
        let flipped = self
            .bookings
            .mark_read(agency_id, role)
            .await
            .map_err(MarketError::storage)?;
        debug!(agency = %agency_id, ?role, flipped, "bookings marked read");
        Ok(flipped)
    }

    pub async fn unread_counts(&self, agency_id: Uuid) -> MarketResult<UnreadCounts> {
        self.bookings
            .unread_counts(agency_id)
            .await
            .map_err(MarketError::storage)
    }
}
