use crate::models::{OfferStatus, OfferTerms, VisaOffer};
use async_trait::async_trait;
use uuid::Uuid;

/// Result of a conditional stock decrement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// The guard held and the decrement was applied in a single write.
    Reserved {
        remaining: i32,
        status: OfferStatus,
    },
    /// A concurrent reservation consumed the stock between the caller's
    /// pre-check and this write. Retryable from the caller's point of view.
    Conflict,
}

/// Result of an offer deletion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// Bookings reference the offer; it is a financial record and stays.
    InUse,
}

/// Repository trait for visa offer data access.
///
/// `reserve` and `restore` are the Inventory Ledger: `reserve` must be a
/// compare-and-swap (decrement only while the persisted stock still covers
/// the quantity) and must flip the offer to SOLD_OUT in the same write when
/// the remainder hits zero. `restore` increments unconditionally and never
/// touches status.
#[async_trait]
pub trait OfferRepository: Send + Sync {
    async fn create_offer(
        &self,
        offer: &VisaOffer,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn get_offer(
        &self,
        id: Uuid,
    ) -> Result<Option<VisaOffer>, Box<dyn std::error::Error + Send + Sync>>;

    /// Marketplace discovery: open offers from every agency but the caller's.
    async fn list_open_offers(
        &self,
        exclude_agency: Uuid,
    ) -> Result<Vec<VisaOffer>, Box<dyn std::error::Error + Send + Sync>>;

    async fn list_seller_offers(
        &self,
        seller_agency_id: Uuid,
    ) -> Result<Vec<VisaOffer>, Box<dyn std::error::Error + Send + Sync>>;

    async fn update_terms(
        &self,
        id: Uuid,
        terms: &OfferTerms,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Conditional status write. Returns false when the guard failed
    /// (activating an offer whose stock is zero).
    async fn set_status(
        &self,
        id: Uuid,
        status: OfferStatus,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;

    async fn delete_offer(
        &self,
        id: Uuid,
    ) -> Result<DeleteOutcome, Box<dyn std::error::Error + Send + Sync>>;

    async fn reserve(
        &self,
        id: Uuid,
        quantity: i32,
    ) -> Result<ReserveOutcome, Box<dyn std::error::Error + Send + Sync>>;

    async fn restore(
        &self,
        id: Uuid,
        quantity: i32,
    ) -> Result<i32, Box<dyn std::error::Error + Send + Sync>>;
}
