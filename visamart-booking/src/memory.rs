use crate::models::{Booking, BookingStatus};
use crate::repository::{BookingRepository, InsertOutcome, RejectOutcome, UnreadCounts};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use uuid::Uuid;
use visamart_core::PartyRole;
use visamart_offer::{InMemoryOfferRepository, OfferRepository};

/// In-memory booking repository, paired with the in-memory offer repository
/// so the reject/restock pair can touch both maps the way the Postgres
/// implementation touches both tables in one transaction.
pub struct InMemoryBookingRepository {
    offers: Arc<InMemoryOfferRepository>,
    bookings: Mutex<HashMap<Uuid, Booking>>,
    references: Mutex<HashSet<String>>,
}

impl InMemoryBookingRepository {
    pub fn new(offers: Arc<InMemoryOfferRepository>) -> Self {
        Self {
            offers,
            bookings: Mutex::new(HashMap::new()),
            references: Mutex::new(HashSet::new()),
        }
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn create_booking(
        &self,
        booking: &Booking,
    ) -> Result<InsertOutcome, Box<dyn std::error::Error + Send + Sync>> {
        {
            let mut references = self.references.lock().expect("reference lock poisoned");
            if !references.insert(booking.reference.clone()) {
                return Ok(InsertOutcome::DuplicateReference);
            }
        }
        self.bookings
            .lock()
            .expect("booking lock poisoned")
            .insert(booking.id, booking.clone());
        self.offers.note_booking(booking.offer_id);
        Ok(InsertOutcome::Inserted)
    }

    async fn get_booking(
        &self,
        id: Uuid,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .bookings
            .lock()
            .expect("booking lock poisoned")
            .get(&id)
            .cloned())
    }

    async fn list_for_party(
        &self,
        agency_id: Uuid,
        role: PartyRole,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Booking>, i64), Box<dyn std::error::Error + Send + Sync>> {
        let bookings = self.bookings.lock().expect("booking lock poisoned");
        let mut matching: Vec<Booking> = bookings
            .values()
            .filter(|b| match role {
                PartyRole::Seller => b.seller_agency_id == agency_id,
                PartyRole::Buyer => b.buyer_agency_id == agency_id,
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn transition_status(
        &self,
        id: Uuid,
        expected: &[BookingStatus],
        to: BookingStatus,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let mut bookings = self.bookings.lock().expect("booking lock poisoned");
        let Some(booking) = bookings.get_mut(&id) else {
            return Ok(false);
        };
        if !expected.contains(&booking.status) {
            return Ok(false);
        }
        booking.status = to;
        booking.updated_at = Utc::now();
        Ok(true)
    }

    async fn reject_restocking(
        &self,
        id: Uuid,
        expected: &[BookingStatus],
    ) -> Result<RejectOutcome, Box<dyn std::error::Error + Send + Sync>> {
        // Status flip first, then restore; the flip is the idempotency guard
        // that makes a second reject a no-op at the ledger.
        let (offer_id, quantity) = {
            let mut bookings = self.bookings.lock().expect("booking lock poisoned");
            let Some(booking) = bookings.get_mut(&id) else {
                return Ok(RejectOutcome::StaleStatus);
            };
            if !expected.contains(&booking.status) {
                return Ok(RejectOutcome::StaleStatus);
            }
            booking.status = BookingStatus::Rejected;
            booking.updated_at = Utc::now();
            (booking.offer_id, booking.quantity)
        };

        let restored_available = self.offers.restore(offer_id, quantity).await?;
        Ok(RejectOutcome::Rejected { restored_available })
    }

    async fn mark_read(
        &self,
        agency_id: Uuid,
        role: PartyRole,
    ) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        let mut bookings = self.bookings.lock().expect("booking lock poisoned");
        let mut flipped = 0;
        for booking in bookings.values_mut() {
            match role {
                PartyRole::Seller if booking.seller_agency_id == agency_id => {
                    if !booking.is_read_by_seller {
                        booking.is_read_by_seller = true;
                        flipped += 1;
                    }
                }
                PartyRole::Buyer if booking.buyer_agency_id == agency_id => {
                    if !booking.is_read_by_buyer {
                        booking.is_read_by_buyer = true;
                        flipped += 1;
                    }
                }
                _ => {}
            }
        }
        Ok(flipped)
    }

    async fn unread_counts(
        &self,
        agency_id: Uuid,
    ) -> Result<UnreadCounts, Box<dyn std::error::Error + Send + Sync>> {
        let bookings = self.bookings.lock().expect("booking lock poisoned");
        let sales = bookings
            .values()
            .filter(|b| {
                b.seller_agency_id == agency_id
                    && !b.is_read_by_seller
                    && b.status == BookingStatus::Submitted
            })
            .count() as i64;
        let purchases = bookings
            .values()
            .filter(|b| b.buyer_agency_id == agency_id && !b.is_read_by_buyer)
            .count() as i64;
        Ok(UnreadCounts { sales, purchases })
    }
}
