use crate::models::{OfferStatus, OfferTerms, VisaOffer};
use crate::repository::{DeleteOutcome, OfferRepository, ReserveOutcome};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use uuid::Uuid;

/// In-memory offer repository.
///
/// Substituted for the Postgres repository in tests; the conditional-write
/// semantics mirror the SQL guards so the coordinator exercises the same
/// contract either way. All mutations happen under one lock, which plays the
/// role the storage engine's atomic update plays in production.
#[derive(Default)]
pub struct InMemoryOfferRepository {
    offers: Mutex<HashMap<Uuid, VisaOffer>>,
    referenced: Mutex<HashSet<Uuid>>,
}

impl InMemoryOfferRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a booking references this offer (drives the delete guard).
    pub fn note_booking(&self, offer_id: Uuid) {
        self.referenced
            .lock()
            .expect("offer reference lock poisoned")
            .insert(offer_id);
    }
}

#[async_trait]
impl OfferRepository for InMemoryOfferRepository {
    async fn create_offer(
        &self,
        offer: &VisaOffer,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.offers
            .lock()
            .expect("offer lock poisoned")
            .insert(offer.id, offer.clone());
        Ok(())
    }

    async fn get_offer(
        &self,
        id: Uuid,
    ) -> Result<Option<VisaOffer>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .offers
            .lock()
            .expect("offer lock poisoned")
            .get(&id)
            .cloned())
    }

    async fn list_open_offers(
        &self,
        exclude_agency: Uuid,
    ) -> Result<Vec<VisaOffer>, Box<dyn std::error::Error + Send + Sync>> {
        let offers = self.offers.lock().expect("offer lock poisoned");
        let mut open: Vec<VisaOffer> = offers
            .values()
            .filter(|o| o.is_open() && o.seller_agency_id != exclude_agency)
            .cloned()
            .collect();
        open.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(open)
    }

    async fn list_seller_offers(
        &self,
        seller_agency_id: Uuid,
    ) -> Result<Vec<VisaOffer>, Box<dyn std::error::Error + Send + Sync>> {
        let offers = self.offers.lock().expect("offer lock poisoned");
        let mut mine: Vec<VisaOffer> = offers
            .values()
            .filter(|o| o.seller_agency_id == seller_agency_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(mine)
    }

    async fn update_terms(
        &self,
        id: Uuid,
        terms: &OfferTerms,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut offers = self.offers.lock().expect("offer lock poisoned");
        if let Some(offer) = offers.get_mut(&id) {
            offer.visa_type = terms.visa_type.clone();
            offer.destination_country = terms.destination_country.clone();
            offer.processing_days = terms.processing_days;
            offer.unit_price_cents = terms.unit_price_cents;
            offer.currency = terms.currency.clone();
            offer.notes = terms.notes.clone();
            offer.expires_at = terms.expires_at;
            offer.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: OfferStatus,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let mut offers = self.offers.lock().expect("offer lock poisoned");
        let Some(offer) = offers.get_mut(&id) else {
            return Ok(false);
        };
        if status == OfferStatus::Active && offer.available_quantity == 0 {
            return Ok(false);
        }
        offer.status = status;
        offer.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete_offer(
        &self,
        id: Uuid,
    ) -> Result<DeleteOutcome, Box<dyn std::error::Error + Send + Sync>> {
        if self
            .referenced
            .lock()
            .expect("offer reference lock poisoned")
            .contains(&id)
        {
            return Ok(DeleteOutcome::InUse);
        }
        self.offers.lock().expect("offer lock poisoned").remove(&id);
        Ok(DeleteOutcome::Deleted)
    }

    async fn reserve(
        &self,
        id: Uuid,
        quantity: i32,
    ) -> Result<ReserveOutcome, Box<dyn std::error::Error + Send + Sync>> {
        let mut offers = self.offers.lock().expect("offer lock poisoned");
        let Some(offer) = offers.get_mut(&id) else {
            return Ok(ReserveOutcome::Conflict);
        };
        if offer.available_quantity < quantity {
            return Ok(ReserveOutcome::Conflict);
        }
        offer.available_quantity -= quantity;
        if offer.available_quantity == 0 {
            offer.status = OfferStatus::SoldOut;
        }
        offer.updated_at = Utc::now();
        Ok(ReserveOutcome::Reserved {
            remaining: offer.available_quantity,
            status: offer.status,
        })
    }

    async fn restore(
        &self,
        id: Uuid,
        quantity: i32,
    ) -> Result<i32, Box<dyn std::error::Error + Send + Sync>> {
        let mut offers = self.offers.lock().expect("offer lock poisoned");
        let offer = offers
            .get_mut(&id)
            .ok_or_else(|| format!("offer {} not found", id))?;
        offer.available_quantity += quantity;
        offer.updated_at = Utc::now();
        Ok(offer.available_quantity)
    }
}
