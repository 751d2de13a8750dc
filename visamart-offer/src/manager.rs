use crate::models::{OfferStatus, OfferTerms, VisaOffer};
use crate::repository::{DeleteOutcome, OfferRepository};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use visamart_core::{MarketError, MarketResult};

/// Seller-facing offer operations: creation, term edits, status changes and
/// deletion, all subject to ownership and expiry rules. Stock mutation is
/// not exposed here; only the booking coordinator drives the ledger.
pub struct OfferManager {
    offers: Arc<dyn OfferRepository>,
}

impl OfferManager {
    pub fn new(offers: Arc<dyn OfferRepository>) -> Self {
        Self { offers }
    }

    pub async fn create_offer(
        &self,
        seller_agency_id: Uuid,
        terms: OfferTerms,
        total_quantity: i32,
    ) -> MarketResult<VisaOffer> {
        validate_terms(&terms)?;
        if total_quantity <= 0 {
            return Err(MarketError::Validation(
                "total_quantity must be greater than zero".to_string(),
            ));
        }

        let offer = VisaOffer::new(seller_agency_id, terms, total_quantity);
        self.offers
            .create_offer(&offer)
            .await
            .map_err(MarketError::storage)?;

        info!(offer_id = %offer.id, seller = %seller_agency_id, total = total_quantity, "offer created");
        Ok(offer)
    }

    pub async fn update_terms(
        &self,
        actor_agency_id: Uuid,
        offer_id: Uuid,
        terms: OfferTerms,
    ) -> MarketResult<VisaOffer> {
        validate_terms(&terms)?;
        let offer = self.owned_offer(actor_agency_id, offer_id).await?;
        if offer.is_expired() {
            return Err(MarketError::OfferExpired);
        }

        self.offers
            .update_terms(offer_id, &terms)
            .await
            .map_err(MarketError::storage)?;

        self.offers
            .get_offer(offer_id)
            .await
            .map_err(MarketError::storage)?
            .ok_or_else(|| MarketError::NotFound("offer".to_string()))
    }

    pub async fn set_status(
        &self,
        actor_agency_id: Uuid,
        offer_id: Uuid,
        status: OfferStatus,
    ) -> MarketResult<VisaOffer> {
        let offer = self.owned_offer(actor_agency_id, offer_id).await?;
        if offer.is_expired() {
            return Err(MarketError::OfferExpired);
        }

        // The repository re-checks the stock guard at write time; a stale
        // read here must not let a drained offer go back to ACTIVE.
        let applied = self
            .offers
            .set_status(offer_id, status)
            .await
            .map_err(MarketError::storage)?;

        if !applied {
            return Err(MarketError::InvalidTransition {
                from: offer.status.to_string(),
                to: status.to_string(),
            });
        }

        self.offers
            .get_offer(offer_id)
            .await
            .map_err(MarketError::storage)?
            .ok_or_else(|| MarketError::NotFound("offer".to_string()))
    }

    pub async fn delete_offer(
        &self,
        actor_agency_id: Uuid,
        offer_id: Uuid,
    ) -> MarketResult<()> {
        self.owned_offer(actor_agency_id, offer_id).await?;

        match self
            .offers
            .delete_offer(offer_id)
            .await
            .map_err(MarketError::storage)?
        {
            DeleteOutcome::Deleted => {
                info!(offer_id = %offer_id, "offer deleted");
                Ok(())
            }
            DeleteOutcome::InUse => Err(MarketError::OfferInUse),
        }
    }

    pub async fn get_offer(&self, offer_id: Uuid) -> MarketResult<VisaOffer> {
        self.offers
            .get_offer(offer_id)
            .await
            .map_err(MarketError::storage)?
            .ok_or_else(|| MarketError::NotFound("offer".to_string()))
    }

    /// Offers the calling agency can buy: open, unexpired, not its own.
    pub async fn discover(&self, agency_id: Uuid) -> MarketResult<Vec<VisaOffer>> {
        self.offers
            .list_open_offers(agency_id)
            .await
            .map_err(MarketError::storage)
    }

    pub async fn my_offers(&self, seller_agency_id: Uuid) -> MarketResult<Vec<VisaOffer>> {
        self.offers
            .list_seller_offers(seller_agency_id)
            .await
            .map_err(MarketError::storage)
    }

    async fn owned_offer(&self, actor: Uuid, offer_id: Uuid) -> MarketResult<VisaOffer> {
        let offer = self
            .offers
            .get_offer(offer_id)
            .await
            .map_err(MarketError::storage)?
            .ok_or_else(|| MarketError::NotFound("offer".to_string()))?;

        if !offer.is_owned_by(actor) {
            return Err(MarketError::Forbidden(
                "offer belongs to another agency".to_string(),
            ));
        }
        Ok(offer)
    }
}

fn validate_terms(terms: &OfferTerms) -> MarketResult<()> {
    if terms.visa_type.trim().is_empty() {
        return Err(MarketError::Validation("visa_type is required".to_string()));
    }
    if terms.destination_country.trim().is_empty() {
        return Err(MarketError::Validation(
            "destination_country is required".to_string(),
        ));
    }
    if terms.processing_days < 0 {
        return Err(MarketError::Validation(
            "processing_days may not be negative".to_string(),
        ));
    }
    if terms.unit_price_cents < 0 {
        return Err(MarketError::Validation(
            "unit_price_cents may not be negative".to_string(),
        ));
    }
    if terms.currency.trim().is_empty() {
        return Err(MarketError::Validation("currency is required".to_string()));
    }
    if let Some(expires_at) = terms.expires_at {
        if expires_at <= Utc::now() {
            return Err(MarketError::Validation(
                "expires_at must be in the future".to_string(),
            ));
        }
    }
    Ok(())
}
