use crate::models::{Applicant, Booking, BookingStatus};
use crate::reference;
use crate::repository::{BookingRepository, InsertOutcome};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;
use visamart_core::{MarketError, MarketResult};
use visamart_offer::{OfferRepository, ReserveOutcome, VisaOffer};

/// How many fresh references to try when an insert hits a duplicate.
const MAX_REFERENCE_RETRIES: u32 = 3;

/// A buyer's purchase intent against one offer.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceBookingRequest {
    pub offer_id: Uuid,
    pub quantity: i32,
    #[serde(default)]
    pub applicants: Vec<Applicant>,
    pub total_amount_cents: i64,
    #[serde(default)]
    pub discount_cents: i64,
    pub final_amount_cents: i64,
    pub payment_method: String,
    pub receipt_url: Option<String>,
}

/// What the buyer gets back on a successful placement.
#[derive(Debug, Clone, Serialize)]
pub struct BookingReceipt {
    pub booking_id: Uuid,
    pub reference: String,
    pub remaining_stock: i32,
}

/// Orchestrates the booking transaction: validate, atomically draw down the
/// ledger, persist the booking. The ledger decrement and the booking insert
/// are logically one transaction across two physical writes; a failed insert
/// is compensated with a restore before the error surfaces, so the caller
/// never observes a decrement without a booking row.
pub struct BookingCoordinator {
    offers: Arc<dyn OfferRepository>,
    bookings: Arc<dyn BookingRepository>,
    reference_prefix: String,
}

impl BookingCoordinator {
    pub fn new(
        offers: Arc<dyn OfferRepository>,
        bookings: Arc<dyn BookingRepository>,
        reference_prefix: impl Into<String>,
    ) -> Self {
        Self {
            offers,
            bookings,
            reference_prefix: reference_prefix.into(),
        }
    }

    pub async fn place_booking(
        &self,
        buyer_agency_id: Uuid,
        request: PlaceBookingRequest,
    ) -> MarketResult<BookingReceipt> {
        // Fail-fast validation; nothing below runs with bad input.
        validate_request(&request)?;

        let offer = self
            .offers
            .get_offer(request.offer_id)
            .await
            .map_err(MarketError::storage)?
            .ok_or_else(|| MarketError::NotFound("offer".to_string()))?;

        if offer.seller_agency_id == buyer_agency_id {
            return Err(MarketError::SelfBooking);
        }
        if offer.is_expired() {
            return Err(MarketError::OfferExpired);
        }
        if offer.status == visamart_offer::OfferStatus::Paused {
            return Err(MarketError::Validation(
                "offer is paused by the seller".to_string(),
            ));
        }
        if offer.available_quantity < request.quantity {
            return Err(MarketError::InsufficientStock {
                requested: request.quantity,
                available: offer.available_quantity,
            });
        }

        // The pre-check above closes nothing on its own; the conditional
        // write is what serializes concurrent buyers.
        let remaining = match self
            .offers
            .reserve(request.offer_id, request.quantity)
            .await
            .map_err(MarketError::storage)?
        {
            ReserveOutcome::Reserved { remaining, .. } => remaining,
            ReserveOutcome::Conflict => {
                return Err(MarketError::InsufficientStock {
                    requested: request.quantity,
                    available: offer.available_quantity,
                });
            }
        };

        match self.insert_with_fresh_reference(buyer_agency_id, &offer, &request).await {
            Ok(booking) => {
                info!(
                    booking_id = %booking.id,
                    reference = %booking.reference,
                    offer_id = %offer.id,
                    quantity = request.quantity,
                    remaining,
                    "booking placed"
                );
                Ok(BookingReceipt {
                    booking_id: booking.id,
                    reference: booking.reference,
                    remaining_stock: remaining,
                })
            }
            Err(err) => {
                // The reserve already committed; put the stock back before
                // surfacing the failure.
                self.compensate(request.offer_id, request.quantity).await;
                Err(err)
            }
        }
    }

    async fn insert_with_fresh_reference(
        &self,
        buyer_agency_id: Uuid,
        offer: &VisaOffer,
        request: &PlaceBookingRequest,
    ) -> MarketResult<Booking> {
        for attempt in 0..MAX_REFERENCE_RETRIES {
            let booking = build_booking(buyer_agency_id, offer, request, &self.reference_prefix);

            match self
                .bookings
                .create_booking(&booking)
                .await
                .map_err(MarketError::storage)?
            {
                InsertOutcome::Inserted => return Ok(booking),
                InsertOutcome::DuplicateReference => {
                    warn!(
                        reference = %booking.reference,
                        attempt,
                        "booking reference collision, regenerating"
                    );
                }
            }
        }

        Err(MarketError::Storage(
            "could not generate a unique booking reference".into(),
        ))
    }

    async fn compensate(&self, offer_id: Uuid, quantity: i32) {
        match self.offers.restore(offer_id, quantity).await {
            Ok(available) => {
                info!(offer_id = %offer_id, quantity, available, "reservation compensated");
            }
            Err(restore_err) => {
                // Residual saga failure: stock is decremented with no
                // booking row. Surface loudly for operator reconciliation.
                error!(
                    offer_id = %offer_id,
                    quantity,
                    error = %restore_err,
                    "compensating restore failed; manual stock reconciliation required"
                );
            }
        }
    }
}

fn validate_request(request: &PlaceBookingRequest) -> MarketResult<()> {
    if request.quantity <= 0 {
        return Err(MarketError::Validation(
            "quantity must be greater than zero".to_string(),
        ));
    }
    if request.total_amount_cents < 0 || request.discount_cents < 0 {
        return Err(MarketError::Validation(
            "amounts may not be negative".to_string(),
        ));
    }
    if request.final_amount_cents != request.total_amount_cents - request.discount_cents {
        return Err(MarketError::Validation(
            "final_amount must equal total_amount minus discount".to_string(),
        ));
    }
    if request.payment_method.trim().is_empty() {
        return Err(MarketError::Validation(
            "payment_method is required".to_string(),
        ));
    }
    Ok(())
}

fn build_booking(
    buyer_agency_id: Uuid,
    offer: &VisaOffer,
    request: &PlaceBookingRequest,
    reference_prefix: &str,
) -> Booking {
    let now = Utc::now();
    Booking {
        id: Uuid::new_v4(),
        reference: reference::generate(reference_prefix),
        offer_id: offer.id,
        buyer_agency_id,
        seller_agency_id: offer.seller_agency_id,
        quantity: request.quantity,
        applicants: request.applicants.clone(),
        total_amount_cents: request.total_amount_cents,
        discount_cents: request.discount_cents,
        final_amount_cents: request.final_amount_cents,
        currency: offer.currency.clone(),
        payment_method: request.payment_method.clone(),
        receipt_url: request.receipt_url.clone(),
        status: BookingStatus::Submitted,
        // The buyer has not seen the persisted record yet.
        is_read_by_buyer: false,
        is_read_by_seller: false,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBookingRepository;
    use visamart_offer::{InMemoryOfferRepository, OfferTerms};

    fn terms() -> OfferTerms {
        OfferTerms {
            visa_type: "TOURIST".to_string(),
            destination_country: "AE".to_string(),
            processing_days: 5,
            unit_price_cents: 25_000,
            currency: "USD".to_string(),
            notes: None,
            expires_at: None,
        }
    }

    fn request(offer_id: Uuid, quantity: i32) -> PlaceBookingRequest {
        PlaceBookingRequest {
            offer_id,
            quantity,
            applicants: vec![],
            total_amount_cents: 25_000 * quantity as i64,
            discount_cents: 0,
            final_amount_cents: 25_000 * quantity as i64,
            payment_method: "BANK_TRANSFER".to_string(),
            receipt_url: None,
        }
    }

    async fn setup(total: i32) -> (BookingCoordinator, Arc<InMemoryOfferRepository>, VisaOffer) {
        let offers = Arc::new(InMemoryOfferRepository::new());
        let bookings = Arc::new(InMemoryBookingRepository::new(offers.clone()));
        let offer = VisaOffer::new(Uuid::new_v4(), terms(), total);
        offers.create_offer(&offer).await.unwrap();
        (
            BookingCoordinator::new(offers.clone(), bookings, "VMB"),
            offers,
            offer,
        )
    }

    #[tokio::test]
    async fn rejects_non_positive_quantity() {
        let (coordinator, _, offer) = setup(10).await;
        let err = coordinator
            .place_booking(Uuid::new_v4(), request(offer.id, 0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn rejects_mismatched_pricing() {
        let (coordinator, _, offer) = setup(10).await;
        let mut req = request(offer.id, 2);
        req.discount_cents = 1_000;
        // final not adjusted
        let err = coordinator
            .place_booking(Uuid::new_v4(), req)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unknown_offer_is_not_found() {
        let (coordinator, _, _) = setup(10).await;
        let err = coordinator
            .place_booking(Uuid::new_v4(), request(Uuid::new_v4(), 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn self_booking_is_forbidden_regardless_of_stock() {
        let (coordinator, _, offer) = setup(10).await;
        let err = coordinator
            .place_booking(offer.seller_agency_id, request(offer.id, 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "SELF_BOOKING");
    }

    #[tokio::test]
    async fn overdraw_is_insufficient_stock() {
        let (coordinator, offers, offer) = setup(5).await;
        let err = coordinator
            .place_booking(Uuid::new_v4(), request(offer.id, 6))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "INSUFFICIENT_STOCK");

        // Nothing was drawn down.
        let stored = offers.get_offer(offer.id).await.unwrap().unwrap();
        assert_eq!(stored.available_quantity, 5);
    }

    #[tokio::test]
    async fn successful_placement_decrements_and_records() {
        let (coordinator, offers, offer) = setup(10).await;
        let buyer = Uuid::new_v4();

        let receipt = coordinator
            .place_booking(buyer, request(offer.id, 4))
            .await
            .unwrap();
        assert_eq!(receipt.remaining_stock, 6);
        assert!(receipt.reference.starts_with("VMB-"));

        let stored = offers.get_offer(offer.id).await.unwrap().unwrap();
        assert_eq!(stored.available_quantity, 6);
    }

    #[tokio::test]
    async fn draining_the_lot_marks_it_sold_out() {
        let (coordinator, offers, offer) = setup(3).await;

        coordinator
            .place_booking(Uuid::new_v4(), request(offer.id, 3))
            .await
            .unwrap();

        let stored = offers.get_offer(offer.id).await.unwrap().unwrap();
        assert_eq!(stored.available_quantity, 0);
        assert_eq!(stored.status, visamart_offer::OfferStatus::SoldOut);
    }
}
