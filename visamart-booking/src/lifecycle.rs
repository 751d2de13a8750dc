use crate::models::{Booking, BookingStatus};
use crate::repository::{BookingRepository, RejectOutcome};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use visamart_core::{MarketError, MarketResult};

/// Source statuses from which a rejection is legal.
const REJECTABLE: [BookingStatus; 2] = [BookingStatus::Submitted, BookingStatus::Processing];

/// Governs booking status transitions. Only the seller advances a booking;
/// rejection additionally restores the drawn-down stock, atomically with the
/// status write.
pub struct BookingLifecycle {
    bookings: Arc<dyn BookingRepository>,
}

impl BookingLifecycle {
    pub fn new(bookings: Arc<dyn BookingRepository>) -> Self {
        Self { bookings }
    }

    /// Advance a booking to `target` on behalf of `actor_agency_id`.
    pub async fn transition(
        &self,
        actor_agency_id: Uuid,
        booking_id: Uuid,
        target: BookingStatus,
    ) -> MarketResult<Booking> {
        let booking = self
            .bookings
            .get_booking(booking_id)
            .await
            .map_err(MarketError::storage)?
            .ok_or_else(|| MarketError::NotFound("booking".to_string()))?;

        if booking.seller_agency_id != actor_agency_id {
            warn!(
                booking_id = %booking_id,
                actor = %actor_agency_id,
                "non-seller attempted a booking transition"
            );
            return Err(MarketError::Forbidden(
                "only the selling agency may advance a booking".to_string(),
            ));
        }

        if target == BookingStatus::Rejected {
            return self.reject(booking).await;
        }

        if !booking.status.can_transition_to(target) {
            return Err(MarketError::InvalidTransition {
                from: booking.status.to_string(),
                to: target.to_string(),
            });
        }

        // Guard on the status we just read; a concurrent seller session that
        // moved the booking first wins and this call reports stale state.
        let applied = self
            .bookings
            .transition_status(booking_id, &[booking.status], target)
            .await
            .map_err(MarketError::storage)?;

        if !applied {
            return Err(MarketError::InvalidTransition {
                from: booking.status.to_string(),
                to: target.to_string(),
            });
        }

        info!(booking_id = %booking_id, from = %booking.status, to = %target, "booking transitioned");
        self.reload(booking_id).await
    }

    async fn reject(&self, booking: Booking) -> MarketResult<Booking> {
        match self
            .bookings
            .reject_restocking(booking.id, &REJECTABLE)
            .await
            .map_err(MarketError::storage)?
        {
            RejectOutcome::Rejected { restored_available } => {
                info!(
                    booking_id = %booking.id,
                    offer_id = %booking.offer_id,
                    quantity = booking.quantity,
                    restored_available,
                    "booking rejected, stock restored"
                );
                self.reload(booking.id).await
            }
            RejectOutcome::StaleStatus => Err(MarketError::InvalidTransition {
                from: booking.status.to_string(),
                to: BookingStatus::Rejected.to_string(),
            }),
        }
    }

    async fn reload(&self, booking_id: Uuid) -> MarketResult<Booking> {
        self.bookings
            .get_booking(booking_id)
            .await
            .map_err(MarketError::storage)?
            .ok_or_else(|| MarketError::NotFound("booking".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::{BookingCoordinator, PlaceBookingRequest};
    use crate::memory::InMemoryBookingRepository;
    use visamart_offer::{InMemoryOfferRepository, OfferRepository, OfferTerms, VisaOffer};

    struct Fixture {
        offers: Arc<InMemoryOfferRepository>,
        lifecycle: BookingLifecycle,
        offer: VisaOffer,
        booking_id: Uuid,
        buyer: Uuid,
    }

    async fn place(total: i32, quantity: i32) -> Fixture {
        let offers = Arc::new(InMemoryOfferRepository::new());
        let bookings = Arc::new(InMemoryBookingRepository::new(offers.clone()));
        let offer = VisaOffer::new(
            Uuid::new_v4(),
            OfferTerms {
                visa_type: "WORK".to_string(),
                destination_country: "QA".to_string(),
                processing_days: 10,
                unit_price_cents: 40_000,
                currency: "USD".to_string(),
                notes: None,
                expires_at: None,
            },
            total,
        );
        offers.create_offer(&offer).await.unwrap();

        let coordinator = BookingCoordinator::new(offers.clone(), bookings.clone(), "VMB");
        let buyer = Uuid::new_v4();
        let receipt = coordinator
            .place_booking(
                buyer,
                PlaceBookingRequest {
                    offer_id: offer.id,
                    quantity,
                    applicants: vec![],
                    total_amount_cents: 40_000 * quantity as i64,
                    discount_cents: 0,
                    final_amount_cents: 40_000 * quantity as i64,
                    payment_method: "WALLET".to_string(),
                    receipt_url: None,
                },
            )
            .await
            .unwrap();

        Fixture {
            offers,
            lifecycle: BookingLifecycle::new(bookings),
            offer,
            booking_id: receipt.booking_id,
            buyer,
        }
    }

    #[tokio::test]
    async fn buyer_may_not_advance_a_booking() {
        let fx = place(10, 2).await;
        let err = fx
            .lifecycle
            .transition(fx.buyer, fx.booking_id, BookingStatus::Approved)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "FORBIDDEN");
    }

    #[tokio::test]
    async fn reject_restores_exactly_once() {
        let fx = place(10, 4).await;
        let seller = fx.offer.seller_agency_id;

        let rejected = fx
            .lifecycle
            .transition(seller, fx.booking_id, BookingStatus::Rejected)
            .await
            .unwrap();
        assert_eq!(rejected.status, BookingStatus::Rejected);

        let stored = fx.offers.get_offer(fx.offer.id).await.unwrap().unwrap();
        assert_eq!(stored.available_quantity, 10);

        // Second reject is an error and does not double-restore.
        let err = fx
            .lifecycle
            .transition(seller, fx.booking_id, BookingStatus::Rejected)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "INVALID_TRANSITION");

        let stored = fx.offers.get_offer(fx.offer.id).await.unwrap().unwrap();
        assert_eq!(stored.available_quantity, 10);
    }

    #[tokio::test]
    async fn approve_then_deliver_has_no_ledger_effect() {
        let fx = place(10, 3).await;
        let seller = fx.offer.seller_agency_id;

        let approved = fx
            .lifecycle
            .transition(seller, fx.booking_id, BookingStatus::Approved)
            .await
            .unwrap();
        assert_eq!(approved.status, BookingStatus::Approved);

        let delivered = fx
            .lifecycle
            .transition(seller, fx.booking_id, BookingStatus::Delivered)
            .await
            .unwrap();
        assert_eq!(delivered.status, BookingStatus::Delivered);

        let stored = fx.offers.get_offer(fx.offer.id).await.unwrap().unwrap();
        assert_eq!(stored.available_quantity, 7);
    }

    #[tokio::test]
    async fn reject_after_approve_is_invalid() {
        let fx = place(10, 3).await;
        let seller = fx.offer.seller_agency_id;

        fx.lifecycle
            .transition(seller, fx.booking_id, BookingStatus::Approved)
            .await
            .unwrap();

        let err = fx
            .lifecycle
            .transition(seller, fx.booking_id, BookingStatus::Rejected)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "INVALID_TRANSITION");

        let stored = fx.offers.get_offer(fx.offer.id).await.unwrap().unwrap();
        assert_eq!(stored.available_quantity, 7);
    }

    #[tokio::test]
    async fn processing_is_a_legal_detour() {
        let fx = place(10, 2).await;
        let seller = fx.offer.seller_agency_id;

        let processing = fx
            .lifecycle
            .transition(seller, fx.booking_id, BookingStatus::Processing)
            .await
            .unwrap();
        assert_eq!(processing.status, BookingStatus::Processing);

        let rejected = fx
            .lifecycle
            .transition(seller, fx.booking_id, BookingStatus::Rejected)
            .await
            .unwrap();
        assert_eq!(rejected.status, BookingStatus::Rejected);

        let stored = fx.offers.get_offer(fx.offer.id).await.unwrap().unwrap();
        assert_eq!(stored.available_quantity, 10);
    }
}
