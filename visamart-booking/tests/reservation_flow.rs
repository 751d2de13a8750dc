use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;
use visamart_booking::{
    Booking, BookingCoordinator, BookingRepository, BookingStatus, InMemoryBookingRepository,
    InsertOutcome, PlaceBookingRequest, ReadTracker, RejectOutcome, UnreadCounts,
};
use visamart_core::PartyRole;
use visamart_offer::{InMemoryOfferRepository, OfferRepository, OfferTerms, VisaOffer};

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

async fn seed_offer(
    offers: &Arc<InMemoryOfferRepository>,
    total: i32,
) -> VisaOffer {
    let offer = VisaOffer::new(Uuid::new_v4(), terms(), total);
    offers.create_offer(&offer).await.unwrap();
    offer
}

#[tokio::test]
async fn two_concurrent_sevens_against_ten_admit_exactly_one() {
    let offers = Arc::new(InMemoryOfferRepository::new());
    let bookings = Arc::new(InMemoryBookingRepository::new(offers.clone()));
    let offer = seed_offer(&offers, 10).await;
    let coordinator = Arc::new(BookingCoordinator::new(offers.clone(), bookings, "VMB"));

    let a = {
        let coordinator = coordinator.clone();
        let offer_id = offer.id;
        tokio::spawn(async move {
            coordinator
                .place_booking(Uuid::new_v4(), request(offer_id, 7))
                .await
        })
    };
    let b = {
        let coordinator = coordinator.clone();
        let offer_id = offer.id;
        tokio::spawn(async move {
            coordinator
                .place_booking(Uuid::new_v4(), request(offer_id, 7))
                .await
        })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);

    let failure = results.iter().find(|r| r.is_err()).unwrap();
    assert_eq!(failure.as_ref().unwrap_err().kind(), "INSUFFICIENT_STOCK");

    let stored = offers.get_offer(offer.id).await.unwrap().unwrap();
    assert_eq!(stored.available_quantity, 3);
}

#[tokio::test]
async fn concurrent_placements_never_oversell() {
    let offers = Arc::new(InMemoryOfferRepository::new());
    let bookings = Arc::new(InMemoryBookingRepository::new(offers.clone()));
    let offer = seed_offer(&offers, 10).await;
    let coordinator = Arc::new(BookingCoordinator::new(offers.clone(), bookings, "VMB"));

    let mut handles = Vec::new();
    for i in 0..20 {
        let coordinator = coordinator.clone();
        let offer_id = offer.id;
        let quantity = (i % 3) + 1;
        handles.push(tokio::spawn(async move {
            coordinator
                .place_booking(Uuid::new_v4(), request(offer_id, quantity))
                .await
                .map(|_| quantity)
        }));
    }

    let mut sold = 0;
    for handle in handles {
        if let Ok(quantity) = handle.await.unwrap() {
            sold += quantity;
        }
    }

    assert!(sold <= 10, "oversold: {} slots against a pool of 10", sold);
    let stored = offers.get_offer(offer.id).await.unwrap().unwrap();
    assert_eq!(stored.available_quantity, 10 - sold);
    assert!(stored.available_quantity >= 0);
}

/// Booking repository that accepts reads but fails every insert, simulating
/// a storage fault between the ledger decrement and the booking write.
struct FailingInserts {
    inner: Arc<InMemoryBookingRepository>,
}

#[async_trait]
impl BookingRepository for FailingInserts {
    async fn create_booking(
        &self,
        _booking: &Booking,
    ) -> Result<InsertOutcome, Box<dyn std::error::Error + Send + Sync>> {
        Err("injected insert failure".into())
    }

    async fn get_booking(
        &self,
        id: Uuid,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        self.inner.get_booking(id).await
    }

    async fn list_for_party(
        &self,
        agency_id: Uuid,
        role: PartyRole,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Booking>, i64), Box<dyn std::error::Error + Send + Sync>> {
        self.inner.list_for_party(agency_id, role, offset, limit).await
    }

    async fn transition_status(
        &self,
        id: Uuid,
        expected: &[BookingStatus],
        to: BookingStatus,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        self.inner.transition_status(id, expected, to).await
    }

    async fn reject_restocking(
        &self,
        id: Uuid,
        expected: &[BookingStatus],
    ) -> Result<RejectOutcome, Box<dyn std::error::Error + Send + Sync>> {
        self.inner.reject_restocking(id, expected).await
    }

    async fn mark_read(
        &self,
        agency_id: Uuid,
        role: PartyRole,
    ) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        self.inner.mark_read(agency_id, role).await
    }

    async fn unread_counts(
        &self,
        agency_id: Uuid,
    ) -> Result<UnreadCounts, Box<dyn std::error::Error + Send + Sync>> {
        self.inner.unread_counts(agency_id).await
    }
}

#[tokio::test]
async fn failed_insert_is_fully_compensated() {
    let offers = Arc::new(InMemoryOfferRepository::new());
    let inner = Arc::new(InMemoryBookingRepository::new(offers.clone()));
    let bookings = Arc::new(FailingInserts { inner: inner.clone() });
    let offer = seed_offer(&offers, 10).await;
    let coordinator = BookingCoordinator::new(offers.clone(), bookings, "VMB");

    let buyer = Uuid::new_v4();
    let err = coordinator
        .place_booking(buyer, request(offer.id, 4))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "PERSISTENCE_FAILURE");

    // Ledger back at its pre-call level, no booking row visible.
    let stored = offers.get_offer(offer.id).await.unwrap().unwrap();
    assert_eq!(stored.available_quantity, 10);

    let (purchases, total) = inner
        .list_for_party(buyer, PartyRole::Buyer, 0, 10)
        .await
        .unwrap();
    assert!(purchases.is_empty());
    assert_eq!(total, 0);
}

#[tokio::test]
async fn unread_counts_follow_the_scenario() {
    let offers = Arc::new(InMemoryOfferRepository::new());
    let bookings = Arc::new(InMemoryBookingRepository::new(offers.clone()));
    let coordinator = BookingCoordinator::new(offers.clone(), bookings.clone(), "VMB");
    let tracker = ReadTracker::new(bookings.clone());

    let agency = Uuid::new_v4();
    let other = Uuid::new_v4();

    // Three incoming submitted bookings against the agency's offer.
    let incoming = VisaOffer::new(agency, terms(), 50);
    offers.create_offer(&incoming).await.unwrap();
    for _ in 0..3 {
        coordinator
            .place_booking(other, request(incoming.id, 1))
            .await
            .unwrap();
    }

    // One outgoing booking the agency placed elsewhere.
    let outgoing = seed_offer(&offers, 50).await;
    coordinator
        .place_booking(agency, request(outgoing.id, 1))
        .await
        .unwrap();

    let counts = tracker.unread_counts(agency).await.unwrap();
    assert_eq!(counts, UnreadCounts { sales: 3, purchases: 1 });

    let flipped = tracker.mark_read(agency, PartyRole::Seller).await.unwrap();
    assert_eq!(flipped, 3);

    let counts = tracker.unread_counts(agency).await.unwrap();
    assert_eq!(counts, UnreadCounts { sales: 0, purchases: 1 });

    // Idempotent.
    let flipped = tracker.mark_read(agency, PartyRole::Seller).await.unwrap();
    assert_eq!(flipped, 0);
}

#[tokio::test]
async fn listings_are_scoped_and_paged() {
    let offers = Arc::new(InMemoryOfferRepository::new());
    let bookings = Arc::new(InMemoryBookingRepository::new(offers.clone()));
    let coordinator = BookingCoordinator::new(offers.clone(), bookings.clone(), "VMB");

    let offer = seed_offer(&offers, 50).await;
    let buyer = Uuid::new_v4();
    for _ in 0..5 {
        coordinator
            .place_booking(buyer, request(offer.id, 1))
            .await
            .unwrap();
    }

    let (first, total) = bookings
        .list_for_party(buyer, PartyRole::Buyer, 0, 2)
        .await
        .unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(total, 5);

    let (last, _) = bookings
        .list_for_party(buyer, PartyRole::Buyer, 4, 2)
        .await
        .unwrap();
    assert_eq!(last.len(), 1);

    // The seller side of the same records.
    let (sales, sales_total) = bookings
        .list_for_party(offer.seller_agency_id, PartyRole::Seller, 0, 10)
        .await
        .unwrap();
    assert_eq!(sales.len(), 5);
    assert_eq!(sales_total, 5);

    // An unrelated agency sees nothing.
    let (none, none_total) = bookings
        .list_for_party(Uuid::new_v4(), PartyRole::Buyer, 0, 10)
        .await
        .unwrap();
    assert!(none.is_empty());
    assert_eq!(none_total, 0);
}
