use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Offer status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferStatus {
    Active,
    Paused,
    SoldOut,
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OfferStatus::Active => "ACTIVE",
            OfferStatus::Paused => "PAUSED",
            OfferStatus::SoldOut => "SOLD_OUT",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for OfferStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(OfferStatus::Active),
            "PAUSED" => Ok(OfferStatus::Paused),
            "SOLD_OUT" => Ok(OfferStatus::SoldOut),
            other => Err(format!("unknown offer status: {}", other)),
        }
    }
}

/// Seller-editable terms of an inventory lot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferTerms {
    pub visa_type: String,
    pub destination_country: String,
    pub processing_days: i32,
    pub unit_price_cents: i64,
    pub currency: String,
    pub notes: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// A seller agency's lot of purchasable visa slots.
///
/// `available_quantity` is the authoritative stock count and is mutated only
/// through the ledger operations (`reserve`/`restore`); `total_quantity` is
/// fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisaOffer {
    pub id: Uuid,
    pub seller_agency_id: Uuid,
    pub visa_type: String,
    pub destination_country: String,
    pub processing_days: i32,
    pub unit_price_cents: i64,
    pub currency: String,
    pub total_quantity: i32,
    pub available_quantity: i32,
    pub status: OfferStatus,
    pub notes: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VisaOffer {
    /// Create a new lot with the full quantity available.
    pub fn new(seller_agency_id: Uuid, terms: OfferTerms, total_quantity: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            seller_agency_id,
            visa_type: terms.visa_type,
            destination_country: terms.destination_country,
            processing_days: terms.processing_days,
            unit_price_cents: terms.unit_price_cents,
            currency: terms.currency,
            total_quantity,
            available_quantity: total_quantity,
            status: OfferStatus::Active,
            notes: terms.notes,
            expires_at: terms.expires_at,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() > expires_at,
            None => false,
        }
    }

    /// Purchasable from the marketplace: active, unexpired, stock left.
    pub fn is_open(&self) -> bool {
        self.status == OfferStatus::Active && !self.is_expired() && self.available_quantity > 0
    }

    pub fn is_owned_by(&self, agency_id: Uuid) -> bool {
        self.seller_agency_id == agency_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

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

    #[test]
    fn new_offer_starts_with_full_stock() {
        let offer = VisaOffer::new(Uuid::new_v4(), terms(), 10);
        assert_eq!(offer.available_quantity, 10);
        assert_eq!(offer.total_quantity, 10);
        assert_eq!(offer.status, OfferStatus::Active);
        assert!(offer.is_open());
    }

    #[test]
    fn expired_offer_is_not_open() {
        let mut offer = VisaOffer::new(Uuid::new_v4(), terms(), 10);
        offer.expires_at = Some(Utc::now() - Duration::minutes(1));
        assert!(offer.is_expired());
        assert!(!offer.is_open());
    }

    #[test]
    fn paused_or_drained_offer_is_not_open() {
        let mut offer = VisaOffer::new(Uuid::new_v4(), terms(), 10);
        offer.status = OfferStatus::Paused;
        assert!(!offer.is_open());

        offer.status = OfferStatus::Active;
        offer.available_quantity = 0;
        assert!(!offer.is_open());
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [OfferStatus::Active, OfferStatus::Paused, OfferStatus::SoldOut] {
            assert_eq!(status.to_string().parse::<OfferStatus>(), Ok(status));
        }
        assert!("NOPE".parse::<OfferStatus>().is_err());
    }
}
