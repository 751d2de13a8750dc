use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Booking status in the lifecycle.
///
/// `Submitted → {Processing, Approved, Rejected}`,
/// `Processing → {Approved, Rejected}`, `Approved → Delivered`.
/// `Rejected` and `Delivered` are terminal. `PendingDocuments` is a recorded
/// state value for bookings whose applicant files are incomplete; the
/// coordinator itself always creates bookings as `Submitted`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    PendingDocuments,
    Submitted,
    Processing,
    Approved,
    Rejected,
    Delivered,
}

impl BookingStatus {
    pub fn can_transition_to(self, to: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, to),
            (PendingDocuments, Submitted)
                | (Submitted, Processing)
                | (Submitted, Approved)
                | (Submitted, Rejected)
                | (Processing, Approved)
                | (Processing, Rejected)
                | (Approved, Delivered)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Rejected | BookingStatus::Delivered)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BookingStatus::PendingDocuments => "PENDING_DOCUMENTS",
            BookingStatus::Submitted => "SUBMITTED",
            BookingStatus::Processing => "PROCESSING",
            BookingStatus::Approved => "APPROVED",
            BookingStatus::Rejected => "REJECTED",
            BookingStatus::Delivered => "DELIVERED",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING_DOCUMENTS" => Ok(BookingStatus::PendingDocuments),
            "SUBMITTED" => Ok(BookingStatus::Submitted),
            "PROCESSING" => Ok(BookingStatus::Processing),
            "APPROVED" => Ok(BookingStatus::Approved),
            "REJECTED" => Ok(BookingStatus::Rejected),
            "DELIVERED" => Ok(BookingStatus::Delivered),
            other => Err(format!("unknown booking status: {}", other)),
        }
    }
}

/// One traveler on a booking. Documents may be completed after submission,
/// so the applicant list can be shorter than the booked quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Applicant {
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub passport_number: String,
    pub nationality: String,
    #[serde(default)]
    pub document_refs: Vec<String>,
}

/// One purchase transaction against a visa offer.
///
/// Quantity, offer linkage and the two party ids are immutable after
/// creation; only the seller advances `status`. The record is never
/// hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub reference: String,
    pub offer_id: Uuid,
    pub buyer_agency_id: Uuid,
    pub seller_agency_id: Uuid,
    pub quantity: i32,
    pub applicants: Vec<Applicant>,
    pub total_amount_cents: i64,
    pub discount_cents: i64,
    pub final_amount_cents: i64,
    pub currency: String,
    pub payment_method: String,
    pub receipt_url: Option<String>,
    pub status: BookingStatus,
    pub is_read_by_buyer: bool,
    pub is_read_by_seller: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_party(&self, agency_id: Uuid) -> bool {
        self.buyer_agency_id == agency_id || self.seller_agency_id == agency_id
    }
}
