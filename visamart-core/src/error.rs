use thiserror::Error;

/// Error taxonomy for the marketplace engine.
///
/// Every variant maps to a stable machine-readable kind so clients can
/// branch on kind rather than message text.
#[derive(Debug, Error)]
pub enum MarketError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("An agency may not book its own offer")]
    SelfBooking,

    #[error("Offer has expired")]
    OfferExpired,

    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i32, available: i32 },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Offer has bookings referencing it and cannot be deleted")]
    OfferInUse,

    #[error("Storage operation failed: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl MarketError {
    /// Stable discriminator exposed to clients alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            MarketError::Validation(_) => "VALIDATION_ERROR",
            MarketError::NotFound(_) => "NOT_FOUND",
            MarketError::Forbidden(_) => "FORBIDDEN",
            MarketError::SelfBooking => "SELF_BOOKING",
            MarketError::OfferExpired => "OFFER_EXPIRED",
            MarketError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            MarketError::InvalidTransition { .. } => "INVALID_TRANSITION",
            MarketError::OfferInUse => "OFFER_IN_USE",
            MarketError::Storage(_) => "PERSISTENCE_FAILURE",
        }
    }

    pub fn storage(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        MarketError::Storage(err)
    }
}
