use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;
use visamart_core::AgencyContext;
use visamart_offer::{OfferStatus, OfferTerms, VisaOffer};

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateOfferRequest {
    pub visa_type: String,
    pub destination_country: String,
    pub processing_days: i32,
    pub unit_price_cents: i64,
    pub currency: String,
    pub notes: Option<String>,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
    pub total_quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOfferRequest {
    pub visa_type: String,
    pub destination_country: String,
    pub processing_days: i32,
    pub unit_price_cents: i64,
    pub currency: String,
    pub notes: Option<String>,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct SetOfferStatusRequest {
    pub status: OfferStatus,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/marketplace/offers
/// Open offers from other agencies.
pub async fn list_market(
    State(state): State<AppState>,
    Extension(ctx): Extension<AgencyContext>,
) -> Result<Json<Vec<VisaOffer>>, AppError> {
    let offers = state.offer_manager.discover(ctx.agency_id).await?;
    Ok(Json(offers))
}

/// GET /v1/marketplace/offers/mine
/// The calling agency's own inventory lots.
pub async fn list_mine(
    State(state): State<AppState>,
    Extension(ctx): Extension<AgencyContext>,
) -> Result<Json<Vec<VisaOffer>>, AppError> {
    let offers = state.offer_manager.my_offers(ctx.agency_id).await?;
    Ok(Json(offers))
}

/// POST /v1/marketplace/offers
pub async fn create_offer(
    State(state): State<AppState>,
    Extension(ctx): Extension<AgencyContext>,
    Json(req): Json<CreateOfferRequest>,
) -> Result<(StatusCode, Json<VisaOffer>), AppError> {
    let terms = OfferTerms {
        visa_type: req.visa_type,
        destination_country: req.destination_country,
        processing_days: req.processing_days,
        unit_price_cents: req.unit_price_cents,
        currency: req.currency,
        notes: req.notes,
        expires_at: req.expires_at,
    };

    let offer = state
        .offer_manager
        .create_offer(ctx.agency_id, terms, req.total_quantity)
        .await?;

    Ok((StatusCode::CREATED, Json(offer)))
}

/// GET /v1/marketplace/offers/{id}
pub async fn get_offer(
    State(state): State<AppState>,
    Path(offer_id): Path<Uuid>,
) -> Result<Json<VisaOffer>, AppError> {
    let offer = state.offer_manager.get_offer(offer_id).await?;
    Ok(Json(offer))
}

/// PUT /v1/marketplace/offers/{id}
pub async fn update_offer(
    State(state): State<AppState>,
    Extension(ctx): Extension<AgencyContext>,
    Path(offer_id): Path<Uuid>,
    Json(req): Json<UpdateOfferRequest>,
) -> Result<Json<VisaOffer>, AppError> {
    let terms = OfferTerms {
        visa_type: req.visa_type,
        destination_country: req.destination_country,
        processing_days: req.processing_days,
        unit_price_cents: req.unit_price_cents,
        currency: req.currency,
        notes: req.notes,
        expires_at: req.expires_at,
    };

    let offer = state
        .offer_manager
        .update_terms(ctx.agency_id, offer_id, terms)
        .await?;

    Ok(Json(offer))
}

/// DELETE /v1/marketplace/offers/{id}
pub async fn delete_offer(
    State(state): State<AppState>,
    Extension(ctx): Extension<AgencyContext>,
    Path(offer_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .offer_manager
        .delete_offer(ctx.agency_id, offer_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/marketplace/offers/{id}/status
pub async fn set_offer_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<AgencyContext>,
    Path(offer_id): Path<Uuid>,
    Json(req): Json<SetOfferStatusRequest>,
) -> Result<Json<VisaOffer>, AppError> {
    let offer = state
        .offer_manager
        .set_status(ctx.agency_id, offer_id, req.status)
        .await?;
    Ok(Json(offer))
}
