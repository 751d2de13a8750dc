use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use visamart_booking::{
    Booking, BookingReceipt, BookingStatus, PlaceBookingRequest, UnreadCounts,
};
use visamart_core::{AgencyContext, MarketError, Page, PageRequest, PartyRole};

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Which side of the ledger a listing or mark-read call addresses.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListRole {
    Sales,
    Purchases,
}

impl From<ListRole> for PartyRole {
    fn from(role: ListRole) -> Self {
        match role {
            ListRole::Sales => PartyRole::Seller,
            ListRole::Purchases => PartyRole::Buyer,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListBookingsQuery {
    pub role: ListRole,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    pub role: ListRole,
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub marked: u64,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/marketplace/bookings
/// Place a booking against another agency's offer.
pub async fn place_booking(
    State(state): State<AppState>,
    Extension(ctx): Extension<AgencyContext>,
    Json(req): Json<PlaceBookingRequest>,
) -> Result<(StatusCode, Json<BookingReceipt>), AppError> {
    let receipt = state.coordinator.place_booking(ctx.agency_id, req).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// GET /v1/marketplace/bookings?role=sales|purchases&page=&limit=
pub async fn list_bookings(
    State(state): State<AppState>,
    Extension(ctx): Extension<AgencyContext>,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<Page<Booking>>, AppError> {
    let paging = PageRequest {
        page: query.page,
        limit: query.limit,
    };
    let (page, limit) = paging.resolve(state.rules.default_page_size, state.rules.max_page_size);
    let offset = PageRequest::offset(page, limit);

    let (items, total) = state
        .bookings
        .list_for_party(ctx.agency_id, query.role.into(), offset, limit)
        .await
        .map_err(MarketError::storage)?;

    Ok(Json(Page::new(items, total, page, limit)))
}

/// GET /v1/marketplace/bookings/{id}
/// Visible only to the two parties on the record.
pub async fn get_booking(
    State(state): State<AppState>,
    Extension(ctx): Extension<AgencyContext>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .bookings
        .get_booking(booking_id)
        .await
        .map_err(MarketError::storage)?
        .filter(|b| b.is_party(ctx.agency_id))
        .ok_or_else(|| MarketError::NotFound("booking".to_string()))?;

    Ok(Json(booking))
}

/// POST /v1/marketplace/bookings/{id}/reject
/// Rejection restores the reserved stock to the offer.
pub async fn reject_booking(
    State(state): State<AppState>,
    Extension(ctx): Extension<AgencyContext>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    transition(&state, &ctx, booking_id, BookingStatus::Rejected).await
}

/// POST /v1/marketplace/bookings/{id}/approve
pub async fn approve_booking(
    State(state): State<AppState>,
    Extension(ctx): Extension<AgencyContext>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    transition(&state, &ctx, booking_id, BookingStatus::Approved).await
}

/// POST /v1/marketplace/bookings/{id}/process
pub async fn process_booking(
    State(state): State<AppState>,
    Extension(ctx): Extension<AgencyContext>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    transition(&state, &ctx, booking_id, BookingStatus::Processing).await
}

/// POST /v1/marketplace/bookings/{id}/deliver
pub async fn deliver_booking(
    State(state): State<AppState>,
    Extension(ctx): Extension<AgencyContext>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    transition(&state, &ctx, booking_id, BookingStatus::Delivered).await
}

async fn transition(
    state: &AppState,
    ctx: &AgencyContext,
    booking_id: Uuid,
    target: BookingStatus,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .lifecycle
        .transition(ctx.agency_id, booking_id, target)
        .await?;
    Ok(Json(booking))
}

/// POST /v1/marketplace/bookings/read
/// Bulk mark-as-read for one side of the ledger.
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(ctx): Extension<AgencyContext>,
    Json(req): Json<MarkReadRequest>,
) -> Result<Json<MarkReadResponse>, AppError> {
    let marked = state
        .reader
        .mark_read(ctx.agency_id, req.role.into())
        .await?;
    Ok(Json(MarkReadResponse { marked }))
}

/// GET /v1/marketplace/bookings/unread
pub async fn unread_counts(
    State(state): State<AppState>,
    Extension(ctx): Extension<AgencyContext>,
) -> Result<Json<UnreadCounts>, AppError> {
    let counts = state.reader.unread_counts(ctx.agency_id).await?;
    Ok(Json(counts))
}
