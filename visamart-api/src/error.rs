use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use visamart_core::MarketError;

#[derive(Debug)]
pub enum AppError {
    Market(MarketError),
    Internal(anyhow::Error),
}

impl From<MarketError> for AppError {
    fn from(err: MarketError) -> Self {
        AppError::Market(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

fn market_status(err: &MarketError) -> StatusCode {
    match err {
        MarketError::Validation(_) => StatusCode::BAD_REQUEST,
        MarketError::NotFound(_) => StatusCode::NOT_FOUND,
        MarketError::Forbidden(_) | MarketError::SelfBooking => StatusCode::FORBIDDEN,
        MarketError::OfferExpired => StatusCode::GONE,
        MarketError::InsufficientStock { .. }
        | MarketError::InvalidTransition { .. }
        | MarketError::OfferInUse => StatusCode::CONFLICT,
        MarketError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            AppError::Market(err) => {
                let status = market_status(&err);
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    tracing::error!("Storage failure: {:?}", err);
                    (status, err.kind(), "Internal Server Error".to_string())
                } else {
                    (status, err.kind(), err.to_string())
                }
            }
            AppError::Internal(err) => {
                tracing::error!("Internal Server Error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "kind": kind,
        }));

        (status, body).into_response()
    }
}
