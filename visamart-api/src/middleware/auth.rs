use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use visamart_core::AgencyContext;

use crate::state::AppState;

/// Claims issued by the auth collaborator. The engine only reads the tenant
/// identity out of them; it never issues tokens itself.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AgencyClaims {
    pub sub: String,
    pub agency_id: Uuid,
    pub role: String,
    pub exp: usize,
}

pub async fn agency_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract token from Authorization header
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Decode and validate JWT
    let token_data = decode::<AgencyClaims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| StatusCode::UNAUTHORIZED)?;

    // 3. Inject the tenant identity into request extensions; handlers never
    //    see the raw token.
    let claims = token_data.claims;
    req.extensions_mut()
        .insert(AgencyContext::new(claims.agency_id, claims.role));

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    #[test]
    fn claims_round_trip_through_a_token() {
        let secret = b"test-secret";
        let claims = AgencyClaims {
            sub: "user-1".to_string(),
            agency_id: Uuid::new_v4(),
            role: "AGENCY_ADMIN".to_string(),
            exp: (chrono::Utc::now().timestamp() + 600) as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap();

        let decoded = decode::<AgencyClaims>(
            &token,
            &DecodingKey::from_secret(secret),
            &Validation::default(),
        )
        .unwrap();

        assert_eq!(decoded.claims.agency_id, claims.agency_id);
        assert_eq!(decoded.claims.sub, "user-1");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let claims = AgencyClaims {
            sub: "user-1".to_string(),
            agency_id: Uuid::new_v4(),
            role: "AGENCY_ADMIN".to_string(),
            exp: (chrono::Utc::now().timestamp() + 600) as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"right"),
        )
        .unwrap();

        assert!(decode::<AgencyClaims>(
            &token,
            &DecodingKey::from_secret(b"wrong"),
            &Validation::default(),
        )
        .is_err());
    }
}
