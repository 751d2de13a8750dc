use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated tenant identity attached to every operation.
///
/// Issued by the auth collaborator; the engine never derives it itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgencyContext {
    pub agency_id: Uuid,
    pub user_role: String,
}

impl AgencyContext {
    pub fn new(agency_id: Uuid, user_role: impl Into<String>) -> Self {
        Self {
            agency_id,
            user_role: user_role.into(),
        }
    }
}

/// Which side of a booking an agency is acting as.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PartyRole {
    Buyer,
    Seller,
}
