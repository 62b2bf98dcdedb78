use serde::{Deserialize, Serialize};

use crate::domain::Email;

/// One activity record as returned by `GET /activities`. The listing maps
/// activity name to this shape; participant order is server-defined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityDetail {
    pub description: String,
    pub schedule: String,
    pub max_participants: u32,
    pub participants: Vec<Email>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participants: Option<Vec<Email>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnregisterResponse {
    pub participants: Vec<Email>,
    pub max_participants: u32,
}
