use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A revocation record as stored by the service.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct RevokedToken {
    pub id: String,
    pub jwt_id: String,
    pub reason: String,
    pub expiry_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked_by_email: Option<String>,
}

/// Body of `POST /api/revocations/revoke`.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RevokeRequest {
    pub jwt_id: String,
    pub reason: String,
    pub expiry_date: DateTime<Utc>,
}

/// `{"data": [...]}` envelope of the list endpoint.
#[derive(Deserialize, Debug)]
pub(crate) struct ListResponse {
    pub data: Vec<RevokedToken>,
}

/// `{"token": {...}}` envelope of the revoke endpoint.
#[derive(Deserialize, Debug)]
pub(crate) struct RevokeResponse {
    pub token: RevokedToken,
}
