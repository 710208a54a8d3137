//! Revocation service operations.

mod client;
mod types;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

pub use client::Client;
pub use types::{RevokeRequest, RevokedToken};

/// Operations offered by the revocation service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RevocationApi: Send + Sync {
    /// All revoked tokens, in the order the service returns them.
    async fn list_revoked_tokens(&self) -> Result<Vec<RevokedToken>>;

    /// Revokes `jwt_id` until `expiry_date` and returns the created record.
    async fn revoke_token(
        &self,
        jwt_id: &str,
        reason: &str,
        expiry_date: DateTime<Utc>,
    ) -> Result<RevokedToken>;

    /// Removes the revocation for `jwt_id`. Only `204 No Content` counts as success.
    async fn delete_revoked_token(&self, jwt_id: &str) -> Result<()>;
}
