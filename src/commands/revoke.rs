use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use std::io::Write;

use crate::api::RevocationApi;

/// Revoke `jwt_id` until `expiry_date`.
#[tracing::instrument(skip(api, out))]
pub async fn revoke<A: RevocationApi, W: Write>(
    api: &A,
    jwt_id: &str,
    reason: &str,
    expiry_date: DateTime<Utc>,
    out: &mut W,
) -> Result<()> {
    if jwt_id.trim().is_empty() {
        anyhow::bail!("JWT ID must not be empty");
    }

    let token = api
        .revoke_token(jwt_id, reason, expiry_date)
        .await
        .with_context(|| format!("Failed to revoke {}", jwt_id))?;

    info!("Revocation record {} created for {}", token.id, token.jwt_id);
    writeln!(out, "Revoked {} (id {})", token.jwt_id, token.id)?;

    Ok(())
}
