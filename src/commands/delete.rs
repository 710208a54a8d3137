use anyhow::{Context, Result};
use std::io::Write;

use crate::api::RevocationApi;

/// Remove the revocation for `jwt_id`.
#[tracing::instrument(skip(api, out))]
pub async fn delete<A: RevocationApi, W: Write>(
    api: &A,
    jwt_id: &str,
    out: &mut W,
) -> Result<()> {
    if jwt_id.trim().is_empty() {
        anyhow::bail!("JWT ID must not be empty");
    }

    api.delete_revoked_token(jwt_id)
        .await
        .with_context(|| format!("Failed to delete revocation for {}", jwt_id))?;

    writeln!(out, "Deleted revocation for {}", jwt_id)?;
    Ok(())
}
