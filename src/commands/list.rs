use anyhow::{Context, Result};
use chrono::SecondsFormat;
use log::debug;
use std::io::Write;

use crate::api::{RevocationApi, RevokedToken};

/// Print every revoked token, one per line.
#[tracing::instrument(skip(api, out))]
pub async fn list<A: RevocationApi, W: Write>(api: &A, out: &mut W) -> Result<()> {
    let tokens = api
        .list_revoked_tokens()
        .await
        .context("Failed to list revoked tokens")?;

    if tokens.is_empty() {
        writeln!(out, "No revoked tokens.")?;
        return Ok(());
    }

    debug!("Found {} revoked token(s)", tokens.len());

    for token in &tokens {
        writeln!(out, "{}", format_token(token))?;
    }

    Ok(())
}

fn format_token(token: &RevokedToken) -> String {
    let expiry = token.expiry_date.to_rfc3339_opts(SecondsFormat::Secs, true);
    match &token.revoked_by_email {
        Some(email) => format!(
            "{}  {}  {} (by {})",
            token.jwt_id, expiry, token.reason, email
        ),
        None => format!("{}  {}  {}", token.jwt_id, expiry, token.reason),
    }
}
