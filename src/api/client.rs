use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use reqwest::{StatusCode, Url};

use super::RevocationApi;
use super::types::{ListResponse, RevokeRequest, RevokeResponse, RevokedToken};
use crate::cancel::CancelSignal;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::http::HttpClient;

/// Client for the token-revocation service.
///
/// Cloning is cheap and clones share the connection pool. Settings are fixed
/// at construction; build a new client to change them.
#[derive(Debug, Clone)]
pub struct Client {
    http_client: HttpClient,
    base_url: Url,
    cancel: CancelSignal,
}

impl Client {
    /// Creates a client with the default configuration for `api_key`.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::from_config(&ClientConfig::new(api_key)?)
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            http_client: HttpClient::new(config)?,
            base_url: config.base_url().clone(),
            cancel: CancelSignal::never(),
        })
    }

    /// A clone of this client whose calls stop with [`Error::Cancelled`] once
    /// `signal` fires.
    pub fn with_cancel(&self, signal: CancelSignal) -> Self {
        Self {
            cancel: signal,
            ..self.clone()
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/api/revocations/{segments...}`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                Error::InvalidConfig(format!("base URL {} cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(["api", "revocations"])
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl RevocationApi for Client {
    #[tracing::instrument(skip(self))]
    async fn list_revoked_tokens(&self) -> Result<Vec<RevokedToken>> {
        let url = self.endpoint(&["list"])?;
        let list: ListResponse = self.http_client.get_json(&url, &self.cancel).await?;
        debug!("Fetched {} revoked token(s)", list.data.len());
        Ok(list.data)
    }

    #[tracing::instrument(skip(self))]
    async fn revoke_token(
        &self,
        jwt_id: &str,
        reason: &str,
        expiry_date: DateTime<Utc>,
    ) -> Result<RevokedToken> {
        let url = self.endpoint(&["revoke"])?;
        let request = RevokeRequest {
            jwt_id: jwt_id.to_string(),
            reason: reason.to_string(),
            expiry_date,
        };
        let created: RevokeResponse = self
            .http_client
            .post_json(&url, &request, &self.cancel)
            .await?;
        debug!("Revoked {} as record {}", created.token.jwt_id, created.token.id);
        Ok(created.token)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_revoked_token(&self, jwt_id: &str) -> Result<()> {
        let url = self.endpoint(&[jwt_id])?;
        let response = self.http_client.delete(&url, &self.cancel).await?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(()),
            status => Err(Error::UnexpectedStatus { status }),
        }
    }
}
