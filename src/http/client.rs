//! HTTP client bound to one service configuration.

use log::debug;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::executor::Executor;
use crate::cancel::CancelSignal;
use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// Header carrying the API key on every request.
pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// reqwest client plus the retry executor, sharing one [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    executor: Executor,
}

impl HttpClient {
    /// Builds the underlying reqwest client: per-attempt timeout, user agent
    /// and the API key as a sensitive default header.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut api_key = HeaderValue::from_str(config.api_key()).map_err(|e| {
            Error::InvalidConfig(format!("API key is not a valid header value: {}", e))
        })?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, api_key);

        let client = Client::builder()
            .user_agent(config.user_agent())
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            executor: Executor::new(config),
        })
    }

    /// GET `url` and decode the JSON body.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        cancel: &CancelSignal,
    ) -> Result<T> {
        debug!("GET JSON from {}...", url);

        let response = self
            .executor
            .run("GET", cancel, || self.client.get(url.clone()))
            .await?;

        decode_json(response, cancel).await
    }

    /// POST `body` as JSON to `url` and decode the JSON reply.
    #[tracing::instrument(skip(self, body, cancel))]
    pub async fn post_json<B, T>(&self, url: &Url, body: &B, cancel: &CancelSignal) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("POST JSON to {}...", url);

        // Serialized once; every attempt sends the same bytes.
        let payload = serde_json::to_vec(body)?;

        let response = self
            .executor
            .run("POST", cancel, || {
                self.client
                    .post(url.clone())
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(payload.clone())
            })
            .await?;

        decode_json(response, cancel).await
    }

    /// DELETE `url`; the caller inspects the returned status.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn delete(&self, url: &Url, cancel: &CancelSignal) -> Result<Response> {
        debug!("DELETE {}...", url);

        self.executor
            .run("DELETE", cancel, || self.client.delete(url.clone()))
            .await
    }
}

/// Reads the full body of a success response and parses it as JSON.
async fn decode_json<T: DeserializeOwned>(
    response: Response,
    cancel: &CancelSignal,
) -> Result<T> {
    let body = cancel
        .guard(response.bytes())
        .await
        .ok_or(Error::Cancelled)?
        .map_err(Error::Transport)?;

    Ok(serde_json::from_slice(&body)?)
}
