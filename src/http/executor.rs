//! Request executor with bounded retries.

use std::time::Duration;

use log::{debug, warn};
use reqwest::{RequestBuilder, Response, StatusCode};

use super::retry::{Disposition, backoff_delay, classify_status};
use crate::cancel::CancelSignal;
use crate::config::ClientConfig;
use crate::error::{Error, ErrorBody, Result};

/// Runs prepared requests against the service, retrying transient failures.
///
/// Attempt `k` (zero-based) first sleeps `k * backoff_unit`, then sends. A 429
/// additionally waits `rate_limit_delay` before the next attempt. Transport
/// errors and 5xx responses are retried; any other non-2xx status is decoded
/// into [`Error::Api`] and returned without retrying.
#[derive(Debug, Clone)]
pub struct Executor {
    max_retries: usize,
    backoff_unit: Duration,
    rate_limit_delay: Duration,
}

/// Why the most recent attempt did not succeed.
enum Failure {
    Transport(reqwest::Error),
    Status(StatusCode, Disposition),
}

impl Failure {
    fn into_error(self, attempts: usize) -> Error {
        match self {
            Failure::Transport(e) => Error::Transport(e),
            Failure::Status(status, _) => Error::RetriesExhausted { status, attempts },
        }
    }
}

impl Executor {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            max_retries: config.max_retries(),
            backoff_unit: config.backoff_unit(),
            rate_limit_delay: config.rate_limit_delay(),
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_retries.saturating_add(1)
    }

    /// Sends the request produced by `build` until it succeeds, fails for good,
    /// or runs out of attempts. `build` is called once per attempt.
    #[tracing::instrument(skip(self, cancel, build))]
    pub async fn run<F>(&self, operation: &str, cancel: &CancelSignal, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;

        loop {
            if cancel.is_cancelled() {
                debug!("{}: cancelled before attempt {}", operation, attempt + 1);
                return Err(Error::Cancelled);
            }

            if attempt > 0 {
                self.pause(backoff_delay(attempt, self.backoff_unit), cancel)
                    .await?;
            }

            let sent = cancel
                .guard(build().send())
                .await
                .ok_or(Error::Cancelled)?;

            let failure = match sent {
                Err(e) => {
                    warn!(
                        "{}: attempt {}/{} failed ({})",
                        operation,
                        attempt + 1,
                        self.max_attempts(),
                        e
                    );
                    Failure::Transport(e)
                }
                Ok(response) => {
                    let status = response.status();
                    let disposition = classify_status(status);
                    if disposition == Disposition::Success {
                        return Ok(response);
                    }
                    if !disposition.is_retryable() {
                        return Err(self.client_error(operation, response, cancel).await);
                    }
                    warn!(
                        "{}: attempt {}/{} returned {}",
                        operation,
                        attempt + 1,
                        self.max_attempts(),
                        status
                    );
                    Failure::Status(status, disposition)
                }
            };

            if attempt >= self.max_retries {
                return Err(failure.into_error(self.max_attempts()));
            }

            // No rate-limit pause after the last attempt: nothing follows it.
            if matches!(failure, Failure::Status(_, Disposition::RateLimited)) {
                debug!(
                    "{}: rate limited, waiting {:?}",
                    operation, self.rate_limit_delay
                );
                self.pause(self.rate_limit_delay, cancel).await?;
            }

            attempt += 1;
        }
    }

    /// Turns a non-retryable response into [`Error::Api`].
    async fn client_error(
        &self,
        operation: &str,
        response: Response,
        cancel: &CancelSignal,
    ) -> Error {
        let status = response.status();
        let body = match cancel.guard(response.bytes()).await {
            Some(body) => body.unwrap_or_default(),
            None => return Error::Cancelled,
        };
        let error = ErrorBody::parse(&body).into_error(status);
        debug!("{}: non-retryable error: {}", operation, error);
        error
    }

    async fn pause(&self, delay: Duration, cancel: &CancelSignal) -> Result<()> {
        if delay.is_zero() {
            return Ok(());
        }
        cancel
            .guard(tokio::time::sleep(delay))
            .await
            .ok_or(Error::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelHandle;
    use reqwest::Client;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    fn executor(max_retries: usize) -> Executor {
        Executor {
            max_retries,
            backoff_unit: Duration::from_millis(1),
            rate_limit_delay: Duration::from_millis(1),
        }
    }

    /// Address nothing listens on: bind an ephemeral port, then release it.
    fn closed_port_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}/", addr)
    }

    #[test]
    fn test_new_copies_config() {
        let config = ClientConfig::builder("key")
            .max_retries(7)
            .backoff_unit(Duration::from_millis(5))
            .rate_limit_delay(Duration::from_millis(9))
            .build()
            .unwrap();
        let executor = Executor::new(&config);
        assert_eq!(executor.max_retries, 7);
        assert_eq!(executor.max_attempts(), 8);
        assert_eq!(executor.backoff_unit, Duration::from_millis(5));
        assert_eq!(executor.rate_limit_delay, Duration::from_millis(9));
    }

    #[tokio::test]
    async fn test_success_first_attempt() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/ok")
            .with_status(200)
            .with_body("fine")
            .expect(1)
            .create_async()
            .await;

        let client = Client::new();
        let url = format!("{}/ok", server.url());
        let response = executor(3)
            .run("test", &CancelSignal::never(), || client.get(&url))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), "fine");
    }

    #[test_log::test(tokio::test)]
    async fn test_transport_failure_makes_n_plus_one_attempts() {
        let client = Client::new();
        let url = closed_port_url();
        let calls = AtomicUsize::new(0);

        for max_retries in [0, 1, 3] {
            calls.store(0, Ordering::SeqCst);
            let result = executor(max_retries)
                .run("test", &CancelSignal::never(), || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    client.get(&url)
                })
                .await;

            assert!(matches!(result, Err(Error::Transport(_))));
            assert_eq!(calls.load(Ordering::SeqCst), max_retries + 1);
        }
    }

    #[tokio::test]
    async fn test_server_error_then_success() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("GET", "/flaky")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;
        let healthy = server
            .mock("GET", "/flaky")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        // A rate-limit pause this long would blow the elapsed-time bound below.
        let executor = Executor {
            rate_limit_delay: Duration::from_secs(30),
            ..executor(3)
        };
        let client = Client::new();
        let url = format!("{}/flaky", server.url());

        let start = Instant::now();
        let response = executor
            .run("test", &CancelSignal::never(), || client.get(&url))
            .await
            .unwrap();

        failing.assert_async().await;
        healthy.assert_async().await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_rate_limited_then_success_waits_once() {
        let mut server = mockito::Server::new_async().await;
        let limited = server
            .mock("GET", "/limited")
            .with_status(429)
            .expect(1)
            .create_async()
            .await;
        let healthy = server
            .mock("GET", "/limited")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let executor = Executor {
            max_retries: 3,
            backoff_unit: Duration::from_millis(1),
            rate_limit_delay: Duration::from_millis(300),
        };
        let client = Client::new();
        let url = format!("{}/limited", server.url());

        let start = Instant::now();
        let response = executor
            .run("test", &CancelSignal::never(), || client.get(&url))
            .await
            .unwrap();
        let elapsed = start.elapsed();

        limited.assert_async().await;
        healthy.assert_async().await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(elapsed >= Duration::from_millis(300));
        assert!(elapsed < Duration::from_millis(600));
    }

    #[tokio::test]
    async fn test_rate_limited_exhausts_retries() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/limited")
            .with_status(429)
            .expect(3)
            .create_async()
            .await;

        let executor = Executor {
            max_retries: 2,
            backoff_unit: Duration::from_millis(1),
            rate_limit_delay: Duration::from_millis(400),
        };
        let client = Client::new();
        let url = format!("{}/limited", server.url());

        let start = Instant::now();
        let err = executor
            .run("test", &CancelSignal::never(), || client.get(&url))
            .await
            .unwrap_err();
        let elapsed = start.elapsed();

        mock.assert_async().await;
        match err {
            Error::RetriesExhausted { status, attempts } => {
                assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
                assert_eq!(attempts, 3);
            }
            other => panic!("expected RetriesExhausted, got {:?}", other),
        }
        // Two rate-limit pauses between three attempts, none after the last.
        assert!(elapsed >= Duration::from_millis(800));
        assert!(elapsed < Duration::from_millis(1200));
    }

    #[tokio::test]
    async fn test_rate_limited_single_attempt_does_not_wait() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/limited")
            .with_status(429)
            .expect(1)
            .create_async()
            .await;

        let executor = Executor {
            max_retries: 0,
            backoff_unit: Duration::from_millis(1),
            rate_limit_delay: Duration::from_secs(30),
        };
        let client = Client::new();
        let url = format!("{}/limited", server.url());

        let start = Instant::now();
        let err = executor
            .run("test", &CancelSignal::never(), || client.get(&url))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(
            err,
            Error::RetriesExhausted {
                status: StatusCode::TOO_MANY_REQUESTS,
                attempts: 1
            }
        ));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"not found","data":{"id":"x"}}"#)
            .expect(1)
            .create_async()
            .await;

        let client = Client::new();
        let url = format!("{}/missing", server.url());
        let err = executor(3)
            .run("test", &CancelSignal::never(), || client.get(&url))
            .await
            .unwrap_err();

        mock.assert_async().await;
        match err {
            Error::Api {
                status,
                message,
                data,
            } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(message, "not found");
                assert_eq!(data, serde_json::json!({"id": "x"}));
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_client_error_without_json_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/bad")
            .with_status(400)
            .with_body("bad request")
            .expect(1)
            .create_async()
            .await;

        let client = Client::new();
        let url = format!("{}/bad", server.url());
        let err = executor(3)
            .run("test", &CancelSignal::never(), || client.get(&url))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(err.is_api_error());
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn test_server_errors_exhaust_retries() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/down")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let client = Client::new();
        let url = format!("{}/down", server.url());
        let err = executor(2)
            .run("test", &CancelSignal::never(), || client.get(&url))
            .await
            .unwrap_err();

        mock.assert_async().await;
        match err {
            Error::RetriesExhausted { status, attempts } => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(attempts, 3);
            }
            other => panic!("expected RetriesExhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_zero_retries_single_attempt() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/down")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let executor = Executor {
            max_retries: 0,
            backoff_unit: Duration::from_secs(30),
            rate_limit_delay: Duration::from_secs(30),
        };
        let client = Client::new();
        let url = format!("{}/down", server.url());

        let start = Instant::now();
        let err = executor
            .run("test", &CancelSignal::never(), || client.get(&url))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, Error::RetriesExhausted { attempts: 1, .. }));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_backoff_grows_between_attempts() {
        let client = Client::new();
        let url = closed_port_url();
        let stamps = std::sync::Mutex::new(Vec::new());

        let executor = Executor {
            max_retries: 3,
            backoff_unit: Duration::from_millis(40),
            rate_limit_delay: Duration::from_millis(1),
        };
        let _ = executor
            .run("test", &CancelSignal::never(), || {
                stamps.lock().unwrap().push(Instant::now());
                client.get(&url)
            })
            .await;

        let stamps = stamps.into_inner().unwrap();
        assert_eq!(stamps.len(), 4);
        let gaps: Vec<Duration> = stamps.windows(2).map(|w| w[1] - w[0]).collect();
        for (i, gap) in gaps.iter().enumerate() {
            assert!(*gap >= Duration::from_millis(40 * (i as u64 + 1)));
        }
    }

    #[tokio::test]
    async fn test_cancelled_before_first_attempt() {
        let handle = CancelHandle::new();
        handle.cancel();
        let calls = AtomicUsize::new(0);
        let client = Client::new();

        let err = executor(3)
            .run("test", &handle.signal(), || {
                calls.fetch_add(1, Ordering::SeqCst);
                client.get("http://127.0.0.1:1/")
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_during_backoff_stops_retrying() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/down")
            .with_status(503)
            .create_async()
            .await;

        let handle = CancelHandle::new();
        let signal = handle.signal();
        let executor = Executor {
            max_retries: 5,
            backoff_unit: Duration::from_secs(30),
            rate_limit_delay: Duration::from_millis(1),
        };
        let client = Client::new();
        let url = format!("{}/down", server.url());
        let calls = AtomicUsize::new(0);

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            handle.cancel();
        });

        let start = Instant::now();
        let err = executor
            .run("test", &signal, || {
                calls.fetch_add(1, Ordering::SeqCst);
                client.get(&url)
            })
            .await
            .unwrap_err();

        canceller.await.unwrap();
        assert!(matches!(err, Error::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() < Duration::from_secs(10));
    }
}
