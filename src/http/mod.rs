//! HTTP layer: retry policy, request executor and the configured client.

mod client;
mod executor;
mod retry;

pub use client::{API_KEY_HEADER, HttpClient};
pub use executor::Executor;
pub use retry::{Disposition, backoff_delay, classify_status};
