//! Client for the JWT revocation service.
//!
//! ```no_run
//! use jwtrevoke::{Client, ClientConfig, RevocationApi};
//! use std::time::Duration;
//!
//! # async fn run() -> jwtrevoke::Result<()> {
//! let config = ClientConfig::builder("my-api-key")
//!     .max_retries(5)
//!     .timeout(Duration::from_secs(5))
//!     .build()?;
//! let client = Client::from_config(&config)?;
//!
//! for token in client.list_revoked_tokens().await? {
//!     println!("{} revoked until {}", token.jwt_id, token.expiry_date);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cancel;
pub mod commands;
pub mod config;
pub mod error;
pub mod http;

pub use api::{Client, RevocationApi, RevokeRequest, RevokedToken};
pub use cancel::{CancelHandle, CancelSignal};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Error, Result};
