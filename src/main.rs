use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use jwtrevoke::{Client, ClientConfig, commands};
use std::time::Duration;

/// jwtrevoke - manage revoked JWTs
///
/// Lists, creates and deletes token revocations on the JWT revocation service.
/// Transient failures (network errors, 5xx, 429) are retried automatically.
///
/// Examples:
///   jwtrevoke list
///   jwtrevoke revoke 3f2a --reason "leaked" --expires 2030-01-01T00:00:00Z
///   jwtrevoke delete 3f2a
#[derive(Parser, Debug)]
#[command(author, version = env!("JWTREVOKE_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API key for the revocation service
    #[arg(
        long = "api-key",
        env = "JWT_REVOKE_API_KEY",
        hide_env_values = true,
        global = true
    )]
    pub api_key: Option<String>,

    /// Service base URL (defaults to https://api.jwtrevoke.com)
    #[arg(
        long = "base-url",
        env = "JWT_REVOKE_BASE_URL",
        value_name = "URL",
        global = true
    )]
    pub base_url: Option<String>,

    /// Retries after the first attempt
    #[arg(long = "max-retries", value_name = "N", global = true)]
    pub max_retries: Option<usize>,

    /// Per-attempt request timeout in seconds
    #[arg(long = "timeout", value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Wait after a 429 response, in milliseconds
    #[arg(long = "rate-limit-delay", value_name = "MS", global = true)]
    pub rate_limit_delay: Option<u64>,

    /// Linear backoff step between retries, in milliseconds
    #[arg(long = "retry-backoff", value_name = "MS", global = true)]
    pub retry_backoff: Option<u64>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List revoked tokens
    List,

    /// Revoke a token
    Revoke(RevokeArgs),

    /// Delete a revocation
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct RevokeArgs {
    /// Identifier (jti) of the token to revoke
    #[arg(value_name = "JWT_ID")]
    pub jwt_id: String,

    /// Why the token is revoked
    #[arg(long, short = 'r')]
    pub reason: String,

    /// When the token would expire anyway (RFC 3339)
    #[arg(long = "expires", short = 'e', value_name = "TIMESTAMP")]
    pub expiry_date: DateTime<Utc>,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Identifier (jti) of the revoked token
    #[arg(value_name = "JWT_ID")]
    pub jwt_id: String,
}

impl Cli {
    fn client_config(&self) -> Result<ClientConfig> {
        let api_key = self
            .api_key
            .clone()
            .context("An API key is required: pass --api-key or set JWT_REVOKE_API_KEY")?;

        let mut builder = ClientConfig::builder(api_key);
        if let Some(url) = &self.base_url {
            builder = builder.base_url(url);
        }
        if let Some(retries) = self.max_retries {
            builder = builder.max_retries(retries);
        }
        if let Some(secs) = self.timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(ms) = self.rate_limit_delay {
            builder = builder.rate_limit_delay(Duration::from_millis(ms));
        }
        if let Some(ms) = self.retry_backoff {
            builder = builder.backoff_unit(Duration::from_millis(ms));
        }

        Ok(builder.build()?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let client = Client::from_config(&cli.client_config()?)?;
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::List => commands::list(&client, &mut stdout).await?,
        Commands::Revoke(args) => {
            commands::revoke(
                &client,
                &args.jwt_id,
                &args.reason,
                args.expiry_date,
                &mut stdout,
            )
            .await?
        }
        Commands::Delete(args) => commands::delete(&client, &args.jwt_id, &mut stdout).await?,
    }
    Ok(())
}
