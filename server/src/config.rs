// seatflow-server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,

  pub payu_merchant_key: String,
  pub payu_merchant_salt: String,
  /// `None` disables the Cashfree endpoint.
  pub cashfree_webhook_secret: Option<String>,

  pub seat_claim_lease_secs: i64,
  /// `0` disables the background reconciliation task.
  pub reconcile_interval_secs: u64,
  pub reconcile_batch_size: i64,

  pub run_migrations: bool,
}

impl std::fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("database_url", &"[REDACTED]")
      .field("payu_merchant_key", &self.payu_merchant_key)
      .field("payu_merchant_salt", &"[REDACTED]")
      .field("cashfree_enabled", &self.cashfree_webhook_secret.is_some())
      .field("seat_claim_lease_secs", &self.seat_claim_lease_secs)
      .field("reconcile_interval_secs", &self.reconcile_interval_secs)
      .field("reconcile_batch_size", &self.reconcile_batch_size)
      .field("run_migrations", &self.run_migrations)
      .finish()
  }
}

fn get_env(var_name: &str) -> Result<String> {
  env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
}

fn parse_env<T>(var_name: &str, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match env::var(var_name) {
    Ok(raw) if !raw.trim().is_empty() => raw
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {}: {}", var_name, e))),
    _ => Ok(default),
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = parse_env("SERVER_PORT", 8080u16)?;
    let database_url = get_env("DATABASE_URL")?;

    let payu_merchant_key = get_env("PAYU_MERCHANT_KEY")?;
    let payu_merchant_salt = get_env("PAYU_MERCHANT_SALT")?;
    let cashfree_webhook_secret = env::var("CASHFREE_WEBHOOK_SECRET").ok().filter(|s| !s.trim().is_empty());

    let seat_claim_lease_secs = parse_env("SEAT_CLAIM_LEASE_SECS", 300i64)?;
    if seat_claim_lease_secs <= 0 {
      return Err(AppError::Config("SEAT_CLAIM_LEASE_SECS must be positive".to_string()));
    }
    let reconcile_interval_secs = parse_env("RECONCILE_INTERVAL_SECS", 600u64)?;
    let reconcile_batch_size = parse_env("RECONCILE_BATCH_SIZE", 50i64)?;
    if reconcile_batch_size <= 0 {
      return Err(AppError::Config("RECONCILE_BATCH_SIZE must be positive".to_string()));
    }
    let run_migrations = parse_env("RUN_MIGRATIONS", true)?;

    let config = Self {
      server_host,
      server_port,
      database_url,
      payu_merchant_key,
      payu_merchant_salt,
      cashfree_webhook_secret,
      seat_claim_lease_secs,
      reconcile_interval_secs,
      reconcile_batch_size,
      run_migrations,
    };
    tracing::info!(config = ?config, "Application configuration loaded.");
    Ok(config)
  }

  pub fn seat_claim_lease(&self) -> chrono::Duration {
    chrono::Duration::seconds(self.seat_claim_lease_secs)
  }
}
