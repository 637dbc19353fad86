// app/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,

  /// Applies `schema.sql` on startup when set.
  pub apply_schema: bool,

  pub mock_email_sender: String,
  pub mock_payment_merchant_id: String,
  /// Shared secret the hosted checkout sends in `X-Payment-Callback-Secret`.
  pub payment_callback_secret: String,

  pub log_format: LogFormat,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_env("DATABASE_URL")?;

    let apply_schema = get_env("APPLY_SCHEMA")
      .unwrap_or_else(|_| "false".to_string())
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid APPLY_SCHEMA value: {}", e)))?;

    let mock_email_sender = get_env("MOCK_EMAIL_SENDER").unwrap_or_else(|_| "siparis@mealbox.example".to_string());
    let mock_payment_merchant_id =
      get_env("MOCK_PAYMENT_MERCHANT_ID").unwrap_or_else(|_| "mock_merchant".to_string());

    let payment_callback_secret = get_env("PAYMENT_CALLBACK_SECRET")?;
    if payment_callback_secret.trim().is_empty() {
      return Err(AppError::Config("PAYMENT_CALLBACK_SECRET must not be empty".to_string()));
    }

    let log_format = match get_env("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()).as_str() {
      "pretty" => LogFormat::Pretty,
      "json" => LogFormat::Json,
      other => return Err(AppError::Config(format!("Invalid LOG_FORMAT '{}', expected 'pretty' or 'json'", other))),
    };

    Ok(Self {
      server_host,
      server_port,
      database_url,
      apply_schema,
      mock_email_sender,
      mock_payment_merchant_id,
      payment_callback_secret,
      log_format,
    })
  }

  pub fn server_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}
