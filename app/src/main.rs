// app/src/main.rs

// Declare modules for the application
mod config;
mod db;
mod errors;
mod services;
mod state;
mod web;

use crate::config::{AppConfig, LogFormat};
use crate::db::PgOrderStore;
use crate::services::{MockEmailDispatcher, MockPaymentGateway};
use crate::state::AppState;

use actix_web::{web as actix_data, App, HttpServer}; // Renamed web to actix_data
use mealbox::OrderLifecycleManager;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan; // For span events in tracing

fn init_tracing(format: LogFormat) {
  let builder = tracing_subscriber::fmt()
    .with_max_level(Level::INFO) // Default level
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // Allow RUST_LOG override
    .with_span_events(FmtSpan::CLOSE); // Log when spans close, showing duration
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Pretty => builder.init(),
  }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  // Config comes first so LOG_FORMAT can pick the subscriber.
  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      eprintln!("Failed to load application configuration: {}", e);
      return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }
  };
  init_tracing(app_config.log_format);

  tracing::info!("Starting meal order server...");

  let db_pool = match PgPool::connect(&app_config.database_url).await {
    Ok(pool) => {
      tracing::info!("Successfully connected to the database.");
      pool
    }
    Err(e) => {
      tracing::error!(error = %e, "Failed to connect to the database.");
      return Err(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e.to_string()));
    }
  };

  if app_config.apply_schema {
    if let Err(e) = db::apply_schema(&db_pool).await {
      tracing::error!(error = %e, "Failed to apply database schema.");
      return Err(std::io::Error::other(e.to_string()));
    }
    tracing::info!("Database schema applied.");
  }

  let manager = OrderLifecycleManager::new(
    Arc::new(PgOrderStore::new(db_pool)),
    Arc::new(MockEmailDispatcher::new(app_config.mock_email_sender.clone())),
    Arc::new(MockPaymentGateway::new(app_config.mock_payment_merchant_id.clone())),
  );

  let app_state = AppState {
    manager,
    config: app_config.clone(),
  };

  let server_address = app_state.config.server_address();
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone())) // Share AppState with handlers
      .wrap(tracing_actix_web::TracingLogger::default()) // Actix middleware for tracing requests
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
