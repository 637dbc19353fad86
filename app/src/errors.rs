// app/src/errors.rs

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use mealbox::LifecycleError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Order Lifecycle Error: {source}")]
  Lifecycle {
    #[from]
    source: LifecycleError,
  },
}

impl AppError {
  /// Customer-facing message. Backend details stay in the logs.
  fn user_message(&self) -> String {
    match self {
      AppError::Validation(m) => m.clone(),
      AppError::Auth(_) => "Bu işlem için giriş yapmalısınız.".to_string(),
      AppError::Lifecycle { source } => source.user_message(),
      AppError::Config(_) | AppError::Sqlx(_) => {
        "Beklenmeyen bir hata oluştu. Lütfen daha sonra tekrar deneyin.".to_string()
      }
    }
  }

  fn code(&self) -> &'static str {
    match self {
      AppError::Validation(_) => "validation_error",
      AppError::Auth(_) => "unauthorized",
      AppError::Lifecycle { source } => source.code(),
      AppError::Config(_) | AppError::Sqlx(_) => "internal_error",
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Lifecycle { source } => match source {
        LifecycleError::NotFound { .. } => StatusCode::NOT_FOUND,
        LifecycleError::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        LifecycleError::Conflict { .. } => StatusCode::CONFLICT,
        LifecycleError::Validation { .. } => StatusCode::BAD_REQUEST,
        LifecycleError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
      },
      AppError::Config(_) | AppError::Sqlx(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    // Log the full error when it's turned into a response
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::info!(application_error = %self, status = status.as_u16(), "Request rejected");
    }
    HttpResponse::build(status).json(json!({
      "error": self.user_message(),
      "code": self.code(),
    }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
