// app/src/web/extractors.rs

//! Mock identity extractors. A real deployment puts session or token
//! validation behind the same types.

use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use std::net::{IpAddr, Ipv4Addr};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedMember {
  pub member_id: Uuid,
}

impl FromRequest for AuthenticatedMember {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    if let Some(header) = req.headers().get("X-User-ID") {
      if let Ok(value) = header.to_str() {
        if let Ok(member_id) = Uuid::parse_str(value.trim()) {
          return ready(Ok(AuthenticatedMember { member_id }));
        }
      }
    }
    warn!("AuthenticatedMember extractor: Missing or invalid X-User-ID header.");
    ready(Err(AppError::Auth(
      "Member authentication required. Missing or invalid X-User-ID header.".to_string(),
    )))
  }
}

/// Kitchen or support staff. The header value is recorded as the actor name.
#[derive(Debug, Clone)]
pub struct StaffUser {
  pub name: String,
}

impl FromRequest for StaffUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let name = req
      .headers()
      .get("X-Staff-ID")
      .and_then(|header| header.to_str().ok())
      .map(str::trim)
      .filter(|value| !value.is_empty());
    match name {
      Some(name) => ready(Ok(StaffUser { name: name.to_string() })),
      None => {
        warn!("StaffUser extractor: Missing X-Staff-ID header.");
        ready(Err(AppError::Auth("Staff authentication required. Missing X-Staff-ID header.".to_string())))
      }
    }
  }
}

/// Address the request came from, forwarded to the payment gateway on refunds.
/// Falls back to 0.0.0.0 when the peer address is unknown (e.g. in tests).
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub IpAddr);

impl FromRequest for ClientIp {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let from_forwarded = req
      .connection_info()
      .realip_remote_addr()
      .and_then(|addr| addr.parse::<IpAddr>().ok());
    let ip = from_forwarded
      .or_else(|| req.peer_addr().map(|addr| addr.ip()))
      .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    ready(Ok(ClientIp(ip)))
  }
}

/// Proof that a request came from the hosted checkout: the
/// `X-Payment-Callback-Secret` header must equal the configured secret.
#[derive(Debug, Clone, Copy)]
pub struct PaymentCallback;

impl FromRequest for PaymentCallback {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
      return ready(Err(AppError::Config("Application state is not registered.".to_string())));
    };
    let presented = req
      .headers()
      .get("X-Payment-Callback-Secret")
      .and_then(|header| header.to_str().ok());
    match presented {
      Some(secret) if secret == state.config.payment_callback_secret => ready(Ok(PaymentCallback)),
      _ => {
        warn!("PaymentCallback extractor: Missing or wrong X-Payment-Callback-Secret header.");
        ready(Err(AppError::Auth(
          "Payment callback rejected. Missing or wrong X-Payment-Callback-Secret header.".to_string(),
        )))
      }
    }
  }
}
