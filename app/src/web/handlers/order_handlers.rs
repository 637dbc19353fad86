// app/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use mealbox::{NewOrder, PaymentResult};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use super::outcome_message;
use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::{AuthenticatedMember, ClientIp, PaymentCallback};

// --- Request DTOs ---
#[derive(Deserialize, Debug)]
pub struct CancelOrderPayload {
  #[serde(default)]
  pub reason: String,
}

// --- Handler Implementations ---

#[instrument(
    name = "handler::place_order",
    skip(app_state, req_payload, member),
    fields(member_id = %member.member_id, items = req_payload.items.len())
)]
pub async fn place_order_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<NewOrder>,
  member: AuthenticatedMember,
) -> Result<HttpResponse, AppError> {
  let placed = app_state
    .manager
    .place_order(member.member_id, req_payload.into_inner())
    .await?;
  info!(order_id = %placed.order.id, order_number = %placed.order.order_number, "Order placed.");

  Ok(HttpResponse::Created().json(json!({
      "message": outcome_message("Siparişiniz alındı", &placed.warnings),
      "order": placed.order,
      "items": placed.items,
      "warnings": placed.warnings,
  })))
}

#[instrument(
    name = "handler::get_order",
    skip(app_state, path, member),
    fields(order_id = %path.as_ref(), member_id = %member.member_id)
)]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  member: AuthenticatedMember,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let order = app_state.manager.order_for_member(order_id, member.member_id).await?;
  let items = app_state.manager.order_items(order_id, member.member_id).await?;

  Ok(HttpResponse::Ok().json(json!({
      "order": order,
      "items": items,
  })))
}

#[instrument(
    name = "handler::order_timeline",
    skip(app_state, path, member),
    fields(order_id = %path.as_ref(), member_id = %member.member_id)
)]
pub async fn order_timeline_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  member: AuthenticatedMember,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let timeline = app_state.manager.order_timeline(order_id, member.member_id).await?;
  Ok(HttpResponse::Ok().json(json!({ "orderId": order_id, "timeline": timeline })))
}

#[instrument(
    name = "handler::cancel_order",
    skip(app_state, path, req_payload, member, client_ip),
    fields(order_id = %path.as_ref(), member_id = %member.member_id)
)]
pub async fn cancel_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  req_payload: web::Json<CancelOrderPayload>,
  member: AuthenticatedMember,
  client_ip: ClientIp,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let outcome = app_state
    .manager
    .cancel(order_id, member.member_id, &req_payload.reason, client_ip.0)
    .await?;
  info!(
    state_changed = outcome.state_changed(),
    refund = ?outcome.refund,
    warnings = outcome.warnings.len(),
    "Cancellation handled."
  );

  Ok(HttpResponse::Ok().json(json!({
      "message": outcome_message("Sipariş iptal edildi", &outcome.warnings),
      "stateChanged": outcome.state_changed(),
      "order": outcome.order,
      "refund": outcome.refund,
      "warnings": outcome.warnings,
  })))
}

/// Callback from the hosted checkout, authenticated by the shared callback secret.
#[instrument(name = "handler::record_payment", skip(app_state, path, req_payload, _callback), fields(order_id = %path.as_ref()))]
pub async fn record_payment_handler(
  app_state: web::Data<AppState>,
  _callback: PaymentCallback,
  path: web::Path<Uuid>,
  req_payload: web::Json<PaymentResult>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let outcome = app_state
    .manager
    .record_payment(order_id, req_payload.into_inner())
    .await?;

  Ok(HttpResponse::Ok().json(json!({
      "message": outcome_message("Ödeme durumu güncellendi", &outcome.warnings),
      "changed": outcome.changed,
      "order": outcome.order,
      "warnings": outcome.warnings,
  })))
}
