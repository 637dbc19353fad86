// app/src/web/handlers/admin_handlers.rs

use actix_web::{web, HttpResponse};
use mealbox::{Actor, OrderStatus, ReviewStatus};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use super::outcome_message;
use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::StaffUser;

#[derive(Deserialize, Debug)]
pub struct StatusChangePayload {
  pub status: OrderStatus,
  #[serde(default)]
  pub note: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ModerationPayload {
  pub status: ReviewStatus,
}

#[instrument(
    name = "handler::admin_transition",
    skip(app_state, path, req_payload, staff),
    fields(order_id = %path.as_ref(), target = %req_payload.status, staff = %staff.name)
)]
pub async fn transition_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  req_payload: web::Json<StatusChangePayload>,
  staff: StaffUser,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let outcome = app_state
    .manager
    .transition(path.into_inner(), payload.status, Actor::Staff(staff.name), payload.note)
    .await?;
  info!(changed = outcome.changed(), "Status change handled.");

  let done = if outcome.changed() {
    "Sipariş durumu güncellendi"
  } else {
    "Sipariş zaten bu durumda"
  };
  Ok(HttpResponse::Ok().json(json!({
      "message": outcome_message(done, &outcome.warnings),
      "changed": outcome.changed(),
      "order": outcome.order,
      "historyEntry": outcome.history_entry,
      "warnings": outcome.warnings,
  })))
}

#[instrument(
    name = "handler::moderate_review",
    skip(app_state, path, req_payload, staff),
    fields(review_id = %path.as_ref(), target = %req_payload.status, staff = %staff.name)
)]
pub async fn moderate_review_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  req_payload: web::Json<ModerationPayload>,
  staff: StaffUser,
) -> Result<HttpResponse, AppError> {
  let review = app_state
    .manager
    .moderate_review(path.into_inner(), req_payload.status, &staff.name)
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "review": review })))
}
