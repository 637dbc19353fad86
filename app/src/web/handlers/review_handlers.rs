// app/src/web/handlers/review_handlers.rs

use actix_web::{web, HttpResponse};
use mealbox::{CategoryRatings, NewReview};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedMember;

// The order id comes from the path, so the body carries only the ratings.
#[derive(Deserialize, Debug)]
pub struct SubmitReviewPayload {
  pub rating: i16,
  #[serde(flatten)]
  pub categories: CategoryRatings,
  #[serde(default)]
  pub comment: Option<String>,
}

#[instrument(
    name = "handler::review_eligibility",
    skip(app_state, path, member),
    fields(order_id = %path.as_ref(), member_id = %member.member_id)
)]
pub async fn review_eligibility_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  member: AuthenticatedMember,
) -> Result<HttpResponse, AppError> {
  let eligibility = app_state
    .manager
    .can_review(path.into_inner(), member.member_id)
    .await?;

  Ok(HttpResponse::Ok().json(json!({
      "canReview": eligibility.is_eligible(),
      "reason": eligibility.reason(),
      "message": eligibility.reason().map(|reason| reason.message()),
  })))
}

#[instrument(
    name = "handler::submit_review",
    skip(app_state, path, req_payload, member),
    fields(order_id = %path.as_ref(), member_id = %member.member_id, rating = req_payload.rating)
)]
pub async fn submit_review_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  req_payload: web::Json<SubmitReviewPayload>,
  member: AuthenticatedMember,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let review = NewReview {
    order_id: path.into_inner(),
    rating: payload.rating,
    categories: payload.categories,
    comment: payload.comment,
  };
  let stored = app_state.manager.submit_review(member.member_id, review).await?;
  info!(review_id = %stored.id, "Review stored for moderation.");

  Ok(HttpResponse::Created().json(json!({
      "message": "Değerlendirmeniz alındı, onaylandıktan sonra yayınlanacak.",
      "review": stored,
  })))
}
