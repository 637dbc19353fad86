// app/src/web/routes.rs

use actix_web::web;

use crate::errors::AppError;
use crate::web::handlers::{admin_handlers, order_handlers, review_handlers};

// Liveness only; database health shows up in the request logs.
async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

// Malformed bodies get the same JSON error shape as every other failure.
fn json_config() -> web::JsonConfig {
  web::JsonConfig::default().error_handler(|err, req| {
    tracing::info!(path = %req.path(), payload_error = %err, "Rejected malformed request body.");
    AppError::Validation("İstek gövdesi geçersiz.".to_string()).into()
  })
}

// This function will be called in `main.rs` to configure services for the Actix App.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1") // Base path for API version 1
      .app_data(json_config())
      .route("/health", web::get().to(health_check_handler))
      // Member order routes (X-User-ID)
      .service(
        web::scope("/orders")
          .route("", web::post().to(order_handlers::place_order_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler))
          .route("/{order_id}/timeline", web::get().to(order_handlers::order_timeline_handler))
          .route("/{order_id}/cancel", web::post().to(order_handlers::cancel_order_handler))
          .route("/{order_id}/payment", web::post().to(order_handlers::record_payment_handler))
          .route(
            "/{order_id}/review-eligibility",
            web::get().to(review_handlers::review_eligibility_handler),
          )
          .route("/{order_id}/review", web::post().to(review_handlers::submit_review_handler)),
      )
      // Staff routes (X-Staff-ID)
      .service(
        web::scope("/admin")
          .route(
            "/orders/{order_id}/status",
            web::post().to(admin_handlers::transition_handler),
          )
          .route(
            "/reviews/{review_id}/moderation",
            web::post().to(admin_handlers::moderate_review_handler),
          ),
      ),
  );
}
