// app/src/web/tests.rs

use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test, web as actix_data, App};
use mealbox::{InMemoryOrderStore, OrderLifecycleManager};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{AppConfig, LogFormat};
use crate::services::{MockEmailDispatcher, MockPaymentGateway};
use crate::state::AppState;
use crate::web::configure_app_routes;

const STAFF: &str = "kitchen-1";
const CALLBACK_SECRET: &str = "checkout-callback-secret";

struct TestApp {
  state: AppState,
  member_id: Uuid,
}

impl TestApp {
  fn new(member_email: &str) -> Self {
    let store = Arc::new(InMemoryOrderStore::new());
    let member_id = Uuid::new_v4();
    store.register_member(member_id, member_email);
    let config = Arc::new(AppConfig {
      server_host: "127.0.0.1".to_string(),
      server_port: 0,
      database_url: "postgres://unused".to_string(),
      apply_schema: false,
      mock_email_sender: "siparis@mealbox.example".to_string(),
      mock_payment_merchant_id: "mock_merchant".to_string(),
      payment_callback_secret: CALLBACK_SECRET.to_string(),
      log_format: LogFormat::Pretty,
    });
    let manager = OrderLifecycleManager::new(
      store,
      Arc::new(MockEmailDispatcher::new(config.mock_email_sender.clone())),
      Arc::new(MockPaymentGateway::new(config.mock_payment_merchant_id.clone())),
    );
    Self {
      state: AppState { manager, config },
      member_id,
    }
  }
}

fn order_payload() -> Value {
  let meal = |name: &str| {
    json!({
      "meal_id": Uuid::new_v4(),
      "name": name,
      "category": "protein",
      "calories": 520,
      "protein_grams": 42.0,
      "carbs_grams": 35.5,
      "fat_grams": 18.0,
    })
  };
  json!({
    "payment_method": "card",
    "discount_amount": 2000,
    "promo_code": "FIT10",
    "promo_discount": 1000,
    "delivery_days": ["Mon", "Wed"],
    "delivery_address_id": Uuid::new_v4(),
    "delivery_date": "2026-11-02",
    "delivery_time_slot": "18:00-21:00",
    "items": [
      { "meal": meal("Izgara Tavuk"), "quantity": 5, "unit_price": 15000, "delivery_date": "2026-11-02" },
      { "meal": meal("Somon Bowl"), "quantity": 3, "unit_price": 21000, "delivery_date": "2026-11-04" },
    ],
  })
}

async fn send<S, R>(app: &S, req: R) -> (StatusCode, Value)
where
  S: Service<R, Response = ServiceResponse, Error = actix_web::Error>,
{
  let resp = test::call_service(app, req).await;
  let status = resp.status();
  let body: Value = test::read_body_json(resp).await;
  (status, body)
}

macro_rules! init_app {
  ($state:expr) => {
    test::init_service(
      App::new()
        .app_data(actix_data::Data::new($state.clone()))
        .configure(configure_app_routes),
    )
    .await
  };
}

fn place(member_id: Uuid) -> test::TestRequest {
  test::TestRequest::post()
    .uri("/api/v1/orders")
    .insert_header(("X-User-ID", member_id.to_string()))
    .set_json(order_payload())
}

fn staff_status(order_id: &str, status: &str) -> test::TestRequest {
  test::TestRequest::post()
    .uri(&format!("/api/v1/admin/orders/{}/status", order_id))
    .insert_header(("X-Staff-ID", STAFF))
    .set_json(json!({ "status": status }))
}

#[actix_web::test]
async fn health_check_is_ok() {
  let harness = TestApp::new("uye@example.com");
  let app = init_app!(harness.state);
  let req = test::TestRequest::get().uri("/api/v1/health").to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn placing_an_order_requires_a_member() {
  let harness = TestApp::new("uye@example.com");
  let app = init_app!(harness.state);
  let req = test::TestRequest::post()
    .uri("/api/v1/orders")
    .set_json(order_payload())
    .to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["code"], "unauthorized");
}

#[actix_web::test]
async fn placed_order_is_readable_by_its_owner_only() {
  let harness = TestApp::new("uye@example.com");
  let app = init_app!(harness.state);

  let (status, body) = send(&app, place(harness.member_id).to_request()).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["order"]["status"], "pending");
  assert_eq!(body["order"]["final_amount"], 135000);
  assert_eq!(body["message"], "Siparişiniz alındı.");
  let order_id = body["order"]["id"].as_str().unwrap().to_string();

  let req = test::TestRequest::get()
    .uri(&format!("/api/v1/orders/{}", order_id))
    .insert_header(("X-User-ID", harness.member_id.to_string()))
    .to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["items"].as_array().unwrap().len(), 2);

  let req = test::TestRequest::get()
    .uri(&format!("/api/v1/orders/{}", order_id))
    .insert_header(("X-User-ID", Uuid::new_v4().to_string()))
    .to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["code"], "not_found");
}

#[actix_web::test]
async fn paid_order_cancellation_refunds_and_reports() {
  let harness = TestApp::new("uye@example.com");
  let app = init_app!(harness.state);
  let (_, body) = send(&app, place(harness.member_id).to_request()).await;
  let order_id = body["order"]["id"].as_str().unwrap().to_string();

  let req = test::TestRequest::post()
    .uri(&format!("/api/v1/orders/{}/payment", order_id))
    .insert_header(("X-Payment-Callback-Secret", CALLBACK_SECRET))
    .set_json(json!({ "result": "completed", "transaction_id": "txn_42" }))
    .to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["order"]["payment_status"], "completed");

  let req = test::TestRequest::post()
    .uri(&format!("/api/v1/orders/{}/cancel", order_id))
    .insert_header(("X-User-ID", harness.member_id.to_string()))
    .set_json(json!({ "reason": "Planlarım değişti" }))
    .to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["stateChanged"], true);
  assert_eq!(body["order"]["status"], "cancelled");
  assert_eq!(body["order"]["payment_status"], "refunded");
  assert_eq!(body["refund"]["outcome"], "refunded");
  assert_eq!(body["refund"]["amount"], "1350.00");
  assert_eq!(body["message"], "Sipariş iptal edildi.");

  // A second cancel is a conflict, not a second refund.
  let req = test::TestRequest::post()
    .uri(&format!("/api/v1/orders/{}/cancel", order_id))
    .insert_header(("X-User-ID", harness.member_id.to_string()))
    .set_json(json!({ "reason": "Tekrar" }))
    .to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["code"], "conflict");
}

#[actix_web::test]
async fn cancellation_with_failed_email_is_a_partial_success() {
  let harness = TestApp::new("fail_test@example.com");
  let app = init_app!(harness.state);
  let (status, body) = send(&app, place(harness.member_id).to_request()).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["warnings"][0]["dependency"], "notification");
  let order_id = body["order"]["id"].as_str().unwrap().to_string();

  let req = test::TestRequest::post()
    .uri(&format!("/api/v1/orders/{}/cancel", order_id))
    .insert_header(("X-User-ID", harness.member_id.to_string()))
    .set_json(json!({ "reason": "Yanlış adres" }))
    .to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["order"]["status"], "cancelled");
  assert_eq!(body["refund"]["outcome"], "not_applicable");
  assert_eq!(body["message"], "Sipariş iptal edildi ancak bildirim gönderilemedi.");
}

#[actix_web::test]
async fn blank_cancel_reason_is_rejected() {
  let harness = TestApp::new("uye@example.com");
  let app = init_app!(harness.state);
  let (_, body) = send(&app, place(harness.member_id).to_request()).await;
  let order_id = body["order"]["id"].as_str().unwrap().to_string();

  let req = test::TestRequest::post()
    .uri(&format!("/api/v1/orders/{}/cancel", order_id))
    .insert_header(("X-User-ID", harness.member_id.to_string()))
    .set_json(json!({ "reason": "   " }))
    .to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "Lütfen iptal nedenini belirtin.");
}

#[actix_web::test]
async fn staff_drive_the_order_to_delivery_and_the_member_reviews_it() {
  let harness = TestApp::new("uye@example.com");
  let app = init_app!(harness.state);
  let (_, body) = send(&app, place(harness.member_id).to_request()).await;
  let order_id = body["order"]["id"].as_str().unwrap().to_string();

  let eligibility = || {
    test::TestRequest::get()
      .uri(&format!("/api/v1/orders/{}/review-eligibility", order_id))
      .insert_header(("X-User-ID", harness.member_id.to_string()))
      .to_request()
  };
  let (_, body) = send(&app, eligibility()).await;
  assert_eq!(body["canReview"], false);
  assert_eq!(body["reason"]["reason"], "not_delivered");

  // Skipping ahead is rejected.
  let (status, body) = send(&app, staff_status(&order_id, "shipped").to_request()).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["code"], "invalid_transition");

  for target in ["confirmed", "preparing", "ready", "shipped", "delivered"] {
    let (status, body) = send(&app, staff_status(&order_id, target).to_request()).await;
    assert_eq!(status, StatusCode::OK, "{}", target);
    assert_eq!(body["order"]["status"], target);
    assert_eq!(body["changed"], true);
  }

  let req = test::TestRequest::get()
    .uri(&format!("/api/v1/orders/{}/timeline", order_id))
    .insert_header(("X-User-ID", harness.member_id.to_string()))
    .to_request();
  let (_, body) = send(&app, req).await;
  let statuses: Vec<&str> = body["timeline"]
    .as_array()
    .unwrap()
    .iter()
    .map(|entry| entry["status"].as_str().unwrap())
    .collect();
  assert_eq!(
    statuses,
    vec!["pending", "confirmed", "preparing", "ready", "shipped", "delivered"]
  );

  let (_, body) = send(&app, eligibility()).await;
  assert_eq!(body["canReview"], true);

  let review = || {
    test::TestRequest::post()
      .uri(&format!("/api/v1/orders/{}/review", order_id))
      .insert_header(("X-User-ID", harness.member_id.to_string()))
      .set_json(json!({ "rating": 5, "taste": 5, "comment": "Harika" }))
      .to_request()
  };
  let (status, body) = send(&app, review()).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["review"]["status"], "pending");
  assert_eq!(body["review"]["taste"], 5);
  let review_id = body["review"]["id"].as_str().unwrap().to_string();

  let (status, _) = send(&app, review()).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (_, body) = send(&app, eligibility()).await;
  assert_eq!(body["reason"]["reason"], "already_reviewed");

  let req = test::TestRequest::post()
    .uri(&format!("/api/v1/admin/reviews/{}/moderation", review_id))
    .insert_header(("X-Staff-ID", STAFF))
    .set_json(json!({ "status": "approved" }))
    .to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["review"]["status"], "approved");
}

#[actix_web::test]
async fn admin_routes_require_staff_identity() {
  let harness = TestApp::new("uye@example.com");
  let app = init_app!(harness.state);
  let req = test::TestRequest::post()
    .uri(&format!("/api/v1/admin/orders/{}/status", Uuid::new_v4()))
    .insert_header(("X-User-ID", harness.member_id.to_string()))
    .set_json(json!({ "status": "confirmed" }))
    .to_request();
  let (status, _) = send(&app, req).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn malformed_bodies_use_the_error_shape() {
  let harness = TestApp::new("uye@example.com");
  let app = init_app!(harness.state);
  let req = test::TestRequest::post()
    .uri(&format!("/api/v1/admin/orders/{}/status", Uuid::new_v4()))
    .insert_header(("X-Staff-ID", STAFF))
    .set_json(json!({ "status": "teleported" }))
    .to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["code"], "validation_error");
  assert_eq!(body["error"], "İstek gövdesi geçersiz.");
  let shown = body["error"].as_str().unwrap();
  assert!(!shown.contains("Json deserialize error"));
  assert!(!shown.contains("teleported"));
}

#[actix_web::test]
async fn payment_callbacks_need_the_shared_secret() {
  let harness = TestApp::new("uye@example.com");
  let app = init_app!(harness.state);
  let (_, body) = send(&app, place(harness.member_id).to_request()).await;
  let order_id = body["order"]["id"].as_str().unwrap().to_string();

  let callback = |secret: Option<&str>| {
    let mut req = test::TestRequest::post()
      .uri(&format!("/api/v1/orders/{}/payment", order_id))
      .set_json(json!({ "result": "completed", "transaction_id": "txn_forged" }));
    if let Some(secret) = secret {
      req = req.insert_header(("X-Payment-Callback-Secret", secret.to_string()));
    }
    req.to_request()
  };

  let (status, body) = send(&app, callback(None)).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["code"], "unauthorized");

  let (status, _) = send(&app, callback(Some("guessed"))).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  // Nothing was recorded by the rejected callbacks.
  let req = test::TestRequest::get()
    .uri(&format!("/api/v1/orders/{}", order_id))
    .insert_header(("X-User-ID", harness.member_id.to_string()))
    .to_request();
  let (_, body) = send(&app, req).await;
  assert_eq!(body["order"]["payment_status"], "pending");
  assert!(body["order"]["payment_transaction_id"].is_null());

  let (status, body) = send(&app, callback(Some(CALLBACK_SECRET))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["order"]["payment_status"], "completed");
}
