// core/src/lifecycle/requests.rs

use chrono::{NaiveDate, Weekday};
use serde::Deserialize;
use uuid::Uuid;

use crate::model::{CategoryRatings, MealSnapshot, PaymentMethod};

#[derive(Debug, Clone, Deserialize)]
pub struct NewOrderItem {
  pub meal: MealSnapshot,
  pub quantity: i32,
  pub unit_price: i64,
  pub delivery_date: NaiveDate,
}

/// Checkout payload. Address and slot ids come from the delivery-slot
/// provider and are stored as given.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
  pub payment_method: PaymentMethod,
  #[serde(default)]
  pub discount_amount: i64,
  #[serde(default)]
  pub promo_code: Option<String>,
  #[serde(default)]
  pub promo_discount: i64,
  pub delivery_days: Vec<Weekday>,
  pub delivery_address_id: Uuid,
  pub delivery_date: NaiveDate,
  pub delivery_time_slot: String,
  pub items: Vec<NewOrderItem>,
}

/// Result pushed back by the hosted checkout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PaymentResult {
  Completed { transaction_id: String },
  Failed { reason: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
  pub order_id: Uuid,
  pub rating: i16,
  #[serde(flatten)]
  pub categories: CategoryRatings,
  #[serde(default)]
  pub comment: Option<String>,
}
