// core/src/model/order_item.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Meal data copied onto the item at order time so later menu edits do not
/// rewrite past orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealSnapshot {
  pub meal_id: Uuid,
  pub name: String,
  pub category: String,
  pub calories: i32,
  pub protein_grams: f32,
  pub carbs_grams: f32,
  pub fat_grams: f32,
}

/// Immutable once written, created in the same unit as its order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub meal: MealSnapshot,
  pub quantity: i32,
  pub unit_price: i64,
  pub total_price: i64,
  pub delivery_date: NaiveDate,
}
