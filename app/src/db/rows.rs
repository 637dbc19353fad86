// app/src/db/rows.rs

//! Row shapes as Postgres returns them. Status columns are TEXT and are parsed
//! back into the mealbox enums; a value that does not parse is reported as
//! `StoreError::CorruptRow` instead of being guessed at.

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use mealbox::{
  Actor, CategoryRatings, MealSnapshot, Order, OrderAmounts, OrderItem, OrderStatus, PaymentMethod, PaymentStatus,
  Review, ReviewStatus, StatusHistoryEntry, StoreError,
};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

pub const ORDER_COLUMNS: &str = "id, order_number, member_id, status, payment_status, payment_method, \
  payment_transaction_id, total_amount, discount_amount, promo_discount, final_amount, promo_code, meal_count, \
  delivery_days, delivery_address_id, delivery_date, delivery_time_slot, created_at, updated_at, cancelled_at, \
  delivered_at";

pub const ITEM_COLUMNS: &str = "id, order_id, meal_id, meal_name, meal_category, calories, protein_grams, \
  carbs_grams, fat_grams, quantity, unit_price, total_price, delivery_date";

pub const HISTORY_COLUMNS: &str = "id, order_id, status, actor_kind, actor_id, note, created_at";

pub const REVIEW_COLUMNS: &str = "id, order_id, member_id, rating, taste_rating, portion_rating, freshness_rating, \
  packaging_rating, delivery_rating, comment, status, created_at, moderated_at";

fn parse_column<T>(table: &'static str, value: &str) -> Result<T, StoreError>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  value.parse::<T>().map_err(|e| StoreError::CorruptRow {
    table,
    message: e.to_string(),
  })
}

#[derive(Debug, FromRow)]
pub struct OrderRow {
  pub id: Uuid,
  pub order_number: String,
  pub member_id: Uuid,
  pub status: String,
  pub payment_status: String,
  pub payment_method: String,
  pub payment_transaction_id: Option<String>,
  pub total_amount: i64,
  pub discount_amount: i64,
  pub promo_discount: i64,
  pub final_amount: i64,
  pub promo_code: Option<String>,
  pub meal_count: i32,
  pub delivery_days: Vec<String>,
  pub delivery_address_id: Uuid,
  pub delivery_date: NaiveDate,
  pub delivery_time_slot: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub cancelled_at: Option<DateTime<Utc>>,
  pub delivered_at: Option<DateTime<Utc>>,
}

impl TryFrom<OrderRow> for Order {
  type Error = StoreError;

  fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
    let amounts = OrderAmounts {
      total_amount: row.total_amount,
      discount_amount: row.discount_amount,
      promo_discount: row.promo_discount,
      final_amount: row.final_amount,
    };
    if !amounts.is_consistent() {
      return Err(StoreError::CorruptRow {
        table: "orders",
        message: format!("inconsistent amounts for order {}", row.id),
      });
    }
    let delivery_days = row
      .delivery_days
      .iter()
      .map(|day| parse_column::<Weekday>("orders", day))
      .collect::<Result<Vec<_>, _>>()?;

    Ok(Order {
      id: row.id,
      order_number: row.order_number,
      member_id: row.member_id,
      status: parse_column::<OrderStatus>("orders", &row.status)?,
      payment_status: parse_column::<PaymentStatus>("orders", &row.payment_status)?,
      payment_method: parse_column::<PaymentMethod>("orders", &row.payment_method)?,
      payment_transaction_id: row.payment_transaction_id,
      amounts,
      promo_code: row.promo_code,
      meal_count: row.meal_count,
      delivery_days,
      delivery_address_id: row.delivery_address_id,
      delivery_date: row.delivery_date,
      delivery_time_slot: row.delivery_time_slot,
      created_at: row.created_at,
      updated_at: row.updated_at,
      cancelled_at: row.cancelled_at,
      delivered_at: row.delivered_at,
    })
  }
}

/// Weekdays are stored by their three-letter English abbreviation.
pub fn weekday_labels(days: &[Weekday]) -> Vec<String> {
  days.iter().map(|day| day.to_string()).collect()
}

#[derive(Debug, FromRow)]
pub struct OrderItemRow {
  pub id: Uuid,
  pub order_id: Uuid,
  pub meal_id: Uuid,
  pub meal_name: String,
  pub meal_category: String,
  pub calories: i32,
  pub protein_grams: f32,
  pub carbs_grams: f32,
  pub fat_grams: f32,
  pub quantity: i32,
  pub unit_price: i64,
  pub total_price: i64,
  pub delivery_date: NaiveDate,
}

impl From<OrderItemRow> for OrderItem {
  fn from(row: OrderItemRow) -> Self {
    OrderItem {
      id: row.id,
      order_id: row.order_id,
      meal: MealSnapshot {
        meal_id: row.meal_id,
        name: row.meal_name,
        category: row.meal_category,
        calories: row.calories,
        protein_grams: row.protein_grams,
        carbs_grams: row.carbs_grams,
        fat_grams: row.fat_grams,
      },
      quantity: row.quantity,
      unit_price: row.unit_price,
      total_price: row.total_price,
      delivery_date: row.delivery_date,
    }
  }
}

#[derive(Debug, FromRow)]
pub struct HistoryRow {
  pub id: Uuid,
  pub order_id: Uuid,
  pub status: String,
  pub actor_kind: String,
  pub actor_id: Option<String>,
  pub note: Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Splits an actor into its `(actor_kind, actor_id)` columns.
pub fn actor_columns(actor: &Actor) -> (&'static str, Option<String>) {
  match actor {
    Actor::Member(id) => ("member", Some(id.to_string())),
    Actor::Staff(name) => ("staff", Some(name.clone())),
    Actor::System => ("system", None),
  }
}

impl TryFrom<HistoryRow> for StatusHistoryEntry {
  type Error = StoreError;

  fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
    let corrupt = |message: String| StoreError::CorruptRow {
      table: "order_status_history",
      message,
    };
    let actor = match (row.actor_kind.as_str(), row.actor_id) {
      ("member", Some(id)) => Actor::Member(parse_column::<Uuid>("order_status_history", &id)?),
      ("staff", Some(name)) => Actor::Staff(name),
      ("system", _) => Actor::System,
      (kind, id) => return Err(corrupt(format!("unknown actor '{}' ({:?})", kind, id))),
    };
    Ok(StatusHistoryEntry {
      id: row.id,
      order_id: row.order_id,
      status: parse_column::<OrderStatus>("order_status_history", &row.status)?,
      actor,
      note: row.note,
      created_at: row.created_at,
    })
  }
}

#[derive(Debug, FromRow)]
pub struct ReviewRow {
  pub id: Uuid,
  pub order_id: Uuid,
  pub member_id: Uuid,
  pub rating: i16,
  pub taste_rating: Option<i16>,
  pub portion_rating: Option<i16>,
  pub freshness_rating: Option<i16>,
  pub packaging_rating: Option<i16>,
  pub delivery_rating: Option<i16>,
  pub comment: Option<String>,
  pub status: String,
  pub created_at: DateTime<Utc>,
  pub moderated_at: Option<DateTime<Utc>>,
}

impl TryFrom<ReviewRow> for Review {
  type Error = StoreError;

  fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
    Ok(Review {
      id: row.id,
      order_id: row.order_id,
      member_id: row.member_id,
      rating: row.rating,
      categories: CategoryRatings {
        taste: row.taste_rating,
        portion: row.portion_rating,
        freshness: row.freshness_rating,
        packaging: row.packaging_rating,
        delivery: row.delivery_rating,
      },
      comment: row.comment,
      status: parse_column::<ReviewStatus>("reviews", &row.status)?,
      created_at: row.created_at,
      moderated_at: row.moderated_at,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn weekday_labels_parse_back() {
    let days = vec![Weekday::Mon, Weekday::Wed, Weekday::Sat];
    let labels = weekday_labels(&days);
    assert_eq!(labels, vec!["Mon", "Wed", "Sat"]);
    let parsed: Vec<Weekday> = labels.iter().map(|l| parse_column("orders", l).unwrap()).collect();
    assert_eq!(parsed, days);
  }

  #[test]
  fn unknown_status_is_a_corrupt_row() {
    let row = HistoryRow {
      id: Uuid::new_v4(),
      order_id: Uuid::new_v4(),
      status: "lost".to_string(),
      actor_kind: "system".to_string(),
      actor_id: None,
      note: None,
      created_at: Utc::now(),
    };
    match StatusHistoryEntry::try_from(row) {
      Err(StoreError::CorruptRow { table, .. }) => assert_eq!(table, "order_status_history"),
      other => panic!("expected corrupt row, got {:?}", other),
    }
  }

  #[test]
  fn staff_actor_round_trips_through_columns() {
    let (kind, id) = actor_columns(&Actor::Staff("kitchen-2".to_string()));
    let row = HistoryRow {
      id: Uuid::new_v4(),
      order_id: Uuid::new_v4(),
      status: "preparing".to_string(),
      actor_kind: kind.to_string(),
      actor_id: id,
      note: None,
      created_at: Utc::now(),
    };
    let entry = StatusHistoryEntry::try_from(row).unwrap();
    assert_eq!(entry.actor, Actor::Staff("kitchen-2".to_string()));
    assert_eq!(entry.status, OrderStatus::Preparing);
  }
}
