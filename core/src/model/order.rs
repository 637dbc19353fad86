// core/src/model/order.rs

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::LifecycleError;

/// Fulfilment status of an order. Labels are part of the public contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Confirmed,
  Preparing,
  Ready,
  Shipped,
  Delivered,
  Cancelled,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 7] = [
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Preparing,
    OrderStatus::Ready,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
    OrderStatus::Cancelled,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Confirmed => "confirmed",
      OrderStatus::Preparing => "preparing",
      OrderStatus::Ready => "ready",
      OrderStatus::Shipped => "shipped",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Cancelled => "cancelled",
    }
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseStatusError {
  pub kind: &'static str,
  pub value: String,
}

impl FromStr for OrderStatus {
  type Err = ParseStatusError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    OrderStatus::ALL
      .iter()
      .copied()
      .find(|status| status.as_str() == s)
      .ok_or_else(|| ParseStatusError {
        kind: "order status",
        value: s.to_string(),
      })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
  Pending,
  Completed,
  Failed,
  Refunded,
}

impl PaymentStatus {
  pub const ALL: [PaymentStatus; 4] = [
    PaymentStatus::Pending,
    PaymentStatus::Completed,
    PaymentStatus::Failed,
    PaymentStatus::Refunded,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentStatus::Pending => "pending",
      PaymentStatus::Completed => "completed",
      PaymentStatus::Failed => "failed",
      PaymentStatus::Refunded => "refunded",
    }
  }
}

impl fmt::Display for PaymentStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for PaymentStatus {
  type Err = ParseStatusError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    PaymentStatus::ALL
      .iter()
      .copied()
      .find(|status| status.as_str() == s)
      .ok_or_else(|| ParseStatusError {
        kind: "payment status",
        value: s.to_string(),
      })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
  Card,
  BankTransfer,
  CashOnDelivery,
}

impl PaymentMethod {
  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentMethod::Card => "card",
      PaymentMethod::BankTransfer => "bank_transfer",
      PaymentMethod::CashOnDelivery => "cash_on_delivery",
    }
  }
}

impl FromStr for PaymentMethod {
  type Err = ParseStatusError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "card" => Ok(PaymentMethod::Card),
      "bank_transfer" => Ok(PaymentMethod::BankTransfer),
      "cash_on_delivery" => Ok(PaymentMethod::CashOnDelivery),
      other => Err(ParseStatusError {
        kind: "payment method",
        value: other.to_string(),
      }),
    }
  }
}

/// Monetary fields of an order, in minor units.
///
/// Invariant: `final_amount = total_amount - discount_amount - promo_discount`, all >= 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAmounts {
  pub total_amount: i64,
  pub discount_amount: i64,
  pub promo_discount: i64,
  pub final_amount: i64,
}

impl OrderAmounts {
  pub fn new(total_amount: i64, discount_amount: i64, promo_discount: i64) -> Result<Self, LifecycleError> {
    if total_amount < 0 {
      return Err(LifecycleError::validation("total_amount", "Sipariş tutarı negatif olamaz."));
    }
    if discount_amount < 0 || promo_discount < 0 {
      return Err(LifecycleError::validation("discount_amount", "İndirim tutarı negatif olamaz."));
    }
    let final_amount = total_amount
      .checked_sub(discount_amount)
      .and_then(|rest| rest.checked_sub(promo_discount))
      .filter(|amount| *amount >= 0)
      .ok_or_else(|| LifecycleError::validation("promo_discount", "İndirimler sipariş tutarını aşamaz."))?;
    Ok(Self {
      total_amount,
      discount_amount,
      promo_discount,
      final_amount,
    })
  }

  pub fn is_consistent(&self) -> bool {
    self.total_amount >= 0
      && self.discount_amount >= 0
      && self.promo_discount >= 0
      && self.final_amount >= 0
      && self
        .total_amount
        .checked_sub(self.discount_amount)
        .and_then(|rest| rest.checked_sub(self.promo_discount))
        == Some(self.final_amount)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
  pub id: Uuid,
  pub order_number: String,
  pub member_id: Uuid,
  pub status: OrderStatus,
  pub payment_status: PaymentStatus,
  pub payment_method: PaymentMethod,
  /// Gateway reference of the completed payment; needed to refund it.
  pub payment_transaction_id: Option<String>,
  #[serde(flatten)]
  pub amounts: OrderAmounts,
  pub promo_code: Option<String>,
  pub meal_count: i32,
  pub delivery_days: Vec<Weekday>,
  pub delivery_address_id: Uuid,
  pub delivery_date: NaiveDate,
  pub delivery_time_slot: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub cancelled_at: Option<DateTime<Utc>>,
  pub delivered_at: Option<DateTime<Utc>>,
}

impl Order {
  pub fn is_owned_by(&self, member_id: Uuid) -> bool {
    self.member_id == member_id
  }
}

/// Sorts weekdays Monday-first and drops duplicates.
pub fn normalize_delivery_days(days: &[Weekday]) -> Vec<Weekday> {
  let mut normalized: Vec<Weekday> = days.to_vec();
  normalized.sort_by_key(|day| day.num_days_from_monday());
  normalized.dedup();
  normalized
}
