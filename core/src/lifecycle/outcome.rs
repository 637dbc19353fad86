// core/src/lifecycle/outcome.rs

//! Results of lifecycle operations. Primary success and collaborator failures
//! travel together so callers can show partial-success messages.

use serde::Serialize;

use crate::error::DependencyFailure;
use crate::model::{Order, OrderItem, OrderStatus, StatusHistoryEntry};

#[derive(Debug, Clone, Serialize)]
pub struct TransitionOutcome {
  pub order: Order,
  /// `None` when the order was already in the requested status.
  pub history_entry: Option<StatusHistoryEntry>,
  pub warnings: Vec<DependencyFailure>,
}

impl TransitionOutcome {
  pub fn changed(&self) -> bool {
    self.history_entry.is_some()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefundOutcome {
  /// The gateway accepted the refund and `payment_status` is now `refunded`.
  Refunded { amount: String },
  /// No refund was recorded; `payment_status` is still `completed`.
  Failed { reason: String },
  /// The order had no completed payment.
  NotApplicable,
}

/// Two independent steps: the status change and the refund.
#[derive(Debug, Clone, Serialize)]
pub struct CancelOutcome {
  pub order: Order,
  pub history_entry: Option<StatusHistoryEntry>,
  pub refund: RefundOutcome,
  pub warnings: Vec<DependencyFailure>,
}

impl CancelOutcome {
  pub fn state_changed(&self) -> bool {
    self.history_entry.is_some()
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
  pub order: Order,
  pub items: Vec<OrderItem>,
  pub warnings: Vec<DependencyFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentOutcome {
  pub order: Order,
  /// `false` when a retried callback repeated an already recorded result.
  pub changed: bool,
  pub warnings: Vec<DependencyFailure>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum IneligibleReason {
  OrderNotFound,
  NotDelivered { status: OrderStatus },
  AlreadyReviewed,
}

impl IneligibleReason {
  /// Text shown next to the disabled review button.
  pub fn message(&self) -> &'static str {
    match self {
      IneligibleReason::OrderNotFound => "Sipariş bulunamadı.",
      IneligibleReason::NotDelivered { .. } => "Sipariş henüz teslim edilmedi.",
      IneligibleReason::AlreadyReviewed => "Bu siparişi zaten değerlendirdiniz.",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "eligibility", rename_all = "snake_case")]
pub enum ReviewEligibility {
  Eligible,
  NotEligible(IneligibleReason),
}

impl ReviewEligibility {
  pub fn is_eligible(&self) -> bool {
    matches!(self, ReviewEligibility::Eligible)
  }

  pub fn reason(&self) -> Option<IneligibleReason> {
    match self {
      ReviewEligibility::Eligible => None,
      ReviewEligibility::NotEligible(reason) => Some(*reason),
    }
  }
}
