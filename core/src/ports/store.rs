// core/src/ports/store.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{Order, OrderItem, OrderStatus, PaymentStatus, Review, ReviewStatus, StatusHistoryEntry};

/// Compare-and-set of `Order.status` plus the history row that records it.
///
/// Implementations must apply the status update, the timestamp columns and the
/// history insert as one atomic unit, and only when the stored status still
/// equals `expected`.
#[derive(Debug, Clone)]
pub struct StatusChange {
  pub order_id: Uuid,
  pub expected: OrderStatus,
  pub target: OrderStatus,
  pub entry: StatusHistoryEntry,
  pub cancelled_at: Option<DateTime<Utc>>,
  pub delivered_at: Option<DateTime<Utc>>,
  pub at: DateTime<Utc>,
}

/// Conditional update of `Order.payment_status`.
#[derive(Debug, Clone)]
pub struct PaymentChange {
  pub order_id: Uuid,
  pub expected: PaymentStatus,
  pub target: PaymentStatus,
  /// Written only when `Some`; an existing reference is otherwise kept.
  pub transaction_id: Option<String>,
  pub at: DateTime<Utc>,
}

/// Conditional update of `Review.status`.
#[derive(Debug, Clone)]
pub struct ReviewModeration {
  pub review_id: Uuid,
  pub expected: ReviewStatus,
  pub target: ReviewStatus,
  pub at: DateTime<Utc>,
}

/// Row access for orders, items, history, reviews and member contact data.
#[async_trait]
pub trait OrderStore: Send + Sync {
  /// Inserts an order with its items and first history row in one unit.
  async fn insert_order(
    &self,
    order: &Order,
    items: &[OrderItem],
    initial_entry: &StatusHistoryEntry,
  ) -> Result<(), StoreError>;

  async fn find_order(&self, order_id: Uuid) -> Result<Option<Order>, StoreError>;

  async fn order_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>, StoreError>;

  /// History rows in insertion order.
  async fn status_history(&self, order_id: Uuid) -> Result<Vec<StatusHistoryEntry>, StoreError>;

  /// Returns the updated order, or `None` when the stored status no longer
  /// matches `change.expected` (nothing is written in that case).
  async fn apply_transition(&self, change: &StatusChange) -> Result<Option<Order>, StoreError>;

  /// Returns the updated order, or `None` when the stored payment status no
  /// longer matches `change.expected`.
  async fn update_payment(&self, change: &PaymentChange) -> Result<Option<Order>, StoreError>;

  async fn member_email(&self, member_id: Uuid) -> Result<Option<String>, StoreError>;

  async fn find_review(&self, review_id: Uuid) -> Result<Option<Review>, StoreError>;

  async fn review_for_order(&self, order_id: Uuid) -> Result<Option<Review>, StoreError>;

  /// Fails with [`StoreError::UniqueViolation`] when the order already has a review.
  async fn insert_review(&self, review: &Review) -> Result<(), StoreError>;

  async fn moderate_review(&self, change: &ReviewModeration) -> Result<Option<Review>, StoreError>;
}
