// core/src/store/memory.rs

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{Order, OrderItem, Review, StatusHistoryEntry};
use crate::ports::{OrderStore, PaymentChange, ReviewModeration, StatusChange};

#[derive(Debug, Default)]
struct Tables {
  orders: HashMap<Uuid, Order>,
  order_numbers: HashSet<String>,
  items: HashMap<Uuid, Vec<OrderItem>>,
  history: HashMap<Uuid, Vec<StatusHistoryEntry>>,
  reviews: HashMap<Uuid, Review>,
  review_by_order: HashMap<Uuid, Uuid>,
  member_emails: HashMap<Uuid, String>,
}

/// Process-local [`OrderStore`].
///
/// Every write takes the single write lock, so a compare-and-set and its
/// history row are applied together. The lock is never held across `.await`.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
  tables: RwLock<Tables>,
}

impl InMemoryOrderStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers the email address notifications for `member_id` go to.
  pub fn register_member(&self, member_id: Uuid, email: impl Into<String>) {
    self.tables.write().member_emails.insert(member_id, email.into());
  }

  pub fn order_count(&self) -> usize {
    self.tables.read().orders.len()
  }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
  #[instrument(name = "memory_store::insert_order", skip_all, fields(order_id = %order.id))]
  async fn insert_order(
    &self,
    order: &Order,
    items: &[OrderItem],
    initial_entry: &StatusHistoryEntry,
  ) -> Result<(), StoreError> {
    let mut tables = self.tables.write();
    if tables.orders.contains_key(&order.id) {
      return Err(StoreError::UniqueViolation {
        constraint: "orders_pkey".to_string(),
      });
    }
    if !tables.order_numbers.insert(order.order_number.clone()) {
      return Err(StoreError::UniqueViolation {
        constraint: "orders_order_number_key".to_string(),
      });
    }
    tables.orders.insert(order.id, order.clone());
    tables.items.insert(order.id, items.to_vec());
    tables.history.insert(order.id, vec![initial_entry.clone()]);
    debug!(items = items.len(), "Order inserted.");
    Ok(())
  }

  async fn find_order(&self, order_id: Uuid) -> Result<Option<Order>, StoreError> {
    Ok(self.tables.read().orders.get(&order_id).cloned())
  }

  async fn order_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>, StoreError> {
    Ok(self.tables.read().items.get(&order_id).cloned().unwrap_or_default())
  }

  async fn status_history(&self, order_id: Uuid) -> Result<Vec<StatusHistoryEntry>, StoreError> {
    Ok(self.tables.read().history.get(&order_id).cloned().unwrap_or_default())
  }

  #[instrument(name = "memory_store::apply_transition", skip_all, fields(order_id = %change.order_id, target = %change.target))]
  async fn apply_transition(&self, change: &StatusChange) -> Result<Option<Order>, StoreError> {
    let mut tables = self.tables.write();
    let updated = match tables.orders.get_mut(&change.order_id) {
      Some(order) if order.status == change.expected => {
        order.status = change.target;
        order.updated_at = change.at;
        if change.cancelled_at.is_some() {
          order.cancelled_at = change.cancelled_at;
        }
        if change.delivered_at.is_some() {
          order.delivered_at = change.delivered_at;
        }
        order.clone()
      }
      _ => return Ok(None),
    };
    tables
      .history
      .entry(change.order_id)
      .or_default()
      .push(change.entry.clone());
    Ok(Some(updated))
  }

  async fn update_payment(&self, change: &PaymentChange) -> Result<Option<Order>, StoreError> {
    let mut tables = self.tables.write();
    match tables.orders.get_mut(&change.order_id) {
      Some(order) if order.payment_status == change.expected => {
        order.payment_status = change.target;
        order.updated_at = change.at;
        if let Some(transaction_id) = &change.transaction_id {
          order.payment_transaction_id = Some(transaction_id.clone());
        }
        Ok(Some(order.clone()))
      }
      _ => Ok(None),
    }
  }

  async fn member_email(&self, member_id: Uuid) -> Result<Option<String>, StoreError> {
    Ok(self.tables.read().member_emails.get(&member_id).cloned())
  }

  async fn find_review(&self, review_id: Uuid) -> Result<Option<Review>, StoreError> {
    Ok(self.tables.read().reviews.get(&review_id).cloned())
  }

  async fn review_for_order(&self, order_id: Uuid) -> Result<Option<Review>, StoreError> {
    let tables = self.tables.read();
    Ok(
      tables
        .review_by_order
        .get(&order_id)
        .and_then(|review_id| tables.reviews.get(review_id))
        .cloned(),
    )
  }

  async fn insert_review(&self, review: &Review) -> Result<(), StoreError> {
    let mut tables = self.tables.write();
    if tables.review_by_order.contains_key(&review.order_id) {
      return Err(StoreError::UniqueViolation {
        constraint: "reviews_order_id_key".to_string(),
      });
    }
    tables.review_by_order.insert(review.order_id, review.id);
    tables.reviews.insert(review.id, review.clone());
    Ok(())
  }

  async fn moderate_review(&self, change: &ReviewModeration) -> Result<Option<Review>, StoreError> {
    let mut tables = self.tables.write();
    match tables.reviews.get_mut(&change.review_id) {
      Some(review) if review.status == change.expected => {
        review.status = change.target;
        review.moderated_at = Some(change.at);
        Ok(Some(review.clone()))
      }
      _ => Ok(None),
    }
  }
}
