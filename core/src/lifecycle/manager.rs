// core/src/lifecycle/manager.rs

use chrono::{DateTime, Utc};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::order_number;
use super::outcome::{
  CancelOutcome, IneligibleReason, PaymentOutcome, PlacedOrder, RefundOutcome, ReviewEligibility, TransitionOutcome,
};
use super::requests::{NewOrder, NewReview, PaymentResult};
use super::transitions::{check_transition, payment_allowed, TransitionCheck};
use crate::error::{ConflictReason, DependencyFailure, Entity, LifecycleError, LifecycleResult, StoreError};
use crate::model::{
  format_minor_units, normalize_delivery_days, Actor, Order, OrderAmounts, OrderItem, OrderStatus, PaymentStatus,
  Review, ReviewStatus, StatusHistoryEntry,
};
use crate::ports::{
  NotificationDispatcher, OrderStore, PaymentChange, PaymentGateway, RefundRequest, ReviewModeration, StatusChange,
  TemplateData, TemplateKey,
};

const MAX_ORDER_NUMBER_ATTEMPTS: usize = 3;
const MAX_REVIEW_COMMENT_CHARS: usize = 2000;

/// Owns every write to an order's status, payment status and review.
///
/// Holds no per-order state: the store's conditional updates are the only
/// guard against concurrent writers.
#[derive(Clone)]
pub struct OrderLifecycleManager {
  store: Arc<dyn OrderStore>,
  notifier: Arc<dyn NotificationDispatcher>,
  gateway: Arc<dyn PaymentGateway>,
}

impl OrderLifecycleManager {
  pub fn new(
    store: Arc<dyn OrderStore>,
    notifier: Arc<dyn NotificationDispatcher>,
    gateway: Arc<dyn PaymentGateway>,
  ) -> Self {
    Self {
      store,
      notifier,
      gateway,
    }
  }

  /// Moves an order to `target`.
  ///
  /// Asking for the status the order is already in succeeds without writing
  /// anything. Notification failures are returned as warnings.
  #[instrument(
    name = "lifecycle::transition",
    skip(self, note),
    fields(order_id = %order_id, target = %target, actor = %actor),
    err(Display)
  )]
  pub async fn transition(
    &self,
    order_id: Uuid,
    target: OrderStatus,
    actor: Actor,
    note: Option<String>,
  ) -> LifecycleResult<TransitionOutcome> {
    let order = self.load_order(order_id).await?;
    self.apply_transition(order, target, actor, note).await
  }

  /// Customer cancellation followed by a refund attempt when the order was paid.
  ///
  /// The refund runs after the status change is stored and cannot undo it. A
  /// failed refund leaves `payment_status = completed` for manual follow-up.
  #[instrument(
    name = "lifecycle::cancel",
    skip(self, reason, client_ip),
    fields(order_id = %order_id, member_id = %member_id),
    err(Display)
  )]
  pub async fn cancel(
    &self,
    order_id: Uuid,
    member_id: Uuid,
    reason: &str,
    client_ip: IpAddr,
  ) -> LifecycleResult<CancelOutcome> {
    let reason = reason.trim();
    if reason.is_empty() {
      return Err(LifecycleError::validation("reason", "Lütfen iptal nedenini belirtin."));
    }

    let order = self.load_owned_order(order_id, member_id).await?;
    let transition = self
      .apply_transition(order, OrderStatus::Cancelled, Actor::Member(member_id), Some(reason.to_string()))
      .await?;

    let mut warnings = transition.warnings;
    let (order, refund) = self.refund_if_paid(transition.order, client_ip).await;
    if let RefundOutcome::Failed { reason } = &refund {
      warn!(order_id = %order_id, refund_failure = %reason, "Order cancelled but refund was not completed.");
      warnings.push(DependencyFailure::refund(reason.clone()));
    }

    Ok(CancelOutcome {
      order,
      history_entry: transition.history_entry,
      refund,
      warnings,
    })
  }

  /// Whether `member_id` may review `order_id` right now, with the reason when not.
  #[instrument(name = "lifecycle::can_review", skip(self), err(Display))]
  pub async fn can_review(&self, order_id: Uuid, member_id: Uuid) -> LifecycleResult<ReviewEligibility> {
    let order = match self.store.find_order(order_id).await? {
      Some(order) if order.is_owned_by(member_id) => order,
      _ => return Ok(ReviewEligibility::NotEligible(IneligibleReason::OrderNotFound)),
    };
    if order.status != OrderStatus::Delivered {
      return Ok(ReviewEligibility::NotEligible(IneligibleReason::NotDelivered {
        status: order.status,
      }));
    }
    if self.store.review_for_order(order_id).await?.is_some() {
      return Ok(ReviewEligibility::NotEligible(IneligibleReason::AlreadyReviewed));
    }
    Ok(ReviewEligibility::Eligible)
  }

  /// Validates a checkout, stores the order in `pending` and sends the
  /// order-confirmation email.
  #[instrument(name = "lifecycle::place_order", skip(self, request), fields(member_id = %member_id), err(Display))]
  pub async fn place_order(&self, member_id: Uuid, request: NewOrder) -> LifecycleResult<PlacedOrder> {
    let now = Utc::now();
    let (mut order, items) = build_order(member_id, request, now)?;
    let initial_entry = history_entry(order.id, OrderStatus::Pending, Actor::Member(member_id), None, now);

    let mut attempt = 1;
    loop {
      match self.store.insert_order(&order, &items, &initial_entry).await {
        Ok(()) => break,
        Err(StoreError::UniqueViolation { constraint }) if attempt < MAX_ORDER_NUMBER_ATTEMPTS => {
          debug!(%constraint, attempt, "Order number collision, generating a new one.");
          order.order_number = order_number::generate(now);
          attempt += 1;
        }
        Err(e) => return Err(e.into()),
      }
    }
    info!(order_id = %order.id, order_number = %order.order_number, final_amount = order.amounts.final_amount, "Order placed.");

    let warnings = self
      .notify(&order, TemplateKey::OrderConfirmation, None)
      .await
      .into_iter()
      .collect();
    Ok(PlacedOrder { order, items, warnings })
  }

  /// Records the hosted-checkout result on the order.
  ///
  /// A repeated `completed` callback with the same transaction id is accepted
  /// without writing.
  #[instrument(name = "lifecycle::record_payment", skip(self, result), fields(order_id = %order_id), err(Display))]
  pub async fn record_payment(&self, order_id: Uuid, result: PaymentResult) -> LifecycleResult<PaymentOutcome> {
    let order = self.load_order(order_id).await?;
    if order.status == OrderStatus::Cancelled {
      return Err(LifecycleError::order_conflict(order_id, ConflictReason::OrderCancelled));
    }

    let (target, transaction_id, note, template) = match result {
      PaymentResult::Completed { transaction_id } => {
        let transaction_id = transaction_id.trim().to_string();
        if transaction_id.is_empty() {
          return Err(LifecycleError::validation("transaction_id", "Ödeme referansı eksik."));
        }
        (
          PaymentStatus::Completed,
          Some(transaction_id),
          None,
          TemplateKey::PaymentSuccess,
        )
      }
      PaymentResult::Failed { reason } => (
        PaymentStatus::Failed,
        None,
        Some(reason),
        TemplateKey::PaymentFailed,
      ),
    };

    if order.payment_status == PaymentStatus::Completed
      && target == PaymentStatus::Completed
      && order.payment_transaction_id == transaction_id
    {
      debug!("Payment already recorded for this transaction.");
      return Ok(PaymentOutcome {
        order,
        changed: false,
        warnings: Vec::new(),
      });
    }
    if !payment_allowed(order.payment_status, target) {
      return Err(LifecycleError::InvalidTransition {
        from: order.payment_status.to_string(),
        to: target.to_string(),
      });
    }

    let change = PaymentChange {
      order_id,
      expected: order.payment_status,
      target,
      transaction_id,
      at: Utc::now(),
    };
    let updated = self.store.update_payment(&change).await?.ok_or_else(|| {
      LifecycleError::order_conflict(
        order_id,
        ConflictReason::PaymentStatusChanged {
          expected: order.payment_status,
        },
      )
    })?;
    info!(payment_status = %updated.payment_status, "Payment result recorded.");

    let warnings = self.notify(&updated, template, note).await.into_iter().collect();
    Ok(PaymentOutcome {
      order: updated,
      changed: true,
      warnings,
    })
  }

  /// Stores a review for a delivered order of `member_id`.
  #[instrument(
    name = "lifecycle::submit_review",
    skip(self, review),
    fields(member_id = %member_id, order_id = %review.order_id),
    err(Display)
  )]
  pub async fn submit_review(&self, member_id: Uuid, review: NewReview) -> LifecycleResult<Review> {
    validate_rating("rating", review.rating)?;
    for (field, value) in review.categories.iter() {
      validate_rating(field, value)?;
    }
    let comment = review
      .comment
      .map(|text| text.trim().to_string())
      .filter(|text| !text.is_empty());
    if let Some(text) = &comment {
      if text.chars().count() > MAX_REVIEW_COMMENT_CHARS {
        return Err(LifecycleError::validation(
          "comment",
          format!("Yorum en fazla {} karakter olabilir.", MAX_REVIEW_COMMENT_CHARS),
        ));
      }
    }

    let order_id = review.order_id;
    match self.can_review(order_id, member_id).await? {
      ReviewEligibility::Eligible => {}
      ReviewEligibility::NotEligible(IneligibleReason::OrderNotFound) => {
        return Err(LifecycleError::order_not_found(order_id))
      }
      ReviewEligibility::NotEligible(IneligibleReason::NotDelivered { status }) => {
        return Err(LifecycleError::order_conflict(
          order_id,
          ConflictReason::NotDelivered { current: status },
        ))
      }
      ReviewEligibility::NotEligible(IneligibleReason::AlreadyReviewed) => {
        return Err(LifecycleError::order_conflict(order_id, ConflictReason::AlreadyReviewed))
      }
    }

    let stored = Review {
      id: Uuid::new_v4(),
      order_id,
      member_id,
      rating: review.rating,
      categories: review.categories,
      comment,
      status: ReviewStatus::Pending,
      created_at: Utc::now(),
      moderated_at: None,
    };
    match self.store.insert_review(&stored).await {
      Ok(()) => {}
      Err(StoreError::UniqueViolation { .. }) => {
        return Err(LifecycleError::order_conflict(order_id, ConflictReason::AlreadyReviewed))
      }
      Err(e) => return Err(e.into()),
    }
    info!(review_id = %stored.id, rating = stored.rating, "Review submitted.");
    Ok(stored)
  }

  /// Staff decision on a submitted review.
  #[instrument(name = "lifecycle::moderate_review", skip(self), err(Display))]
  pub async fn moderate_review(&self, review_id: Uuid, target: ReviewStatus, moderator: &str) -> LifecycleResult<Review> {
    let review = self
      .store
      .find_review(review_id)
      .await?
      .ok_or(LifecycleError::NotFound {
        entity: Entity::Review,
        id: review_id,
      })?;
    if !review.status.can_become(target) {
      return Err(LifecycleError::InvalidTransition {
        from: review.status.to_string(),
        to: target.to_string(),
      });
    }

    let change = ReviewModeration {
      review_id,
      expected: review.status,
      target,
      at: Utc::now(),
    };
    let updated = self
      .store
      .moderate_review(&change)
      .await?
      .ok_or(LifecycleError::Conflict {
        entity: Entity::Review,
        id: review_id,
        reason: ConflictReason::ReviewStatusChanged { expected: review.status },
      })?;
    info!(%moderator, status = %updated.status, "Review moderated.");
    Ok(updated)
  }

  /// Staff view of any order.
  pub async fn find_order(&self, order_id: Uuid) -> LifecycleResult<Order> {
    self.load_order(order_id).await
  }

  pub async fn order_for_member(&self, order_id: Uuid, member_id: Uuid) -> LifecycleResult<Order> {
    self.load_owned_order(order_id, member_id).await
  }

  pub async fn order_items(&self, order_id: Uuid, member_id: Uuid) -> LifecycleResult<Vec<OrderItem>> {
    self.load_owned_order(order_id, member_id).await?;
    Ok(self.store.order_items(order_id).await?)
  }

  /// Status history of an order, oldest first.
  pub async fn order_timeline(&self, order_id: Uuid, member_id: Uuid) -> LifecycleResult<Vec<StatusHistoryEntry>> {
    self.load_owned_order(order_id, member_id).await?;
    let mut entries = self.store.status_history(order_id).await?;
    entries.sort_by_key(|entry| entry.created_at);
    Ok(entries)
  }

  // --- internals ---

  async fn load_order(&self, order_id: Uuid) -> LifecycleResult<Order> {
    self
      .store
      .find_order(order_id)
      .await?
      .ok_or_else(|| LifecycleError::order_not_found(order_id))
  }

  /// Orders of other members are reported as missing.
  async fn load_owned_order(&self, order_id: Uuid, member_id: Uuid) -> LifecycleResult<Order> {
    match self.store.find_order(order_id).await? {
      Some(order) if order.is_owned_by(member_id) => Ok(order),
      Some(_) => {
        debug!(%order_id, %member_id, "Order belongs to another member.");
        Err(LifecycleError::order_not_found(order_id))
      }
      None => Err(LifecycleError::order_not_found(order_id)),
    }
  }

  async fn apply_transition(
    &self,
    order: Order,
    target: OrderStatus,
    actor: Actor,
    note: Option<String>,
  ) -> LifecycleResult<TransitionOutcome> {
    if check_transition(order.id, order.status, target)? == TransitionCheck::AlreadyThere {
      debug!(status = %order.status, "Order already in requested status, nothing to do.");
      return Ok(TransitionOutcome {
        order,
        history_entry: None,
        warnings: Vec::new(),
      });
    }

    let now = Utc::now();
    let note = note.map(|text| text.trim().to_string()).filter(|text| !text.is_empty());
    let entry = history_entry(order.id, target, actor, note.clone(), now);
    let change = StatusChange {
      order_id: order.id,
      expected: order.status,
      target,
      entry: entry.clone(),
      cancelled_at: (target == OrderStatus::Cancelled).then_some(now),
      delivered_at: (target == OrderStatus::Delivered).then_some(now),
      at: now,
    };

    let updated = match self.store.apply_transition(&change).await? {
      Some(updated) => updated,
      None => {
        warn!(expected = %order.status, "Order status changed before the update was applied.");
        return Err(LifecycleError::order_conflict(
          order.id,
          ConflictReason::StatusChanged { expected: order.status },
        ));
      }
    };
    info!(from = %order.status, to = %updated.status, "Order status changed.");

    let warnings = match TemplateKey::for_status(target) {
      Some(template) => self.notify(&updated, template, note).await.into_iter().collect(),
      None => Vec::new(),
    };
    Ok(TransitionOutcome {
      order: updated,
      history_entry: Some(entry),
      warnings,
    })
  }

  /// Issues at most one refund for a completed payment. Never fails the caller.
  async fn refund_if_paid(&self, order: Order, client_ip: IpAddr) -> (Order, RefundOutcome) {
    if order.payment_status != PaymentStatus::Completed {
      return (order, RefundOutcome::NotApplicable);
    }
    let Some(transaction_id) = order.payment_transaction_id.clone() else {
      return (
        order,
        RefundOutcome::Failed {
          reason: "completed payment has no transaction reference".to_string(),
        },
      );
    };

    let request = RefundRequest {
      transaction_id,
      amount: format_minor_units(order.amounts.final_amount),
      client_ip,
    };
    info!(amount = %request.amount, "Requesting refund.");
    let response = match self.gateway.refund(&request).await {
      Ok(response) => response,
      Err(e) => {
        return (
          order,
          RefundOutcome::Failed {
            reason: format!("gateway unreachable: {}", e),
          },
        )
      }
    };
    if !response.is_success() {
      let reason = response
        .error_message
        .unwrap_or_else(|| format!("gateway returned status {}", response.status_code));
      return (order, RefundOutcome::Failed { reason });
    }

    let change = PaymentChange {
      order_id: order.id,
      expected: PaymentStatus::Completed,
      target: PaymentStatus::Refunded,
      transaction_id: None,
      at: Utc::now(),
    };
    match self.store.update_payment(&change).await {
      Ok(Some(updated)) => (updated, RefundOutcome::Refunded { amount: request.amount }),
      Ok(None) => (
        order,
        RefundOutcome::Failed {
          reason: "refund accepted by gateway but payment status changed before it was recorded".to_string(),
        },
      ),
      Err(e) => (
        order,
        RefundOutcome::Failed {
          reason: format!("refund accepted by gateway but could not be recorded: {}", e),
        },
      ),
    }
  }

  /// Best-effort email to the order's member.
  async fn notify(&self, order: &Order, template: TemplateKey, note: Option<String>) -> Option<DependencyFailure> {
    let recipient = match self.store.member_email(order.member_id).await {
      Ok(Some(email)) => email,
      Ok(None) => {
        warn!(member_id = %order.member_id, %template, "No registered email, notification skipped.");
        return Some(DependencyFailure::notification("member has no registered email"));
      }
      Err(e) => {
        warn!(error = %e, %template, "Email lookup failed, notification skipped.");
        return Some(DependencyFailure::notification(format!("email lookup failed: {}", e)));
      }
    };

    let data = TemplateData {
      order_number: order.order_number.clone(),
      status: order.status.to_string(),
      final_amount: format_minor_units(order.amounts.final_amount),
      note,
    };
    let report = self.notifier.dispatch(&recipient, template, &data).await;
    if report.delivered {
      debug!(%template, message_id = ?report.message_id, "Notification sent.");
      None
    } else {
      let message = report.error.unwrap_or_else(|| "dispatcher reported failure".to_string());
      warn!(%template, error = %message, "Notification failed.");
      Some(DependencyFailure::notification(message))
    }
  }
}

fn history_entry(
  order_id: Uuid,
  status: OrderStatus,
  actor: Actor,
  note: Option<String>,
  at: DateTime<Utc>,
) -> StatusHistoryEntry {
  StatusHistoryEntry {
    id: Uuid::new_v4(),
    order_id,
    status,
    actor,
    note,
    created_at: at,
  }
}

fn validate_rating(field: &'static str, value: i16) -> LifecycleResult<()> {
  if (1..=5).contains(&value) {
    Ok(())
  } else {
    Err(LifecycleError::validation(field, "Puan 1 ile 5 arasında olmalıdır."))
  }
}

/// Turns a checkout payload into an order and its items.
fn build_order(member_id: Uuid, request: NewOrder, now: DateTime<Utc>) -> LifecycleResult<(Order, Vec<OrderItem>)> {
  if request.items.is_empty() {
    return Err(LifecycleError::validation("items", "Sepetiniz boş."));
  }
  let delivery_days = normalize_delivery_days(&request.delivery_days);
  if delivery_days.is_empty() {
    return Err(LifecycleError::validation("delivery_days", "En az bir teslimat günü seçmelisiniz."));
  }
  let delivery_time_slot = request.delivery_time_slot.trim().to_string();
  if delivery_time_slot.is_empty() {
    return Err(LifecycleError::validation("delivery_time_slot", "Teslimat saat aralığı seçmelisiniz."));
  }
  let promo_code = request
    .promo_code
    .map(|code| code.trim().to_uppercase())
    .filter(|code| !code.is_empty());
  if request.promo_discount > 0 && promo_code.is_none() {
    return Err(LifecycleError::validation("promo_code", "Promosyon indirimi için kod gereklidir."));
  }

  let order_id = Uuid::new_v4();
  let mut total_amount: i64 = 0;
  let mut meal_count: i32 = 0;
  let mut items = Vec::with_capacity(request.items.len());
  for item in request.items {
    if item.quantity < 1 {
      return Err(LifecycleError::validation("quantity", "Adet en az 1 olmalıdır."));
    }
    if item.unit_price < 0 {
      return Err(LifecycleError::validation("unit_price", "Birim fiyat negatif olamaz."));
    }
    if item.meal.name.trim().is_empty() {
      return Err(LifecycleError::validation("meal", "Yemek bilgisi eksik."));
    }
    let overflow = || LifecycleError::validation("items", "Sipariş tutarı hesaplanamadı.");
    let total_price = item
      .unit_price
      .checked_mul(i64::from(item.quantity))
      .ok_or_else(overflow)?;
    total_amount = total_amount.checked_add(total_price).ok_or_else(overflow)?;
    meal_count = meal_count.checked_add(item.quantity).ok_or_else(overflow)?;
    items.push(OrderItem {
      id: Uuid::new_v4(),
      order_id,
      meal: item.meal,
      quantity: item.quantity,
      unit_price: item.unit_price,
      total_price,
      delivery_date: item.delivery_date,
    });
  }

  let amounts = OrderAmounts::new(total_amount, request.discount_amount, request.promo_discount)?;
  let order = Order {
    id: order_id,
    order_number: order_number::generate(now),
    member_id,
    status: OrderStatus::Pending,
    payment_status: PaymentStatus::Pending,
    payment_method: request.payment_method,
    payment_transaction_id: None,
    amounts,
    promo_code,
    meal_count,
    delivery_days,
    delivery_address_id: request.delivery_address_id,
    delivery_date: request.delivery_date,
    delivery_time_slot,
    created_at: now,
    updated_at: now,
    cancelled_at: None,
    delivered_at: None,
  };
  Ok((order, items))
}
