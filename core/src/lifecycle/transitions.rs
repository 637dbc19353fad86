// core/src/lifecycle/transitions.rs

//! The legal-transition tables for order and payment status.

use uuid::Uuid;

use crate::error::{ConflictReason, LifecycleError};
use crate::model::{OrderStatus, PaymentStatus};

/// Statuses reachable in one step from `from`. Terminal states map to `&[]`.
pub fn allowed_next(from: OrderStatus) -> &'static [OrderStatus] {
  use OrderStatus::*;
  match from {
    Pending => &[Confirmed, Cancelled],
    Confirmed => &[Preparing, Cancelled],
    Preparing => &[Ready],
    Ready => &[Shipped],
    Shipped => &[Delivered],
    Delivered | Cancelled => &[],
  }
}

pub fn is_terminal(status: OrderStatus) -> bool {
  allowed_next(status).is_empty()
}

/// Whether a customer may still cancel an order in `status`.
pub fn is_cancellable(status: OrderStatus) -> bool {
  allowed_next(status).contains(&OrderStatus::Cancelled)
}

/// What the manager should do for a requested move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCheck {
  /// Write the new status.
  Apply,
  /// The order is already in the requested status; nothing to write.
  AlreadyThere,
}

/// Validates `from -> to` for the order `order_id`.
///
/// A repeated request for the current status is satisfied without writing,
/// except for `cancelled`: cancelling twice is a conflict. Cancelling past
/// `confirmed` is also a conflict, not an invalid transition.
pub fn check_transition(order_id: Uuid, from: OrderStatus, to: OrderStatus) -> Result<TransitionCheck, LifecycleError> {
  if to == OrderStatus::Cancelled {
    return if is_cancellable(from) {
      Ok(TransitionCheck::Apply)
    } else {
      Err(LifecycleError::order_conflict(
        order_id,
        ConflictReason::NotCancellable { current: from },
      ))
    };
  }
  if from == to {
    return Ok(TransitionCheck::AlreadyThere);
  }
  if allowed_next(from).contains(&to) {
    Ok(TransitionCheck::Apply)
  } else {
    Err(LifecycleError::InvalidTransition {
      from: from.to_string(),
      to: to.to_string(),
    })
  }
}

/// Payment-status moves. `completed -> refunded` is only taken by the refund
/// step of a cancellation.
pub fn payment_allowed(from: PaymentStatus, to: PaymentStatus) -> bool {
  use PaymentStatus::*;
  matches!(
    (from, to),
    (Pending, Completed) | (Pending, Failed) | (Failed, Completed) | (Failed, Failed) | (Completed, Refunded)
  )
}
