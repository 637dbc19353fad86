//! The order state machine and the manager that applies it.

pub mod manager;
pub mod order_number;
pub mod outcome;
pub mod requests;
pub mod transitions;

pub use manager::OrderLifecycleManager;
pub use outcome::{
  CancelOutcome, IneligibleReason, PaymentOutcome, PlacedOrder, RefundOutcome, ReviewEligibility, TransitionOutcome,
};
pub use requests::{NewOrder, NewOrderItem, NewReview, PaymentResult};
pub use transitions::{allowed_next, check_transition, is_cancellable, is_terminal, payment_allowed, TransitionCheck};
