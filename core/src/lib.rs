// src/lib.rs

//! Mealbox: order lifecycle rules for a meal-subscription storefront.
//!
//! The crate covers:
//!  - The order status machine (`pending -> confirmed -> preparing -> ready ->
//!    shipped -> delivered`, with `cancelled` reachable from `pending` and
//!    `confirmed`) as one static table.
//!  - Customer cancellation with a decoupled refund attempt.
//!  - Payment result recording, review eligibility, review submission and moderation.
//!  - Collaborator traits (`OrderStore`, `NotificationDispatcher`,
//!    `PaymentGateway`) and an in-memory store.
//!
//! Collaborator failures after a successful write never turn into errors; they
//! come back as [`DependencyFailure`] warnings next to the result.

pub mod error;
pub mod lifecycle;
pub mod model;
pub mod ports;
pub mod store;

// --- Re-exports for the Public API ---

pub use crate::error::{
  ConflictReason, Dependency, DependencyFailure, Entity, LifecycleError, LifecycleResult, StoreError,
};
pub use crate::lifecycle::{
  CancelOutcome, IneligibleReason, NewOrder, NewOrderItem, NewReview, OrderLifecycleManager, PaymentOutcome,
  PaymentResult, PlacedOrder, RefundOutcome, ReviewEligibility, TransitionOutcome,
};
pub use crate::model::{
  Actor, CategoryRatings, MealSnapshot, Order, OrderAmounts, OrderItem, OrderStatus, PaymentMethod, PaymentStatus,
  Review, ReviewStatus, StatusHistoryEntry,
};
pub use crate::ports::{
  DispatchReport, NotificationDispatcher, OrderStore, PaymentGateway, RefundRequest, RefundResponse, TemplateData,
  TemplateKey,
};
pub use crate::store::InMemoryOrderStore;
