// core/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;
use uuid::Uuid;

use crate::model::{OrderStatus, PaymentStatus, ReviewStatus};

/// Failures a lifecycle operation can abort with.
///
/// `Display` is the operator-facing text that ends up in logs. The text shown to
/// customers comes from [`LifecycleError::user_message`].
#[derive(Debug, Error)]
pub enum LifecycleError {
  #[error("{entity} not found: {id}")]
  NotFound { entity: Entity, id: Uuid },

  #[error("Invalid transition from '{from}' to '{to}'")]
  InvalidTransition { from: String, to: String },

  #[error("Conflict on {entity} {id}: {reason}")]
  Conflict {
    entity: Entity,
    id: Uuid,
    reason: ConflictReason,
  },

  #[error("Validation failed for '{field}': {message}")]
  Validation { field: &'static str, message: String },

  #[error("Store error: {source}")]
  Store {
    #[from]
    source: StoreError,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
  Order,
  Review,
}

impl std::fmt::Display for Entity {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Entity::Order => f.write_str("order"),
      Entity::Review => f.write_str("review"),
    }
  }
}

/// Why a state precondition did not hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictReason {
  /// Cancellation requested while the order is past `confirmed`.
  NotCancellable { current: OrderStatus },
  /// The stored status moved between load and compare-and-set.
  StatusChanged { expected: OrderStatus },
  /// The stored payment status moved between load and update.
  PaymentStatusChanged { expected: PaymentStatus },
  /// The stored review status moved between load and update.
  ReviewStatusChanged { expected: ReviewStatus },
  /// Reviews are only accepted for delivered orders.
  NotDelivered { current: OrderStatus },
  /// A review already exists for the order.
  AlreadyReviewed,
  /// Payment changes are frozen on cancelled orders.
  OrderCancelled,
}

impl std::fmt::Display for ConflictReason {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ConflictReason::NotCancellable { current } => write!(f, "order in status '{}' cannot be cancelled", current),
      ConflictReason::StatusChanged { expected } => {
        write!(f, "status is no longer '{}', concurrent update detected", expected)
      }
      ConflictReason::PaymentStatusChanged { expected } => {
        write!(f, "payment status is no longer '{}', concurrent update detected", expected)
      }
      ConflictReason::ReviewStatusChanged { expected } => {
        write!(f, "review status is no longer '{}', concurrent update detected", expected)
      }
      ConflictReason::NotDelivered { current } => write!(f, "order in status '{}' is not delivered yet", current),
      ConflictReason::AlreadyReviewed => f.write_str("order already has a review"),
      ConflictReason::OrderCancelled => f.write_str("order is cancelled"),
    }
  }
}

impl LifecycleError {
  pub fn order_not_found(id: Uuid) -> Self {
    LifecycleError::NotFound {
      entity: Entity::Order,
      id,
    }
  }

  pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
    LifecycleError::Validation {
      field,
      message: message.into(),
    }
  }

  pub fn order_conflict(id: Uuid, reason: ConflictReason) -> Self {
    LifecycleError::Conflict {
      entity: Entity::Order,
      id,
      reason,
    }
  }

  /// Short machine-readable code, used as the `code` field of API errors.
  pub fn code(&self) -> &'static str {
    match self {
      LifecycleError::NotFound { .. } => "not_found",
      LifecycleError::InvalidTransition { .. } => "invalid_transition",
      LifecycleError::Conflict { .. } => "conflict",
      LifecycleError::Validation { .. } => "validation_error",
      LifecycleError::Store { .. } => "store_error",
    }
  }

  /// Message in the storefront's display language (Turkish).
  pub fn user_message(&self) -> String {
    match self {
      LifecycleError::NotFound { entity: Entity::Order, .. } => "Sipariş bulunamadı.".to_string(),
      LifecycleError::NotFound { entity: Entity::Review, .. } => "Değerlendirme bulunamadı.".to_string(),
      LifecycleError::InvalidTransition { .. } => "Bu durum değişikliği yapılamaz.".to_string(),
      LifecycleError::Conflict { reason, .. } => match reason {
        ConflictReason::NotCancellable { .. } => {
          "Siparişiniz hazırlanmaya başladığı için iptal edilemez.".to_string()
        }
        ConflictReason::StatusChanged { .. }
        | ConflictReason::PaymentStatusChanged { .. }
        | ConflictReason::ReviewStatusChanged { .. } => {
          "Kayıt siz işlem yaparken değişti. Lütfen sayfayı yenileyin.".to_string()
        }
        ConflictReason::NotDelivered { .. } => "Sipariş henüz teslim edilmedi.".to_string(),
        ConflictReason::AlreadyReviewed => "Bu siparişi zaten değerlendirdiniz.".to_string(),
        ConflictReason::OrderCancelled => "İptal edilmiş sipariş için ödeme işlemi yapılamaz.".to_string(),
      },
      LifecycleError::Validation { message, .. } => message.clone(),
      LifecycleError::Store { .. } => "İşlem şu anda gerçekleştirilemiyor. Lütfen daha sonra tekrar deneyin.".to_string(),
    }
  }
}

/// Errors raised by [`crate::ports::OrderStore`] implementations.
#[derive(Debug, Error)]
pub enum StoreError {
  /// A unique constraint rejected the write (duplicate order number or review).
  #[error("Unique constraint violated: {constraint}")]
  UniqueViolation { constraint: String },

  /// A stored value could not be mapped back into the domain model.
  #[error("Corrupt row in '{table}': {message}")]
  CorruptRow { table: &'static str, message: String },

  #[error("Backend failure: {source}")]
  Backend {
    #[source]
    source: AnyhowError,
  },
}

impl From<AnyhowError> for StoreError {
  fn from(err: AnyhowError) -> Self {
    StoreError::Backend { source: err }
  }
}

/// Which collaborator a [`DependencyFailure`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dependency {
  Notification,
  Refund,
}

/// A collaborator call that failed after the primary operation succeeded.
///
/// Never aborts an operation; it is logged and returned next to the result.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize)]
#[error("{dependency:?} failed: {message}")]
pub struct DependencyFailure {
  pub dependency: Dependency,
  pub message: String,
}

impl DependencyFailure {
  pub fn notification(message: impl Into<String>) -> Self {
    Self {
      dependency: Dependency::Notification,
      message: message.into(),
    }
  }

  pub fn refund(message: impl Into<String>) -> Self {
    Self {
      dependency: Dependency::Refund,
      message: message.into(),
    }
  }

  /// Partial-success text for the UI.
  pub fn user_message(&self) -> &'static str {
    match self.dependency {
      Dependency::Notification => "İşlem tamamlandı ancak bildirim gönderilemedi.",
      Dependency::Refund => "İşlem tamamlandı ancak iade başlatılamadı; ekibimiz sizinle iletişime geçecek.",
    }
  }
}

pub type LifecycleResult<T, E = LifecycleError> = std::result::Result<T, E>;
