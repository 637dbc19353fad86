// core/src/ports/notify.rs

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

use crate::model::OrderStatus;

/// Email templates the dispatcher knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateKey {
  OrderConfirmation,
  OrderConfirmed,
  OrderPreparing,
  OrderShipped,
  OrderDelivered,
  OrderCancelled,
  PaymentSuccess,
  PaymentFailed,
}

impl TemplateKey {
  pub fn as_str(&self) -> &'static str {
    match self {
      TemplateKey::OrderConfirmation => "order-confirmation",
      TemplateKey::OrderConfirmed => "order-confirmed",
      TemplateKey::OrderPreparing => "order-preparing",
      TemplateKey::OrderShipped => "order-shipped",
      TemplateKey::OrderDelivered => "order-delivered",
      TemplateKey::OrderCancelled => "order-cancelled",
      TemplateKey::PaymentSuccess => "payment-success",
      TemplateKey::PaymentFailed => "payment-failed",
    }
  }

  /// Template announcing a move into `status`. `pending` is covered by
  /// `order-confirmation` at placement time and `ready` has no customer email.
  pub fn for_status(status: OrderStatus) -> Option<TemplateKey> {
    match status {
      OrderStatus::Confirmed => Some(TemplateKey::OrderConfirmed),
      OrderStatus::Preparing => Some(TemplateKey::OrderPreparing),
      OrderStatus::Shipped => Some(TemplateKey::OrderShipped),
      OrderStatus::Delivered => Some(TemplateKey::OrderDelivered),
      OrderStatus::Cancelled => Some(TemplateKey::OrderCancelled),
      OrderStatus::Pending | OrderStatus::Ready => None,
    }
  }
}

impl fmt::Display for TemplateKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Values a template can interpolate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateData {
  pub order_number: String,
  pub status: String,
  pub final_amount: String,
  pub note: Option<String>,
}

/// Outcome of a dispatch attempt. Dispatchers report failure here instead of
/// returning an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
  pub delivered: bool,
  pub message_id: Option<String>,
  pub error: Option<String>,
}

impl DispatchReport {
  pub fn sent(message_id: impl Into<String>) -> Self {
    Self {
      delivered: true,
      message_id: Some(message_id.into()),
      error: None,
    }
  }

  pub fn failed(error: impl Into<String>) -> Self {
    Self {
      delivered: false,
      message_id: None,
      error: Some(error.into()),
    }
  }
}

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
  async fn dispatch(&self, recipient_email: &str, template: TemplateKey, data: &TemplateData) -> DispatchReport;
}
