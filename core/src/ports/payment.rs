// core/src/ports/payment.rs

use async_trait::async_trait;
use std::net::IpAddr;

/// Reversal of a completed payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundRequest {
  pub transaction_id: String,
  /// Decimal string with exactly two fraction digits, e.g. `"1000.00"`.
  pub amount: String,
  pub client_ip: IpAddr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundResponse {
  pub status_code: u16,
  pub error_message: Option<String>,
}

impl RefundResponse {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status_code)
  }
}

/// Hosted payment provider. `Err` is reserved for transport failures; a
/// declined refund comes back as a non-2xx `status_code`.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
  async fn refund(&self, request: &RefundRequest) -> anyhow::Result<RefundResponse>;
}
