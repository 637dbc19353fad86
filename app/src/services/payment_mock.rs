// app/src/services/payment_mock.rs
use async_trait::async_trait;
use mealbox::{PaymentGateway, RefundRequest, RefundResponse};
use tracing::{info, instrument};

/// Stand-in for the hosted payment provider's refund endpoint.
///
/// Transaction ids starting with `declined_` get a 402 back and ids starting
/// with `unreachable_` fail at the transport level.
#[derive(Debug, Clone)]
pub struct MockPaymentGateway {
  merchant_id: String,
}

impl MockPaymentGateway {
  pub fn new(merchant_id: impl Into<String>) -> Self {
    Self {
      merchant_id: merchant_id.into(),
    }
  }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
  #[instrument(
    name = "payment_mock::refund",
    skip(self, request),
    fields(transaction_id = %request.transaction_id, amount = %request.amount, merchant_id = %self.merchant_id)
  )]
  async fn refund(&self, request: &RefundRequest) -> anyhow::Result<RefundResponse> {
    info!("Simulating refund from {}", request.client_ip);
    tokio::time::sleep(std::time::Duration::from_millis(50)).await; // Simulate network latency

    if request.transaction_id.starts_with("unreachable_") {
      anyhow::bail!("Mock gateway connection refused");
    }
    if request.transaction_id.starts_with("declined_") {
      info!("Mock refund DECLINED for transaction: {}", request.transaction_id);
      return Ok(RefundResponse {
        status_code: 402,
        error_message: Some("Refund declined by issuer".to_string()),
      });
    }

    info!("Mock refund SUCCEEDED for transaction: {}", request.transaction_id);
    Ok(RefundResponse {
      status_code: 200,
      error_message: None,
    })
  }
}
