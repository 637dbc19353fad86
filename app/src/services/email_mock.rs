// app/src/services/email_mock.rs
use async_trait::async_trait;
use mealbox::{DispatchReport, NotificationDispatcher, TemplateData, TemplateKey};
use tracing::{info, instrument, warn};

/// Subject line per template. Template bodies live with the email provider.
fn subject_for(template: TemplateKey, data: &TemplateData) -> String {
  match template {
    TemplateKey::OrderConfirmation => format!("Siparişiniz alındı ({})", data.order_number),
    TemplateKey::OrderConfirmed => format!("Siparişiniz onaylandı ({})", data.order_number),
    TemplateKey::OrderPreparing => format!("Siparişiniz hazırlanıyor ({})", data.order_number),
    TemplateKey::OrderShipped => format!("Siparişiniz yola çıktı ({})", data.order_number),
    TemplateKey::OrderDelivered => format!("Siparişiniz teslim edildi ({})", data.order_number),
    TemplateKey::OrderCancelled => format!("Siparişiniz iptal edildi ({})", data.order_number),
    TemplateKey::PaymentSuccess => format!("Ödemeniz alındı: {} TL", data.final_amount),
    TemplateKey::PaymentFailed => format!("Ödemeniz başarısız oldu ({})", data.order_number),
  }
}

/// Logs emails instead of sending them. Recipients containing `fail_test`
/// simulate a provider failure.
#[derive(Debug, Clone)]
pub struct MockEmailDispatcher {
  sender: String,
}

impl MockEmailDispatcher {
  pub fn new(sender: impl Into<String>) -> Self {
    Self { sender: sender.into() }
  }
}

#[async_trait]
impl NotificationDispatcher for MockEmailDispatcher {
  #[instrument(name = "email_mock::dispatch", skip(self, data), fields(template = %template))]
  async fn dispatch(&self, recipient_email: &str, template: TemplateKey, data: &TemplateData) -> DispatchReport {
    let subject = subject_for(template, data);
    info!(
      "Simulating sending email: To='{}', From='{}', Subject='{}'",
      recipient_email, self.sender, subject
    );
    tokio::time::sleep(std::time::Duration::from_millis(20)).await; // Simulate network latency

    if recipient_email.to_lowercase().contains("fail_test") {
      warn!("Simulated email failure for recipient: {}", recipient_email);
      return DispatchReport::failed("Simulated email send failure");
    }

    let message_id = format!("mock_email_{}", uuid::Uuid::new_v4());
    info!("Mock email sent successfully. Message ID: {}", message_id);
    DispatchReport::sent(message_id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn data() -> TemplateData {
    TemplateData {
      order_number: "MB-20260101-ABCDEF".to_string(),
      status: "confirmed".to_string(),
      final_amount: "1350.00".to_string(),
      note: None,
    }
  }

  #[tokio::test]
  async fn reports_delivery_with_message_id() {
    let dispatcher = MockEmailDispatcher::new("siparis@mealbox.example");
    let report = dispatcher
      .dispatch("uye@example.com", TemplateKey::OrderConfirmed, &data())
      .await;
    assert!(report.delivered);
    assert!(report.message_id.unwrap().starts_with("mock_email_"));
  }

  #[tokio::test]
  async fn fail_test_recipients_are_reported_not_raised() {
    let dispatcher = MockEmailDispatcher::new("siparis@mealbox.example");
    let report = dispatcher
      .dispatch("fail_test@example.com", TemplateKey::OrderCancelled, &data())
      .await;
    assert!(!report.delivered);
    assert!(report.error.is_some());
  }

  #[test]
  fn payment_subject_carries_the_amount() {
    assert_eq!(subject_for(TemplateKey::PaymentSuccess, &data()), "Ödemeniz alındı: 1350.00 TL");
  }
}
