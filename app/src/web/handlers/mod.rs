// app/src/web/handlers/mod.rs

// Declare handler modules
pub mod admin_handlers;
pub mod order_handlers;
pub mod review_handlers;

use mealbox::{Dependency, DependencyFailure};

/// Turkish status line for an operation that succeeded, mentioning the first
/// collaborator that did not. Refund problems outrank notification problems.
pub(crate) fn outcome_message(done: &str, warnings: &[DependencyFailure]) -> String {
  if warnings.iter().any(|w| w.dependency == Dependency::Refund) {
    format!("{} ancak iade başlatılamadı; ekibimiz sizinle iletişime geçecek.", done)
  } else if warnings.iter().any(|w| w.dependency == Dependency::Notification) {
    format!("{} ancak bildirim gönderilemedi.", done)
  } else {
    format!("{}.", done)
  }
}
