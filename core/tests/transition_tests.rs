// tests/transition_tests.rs
mod common;
use common::*;
use mealbox::lifecycle::allowed_next;
use mealbox::{Actor, ConflictReason, LifecycleError, OrderStatus, PaymentStatus, TemplateKey};
use serial_test::serial;
use std::sync::Arc;

fn staff() -> Actor {
  Actor::Staff("mutfak".to_string())
}

#[tokio::test]
#[serial]
async fn test_exhaustive_transition_table() {
  for from in OrderStatus::ALL {
    for to in OrderStatus::ALL {
      let h = Harness::new();
      let order = h.seed_order(from, PaymentStatus::Pending, 50_000).await;
      let history_before = h.history(order.id).await.len();

      let result = h.manager.transition(order.id, to, staff(), None).await;

      if allowed_next(from).contains(&to) {
        let outcome = result.unwrap_or_else(|e| panic!("{} -> {} should apply: {}", from, to, e));
        assert!(outcome.changed());
        assert_eq!(outcome.order.status, to);
        assert_eq!(h.history(order.id).await.len(), history_before + 1);
      } else if from == to && to != OrderStatus::Cancelled {
        let outcome = result.unwrap_or_else(|e| panic!("{} -> {} should be a no-op: {}", from, to, e));
        assert!(!outcome.changed());
        assert_eq!(h.history(order.id).await.len(), history_before);
      } else if to == OrderStatus::Cancelled {
        match result {
          Err(LifecycleError::Conflict {
            reason: ConflictReason::NotCancellable { current },
            ..
          }) => assert_eq!(current, from),
          other => panic!("{} -> cancelled: expected Conflict, got {:?}", from, other),
        }
        assert_eq!(h.stored(order.id).await.status, from);
      } else {
        assert!(
          matches!(result, Err(LifecycleError::InvalidTransition { .. })),
          "{} -> {}: expected InvalidTransition, got {:?}",
          from,
          to,
          result
        );
        assert_eq!(h.stored(order.id).await.status, from);
        assert_eq!(h.history(order.id).await.len(), history_before);
      }
    }
  }
}

#[tokio::test]
#[serial]
async fn test_full_happy_path_keeps_amounts_and_appends_history() {
  let h = Harness::new();
  let order = h.seed_order(OrderStatus::Pending, PaymentStatus::Completed, 85_000).await;
  let amounts_before = order.amounts;

  for target in [
    OrderStatus::Confirmed,
    OrderStatus::Preparing,
    OrderStatus::Ready,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
  ] {
    let outcome = h
      .manager
      .transition(order.id, target, staff(), Some("güncellendi".to_string()))
      .await
      .unwrap();
    let entry = outcome.history_entry.expect("history entry");
    assert_eq!(entry.status, target);
    assert_eq!(entry.status, outcome.order.status);
    assert_eq!(entry.actor, staff());
    assert_eq!(entry.note.as_deref(), Some("güncellendi"));
    assert_eq!(outcome.order.amounts, amounts_before);
    assert!(outcome.order.amounts.is_consistent());
  }

  let stored = h.stored(order.id).await;
  assert_eq!(stored.status, OrderStatus::Delivered);
  assert!(stored.delivered_at.is_some());
  assert!(stored.cancelled_at.is_none());

  let statuses: Vec<_> = h.history(order.id).await.iter().map(|e| e.status).collect();
  assert_eq!(
    statuses,
    vec![
      OrderStatus::Pending,
      OrderStatus::Confirmed,
      OrderStatus::Preparing,
      OrderStatus::Ready,
      OrderStatus::Shipped,
      OrderStatus::Delivered,
    ]
  );

  // `ready` has no customer template.
  assert_eq!(
    h.notifier.templates(),
    vec![
      TemplateKey::OrderConfirmed,
      TemplateKey::OrderPreparing,
      TemplateKey::OrderShipped,
      TemplateKey::OrderDelivered,
    ]
  );
  assert!(h.notifier.sent().iter().all(|n| n.recipient == MEMBER_EMAIL));
}

#[tokio::test]
#[serial]
async fn test_notification_failure_is_a_warning() {
  let h = Harness::new();
  let order = h.seed_order(OrderStatus::Pending, PaymentStatus::Pending, 10_000).await;
  h.notifier.fail_from_now();

  let outcome = h
    .manager
    .transition(order.id, OrderStatus::Confirmed, staff(), None)
    .await
    .expect("transition must succeed even when email fails");

  assert_eq!(outcome.order.status, OrderStatus::Confirmed);
  assert_eq!(outcome.warnings.len(), 1);
  assert_eq!(outcome.warnings[0].dependency, mealbox::Dependency::Notification);
  assert_eq!(h.stored(order.id).await.status, OrderStatus::Confirmed);
}

#[tokio::test]
#[serial]
async fn test_missing_order_is_not_found() {
  let h = Harness::new();
  let result = h
    .manager
    .transition(uuid::Uuid::new_v4(), OrderStatus::Confirmed, staff(), None)
    .await;
  assert!(matches!(result, Err(LifecycleError::NotFound { .. })));
}

#[tokio::test]
#[serial]
async fn test_lost_compare_and_set_is_a_conflict() {
  let h = Harness::new();
  let order = h.seed_order(OrderStatus::Confirmed, PaymentStatus::Pending, 10_000).await;
  let racing = Arc::new(RacingStore::new(h.store.clone(), OrderStatus::Preparing));
  let manager = mealbox::OrderLifecycleManager::new(racing, h.notifier.clone(), h.gateway.clone());

  let result = manager.transition(order.id, OrderStatus::Cancelled, staff(), None).await;

  match result {
    Err(LifecycleError::Conflict {
      reason: ConflictReason::StatusChanged { expected },
      ..
    }) => assert_eq!(expected, OrderStatus::Confirmed),
    other => panic!("expected StatusChanged conflict, got {:?}", other),
  }
  // Only the competing writer's row was added.
  let statuses: Vec<_> = h.history(order.id).await.iter().map(|e| e.status).collect();
  assert_eq!(statuses, vec![OrderStatus::Pending, OrderStatus::Preparing]);
  assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
#[serial]
async fn test_blank_note_is_not_stored() {
  let h = Harness::new();
  let order = h.seed_order(OrderStatus::Pending, PaymentStatus::Pending, 10_000).await;
  let outcome = h
    .manager
    .transition(order.id, OrderStatus::Confirmed, staff(), Some("   ".to_string()))
    .await
    .unwrap();
  assert_eq!(outcome.history_entry.unwrap().note, None);
}
