// tests/common/mod.rs
#![allow(dead_code)] // Not every test file uses every helper

use async_trait::async_trait;
use chrono::{NaiveDate, Utc, Weekday};
use mealbox::{
  Actor, DispatchReport, InMemoryOrderStore, MealSnapshot, NewOrder, NewOrderItem, NotificationDispatcher, Order,
  OrderAmounts, OrderItem, OrderLifecycleManager, OrderStatus, OrderStore, PaymentGateway, PaymentMethod,
  PaymentStatus, RefundRequest, RefundResponse, Review, StatusHistoryEntry, StoreError, TemplateData, TemplateKey,
};
use mealbox::ports::{PaymentChange, ReviewModeration, StatusChange};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::Level;
use uuid::Uuid;

pub const MEMBER_EMAIL: &str = "ayse@example.com";
pub const CLIENT_IP: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7));

// --- Tracing ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Notification double ---
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
  pub recipient: String,
  pub template: TemplateKey,
  pub data: TemplateData,
}

#[derive(Default)]
pub struct RecordingNotifier {
  sent: Mutex<Vec<SentNotification>>,
  fail: AtomicBool,
}

impl RecordingNotifier {
  pub fn fail_from_now(&self) {
    self.fail.store(true, Ordering::SeqCst);
  }

  pub fn sent(&self) -> Vec<SentNotification> {
    self.sent.lock().clone()
  }

  pub fn templates(&self) -> Vec<TemplateKey> {
    self.sent.lock().iter().map(|n| n.template).collect()
  }
}

#[async_trait]
impl NotificationDispatcher for RecordingNotifier {
  async fn dispatch(&self, recipient_email: &str, template: TemplateKey, data: &TemplateData) -> DispatchReport {
    if self.fail.load(Ordering::SeqCst) {
      return DispatchReport::failed("smtp relay unavailable");
    }
    self.sent.lock().push(SentNotification {
      recipient: recipient_email.to_string(),
      template,
      data: data.clone(),
    });
    DispatchReport::sent(format!("msg-{}", Uuid::new_v4()))
  }
}

// --- Payment gateway double ---
#[derive(Debug, Clone)]
pub enum GatewayBehaviour {
  Accept,
  Decline { status_code: u16, message: Option<String> },
  Unreachable,
}

pub struct ScriptedGateway {
  behaviour: Mutex<GatewayBehaviour>,
  requests: Mutex<Vec<RefundRequest>>,
}

impl Default for ScriptedGateway {
  fn default() -> Self {
    Self {
      behaviour: Mutex::new(GatewayBehaviour::Accept),
      requests: Mutex::new(Vec::new()),
    }
  }
}

impl ScriptedGateway {
  pub fn behave(&self, behaviour: GatewayBehaviour) {
    *self.behaviour.lock() = behaviour;
  }

  pub fn requests(&self) -> Vec<RefundRequest> {
    self.requests.lock().clone()
  }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
  async fn refund(&self, request: &RefundRequest) -> anyhow::Result<RefundResponse> {
    self.requests.lock().push(request.clone());
    let behaviour = self.behaviour.lock().clone();
    match behaviour {
      GatewayBehaviour::Accept => Ok(RefundResponse {
        status_code: 200,
        error_message: None,
      }),
      GatewayBehaviour::Decline { status_code, message } => Ok(RefundResponse {
        status_code,
        error_message: message,
      }),
      GatewayBehaviour::Unreachable => Err(anyhow::anyhow!("connection timed out")),
    }
  }
}

// --- Store wrapper that serves one stale read ---

/// Returns the order as it was *before* `race_to` was written, once, so the
/// manager's compare-and-set runs against a status that has already moved.
pub struct RacingStore {
  pub inner: Arc<InMemoryOrderStore>,
  race_to: Mutex<Option<OrderStatus>>,
}

impl RacingStore {
  pub fn new(inner: Arc<InMemoryOrderStore>, race_to: OrderStatus) -> Self {
    Self {
      inner,
      race_to: Mutex::new(Some(race_to)),
    }
  }
}

#[async_trait]
impl OrderStore for RacingStore {
  async fn insert_order(&self, order: &Order, items: &[OrderItem], entry: &StatusHistoryEntry) -> Result<(), StoreError> {
    self.inner.insert_order(order, items, entry).await
  }

  async fn find_order(&self, order_id: Uuid) -> Result<Option<Order>, StoreError> {
    let stale = self.inner.find_order(order_id).await?;
    let race_to = self.race_to.lock().take();
    if let (Some(order), Some(target)) = (&stale, race_to) {
      // Another writer wins the race right after our read.
      let now = Utc::now();
      let change = StatusChange {
        order_id,
        expected: order.status,
        target,
        entry: StatusHistoryEntry {
          id: Uuid::new_v4(),
          order_id,
          status: target,
          actor: Actor::Staff("other-writer".to_string()),
          note: None,
          created_at: now,
        },
        cancelled_at: None,
        delivered_at: None,
        at: now,
      };
      self.inner.apply_transition(&change).await?;
    }
    Ok(stale)
  }

  async fn order_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>, StoreError> {
    self.inner.order_items(order_id).await
  }

  async fn status_history(&self, order_id: Uuid) -> Result<Vec<StatusHistoryEntry>, StoreError> {
    self.inner.status_history(order_id).await
  }

  async fn apply_transition(&self, change: &StatusChange) -> Result<Option<Order>, StoreError> {
    self.inner.apply_transition(change).await
  }

  async fn update_payment(&self, change: &PaymentChange) -> Result<Option<Order>, StoreError> {
    self.inner.update_payment(change).await
  }

  async fn member_email(&self, member_id: Uuid) -> Result<Option<String>, StoreError> {
    self.inner.member_email(member_id).await
  }

  async fn find_review(&self, review_id: Uuid) -> Result<Option<Review>, StoreError> {
    self.inner.find_review(review_id).await
  }

  async fn review_for_order(&self, order_id: Uuid) -> Result<Option<Review>, StoreError> {
    self.inner.review_for_order(order_id).await
  }

  async fn insert_review(&self, review: &Review) -> Result<(), StoreError> {
    self.inner.insert_review(review).await
  }

  async fn moderate_review(&self, change: &ReviewModeration) -> Result<Option<Review>, StoreError> {
    self.inner.moderate_review(change).await
  }
}

// --- Harness ---
pub struct Harness {
  pub store: Arc<InMemoryOrderStore>,
  pub notifier: Arc<RecordingNotifier>,
  pub gateway: Arc<ScriptedGateway>,
  pub manager: OrderLifecycleManager,
  pub member_id: Uuid,
}

impl Harness {
  pub fn new() -> Self {
    setup_tracing();
    let store = Arc::new(InMemoryOrderStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let gateway = Arc::new(ScriptedGateway::default());
    let member_id = Uuid::new_v4();
    store.register_member(member_id, MEMBER_EMAIL);
    let manager = OrderLifecycleManager::new(store.clone(), notifier.clone(), gateway.clone());
    Self {
      store,
      notifier,
      gateway,
      manager,
      member_id,
    }
  }

  /// Inserts an order directly in `status`, bypassing the state machine.
  pub async fn seed_order(&self, status: OrderStatus, payment_status: PaymentStatus, final_amount: i64) -> Order {
    let now = Utc::now();
    let order_id = Uuid::new_v4();
    let amounts = OrderAmounts::new(final_amount + 1_500, 1_000, 500).expect("valid amounts");
    let order = Order {
      id: order_id,
      order_number: format!("MB-20260101-{}", &order_id.simple().to_string()[..6].to_uppercase()),
      member_id: self.member_id,
      status,
      payment_status,
      payment_method: PaymentMethod::Card,
      payment_transaction_id: (payment_status != PaymentStatus::Pending).then(|| format!("txn-{}", order_id.simple())),
      amounts,
      promo_code: Some("FIT10".to_string()),
      meal_count: 10,
      delivery_days: vec![Weekday::Mon, Weekday::Wed],
      delivery_address_id: Uuid::new_v4(),
      delivery_date: NaiveDate::from_ymd_opt(2026, 1, 5).expect("valid date"),
      delivery_time_slot: "09:00-12:00".to_string(),
      created_at: now,
      updated_at: now,
      cancelled_at: None,
      delivered_at: None,
    };
    let item = OrderItem {
      id: Uuid::new_v4(),
      order_id,
      meal: sample_meal("Izgara Tavuk"),
      quantity: 10,
      unit_price: amounts.total_amount / 10,
      total_price: amounts.total_amount,
      delivery_date: order.delivery_date,
    };
    let entry = StatusHistoryEntry {
      id: Uuid::new_v4(),
      order_id,
      status: OrderStatus::Pending,
      actor: Actor::System,
      note: None,
      created_at: now,
    };
    self
      .store
      .insert_order(&order, &[item], &entry)
      .await
      .expect("seed insert");
    order
  }

  pub async fn history(&self, order_id: Uuid) -> Vec<StatusHistoryEntry> {
    self.store.status_history(order_id).await.expect("history")
  }

  pub async fn stored(&self, order_id: Uuid) -> Order {
    self.store.find_order(order_id).await.expect("find").expect("order exists")
  }
}

pub fn sample_meal(name: &str) -> MealSnapshot {
  MealSnapshot {
    meal_id: Uuid::new_v4(),
    name: name.to_string(),
    category: "protein".to_string(),
    calories: 520,
    protein_grams: 42.0,
    carbs_grams: 38.5,
    fat_grams: 14.0,
  }
}

pub fn sample_new_order() -> NewOrder {
  let date = NaiveDate::from_ymd_opt(2026, 2, 2).expect("valid date");
  NewOrder {
    payment_method: PaymentMethod::Card,
    discount_amount: 2_000,
    promo_code: Some(" fit10 ".to_string()),
    promo_discount: 1_000,
    delivery_days: vec![Weekday::Wed, Weekday::Mon, Weekday::Wed],
    delivery_address_id: Uuid::new_v4(),
    delivery_date: date,
    delivery_time_slot: "18:00-21:00".to_string(),
    items: vec![
      NewOrderItem {
        meal: sample_meal("Izgara Tavuk"),
        quantity: 5,
        unit_price: 15_000,
        delivery_date: date,
      },
      NewOrderItem {
        meal: sample_meal("Somon Bowl"),
        quantity: 3,
        unit_price: 21_000,
        delivery_date: date,
      },
    ],
  }
}
