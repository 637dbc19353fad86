//! Data structures for orders, their items, status history and reviews.

pub mod money;
pub mod order;
pub mod order_item;
pub mod review;
pub mod status_history;

pub use money::format_minor_units;
pub use order::{
  normalize_delivery_days, Order, OrderAmounts, OrderStatus, ParseStatusError, PaymentMethod, PaymentStatus,
};
pub use order_item::{MealSnapshot, OrderItem};
pub use review::{CategoryRatings, Review, ReviewStatus};
pub use status_history::{Actor, StatusHistoryEntry};
