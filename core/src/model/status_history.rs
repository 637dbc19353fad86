// core/src/model/status_history.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::OrderStatus;

/// Who asked for a status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Actor {
  Member(Uuid),
  Staff(String),
  System,
}

impl fmt::Display for Actor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Actor::Member(id) => write!(f, "member:{}", id),
      Actor::Staff(name) => write!(f, "staff:{}", name),
      Actor::System => f.write_str("system"),
    }
  }
}

/// One append-only row per applied transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
  pub id: Uuid,
  pub order_id: Uuid,
  pub status: OrderStatus,
  pub actor: Actor,
  pub note: Option<String>,
  pub created_at: DateTime<Utc>,
}
