// core/src/model/review.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ParseStatusError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
  Pending,
  Approved,
  Rejected,
  Flagged,
}

impl ReviewStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      ReviewStatus::Pending => "pending",
      ReviewStatus::Approved => "approved",
      ReviewStatus::Rejected => "rejected",
      ReviewStatus::Flagged => "flagged",
    }
  }

  /// Moderation moves: a new review can be approved, rejected or flagged; a
  /// flagged one still needs a final decision.
  pub fn can_become(self, target: ReviewStatus) -> bool {
    matches!(
      (self, target),
      (ReviewStatus::Pending, ReviewStatus::Approved)
        | (ReviewStatus::Pending, ReviewStatus::Rejected)
        | (ReviewStatus::Pending, ReviewStatus::Flagged)
        | (ReviewStatus::Flagged, ReviewStatus::Approved)
        | (ReviewStatus::Flagged, ReviewStatus::Rejected)
    )
  }
}

impl fmt::Display for ReviewStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ReviewStatus {
  type Err = ParseStatusError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(ReviewStatus::Pending),
      "approved" => Ok(ReviewStatus::Approved),
      "rejected" => Ok(ReviewStatus::Rejected),
      "flagged" => Ok(ReviewStatus::Flagged),
      other => Err(ParseStatusError {
        kind: "review status",
        value: other.to_string(),
      }),
    }
  }
}

/// Optional 1-5 scores next to the overall rating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRatings {
  pub taste: Option<i16>,
  pub portion: Option<i16>,
  pub freshness: Option<i16>,
  pub packaging: Option<i16>,
  pub delivery: Option<i16>,
}

impl CategoryRatings {
  pub fn iter(&self) -> impl Iterator<Item = (&'static str, i16)> {
    [
      ("taste", self.taste),
      ("portion", self.portion),
      ("freshness", self.freshness),
      ("packaging", self.packaging),
      ("delivery", self.delivery),
    ]
    .into_iter()
    .filter_map(|(name, rating)| rating.map(|value| (name, value)))
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
  pub id: Uuid,
  pub order_id: Uuid,
  pub member_id: Uuid,
  pub rating: i16,
  #[serde(flatten)]
  pub categories: CategoryRatings,
  pub comment: Option<String>,
  pub status: ReviewStatus,
  pub created_at: DateTime<Utc>,
  pub moderated_at: Option<DateTime<Utc>>,
}
