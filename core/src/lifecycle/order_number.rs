// core/src/lifecycle/order_number.rs

use chrono::{DateTime, Utc};
use uuid::Uuid;

// Excludes 0, O, 1 and I.
const ALPHABET: &[u8; 32] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";
const SUFFIX_LEN: usize = 6;

/// Human-facing order number: `MB-YYYYMMDD-XXXXXX`.
pub fn generate(now: DateTime<Utc>) -> String {
  let random = Uuid::new_v4();
  let suffix: String = random
    .as_bytes()
    .iter()
    .take(SUFFIX_LEN)
    .map(|byte| ALPHABET[(*byte as usize) % ALPHABET.len()] as char)
    .collect();
  format!("MB-{}-{}", now.format("%Y%m%d"), suffix)
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn number_has_date_and_suffix() {
    let now = Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap();
    let number = generate(now);
    assert!(number.starts_with("MB-20260309-"), "{}", number);
    let suffix = &number["MB-20260309-".len()..];
    assert_eq!(suffix.len(), SUFFIX_LEN);
    assert!(suffix.bytes().all(|b| ALPHABET.contains(&b)));
  }
}
