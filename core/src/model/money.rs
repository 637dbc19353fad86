// core/src/model/money.rs

//! Amounts are kept in minor units (kuruş) as `i64`.

/// Formats minor units as a decimal string with exactly two fraction digits,
/// the shape the payment gateway expects (`100050` -> `"1000.50"`).
pub fn format_minor_units(amount: i64) -> String {
  let sign = if amount < 0 { "-" } else { "" };
  let abs = amount.unsigned_abs();
  format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}
