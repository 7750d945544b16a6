use ratatui::prelude::Color;
use rust_decimal::Decimal;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Format an amount as dollars with two decimals
pub fn format_amount(amount: Decimal) -> String {
  let mut cents = amount.abs().round_dp(2);
  cents.rescale(2);
  if amount.is_sign_negative() && !cents.is_zero() {
    format!("-${}", cents)
  } else {
    format!("${}", cents)
  }
}

/// Checkbox shown in front of a transaction
pub fn approval_marker(approved: bool, pending: bool) -> &'static str {
  match (pending, approved) {
    (true, _) => "[~]",
    (false, true) => "[x]",
    (false, false) => "[ ]",
  }
}

pub fn approval_color(approved: bool) -> Color {
  if approved {
    Color::Green
  } else {
    Color::White
  }
}

/// Clamp a selection index to a list of `len` items
pub fn clamp_selection(selected: usize, len: usize) -> usize {
  selected.min(len.saturating_sub(1))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::str::FromStr;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("Café Müller GmbH", 8), "Café ...");
  }

  #[test]
  fn test_format_amount() {
    assert_eq!(format_amount(Decimal::from_str("12.5").unwrap()), "$12.50");
    assert_eq!(format_amount(Decimal::from_str("-3.999").unwrap()), "-$4.00");
    assert_eq!(format_amount(Decimal::ZERO), "$0.00");
  }

  #[test]
  fn test_approval_marker() {
    assert_eq!(approval_marker(true, false), "[x]");
    assert_eq!(approval_marker(false, false), "[ ]");
    assert_eq!(approval_marker(false, true), "[~]");
  }

  #[test]
  fn test_clamp_selection() {
    assert_eq!(clamp_selection(5, 3), 2);
    assert_eq!(clamp_selection(1, 3), 1);
    assert_eq!(clamp_selection(4, 0), 0);
  }
}
