//! Phone-number normalization.

const SUBSCRIBER_DIGITS: usize = 10;

/// Normalize a raw phone number to `+<country><subscriber>` form.
///
/// Accepts the forms people actually type: separators (spaces, hyphens,
/// dots, parentheses), a leading trunk `0`, a bare 10-digit subscriber
/// number, the `00` international prefix, and numbers already carrying a
/// country code with or without the `+`. Returns `None` when the input
/// cannot be read as a sendable number.
pub fn normalize_number(raw: &str, country_code: &str) -> Option<String> {
  let country = country_code.trim_start_matches('+');

  let mut plus = false;
  let mut compact = String::with_capacity(raw.len());
  for c in raw.trim().chars() {
    match c {
      '+' if compact.is_empty() && !plus => plus = true,
      '0'..='9' => compact.push(c),
      ' ' | '-' | '.' | '(' | ')' => {}
      _ => return None,
    }
  }
  if compact.is_empty() {
    return None;
  }

  if plus {
    return sendable(&compact).then(|| format!("+{compact}"));
  }
  if let Some(rest) = compact.strip_prefix("00") {
    return sendable(rest).then(|| format!("+{rest}"));
  }
  // Trunk zero before a local subscriber number.
  let local = compact.strip_prefix('0').unwrap_or(&compact);
  if local.len() == SUBSCRIBER_DIGITS {
    return Some(format!("+{country}{local}"));
  }
  // Country code typed without the plus.
  if compact.len() == country.len() + SUBSCRIBER_DIGITS && compact.starts_with(country) {
    return Some(format!("+{compact}"));
  }
  None
}

// E.164 allows up to 15 digits; anything under 8 is not a phone number.
fn sendable(digits: &str) -> bool {
  (8..=15).contains(&digits.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bare_ten_digits_gain_the_country_code() {
    assert_eq!(
      normalize_number("9812345678", "+91").as_deref(),
      Some("+919812345678"),
    );
  }

  #[test]
  fn separators_and_trunk_zero_are_stripped() {
    for raw in ["098123 45678", "98123-45678", "(98123) 45678", "98123.45678"] {
      assert_eq!(
        normalize_number(raw, "+91").as_deref(),
        Some("+919812345678"),
        "failed on {raw:?}",
      );
    }
  }

  #[test]
  fn existing_country_codes_pass_through() {
    assert_eq!(
      normalize_number("+91 98123 45678", "+91").as_deref(),
      Some("+919812345678"),
    );
    assert_eq!(
      normalize_number("919812345678", "+91").as_deref(),
      Some("+919812345678"),
    );
    assert_eq!(
      normalize_number("0091 9812345678", "+91").as_deref(),
      Some("+919812345678"),
    );
    // A foreign number already in international form is left alone.
    assert_eq!(
      normalize_number("+14155552671", "+91").as_deref(),
      Some("+14155552671"),
    );
  }

  #[test]
  fn unreadable_input_is_rejected() {
    for raw in ["", "   ", "+", "12345", "98123x45678", "98+1234567890"] {
      assert_eq!(normalize_number(raw, "+91"), None, "accepted {raw:?}");
    }
  }
}
