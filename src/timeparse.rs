use regex::Regex;

lazy_static! {
  static ref HOURS: Regex = Regex::new(r"(\d+)\s*h").unwrap();
  static ref MINUTES: Regex = Regex::new(r"(\d+)\s*m").unwrap();
}

/// Parses the `<N>h<N>m` / bare-integer-minutes duration grammar used by the
/// `notify` and `timer` commands. Returns total minutes. Invalid or zero
/// durations yield `None`; callers turn that into a usage reply, never a
/// default.
pub fn parse_minutes(raw: &str) -> Option<i64> {
  let input = raw.trim().to_lowercase();
  if input.is_empty() {
    return None;
  }

  // Bare integer means minutes.
  if let Ok(minutes) = input.parse::<i64>() {
    return (minutes > 0).then_some(minutes);
  }

  if !input.chars().all(|c| c.is_ascii_digit() || c.is_whitespace() || c == 'h' || c == 'm') {
    return None;
  }

  let hours = HOURS.captures(&input).and_then(|c| c[1].parse::<i64>().ok());
  let minutes = MINUTES.captures(&input).and_then(|c| c[1].parse::<i64>().ok());
  if hours.is_none() && minutes.is_none() {
    return None;
  }

  let total = hours.unwrap_or(0) * 60 + minutes.unwrap_or(0);
  (total > 0).then_some(total)
}

/// Formats a minute count the way confirmations show it: `1h 30m`, `2h`, `45m`.
pub fn format_minutes(minutes: i64) -> String {
  let hours = minutes / 60;
  let mins = minutes % 60;
  match (hours, mins) {
    (0, m) => format!("{}m", m),
    (h, 0) => format!("{}h", h),
    (h, m) => format!("{}h {}m", h, m),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bare_integer_is_minutes() {
    assert_eq!(parse_minutes("30"), Some(30));
    assert_eq!(parse_minutes("1"), Some(1));
  }

  #[test]
  fn combined_grammar() {
    assert_eq!(parse_minutes("30m"), Some(30));
    assert_eq!(parse_minutes("1h"), Some(60));
    assert_eq!(parse_minutes("2h30m"), Some(150));
    assert_eq!(parse_minutes("1H30M"), Some(90));
    assert_eq!(parse_minutes(" 1h 15m "), Some(75));
  }

  #[test]
  fn rejects_garbage() {
    assert_eq!(parse_minutes(""), None);
    assert_eq!(parse_minutes("soon"), None);
    assert_eq!(parse_minutes("0"), None);
    assert_eq!(parse_minutes("-5"), None);
    assert_eq!(parse_minutes("0h0m"), None);
    assert_eq!(parse_minutes("1h30x"), None);
  }

  #[test]
  fn formats_durations() {
    assert_eq!(format_minutes(30), "30m");
    assert_eq!(format_minutes(60), "1h");
    assert_eq!(format_minutes(150), "2h 30m");
    assert_eq!(format_minutes(0), "0m");
  }
}
