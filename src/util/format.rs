//! Compact display strings for dates, money and day counts.
//!
//! All functions take `now` explicitly so output is deterministic in tests.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const MS_PER_DAY: f64 = 86_400_000.0;

/// Parse the date formats the upstream sources emit.
///
/// Accepts RFC 3339, `YYYY-MM-DD`, naive `YYYY-MM-DDTHH:MM:SS[.f]` (taken as
/// UTC), and the `MM/DD/YYYY` form used by SAM.gov and Grants.gov.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }

    for fmt in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    None
}

/// Millisecond timestamp used for date sorting. Unparsable dates sort as epoch.
pub fn sort_timestamp(raw: &str) -> i64 {
    parse_date(raw).map(|d| d.timestamp_millis()).unwrap_or(0)
}

/// Whole days between two instants, rounded half up.
fn round_days(ms: i64) -> i64 {
    (ms as f64 / MS_PER_DAY + 0.5).floor() as i64
}

/// Relative date: `today`, `3d ago`, `in 12d`, or `Mar 2023` beyond a year.
///
/// Returns the input unchanged when it cannot be parsed.
pub fn fmt_rel_date(raw: &str, now: DateTime<Utc>) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let Some(date) = parse_date(raw) else {
        return raw.to_string();
    };

    let diff = round_days((now - date).num_milliseconds());
    match diff {
        0 => "today".to_string(),
        1..=364 => format!("{}d ago", diff),
        -364..=-1 => format!("in {}d", diff.abs()),
        _ => date.format("%b %Y").to_string(),
    }
}

/// Days from `now` until `raw`, negative when past. `None` if unparsable.
pub fn days_until(raw: &str, now: DateTime<Utc>) -> Option<i64> {
    let date = parse_date(raw)?;
    Some(round_days((date - now).num_milliseconds()))
}

/// A deadline is urgent when it falls within the next two weeks.
pub fn is_urgent(days: Option<i64>) -> bool {
    matches!(days, Some(d) if (0..=14).contains(&d))
}

/// Compact currency: `$2.3B`, `$1.5M`, `$750K`, `$999`. Empty for absent or zero.
pub fn fmt_money(amount: Option<f64>) -> String {
    let n = match amount {
        Some(n) if n != 0.0 && n.is_finite() => n,
        _ => return String::new(),
    };

    if n >= 1e9 {
        format!("${:.1}B", n / 1e9)
    } else if n >= 1e6 {
        format!("${:.1}M", n / 1e6)
    } else if n >= 1e3 {
        format!("${:.0}K", n / 1e3)
    } else {
        format!("${}", group_thousands(n))
    }
}

/// Render a small amount with up to three decimals and comma grouping.
fn group_thousands(n: f64) -> String {
    let rounded = (n * 1000.0).round() / 1000.0;
    let text = format!("{:.3}", rounded);
    let text = text.trim_end_matches('0').trim_end_matches('.');

    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}
