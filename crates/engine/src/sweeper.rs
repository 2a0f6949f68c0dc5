// In crates/engine/src/sweeper.rs

use chrono::{DateTime, TimeZone, Utc};
use std::time::Duration;

/// Parses an order's creation timestamp, either RFC 3339 or unix milliseconds.
pub fn parse_created_at(created_at: &str) -> Option<DateTime<Utc>> {
    let raw = created_at.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    raw.parse::<i64>()
        .ok()
        .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
}

/// How long an order has been open at `now`.
///
/// Unparseable timestamps count as just created, as do timestamps in the future.
pub fn order_age(order_id: &str, created_at: &str, now: DateTime<Utc>) -> Duration {
    match parse_created_at(created_at) {
        Some(created) => (now - created).to_std().unwrap_or(Duration::ZERO),
        None => {
            tracing::warn!(%order_id, %created_at, "Unparseable order timestamp; treating it as just created.");
            Duration::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[test]
    fn rfc3339_and_millis_are_accepted() {
        assert_eq!(order_age("a", "2024-05-01T11:58:00+00:00", now()), Duration::from_secs(120));
        let millis = (now().timestamp_millis() - 30_000).to_string();
        assert_eq!(order_age("b", &millis, now()), Duration::from_secs(30));
    }

    #[test]
    fn garbage_and_future_timestamps_are_zero() {
        assert_eq!(order_age("c", "yesterday-ish", now()), Duration::ZERO);
        assert_eq!(order_age("d", "", now()), Duration::ZERO);
        assert_eq!(order_age("e", "2024-05-01T12:05:00Z", now()), Duration::ZERO);
    }
}
