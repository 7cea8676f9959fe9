//! Timezone resolution for naive classifier timestamps.
//!
//! Classified dates carry no zone. They are given wall-clock meaning in a
//! caller-supplied IANA timezone just before hitting the provider. An
//! unknown identifier falls back to UTC rather than failing the whole
//! operation: the wall-clock numbers are preserved, only the attached zone
//! changes.

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

/// Resolve an IANA timezone identifier, falling back to UTC when unknown.
pub fn resolve(tz: &str) -> Tz {
    tz.parse().unwrap_or_else(|_| {
        tracing::warn!(timezone = tz, "unknown timezone identifier, falling back to UTC");
        Tz::UTC
    })
}

/// Attach `tz` to a naive wall-clock timestamp.
///
/// A timestamp inside a DST fold resolves to the earlier instant; one
/// inside a DST gap is read as UTC.
pub fn localize(naive: NaiveDateTime, tz: &str) -> DateTime<Tz> {
    let zone = resolve(tz);
    match zone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earlier, _) => earlier,
        LocalResult::None => zone.from_utc_datetime(&naive),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn naive(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_resolve_known_zone() {
        assert_eq!(resolve("Asia/Jerusalem"), Tz::Asia__Jerusalem);
    }

    #[test]
    fn test_resolve_unknown_zone_falls_back_to_utc() {
        assert_eq!(resolve("Not/AZone"), Tz::UTC);
    }

    #[test]
    fn test_localize_keeps_wall_clock() {
        let dt = localize(naive(20, 0), "Asia/Jerusalem");
        // September 10th is during IDT (UTC+3).
        assert_eq!(dt.to_rfc3339(), "2025-09-10T20:00:00+03:00");
    }

    #[test]
    fn test_localize_invalid_zone_is_utc() {
        let dt = localize(naive(20, 0), "garbage");
        assert_eq!(dt.to_rfc3339(), "2025-09-10T20:00:00+00:00");
    }
}
