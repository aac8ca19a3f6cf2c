/// Countdown arithmetic
///
/// Converts "now" into the remaining days/hours/minutes/seconds until
/// January 1, 00:00:00 of a target year, read on the wall clock of a zone.
/// Every call is a full recomputation; nothing is decremented in place.
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::timezone::TimezoneProjector;
use crate::error::{AppError, Result};

const MS_PER_DAY: i64 = 86_400_000;
const MS_PER_HOUR: i64 = 3_600_000;
const MS_PER_MINUTE: i64 = 60_000;
const MS_PER_SECOND: i64 = 1_000;

/// Remaining time until the target, always a fresh value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountdownResult {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub total_seconds_remaining: i64,
    /// When true, every numeric field is zero
    pub is_target_reached: bool,
}

impl CountdownResult {
    /// The terminal state: target reached or passed
    pub fn reached() -> Self {
        Self {
            is_target_reached: true,
            ..Self::default()
        }
    }

    /// Split a positive millisecond delta into calendar-free units
    pub fn from_millis(delta_ms: i64) -> Self {
        if delta_ms <= 0 {
            return Self::reached();
        }

        let days = delta_ms / MS_PER_DAY;
        let rest = delta_ms % MS_PER_DAY;
        let hours = rest / MS_PER_HOUR;
        let rest = rest % MS_PER_HOUR;
        let minutes = rest / MS_PER_MINUTE;
        let rest = rest % MS_PER_MINUTE;
        let seconds = rest / MS_PER_SECOND;

        Self {
            days,
            hours,
            minutes,
            seconds,
            total_seconds_remaining: delta_ms / MS_PER_SECOND,
            is_target_reached: false,
        }
    }

    /// Format as `Dd HH:MM:SS`
    pub fn display(&self) -> String {
        format!(
            "{}d {:02}:{:02}:{:02}",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// January 1, 00:00:00 of `target_year` as a naive wall-clock reading
pub fn target_instant(target_year: i32) -> Result<NaiveDateTime> {
    NaiveDate::from_ymd_opt(target_year, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or(AppError::InvalidTargetYear(target_year))
}

/// Compute the countdown from `now` to the start of `target_year` in `zone`
///
/// `zone = None` uses the system local zone. Unknown zones fail fast with
/// `AppError::InvalidTimezone`.
pub fn compute_countdown(
    now: DateTime<Utc>,
    target_year: i32,
    zone: Option<&str>,
    projector: &dyn TimezoneProjector,
) -> Result<CountdownResult> {
    let target = target_instant(target_year)?;
    let wall_now = projector.project_to_wall_clock(now, zone)?.to_naive()?;
    let delta_ms = (target - wall_now).num_milliseconds();
    Ok(CountdownResult::from_millis(delta_ms))
}

/// The year after the current wall-clock year in `zone`
pub fn next_target_year(
    now: DateTime<Utc>,
    zone: Option<&str>,
    projector: &dyn TimezoneProjector,
) -> Result<i32> {
    let clock = projector.project_to_wall_clock(now, zone)?;
    Ok(clock.year + 1)
}

/// Countdowns for several zones at the same instant, in request order.
///
/// Each zone carries its own result so one bad name does not hide the rest.
pub fn world_countdowns<'a>(
    now: DateTime<Utc>,
    target_year: i32,
    zones: &'a [String],
    projector: &dyn TimezoneProjector,
) -> Vec<(&'a str, Result<CountdownResult>)> {
    zones
        .iter()
        .map(|zone| {
            let zone = zone.as_str();
            (zone, compute_countdown(now, target_year, Some(zone), projector))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countdown::timezone::{FixedOffsetProjector, SystemProjector};
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_two_seconds_before_midnight() {
        let projector = FixedOffsetProjector::utc();
        let now = utc(2025, 12, 31, 23, 59, 58);
        let result = compute_countdown(now, 2026, None, &projector).unwrap();

        assert_eq!(
            result,
            CountdownResult {
                days: 0,
                hours: 0,
                minutes: 0,
                seconds: 2,
                total_seconds_remaining: 2,
                is_target_reached: false,
            }
        );
    }

    #[test]
    fn test_exact_midnight_is_reached() {
        let projector = FixedOffsetProjector::utc();
        let result = compute_countdown(utc(2026, 1, 1, 0, 0, 0), 2026, None, &projector).unwrap();
        assert_eq!(result, CountdownResult::reached());
        assert!(result.is_target_reached);
    }

    #[test]
    fn test_past_target_is_all_zero() {
        let projector = FixedOffsetProjector::utc();
        let now = utc(2026, 3, 14, 9, 26, 53);
        let result = compute_countdown(now, 2026, None, &projector).unwrap();

        assert!(result.is_target_reached);
        assert_eq!(
            (result.days, result.hours, result.minutes, result.seconds),
            (0, 0, 0, 0)
        );
        assert_eq!(result.total_seconds_remaining, 0);
    }

    #[test]
    fn test_components_sum_to_total() {
        let projector = FixedOffsetProjector::utc();
        let samples = [
            utc(2025, 1, 1, 0, 0, 0),
            utc(2025, 2, 28, 13, 7, 42),
            utc(2025, 6, 30, 23, 59, 59),
            utc(2025, 12, 30, 0, 0, 1),
            utc(2025, 12, 31, 23, 0, 0),
        ];

        for now in samples {
            let r = compute_countdown(now, 2026, None, &projector).unwrap();
            assert!(!r.is_target_reached);
            assert_eq!(
                r.days * 86_400 + r.hours * 3_600 + r.minutes * 60 + r.seconds,
                r.total_seconds_remaining
            );
            assert!(r.days >= 0);
            assert!((0..24).contains(&r.hours));
            assert!((0..60).contains(&r.minutes));
            assert!((0..60).contains(&r.seconds));
        }
    }

    #[test]
    fn test_full_year_remaining() {
        let projector = FixedOffsetProjector::utc();
        let r = compute_countdown(utc(2025, 1, 1, 0, 0, 0), 2026, None, &projector).unwrap();
        assert_eq!(r.days, 365);
        assert_eq!((r.hours, r.minutes, r.seconds), (0, 0, 0));
    }

    #[test]
    fn test_frozen_now_is_idempotent() {
        let now = utc(2025, 11, 2, 4, 5, 6);
        let zone = Some("America/New_York");
        let first = compute_countdown(now, 2026, zone, &SystemProjector).unwrap();
        let second = compute_countdown(now, 2026, zone, &SystemProjector).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_zone_shifts_the_countdown() {
        // 15:00 UTC on Dec 31 is already midnight in Tokyo
        let now = utc(2025, 12, 31, 15, 0, 0);
        let tokyo = compute_countdown(now, 2026, Some("Asia/Tokyo"), &SystemProjector).unwrap();
        let london = compute_countdown(now, 2026, Some("Europe/London"), &SystemProjector).unwrap();

        assert!(tokyo.is_target_reached);
        assert_eq!(london.total_seconds_remaining, 9 * 3_600);
        assert_eq!(london.hours, 9);
    }

    #[test]
    fn test_local_zone_uses_projector_offset() {
        let projector = FixedOffsetProjector {
            local_offset_secs: 3_600,
            zones: vec![],
        };
        let r = compute_countdown(utc(2025, 12, 31, 22, 0, 0), 2026, None, &projector).unwrap();
        assert_eq!(r.total_seconds_remaining, 3_600);
    }

    #[test]
    fn test_system_local_zone_countdown() {
        use chrono::Local;

        // Far enough from any new year that every host zone is mid-year
        let now = utc(2025, 6, 15, 12, 34, 56);
        let r = compute_countdown(now, 2026, None, &SystemProjector).unwrap();

        let local_now = now.with_timezone(&Local).naive_local();
        let expected = (target_instant(2026).unwrap() - local_now).num_seconds();
        assert!(!r.is_target_reached);
        assert_eq!(r.total_seconds_remaining, expected);
        assert_eq!(
            r.days * 86_400 + r.hours * 3_600 + r.minutes * 60 + r.seconds,
            r.total_seconds_remaining
        );
    }

    #[test]
    fn test_invalid_zone_is_an_error() {
        let now = utc(2025, 6, 1, 0, 0, 0);
        let result = compute_countdown(now, 2026, Some("Not/AZone"), &SystemProjector);
        assert!(matches!(result, Err(AppError::InvalidTimezone(_))));
    }

    #[test]
    fn test_invalid_target_year() {
        let now = utc(2025, 6, 1, 0, 0, 0);
        let result = compute_countdown(now, i32::MAX, None, &FixedOffsetProjector::utc());
        assert!(matches!(result, Err(AppError::InvalidTargetYear(y)) if y == i32::MAX));
    }

    #[test]
    fn test_next_target_year_follows_zone() {
        let now = utc(2025, 12, 31, 16, 0, 0);
        let year_in = |zone| next_target_year(now, Some(zone), &SystemProjector).unwrap();
        assert_eq!(year_in("Asia/Tokyo"), 2027);
        assert_eq!(year_in("America/Los_Angeles"), 2026);
    }

    #[test]
    fn test_world_countdowns_keep_order_and_errors() {
        let zones = vec![
            "Pacific/Kiritimati".to_string(),
            "Bogus/Zone".to_string(),
            "Pacific/Pago_Pago".to_string(),
        ];
        let board = world_countdowns(utc(2025, 12, 31, 12, 0, 0), 2026, &zones, &SystemProjector);

        assert_eq!(board.len(), 3);
        assert_eq!(board[0].0, "Pacific/Kiritimati");
        // UTC+14 passed midnight at 10:00 UTC
        assert!(board[0].1.as_ref().unwrap().is_target_reached);
        assert!(matches!(board[1].1, Err(AppError::InvalidTimezone(_))));
        // UTC-11 is still 01:00 on Dec 31
        assert_eq!(board[2].1.as_ref().unwrap().hours, 23);
    }

    #[test]
    fn test_display_format() {
        let r = CountdownResult::from_millis(((2 * 24 + 3) * 3_600 + 4 * 60 + 5) * 1_000);
        assert_eq!(r.display(), "2d 03:04:05");
    }
}
