/// Zone-aware wall-clock projection
///
/// The countdown never does plain UTC-offset math. An instant is projected
/// into the wall-clock reading of a zone (DST rules included) and the
/// countdown is computed between two naive wall-clock readings.
use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::error::{AppError, Result};

/// The human-readable reading of a clock in a specific zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallClock {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl WallClock {
    /// Read the wall clock of an already zoned date-time (sub-second parts dropped)
    pub fn from_datetime<Z: TimeZone>(dt: &DateTime<Z>) -> Self {
        Self {
            year: dt.year(),
            month: dt.month(),
            day: dt.day(),
            hour: dt.hour(),
            minute: dt.minute(),
            second: dt.second(),
        }
    }

    /// Rebuild a naive date-time with the same clock reading
    pub fn to_naive(&self) -> Result<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .and_then(|date| date.and_hms_opt(self.hour, self.minute, self.second))
            .ok_or(AppError::InvalidWallClock)
    }
}

/// Projects an absolute instant into a zone's wall clock.
///
/// `zone = None` means the system local zone.
pub trait TimezoneProjector {
    fn project_to_wall_clock(
        &self,
        instant: DateTime<Utc>,
        zone: Option<&str>,
    ) -> Result<WallClock>;
}

/// Production projector backed by the IANA database and the host local zone
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProjector;

impl TimezoneProjector for SystemProjector {
    fn project_to_wall_clock(
        &self,
        instant: DateTime<Utc>,
        zone: Option<&str>,
    ) -> Result<WallClock> {
        match zone {
            Some(name) => {
                let tz = parse_zone(name)?;
                Ok(WallClock::from_datetime(&instant.with_timezone(&tz)))
            }
            None => Ok(WallClock::from_datetime(&instant.with_timezone(&Local))),
        }
    }
}

/// Resolve an IANA zone name, failing fast on anything unknown
pub fn parse_zone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| AppError::InvalidTimezone(name.to_string()))
}

/// Test projector with fixed, DST-free offsets per zone name
#[cfg(test)]
pub(crate) struct FixedOffsetProjector {
    pub local_offset_secs: i32,
    pub zones: Vec<(&'static str, i32)>,
}

#[cfg(test)]
impl FixedOffsetProjector {
    pub fn utc() -> Self {
        Self {
            local_offset_secs: 0,
            zones: vec![("UTC", 0)],
        }
    }
}

#[cfg(test)]
impl TimezoneProjector for FixedOffsetProjector {
    fn project_to_wall_clock(
        &self,
        instant: DateTime<Utc>,
        zone: Option<&str>,
    ) -> Result<WallClock> {
        let offset_secs = match zone {
            None => self.local_offset_secs,
            Some(name) => self
                .zones
                .iter()
                .find(|(zone_name, _)| *zone_name == name)
                .map(|(_, offset)| *offset)
                .ok_or_else(|| AppError::InvalidTimezone(name.to_string()))?,
        };
        let offset =
            chrono::FixedOffset::east_opt(offset_secs).ok_or(AppError::InvalidWallClock)?;
        Ok(WallClock::from_datetime(&instant.with_timezone(&offset)))
    }
}
