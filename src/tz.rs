use std::fmt::Display;

use jiff::{civil, tz::TimeZone, Timestamp};
use time::{Date, OffsetDateTime, Time, UtcOffset};
use tracing::warn;

use crate::error::{LedgerError, LedgerResult};

/// A user's IANA time zone, resolved once per operation.
#[derive(Debug, Clone)]
pub struct UserZone {
    tz: TimeZone,
}

impl UserZone {
    pub fn parse(name: &str) -> LedgerResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::InvalidTimezone(String::new()));
        }
        let tz = TimeZone::get(name).map_err(|e| {
            warn!(timezone = %name, error = %e, "cannot resolve timezone");
            LedgerError::InvalidTimezone(name.to_string())
        })?;
        Ok(Self { tz })
    }

    /// Same instant, expressed at the zone's offset in effect at that instant.
    pub fn localize(&self, instant: OffsetDateTime) -> LedgerResult<OffsetDateTime> {
        let ts = Timestamp::from_nanosecond(instant.unix_timestamp_nanos()).map_err(internal)?;
        let offset =
            UtcOffset::from_whole_seconds(self.tz.to_offset(ts).seconds()).map_err(internal)?;
        Ok(instant.to_offset(offset))
    }

    /// The instant at which local wall-clock `wall` occurs on `date`.
    /// Gaps and folds resolve the way most calendars do: earlier offset for
    /// folds, shifted forward across gaps.
    pub fn at(&self, date: Date, wall: Time) -> LedgerResult<OffsetDateTime> {
        let year = i16::try_from(date.year()).map_err(internal)?;
        let civil = civil::DateTime::new(
            year,
            u8::from(date.month()) as i8,
            date.day() as i8,
            wall.hour() as i8,
            wall.minute() as i8,
            wall.second() as i8,
            wall.nanosecond() as i32,
        )
        .map_err(internal)?;
        let zoned = civil.to_zoned(self.tz.clone()).map_err(internal)?;
        let instant = OffsetDateTime::from_unix_timestamp_nanos(zoned.timestamp().as_nanosecond())
            .map_err(internal)?;
        let offset = UtcOffset::from_whole_seconds(zoned.offset().seconds()).map_err(internal)?;
        Ok(instant.to_offset(offset))
    }
}

fn internal(e: impl Display) -> LedgerError {
    LedgerError::Internal(format!("time conversion: {e}"))
}
