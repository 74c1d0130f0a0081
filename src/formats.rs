//! Wire formats for calendar dates (`YYYY-MM-DD`) and wall-clock times
//! (`HH:MM` or `HH:MM:SS`).

use time::{macros::format_description, Date, Time};

pub fn parse_date(raw: &str) -> Result<Date, time::error::Parse> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
}

pub fn format_date(d: Date) -> String {
    d.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

pub fn parse_wall_time(raw: &str) -> Result<Time, time::error::Parse> {
    Time::parse(
        raw.trim(),
        format_description!("[hour]:[minute][optional [:[second]]]"),
    )
}

pub fn format_wall_time(t: Time) -> String {
    t.format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_default()
}

pub mod date {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(d: &Date, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_date(*d))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_date(&raw).map_err(D::Error::custom)
    }
}

pub mod wall_time_option {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use time::Time;

    pub fn serialize<S: Serializer>(t: &Option<Time>, s: S) -> Result<S::Ok, S::Error> {
        match t {
            Some(t) => s.serialize_some(&super::format_wall_time(*t)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Time>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(raw) if !raw.trim().is_empty() => super::parse_wall_time(&raw)
                .map(Some)
                .map_err(D::Error::custom),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, time};

    #[test]
    fn wall_time_accepts_minutes_or_seconds() {
        assert_eq!(parse_wall_time("19:00").unwrap(), time!(19:00));
        assert_eq!(parse_wall_time("07:30:15").unwrap(), time!(07:30:15));
        assert!(parse_wall_time("7pm").is_err());
        assert_eq!(format_wall_time(time!(19:00)), "19:00:00");
    }

    #[test]
    fn dates_use_iso_calendar_form() {
        assert_eq!(parse_date("2024-05-06").unwrap(), date!(2024 - 05 - 06));
        assert_eq!(format_date(date!(2024 - 05 - 06)), "2024-05-06");
        assert!(parse_date("06.05.2024").is_err());
    }
}
