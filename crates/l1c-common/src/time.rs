//! Time formatting conventions of the level-1c format.

use chrono::{DateTime, NaiveDateTime, TimeZone, Timelike, Utc};

use crate::error::SceneError;

/// Slot key format: minute resolution, as encoded in raw HRIT file names.
const SLOT_FORMAT: &str = "%Y%m%d%H%M";

/// Header timestamp (`start_time`, `end_time` global attributes).
pub fn header_time(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Timestamp as used in output file names: seconds plus one tenths digit.
///
/// `2014-10-05 11:15:00.73` becomes `20141005T1115007`.
pub fn pps_filename_time(time: &DateTime<Utc>) -> String {
    let tenths = time.nanosecond() % 1_000_000_000 / 100_000_000;
    format!("{}{}", time.format("%Y%m%dT%H%M%S"), tenths)
}

/// `date_created` header value.
pub fn date_created(now: &DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Minute-resolution key identifying a scan unit (`YYYYMMDDhhmm`).
pub fn slot_key(time: &DateTime<Utc>) -> String {
    time.format(SLOT_FORMAT).to_string()
}

/// Parse a `YYYYMMDDhhmm` slot key.
pub fn parse_slot_key(key: &str) -> Result<DateTime<Utc>, SceneError> {
    NaiveDateTime::parse_from_str(key, SLOT_FORMAT)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|_| SceneError::InvalidTime(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_header_time() {
        let t = Utc.with_ymd_and_hms(2014, 10, 5, 11, 15, 0).unwrap();
        assert_eq!(header_time(&t), "2014-10-05 11:15:00");
    }

    #[test]
    fn test_filename_time_keeps_tenths() {
        let t = Utc.with_ymd_and_hms(2014, 10, 5, 11, 15, 0).unwrap() + Duration::milliseconds(730);
        assert_eq!(pps_filename_time(&t), "20141005T1115007");

        let whole = Utc.with_ymd_and_hms(2014, 10, 5, 11, 27, 41).unwrap();
        assert_eq!(pps_filename_time(&whole), "20141005T1127410");
    }

    #[test]
    fn test_slot_key_roundtrip() {
        let t = Utc.with_ymd_and_hms(2014, 10, 5, 11, 15, 0).unwrap();
        let key = slot_key(&t);
        assert_eq!(key, "201410051115");
        assert_eq!(parse_slot_key(&key).unwrap(), t);
    }

    #[test]
    fn test_parse_slot_key_rejects_garbage() {
        assert!(parse_slot_key("2014-10-05").is_err());
    }
}
