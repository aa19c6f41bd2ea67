//! Timestamp encoding for TEXT columns.

use super::error::DbError;
use chrono::{DateTime, Datelike, SecondsFormat, Utc};

/// RFC 3339 in UTC with millisecond precision.
///
/// Only four-digit years are accepted: within that range the text is fixed
/// width, so `ORDER BY` and `MIN` on the column follow time order.
pub fn to_sql(at: DateTime<Utc>) -> Result<String, DbError> {
    if !(0..=9999).contains(&at.year()) {
        return Err(DbError::InvalidData(format!(
            "timestamp {at} is outside years 0000-9999"
        )));
    }
    Ok(at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

pub fn from_sql(value: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::InvalidData(format!("bad timestamp {value:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn text_order_matches_time_order() {
        let early = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 1, 10, 10, 0, 0).unwrap();
        assert!(to_sql(early).unwrap() < to_sql(late).unwrap());
        assert_eq!(to_sql(early).unwrap(), "2024-01-01T09:00:00.000Z");
    }

    #[test]
    fn parses_own_output() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 7, 30, 15).unwrap();
        assert_eq!(from_sql(&to_sql(at).unwrap()).unwrap(), at);
        assert!(from_sql("yesterday").is_err());
    }

    #[test]
    fn rejects_years_beyond_four_digits() {
        let last = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap();
        assert!(to_sql(last).is_ok());
        assert!(to_sql(DateTime::<Utc>::MAX_UTC).is_err());
        assert!(to_sql(DateTime::<Utc>::MIN_UTC).is_err());
    }
}
