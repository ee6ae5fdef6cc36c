use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{debug, info};

use crate::error::{ForecastError, Result};
use crate::models::TicketEvent;

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

const NAIVE_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

pub fn load_events(csv_path: &Path, timestamp_column: &str) -> Result<Vec<TicketEvent>> {
    let file = std::fs::File::open(csv_path)?;
    let events = read_events(file, timestamp_column)?;
    info!(
        path = %csv_path.display(),
        events = events.len(),
        "loaded ticket log"
    );
    Ok(events)
}

pub fn read_events<R: Read>(input: R, timestamp_column: &str) -> Result<Vec<TicketEvent>> {
    let mut reader = csv::Reader::from_reader(input);
    let column = reader
        .headers()?
        .iter()
        .position(|header| header.trim() == timestamp_column)
        .ok_or_else(|| {
            ForecastError::InvalidConfig(format!(
                "ticket log has no {timestamp_column:?} column"
            ))
        })?;
    debug!(column, "timestamp column resolved");

    let mut events = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result?;
        let row = index + 1;
        let raw = record.get(column).unwrap_or_default();
        let created_at = parse_timestamp(raw).ok_or_else(|| ForecastError::InvalidTimestamp {
            row,
            value: raw.to_string(),
        })?;
        events.push(TicketEvent { created_at });
    }

    Ok(events)
}

/// Parses RFC 3339, `+HHMM` offset, naive date-time and bare date values, with
/// either `-` or `/` as the date separator for the naive shapes.
///
/// Offset-carrying timestamps keep the wall-clock time of their own offset, so a
/// ticket is counted on the calendar day the source system recorded.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_local());
    }

    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(value, format) {
            return Some(parsed.naive_local());
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .map(|date| date.and_time(NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_supported_timestamp_shapes() {
        assert_eq!(
            parse_timestamp("2024-03-01 09:15:00").unwrap().date(),
            date(2024, 3, 1)
        );
        assert_eq!(
            parse_timestamp("2024-03-01T23:59:59.250").unwrap().date(),
            date(2024, 3, 1)
        );
        assert_eq!(
            parse_timestamp(" 2024-03-02 ").unwrap(),
            date(2024, 3, 2).and_time(NaiveTime::MIN)
        );
        assert_eq!(
            parse_timestamp("2024-03-01T23:30:00-05:00").unwrap().date(),
            date(2024, 3, 1)
        );
        assert_eq!(
            parse_timestamp("2024-03-01T08:00:00Z").unwrap().date(),
            date(2024, 3, 1)
        );
    }

    #[test]
    fn accepts_compact_offsets_and_slash_dates() {
        assert_eq!(
            parse_timestamp("2024-03-01T09:15:00+0000").unwrap(),
            date(2024, 3, 1).and_hms_opt(9, 15, 0).unwrap()
        );
        assert_eq!(
            parse_timestamp("2024-03-01 23:30:00-0500").unwrap().date(),
            date(2024, 3, 1)
        );
        assert_eq!(
            parse_timestamp("2024/03/01").unwrap(),
            date(2024, 3, 1).and_time(NaiveTime::MIN)
        );
        assert_eq!(
            parse_timestamp("2024/03/01 17:05:00").unwrap().date(),
            date(2024, 3, 1)
        );
    }

    #[test]
    fn rejects_garbage_and_empty_values() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2024-13-01").is_none());
    }

    #[test]
    fn reads_named_column_and_ignores_others() {
        let data = "ticket_id,created_at,channel\n1,2024-03-01 10:00:00,email\n2,2024-03-02,chat\n";
        let events = read_events(data.as_bytes(), "created_at").unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].created_at.date(), date(2024, 3, 2));
    }

    #[test]
    fn reports_row_of_unparseable_timestamp() {
        let data = "created_at\n2024-03-01\nnot-a-date\n";
        match read_events(data.as_bytes(), "created_at") {
            Err(ForecastError::InvalidTimestamp { row, value }) => {
                assert_eq!(row, 2);
                assert_eq!(value, "not-a-date");
            }
            other => panic!("expected InvalidTimestamp, got {other:?}"),
        }
    }

    #[test]
    fn missing_column_is_a_config_error() {
        let data = "opened\n2024-03-01\n";
        assert!(matches!(
            read_events(data.as_bytes(), "created_at"),
            Err(ForecastError::InvalidConfig(_))
        ));
    }
}
