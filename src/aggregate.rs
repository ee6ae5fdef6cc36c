use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use tracing::{debug, info};

use crate::error::{ForecastError, Result};
use crate::models::{DailyCount, DailySeries, DayRecord, TicketEvent};

/// Rows of history needed behind a day before all of its lag features exist.
pub const LAG_WINDOW: usize = 7;

/// Groups ticket events by calendar day and derives the model features.
///
/// Lags and the rolling mean are taken over the sequence of days present in
/// the log; missing days are not zero-filled.
pub fn build_daily_series(events: &[TicketEvent]) -> Result<DailySeries> {
    let counts = daily_counts(events);
    if counts.len() <= LAG_WINDOW {
        return Err(ForecastError::EmptyHistory {
            distinct_days: counts.len(),
        });
    }

    let values: Vec<u32> = counts.iter().map(|day| day.ticket_count).collect();
    let records: Vec<DayRecord> = counts
        .iter()
        .enumerate()
        .filter_map(|(index, day)| derive_record(day.date, &values[..=index]))
        .collect();

    debug!(
        dropped = counts.len() - records.len(),
        "dropped warm-up days without lag features"
    );
    info!(
        days = counts.len(),
        records = records.len(),
        first = %counts[0].date,
        last = %counts[counts.len() - 1].date,
        "aggregated daily series"
    );

    Ok(DailySeries::new(counts, records))
}

pub fn daily_counts(events: &[TicketEvent]) -> Vec<DailyCount> {
    let mut by_date: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    for event in events {
        *by_date.entry(event.created_at.date()).or_insert(0) += 1;
    }

    by_date
        .into_iter()
        .map(|(date, ticket_count)| DailyCount { date, ticket_count })
        .collect()
}

/// Builds the record for the last entry of `history`, which must hold the
/// current day's count preceded by at least `LAG_WINDOW` earlier rows.
pub(crate) fn derive_record(date: NaiveDate, history: &[u32]) -> Option<DayRecord> {
    let len = history.len();
    if len <= LAG_WINDOW {
        return None;
    }

    let window = &history[len - LAG_WINDOW..];
    let rolling_7 = window.iter().map(|&count| f64::from(count)).sum::<f64>() / LAG_WINDOW as f64;
    let day_of_week = date.weekday().num_days_from_monday() as u8;

    Some(DayRecord {
        date,
        ticket_count: history[len - 1],
        day_of_week,
        is_weekend: is_weekend(day_of_week),
        lag_1: history[len - 2],
        lag_7: history[len - 1 - LAG_WINDOW],
        rolling_7,
    })
}

pub fn is_weekend(day_of_week: u8) -> bool {
    matches!(day_of_week, 5 | 6)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn events_for(start: NaiveDate, counts: &[u32]) -> Vec<TicketEvent> {
        let mut events = Vec::new();
        for (offset, &count) in counts.iter().enumerate() {
            let day = start + Duration::days(offset as i64);
            for n in 0..count {
                let created_at = day.and_hms_opt(8 + n % 10, n % 60, 0).unwrap();
                events.push(TicketEvent { created_at });
            }
        }
        events
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    #[test]
    fn yields_n_minus_seven_records() {
        for days in [8usize, 10, 21] {
            let counts: Vec<u32> = (0..days as u32).map(|i| 5 + i % 4).collect();
            let series = build_daily_series(&events_for(monday(), &counts)).unwrap();
            assert_eq!(series.len(), days - 7);
            assert_eq!(series.counts().len(), days);
        }
    }

    #[test]
    fn rolling_mean_covers_current_and_six_previous_rows() {
        let counts = [12, 15, 9, 20, 18, 22, 30, 25, 19, 14];
        let series = build_daily_series(&events_for(monday(), &counts)).unwrap();

        for (offset, record) in series.records().iter().enumerate() {
            let index = offset + 7;
            let expected: f64 =
                counts[index - 6..=index].iter().map(|&c| f64::from(c)).sum::<f64>() / 7.0;
            assert!((record.rolling_7 - expected).abs() < 1e-9);
            assert_eq!(record.lag_1, counts[index - 1]);
            assert_eq!(record.lag_7, counts[index - 7]);
            assert_eq!(record.ticket_count, counts[index]);
        }

        let latest = series.latest().unwrap();
        assert_eq!(latest.ticket_count, 14);
        assert_eq!(latest.lag_1, 19);
        assert_eq!(latest.lag_7, 9);
    }

    #[test]
    fn weekend_flag_matches_day_of_week() {
        let counts: Vec<u32> = vec![3; 20];
        let series = build_daily_series(&events_for(monday(), &counts)).unwrap();
        for record in series.records() {
            assert_eq!(record.is_weekend, record.day_of_week >= 5);
            assert_eq!(
                u32::from(record.day_of_week),
                record.date.weekday().num_days_from_monday()
            );
        }
        // 2024-03-11 is the first valid row and a Monday.
        assert_eq!(series.records()[0].day_of_week, 0);
        assert!(series.records()[5].is_weekend);
    }

    #[test]
    fn lags_follow_rows_not_calendar_days() {
        let mut events = events_for(monday(), &[1, 2, 3, 4, 5, 6, 7]);
        // Skip a week, then a single busy day.
        events.extend(events_for(monday() + Duration::days(14), &[9]));
        let series = build_daily_series(&events).unwrap();
        assert_eq!(series.len(), 1);
        let record = &series.records()[0];
        assert_eq!(record.lag_1, 7);
        assert_eq!(record.lag_7, 1);
    }

    #[test]
    fn too_few_days_is_empty_history() {
        let events = events_for(monday(), &[4, 4, 4, 4, 4]);
        assert!(matches!(
            build_daily_series(&events),
            Err(ForecastError::EmptyHistory { distinct_days: 5 })
        ));

        let seven = events_for(monday(), &[4; 7]);
        assert!(matches!(
            build_daily_series(&seven),
            Err(ForecastError::EmptyHistory { distinct_days: 7 })
        ));
    }

    #[test]
    fn time_of_day_is_ignored_when_grouping() {
        let day = monday();
        let events = vec![
            TicketEvent {
                created_at: day.and_hms_opt(0, 0, 1).unwrap(),
            },
            TicketEvent {
                created_at: day.and_hms_opt(23, 59, 59).unwrap(),
            },
        ];
        let counts = daily_counts(&events);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].ticket_count, 2);
    }
}
