use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::ForecastError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketEvent {
    pub created_at: NaiveDateTime,
}

/// Number of tickets opened on one calendar day, before feature engineering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub ticket_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub ticket_count: u32,
    pub day_of_week: u8,
    pub is_weekend: bool,
    pub lag_1: u32,
    pub lag_7: u32,
    pub rolling_7: f64,
}

/// Daily ticket history with lag features.
///
/// `counts` holds every grouped day (including the warm-up rows that have no
/// lag features yet); `records` holds only the rows with all features defined.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    counts: Vec<DailyCount>,
    records: Vec<DayRecord>,
}

impl DailySeries {
    pub(crate) fn new(counts: Vec<DailyCount>, records: Vec<DayRecord>) -> Self {
        Self { counts, records }
    }

    pub fn counts(&self) -> &[DailyCount] {
        &self.counts
    }

    pub fn records(&self) -> &[DayRecord] {
        &self.records
    }

    pub fn latest(&self) -> Option<&DayRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Model input in the fixed order
/// `[day_of_week, is_weekend, lag_1, lag_7, rolling_7]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector(pub [f64; 5]);

impl FeatureVector {
    pub const LEN: usize = 5;

    pub fn from_record(record: &DayRecord) -> Self {
        Self([
            f64::from(record.day_of_week),
            if record.is_weekend { 1.0 } else { 0.0 },
            f64::from(record.lag_1),
            f64::from(record.lag_7),
            record.rolling_7,
        ])
    }

    pub fn values(&self) -> &[f64; 5] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayForecast {
    pub day_label: String,
    pub predicted_ticket_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForecastResult {
    #[serde(rename = "day")]
    pub day_label: String,
    #[serde(rename = "predicted_tickets")]
    pub predicted_ticket_count: u32,
    pub agents_required: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastHorizon {
    OneDay,
    SevenDays,
}

impl ForecastHorizon {
    pub fn days(self) -> usize {
        match self {
            ForecastHorizon::OneDay => 1,
            ForecastHorizon::SevenDays => 7,
        }
    }
}

impl TryFrom<u32> for ForecastHorizon {
    type Error = ForecastError;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        match days {
            1 => Ok(ForecastHorizon::OneDay),
            7 => Ok(ForecastHorizon::SevenDays),
            other => Err(ForecastError::InvalidHorizon(other)),
        }
    }
}

impl From<ForecastHorizon> for u32 {
    fn from(horizon: ForecastHorizon) -> Self {
        horizon.days() as u32
    }
}

/// How the synthetic rows appended during a multi-day forecast get their features.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Propagation {
    /// Copy the previous row verbatim and only replace its ticket count.
    #[default]
    Frozen,
    /// Advance the date and recompute calendar and lag features from the predictions.
    Recomputed,
}

impl Propagation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Propagation::Frozen => "frozen",
            Propagation::Recomputed => "recomputed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaffingConfig {
    pub tickets_per_agent: u32,
    pub forecast_horizon: ForecastHorizon,
    pub propagation: Propagation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizon_accepts_only_one_or_seven() {
        assert_eq!(ForecastHorizon::try_from(1).unwrap(), ForecastHorizon::OneDay);
        assert_eq!(ForecastHorizon::try_from(7).unwrap().days(), 7);
        assert!(matches!(
            ForecastHorizon::try_from(3),
            Err(ForecastError::InvalidHorizon(3))
        ));
    }

    #[test]
    fn feature_vector_encodes_weekend_as_number() {
        let record = DayRecord {
            date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            ticket_count: 11,
            day_of_week: 5,
            is_weekend: true,
            lag_1: 9,
            lag_7: 14,
            rolling_7: 12.5,
        };
        assert_eq!(
            FeatureVector::from_record(&record).values(),
            &[5.0, 1.0, 9.0, 14.0, 12.5]
        );
    }
}
