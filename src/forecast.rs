use chrono::Duration;
use tracing::debug;

use crate::aggregate::{derive_record, LAG_WINDOW};
use crate::error::{ForecastError, Result};
use crate::models::{
    DailySeries, DayForecast, DayRecord, FeatureVector, ForecastHorizon, Propagation,
};
use crate::predictor::{predict_ticket_count, Predictor};

/// Predicts `horizon` days ahead, feeding each prediction back as a synthetic row.
///
/// Each step reads the features of the last row of a private working copy of
/// `series`. With [`Propagation::Frozen`] the synthetic row is the previous
/// row with only its ticket count replaced, so every step after the first
/// sees the same features. [`Propagation::Recomputed`] advances the date and
/// rebuilds the lag features from the predicted counts instead.
pub fn forecast(
    series: &DailySeries,
    predictor: &dyn Predictor,
    horizon: ForecastHorizon,
    propagation: Propagation,
) -> Result<Vec<DayForecast>> {
    let mut working = WorkingSeries::from_series(series)?;
    let mut forecasts = Vec::with_capacity(horizon.days());

    for day in 1..=horizon.days() {
        let latest = working.latest().clone();
        let features = FeatureVector::from_record(&latest);
        let predicted = predict_ticket_count(predictor, &features)?;
        debug!(
            day,
            features = ?features.values(),
            predicted,
            "forecast step"
        );

        forecasts.push(DayForecast {
            day_label: format!("Day {day}"),
            predicted_ticket_count: predicted,
        });

        let next = match propagation {
            Propagation::Frozen => DayRecord {
                ticket_count: predicted,
                ..latest
            },
            Propagation::Recomputed => working.advance(&latest, predicted)?,
        };
        working.push(next);
    }

    Ok(forecasts)
}

/// Latest row plus every daily count seen so far, real and predicted.
struct WorkingSeries {
    latest: DayRecord,
    counts: Vec<u32>,
}

impl WorkingSeries {
    fn from_series(series: &DailySeries) -> Result<Self> {
        let latest = series
            .latest()
            .cloned()
            .ok_or(ForecastError::EmptyHistory {
                distinct_days: series.counts().len(),
            })?;
        Ok(Self {
            latest,
            counts: series.counts().iter().map(|day| day.ticket_count).collect(),
        })
    }

    fn latest(&self) -> &DayRecord {
        &self.latest
    }

    fn advance(&self, latest: &DayRecord, predicted: u32) -> Result<DayRecord> {
        let start = self.counts.len().saturating_sub(LAG_WINDOW);
        let mut history = self.counts[start..].to_vec();
        history.push(predicted);
        let date = latest.date + Duration::days(1);
        derive_record(date, &history).ok_or(ForecastError::EmptyHistory {
            distinct_days: self.counts.len(),
        })
    }

    fn push(&mut self, record: DayRecord) {
        self.counts.push(record.ticket_count);
        self.latest = record;
    }
}
