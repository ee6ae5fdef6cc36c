use tracing::info;

use crate::aggregate::build_daily_series;
use crate::config::{DataSettings, ModelSettings};
use crate::error::Result;
use crate::forecast::forecast;
use crate::ingest::load_events;
use crate::models::{DailySeries, ForecastResult, StaffingConfig};
use crate::predictor::{load_model, Predictor};
use crate::staffing::StaffingCalculator;

/// Historical series and model for one run; built once, never mutated.
pub struct ForecastContext {
    series: DailySeries,
    predictor: Box<dyn Predictor>,
}

impl ForecastContext {
    pub fn new(series: DailySeries, predictor: Box<dyn Predictor>) -> Self {
        Self { series, predictor }
    }

    /// Loads the model before the ticket log so a missing model fails fast.
    pub fn load(data: &DataSettings, model: &ModelSettings) -> Result<Self> {
        let predictor = load_model(&model.path)?;
        let events = load_events(&data.tickets_csv, &data.timestamp_column)?;
        let series = build_daily_series(&events)?;
        Ok(Self::new(series, predictor))
    }

    pub fn series(&self) -> &DailySeries {
        &self.series
    }

    pub fn predictor(&self) -> &dyn Predictor {
        self.predictor.as_ref()
    }

    /// Forecasts the configured horizon and converts it into staffing numbers.
    pub fn run(&self, staffing: &StaffingConfig) -> Result<Vec<ForecastResult>> {
        let calculator = StaffingCalculator::new(i64::from(staffing.tickets_per_agent))?;
        let forecasts = forecast(
            &self.series,
            self.predictor(),
            staffing.forecast_horizon,
            staffing.propagation,
        )?;
        let results = calculator.staff(&forecasts);
        info!(
            days = results.len(),
            tickets_per_agent = calculator.tickets_per_agent(),
            propagation = staffing.propagation.as_str(),
            "forecast complete"
        );
        Ok(results)
    }
}
