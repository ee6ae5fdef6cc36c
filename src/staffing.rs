use crate::error::{ForecastError, Result};
use crate::models::{DayForecast, ForecastResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaffingCalculator {
    tickets_per_agent: u32,
}

impl StaffingCalculator {
    pub fn new(tickets_per_agent: i64) -> Result<Self> {
        if tickets_per_agent <= 0 {
            return Err(ForecastError::InvalidConfig(format!(
                "tickets per agent must be positive, got {tickets_per_agent}"
            )));
        }
        let tickets_per_agent = u32::try_from(tickets_per_agent).map_err(|_| {
            ForecastError::InvalidConfig(format!(
                "tickets per agent {tickets_per_agent} is out of range"
            ))
        })?;
        Ok(Self { tickets_per_agent })
    }

    pub fn tickets_per_agent(&self) -> u32 {
        self.tickets_per_agent
    }

    pub fn agents_required(&self, predicted_tickets: u32) -> u32 {
        predicted_tickets.div_ceil(self.tickets_per_agent)
    }

    pub fn staff(&self, forecasts: &[DayForecast]) -> Vec<ForecastResult> {
        forecasts
            .iter()
            .map(|day| ForecastResult {
                day_label: day.day_label.clone(),
                predicted_ticket_count: day.predicted_ticket_count,
                agents_required: self.agents_required(day.predicted_ticket_count),
            })
            .collect()
    }
}

pub fn recommended_agents(results: &[ForecastResult]) -> u32 {
    results
        .iter()
        .map(|result| result.agents_required)
        .max()
        .unwrap_or(0)
}
