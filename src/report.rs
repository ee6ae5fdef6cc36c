use std::fmt::Write;

use serde::Serialize;

use crate::models::{DailySeries, DayRecord, ForecastResult, Propagation, StaffingConfig};
use crate::staffing::recommended_agents;

const CHART_HEIGHT: usize = 8;
const CHART_COLUMN: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct ForecastSummary<'a> {
    pub tickets_per_agent: u32,
    pub forecast_horizon: u32,
    pub propagation: Propagation,
    pub results: &'a [ForecastResult],
    pub recommended_agents: u32,
}

impl<'a> ForecastSummary<'a> {
    pub fn new(staffing: &StaffingConfig, results: &'a [ForecastResult]) -> Self {
        Self {
            tickets_per_agent: staffing.tickets_per_agent,
            forecast_horizon: staffing.forecast_horizon.into(),
            propagation: staffing.propagation,
            results,
            recommended_agents: recommended_agents(results),
        }
    }
}

pub fn recommendation(results: &[ForecastResult]) -> String {
    let agents = recommended_agents(results);
    let noun = if agents == 1 { "agent" } else { "agents" };
    format!("Recommended staffing: {agents} {noun}")
}

pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(index) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let mut output = String::new();
    let header: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, &w)| format!("{h:<w$}"))
        .collect();
    let _ = writeln!(output, "{}", header.join("  ").trim_end());
    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    let _ = writeln!(output, "{}", rule.join("  "));

    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{cell:<w$}"))
            .collect();
        let _ = writeln!(output, "{}", cells.join("  ").trim_end());
    }

    output
}

pub fn render_results(results: &[ForecastResult]) -> String {
    let rows: Vec<Vec<String>> = results
        .iter()
        .map(|r| {
            vec![
                r.day_label.clone(),
                r.predicted_ticket_count.to_string(),
                r.agents_required.to_string(),
            ]
        })
        .collect();
    render_table(&["Day", "Predicted Tickets", "Agents Required"], &rows)
}

pub fn render_history(records: &[DayRecord]) -> String {
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| {
            vec![
                r.date.to_string(),
                r.ticket_count.to_string(),
                r.day_of_week.to_string(),
                if r.is_weekend { "yes" } else { "no" }.to_string(),
                r.lag_1.to_string(),
                r.lag_7.to_string(),
                format!("{:.2}", r.rolling_7),
            ]
        })
        .collect();
    render_table(
        &["Date", "Tickets", "Weekday", "Weekend", "Lag 1", "Lag 7", "Rolling 7"],
        &rows,
    )
}

/// Plots predicted tickets per day, scaled to a fixed number of rows.
pub fn render_chart(results: &[ForecastResult]) -> String {
    let mut output = String::new();
    if results.is_empty() {
        return output;
    }

    let max = results
        .iter()
        .map(|r| r.predicted_ticket_count)
        .max()
        .unwrap_or(0)
        .max(1);
    let levels: Vec<usize> = results
        .iter()
        .map(|r| {
            let scaled = f64::from(r.predicted_ticket_count) / f64::from(max);
            (scaled * (CHART_HEIGHT - 1) as f64).round() as usize
        })
        .collect();
    let label_width = max.to_string().len().max("Tickets".len());
    let _ = writeln!(output, "{:>label_width$}", "Tickets");

    for row in (0..CHART_HEIGHT).rev() {
        let label = match row {
            r if r == CHART_HEIGHT - 1 => max.to_string(),
            0 => "0".to_string(),
            _ => String::new(),
        };
        let mut line = format!("{label:>label_width$} |");
        for &level in &levels {
            let mark = if level == row { "o" } else { "" };
            let _ = write!(line, "{mark:^CHART_COLUMN$}");
        }
        let _ = writeln!(output, "{}", line.trim_end());
    }

    let _ = writeln!(
        output,
        "{:>label_width$} +{}",
        "",
        "-".repeat(CHART_COLUMN * levels.len())
    );
    let mut days = format!("{:>label_width$}  ", "Day");
    for index in 1..=levels.len() {
        let _ = write!(days, "{index:^CHART_COLUMN$}");
    }
    let _ = writeln!(output, "{}", days.trim_end());

    output
}

pub fn build_report(
    staffing: &StaffingConfig,
    series: &DailySeries,
    results: &[ForecastResult],
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Support Load Forecast");
    if let (Some(first), Some(last)) = (series.counts().first(), series.counts().last()) {
        let _ = writeln!(
            output,
            "Generated from ticket history {} to {} ({} days, {} with full features)",
            first.date,
            last.date,
            series.counts().len(),
            series.len()
        );
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "## Inputs");
    let _ = writeln!(output, "- Tickets per agent: {}", staffing.tickets_per_agent);
    let _ = writeln!(
        output,
        "- Forecast horizon: {} day(s)",
        staffing.forecast_horizon.days()
    );
    let _ = writeln!(
        output,
        "- Feature propagation: {}",
        staffing.propagation.as_str()
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent History");
    let recent = &series.records()[series.len().saturating_sub(7)..];
    if recent.is_empty() {
        let _ = writeln!(output, "No days with full features.");
    } else {
        let _ = writeln!(
            output,
            "| Date | Tickets | Weekday | Weekend | Lag 1 | Lag 7 | Rolling 7 |"
        );
        let _ = writeln!(output, "|---|---|---|---|---|---|---|");
        for record in recent {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} | {} | {:.2} |",
                record.date,
                record.ticket_count,
                record.day_of_week,
                if record.is_weekend { "yes" } else { "no" },
                record.lag_1,
                record.lag_7,
                record.rolling_7
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Forecast");
    if results.is_empty() {
        let _ = writeln!(output, "No forecast produced.");
    } else {
        let _ = writeln!(output, "| Day | Predicted Tickets | Agents Required |");
        let _ = writeln!(output, "|---|---|---|");
        for result in results {
            let _ = writeln!(
                output,
                "| {} | {} | {} |",
                result.day_label, result.predicted_ticket_count, result.agents_required
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recommendation");
    let _ = writeln!(output, "{}", recommendation(results));

    output
}
