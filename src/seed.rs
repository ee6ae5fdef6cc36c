use std::path::Path;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use tracing::info;

use crate::error::{ForecastError, Result};
use crate::predictor::{LinearModel, ModelArtifact};

/// Typical tickets per weekday, Monday first.
const WEEKDAY_VOLUME: [u32; 7] = [42, 38, 36, 35, 31, 14, 11];
const CHANNELS: [&str; 3] = ["email", "chat", "phone"];

#[derive(Serialize)]
struct SeedTicket {
    ticket_id: String,
    created_at: String,
    channel: &'static str,
}

/// Deterministic ticket counts with a weekly shape and a small drift.
pub fn sample_daily_counts(days: usize) -> Vec<u32> {
    (0..days)
        .map(|offset| {
            let weekday = offset % 7;
            let week = (offset / 7) as u32;
            let wobble = ((offset * 7 + week as usize * 3) % 5) as u32;
            WEEKDAY_VOLUME[weekday] + week + wobble
        })
        .collect()
}

pub fn sample_model() -> ModelArtifact {
    ModelArtifact::Linear(LinearModel {
        intercept: 4.0,
        coefficients: vec![-0.8, -9.5, 0.35, 0.3, 0.4],
    })
}

/// Fails if any of `paths` already exists, unless `force` is set.
pub fn ensure_writable<P: AsRef<Path>>(paths: &[P], force: bool) -> Result<()> {
    if force {
        return Ok(());
    }
    for path in paths {
        let path: &Path = path.as_ref();
        if path.exists() {
            return Err(ForecastError::InvalidConfig(format!(
                "{} already exists; pass --force to overwrite it",
                path.display()
            )));
        }
    }
    Ok(())
}

/// Writes a sample ticket log starting on the Monday on or before `start`.
pub fn write_sample_log(csv_path: &Path, start: NaiveDate, days: usize) -> Result<usize> {
    if let Some(parent) = csv_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let monday = start - Duration::days(i64::from(start.weekday().num_days_from_monday()));
    let mut writer = csv::Writer::from_path(csv_path)?;
    let mut written = 0usize;

    for (offset, count) in sample_daily_counts(days).into_iter().enumerate() {
        let day = monday + Duration::days(offset as i64);
        for n in 0..count {
            let minutes = 8 * 60 + (n * 600 / count.max(1));
            let created_at = format!(
                "{} {:02}:{:02}:00",
                day.format("%Y-%m-%d"),
                minutes / 60,
                minutes % 60
            );
            written += 1;
            writer.serialize(SeedTicket {
                ticket_id: format!("T{written:06}"),
                created_at,
                channel: CHANNELS[written % CHANNELS.len()],
            })?;
        }
    }
    writer.flush()?;

    info!(path = %csv_path.display(), tickets = written, days, "sample ticket log written");
    Ok(written)
}

pub fn write_sample_model(model_path: &Path) -> Result<()> {
    if let Some(parent) = model_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_string_pretty(&sample_model()).map_err(std::io::Error::other)?;
    std::fs::write(model_path, body)?;
    info!(path = %model_path.display(), "sample model written");
    Ok(())
}
