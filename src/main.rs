use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

mod aggregate;
mod config;
mod context;
mod error;
mod forecast;
mod ingest;
mod logging;
mod models;
mod predictor;
mod report;
mod seed;
mod staffing;

use crate::config::{AppConfig, ConfigOverrides};
use crate::context::ForecastContext;
use crate::models::Propagation;

#[derive(Parser)]
#[command(name = "support-load-forecast", version)]
#[command(about = "Forecast support ticket volume and the agents needed to handle it", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "SUPPORT_LOAD_CONFIG")]
    config: Option<PathBuf>,

    /// Ticket log (CSV, one row per ticket)
    #[arg(long, global = true)]
    tickets_csv: Option<PathBuf>,

    /// Column holding the ticket creation timestamp
    #[arg(long, global = true)]
    timestamp_column: Option<String>,

    /// Model artifact (JSON)
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast ticket volume and staffing
    Forecast {
        #[command(flatten)]
        staffing: StaffingArgs,
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Show the aggregated daily history the model is fed
    History {
        #[arg(long, default_value_t = 14)]
        limit: usize,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        staffing: StaffingArgs,
        #[arg(long, default_value = "forecast_report.md")]
        out: PathBuf,
    },
    /// Write a sample ticket log and model to the configured paths
    Seed {
        /// First day of the sample log (moved back to its Monday)
        #[arg(long, default_value = "2024-01-01")]
        start: NaiveDate,
        #[arg(long, default_value_t = 56)]
        days: usize,
        /// Replace existing files at the configured paths
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
struct StaffingArgs {
    /// Tickets one agent handles per day (10-40)
    #[arg(long)]
    tickets_per_agent: Option<i64>,
    /// Days to forecast (1 or 7)
    #[arg(long)]
    horizon: Option<u32>,
    /// How synthetic days get their lag features
    #[arg(long, value_enum)]
    propagation: Option<Propagation>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_json);

    let mut config =
        AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    let staffing_args = match &cli.command {
        Commands::Forecast { staffing, .. } | Commands::Report { staffing, .. } => Some(staffing),
        _ => None,
    };
    config.apply(ConfigOverrides {
        tickets_csv: cli.tickets_csv.clone(),
        timestamp_column: cli.timestamp_column.clone(),
        model: cli.model.clone(),
        tickets_per_agent: staffing_args.and_then(|args| args.tickets_per_agent),
        forecast_horizon: staffing_args.and_then(|args| args.horizon),
        propagation: staffing_args.and_then(|args| args.propagation),
    });

    match cli.command {
        Commands::Forecast { format, .. } => {
            let staffing = config.staffing.validate()?;
            let context = ForecastContext::load(&config.data, &config.model)
                .context("failed to prepare forecast inputs")?;
            let results = context.run(&staffing).context("forecast failed")?;

            match format {
                OutputFormat::Json => {
                    let summary = report::ForecastSummary::new(&staffing, &results);
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                }
                OutputFormat::Table => {
                    println!("Forecast Results");
                    print!("{}", report::render_results(&results));
                    println!();
                    println!("Ticket Volume Forecast");
                    print!("{}", report::render_chart(&results));
                    println!();
                    println!("{}", report::recommendation(&results));
                }
            }
        }
        Commands::History { limit } => {
            let data = &config.data;
            let events = ingest::load_events(&data.tickets_csv, &data.timestamp_column)
                .context("failed to read ticket log")?;
            let series = aggregate::build_daily_series(&events)?;
            let records = series.records();
            let recent = &records[records.len().saturating_sub(limit)..];
            print!("{}", report::render_history(recent));
        }
        Commands::Report { out, .. } => {
            let staffing = config.staffing.validate()?;
            let context = ForecastContext::load(&config.data, &config.model)
                .context("failed to prepare forecast inputs")?;
            let results = context.run(&staffing).context("forecast failed")?;
            let markdown = report::build_report(&staffing, context.series(), &results);
            std::fs::write(&out, markdown)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Seed { start, days, force } => {
            seed::ensure_writable(&[&config.data.tickets_csv, &config.model.path], force)?;
            let written = seed::write_sample_log(&config.data.tickets_csv, start, days)?;
            seed::write_sample_model(&config.model.path)?;
            println!(
                "Wrote {written} tickets to {} and a sample model to {}.",
                config.data.tickets_csv.display(),
                config.model.path.display()
            );
        }
    }

    Ok(())
}
