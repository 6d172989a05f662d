//! Command implementations for the AQT CLI.
//!
//! Each subcommand loads a PM2.5 table, runs one analysis per city and
//! writes the resulting rows to stdout.

use aqt_analysis::extremes::{threshold_sweep, GapPolicy, EPA_24H_STANDARD, WHO_24H_GUIDELINE};
use aqt_analysis::trends::Season;
use clap::{Args, Subcommand};
use std::path::PathBuf;

pub mod load;
pub mod output;
pub mod report;

pub use output::OutputFormat;
use output::print_records;
use report::ExtremeSelection;

/// Input table and the slice of it to analyse.
#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    /// CSV with date, city and value columns
    #[arg(short, long, value_name = "CSV")]
    pub data: PathBuf,

    /// Only analyse this city (default: every city)
    #[arg(short, long)]
    pub city: Option<String>,

    /// Earliest date to include
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub start: Option<String>,

    /// Latest date to include
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub end: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the cities in a table with their date coverage
    Cities {
        #[command(flatten)]
        data: DataArgs,
    },

    /// Descriptive statistics, exceedance count and AQI of the mean per city
    Summary {
        #[command(flatten)]
        data: DataArgs,

        /// Exceedance threshold in µg/m³
        #[arg(short, long, default_value_t = EPA_24H_STANDARD)]
        threshold: f64,
    },

    /// Days above a threshold or above a percentile of the series
    Extremes {
        #[command(flatten)]
        data: DataArgs,

        /// Threshold in µg/m³ [default: 35]
        #[arg(short, long, conflicts_with = "percentile")]
        threshold: Option<f64>,

        /// Use a percentile cutoff instead; bare `--percentile` means 95
        #[arg(short, long, num_args = 0..=1, default_missing_value = "95")]
        percentile: Option<f64>,
    },

    /// Runs of consecutive days above a threshold
    Episodes {
        #[command(flatten)]
        data: DataArgs,

        /// Threshold in µg/m³
        #[arg(short, long, default_value_t = EPA_24H_STANDARD)]
        threshold: f64,

        /// End a run wherever a calendar day has no row
        #[arg(long)]
        split_gaps: bool,
    },

    /// Trailing moving average
    Rolling {
        #[command(flatten)]
        data: DataArgs,

        /// Window length in days
        #[arg(short, long, default_value_t = 7)]
        window: usize,
    },

    /// Linear trend of concentration over time
    Trend {
        #[command(flatten)]
        data: DataArgs,
    },

    /// Seasonal means pooled across years
    Seasonal {
        #[command(flatten)]
        data: DataArgs,

        /// winter, spring, summer or fall (default: all four)
        #[arg(short, long)]
        season: Option<String>,
    },

    /// Per-month statistics pooled across years
    Monthly {
        #[command(flatten)]
        data: DataArgs,
    },

    /// Exceedance counts over a sweep of thresholds
    Sensitivity {
        #[command(flatten)]
        data: DataArgs,

        /// Lowest threshold in µg/m³
        #[arg(long, default_value_t = WHO_24H_GUIDELINE)]
        from: f64,

        /// Highest threshold in µg/m³, included when reached by whole steps
        #[arg(long, default_value_t = 40.0)]
        to: f64,

        /// Spacing between thresholds in µg/m³
        #[arg(long, default_value_t = 1.0)]
        step: f64,
    },

    /// AQI of a single PM2.5 concentration
    Aqi {
        /// Concentration in µg/m³
        #[arg(allow_negative_numbers = true)]
        concentration: f64,
    },
}

pub fn run(command: Command, format: OutputFormat) -> anyhow::Result<()> {
    match command {
        Command::Cities { data } => {
            let table = load::load_table(&data)?;
            print_records(&report::cities(&table), format)
        }
        Command::Summary { data, threshold } => {
            let series = load::load_series(&data)?;
            print_records(&report::summary(&series, threshold)?, format)
        }
        Command::Extremes {
            data,
            threshold,
            percentile,
        } => {
            let selection = match percentile {
                Some(pct) => ExtremeSelection::Percentile(pct),
                None => ExtremeSelection::Threshold(threshold.unwrap_or(EPA_24H_STANDARD)),
            };
            let series = load::load_series(&data)?;
            print_records(&report::extremes(&series, selection)?, format)
        }
        Command::Episodes {
            data,
            threshold,
            split_gaps,
        } => {
            let policy = if split_gaps {
                GapPolicy::Split
            } else {
                GapPolicy::Merge
            };
            let series = load::load_series(&data)?;
            print_records(&report::episodes(&series, threshold, policy)?, format)
        }
        Command::Rolling { data, window } => {
            let series = load::load_series(&data)?;
            print_records(&report::rolling(&series, window)?, format)
        }
        Command::Trend { data } => {
            let series = load::load_series(&data)?;
            print_records(&report::trends(&series)?, format)
        }
        Command::Seasonal { data, season } => {
            let seasons = match season {
                Some(name) => vec![name.parse::<Season>()?],
                None => Season::ALL.to_vec(),
            };
            let series = load::load_series(&data)?;
            print_records(&report::seasonal(&series, &seasons)?, format)
        }
        Command::Monthly { data } => {
            let series = load::load_series(&data)?;
            print_records(&report::monthly(&series), format)
        }
        Command::Sensitivity {
            data,
            from,
            to,
            step,
        } => {
            let thresholds = threshold_sweep(from, to, step)?;
            let series = load::load_series(&data)?;
            print_records(&report::sensitivity(&series, &thresholds)?, format)
        }
        Command::Aqi { concentration } => print_records(&[report::aqi(concentration)?], format),
    }
}
