//! Loading and narrowing the PM2.5 table for a subcommand.

use crate::DataArgs;
use anyhow::Context;
use aqt_core::observation::Series;
use aqt_core::table::Table;
use aqt_utils::dates::{format_date, parse_date};
use chrono::NaiveDate;
use log::info;

fn parse_bound(raw: Option<&str>, flag: &str) -> anyhow::Result<Option<NaiveDate>> {
    raw.map(|s| parse_date(s).with_context(|| format!("--{} expects YYYY-MM-DD, got '{}'", flag, s)))
        .transpose()
}

/// Read the CSV named by `--data` and apply the `--start` / `--end` bounds.
pub fn load_table(args: &DataArgs) -> anyhow::Result<Table> {
    let start = parse_bound(args.start.as_deref(), "start")?;
    let end = parse_bound(args.end.as_deref(), "end")?;
    if let (Some(start), Some(end)) = (start, end) {
        anyhow::ensure!(start <= end, "--start {} is after --end {}", start, end);
    }

    let table = Table::from_path(&args.data)
        .with_context(|| format!("Failed to load {}", args.data.display()))?;
    if start.is_none() && end.is_none() {
        return Ok(table);
    }
    let filtered = table.filter_by_date_range(start, end);
    info!(
        "{} of {} observations between {} and {}",
        filtered.len(),
        table.len(),
        start.as_ref().map_or_else(|| "the first date".to_string(), format_date),
        end.as_ref().map_or_else(|| "the last date".to_string(), format_date)
    );
    Ok(filtered)
}

/// The series of `city`, or of every city in name order when `city` is `None`.
pub fn select_series(table: &Table, city: Option<&str>) -> anyhow::Result<Vec<Series>> {
    match city {
        Some(city) => Ok(vec![table.series_for_city(city)?]),
        None => {
            let all = table.series_by_city();
            anyhow::ensure!(!all.is_empty(), "No observations to analyse");
            Ok(all)
        }
    }
}

/// Load the table and pick the requested series in one step.
pub fn load_series(args: &DataArgs) -> anyhow::Result<Vec<Series>> {
    let table = load_table(args)?;
    select_series(&table, args.city.as_deref())
}
