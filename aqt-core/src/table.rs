//! CSV loading and filtering for PM2.5 tables.
//!
//! # CSV Format
//!
//! A header row is required. The columns `date`, `city` and `value` must be
//! present (any order, case-insensitive); other columns such as `pollutant`
//! are ignored.
//!
//! ```text
//! date,city,pollutant,value
//! 2024-01-01,Fresno,PM2.5,18.2
//! 2024-01-02,Fresno,PM2.5,
//! ```
//!
//! Empty, non-numeric, NaN or negative values load as missing.

use crate::error::{AnalysisError, Result};
use crate::observation::{Observation, Series};
use aqt_utils::dates::parse_date_any;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use log::{info, warn};
use std::collections::BTreeSet;
use std::path::Path;

/// Columns every PM2.5 table must provide.
pub const REQUIRED_COLUMNS: [&str; 3] = ["date", "city", "value"];

/// All observations loaded from one CSV source, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    observations: Vec<Observation>,
}

/// Positions of the required columns within a header row.
struct ColumnIndex {
    date: usize,
    city: usize,
    value: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| AnalysisError::MissingColumn(name.to_string()))
        };
        Ok(ColumnIndex {
            date: find(REQUIRED_COLUMNS[0])?,
            city: find(REQUIRED_COLUMNS[1])?,
            value: find(REQUIRED_COLUMNS[2])?,
        })
    }
}

fn parse_value(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

impl Table {
    /// Load a table from CSV text.
    pub fn from_csv_str(csv_data: &str) -> Result<Self> {
        let rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(csv_data.as_bytes());
        Self::from_reader(rdr)
    }

    /// Load a table from a CSV file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);
        let table = Self::from_reader(rdr)?;
        info!(
            "loader: {} observations from {}",
            table.len(),
            path.as_ref().display()
        );
        Ok(table)
    }

    fn from_reader<R: std::io::Read>(mut rdr: csv::Reader<R>) -> Result<Self> {
        let columns = ColumnIndex::from_headers(rdr.headers()?)?;

        let mut observations = Vec::new();
        let mut missing = 0u32;
        for result in rdr.records() {
            let record = result?;
            let line = record.position().map_or(0, |p| p.line());
            let raw_date = record.get(columns.date).unwrap_or("");
            let date = parse_date_any(raw_date).map_err(|_| AnalysisError::InvalidDate {
                line,
                value: raw_date.to_string(),
            })?;
            let city = record.get(columns.city).unwrap_or("").trim();
            let value = record.get(columns.value).and_then(parse_value);
            if value.is_none() {
                missing += 1;
            }
            observations.push(Observation::new(date, city, value));
        }
        if missing > 0 {
            warn!("loader: {} rows have no usable value and load as missing", missing);
        }
        info!("loader: Loaded {} observations", observations.len());
        Ok(Table { observations })
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Every value in the table, across all cities.
    pub fn values(&self) -> Vec<Option<f64>> {
        self.observations
            .iter()
            .map(Observation::present_value)
            .collect()
    }

    /// Sorted list of unique city names.
    pub fn cities(&self) -> Vec<String> {
        self.observations
            .iter()
            .map(|obs| obs.city.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// The date-sorted series for one city.
    pub fn series_for_city(&self, city: &str) -> Result<Series> {
        let observations: Vec<Observation> = self
            .observations
            .iter()
            .filter(|obs| obs.city == city)
            .cloned()
            .collect();
        if observations.is_empty() {
            return Err(AnalysisError::CityNotFound {
                city: city.to_string(),
                available: self.cities(),
            });
        }
        Ok(Series::new(observations))
    }

    /// One series per city, in city name order.
    pub fn series_by_city(&self) -> Vec<Series> {
        self.cities()
            .iter()
            .filter_map(|city| self.series_for_city(city).ok())
            .collect()
    }

    /// Keep observations whose date lies within the inclusive bounds.
    /// A `None` bound leaves that side open.
    pub fn filter_by_date_range(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Table {
        let observations = self
            .observations
            .iter()
            .filter(|obs| start.map_or(true, |s| obs.date >= s))
            .filter(|obs| end.map_or(true, |e| obs.date <= e))
            .cloned()
            .collect();
        Table { observations }
    }
}

#[cfg(test)]
mod tests {
    use super::Table;
    use crate::error::AnalysisError;
    use chrono::NaiveDate;

    const CSV: &str = "\
date,city,pollutant,value
2024-01-02,Fresno,PM2.5,22.5
2024-01-01,Fresno,PM2.5,18.0
2024-01-01,Denver,PM2.5,7.1
2024-01-02,Denver,PM2.5,
2024-01-03,Denver,PM2.5,NaN
2024-01-04,Denver,PM2.5,-1.5
";

    #[test]
    fn load_table_from_csv() {
        let table = Table::from_csv_str(CSV).unwrap();
        assert_eq!(table.len(), 6);
        assert_eq!(table.cities(), vec!["Denver".to_string(), "Fresno".to_string()]);
        assert_eq!(
            table.values(),
            vec![Some(22.5), Some(18.0), Some(7.1), None, None, None]
        );
    }

    #[test]
    fn load_table_column_order_and_case() {
        let csv = "VALUE,City,Date\n12.0,Phoenix,2024-03-01\n";
        let table = Table::from_csv_str(csv).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.observations()[0].city, "Phoenix");
        assert_eq!(table.observations()[0].value, Some(12.0));
    }

    #[test]
    fn load_table_missing_column() {
        let csv = "date,city\n2024-01-01,Fresno\n";
        match Table::from_csv_str(csv) {
            Err(AnalysisError::MissingColumn(column)) => assert_eq!(column, "value"),
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn load_table_invalid_date() {
        let csv = "date,city,value\n2024-01-01,Fresno,1.0\nnot-a-date,Fresno,2.0\n";
        match Table::from_csv_str(csv) {
            Err(AnalysisError::InvalidDate { line, value }) => {
                assert_eq!(line, 3);
                assert_eq!(value, "not-a-date");
            }
            other => panic!("expected InvalidDate, got {:?}", other),
        }
    }

    #[test]
    fn series_for_city_is_sorted() {
        let table = Table::from_csv_str(CSV).unwrap();
        let fresno = table.series_for_city("Fresno").unwrap();
        assert_eq!(fresno.len(), 2);
        assert_eq!(fresno[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(fresno.values(), vec![Some(18.0), Some(22.5)]);
    }

    #[test]
    fn series_for_unknown_city() {
        let table = Table::from_csv_str(CSV).unwrap();
        let err = table.series_for_city("Boise").unwrap_err();
        assert_eq!(
            err.to_string(),
            "City 'Boise' not found. Available cities: Denver, Fresno"
        );
    }

    #[test]
    fn filter_by_date_range_bounds() {
        let table = Table::from_csv_str(CSV).unwrap();
        let jan2 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let jan3 = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();

        assert_eq!(table.filter_by_date_range(Some(jan2), None).len(), 4);
        assert_eq!(table.filter_by_date_range(None, Some(jan2)).len(), 4);
        assert_eq!(table.filter_by_date_range(Some(jan2), Some(jan3)).len(), 3);
        assert_eq!(table.filter_by_date_range(None, None).len(), 6);
    }

    #[test]
    fn series_by_city_covers_every_city() {
        let table = Table::from_csv_str(CSV).unwrap();
        let all = table.series_by_city();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].city(), Some("Denver"));
        assert_eq!(all[1].city(), Some("Fresno"));
    }
}
