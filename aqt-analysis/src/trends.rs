//! Temporal trend and seasonality statistics.
//!
//! Trends are ordinary least squares fits of concentration against the day
//! number (0001-01-01 = day 1), so the slope is in µg/m³ per day and the
//! intercept sits at day 0. Seasonal and monthly figures pool every year in
//! the series.

use crate::distribution::student_t_two_sided_p;
use crate::statistics::{percentile_of_sorted, present};
use aqt_core::error::{AnalysisError, Result};
use aqt_core::observation::Observation;
use aqt_utils::dates::ordinal_day;
use chrono::{Datelike, NaiveDate};
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Guards the t statistic against division by zero when `|r| == 1`.
const R_EPSILON: f64 = 1e-20;

/// Least squares fit of value against day number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendResult {
    /// Change per day
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Two-sided p-value for the null hypothesis of zero slope
    pub p_value: f64,
    /// Number of points used after discarding missing entries
    pub points: usize,
}

/// Meteorological seasons of the northern hemisphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Winter, Season::Spring, Season::Summer, Season::Fall];

    /// Calendar months (1-12) belonging to the season.
    pub fn months(&self) -> [u32; 3] {
        match self {
            Season::Winter => [12, 1, 2],
            Season::Spring => [3, 4, 5],
            Season::Summer => [6, 7, 8],
            Season::Fall => [9, 10, 11],
        }
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.months().contains(&date.month())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Season {
    type Err = AnalysisError;

    /// Case-insensitive; "autumn" is accepted for fall.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "winter" => Ok(Season::Winter),
            "spring" => Ok(Season::Spring),
            "summer" => Ok(Season::Summer),
            "fall" | "autumn" => Ok(Season::Fall),
            _ => Err(AnalysisError::InvalidSeason(s.to_string())),
        }
    }
}

/// Statistics of one calendar month pooled across years.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyAggregate {
    pub month: u32,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Present values only
    pub count: usize,
}

/// Fit a linear trend to a series, one point per observation with a value.
pub fn linear_trend(series: &[Observation]) -> Result<TrendResult> {
    let dates: Vec<Option<NaiveDate>> = series.iter().map(|obs| Some(obs.date)).collect();
    let values: Vec<Option<f64>> = series.iter().map(Observation::present_value).collect();
    linear_trend_columns(&dates, &values)
}

/// Fit a linear trend to parallel date and value columns. Pairs missing
/// either side are discarded.
pub fn linear_trend_columns(
    dates: &[Option<NaiveDate>],
    values: &[Option<f64>],
) -> Result<TrendResult> {
    if dates.len() != values.len() {
        return Err(AnalysisError::LengthMismatch {
            dates: dates.len(),
            values: values.len(),
        });
    }
    let (xs, ys): (Vec<f64>, Vec<f64>) = dates
        .iter()
        .zip(values)
        .filter_map(|(date, value)| {
            let date = (*date)?;
            let value = value.filter(|v| !v.is_nan())?;
            Some((ordinal_day(&date) as f64, value))
        })
        .unzip();
    if xs.len() < 2 {
        return Err(AnalysisError::InsufficientData {
            needed: 2,
            found: xs.len(),
        });
    }
    linear_regression(&xs, &ys)
}

/// Ordinary least squares of `ys` on `xs`. Pairs with a NaN on either side
/// are discarded.
pub fn linear_regression(xs: &[f64], ys: &[f64]) -> Result<TrendResult> {
    if xs.len() != ys.len() {
        return Err(AnalysisError::LengthMismatch {
            dates: xs.len(),
            values: ys.len(),
        });
    }
    let (xs, ys): (Vec<f64>, Vec<f64>) = xs
        .iter()
        .zip(ys)
        .filter(|(x, y)| !x.is_nan() && !y.is_nan())
        .map(|(x, y)| (*x, *y))
        .unzip();
    let n = xs.len();
    if n < 2 {
        return Err(AnalysisError::InsufficientData {
            needed: 2,
            found: n,
        });
    }

    let x_mean = xs.iter().sum::<f64>() / n as f64;
    let y_mean = ys.iter().sum::<f64>() / n as f64;
    let mut ss_x = 0.0;
    let mut ss_y = 0.0;
    let mut ss_xy = 0.0;
    for (x, y) in xs.iter().zip(&ys) {
        let dx = x - x_mean;
        let dy = y - y_mean;
        ss_x += dx * dx;
        ss_y += dy * dy;
        ss_xy += dx * dy;
    }
    if ss_x == 0.0 {
        // every x identical: a single distinct abscissa
        return Err(AnalysisError::InsufficientData {
            needed: 2,
            found: 1,
        });
    }

    let r = if ss_y == 0.0 {
        0.0
    } else {
        (ss_xy / (ss_x * ss_y).sqrt()).clamp(-1.0, 1.0)
    };
    let slope = ss_xy / ss_x;
    let intercept = y_mean - slope * x_mean;

    let p_value = if n == 2 {
        if ys[0] == ys[1] {
            1.0
        } else {
            0.0
        }
    } else {
        let df = (n - 2) as f64;
        let t = r * (df / ((1.0 - r + R_EPSILON) * (1.0 + r + R_EPSILON))).sqrt();
        student_t_two_sided_p(t, df)
    };

    debug!(
        "linear_regression: n={} slope={:.6} r2={:.4} p={:.4}",
        n,
        slope,
        r * r,
        p_value
    );
    Ok(TrendResult {
        slope,
        intercept,
        r_squared: r * r,
        p_value,
        points: n,
    })
}

/// Mean of present values in the named season, across all years.
pub fn seasonal_average(series: &[Observation], season: &str) -> Result<f64> {
    let season: Season = season.parse()?;
    seasonal_average_for(series, season)
}

pub fn seasonal_average_for(series: &[Observation], season: Season) -> Result<f64> {
    let values: Vec<Option<f64>> = series
        .iter()
        .filter(|obs| season.contains(&obs.date))
        .map(Observation::present_value)
        .collect();
    if values.is_empty() {
        return Err(AnalysisError::NoDataForSeason(season.to_string()));
    }
    let clean = present(&values);
    if clean.is_empty() {
        return Err(AnalysisError::AllMissing("seasonal average"));
    }
    debug!(
        "seasonal_average: {} present of {} rows in {}",
        clean.len(),
        values.len(),
        season
    );
    Ok(clean.iter().sum::<f64>() / clean.len() as f64)
}

/// Per-month statistics in ascending month order. Months without any
/// present value are left out.
pub fn monthly_statistics(series: &[Observation]) -> Vec<MonthlyAggregate> {
    let mut by_month: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for obs in series {
        if let Some(value) = obs.present_value() {
            by_month.entry(obs.date.month()).or_default().push(value);
        }
    }
    by_month
        .into_iter()
        .map(|(month, mut values)| {
            values.sort_by(f64::total_cmp);
            MonthlyAggregate {
                month,
                mean: values.iter().sum::<f64>() / values.len() as f64,
                median: percentile_of_sorted(&values, 50.0),
                min: values[0],
                max: values[values.len() - 1],
                count: values.len(),
            }
        })
        .collect()
}
