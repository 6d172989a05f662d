//! Summary and windowed statistics over sequences of optional values.
//!
//! Missing-value policy: `mean`, `percentile`, `median`, `summarize` and
//! `exceedance_count` drop missing entries first. `rolling_average`
//! propagates them: any window holding a missing entry yields `None`.

use aqt_core::error::{AnalysisError, Result};
use log::debug;
use serde::Serialize;

/// Descriptive statistics of the present values of one sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStatistics {
    pub count: usize,
    pub missing: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub p25: f64,
    pub p75: f64,
    pub p95: f64,
}

/// Present values, with any NaN treated as missing.
pub(crate) fn present(values: &[Option<f64>]) -> Vec<f64> {
    values
        .iter()
        .filter_map(|v| v.filter(|x| !x.is_nan()))
        .collect()
}

/// Present values sorted ascending, failing when there are none.
fn sorted_present(values: &[Option<f64>], what: &'static str) -> Result<Vec<f64>> {
    if values.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    let mut clean = present(values);
    if clean.is_empty() {
        return Err(AnalysisError::AllMissing(what));
    }
    clean.sort_by(f64::total_cmp);
    Ok(clean)
}

fn average(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Arithmetic mean of the present values.
pub fn mean(values: &[Option<f64>]) -> Result<f64> {
    if values.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    let clean = present(values);
    if clean.is_empty() {
        return Err(AnalysisError::AllMissing("mean"));
    }
    Ok(average(&clean))
}

/// Trailing moving average with the same length as the input.
///
/// The first `window - 1` entries have insufficient history and are
/// `None`, as is any window containing a missing value.
pub fn rolling_average(values: &[Option<f64>], window: usize) -> Result<Vec<Option<f64>>> {
    if window < 1 || window > values.len() {
        return Err(AnalysisError::InvalidWindow {
            window,
            len: values.len(),
        });
    }
    let mut result = vec![None; window - 1];
    result.extend(values.windows(window).map(|slice| {
        let clean = present(slice);
        if clean.len() == window {
            Some(average(&clean))
        } else {
            None
        }
    }));
    Ok(result)
}

/// Number of present values strictly greater than `threshold`.
pub fn exceedance_count(values: &[Option<f64>], threshold: f64) -> usize {
    values
        .iter()
        .filter(|v| v.is_some_and(|x| x > threshold))
        .count()
}

/// Percentile of ascending-sorted, non-empty data by linear interpolation
/// between the two nearest order statistics.
pub(crate) fn percentile_of_sorted(sorted: &[f64], percentile: f64) -> f64 {
    let rank = percentile / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// The `percentile`-th percentile (0 to 100) of the present values.
pub fn percentile(values: &[Option<f64>], percentile: f64) -> Result<f64> {
    if !(0.0..=100.0).contains(&percentile) {
        return Err(AnalysisError::InvalidPercentile(percentile));
    }
    let sorted = sorted_present(values, "percentile")?;
    Ok(percentile_of_sorted(&sorted, percentile))
}

/// Median of the present values; the mean of the middle pair for even counts.
pub fn median(values: &[Option<f64>]) -> Result<f64> {
    let sorted = sorted_present(values, "median")?;
    Ok(percentile_of_sorted(&sorted, 50.0))
}

/// Count, location and spread of the present values.
pub fn summarize(values: &[Option<f64>]) -> Result<SummaryStatistics> {
    let sorted = sorted_present(values, "summary")?;
    let summary = SummaryStatistics {
        count: sorted.len(),
        missing: values.len() - sorted.len(),
        mean: average(&sorted),
        median: percentile_of_sorted(&sorted, 50.0),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        p25: percentile_of_sorted(&sorted, 25.0),
        p75: percentile_of_sorted(&sorted, 75.0),
        p95: percentile_of_sorted(&sorted, 95.0),
    };
    debug!(
        "summarize: {} present, {} missing",
        summary.count, summary.missing
    );
    Ok(summary)
}
