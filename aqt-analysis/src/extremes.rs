//! Extreme event detection over a city's daily series.
//!
//! Three views of "extreme": days above a fixed concentration, days above a
//! percentile of the series itself, and maximal runs of consecutive
//! exceeding days (episodes). Missing values never exceed anything.

use crate::statistics::{exceedance_count, percentile};
use aqt_core::error::{AnalysisError, Result};
use aqt_core::observation::Observation;
use aqt_utils::dates::days_between;
use chrono::NaiveDate;
use log::debug;
use serde::Serialize;

/// EPA 24-hour PM2.5 standard, µg/m³
pub const EPA_24H_STANDARD: f64 = 35.0;
/// WHO 24-hour PM2.5 guideline (2021), µg/m³
pub const WHO_24H_GUIDELINE: f64 = 15.0;
/// Upper edge of the "Unhealthy for Sensitive Groups" AQI band, µg/m³
pub const UNHEALTHY_SENSITIVE_UPPER: f64 = 55.4;

/// A maximal run of consecutive exceeding rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExceedanceEpisode {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Number of rows in the run
    pub duration: usize,
    pub max_pm25: f64,
    pub mean_pm25: f64,
}

/// How `consecutive_runs_with` treats calendar days absent from the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GapPolicy {
    /// Runs follow row adjacency only; an absent day between two exceeding
    /// rows does not end the run.
    #[default]
    Merge,
    /// Any break in the calendar ends the current run, so every episode
    /// satisfies `duration == end_date - start_date + 1`.
    Split,
}

/// Number of exceeding days at one threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensitivityPoint {
    pub threshold: f64,
    pub exceedances: usize,
}

fn validate_threshold(threshold: f64) -> Result<()> {
    if threshold.is_nan() || threshold < 0.0 {
        return Err(AnalysisError::InvalidThreshold(threshold));
    }
    Ok(())
}

fn exceeds(obs: &Observation, cutoff: f64) -> bool {
    obs.present_value().is_some_and(|v| v > cutoff)
}

/// Rows above `cutoff`, highest value first. The sort is stable.
fn rows_above(series: &[Observation], cutoff: f64) -> Vec<Observation> {
    let mut rows: Vec<Observation> = series
        .iter()
        .filter(|obs| exceeds(obs, cutoff))
        .cloned()
        .collect();
    rows.sort_by(|a, b| {
        let a = a.present_value().unwrap_or(f64::NEG_INFINITY);
        let b = b.present_value().unwrap_or(f64::NEG_INFINITY);
        b.total_cmp(&a)
    });
    rows
}

/// Days whose value is strictly greater than `threshold`, sorted by value
/// descending.
pub fn by_threshold(series: &[Observation], threshold: f64) -> Result<Vec<Observation>> {
    validate_threshold(threshold)?;
    if series.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    let rows = rows_above(series, threshold);
    debug!(
        "by_threshold: {} of {} rows above {}",
        rows.len(),
        series.len(),
        threshold
    );
    Ok(rows)
}

/// Days strictly above the `pct`-th percentile of the series' own present
/// values, sorted by value descending.
pub fn by_percentile(series: &[Observation], pct: f64) -> Result<Vec<Observation>> {
    if !(0.0..=100.0).contains(&pct) {
        return Err(AnalysisError::InvalidPercentile(pct));
    }
    if series.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    let values: Vec<Option<f64>> = series.iter().map(Observation::present_value).collect();
    let cutoff = percentile(&values, pct)?;
    let rows = rows_above(series, cutoff);
    debug!(
        "by_percentile: p{} cutoff {:.3}, {} rows above",
        pct,
        cutoff,
        rows.len()
    );
    Ok(rows)
}

fn close_run(run: &mut Vec<&Observation>, episodes: &mut Vec<ExceedanceEpisode>) {
    let run = std::mem::take(run);
    let (Some(first), Some(last)) = (run.first(), run.last()) else {
        return;
    };
    let values: Vec<f64> = run.iter().filter_map(|obs| obs.present_value()).collect();
    let max_pm25 = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean_pm25 = values.iter().sum::<f64>() / values.len() as f64;
    episodes.push(ExceedanceEpisode {
        start_date: first.date,
        end_date: last.date,
        duration: run.len(),
        max_pm25,
        mean_pm25,
    });
}

/// Maximal runs of consecutive rows above `threshold` using
/// [`GapPolicy::Merge`].
pub fn consecutive_runs(series: &[Observation], threshold: f64) -> Result<Vec<ExceedanceEpisode>> {
    consecutive_runs_with(series, threshold, GapPolicy::Merge)
}

/// Maximal runs of consecutive rows above `threshold`.
///
/// Rows are taken in date order. Episodes are returned longest first, then
/// by peak value descending; remaining ties stay in chronological order.
pub fn consecutive_runs_with(
    series: &[Observation],
    threshold: f64,
    policy: GapPolicy,
) -> Result<Vec<ExceedanceEpisode>> {
    validate_threshold(threshold)?;
    if series.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }

    let mut ordered: Vec<&Observation> = series.iter().collect();
    ordered.sort_by_key(|obs| obs.date);

    let mut episodes = Vec::new();
    let mut run: Vec<&Observation> = Vec::new();
    for obs in ordered {
        if !exceeds(obs, threshold) {
            close_run(&mut run, &mut episodes);
            continue;
        }
        if policy == GapPolicy::Split {
            if let Some(previous) = run.last() {
                if days_between(&previous.date, &obs.date) != 1 {
                    close_run(&mut run, &mut episodes);
                }
            }
        }
        run.push(obs);
    }
    close_run(&mut run, &mut episodes);

    episodes.sort_by(|a, b| {
        b.duration
            .cmp(&a.duration)
            .then_with(|| b.max_pm25.total_cmp(&a.max_pm25))
    });
    debug!(
        "consecutive_runs: {} episodes above {} ({:?})",
        episodes.len(),
        threshold,
        policy
    );
    Ok(episodes)
}

/// Exceedance counts of one series at each of `thresholds`, in the given
/// order.
pub fn threshold_sensitivity(
    series: &[Observation],
    thresholds: &[f64],
) -> Result<Vec<SensitivityPoint>> {
    for &threshold in thresholds {
        validate_threshold(threshold)?;
    }
    if series.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    let values: Vec<Option<f64>> = series.iter().map(Observation::present_value).collect();
    Ok(thresholds
        .iter()
        .map(|&threshold| SensitivityPoint {
            threshold,
            exceedances: exceedance_count(&values, threshold),
        })
        .collect())
}

/// Most thresholds a single sweep may produce.
pub const MAX_SWEEP_POINTS: usize = 10_000;

/// Evenly spaced thresholds from `from` up to and including `to`.
///
/// Fails with [`AnalysisError::InvalidSweep`] when a bound or the step is
/// not finite, the step is not positive, `to < from`, or the sweep would
/// exceed [`MAX_SWEEP_POINTS`].
pub fn threshold_sweep(from: f64, to: f64, step: f64) -> Result<Vec<f64>> {
    let invalid = AnalysisError::InvalidSweep { from, to, step };
    if !(from.is_finite() && to.is_finite() && step.is_finite()) || step <= 0.0 || to < from {
        return Err(invalid);
    }
    validate_threshold(from)?;
    // tolerate accumulated rounding at the upper end
    let steps = ((to - from) / step + 1e-9).floor();
    if !steps.is_finite() || steps >= MAX_SWEEP_POINTS as f64 {
        return Err(invalid);
    }
    let steps = steps as usize;
    Ok((0..=steps).map(|i| from + i as f64 * step).collect())
}
