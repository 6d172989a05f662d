//! Per-subcommand analyses, flattened into one row type per subcommand.

use anyhow::Context;
use aqt_analysis::aqi::{classify, AqiCategory};
use aqt_analysis::extremes::{
    by_percentile, by_threshold, consecutive_runs_with, threshold_sensitivity, GapPolicy,
};
use aqt_analysis::statistics::{exceedance_count, rolling_average, summarize};
use aqt_analysis::trends::{linear_trend, monthly_statistics, seasonal_average_for, Season};
use aqt_core::error::AnalysisError;
use aqt_core::observation::{Observation, Series};
use aqt_core::table::Table;
use chrono::NaiveDate;
use log::{info, warn};
use serde::Serialize;

fn city_of(series: &Series) -> String {
    series.city().unwrap_or_default().to_string()
}

#[derive(Debug, Serialize)]
pub struct CityRow {
    pub city: String,
    pub observations: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    /// Calendar days from first to last date, inclusive
    pub days_covered: usize,
}

#[derive(Debug, Serialize)]
pub struct SummaryRow {
    pub city: String,
    pub count: usize,
    pub missing: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub p25: f64,
    pub p75: f64,
    pub p95: f64,
    pub threshold: f64,
    pub exceedances: usize,
    /// AQI of the mean concentration
    pub aqi: u16,
    pub category: AqiCategory,
}

#[derive(Debug, Serialize)]
pub struct EpisodeRow {
    pub city: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration: usize,
    pub max_pm25: f64,
    pub mean_pm25: f64,
}

#[derive(Debug, Serialize)]
pub struct RollingRow {
    pub city: String,
    pub date: NaiveDate,
    pub value: Option<f64>,
    pub rolling_mean: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct TrendRow {
    pub city: String,
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub p_value: f64,
    pub points: usize,
}

#[derive(Debug, Serialize)]
pub struct SeasonalRow {
    pub city: String,
    pub season: Season,
    pub mean: f64,
}

#[derive(Debug, Serialize)]
pub struct MonthlyRow {
    pub city: String,
    pub month: u32,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct SensitivityRow {
    pub city: String,
    pub threshold: f64,
    pub exceedances: usize,
}

#[derive(Debug, Serialize)]
pub struct AqiRow {
    pub concentration: f64,
    pub index: u16,
    pub category: AqiCategory,
    pub color: &'static str,
    pub health_message: &'static str,
}

/// How the `extremes` subcommand picks its cutoff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExtremeSelection {
    Threshold(f64),
    Percentile(f64),
}

pub fn cities(table: &Table) -> Vec<CityRow> {
    table
        .series_by_city()
        .iter()
        .map(|series| {
            let span = series.span();
            CityRow {
                city: city_of(series),
                observations: series.len(),
                first_date: span.map(|s| s.0),
                last_date: span.map(|s| s.1),
                days_covered: span.map_or(0, |s| s.len_days()),
            }
        })
        .collect()
}

pub fn summary(series: &[Series], threshold: f64) -> anyhow::Result<Vec<SummaryRow>> {
    series
        .iter()
        .map(|s| -> anyhow::Result<SummaryRow> {
            let city = city_of(s);
            let values = s.values();
            let stats = summarize(&values).with_context(|| format!("summary for {}", city))?;
            let aqi = classify(stats.mean).with_context(|| format!("AQI for {}", city))?;
            Ok(SummaryRow {
                count: stats.count,
                missing: stats.missing,
                mean: stats.mean,
                median: stats.median,
                min: stats.min,
                max: stats.max,
                p25: stats.p25,
                p75: stats.p75,
                p95: stats.p95,
                threshold,
                exceedances: exceedance_count(&values, threshold),
                aqi: aqi.index,
                category: aqi.category,
                city,
            })
        })
        .collect()
}

pub fn extremes(series: &[Series], selection: ExtremeSelection) -> anyhow::Result<Vec<Observation>> {
    let mut rows = Vec::new();
    for s in series {
        let found = match selection {
            ExtremeSelection::Threshold(threshold) => by_threshold(s, threshold),
            ExtremeSelection::Percentile(pct) => by_percentile(s, pct),
        }
        .with_context(|| format!("extremes for {}", city_of(s)))?;
        rows.extend(found);
    }
    Ok(rows)
}

pub fn episodes(
    series: &[Series],
    threshold: f64,
    policy: GapPolicy,
) -> anyhow::Result<Vec<EpisodeRow>> {
    let mut rows = Vec::new();
    for s in series {
        let city = city_of(s);
        if policy == GapPolicy::Merge {
            let absent = s.missing_dates().len();
            if absent > 0 {
                warn!(
                    "{}: {} calendar days have no row; episodes may run across them (--split-gaps breaks runs there)",
                    city, absent
                );
            }
        }
        let found = consecutive_runs_with(s, threshold, policy)
            .with_context(|| format!("episodes for {}", city))?;
        info!("{}: {} episodes above {}", city, found.len(), threshold);
        rows.extend(found.into_iter().map(|e| EpisodeRow {
            city: city.clone(),
            start_date: e.start_date,
            end_date: e.end_date,
            duration: e.duration,
            max_pm25: e.max_pm25,
            mean_pm25: e.mean_pm25,
        }));
    }
    Ok(rows)
}

pub fn rolling(series: &[Series], window: usize) -> anyhow::Result<Vec<RollingRow>> {
    let mut rows = Vec::new();
    for s in series {
        let city = city_of(s);
        let values = s.values();
        let means = rolling_average(&values, window)
            .with_context(|| format!("rolling average for {}", city))?;
        rows.extend(
            s.iter()
                .zip(values)
                .zip(means)
                .map(|((obs, value), rolling_mean)| RollingRow {
                    city: city.clone(),
                    date: obs.date,
                    value,
                    rolling_mean,
                }),
        );
    }
    Ok(rows)
}

pub fn trends(series: &[Series]) -> anyhow::Result<Vec<TrendRow>> {
    series
        .iter()
        .map(|s| -> anyhow::Result<TrendRow> {
            let city = city_of(s);
            let fit = linear_trend(s).with_context(|| format!("trend for {}", city))?;
            Ok(TrendRow {
                city,
                slope: fit.slope,
                intercept: fit.intercept,
                r_squared: fit.r_squared,
                p_value: fit.p_value,
                points: fit.points,
            })
        })
        .collect()
}

/// Seasonal means. A season with no usable data for a city is skipped with
/// a warning rather than failing the whole report.
pub fn seasonal(series: &[Series], seasons: &[Season]) -> anyhow::Result<Vec<SeasonalRow>> {
    let mut rows = Vec::new();
    for s in series {
        let city = city_of(s);
        for &season in seasons {
            match seasonal_average_for(s, season) {
                Ok(mean) => rows.push(SeasonalRow {
                    city: city.clone(),
                    season,
                    mean,
                }),
                Err(e @ (AnalysisError::NoDataForSeason(_) | AnalysisError::AllMissing(_))) => {
                    warn!("{}: {}", city, e);
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("{} average for {}", season, city))
                }
            }
        }
    }
    Ok(rows)
}

pub fn monthly(series: &[Series]) -> Vec<MonthlyRow> {
    series
        .iter()
        .flat_map(|s| {
            let city = city_of(s);
            monthly_statistics(s).into_iter().map(move |m| MonthlyRow {
                city: city.clone(),
                month: m.month,
                mean: m.mean,
                median: m.median,
                min: m.min,
                max: m.max,
                count: m.count,
            })
        })
        .collect()
}

pub fn sensitivity(series: &[Series], thresholds: &[f64]) -> anyhow::Result<Vec<SensitivityRow>> {
    let mut rows = Vec::new();
    for s in series {
        let city = city_of(s);
        let points = threshold_sensitivity(s, thresholds)
            .with_context(|| format!("sensitivity for {}", city))?;
        rows.extend(points.into_iter().map(|p| SensitivityRow {
            city: city.clone(),
            threshold: p.threshold,
            exceedances: p.exceedances,
        }));
    }
    Ok(rows)
}

pub fn aqi(concentration: f64) -> anyhow::Result<AqiRow> {
    let result = classify(concentration)?;
    Ok(AqiRow {
        concentration,
        index: result.index,
        category: result.category,
        color: result.color,
        health_message: result.health_message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::select_series;

    const CSV: &str = "\
date,city,pollutant,value
2024-01-01,Fresno,PM2.5,40.0
2024-01-02,Fresno,PM2.5,45.0
2024-01-03,Fresno,PM2.5,12.0
2024-01-04,Fresno,PM2.5,
2024-01-06,Fresno,PM2.5,60.0
2024-01-07,Fresno,PM2.5,38.0
2024-01-01,Denver,PM2.5,5.0
2024-01-02,Denver,PM2.5,8.0
2024-01-03,Denver,PM2.5,11.0
";

    fn all_series() -> Vec<Series> {
        let table = Table::from_csv_str(CSV).unwrap();
        select_series(&table, None).unwrap()
    }

    fn fresno() -> Vec<Series> {
        let table = Table::from_csv_str(CSV).unwrap();
        select_series(&table, Some("Fresno")).unwrap()
    }

    #[test]
    fn test_cities() {
        let table = Table::from_csv_str(CSV).unwrap();
        let rows = cities(&table);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].city, "Denver");
        assert_eq!(rows[1].observations, 6);
        assert_eq!(rows[1].last_date, NaiveDate::from_ymd_opt(2024, 1, 7));
        assert_eq!(rows[1].days_covered, 7);
    }

    #[test]
    fn test_summary() {
        let rows = summary(&all_series(), 35.0).unwrap();
        let denver = &rows[0];
        assert_eq!(denver.city, "Denver");
        assert_eq!(denver.count, 3);
        assert_eq!(denver.exceedances, 0);
        assert_eq!(denver.category, AqiCategory::Good);

        let fresno = &rows[1];
        assert_eq!(fresno.count, 5);
        assert_eq!(fresno.missing, 1);
        assert_eq!(fresno.exceedances, 4);
        assert_eq!(fresno.mean, 39.0);
        assert_eq!(fresno.category, AqiCategory::UnhealthyForSensitiveGroups);
    }

    #[test]
    fn test_extremes() {
        let rows = extremes(&fresno(), ExtremeSelection::Threshold(35.0)).unwrap();
        let values: Vec<f64> = rows.iter().filter_map(|o| o.value).collect();
        assert_eq!(values, vec![60.0, 45.0, 40.0, 38.0]);

        let rows = extremes(&fresno(), ExtremeSelection::Percentile(50.0)).unwrap();
        assert_eq!(rows.len(), 2);

        assert!(extremes(&fresno(), ExtremeSelection::Threshold(-1.0)).is_err());
    }

    #[test]
    fn test_episodes_policies() {
        let merged = episodes(&fresno(), 35.0, GapPolicy::Merge).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].duration, 2);
        assert_eq!(merged[0].city, "Fresno");

        // 01-05 has no row, but both runs sit on adjacent days
        let split = episodes(&fresno(), 35.0, GapPolicy::Split).unwrap();
        assert_eq!(split.len(), 2);
    }

    #[test]
    fn test_rolling() {
        let rows = rolling(&fresno(), 2).unwrap();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].rolling_mean, None);
        assert_eq!(rows[1].rolling_mean, Some(42.5));
        assert_eq!(rows[3].rolling_mean, None);
        assert_eq!(rows[5].rolling_mean, Some(49.0));

        let err = rolling(&all_series(), 4).unwrap_err();
        assert!(format!("{:#}", err).contains("Denver"));
    }

    #[test]
    fn test_trends() {
        let rows = trends(&all_series()).unwrap();
        assert_eq!(rows.len(), 2);
        assert!((rows[0].slope - 3.0).abs() < 1e-9);
        assert_eq!(rows[0].points, 3);
        assert_eq!(rows[1].points, 5);
    }

    #[test]
    fn test_seasonal_skips_empty_seasons() {
        let rows = seasonal(&all_series(), &Season::ALL).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.season == Season::Winter));
        assert!((rows[0].mean - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_monthly() {
        let rows = monthly(&all_series());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].city, "Fresno");
        assert_eq!(rows[1].count, 5);
        assert_eq!(rows[1].median, 40.0);
    }

    #[test]
    fn test_sensitivity() {
        let rows = sensitivity(&fresno(), &[15.0, 35.0, 50.0]).unwrap();
        let counts: Vec<usize> = rows.iter().map(|r| r.exceedances).collect();
        assert_eq!(counts, vec![4, 4, 1]);
    }

    #[test]
    fn test_aqi() {
        let row = aqi(35.4).unwrap();
        assert_eq!(row.index, 100);
        assert_eq!(row.category, AqiCategory::Moderate);
        assert!(aqi(-1.0).is_err());
    }
}
