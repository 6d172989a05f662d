use crate::date_range::DateRange;
use chrono::NaiveDate;
use serde::Serialize;
use std::ops::Deref;

/// A single daily PM2.5 reading for one city.
///
/// `value` is `None` when the source row had no usable measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub city: String,
    /// Concentration in µg/m³
    pub value: Option<f64>,
}

impl Observation {
    pub fn new(date: NaiveDate, city: impl Into<String>, value: Option<f64>) -> Self {
        Observation {
            date,
            city: city.into(),
            value,
        }
    }

    /// The measurement, treating a stray NaN the same as a missing value.
    pub fn present_value(&self) -> Option<f64> {
        self.value.filter(|v| !v.is_nan())
    }
}

/// Observations for one city, sorted ascending by date.
///
/// Dates are expected to be unique; that is the caller's contract and is
/// not checked here.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series(Vec<Observation>);

impl Series {
    /// Build a series, sorting by date. The sort is stable, so rows sharing
    /// a date keep their input order.
    pub fn new(mut observations: Vec<Observation>) -> Self {
        observations.sort_by_key(|obs| obs.date);
        Series(observations)
    }

    /// Build a series of consecutive days starting at `start`.
    pub fn daily(city: &str, start: NaiveDate, values: &[Option<f64>]) -> Self {
        let observations = start
            .iter_days()
            .zip(values)
            .map(|(date, value)| Observation::new(date, city, *value))
            .collect();
        Series(observations)
    }

    /// City label of the first observation, if any.
    pub fn city(&self) -> Option<&str> {
        self.0.first().map(|obs| obs.city.as_str())
    }

    pub fn values(&self) -> Vec<Option<f64>> {
        self.0.iter().map(Observation::present_value).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.0.iter().map(|obs| obs.date).collect()
    }

    /// First and last date covered by the series.
    pub fn span(&self) -> Option<DateRange> {
        match (self.0.first(), self.0.last()) {
            (Some(first), Some(last)) => Some(DateRange(first.date, last.date)),
            _ => None,
        }
    }

    /// Calendar days inside the series span that have no row at all.
    pub fn missing_dates(&self) -> Vec<NaiveDate> {
        let Some(span) = self.span() else {
            return Vec::new();
        };
        let mut present = self.0.iter().map(|obs| obs.date).peekable();
        let mut missing = Vec::new();
        for day in span {
            while present.next_if(|date| *date < day).is_some() {}
            if present.next_if_eq(&day).is_none() {
                missing.push(day);
            }
        }
        missing
    }
}

impl Deref for Series {
    type Target = [Observation];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Observation>> for Series {
    fn from(value: Vec<Observation>) -> Self {
        Series::new(value)
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{Observation, Series};
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_series_sorts_by_date() {
        let series = Series::new(vec![
            Observation::new(day(3), "Fresno", Some(30.0)),
            Observation::new(day(1), "Fresno", Some(10.0)),
            Observation::new(day(2), "Fresno", None),
        ]);
        assert_eq!(series.dates(), vec![day(1), day(2), day(3)]);
        assert_eq!(series.values(), vec![Some(10.0), None, Some(30.0)]);
        assert_eq!(series.city(), Some("Fresno"));
        for obs in &series {
            assert_eq!(obs.city, "Fresno");
        }
    }

    #[test]
    fn test_daily_series() {
        let series = Series::daily("Denver", day(30), &[Some(1.0), Some(2.0), Some(3.0)]);
        assert_eq!(series.len(), 3);
        assert_eq!(series[2].date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(series.missing_dates(), Vec::<NaiveDate>::new());
    }

    #[test]
    fn test_present_value_treats_nan_as_missing() {
        let obs = Observation::new(day(1), "Phoenix", Some(f64::NAN));
        assert_eq!(obs.present_value(), None);
        let obs = Observation::new(day(1), "Phoenix", Some(12.5));
        assert_eq!(obs.present_value(), Some(12.5));
    }

    #[test]
    fn test_missing_dates() {
        let series = Series::new(vec![
            Observation::new(day(1), "Pittsburgh", Some(10.0)),
            Observation::new(day(2), "Pittsburgh", Some(10.0)),
            Observation::new(day(5), "Pittsburgh", Some(10.0)),
            Observation::new(day(7), "Pittsburgh", Some(10.0)),
        ]);
        assert_eq!(series.missing_dates(), vec![day(3), day(4), day(6)]);
        assert!(Series::default().missing_dates().is_empty());
    }
}
