//! Statistical analysis of PM2.5 series.
//!
//! Every function here is a pure transformation of its inputs: it either
//! returns a complete result or a typed [`aqt_core::error::AnalysisError`].
//! Missing values are `None` and each aggregation states how it treats
//! them.

pub mod aqi;
pub mod distribution;
pub mod extremes;
pub mod statistics;
pub mod trends;
