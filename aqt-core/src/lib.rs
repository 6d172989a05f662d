//! Core types for PM2.5 air quality analysis.
//!
//! A [`table::Table`] is loaded once from a `date,city,value` CSV file and
//! validated at that boundary. Analysis code works on per-city
//! [`observation::Series`] and never re-checks the schema.

pub mod date_range;
pub mod error;
pub mod observation;
pub mod table;
