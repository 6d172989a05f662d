/// Error types for loading and analysing PM2.5 data
use thiserror::Error;

/// Main error type for AQT operations
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Concentration outside the domain of the AQI mapping
    #[error("Invalid PM2.5 value: {0}. Must be a non-negative number")]
    InvalidInput(f64),

    /// Threshold must be non-negative
    #[error("Threshold must be non-negative, got {0}")]
    InvalidThreshold(f64),

    /// Percentile must lie in [0, 100]
    #[error("Percentile must be between 0 and 100, got {0}")]
    InvalidPercentile(f64),

    /// Threshold sweep bounds or step cannot produce a finite sweep
    #[error("Invalid threshold sweep from {from} to {to} by {step}")]
    InvalidSweep { from: f64, to: f64, step: f64 },

    /// Rolling window does not fit the input
    #[error("Window size ({window}) must be between 1 and the input length ({len})")]
    InvalidWindow { window: usize, len: usize },

    /// Unrecognized season name
    #[error("Invalid season '{0}'. Must be one of: winter, spring, summer, fall")]
    InvalidSeason(String),

    /// The input sequence has no entries
    #[error("Input cannot be empty")]
    EmptyInput,

    /// Every entry of the input is missing
    #[error("Cannot compute {0}: all values are missing")]
    AllMissing(&'static str),

    /// No observation falls in the requested season
    #[error("No data found for season '{0}'")]
    NoDataForSeason(String),

    /// Not enough valid points for the computation
    #[error("At least {needed} valid data points required, found {found}")]
    InsufficientData { needed: usize, found: usize },

    /// A required column is absent from the input table
    #[error("Required column '{0}' not found")]
    MissingColumn(String),

    /// Paired columns differ in length
    #[error("dates and values must have same length: {dates} != {values}")]
    LengthMismatch { dates: usize, values: usize },

    /// City filter matched nothing
    #[error("City '{city}' not found. Available cities: {}", .available.join(", "))]
    CityNotFound { city: String, available: Vec<String> },

    /// Date cell could not be parsed
    #[error("Invalid date '{value}' on line {line}, expected YYYY-MM-DD")]
    InvalidDate { line: u64, value: String },

    /// Failed to read or parse CSV data
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Failed to open the data file
    #[error("Failed to read data file: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Results using AnalysisError
pub type Result<T> = std::result::Result<T, AnalysisError>;
