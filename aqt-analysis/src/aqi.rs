//! PM2.5 concentration to Air Quality Index mapping.
//!
//! Uses the EPA 24-hour PM2.5 breakpoints. Within a band the index is
//! linearly interpolated:
//!
//! ```text
//! I = (I_high - I_low) / (C_high - C_low) * (C - C_low) + I_low
//! ```
//!
//! and rounded half away from zero. The published bands leave 0.1 µg/m³
//! steps between them (12.0 / 12.1); a concentration is assigned to the
//! first band whose upper bound it does not exceed, so those steps belong
//! to the upper band and every non-negative value matches exactly one band.

use aqt_core::error::{AnalysisError, Result};
use serde::{Serialize, Serializer};
use std::fmt;

/// The six EPA health categories, from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    pub fn label(&self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::VeryUnhealthy => "Very Unhealthy",
            AqiCategory::Hazardous => "Hazardous",
        }
    }
}

// serialized as the display label
impl Serialize for AqiCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One breakpoint band: a concentration interval and its index range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub c_low: f64,
    pub c_high: f64,
    pub i_low: u16,
    pub i_high: u16,
    pub category: AqiCategory,
    pub color: &'static str,
    pub message: &'static str,
}

/// EPA PM2.5 breakpoints, ascending and contiguous.
pub const BANDS: [Band; 6] = [
    Band {
        c_low: 0.0,
        c_high: 12.0,
        i_low: 0,
        i_high: 50,
        category: AqiCategory::Good,
        color: "#00E400",
        message: "Air quality is satisfactory.",
    },
    Band {
        c_low: 12.1,
        c_high: 35.4,
        i_low: 51,
        i_high: 100,
        category: AqiCategory::Moderate,
        color: "#FFFF00",
        message: "Acceptable for most, but sensitive groups may be affected.",
    },
    Band {
        c_low: 35.5,
        c_high: 55.4,
        i_low: 101,
        i_high: 150,
        category: AqiCategory::UnhealthyForSensitiveGroups,
        color: "#FF7E00",
        message: "Sensitive groups may experience health effects.",
    },
    Band {
        c_low: 55.5,
        c_high: 150.4,
        i_low: 151,
        i_high: 200,
        category: AqiCategory::Unhealthy,
        color: "#FF0000",
        message: "Everyone may begin to experience health effects.",
    },
    Band {
        c_low: 150.5,
        c_high: 250.4,
        i_low: 201,
        i_high: 300,
        category: AqiCategory::VeryUnhealthy,
        color: "#8F3F97",
        message: "Health alert: everyone may experience serious effects.",
    },
    Band {
        c_low: 250.5,
        c_high: 500.4,
        i_low: 301,
        i_high: 500,
        category: AqiCategory::Hazardous,
        color: "#7E0023",
        message: "Health warnings of emergency conditions.",
    },
];

/// Highest concentration on the index scale; anything above maps to 500.
pub const MAX_CONCENTRATION: f64 = 500.4;

const BEYOND_SCALE_MESSAGE: &str =
    "Health warnings of emergency conditions. Entire population more likely to be affected.";

/// Index value, category and advisory for one concentration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AqiResult {
    pub index: u16,
    pub category: AqiCategory,
    pub color: &'static str,
    pub health_message: &'static str,
}

impl Band {
    fn index_for(&self, concentration: f64) -> u16 {
        let slope = f64::from(self.i_high - self.i_low) / (self.c_high - self.c_low);
        let raw = slope * (concentration - self.c_low) + f64::from(self.i_low);
        raw.round()
            .clamp(f64::from(self.i_low), f64::from(self.i_high)) as u16
    }
}

/// Map a PM2.5 concentration (µg/m³) to its AQI.
pub fn classify(concentration: f64) -> Result<AqiResult> {
    if !concentration.is_finite() || concentration < 0.0 {
        return Err(AnalysisError::InvalidInput(concentration));
    }
    let result = match BANDS.iter().find(|band| concentration <= band.c_high) {
        Some(band) => AqiResult {
            index: band.index_for(concentration),
            category: band.category,
            color: band.color,
            health_message: band.message,
        },
        None => {
            let top = &BANDS[BANDS.len() - 1];
            AqiResult {
                index: top.i_high,
                category: top.category,
                color: top.color,
                health_message: BEYOND_SCALE_MESSAGE,
            }
        }
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_table_is_contiguous() {
        assert_eq!(BANDS[0].c_low, 0.0);
        assert_eq!(BANDS[0].i_low, 0);
        assert_eq!(BANDS[BANDS.len() - 1].i_high, 500);
        assert_eq!(BANDS[BANDS.len() - 1].c_high, MAX_CONCENTRATION);
        for band in &BANDS {
            assert!(band.c_low < band.c_high);
            assert!(band.i_low < band.i_high);
        }
        for pair in BANDS.windows(2) {
            let (lower, upper) = (&pair[0], &pair[1]);
            assert_eq!(upper.i_low, lower.i_high + 1);
            assert!((upper.c_low - lower.c_high - 0.1).abs() < 1e-9);
            assert!(lower.category < upper.category);
        }
    }

    #[test]
    fn test_categories() {
        let cases = [
            (10.0, AqiCategory::Good, "#00E400"),
            (25.0, AqiCategory::Moderate, "#FFFF00"),
            (45.0, AqiCategory::UnhealthyForSensitiveGroups, "#FF7E00"),
            (100.0, AqiCategory::Unhealthy, "#FF0000"),
            (200.0, AqiCategory::VeryUnhealthy, "#8F3F97"),
            (300.0, AqiCategory::Hazardous, "#7E0023"),
        ];
        for (pm25, category, color) in cases {
            let observed = classify(pm25).unwrap();
            assert_eq!(observed.category, category);
            assert_eq!(observed.color, color);
        }
    }

    #[test]
    fn test_upper_bounds_are_inclusive() {
        let cases = [
            (12.0, AqiCategory::Good, 50),
            (35.4, AqiCategory::Moderate, 100),
            (55.4, AqiCategory::UnhealthyForSensitiveGroups, 150),
            (150.4, AqiCategory::Unhealthy, 200),
            (250.4, AqiCategory::VeryUnhealthy, 300),
            (500.4, AqiCategory::Hazardous, 500),
        ];
        for (pm25, category, index) in cases {
            let observed = classify(pm25).unwrap();
            assert_eq!(observed.category, category, "category at {}", pm25);
            assert_eq!(observed.index, index, "index at {}", pm25);
        }
    }

    #[test]
    fn test_lower_bounds() {
        assert_eq!(classify(0.0).unwrap().index, 0);
        assert_eq!(classify(12.1).unwrap().index, 51);
        assert_eq!(classify(35.5).unwrap().index, 101);
        assert_eq!(classify(55.5).unwrap().index, 151);
        assert_eq!(classify(150.5).unwrap().index, 201);
        assert_eq!(classify(250.5).unwrap().index, 301);
    }

    #[test]
    fn test_values_between_published_bands() {
        let observed = classify(12.05).unwrap();
        assert_eq!(observed.category, AqiCategory::Moderate);
        assert_eq!(observed.index, 51);

        let observed = classify(35.45).unwrap();
        assert_eq!(observed.category, AqiCategory::UnhealthyForSensitiveGroups);
        assert_eq!(observed.index, 101);
    }

    #[test]
    fn test_index_is_monotone() {
        let mut previous = classify(0.0).unwrap();
        for tenth in 1..=6000 {
            let current = classify(f64::from(tenth) / 10.0).unwrap();
            assert!(current.index >= previous.index);
            assert!(current.category >= previous.category);
            previous = current;
        }
    }

    #[test]
    fn test_rounding() {
        // 50 / 12 * 6.06 = 25.25
        assert_eq!(classify(6.06).unwrap().index, 25);
        // 50 / 12 * 1.2 = 5.0
        assert_eq!(classify(1.2).unwrap().index, 5);
        let observed = classify(79.04).unwrap();
        assert_eq!(observed.category, AqiCategory::Unhealthy);
        assert_eq!(observed.index, 163);
    }

    #[test]
    fn test_beyond_scale_clamps_to_500() {
        let observed = classify(600.0).unwrap();
        assert_eq!(observed.category, AqiCategory::Hazardous);
        assert_eq!(observed.index, 500);
        assert!(observed.health_message.starts_with("Health warnings"));
        assert_ne!(observed.health_message, BANDS[5].message);
    }

    #[test]
    fn test_invalid_input() {
        assert!(matches!(classify(-10.0), Err(AnalysisError::InvalidInput(_))));
        assert!(matches!(classify(-5.0), Err(AnalysisError::InvalidInput(_))));
        assert!(matches!(classify(f64::NAN), Err(AnalysisError::InvalidInput(_))));
        assert!(matches!(
            classify(f64::INFINITY),
            Err(AnalysisError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_serialized_labels() {
        let json = serde_json::to_string(&classify(45.0).unwrap()).unwrap();
        assert!(json.contains("\"category\":\"Unhealthy for Sensitive Groups\""));
        assert!(json.contains("\"index\":124"));
        assert_eq!(AqiCategory::VeryUnhealthy.to_string(), "Very Unhealthy");
        for band in BANDS {
            let json = serde_json::to_string(&band.category).unwrap();
            assert_eq!(json, format!("\"{}\"", band.category.label()));
        }
    }
}
