//! Calculation parameters.

use crate::cutoff::MagDistCutoff;
use crate::error::{CalcError, CalcResult};
use qh_core::Real;
use qh_model::Truncation;
use serde::{Deserialize, Serialize};

/// Default maximum source-to-site distance (km).
pub const DEFAULT_MAX_DISTANCE: Real = 200.0;

/// Parameters shared by every hazard engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalcConfig {
    /// Sources and ruptures farther than this (Joyner-Boore, km) are skipped.
    /// A distance exactly equal is included.
    pub max_distance: Real,
    pub mag_dist_cutoff: Option<MagDistCutoff>,
    pub truncation: Truncation,
}

impl Default for CalcConfig {
    fn default() -> Self {
        Self {
            max_distance: DEFAULT_MAX_DISTANCE,
            mag_dist_cutoff: None,
            truncation: Truncation::None,
        }
    }
}

impl CalcConfig {
    pub fn validate(&self) -> CalcResult<()> {
        if self.max_distance.is_nan() || self.max_distance < 0.0 {
            return Err(CalcError::config(format!(
                "max_distance must be non-negative (got {})",
                self.max_distance
            )));
        }
        self.truncation.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_validation() {
        let config = CalcConfig::default();
        assert_eq!(config.max_distance, 200.0);
        config.validate().unwrap();

        let bad = CalcConfig {
            max_distance: f64::NAN,
            ..CalcConfig::default()
        };
        assert!(matches!(bad.validate(), Err(CalcError::Config { .. })));

        let bad = CalcConfig {
            truncation: Truncation::TwoSided { level: -1.0 },
            ..CalcConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: CalcConfig =
            serde_json::from_str(r#"{"mag_dist_cutoff": [[0.0, 50.0], [6.0, 150.0]]}"#).unwrap();
        assert_eq!(config.max_distance, DEFAULT_MAX_DISTANCE);
        let cutoff = config.mag_dist_cutoff.unwrap();
        assert_eq!(cutoff.cutoff_distance(6.5), 150.0);

        let unordered = serde_json::from_str::<CalcConfig>(
            r#"{"mag_dist_cutoff": [[6.0, 50.0], [5.0, 150.0]]}"#,
        );
        assert!(unordered.is_err());
    }
}
