//! Intensity measure types.

use crate::error::{ModelError, ModelResult};
use qh_core::Real;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ground-motion intensity measure.
///
/// PGA and SA are in units of g, PGV in cm/s. Spectral acceleration carries
/// its oscillator period in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntensityMeasure {
    Pga,
    Pgv,
    Sa { period: Real },
}

impl IntensityMeasure {
    pub fn sa(period: Real) -> ModelResult<Self> {
        if !(period.is_finite() && period > 0.0) {
            return Err(ModelError::Invalid {
                what: "spectral period",
                reason: format!("must be positive and finite (got {period})"),
            });
        }
        Ok(Self::Sa { period })
    }

    /// Oscillator period; PGA and PGV report 0.
    pub fn period(&self) -> Real {
        match self {
            Self::Sa { period } => *period,
            Self::Pga | Self::Pgv => 0.0,
        }
    }

    pub fn is_spectral(&self) -> bool {
        matches!(self, Self::Sa { .. })
    }
}

impl fmt::Display for IntensityMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pga => write!(f, "PGA"),
            Self::Pgv => write!(f, "PGV"),
            Self::Sa { period } => write!(f, "SA({period:?})"),
        }
    }
}

impl FromStr for IntensityMeasure {
    type Err = ModelError;

    /// Accepts `PGA`, `PGV`, `SA(0.3)` and `SA0.3`, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        match upper.as_str() {
            "PGA" => return Ok(Self::Pga),
            "PGV" => return Ok(Self::Pgv),
            _ => {}
        }
        let Some(rest) = upper.strip_prefix("SA") else {
            return Err(ModelError::Invalid {
                what: "intensity measure",
                reason: format!("unrecognised '{s}'"),
            });
        };
        let rest = rest
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .unwrap_or(rest);
        let period: Real = rest.trim().parse().map_err(|_| ModelError::Invalid {
            what: "intensity measure",
            reason: format!("bad spectral period in '{s}'"),
        })?;
        Self::sa(period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_spellings() {
        assert_eq!("pga".parse::<IntensityMeasure>().unwrap(), IntensityMeasure::Pga);
        assert_eq!("PGV".parse::<IntensityMeasure>().unwrap(), IntensityMeasure::Pgv);
        assert_eq!(
            "SA(1.0)".parse::<IntensityMeasure>().unwrap(),
            IntensityMeasure::Sa { period: 1.0 }
        );
        assert_eq!(
            "sa0.3".parse::<IntensityMeasure>().unwrap(),
            IntensityMeasure::Sa { period: 0.3 }
        );
        assert!("SA(-1)".parse::<IntensityMeasure>().is_err());
        assert!("MMI".parse::<IntensityMeasure>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for imt in [
            IntensityMeasure::Pga,
            IntensityMeasure::Pgv,
            IntensityMeasure::Sa { period: 0.3 },
        ] {
            assert_eq!(imt.to_string().parse::<IntensityMeasure>().unwrap(), imt);
        }
        assert_eq!(IntensityMeasure::Sa { period: 1.0 }.to_string(), "SA(1.0)");
    }

    #[test]
    fn period_of_peak_measures_is_zero() {
        assert_eq!(IntensityMeasure::Pga.period(), 0.0);
        assert_eq!(IntensityMeasure::sa(2.0).unwrap().period(), 2.0);
    }
}
