use crate::QhError;

/// Floating point type used throughout system
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, QhError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(QhError::NonFinite { what, value: v })
    }
}

/// Accepts values in the closed unit interval.
pub fn ensure_probability(v: Real, what: &'static str) -> Result<Real, QhError> {
    let v = ensure_finite(v, what)?;
    if (0.0..=1.0).contains(&v) {
        Ok(v)
    } else {
        Err(QhError::OutOfRange {
            what,
            value: v,
            min: 0.0,
            max: 1.0,
        })
    }
}

/// Clamp into [0, 1]; NaN maps to 0.
pub fn clamp_probability(v: Real) -> Real {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn ensure_probability_bounds() {
        assert_eq!(ensure_probability(0.0, "p").unwrap(), 0.0);
        assert_eq!(ensure_probability(1.0, "p").unwrap(), 1.0);
        assert!(matches!(
            ensure_probability(1.5, "p"),
            Err(QhError::OutOfRange { .. })
        ));
        assert!(matches!(
            ensure_probability(Real::INFINITY, "p"),
            Err(QhError::NonFinite { .. })
        ));
    }

    #[test]
    fn clamp_probability_handles_nan() {
        assert_eq!(clamp_probability(Real::NAN), 0.0);
        assert_eq!(clamp_probability(-0.1), 0.0);
        assert_eq!(clamp_probability(1.2), 1.0);
    }
}
