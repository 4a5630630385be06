//! Curve errors.

use thiserror::Error;

pub type CurveResult<T> = Result<T, CurveError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurveError {
    #[error("Curve must contain at least one point")]
    Empty,

    #[error("x values must be strictly increasing (x[{index}]={prev}, x[{}]={next})", .index + 1)]
    NotIncreasing { index: usize, prev: f64, next: f64 },

    #[error("Length mismatch: {xs} x values, {ys} y values")]
    LengthMismatch { xs: usize, ys: usize },

    #[error("Non-finite {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("{what} = {value} is outside the curve domain")]
    OutOfDomain { what: &'static str, value: f64 },

    #[error("Invalid levels: {what}")]
    InvalidLevels { what: String },
}

impl From<qh_core::QhError> for CurveError {
    fn from(e: qh_core::QhError) -> Self {
        match e {
            qh_core::QhError::NonFinite { what, value } => CurveError::NonFinite { what, value },
            other => CurveError::InvalidLevels {
                what: other.to_string(),
            },
        }
    }
}
