//! Model-layer errors.

use qh_core::QhError;
use qh_curve::CurveError;
use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building model objects or querying a ground-motion model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Invalid {what}: {reason}")]
    Invalid { what: &'static str, reason: String },

    #[error("Ground-motion model '{model}' does not support {imt}")]
    UnsupportedImt { model: String, imt: String },

    #[error("Exceedance probability {value} cannot be inverted under {truncation}")]
    NotInvertible { value: f64, truncation: String },

    #[error("Core error: {0}")]
    Core(#[from] QhError),

    #[error("Curve error: {0}")]
    Curve(#[from] CurveError),
}
