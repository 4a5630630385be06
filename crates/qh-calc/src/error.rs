//! Calculation errors.

use qh_core::QhError;
use qh_curve::CurveError;
use qh_model::ModelError;
use thiserror::Error;

pub type CalcResult<T> = Result<T, CalcError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    #[error("Configuration error: {what}")]
    Config { what: String },

    #[error(
        "Numerical saturation ({context}, source {source_index}, rupture {rupture_index}): \
         ln(1 - {probability}) is below -30"
    )]
    Saturation {
        context: String,
        source_index: usize,
        rupture_index: usize,
        probability: f64,
    },

    #[error("Ground-motion model '{model}' cannot {what}")]
    ModelCapability { model: String, what: String },

    #[error("Numerical failure: {what}")]
    Numeric { what: String },

    #[error("Calculation cancelled after {completed_sources} sources")]
    Cancelled { completed_sources: usize },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Curve error: {0}")]
    Curve(#[from] CurveError),

    #[error("Core error: {0}")]
    Core(#[from] QhError),
}

impl CalcError {
    pub(crate) fn config(what: impl Into<String>) -> Self {
        Self::Config { what: what.into() }
    }
}
