//! qh-results: persisted calculation results.

pub mod hash;
pub mod store;
pub mod types;

pub use hash::compute_run_id;
pub use store::ResultStore;
pub use types::*;

/// Version string folded into run ids.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Run not found: {run_id}")]
    RunNotFound { run_id: String },

    #[error("Invalid path: {message}")]
    InvalidPath { message: String },
}
