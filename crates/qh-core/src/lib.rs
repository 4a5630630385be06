//! qh-core: stable foundation for quakeflow.
//!
//! Contains:
//! - error (shared error types)
//! - numeric (Real + tolerances + float helpers)
//! - geo (locations and great-circle distances)
//! - ids (stable compact IDs for sites and sources)
//! - progress (pollable rupture counter and stop flag)

pub mod error;
pub mod geo;
pub mod ids;
pub mod numeric;
pub mod progress;

// Re-exports: nice ergonomics for downstream crates
pub use error::{QhError, QhResult};
pub use geo::{EARTH_RADIUS_KM, Location, horizontal_distance, linear_distance};
pub use ids::*;
pub use numeric::*;
pub use progress::CalcProgress;
