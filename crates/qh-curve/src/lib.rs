//! qh-curve: discretized functions for hazard calculations.
//!
//! Provides:
//! - `DiscretizedCurve`: ordered (x, y) pairs with strictly increasing x
//! - linear and log-log interpolation, including the "first x at y"
//!   inversion used to read intensities off hazard curves
//! - intensity-measure level generation (linear / logarithmic)
//!
//! # Example
//!
//! ```
//! use qh_curve::DiscretizedCurve;
//!
//! let curve = DiscretizedCurve::from_points(vec![0.1, 0.2, 0.4], vec![0.5, 0.1, 0.01]).unwrap();
//! let x = curve.first_x_at_y_log_log(0.1).unwrap();
//! assert!((x - 0.2).abs() < 1e-12);
//! ```

pub mod curve;
pub mod error;
pub mod levels;

pub use curve::DiscretizedCurve;
pub use error::{CurveError, CurveResult};
pub use levels::{ImlLevels, Spacing, USGS_PGA_LEVELS, log_levels};
