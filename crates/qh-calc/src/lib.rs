//! qh-calc: hazard engines for quakeflow.
//!
//! Engines:
//! - hazard curves per site (single and multi intensity measure), hazard maps
//! - uniform-hazard and deterministic spectra, Hazus return-period tables
//! - stochastic event sets and their hazard curves
//! - spatially correlated ground-motion fields
//! - disaggregation into location/magnitude/distance/epsilon bins
//!
//! All engines are plain functions over read-only inputs. Parameters
//! travel in [`CalcConfig`]; there is no global state.
//!
//! # Example
//!
//! ```
//! use qh_calc::*;
//! use qh_core::{Location, SiteId, SourceId};
//! use qh_curve::log_levels;
//! use qh_model::*;
//!
//! let site = Site::new(SiteId::from_index(0), Location::surface(34.0, -118.0).unwrap());
//! let rupture = Rupture::new(
//!     7.0,
//!     0.0,
//!     RuptureSurface::Point(Location::new(34.05, -118.0, 10.0).unwrap()),
//!     0.01,
//! )
//! .unwrap();
//! let forecast = Forecast::new(
//!     "single fault",
//!     50.0,
//!     vec![Source::new(
//!         SourceId::from_index(0),
//!         "fault",
//!         TectonicRegion::ActiveShallowCrust,
//!         OccurrenceModel::Poisson,
//!         vec![rupture],
//!     )],
//! )
//! .unwrap();
//!
//! let levels = log_levels(&[0.01, 0.1, 1.0]).unwrap();
//! let gmms = GmmSet::single(ReferenceAttenuation::default());
//! let curve = compute_hazard_curve(
//!     &levels,
//!     &site,
//!     &gmms,
//!     &forecast,
//!     &IntensityMeasure::Pga,
//!     &CalcConfig::default(),
//! )
//! .unwrap();
//! assert!(curve.is_non_increasing(0.0));
//! assert!(curve.y(0) <= 0.01 + 1e-12);
//! ```

pub mod config;
pub mod correlation;
pub mod cutoff;
pub mod disagg;
pub mod error;
pub mod event_set;
pub mod gmf;
pub mod gmm_set;
pub mod hazard_curve;
pub mod hazard_map;
pub mod sampling;
pub mod spectrum;
mod traversal;

pub use config::{CalcConfig, DEFAULT_MAX_DISTANCE};
pub use correlation::{CorrelationModel, JayaramBaker2009, cholesky_factor, correlation_matrix};
pub use cutoff::MagDistCutoff;
pub use disagg::{
    BinAxis, BinTensor, DisaggAxis, DisaggBins, DisaggResult, DisaggTarget, ModalBin,
    SourceContribution, disaggregate,
};
pub use error::{CalcError, CalcResult};
pub use event_set::{average_event_set_hazard_curve, draw_event_set, event_set_hazard_curve};
pub use gmf::{GmfGenerator, GmfOptions, GroundMotionField, generate_field, mean_field};
pub use gmm_set::GmmSet;
pub use hazard_curve::{
    annualized_rates, compute_hazard_curve, compute_hazard_curve_with_progress,
    deterministic_hazard_curve, probability_from_return_period,
};
pub use hazard_map::{HazardMap, SiteCurve, compute_hazard_map};
pub use spectrum::{
    CurveRequest, DeterministicTarget, HAZUS_DURATION_YEARS, HAZUS_RETURN_PERIODS, HazusCurves,
    HazusLevels, HazusRow, ImtCurve, compute_hazard_curves, compute_hazard_curves_with_progress,
    deterministic_spectrum, hazus_curves, iml_spectrum, probability_spectrum,
};
pub use traversal::SATURATION_LOG_LIMIT;
