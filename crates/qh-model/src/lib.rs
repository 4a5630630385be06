//! qh-model: earthquake forecast and ground-motion model layer for quakeflow.
//!
//! Provides:
//! - Sites with ground-condition attributes
//! - Rupture surfaces, ruptures, sources and forecasts
//! - Intensity measure types and tectonic region tags
//! - The `GroundMotionModel` capability consumed by the hazard engines
//! - Gaussian truncation policy for ground-motion residuals
//! - A reference attenuation relationship
//!
//! # Architecture
//!
//! Forecasts and ground-motion models are read-only during a calculation.
//! `GroundMotionModel` is a stateless trait: every query passes the site,
//! rupture and intensity measure explicitly, so a single model can serve
//! many threads at once.
//!
//! # Example
//!
//! ```
//! use qh_core::{Location, SiteId, SourceId};
//! use qh_model::*;
//!
//! let site = Site::new(SiteId::from_index(0), Location::surface(34.0, -118.0).unwrap())
//!     .with_param(SiteParams::VS30, 400.0);
//! let surface = RuptureSurface::Point(Location::new(34.1, -118.0, 8.0).unwrap());
//! let rupture = Rupture::new(6.5, 90.0, surface, 0.01).unwrap();
//! let source = Source::new(
//!     SourceId::from_index(0),
//!     "thrust",
//!     TectonicRegion::ActiveShallowCrust,
//!     OccurrenceModel::Poisson,
//!     vec![rupture],
//! );
//!
//! let gmm = ReferenceAttenuation::default();
//! let pred = gmm
//!     .predict(&site, &source.ruptures()[0], &IntensityMeasure::Pga)
//!     .unwrap();
//! assert!(pred.mean.exp() > 0.0);
//! ```

pub mod attenuation;
pub mod error;
pub mod forecast;
pub mod gmm;
pub mod imt;
pub mod rupture;
pub mod site;
pub mod source;
pub mod surface;
pub mod tectonic;
pub mod truncation;

// Re-exports for ergonomics
pub use attenuation::{AttenuationCoefficients, ReferenceAttenuation};
pub use error::{ModelError, ModelResult};
pub use forecast::{EventSet, Forecast, ForecastModel};
pub use gmm::{GmmPrediction, GroundMotionModel, StdDevs};
pub use imt::IntensityMeasure;
pub use rupture::Rupture;
pub use site::{Site, SiteParams};
pub use source::{OccurrenceModel, Source};
pub use surface::RuptureSurface;
pub use tectonic::TectonicRegion;
pub use truncation::{Truncation, inverse_normal_cdf, standard_normal_sf};
