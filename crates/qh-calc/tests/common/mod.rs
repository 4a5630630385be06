//! Shared fixtures for the engine tests.
#![allow(dead_code)]

use qh_core::{Location, SiteId, SourceId};
use qh_curve::{DiscretizedCurve, log_levels};
use qh_model::*;

/// Degrees of latitude per km along a meridian.
pub const DEG_PER_KM: f64 = 1.0 / 111.194_926_644_558_73;

/// Model returning the same prediction for every site and rupture.
#[derive(Debug, Clone)]
pub struct ConstantGmm {
    pub mean: f64,
    pub std: StdDevs,
}

impl ConstantGmm {
    /// Conditional exceedance of exactly 0.5 at `iml`.
    pub fn median_at(iml: f64) -> Self {
        Self {
            mean: iml.ln(),
            std: StdDevs::split(0.3, 0.4),
        }
    }

    pub fn total_only(mean: f64, sigma: f64) -> Self {
        Self {
            mean,
            std: StdDevs::total_only(sigma),
        }
    }
}

impl GroundMotionModel for ConstantGmm {
    fn name(&self) -> &str {
        "constant"
    }

    fn supports(&self, _imt: &IntensityMeasure) -> bool {
        true
    }

    fn predict(
        &self,
        _site: &Site,
        _rupture: &Rupture,
        _imt: &IntensityMeasure,
    ) -> ModelResult<GmmPrediction> {
        Ok(GmmPrediction {
            mean: self.mean,
            std: self.std,
        })
    }
}

pub fn site(index: u32, lat: f64, lon: f64) -> Site {
    Site::new(SiteId::from_index(index), Location::surface(lat, lon).unwrap())
        .with_param(SiteParams::VS30, 760.0)
}

pub fn origin_site() -> Site {
    site(0, 0.0, 0.0)
}

/// Point rupture `distance_km` north of the origin at 5 km depth.
pub fn rupture_north(magnitude: f64, distance_km: f64, probability: f64) -> Rupture {
    Rupture::new(
        magnitude,
        0.0,
        RuptureSurface::Point(Location::new(distance_km * DEG_PER_KM, 0.0, 5.0).unwrap()),
        probability,
    )
    .unwrap()
}

pub fn source(
    index: u32,
    occurrence: OccurrenceModel,
    region: TectonicRegion,
    ruptures: Vec<Rupture>,
) -> Source {
    Source::new(
        SourceId::from_index(index),
        format!("source-{index}"),
        region,
        occurrence,
        ruptures,
    )
}

pub fn poisson_source(index: u32, ruptures: Vec<Rupture>) -> Source {
    source(
        index,
        OccurrenceModel::Poisson,
        TectonicRegion::ActiveShallowCrust,
        ruptures,
    )
}

pub fn empirical_source(index: u32, ruptures: Vec<Rupture>) -> Source {
    source(
        index,
        OccurrenceModel::Empirical,
        TectonicRegion::ActiveShallowCrust,
        ruptures,
    )
}

pub fn forecast(sources: Vec<Source>) -> Forecast {
    Forecast::new("test", 50.0, sources).unwrap()
}

pub fn ln_levels(levels: &[f64]) -> DiscretizedCurve {
    log_levels(levels).unwrap()
}

/// A small mixed forecast around the origin.
pub fn mixed_forecast() -> Forecast {
    forecast(vec![
        poisson_source(
            0,
            vec![
                rupture_north(5.5, 8.0, 0.02),
                rupture_north(6.5, 15.0, 0.01),
                rupture_north(7.2, 40.0, 0.004),
            ],
        ),
        empirical_source(
            1,
            vec![rupture_north(6.0, 25.0, 0.05), rupture_north(6.8, 60.0, 0.03)],
        ),
        poisson_source(2, vec![rupture_north(7.5, 120.0, 0.002)]),
    ])
}
