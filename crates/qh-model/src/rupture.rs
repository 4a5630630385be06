//! Earthquake ruptures.

use crate::error::{ModelError, ModelResult};
use crate::site::Site;
use crate::surface::RuptureSurface;
use crate::tectonic::TectonicRegion;
use qh_core::{Real, ensure_finite, ensure_probability};

/// One possible earthquake with its occurrence probability over the
/// forecast time span.
#[derive(Debug, Clone, PartialEq)]
pub struct Rupture {
    magnitude: Real,
    rake: Real,
    surface: RuptureSurface,
    probability: Real,
    tectonic_region: TectonicRegion,
}

impl Rupture {
    pub fn new(
        magnitude: Real,
        rake: Real,
        surface: RuptureSurface,
        probability: Real,
    ) -> ModelResult<Self> {
        ensure_finite(magnitude, "magnitude")?;
        ensure_finite(rake, "rake")?;
        if !(-180.0..=180.0).contains(&rake) {
            return Err(ModelError::Invalid {
                what: "rake",
                reason: format!("{rake} is outside [-180, 180]"),
            });
        }
        let probability = ensure_probability(probability, "rupture probability")?;
        if surface.points().is_empty() {
            return Err(ModelError::Invalid {
                what: "rupture surface",
                reason: "a gridded surface needs at least one point".to_string(),
            });
        }
        Ok(Self {
            magnitude,
            rake,
            surface,
            probability,
            tectonic_region: TectonicRegion::default(),
        })
    }

    pub fn with_tectonic_region(mut self, region: TectonicRegion) -> Self {
        self.tectonic_region = region;
        self
    }

    pub fn magnitude(&self) -> Real {
        self.magnitude
    }

    pub fn rake(&self) -> Real {
        self.rake
    }

    pub fn surface(&self) -> &RuptureSurface {
        &self.surface
    }

    pub fn probability(&self) -> Real {
        self.probability
    }

    pub fn tectonic_region(&self) -> TectonicRegion {
        self.tectonic_region
    }

    /// Shortest 3-D distance from the site to the rupture (km).
    pub fn distance_to(&self, site: &Site) -> Real {
        self.surface.rupture_distance(site.location())
    }

    /// Joyner-Boore distance from the site (km).
    pub fn jb_distance_to(&self, site: &Site) -> Real {
        self.surface.jb_distance(site.location())
    }

    /// Equivalent Poisson rate over the time span, `-ln(1 - q)`.
    pub fn equivalent_rate(&self) -> Real {
        -(-self.probability).ln_1p()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qh_core::Location;

    fn point() -> RuptureSurface {
        RuptureSurface::Point(Location::new(0.0, 0.0, 10.0).unwrap())
    }

    #[test]
    fn validates_inputs() {
        assert!(Rupture::new(6.0, 0.0, point(), 0.1).is_ok());
        assert!(Rupture::new(f64::NAN, 0.0, point(), 0.1).is_err());
        assert!(Rupture::new(6.0, 270.0, point(), 0.1).is_err());
        assert!(Rupture::new(6.0, 0.0, point(), 1.5).is_err());
        assert!(Rupture::new(6.0, 0.0, point(), -0.1).is_err());
    }

    #[test]
    fn empty_grid_surface_is_rejected() {
        let err = Rupture::new(6.0, 0.0, RuptureSurface::Gridded(vec![]), 0.1).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Invalid {
                what: "rupture surface",
                ..
            }
        ));
    }

    #[test]
    fn equivalent_rate_matches_log_form() {
        let r = Rupture::new(6.0, 0.0, point(), 0.2).unwrap();
        assert!((r.equivalent_rate() + (0.8_f64).ln()).abs() < 1e-15);
        let certain = Rupture::new(6.0, 0.0, point(), 1.0).unwrap();
        assert!(certain.equivalent_rate().is_infinite());
    }
}
