//! Rupture surfaces and site-to-rupture distance measures.

use crate::error::{ModelError, ModelResult};
use qh_core::{Location, Real, horizontal_distance, linear_distance};
use std::slice;

/// Geometry of a rupture.
#[derive(Debug, Clone, PartialEq)]
pub enum RuptureSurface {
    /// Hypocentre-only rupture.
    Point(Location),
    /// Finite rupture sampled on a grid of points. `Rupture::new` rejects
    /// an empty grid.
    Gridded(Vec<Location>),
}

impl RuptureSurface {
    pub fn gridded(points: Vec<Location>) -> ModelResult<Self> {
        if points.is_empty() {
            return Err(ModelError::Invalid {
                what: "rupture surface",
                reason: "a gridded surface needs at least one point".to_string(),
            });
        }
        Ok(Self::Gridded(points))
    }

    pub fn points(&self) -> &[Location] {
        match self {
            Self::Point(loc) => slice::from_ref(loc),
            Self::Gridded(points) => points,
        }
    }

    /// Shortest 3-D distance from `site` to the surface (km).
    pub fn rupture_distance(&self, site: &Location) -> Real {
        self.points()
            .iter()
            .map(|p| linear_distance(site, p))
            .fold(Real::INFINITY, Real::min)
    }

    /// Joyner-Boore distance: shortest distance to the surface projection (km).
    pub fn jb_distance(&self, site: &Location) -> Real {
        self.points()
            .iter()
            .map(|p| horizontal_distance(site, p))
            .fold(Real::INFINITY, Real::min)
    }

    /// Surface point nearest to `site` in 3-D; `None` for an empty grid.
    pub fn closest_point(&self, site: &Location) -> Option<Location> {
        self.points()
            .iter()
            .map(|p| (linear_distance(site, p), *p))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, p)| p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(lat: f64, lon: f64, depth: f64) -> Location {
        Location::new(lat, lon, depth).unwrap()
    }

    #[test]
    fn point_source_distances() {
        let surface = RuptureSurface::Point(loc(0.0, 0.0, 10.0));
        let site = loc(0.0, 0.0, 0.0);
        assert!(surface.jb_distance(&site).abs() < 1e-9);
        assert!((surface.rupture_distance(&site) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn gridded_surface_uses_nearest_point() {
        let surface =
            RuptureSurface::gridded(vec![loc(0.0, 1.0, 5.0), loc(0.0, 0.1, 5.0), loc(0.0, 2.0, 5.0)])
                .unwrap();
        let site = loc(0.0, 0.0, 0.0);
        assert_eq!(surface.closest_point(&site), Some(loc(0.0, 0.1, 5.0)));
        assert!(surface.jb_distance(&site) < surface.rupture_distance(&site));
    }

    #[test]
    fn empty_grid_is_rejected() {
        assert!(RuptureSurface::gridded(vec![]).is_err());
    }
}
