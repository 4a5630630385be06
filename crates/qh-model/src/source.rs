//! Earthquake sources: named groups of ruptures sharing an occurrence model.

use crate::rupture::Rupture;
use crate::site::Site;
use crate::tectonic::TectonicRegion;
use qh_core::{Real, SourceId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How rupture probabilities within a source combine over the time span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccurrenceModel {
    /// Independent Poisson ruptures.
    #[default]
    Poisson,
    /// Ruptures are mutually exclusive outcomes; probabilities add.
    Empirical,
}

impl fmt::Display for OccurrenceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Poisson => write!(f, "Poisson"),
            Self::Empirical => write!(f, "Empirical"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    id: SourceId,
    name: String,
    tectonic_region: TectonicRegion,
    occurrence: OccurrenceModel,
    ruptures: Vec<Rupture>,
}

impl Source {
    /// Every rupture inherits the source's tectonic region.
    pub fn new(
        id: SourceId,
        name: impl Into<String>,
        tectonic_region: TectonicRegion,
        occurrence: OccurrenceModel,
        ruptures: Vec<Rupture>,
    ) -> Self {
        let ruptures = ruptures
            .into_iter()
            .map(|r| r.with_tectonic_region(tectonic_region))
            .collect();
        Self {
            id,
            name: name.into(),
            tectonic_region,
            occurrence,
            ruptures,
        }
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tectonic_region(&self) -> TectonicRegion {
        self.tectonic_region
    }

    pub fn occurrence(&self) -> OccurrenceModel {
        self.occurrence
    }

    pub fn is_poissonian(&self) -> bool {
        self.occurrence == OccurrenceModel::Poisson
    }

    pub fn num_ruptures(&self) -> usize {
        self.ruptures.len()
    }

    pub fn rupture(&self, index: usize) -> Option<&Rupture> {
        self.ruptures.get(index)
    }

    pub fn ruptures(&self) -> &[Rupture] {
        &self.ruptures
    }

    /// Smallest Joyner-Boore distance from the site to any rupture (km).
    /// Infinite for a source without ruptures.
    pub fn min_distance(&self, site: &Site) -> Real {
        self.ruptures
            .iter()
            .map(|r| r.jb_distance_to(site))
            .fold(Real::INFINITY, Real::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RuptureSurface;
    use qh_core::{Location, SiteId};

    #[test]
    fn ruptures_take_source_region_and_min_distance() {
        let r = |lon: f64| {
            Rupture::new(
                6.0,
                0.0,
                RuptureSurface::Point(Location::new(0.0, lon, 5.0).unwrap()),
                0.01,
            )
            .unwrap()
        };
        let src = Source::new(
            SourceId::from_index(3),
            "slab",
            TectonicRegion::SubductionIntraslab,
            OccurrenceModel::Empirical,
            vec![r(1.0), r(0.5)],
        );
        assert!(!src.is_poissonian());
        assert_eq!(src.num_ruptures(), 2);
        assert!(
            src.ruptures()
                .iter()
                .all(|r| r.tectonic_region() == TectonicRegion::SubductionIntraslab)
        );

        let site = Site::new(SiteId::from_index(0), Location::surface(0.0, 0.0).unwrap());
        let expected = src.rupture(1).unwrap().jb_distance_to(&site);
        assert_eq!(src.min_distance(&site), expected);
        assert!(src.rupture(2).is_none());
    }
}
