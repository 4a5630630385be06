//! Ground-motion model selection by tectonic region.

use crate::error::{CalcError, CalcResult};
use qh_model::{GroundMotionModel, IntensityMeasure, TectonicRegion};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// One model for every source, or one model per tectonic region.
#[derive(Clone)]
pub enum GmmSet {
    Single(Arc<dyn GroundMotionModel>),
    ByRegion(BTreeMap<TectonicRegion, Arc<dyn GroundMotionModel>>),
}

impl GmmSet {
    pub fn single(gmm: impl GroundMotionModel + 'static) -> Self {
        Self::Single(Arc::new(gmm))
    }

    /// A map holding a single model collapses to `Single`, so that model
    /// applies to every source regardless of its region tag.
    pub fn by_region(
        models: BTreeMap<TectonicRegion, Arc<dyn GroundMotionModel>>,
    ) -> CalcResult<Self> {
        if models.is_empty() {
            return Err(CalcError::config("ground-motion model map is empty"));
        }
        if models.len() == 1 {
            if let Some(gmm) = models.values().next() {
                return Ok(Self::Single(Arc::clone(gmm)));
            }
        }
        Ok(Self::ByRegion(models))
    }

    pub fn for_region(&self, region: TectonicRegion) -> CalcResult<&dyn GroundMotionModel> {
        match self {
            Self::Single(gmm) => Ok(gmm.as_ref()),
            Self::ByRegion(models) => models.get(&region).map(|g| g.as_ref()).ok_or_else(|| {
                CalcError::config(format!("no ground-motion model for tectonic region '{region}'"))
            }),
        }
    }

    pub fn models(&self) -> Vec<&dyn GroundMotionModel> {
        match self {
            Self::Single(gmm) => vec![gmm.as_ref()],
            Self::ByRegion(models) => models.values().map(|g| g.as_ref()).collect(),
        }
    }

    /// Fails when any model cannot produce `imt`.
    pub fn ensure_supports(&self, imt: &IntensityMeasure) -> CalcResult<()> {
        match self.models().into_iter().find(|g| !g.supports(imt)) {
            Some(gmm) => Err(CalcError::config(format!(
                "ground-motion model '{}' does not support {imt}",
                gmm.name()
            ))),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for GmmSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(gmm) => f.debug_tuple("Single").field(&gmm.name()).finish(),
            Self::ByRegion(models) => f
                .debug_map()
                .entries(models.iter().map(|(r, g)| (r, g.name())))
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qh_model::ReferenceAttenuation;

    fn named(name: &str) -> Arc<dyn GroundMotionModel> {
        Arc::new(ReferenceAttenuation {
            name: name.to_string(),
            ..ReferenceAttenuation::default()
        })
    }

    #[test]
    fn regional_lookup() {
        let set = GmmSet::by_region(BTreeMap::from([
            (TectonicRegion::ActiveShallowCrust, named("crust")),
            (TectonicRegion::SubductionInterface, named("interface")),
        ]))
        .unwrap();
        assert_eq!(
            set.for_region(TectonicRegion::SubductionInterface)
                .unwrap()
                .name(),
            "interface"
        );
        assert!(matches!(
            set.for_region(TectonicRegion::Volcanic),
            Err(CalcError::Config { .. })
        ));
        assert_eq!(set.models().len(), 2);
    }

    #[test]
    fn single_entry_map_serves_every_region() {
        let set =
            GmmSet::by_region(BTreeMap::from([(TectonicRegion::Volcanic, named("only"))])).unwrap();
        assert!(matches!(set, GmmSet::Single(_)));
        assert_eq!(
            set.for_region(TectonicRegion::StableShallowCrust)
                .unwrap()
                .name(),
            "only"
        );
        assert!(GmmSet::by_region(BTreeMap::new()).is_err());
    }

    #[test]
    fn unsupported_measure_is_reported() {
        let set = GmmSet::single(ReferenceAttenuation::default());
        set.ensure_supports(&IntensityMeasure::Pga).unwrap();
        let err = set
            .ensure_supports(&IntensityMeasure::Sa { period: 10.0 })
            .unwrap_err();
        assert!(err.to_string().contains("ReferenceAttenuation"));
    }
}
