//! Sites: geographic points with ground-condition attributes.

use qh_core::{Location, Real, SiteId};
use std::collections::BTreeMap;

/// Named numeric site attributes (Vs30, basin depths, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteParams(BTreeMap<String, Real>);

impl SiteParams {
    /// Time-averaged shear-wave velocity in the top 30 m (m/s).
    pub const VS30: &'static str = "vs30";
    /// Depth to the 1.0 km/s shear-wave horizon (m).
    pub const Z1PT0: &'static str = "z1pt0";
    /// Depth to the 2.5 km/s shear-wave horizon (km).
    pub const Z2PT5: &'static str = "z2pt5";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Real> {
        self.0.get(key).copied()
    }

    pub fn set(&mut self, key: impl Into<String>, value: Real) {
        self.0.insert(key.into(), value);
    }

    pub fn vs30(&self) -> Option<Real> {
        self.get(Self::VS30)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Real)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    id: SiteId,
    location: Location,
    params: SiteParams,
}

impl Site {
    pub fn new(id: SiteId, location: Location) -> Self {
        Self {
            id,
            location,
            params: SiteParams::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: Real) -> Self {
        self.params.set(key, value);
        self
    }

    pub fn with_params(mut self, params: SiteParams) -> Self {
        self.params = params;
        self
    }

    pub fn id(&self) -> SiteId {
        self.id
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn params(&self) -> &SiteParams {
        &self.params
    }
}
