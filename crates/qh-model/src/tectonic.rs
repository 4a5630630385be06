//! Tectonic region tags used to pick a ground-motion model per source.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TectonicRegion {
    #[default]
    ActiveShallowCrust,
    StableShallowCrust,
    SubductionInterface,
    SubductionIntraslab,
    Volcanic,
}

impl TectonicRegion {
    pub const ALL: [TectonicRegion; 5] = [
        TectonicRegion::ActiveShallowCrust,
        TectonicRegion::StableShallowCrust,
        TectonicRegion::SubductionInterface,
        TectonicRegion::SubductionIntraslab,
        TectonicRegion::Volcanic,
    ];
}

impl fmt::Display for TectonicRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ActiveShallowCrust => "Active Shallow Crust",
            Self::StableShallowCrust => "Stable Shallow Crust",
            Self::SubductionInterface => "Subduction Interface",
            Self::SubductionIntraslab => "Subduction IntraSlab",
            Self::Volcanic => "Volcanic",
        };
        write!(f, "{name}")
    }
}
