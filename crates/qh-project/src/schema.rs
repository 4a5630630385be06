//! Scenario schema definitions.

use qh_calc::{CalcConfig, JayaramBaker2009};
use qh_model::{AttenuationCoefficients, OccurrenceModel, TectonicRegion, Truncation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub version: u32,
    pub name: String,
    /// Forecast duration the rupture probabilities refer to (years).
    #[serde(default = "default_time_span")]
    pub time_span_years: f64,
    pub sites: SitesDef,
    #[serde(default)]
    pub sources: Vec<SourceDef>,
    #[serde(default)]
    pub gmm: GmmDef,
    #[serde(default)]
    pub calc: CalcConfig,
    /// Intensity levels per intensity measure.
    #[serde(default)]
    pub levels: Vec<LevelsDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gmf: Option<GmfDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disagg: Option<DisaggDef>,
}

fn default_time_span() -> f64 {
    50.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SitesDef {
    List {
        sites: Vec<SiteDef>,
    },
    /// Rectangular grid, row by row from the south-west corner.
    Grid {
        min_lat: f64,
        max_lat: f64,
        min_lon: f64,
        max_lon: f64,
        spacing_deg: f64,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        params: BTreeMap<String, f64>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteDef {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Site parameters such as `vs30`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceDef {
    pub name: String,
    #[serde(default)]
    pub region: TectonicRegion,
    #[serde(default)]
    pub occurrence: OccurrenceModel,
    pub ruptures: Vec<RuptureDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuptureDef {
    pub magnitude: f64,
    #[serde(default)]
    pub rake: f64,
    /// Probability of at least one occurrence within the time span.
    #[serde(default)]
    pub probability: f64,
    pub surface: SurfaceDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SurfaceDef {
    Point { lat: f64, lon: f64, depth: f64 },
    /// Grid nodes as `[lat, lon, depth]`.
    Gridded { points: Vec<[f64; 3]> },
}

/// Ground-motion model selection. With `by_region` empty, `model` serves
/// every source; otherwise `model` fills the regions not listed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GmmDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelDef>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub by_region: BTreeMap<TectonicRegion, ModelDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelDef {
    Reference {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reference_vs30: Option<f64>,
        /// Replaces the built-in coefficient table.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        coefficients: Option<Vec<AttenuationCoefficients>>,
    },
}

impl Default for ModelDef {
    fn default() -> Self {
        Self::Reference {
            name: None,
            reference_vs30: None,
            coefficients: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LevelsDef {
    /// `PGA`, `PGV` or `SA(period)`.
    pub imt: String,
    pub values: LevelValuesDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum LevelValuesDef {
    Explicit(Vec<f64>),
    Sweep {
        start: f64,
        end: f64,
        num_points: usize,
        #[serde(default = "default_log_spacing")]
        logarithmic: bool,
    },
}

fn default_log_spacing() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GmfDef {
    pub imt: String,
    pub rupture: RuptureDef,
    #[serde(default)]
    pub region: TectonicRegion,
    #[serde(default)]
    pub include_inter_event: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation: Option<JayaramBaker2009>,
    #[serde(default)]
    pub truncation: Truncation,
    #[serde(default = "default_realizations")]
    pub realizations: usize,
    #[serde(default)]
    pub seed: u64,
}

fn default_realizations() -> usize {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisaggDef {
    pub imt: String,
    pub target: DisaggTargetDef,
    pub bins: BinsDef,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisaggTargetDef {
    /// Intensity in linear units.
    Iml { value: f64 },
    /// Exceedance probability; needs levels for the same intensity measure.
    Poe { value: f64 },
}

/// Bin edges per disaggregation axis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BinsDef {
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    pub magnitude: Vec<f64>,
    pub distance: Vec<f64>,
    pub epsilon: Vec<f64>,
}
