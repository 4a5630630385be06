//! Result data types.

use qh_calc::{DisaggAxis, DisaggResult, GroundMotionField, HazusRow};
use qh_curve::DiscretizedCurve;
use qh_model::IntensityMeasure;
use serde::{Deserialize, Serialize};

pub type RunId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunManifest {
    pub run_id: RunId,
    pub scenario_name: String,
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub kind: ResultKind,
    pub engine_version: String,
}

impl RunManifest {
    /// Manifest stamped with the current time.
    pub fn new(
        run_id: RunId,
        scenario_name: impl Into<String>,
        kind: ResultKind,
        engine_version: impl Into<String>,
    ) -> Self {
        Self {
            run_id,
            scenario_name: scenario_name.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            kind,
            engine_version: engine_version.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResultKind {
    HazardCurves,
    HazardMap { imt: String, poe: f64 },
    Spectrum { poe: f64 },
    Hazus,
    Gmf { imt: String, realizations: usize, seed: u64 },
    Disagg { imt: String },
}

/// One hazard curve in linear intensity units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurveRecord {
    pub site: String,
    pub lat: f64,
    pub lon: f64,
    pub imt: String,
    pub iml: Vec<f64>,
    pub poe: Vec<f64>,
}

impl CurveRecord {
    /// From a curve whose x axis is ln(intensity).
    pub fn from_ln_curve(
        site: impl Into<String>,
        lat: f64,
        lon: f64,
        imt: &IntensityMeasure,
        curve: &DiscretizedCurve,
    ) -> Self {
        Self {
            site: site.into(),
            lat,
            lon,
            imt: imt.to_string(),
            iml: curve.xs().iter().map(|x| x.exp()).collect(),
            poe: curve.ys().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapPoint {
    pub site: String,
    pub lat: f64,
    pub lon: f64,
    /// `None` where the curve never reaches the probability.
    pub iml: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapRecord {
    pub imt: String,
    pub poe: f64,
    pub points: Vec<MapPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpectrumRecord {
    pub site: String,
    pub poe: f64,
    pub periods: Vec<f64>,
    pub iml: Vec<f64>,
}

impl SpectrumRecord {
    /// From a curve with x = period and y = intensity.
    pub fn from_spectrum(site: impl Into<String>, poe: f64, spectrum: &DiscretizedCurve) -> Self {
        Self {
            site: site.into(),
            poe,
            periods: spectrum.xs().to_vec(),
            iml: spectrum.ys().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct HazusRowRecord {
    pub return_period: f64,
    pub probability: f64,
    pub pga: f64,
    pub pgv: f64,
    pub sa_03: f64,
    pub sa_10: f64,
}

impl From<&HazusRow> for HazusRowRecord {
    fn from(row: &HazusRow) -> Self {
        Self {
            return_period: row.return_period,
            probability: row.probability,
            pga: row.pga,
            pgv: row.pgv,
            sa_03: row.sa_03,
            sa_10: row.sa_10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HazusRecord {
    pub site: String,
    pub duration_years: f64,
    pub rows: Vec<HazusRowRecord>,
}

/// Realizations of one scenario, `values[r][s]` for realization `r`, site `s`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GmfRecord {
    pub imt: String,
    pub sites: Vec<String>,
    pub seed: u64,
    pub values: Vec<Vec<f64>>,
}

impl GmfRecord {
    pub fn from_fields(
        sites: Vec<String>,
        seed: u64,
        imt: &IntensityMeasure,
        fields: &[GroundMotionField],
    ) -> Self {
        Self {
            imt: imt.to_string(),
            sites,
            seed,
            values: fields.iter().map(|f| f.values.clone()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModeRecord {
    /// Bin centres: lat offset, lon offset, magnitude, distance, epsilon.
    pub centers: [f64; 5],
    pub probability: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceShareRecord {
    pub name: String,
    pub probability: f64,
    pub fraction: f64,
}

/// Summary of a disaggregation with its magnitude-distance and epsilon
/// marginals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisaggRecord {
    pub site: String,
    pub imt: String,
    pub iml: f64,
    pub total_probability: f64,
    pub out_of_bounds_probability: f64,
    pub mean_magnitude: Option<f64>,
    pub mean_distance: Option<f64>,
    pub mean_epsilon: Option<f64>,
    pub mode: Option<ModeRecord>,
    pub magnitude_edges: Vec<f64>,
    pub distance_edges: Vec<f64>,
    /// `[magnitude][distance]`.
    pub magnitude_distance: Vec<Vec<f64>>,
    pub epsilon_edges: Vec<f64>,
    pub epsilon: Vec<f64>,
    pub sources: Vec<SourceShareRecord>,
}

impl DisaggRecord {
    pub fn from_result(site: impl Into<String>, result: &DisaggResult) -> Self {
        Self {
            site: site.into(),
            imt: result.imt.to_string(),
            iml: result.iml,
            total_probability: result.total_probability,
            out_of_bounds_probability: result.out_of_bounds_probability,
            mean_magnitude: result.mean_magnitude,
            mean_distance: result.mean_distance,
            mean_epsilon: result.mean_epsilon,
            mode: result.mode.as_ref().map(|m| ModeRecord {
                centers: m.centers,
                probability: m.probability,
            }),
            magnitude_edges: result.bins.magnitude.edges().to_vec(),
            distance_edges: result.bins.distance.edges().to_vec(),
            magnitude_distance: result.tensor.magnitude_distance(),
            epsilon_edges: result.bins.epsilon.edges().to_vec(),
            epsilon: result.tensor.marginal(DisaggAxis::Epsilon),
            sources: result
                .sources
                .iter()
                .map(|s| SourceShareRecord {
                    name: s.name.clone(),
                    probability: s.probability,
                    fraction: s.fraction,
                })
                .collect(),
        }
    }
}
