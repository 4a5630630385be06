//! Disaggregation of exceedance probability into magnitude, distance,
//! epsilon and location bins.
//!
//! Each rupture contributes an equivalent Poisson rate at the target level:
//! `r = -c ln(1 - q)` for Poisson sources, and for empirical sources the
//! source rate `-ln(1 - S)` shared in proportion to `q c`. With
//! `P = 1 - exp(-Σr)` (the hazard-curve value at the target) a rupture's
//! mass is `P r / Σr`, so binned plus out-of-bounds mass equals `P`.

use crate::config::CalcConfig;
use crate::error::{CalcError, CalcResult};
use crate::gmm_set::GmmSet;
use crate::hazard_curve::compute_hazard_curve;
use crate::traversal::{
    SATURATION_LOG_LIMIT, for_each_source_in_range, poisson_log_survival, rupture_in_range,
};
use qh_core::Real;
use qh_curve::DiscretizedCurve;
use qh_model::{
    ForecastModel, GroundMotionModel, IntensityMeasure, OccurrenceModel, Rupture, Site, Truncation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Half-open bins `[edges[i], edges[i + 1])` along one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Real>", into = "Vec<Real>")]
pub struct BinAxis {
    edges: Vec<Real>,
}

impl BinAxis {
    pub fn new(edges: Vec<Real>) -> CalcResult<Self> {
        if edges.len() < 2 {
            return Err(CalcError::config("a bin axis needs at least two edges"));
        }
        if let Some(bad) = edges.iter().find(|e| !e.is_finite()) {
            return Err(CalcError::config(format!("non-finite bin edge {bad}")));
        }
        if let Some(w) = edges.windows(2).find(|w| w[1] <= w[0]) {
            return Err(CalcError::config(format!(
                "bin edges must increase ({} then {})",
                w[0], w[1]
            )));
        }
        Ok(Self { edges })
    }

    /// `count` bins of equal `width` starting at `lower`.
    pub fn uniform(lower: Real, width: Real, count: usize) -> CalcResult<Self> {
        if !(width > 0.0) || count == 0 {
            return Err(CalcError::config(format!(
                "uniform bins need a positive width and count (width {width}, count {count})"
            )));
        }
        Self::new((0..=count).map(|i| lower + i as Real * width).collect())
    }

    pub fn edges(&self) -> &[Real] {
        &self.edges
    }

    pub fn num_bins(&self) -> usize {
        self.edges.len() - 1
    }

    pub fn lower(&self) -> Real {
        self.edges[0]
    }

    pub fn upper(&self) -> Real {
        self.edges[self.edges.len() - 1]
    }

    pub fn centers(&self) -> Vec<Real> {
        self.edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
    }

    /// Bin holding `value`, or `None` outside `[lower, upper)`.
    pub fn index_of(&self, value: Real) -> Option<usize> {
        if !(value >= self.lower() && value < self.upper()) {
            return None;
        }
        Some(self.edges.partition_point(|&e| e <= value) - 1)
    }
}

impl TryFrom<Vec<Real>> for BinAxis {
    type Error = CalcError;

    fn try_from(edges: Vec<Real>) -> Result<Self, Self::Error> {
        Self::new(edges)
    }
}

impl From<BinAxis> for Vec<Real> {
    fn from(axis: BinAxis) -> Self {
        axis.edges
    }
}

/// Axes of the disaggregation tensor, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisaggAxis {
    Lat,
    Lon,
    Magnitude,
    Distance,
    Epsilon,
}

impl DisaggAxis {
    pub const ALL: [DisaggAxis; 5] = [
        DisaggAxis::Lat,
        DisaggAxis::Lon,
        DisaggAxis::Magnitude,
        DisaggAxis::Distance,
        DisaggAxis::Epsilon,
    ];

    pub fn position(self) -> usize {
        self as usize
    }
}

impl fmt::Display for DisaggAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lat => "latitude offset",
            Self::Lon => "longitude offset",
            Self::Magnitude => "magnitude",
            Self::Distance => "distance",
            Self::Epsilon => "epsilon",
        };
        write!(f, "{name}")
    }
}

/// Bin edges for all five axes. Latitude and longitude are offsets (deg)
/// of the rupture's closest point from the site; distance is the rupture
/// distance (km).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisaggBins {
    pub lat: BinAxis,
    pub lon: BinAxis,
    pub magnitude: BinAxis,
    pub distance: BinAxis,
    pub epsilon: BinAxis,
}

impl DisaggBins {
    pub fn axis(&self, axis: DisaggAxis) -> &BinAxis {
        match axis {
            DisaggAxis::Lat => &self.lat,
            DisaggAxis::Lon => &self.lon,
            DisaggAxis::Magnitude => &self.magnitude,
            DisaggAxis::Distance => &self.distance,
            DisaggAxis::Epsilon => &self.epsilon,
        }
    }

    pub fn shape(&self) -> [usize; 5] {
        DisaggAxis::ALL.map(|a| self.axis(a).num_bins())
    }

    /// Cell for `[lat, lon, magnitude, distance, epsilon]`, or `None` when
    /// any coordinate is outside its axis.
    pub fn locate(&self, values: [Real; 5]) -> Option<[usize; 5]> {
        let mut index = [0; 5];
        for axis in DisaggAxis::ALL {
            index[axis.position()] = self.axis(axis).index_of(values[axis.position()])?;
        }
        Some(index)
    }

    pub fn centers(&self, index: [usize; 5]) -> [Real; 5] {
        DisaggAxis::ALL.map(|a| {
            let edges = self.axis(a).edges();
            let i = index[a.position()];
            0.5 * (edges[i] + edges[i + 1])
        })
    }
}

/// Dense 5-D probability tensor in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinTensor {
    shape: [usize; 5],
    data: Vec<Real>,
}

impl BinTensor {
    pub fn zeros(shape: [usize; 5]) -> Self {
        Self {
            shape,
            data: vec![0.0; shape.iter().product()],
        }
    }

    pub fn shape(&self) -> [usize; 5] {
        self.shape
    }

    pub fn data(&self) -> &[Real] {
        &self.data
    }

    fn offset(&self, index: [usize; 5]) -> usize {
        index
            .iter()
            .zip(self.shape)
            .fold(0, |acc, (&i, n)| acc * n + i)
    }

    fn unravel(&self, mut offset: usize) -> [usize; 5] {
        let mut index = [0; 5];
        for axis in (0..5).rev() {
            index[axis] = offset % self.shape[axis];
            offset /= self.shape[axis];
        }
        index
    }

    pub fn get(&self, index: [usize; 5]) -> Real {
        self.data[self.offset(index)]
    }

    pub fn add(&mut self, index: [usize; 5], value: Real) {
        let offset = self.offset(index);
        self.data[offset] += value;
    }

    pub fn total(&self) -> Real {
        self.data.iter().sum()
    }

    /// Sum over every axis except `axis`.
    pub fn marginal(&self, axis: DisaggAxis) -> Vec<Real> {
        let k = axis.position();
        let mut out = vec![0.0; self.shape[k]];
        for (offset, &v) in self.data.iter().enumerate() {
            out[self.unravel(offset)[k]] += v;
        }
        out
    }

    /// Magnitude x distance marginal, `[mag][dist]`.
    pub fn magnitude_distance(&self) -> Vec<Vec<Real>> {
        let (m, d) = (
            DisaggAxis::Magnitude.position(),
            DisaggAxis::Distance.position(),
        );
        let mut out = vec![vec![0.0; self.shape[d]]; self.shape[m]];
        for (offset, &v) in self.data.iter().enumerate() {
            let idx = self.unravel(offset);
            out[idx[m]][idx[d]] += v;
        }
        out
    }

    /// Largest cell, or `None` when the tensor holds no mass.
    pub fn argmax(&self) -> Option<([usize; 5], Real)> {
        let (offset, &value) = self
            .data
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))?;
        (value > 0.0).then(|| (self.unravel(offset), value))
    }
}

/// Level at which to disaggregate.
#[derive(Debug, Clone, PartialEq)]
pub enum DisaggTarget {
    /// Intensity in linear units.
    Iml(Real),
    /// Probability of exceedance; the intensity is read off the hazard
    /// curve computed on `levels` (ln intensity).
    Probability { poe: Real, levels: DiscretizedCurve },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModalBin {
    pub index: [usize; 5],
    /// Bin centres in axis order.
    pub centers: [Real; 5],
    pub probability: Real,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceContribution {
    pub source_index: usize,
    pub name: String,
    pub probability: Real,
    /// Share of the total exceedance probability.
    pub fraction: Real,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisaggResult {
    pub imt: IntensityMeasure,
    /// Target intensity (linear units).
    pub iml: Real,
    /// Exceedance probability at `iml`; equals binned plus out-of-bounds mass.
    pub total_probability: Real,
    pub out_of_bounds_probability: Real,
    pub bins: DisaggBins,
    pub tensor: BinTensor,
    pub mean_magnitude: Option<Real>,
    pub mean_distance: Option<Real>,
    pub mean_epsilon: Option<Real>,
    pub mode: Option<ModalBin>,
    /// Sorted by decreasing probability.
    pub sources: Vec<SourceContribution>,
}

struct Contribution {
    source_index: usize,
    rate: Real,
    magnitude: Real,
    distance: Real,
    epsilon: Real,
    cell: Option<[usize; 5]>,
}

struct RuptureTerms {
    conditional: Real,
    magnitude: Real,
    distance: Real,
    epsilon: Real,
    cell: Option<[usize; 5]>,
}

/// `lon - origin` wrapped into [-180, 180), so offsets across the
/// antimeridian or between the [-180, 180] and [0, 360] conventions stay small.
fn longitude_offset(lon: Real, origin: Real) -> Real {
    (lon - origin + 180.0).rem_euclid(360.0) - 180.0
}

fn rupture_terms(
    site: &Site,
    rupture: &Rupture,
    gmm: &dyn GroundMotionModel,
    imt: &IntensityMeasure,
    ln_iml: Real,
    truncation: Truncation,
    bins: &DisaggBins,
) -> CalcResult<RuptureTerms> {
    let prediction = gmm.predict(site, rupture, imt)?;
    let conditional = prediction.exceed_probability(ln_iml, truncation);
    let epsilon = prediction.epsilon(ln_iml);
    let distance = rupture.distance_to(site);
    let location = site.location();
    let closest = rupture
        .surface()
        .closest_point(location)
        .unwrap_or(*location);
    let cell = bins.locate([
        closest.lat() - location.lat(),
        longitude_offset(closest.lon(), location.lon()),
        rupture.magnitude(),
        distance,
        epsilon,
    ]);
    Ok(RuptureTerms {
        conditional,
        magnitude: rupture.magnitude(),
        distance,
        epsilon,
        cell,
    })
}

/// Disaggregate a site's hazard at `target`.
///
/// An empirical source whose summed probability reaches the saturation
/// limit is an error here, where the hazard-curve engine clamps it.
pub fn disaggregate(
    site: &Site,
    target: &DisaggTarget,
    forecast: &dyn ForecastModel,
    gmms: &GmmSet,
    imt: &IntensityMeasure,
    bins: &DisaggBins,
    config: &CalcConfig,
) -> CalcResult<DisaggResult> {
    config.validate()?;
    gmms.ensure_supports(imt)?;

    let iml = match target {
        DisaggTarget::Iml(iml) => *iml,
        DisaggTarget::Probability { poe, levels } => {
            let curve = compute_hazard_curve(levels, site, gmms, forecast, imt, config)?;
            curve.map_x(Real::exp)?.first_x_at_y_log_log(*poe)?
        }
    };
    if !(iml.is_finite() && iml > 0.0) {
        return Err(CalcError::config(format!(
            "disaggregation intensity must be positive (got {iml})"
        )));
    }
    let ln_iml = iml.ln();
    info!(site = %site.id(), %imt, iml, "disaggregation started");

    let context = || format!("site {}", site.id());
    let truncation = config.truncation;
    let mut contributions: Vec<Contribution> = Vec::new();

    for_each_source_in_range(forecast, site, config, None, |source_index, source| {
        let gmm = gmms.for_region(source.tectonic_region())?;
        match source.occurrence() {
            OccurrenceModel::Poisson => {
                for (rupture_index, rupture) in source.ruptures().iter().enumerate() {
                    if !rupture_in_range(config, site, rupture) {
                        continue;
                    }
                    let ln_survival = poisson_log_survival(
                        rupture.probability(),
                        context,
                        source_index,
                        rupture_index,
                    )?;
                    let t = rupture_terms(site, rupture, gmm, imt, ln_iml, truncation, bins)?;
                    contributions.push(Contribution {
                        source_index,
                        rate: -t.conditional * ln_survival,
                        magnitude: t.magnitude,
                        distance: t.distance,
                        epsilon: t.epsilon,
                        cell: t.cell,
                    });
                }
            }
            OccurrenceModel::Empirical => {
                let mut terms = Vec::new();
                let mut weights = Vec::new();
                for (rupture_index, rupture) in source.ruptures().iter().enumerate() {
                    if !rupture_in_range(config, site, rupture) {
                        continue;
                    }
                    let t = rupture_terms(site, rupture, gmm, imt, ln_iml, truncation, bins)?;
                    weights.push((rupture_index, rupture.probability() * t.conditional));
                    terms.push(t);
                }
                let sum: Real = weights.iter().map(|w| w.1).sum();
                if sum <= 0.0 {
                    return Ok(());
                }
                let ln_survival = (-sum.min(1.0)).ln_1p();
                if ln_survival < SATURATION_LOG_LIMIT {
                    let (rupture_index, _) = weights
                        .iter()
                        .copied()
                        .max_by(|a, b| a.1.total_cmp(&b.1))
                        .unwrap_or((0, sum));
                    return Err(CalcError::Saturation {
                        context: context(),
                        source_index,
                        rupture_index,
                        probability: sum,
                    });
                }
                let source_rate = -ln_survival;
                for (t, (_, w)) in terms.into_iter().zip(weights) {
                    contributions.push(Contribution {
                        source_index,
                        rate: source_rate * w / sum,
                        magnitude: t.magnitude,
                        distance: t.distance,
                        epsilon: t.epsilon,
                        cell: t.cell,
                    });
                }
            }
        }
        Ok(())
    })?;

    let total_rate: Real = contributions.iter().map(|c| c.rate).sum();
    let total_probability = -(-total_rate).exp_m1();
    let mut tensor = BinTensor::zeros(bins.shape());
    let mut out_of_bounds_probability = 0.0;
    let mut per_source: Vec<(usize, Real)> = Vec::new();

    let scale = if total_rate > 0.0 {
        total_probability / total_rate
    } else {
        0.0
    };
    for c in &contributions {
        let mass = c.rate * scale;
        match c.cell {
            Some(cell) => tensor.add(cell, mass),
            None => out_of_bounds_probability += mass,
        }
        match per_source.last_mut() {
            Some((idx, p)) if *idx == c.source_index => *p += mass,
            _ => per_source.push((c.source_index, mass)),
        }
    }
    if out_of_bounds_probability > 0.0 {
        warn!(
            probability = out_of_bounds_probability,
            "disaggregation mass outside bin edges dropped from tensor"
        );
    }

    let weighted_mean = |f: &dyn Fn(&Contribution) -> Real| -> Option<Real> {
        let (num, den) = contributions
            .iter()
            .filter(|c| c.rate > 0.0 && f(c).is_finite())
            .fold((0.0, 0.0), |(n, d), c| (n + c.rate * f(c), d + c.rate));
        (den > 0.0).then_some(num / den)
    };
    let mean_magnitude = weighted_mean(&|c| c.magnitude);
    let mean_distance = weighted_mean(&|c| c.distance);
    let mean_epsilon = weighted_mean(&|c| c.epsilon);

    let mut sources: Vec<SourceContribution> = per_source
        .into_iter()
        .filter(|(_, p)| *p > 0.0)
        .map(|(source_index, probability)| SourceContribution {
            source_index,
            name: forecast
                .source(source_index)
                .map(|s| s.name().to_string())
                .unwrap_or_default(),
            probability,
            fraction: probability / total_probability,
        })
        .collect();
    sources.sort_by(|a, b| b.probability.total_cmp(&a.probability));

    let mode = tensor.argmax().map(|(index, probability)| ModalBin {
        index,
        centers: bins.centers(index),
        probability,
    });

    debug!(
        binned = tensor.total(),
        out_of_bounds = out_of_bounds_probability,
        total = total_probability,
        "disaggregation mass balance"
    );
    info!(site = %site.id(), total_probability, ruptures = contributions.len(), "disaggregation finished");

    Ok(DisaggResult {
        imt: *imt,
        iml,
        total_probability,
        out_of_bounds_probability,
        bins: bins.clone(),
        tensor,
        mean_magnitude,
        mean_distance,
        mean_epsilon,
        mode,
        sources,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_open_bins() {
        let axis = BinAxis::uniform(5.0, 0.5, 4).unwrap();
        assert_eq!(axis.edges(), &[5.0, 5.5, 6.0, 6.5, 7.0]);
        assert_eq!(axis.index_of(5.0), Some(0));
        assert_eq!(axis.index_of(5.5), Some(1));
        assert_eq!(axis.index_of(6.99), Some(3));
        assert_eq!(axis.index_of(7.0), None);
        assert_eq!(axis.index_of(4.9), None);
        assert_eq!(axis.index_of(f64::NAN), None);
    }

    #[test]
    fn value_on_an_edge_goes_to_the_upper_bin() {
        let axis = BinAxis::uniform(5.0, 0.1, 30).unwrap();
        let edge = axis.edges()[11];
        assert_eq!(axis.index_of(edge), Some(11));
        let below = f64::from_bits(edge.to_bits() - 1);
        assert_eq!(axis.index_of(below), Some(10));
    }

    #[test]
    fn irregular_edges() {
        let axis = BinAxis::new(vec![0.0, 10.0, 30.0, 100.0]).unwrap();
        assert_eq!(axis.index_of(25.0), Some(1));
        assert_eq!(axis.centers(), vec![5.0, 20.0, 65.0]);
        assert!(BinAxis::new(vec![0.0, 0.0]).is_err());
        assert!(BinAxis::new(vec![1.0]).is_err());
    }

    #[test]
    fn longitude_offsets_wrap() {
        assert!((longitude_offset(-179.95, 179.95) - 0.1).abs() < 1e-9);
        assert!((longitude_offset(179.95, -179.95) + 0.1).abs() < 1e-9);
        assert!((longitude_offset(359.5, -0.5)).abs() < 1e-9);
        assert!((longitude_offset(10.25, 10.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn tensor_marginals_and_mode() {
        let mut t = BinTensor::zeros([1, 1, 2, 3, 2]);
        t.add([0, 0, 1, 2, 0], 0.3);
        t.add([0, 0, 0, 1, 1], 0.1);
        t.add([0, 0, 1, 2, 1], 0.05);
        assert!((t.total() - 0.45).abs() < 1e-15);
        let by_mag = t.marginal(DisaggAxis::Magnitude);
        assert!((by_mag[0] - 0.1).abs() < 1e-15);
        assert!((by_mag[1] - 0.35).abs() < 1e-15);
        assert_eq!(t.marginal(DisaggAxis::Epsilon).len(), 2);
        let md = t.magnitude_distance();
        assert!((md[1][2] - 0.35).abs() < 1e-15);
        assert_eq!(t.argmax(), Some(([0, 0, 1, 2, 0], 0.3)));
        assert_eq!(BinTensor::zeros([1, 1, 1, 1, 1]).argmax(), None);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn index_follows_edges(lower in -5.0_f64..5.0, width in 0.1_f64..2.0, count in 1usize..20, frac in -0.1_f64..1.1) {
            let axis = BinAxis::uniform(lower, width, count).unwrap();
            let value = lower + frac * width * count as f64;
            let edges = axis.edges();
            match axis.index_of(value) {
                Some(i) => prop_assert!(edges[i] <= value && value < edges[i + 1]),
                None => prop_assert!(value < axis.lower() || value >= axis.upper()),
            }
        }

        #[test]
        fn every_lower_edge_opens_its_own_bin(lower in -5.0_f64..5.0, width in 0.01_f64..2.0, count in 1usize..40) {
            let axis = BinAxis::uniform(lower, width, count).unwrap();
            for (k, &edge) in axis.edges()[..count].iter().enumerate() {
                prop_assert_eq!(axis.index_of(edge), Some(k));
            }
        }
    }
}
