//! Ground-motion field generation for a single rupture.
//!
//! A field is `exp(mean_i + intra_i * e_i + inter_i * eta)` per site, where
//! `e` is either independent standard normals or their correlated
//! transform `L z` with `L Lᵗ = R`, and `eta` is one standard normal shared
//! by every site. The inter-event deviate is drawn before the intra-event
//! vector so a given RNG stream always yields the same field.

use crate::correlation::{CorrelationModel, JayaramBaker2009, cholesky_factor, correlation_matrix};
use crate::error::{CalcError, CalcResult};
use crate::sampling::truncated_normal;
use nalgebra::{DMatrix, DVector};
use qh_core::{Real, SiteId};
use qh_model::{GmmPrediction, GroundMotionModel, IntensityMeasure, Rupture, Site, Truncation};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Residual options for field generation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GmfOptions {
    pub include_inter_event: bool,
    /// Spatially correlate intra-event residuals.
    pub spatial_correlation: Option<JayaramBaker2009>,
    pub truncation: Truncation,
}

/// One realization: intensity per site, in site order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroundMotionField {
    pub imt: IntensityMeasure,
    pub site_ids: Vec<SiteId>,
    pub values: Vec<Real>,
}

impl GroundMotionField {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value(&self, site: SiteId) -> Option<Real> {
        self.site_ids
            .iter()
            .position(|&id| id == site)
            .map(|i| self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (SiteId, Real)> + '_ {
        self.site_ids.iter().copied().zip(self.values.iter().copied())
    }
}

/// Predictions and correlation factor for a rupture/site list, reusable
/// across realizations.
#[derive(Debug, Clone)]
pub struct GmfGenerator {
    imt: IntensityMeasure,
    site_ids: Vec<SiteId>,
    means: Vec<Real>,
    residual_sigmas: Vec<Real>,
    inter_sigmas: Option<Vec<Real>>,
    cholesky: Option<DMatrix<Real>>,
    truncation: Truncation,
}

impl GmfGenerator {
    pub fn new(
        rupture: &Rupture,
        sites: &[Site],
        gmm: &dyn GroundMotionModel,
        imt: IntensityMeasure,
        options: &GmfOptions,
    ) -> CalcResult<Self> {
        let correlation = options
            .spatial_correlation
            .as_ref()
            .map(|c| c as &dyn CorrelationModel);
        Self::build(rupture, sites, gmm, imt, correlation, options)
    }

    /// As [`GmfGenerator::new`] with a caller-supplied correlation model;
    /// `options.spatial_correlation` is ignored.
    pub fn with_correlation_model(
        rupture: &Rupture,
        sites: &[Site],
        gmm: &dyn GroundMotionModel,
        imt: IntensityMeasure,
        correlation: &dyn CorrelationModel,
        options: &GmfOptions,
    ) -> CalcResult<Self> {
        Self::build(rupture, sites, gmm, imt, Some(correlation), options)
    }

    fn build(
        rupture: &Rupture,
        sites: &[Site],
        gmm: &dyn GroundMotionModel,
        imt: IntensityMeasure,
        correlation: Option<&dyn CorrelationModel>,
        options: &GmfOptions,
    ) -> CalcResult<Self> {
        if sites.is_empty() {
            return Err(CalcError::config("site list is empty"));
        }
        options.truncation.validate()?;
        if !gmm.supports(&imt) {
            return Err(CalcError::config(format!(
                "ground-motion model '{}' does not support {imt}",
                gmm.name()
            )));
        }

        let predictions = sites
            .iter()
            .map(|site| gmm.predict(site, rupture, &imt))
            .collect::<Result<Vec<GmmPrediction>, _>>()?;

        let needs_split = options.include_inter_event || correlation.is_some();
        if needs_split && !predictions.iter().all(|p| p.std.has_split()) {
            return Err(CalcError::ModelCapability {
                model: gmm.name().to_string(),
                what: "separate inter-event and intra-event standard deviations".to_string(),
            });
        }

        let residual_sigmas = predictions
            .iter()
            .map(|p| {
                if needs_split {
                    p.std.intra.unwrap_or(p.std.total)
                } else {
                    p.std.total
                }
            })
            .collect();
        let inter_sigmas = options
            .include_inter_event
            .then(|| predictions.iter().map(|p| p.std.inter.unwrap_or(0.0)).collect());

        let cholesky = match correlation {
            Some(model) => {
                let matrix = correlation_matrix(sites, model, imt.period());
                Some(cholesky_factor(matrix)?)
            }
            None => None,
        };

        debug!(
            sites = sites.len(),
            %imt,
            correlated = cholesky.is_some(),
            inter_event = options.include_inter_event,
            "ground-motion field generator ready"
        );

        Ok(Self {
            imt,
            site_ids: sites.iter().map(Site::id).collect(),
            means: predictions.iter().map(|p| p.mean).collect(),
            residual_sigmas,
            inter_sigmas,
            cholesky,
            truncation: options.truncation,
        })
    }

    pub fn num_sites(&self) -> usize {
        self.means.len()
    }

    /// Median field, `exp(mean)` per site.
    pub fn mean_field(&self) -> GroundMotionField {
        self.field(self.means.iter().map(|m| m.exp()).collect())
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> GroundMotionField {
        let eta = match self.inter_sigmas {
            Some(_) => truncated_normal(rng, self.truncation),
            None => 0.0,
        };
        let z = DVector::from_iterator(
            self.num_sites(),
            (0..self.num_sites()).map(|_| truncated_normal(rng, self.truncation)),
        );
        let residuals = match &self.cholesky {
            Some(l) => l * z,
            None => z,
        };

        let values = (0..self.num_sites())
            .map(|i| {
                let inter = self.inter_sigmas.as_ref().map_or(0.0, |s| s[i] * eta);
                (self.means[i] + self.residual_sigmas[i] * residuals[i] + inter).exp()
            })
            .collect();
        self.field(values)
    }

    /// `count` realizations in parallel; realization `i` uses
    /// `StdRng::seed_from_u64(seed + i)`.
    pub fn sample_many(&self, count: usize, seed: u64) -> Vec<GroundMotionField> {
        (0..count)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
                self.sample(&mut rng)
            })
            .collect()
    }

    fn field(&self, values: Vec<Real>) -> GroundMotionField {
        GroundMotionField {
            imt: self.imt,
            site_ids: self.site_ids.clone(),
            values,
        }
    }
}

/// Draw one field for `rupture` over `sites`.
pub fn generate_field<R: Rng + ?Sized>(
    rupture: &Rupture,
    sites: &[Site],
    gmm: &dyn GroundMotionModel,
    imt: IntensityMeasure,
    options: &GmfOptions,
    rng: &mut R,
) -> CalcResult<GroundMotionField> {
    Ok(GmfGenerator::new(rupture, sites, gmm, imt, options)?.sample(rng))
}

/// Median field for `rupture` over `sites`.
pub fn mean_field(
    rupture: &Rupture,
    sites: &[Site],
    gmm: &dyn GroundMotionModel,
    imt: IntensityMeasure,
) -> CalcResult<GroundMotionField> {
    Ok(GmfGenerator::new(rupture, sites, gmm, imt, &GmfOptions::default())?.mean_field())
}
