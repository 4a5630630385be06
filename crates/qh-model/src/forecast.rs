//! Earthquake forecasts and stochastic event sets.

use crate::error::{ModelError, ModelResult};
use crate::rupture::Rupture;
use crate::source::Source;
use qh_core::Real;

/// Read-only view of an earthquake rupture forecast.
///
/// Engines only index sources; implementations may build ruptures lazily
/// as long as the returned source stays valid for the borrow.
pub trait ForecastModel: Send + Sync {
    fn name(&self) -> &str;

    /// Duration the rupture probabilities refer to (years).
    fn time_span_years(&self) -> Real;

    fn num_sources(&self) -> usize;

    fn source(&self, index: usize) -> Option<&Source>;

    fn sources(&self) -> Box<dyn Iterator<Item = &Source> + '_> {
        Box::new((0..self.num_sources()).filter_map(move |i| self.source(i)))
    }

    fn total_ruptures(&self) -> usize {
        self.sources().map(Source::num_ruptures).sum()
    }
}

/// In-memory forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    name: String,
    time_span_years: Real,
    sources: Vec<Source>,
}

impl Forecast {
    pub fn new(
        name: impl Into<String>,
        time_span_years: Real,
        sources: Vec<Source>,
    ) -> ModelResult<Self> {
        if !(time_span_years.is_finite() && time_span_years > 0.0) {
            return Err(ModelError::Invalid {
                what: "time span",
                reason: format!("must be positive (got {time_span_years})"),
            });
        }
        Ok(Self {
            name: name.into(),
            time_span_years,
            sources,
        })
    }

    pub fn empty(time_span_years: Real) -> ModelResult<Self> {
        Self::new("empty", time_span_years, Vec::new())
    }

    pub fn source_list(&self) -> &[Source] {
        &self.sources
    }
}

impl ForecastModel for Forecast {
    fn name(&self) -> &str {
        &self.name
    }

    fn time_span_years(&self) -> Real {
        self.time_span_years
    }

    fn num_sources(&self) -> usize {
        self.sources.len()
    }

    fn source(&self, index: usize) -> Option<&Source> {
        self.sources.get(index)
    }
}

/// Ruptures that occurred in one stochastic realization of a forecast.
/// A rupture may appear more than once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventSet {
    ruptures: Vec<Rupture>,
}

impl EventSet {
    pub fn new(ruptures: Vec<Rupture>) -> Self {
        Self { ruptures }
    }

    pub fn push(&mut self, rupture: Rupture) {
        self.ruptures.push(rupture);
    }

    pub fn ruptures(&self) -> &[Rupture] {
        &self.ruptures
    }

    pub fn len(&self) -> usize {
        self.ruptures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ruptures.is_empty()
    }
}
