use qh_core::{Location, SiteId, SourceId};
use qh_curve::log_levels;
use qh_model::*;

/// Ring of point sources generated on demand.
struct RingForecast {
    sources: Vec<Source>,
}

impl RingForecast {
    fn new(count: u32, radius_deg: f64) -> Self {
        let sources = (0..count)
            .map(|i| {
                let angle = i as f64 / count as f64 * std::f64::consts::TAU;
                let location =
                    Location::new(radius_deg * angle.sin(), radius_deg * angle.cos(), 10.0)
                        .unwrap();
                let rupture =
                    Rupture::new(6.0, 0.0, RuptureSurface::Point(location), 0.01).unwrap();
                Source::new(
                    SourceId::from_index(i),
                    format!("ring-{i}"),
                    TectonicRegion::StableShallowCrust,
                    OccurrenceModel::Poisson,
                    vec![rupture.clone(), rupture],
                )
            })
            .collect();
        Self { sources }
    }
}

impl ForecastModel for RingForecast {
    fn name(&self) -> &str {
        "ring"
    }

    fn time_span_years(&self) -> f64 {
        1.0
    }

    fn num_sources(&self) -> usize {
        self.sources.len()
    }

    fn source(&self, index: usize) -> Option<&Source> {
        self.sources.get(index)
    }
}

fn origin() -> Site {
    Site::new(SiteId::from_index(0), Location::surface(0.0, 0.0).unwrap())
        .with_param(SiteParams::VS30, 560.0)
}

#[test]
fn provided_forecast_methods_walk_all_sources() {
    let forecast = RingForecast::new(8, 0.5);
    assert_eq!(forecast.sources().count(), 8);
    assert_eq!(forecast.total_ruptures(), 16);
    assert!(forecast.source(8).is_none());

    let site = origin();
    for source in forecast.sources() {
        assert_eq!(source.tectonic_region(), TectonicRegion::StableShallowCrust);
        assert!(source
            .ruptures()
            .iter()
            .all(|r| r.tectonic_region() == TectonicRegion::StableShallowCrust));
        // every ring source sits about 55 km away
        let d = source.min_distance(&site);
        assert!((d - 55.6).abs() < 0.5, "distance {d}");
    }
}

#[test]
fn exceedance_curve_and_inverse_agree() {
    let gmm = ReferenceAttenuation::default();
    let site = origin();
    let rupture = Rupture::new(
        6.8,
        90.0,
        RuptureSurface::Point(Location::new(0.2, 0.0, 8.0).unwrap()),
        0.02,
    )
    .unwrap();
    let imt = IntensityMeasure::Sa { period: 0.5 };
    let truncation = Truncation::TwoSided { level: 3.0 };

    let mut curve = log_levels(&[0.01, 0.05, 0.1, 0.2, 0.5, 1.0]).unwrap();
    gmm.exceed_probabilities(&site, &rupture, &imt, truncation, &mut curve)
        .unwrap();
    assert!(curve.is_non_increasing(0.0));
    assert!(curve.within_unit_interval());

    for p in [0.9, 0.5, 0.1] {
        let ln_iml = gmm
            .iml_at_exceed_prob(&site, &rupture, &imt, truncation, p)
            .unwrap();
        let back = gmm
            .exceed_probability(&site, &rupture, &imt, truncation, ln_iml)
            .unwrap();
        assert!((back - p).abs() < 1e-6, "p {p} -> {back}");
    }

    let median = gmm.predict(&site, &rupture, &imt).unwrap().mean;
    let eps = gmm.epsilon(&site, &rupture, &imt, median).unwrap();
    assert_eq!(eps, 0.0);
}

#[test]
fn equivalent_rate_matches_poisson_probability() {
    let rupture = Rupture::new(
        6.0,
        0.0,
        RuptureSurface::Point(Location::new(0.0, 0.0, 5.0).unwrap()),
        0.1,
    )
    .unwrap();
    let rate = rupture.equivalent_rate();
    assert!((1.0 - (-rate).exp() - 0.1).abs() < 1e-15);
}
