mod common;

use common::*;
use qh_calc::*;
use qh_model::*;

fn periods() -> Vec<IntensityMeasure> {
    vec![
        IntensityMeasure::Pga,
        IntensityMeasure::Sa { period: 1.0 },
        IntensityMeasure::Sa { period: 0.1 },
        IntensityMeasure::Sa { period: 0.3 },
    ]
}

#[test]
fn one_traversal_matches_single_curves() {
    let forecast = mixed_forecast();
    let gmms = GmmSet::single(ReferenceAttenuation::default());
    let config = CalcConfig::default();
    let site = origin_site();
    let levels = qh_curve::log_levels(&qh_curve::USGS_PGA_LEVELS).unwrap();

    let requests: Vec<CurveRequest> = periods()
        .into_iter()
        .map(|imt| CurveRequest {
            imt,
            levels: levels.clone(),
        })
        .collect();
    let curves = compute_hazard_curves(&site, &gmms, &forecast, &requests, &config).unwrap();
    assert_eq!(curves.len(), requests.len());

    for c in &curves {
        let single =
            compute_hazard_curve(&levels, &site, &gmms, &forecast, &c.imt, &config).unwrap();
        for (a, b) in c.curve.ys().iter().zip(single.ys()) {
            assert!((a - b).abs() <= 1e-15, "{}: {a} vs {b}", c.imt);
        }
    }

    let n = levels.len();
    let hi = curves.iter().map(|c| c.curve.y(0)).fold(f64::INFINITY, f64::min);
    let lo = curves.iter().map(|c| c.curve.y(n - 1)).fold(0.0, f64::max);
    assert!(lo < hi);
    let uhs = iml_spectrum(&curves, (hi * lo).sqrt()).unwrap();
    assert_eq!(uhs.xs(), &[0.1, 0.3, 1.0]);
    assert!(uhs.ys().iter().all(|&y| y > 0.0));

    let by_period = probability_spectrum(&curves, 0.1).unwrap();
    assert_eq!(by_period.len(), 3);
    assert!(by_period.within_unit_interval());
}

#[test]
fn spectrum_without_spectral_curves_is_an_error() {
    let curves = vec![ImtCurve {
        imt: IntensityMeasure::Pga,
        curve: ln_levels(&[0.1, 0.2]).with_ys(vec![0.1, 0.01]).unwrap(),
    }];
    assert!(matches!(
        iml_spectrum(&curves, 0.05),
        Err(CalcError::Config { .. })
    ));
}

#[test]
fn deterministic_spectrum_reports_median_at_half() {
    let rupture = rupture_north(6.5, 20.0, 0.01);
    let site = origin_site();
    let gmm = ReferenceAttenuation::default();
    let spectrum = deterministic_spectrum(
        &site,
        &rupture,
        &gmm,
        &[1.0, 0.3],
        DeterministicTarget::ImlAtProb(0.5),
        Truncation::None,
    )
    .unwrap();
    assert_eq!(spectrum.xs(), &[0.3, 1.0]);
    for (period, iml) in spectrum.iter() {
        let imt = IntensityMeasure::sa(period).unwrap();
        let median = gmm.predict(&site, &rupture, &imt).unwrap().mean.exp();
        assert!((iml - median).abs() / median < 1e-6);
    }

    let probs = deterministic_spectrum(
        &site,
        &rupture,
        &gmm,
        &[0.3, 1.0],
        DeterministicTarget::ProbAtIml(spectrum.y(0)),
        Truncation::None,
    )
    .unwrap();
    assert!((probs.y(0) - 0.5).abs() < 1e-6);
    assert!(probs.y(1) < 0.5);
}

#[test]
fn hazus_rows_follow_return_periods() {
    let forecast = mixed_forecast();
    let gmms = GmmSet::single(ReferenceAttenuation::default());
    let levels = HazusLevels::usgs_defaults().unwrap();
    let curves = hazus_curves(
        &origin_site(),
        &gmms,
        &forecast,
        &levels,
        &CalcConfig::default(),
    )
    .unwrap();
    let rows = curves
        .at_return_periods(&HAZUS_RETURN_PERIODS, HAZUS_DURATION_YEARS)
        .unwrap();
    assert_eq!(rows.len(), HAZUS_RETURN_PERIODS.len());

    for row in &rows {
        let expected = probability_from_return_period(row.return_period, HAZUS_DURATION_YEARS)
            .unwrap();
        assert_eq!(row.probability, expected);
        assert!(row.pga >= 0.0 && row.pgv >= 0.0 && row.sa_03 >= 0.0 && row.sa_10 >= 0.0);
    }
    // longer return periods never lower an intensity read off the curve
    for w in rows.windows(2) {
        if w[0].pga > 0.0 && w[1].pga > 0.0 {
            assert!(w[1].pga >= w[0].pga);
        }
        if w[0].sa_10 > 0.0 && w[1].sa_10 > 0.0 {
            assert!(w[1].sa_10 >= w[0].sa_10);
        }
    }
}
