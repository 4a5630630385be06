mod common;

use common::*;
use qh_calc::*;
use qh_model::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

#[test]
fn realised_ruptures_combine_as_a_product() {
    let mut events = EventSet::default();
    events.push(rupture_north(6.0, 10.0, 0.01));
    events.push(rupture_north(6.5, 30.0, 0.01));
    events.push(rupture_north(7.0, 500.0, 0.01));
    let gmms = GmmSet::single(ConstantGmm::median_at(0.2));

    let curve = event_set_hazard_curve(
        &ln_levels(&[0.2]),
        &origin_site(),
        &gmms,
        &events,
        &IntensityMeasure::Pga,
        &CalcConfig::default(),
    )
    .unwrap();
    // the 500 km rupture is outside the distance cutoff
    assert!((curve.y(0) - 0.75).abs() < 1e-12);
}

#[test]
fn empty_event_set_is_zero() {
    let gmms = GmmSet::single(ConstantGmm::median_at(0.2));
    let curve = event_set_hazard_curve(
        &ln_levels(&[0.1, 0.2]),
        &origin_site(),
        &gmms,
        &EventSet::default(),
        &IntensityMeasure::Pga,
        &CalcConfig::default(),
    )
    .unwrap();
    assert_eq!(curve.ys(), &[0.0, 0.0]);
}

#[test]
fn empirical_ruptures_follow_their_probability() {
    let forecast = forecast(vec![empirical_source(
        0,
        vec![rupture_north(6.0, 10.0, 0.0), rupture_north(6.5, 10.0, 1.0)],
    )]);
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..20 {
        let events = draw_event_set(&forecast, &mut rng).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events.ruptures()[0].magnitude(), 6.5);
    }
}

#[test]
fn poisson_occurrence_count_has_equivalent_rate_mean() {
    let forecast = forecast(vec![poisson_source(0, vec![rupture_north(6.0, 10.0, 0.5)])]);
    let mut rng = StdRng::seed_from_u64(11);
    let draws = 20_000;
    let total: usize = (0..draws)
        .map(|_| draw_event_set(&forecast, &mut rng).unwrap().len())
        .sum();
    let mean = total as f64 / draws as f64;
    assert!((mean - 2.0_f64.ln()).abs() < 0.02, "mean count {mean}");
}

#[test]
fn certain_poisson_rupture_cannot_be_drawn() {
    let forecast = forecast(vec![poisson_source(0, vec![rupture_north(6.0, 10.0, 1.0)])]);
    let mut rng = StdRng::seed_from_u64(0);
    assert!(matches!(
        draw_event_set(&forecast, &mut rng),
        Err(CalcError::Saturation { .. })
    ));
}

#[test]
fn averaged_event_sets_approach_the_poisson_curve() {
    let forecast = forecast(vec![poisson_source(
        0,
        vec![rupture_north(6.0, 10.0, 0.1), rupture_north(6.8, 30.0, 0.05)],
    )]);
    let gmms = GmmSet::single(ReferenceAttenuation::default());
    let levels = ln_levels(&[0.05, 0.1, 0.2, 0.4]);
    let config = CalcConfig::default();
    let site = origin_site();

    let exact = compute_hazard_curve(
        &levels,
        &site,
        &gmms,
        &forecast,
        &IntensityMeasure::Pga,
        &config,
    )
    .unwrap();
    let average = average_event_set_hazard_curve(
        &levels,
        &site,
        &gmms,
        &forecast,
        &IntensityMeasure::Pga,
        &config,
        20_000,
        17,
    )
    .unwrap();
    for (a, e) in average.ys().iter().zip(exact.ys()) {
        assert!((a - e).abs() < 0.01, "average {a} vs exact {e}");
    }

    let again = average_event_set_hazard_curve(
        &levels,
        &site,
        &gmms,
        &forecast,
        &IntensityMeasure::Pga,
        &config,
        20_000,
        17,
    )
    .unwrap();
    assert_eq!(average, again);
}

#[test]
fn zero_event_sets_is_rejected() {
    let gmms = GmmSet::single(ConstantGmm::median_at(0.2));
    let err = average_event_set_hazard_curve(
        &ln_levels(&[0.2]),
        &origin_site(),
        &gmms,
        &mixed_forecast(),
        &IntensityMeasure::Pga,
        &CalcConfig::default(),
        0,
        1,
    )
    .unwrap_err();
    assert!(matches!(err, CalcError::Config { .. }));
}
