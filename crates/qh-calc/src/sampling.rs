//! Random deviates drawn from a caller-owned `rand::Rng`.

use qh_core::Real;
use qh_model::Truncation;
use rand::Rng;

/// Standard normal deviate (Marsaglia polar method).
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> Real {
    loop {
        let u: Real = rng.gen_range(-1.0..1.0);
        let v: Real = rng.gen_range(-1.0..1.0);
        let s = u * u + v * v;
        if s > 0.0 && s < 1.0 {
            return u * (-2.0 * s.ln() / s).sqrt();
        }
    }
}

/// Standard normal deviate restricted by `truncation` (rejection sampling).
pub fn truncated_normal<R: Rng + ?Sized>(rng: &mut R, truncation: Truncation) -> Real {
    loop {
        let z = standard_normal(rng);
        if truncation.admits(z) {
            return z;
        }
    }
}

/// Poisson count with the given mean (Knuth's multiplication method).
///
/// Means are bounded by the saturation limit on rupture probabilities, so
/// the product never underflows before terminating.
pub fn poisson_count<R: Rng + ?Sized>(rng: &mut R, mean: Real) -> u64 {
    if !(mean > 0.0) {
        return 0;
    }
    let limit = (-mean).exp();
    let mut count = 0;
    let mut product: Real = rng.gen_range(0.0..1.0);
    while product > limit {
        count += 1;
        product *= rng.gen_range(0.0..1.0);
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn normal_moments() {
        let mut rng = StdRng::seed_from_u64(7);
        let n = 50_000;
        let draws: Vec<f64> = (0..n).map(|_| standard_normal(&mut rng)).collect();
        let mean = draws.iter().sum::<f64>() / n as f64;
        let var = draws.iter().map(|z| (z - mean).powi(2)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.02, "mean = {mean}");
        assert!((var - 1.0).abs() < 0.03, "var = {var}");
    }

    #[test]
    fn truncated_draws_respect_level() {
        let mut rng = StdRng::seed_from_u64(11);
        let t = Truncation::TwoSided { level: 1.0 };
        assert!((0..5_000).all(|_| truncated_normal(&mut rng, t).abs() <= 1.0));
    }

    #[test]
    fn poisson_mean() {
        let mut rng = StdRng::seed_from_u64(3);
        let n = 20_000;
        let total: u64 = (0..n).map(|_| poisson_count(&mut rng, 2.5)).sum();
        let mean = total as f64 / n as f64;
        assert!((mean - 2.5).abs() < 0.05, "mean = {mean}");
        assert_eq!(poisson_count(&mut rng, 0.0), 0);
    }
}
