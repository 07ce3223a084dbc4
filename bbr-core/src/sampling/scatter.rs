use std::f64::consts::TAU;

use rand::Rng;

use crate::r2::R2;

/// Default radial shape parameter of [`scatter_circle`]; roughly matches an area-uniform disk.
pub const DEFAULT_ALPHA: f64 = 3.;

/// Sample `n` points in the disk of `radius` around `center`.
///
/// Radial distances are drawn by inverting [`radial_cdf`] exactly; `alpha == 0` degenerates to a uniform radius.
/// Angles are uniform in `[0, 2π)`.
pub fn scatter_circle<R: Rng + ?Sized>(rng: &mut R, n: usize, radius: f64, center: R2<f64>, alpha: f64) -> Vec<R2<f64>> {
    (0..n)
        .map(|_| {
            let u: f64 = rng.gen();
            let rho = radial_quantile(u, radius, alpha);
            let theta = rng.gen::<f64>() * TAU;
            R2::polar(rho, theta) + center
        })
        .collect()
}

/// `P(ρ ≤ rho) = (e^{α·ρ/radius} − 1) / (e^α − 1)`, for `0 ≤ rho ≤ radius`.
pub fn radial_cdf(rho: f64, radius: f64, alpha: f64) -> f64 {
    let x = (rho / radius).clamp(0., 1.);
    if alpha == 0. {
        x
    } else {
        (alpha * x).exp_m1() / alpha.exp_m1()
    }
}

/// Inverse of [`radial_cdf`]: `ρ = ln(u·(e^α − 1) + 1) / α · radius`.
pub fn radial_quantile(u: f64, radius: f64, alpha: f64) -> f64 {
    if alpha == 0. {
        u * radius
    } else {
        (u * alpha.exp_m1()).ln_1p() / alpha * radius
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};
    use super::*;
    use test_log::test;

    const CENTER: R2<f64> = R2 { x: 0.5, y: 0.5 };

    #[test]
    fn test_within_radius() {
        let mut rng = StdRng::seed_from_u64(0);
        for alpha in [0., 1., 3., 10.] {
            let points = scatter_circle(&mut rng, 2000, 0.1, CENTER, alpha);
            assert_eq!(points.len(), 2000);
            for p in &points {
                assert!(p.distance(&CENTER) <= 0.1 + 1e-12, "{} outside radius (alpha {})", p, alpha);
            }
        }
    }

    #[test]
    fn test_quantile_inverts_cdf() {
        for alpha in [0., 0.5, 3., 8.] {
            for u in [0., 0.1, 0.25, 0.5, 0.9, 1.] {
                let rho = radial_quantile(u, 0.5, alpha);
                assert_relative_eq!(radial_cdf(rho, 0.5, alpha), u, epsilon = 1e-12);
            }
        }
        assert_relative_eq!(radial_quantile(1., 0.5, 3.), 0.5, epsilon = 1e-12);
    }

    /// Kolmogorov–Smirnov distance between the sampled radii and the closed-form CDF.
    #[test]
    fn test_radial_distribution() {
        let n = 20_000;
        let radius = 0.5;
        let alpha = 3.;
        let mut rng = StdRng::seed_from_u64(7);
        let points = scatter_circle(&mut rng, n, radius, CENTER, alpha);
        let mut radii: Vec<f64> = points.iter().map(|p| p.distance(&CENTER)).collect();
        radii.sort_by(|a, b| a.total_cmp(b));
        let ks = radii
            .iter()
            .enumerate()
            .map(|(i, rho)| {
                let cdf = radial_cdf(*rho, radius, alpha);
                let lo = i as f64 / n as f64;
                let hi = (i + 1) as f64 / n as f64;
                (cdf - lo).abs().max((hi - cdf).abs())
            })
            .fold(0., f64::max);
        // 99.9% critical value ≈ 1.95 / √n
        assert!(ks < 1.95 / (n as f64).sqrt(), "KS statistic {}", ks);
    }

    #[test]
    fn test_inner_disk_mass() {
        let mut rng = StdRng::seed_from_u64(1);
        let inner_frac = |alpha: f64, rng: &mut StdRng| {
            let points = scatter_circle(rng, 5000, 1., R2 { x: 0., y: 0. }, alpha);
            points.iter().filter(|p| p.norm() < 0.5).count() as f64 / 5000.
        };
        let linear = inner_frac(0., &mut rng);
        let shaped = inner_frac(3., &mut rng);
        // F(0.5) = 0.5 for α = 0, (e^1.5 − 1)/(e^3 − 1) ≈ 0.182 for α = 3
        assert_relative_eq!(linear, 0.5, epsilon = 0.03);
        assert_relative_eq!(shaped, radial_cdf(0.5, 1., 3.), epsilon = 0.03);
    }

    #[test]
    fn test_empty() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(scatter_circle(&mut rng, 0, 0.1, CENTER, DEFAULT_ALPHA).is_empty());
    }
}
