//! Kerr spacetime in Cartesian Kerr-Schild coordinates.
//!
//! Kerr-Schild form writes the metric as a flat background plus a rank-one
//! perturbation along a null vector field:
//!
//! g_{mu nu} = eta_{mu nu} + f l_mu l_nu
//!
//! with eta the Minkowski metric (signature -+++), f = 2 M r^3 / (r^4 + a^2 z^2),
//! and l_mu = (1, (r x + a y)/(r^2+a^2), (r y - a x)/(r^2+a^2), z/r), l^mu l_mu = 0.
//! Because l is null with respect to both eta and g, the inverse follows in
//! closed form: g^{mu nu} = eta^{mu nu} - f l^mu l^nu (index raised with eta).
//! This coordinate patch is horizon-penetrating and has no polar-axis
//! singularity, unlike Boyer-Lindquist.

use crate::metric::Metric;
use crate::tensor::MetricTensor4;

/// Orbit type for ISCO and photon-sphere calculations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Orbit {
    /// Co-rotating with the black hole spin.
    Prograde,
    /// Counter-rotating against the black hole spin.
    Retrograde,
}

/// A Kerr black hole in Cartesian Kerr-Schild coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Kerr {
    mass: f64,
    spin: f64,
}

impl Kerr {
    /// Construct a Kerr black hole with mass `m` and dimensionless spin `a_star`.
    ///
    /// `a_star` is clamped to (-0.9999, 0.9999) to keep the horizon solve well
    /// conditioned near extremality.
    pub fn new(m: f64, a_star: f64) -> Self {
        Self { mass: m, spin: a_star.clamp(-0.9999, 0.9999) }
    }

    /// Spin angular momentum per unit mass, a = a* M.
    #[inline]
    pub fn a(&self) -> f64 {
        self.spin * self.mass
    }

    /// Inner (Cauchy) horizon radius r_- = M - sqrt(M^2 - a^2).
    pub fn cauchy_horizon(&self) -> f64 {
        let m = self.mass;
        let a = self.a();
        let disc = m * m - a * a;
        if disc < 0.0 { m } else { m - disc.sqrt() }
    }

    /// Equatorial photon-sphere radius, Bardeen's closed form
    /// r_ph = 2M [1 + cos((2/3) arccos(-+ a/M))].
    pub fn photon_sphere(&self, orbit: Orbit) -> f64 {
        let m = self.mass;
        let sign = match orbit {
            Orbit::Prograde => -1.0,
            Orbit::Retrograde => 1.0,
        };
        2.0 * m * (1.0 + ((2.0 / 3.0) * (sign * self.spin).clamp(-1.0, 1.0).acos()).cos())
    }

    /// ISCO radius via the Bardeen-Press-Teukolsky formula.
    pub fn isco(&self, orbit: Orbit) -> f64 {
        let m = self.mass;
        let a_hat = self.spin;
        let sign = match orbit {
            Orbit::Prograde => 1.0,
            Orbit::Retrograde => -1.0,
        };
        let z1 = 1.0
            + (1.0 - a_hat * a_hat).cbrt()
                * ((1.0 + a_hat).cbrt() + (1.0 - a_hat).cbrt());
        let z2 = (3.0 * a_hat * a_hat + z1 * z1).sqrt();
        let r_isco = 3.0 + z2 - sign * ((3.0 - z1) * (3.0 + z1 + 2.0 * z2)).sqrt();
        m * r_isco
    }

    /// Keplerian orbital angular frequency at equatorial radius r.
    pub fn keplerian_frequency(&self, r: f64, orbit: Orbit) -> f64 {
        let m = self.mass;
        let a = self.a();
        let sign = match orbit {
            Orbit::Prograde => 1.0,
            Orbit::Retrograde => -1.0,
        };
        sign * m.sqrt() / (r.powf(1.5) + sign * a * m.sqrt())
    }
}

impl Metric for Kerr {
    fn kerr_schild_radius(&self, x: [f64; 3]) -> f64 {
        let a = self.a();
        let (px, py, pz) = (x[0], x[1], x[2]);
        let rho2 = px * px + py * py + pz * pz;
        let a2 = a * a;
        // r^4 - (rho2 - a2) r^2 - a2 pz^2 = 0, solved as a quadratic in r^2.
        let b = rho2 - a2;
        let c = -a2 * pz * pz;
        let r2 = 0.5 * (b + (b * b - 4.0 * c).sqrt());
        r2.max(0.0).sqrt()
    }

    fn covariant(&self, x: [f64; 3]) -> MetricTensor4 {
        let a = self.a();
        let m = self.mass;
        let r = self.kerr_schild_radius(x);
        let (px, py, pz) = (x[0], x[1], x[2]);
        let r2a2 = r * r + a * a;

        let l = [
            1.0,
            (r * px + a * py) / r2a2,
            (r * py - a * px) / r2a2,
            if r.abs() > 1e-12 { pz / r } else { 0.0 },
        ];

        let f = 2.0 * m * r.powi(3) / (r.powi(4) + a * a * pz * pz).max(1e-300);

        let eta = [-1.0, 1.0, 1.0, 1.0];
        let mut g = [0.0f64; 16];
        for mu in 0..4 {
            for nu in 0..4 {
                let diag = if mu == nu { eta[mu] } else { 0.0 };
                g[mu * 4 + nu] = diag + f * l[mu] * l[nu];
            }
        }
        MetricTensor4::from_array(g)
    }

    fn contravariant(&self, x: [f64; 3]) -> MetricTensor4 {
        let a = self.a();
        let m = self.mass;
        let r = self.kerr_schild_radius(x);
        let (px, py, pz) = (x[0], x[1], x[2]);
        let r2a2 = r * r + a * a;

        // l^mu = eta^{mu nu} l_nu; eta is its own inverse (diag -1,1,1,1).
        let l_lower = [
            1.0,
            (r * px + a * py) / r2a2,
            (r * py - a * px) / r2a2,
            if r.abs() > 1e-12 { pz / r } else { 0.0 },
        ];
        let eta_inv = [-1.0, 1.0, 1.0, 1.0];
        let l_upper = [
            eta_inv[0] * l_lower[0],
            eta_inv[1] * l_lower[1],
            eta_inv[2] * l_lower[2],
            eta_inv[3] * l_lower[3],
        ];

        let f = 2.0 * m * r.powi(3) / (r.powi(4) + a * a * pz * pz).max(1e-300);

        let mut g = [0.0f64; 16];
        for mu in 0..4 {
            for nu in 0..4 {
                let diag = if mu == nu { eta_inv[mu] } else { 0.0 };
                g[mu * 4 + nu] = diag - f * l_upper[mu] * l_upper[nu];
            }
        }
        MetricTensor4::from_array(g)
    }

    fn mass(&self) -> f64 {
        self.mass
    }

    fn spin(&self) -> f64 {
        self.spin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn event_horizon_matches_closed_form() {
        let bh = Kerr::new(1.0, 0.9);
        let r_plus = 1.0 + (1.0f64 - 0.81).sqrt();
        assert_relative_eq!(bh.event_horizon(), r_plus, epsilon = 1e-12);
    }

    #[test]
    fn schwarzschild_limit_horizon_is_2m() {
        let bh = Kerr::new(1.0, 0.0);
        assert_relative_eq!(bh.event_horizon(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn kerr_schild_radius_on_equatorial_axis_matches_euclidean_for_zero_spin() {
        let bh = Kerr::new(1.0, 0.0);
        let r = bh.kerr_schild_radius([3.0, 4.0, 0.0]);
        assert_relative_eq!(r, 5.0, epsilon = 1e-10);
    }

    #[test]
    fn contravariant_is_inverse_of_covariant() {
        let bh = Kerr::new(1.0, 0.7);
        let x = [6.0, 2.0, 1.0];
        let g = bh.covariant(x);
        let g_inv = bh.contravariant(x);
        for mu in 0..4 {
            for nu in 0..4 {
                let mut sum = 0.0;
                for sigma in 0..4 {
                    sum += g_inv.get(mu, sigma) * g.get(sigma, nu);
                }
                let expect = if mu == nu { 1.0 } else { 0.0 };
                assert_relative_eq!(sum, expect, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn isco_shrinks_for_prograde_orbits_with_spin() {
        let bh = Kerr::new(1.0, 0.9);
        assert!(bh.isco(Orbit::Prograde) < bh.isco(Orbit::Retrograde));
        let schwarzschild = Kerr::new(1.0, 0.0);
        assert_relative_eq!(schwarzschild.isco(Orbit::Prograde), 6.0, epsilon = 1e-8);
    }

    #[test]
    fn photon_sphere_shrinks_for_prograde_orbits_with_spin() {
        let bh = Kerr::new(1.0, 0.9);
        assert!(bh.photon_sphere(Orbit::Prograde) < bh.photon_sphere(Orbit::Retrograde));
        let schwarzschild = Kerr::new(1.0, 0.0);
        assert_relative_eq!(schwarzschild.photon_sphere(Orbit::Prograde), 3.0, epsilon = 1e-8);
    }
}
