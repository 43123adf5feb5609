//! Constants of motion in Kerr spacetime.

use crate::geodesic::GeodesicState;
use crate::metric::Metric;
use num_complex::Complex64;

/// The constants of motion for a null geodesic in Kerr spacetime.
#[derive(Debug, Clone, Copy)]
pub struct ConstantsOfMotion {
    /// Conserved energy E = -k_t.
    pub energy: f64,
    /// Conserved axial angular momentum L_z = x k_y - y k_x.
    pub angular_momentum: f64,
    /// Carter constant Q (from the Killing-Yano tensor).
    pub carter_constant: f64,
    /// Hamiltonian H = (1/2) g^{mu nu} k_mu k_nu (should be 0 for null rays).
    pub hamiltonian: f64,
    /// Walker-Penrose constant (complex, conserved for null geodesics).
    pub walker_penrose: Complex64,
}

/// Compute all constants of motion for a geodesic state.
pub fn compute_constants<M: Metric>(state: &GeodesicState, metric: &M) -> ConstantsOfMotion {
    let pos = state.position();
    let r = metric.kerr_schild_radius(pos);
    let theta = if r > 1e-9 { (pos[2] / r).clamp(-1.0, 1.0).acos() } else { std::f64::consts::FRAC_PI_2 };

    let energy = -state.k[0];
    let angular_momentum = pos[0] * state.k[2] - pos[1] * state.k[1];

    let a = metric.spin() * metric.mass();
    let cos_theta = theta.cos();
    let sin_theta = theta.sin();
    let sin2 = sin_theta * sin_theta;

    let e2 = energy * energy;
    let lz2 = angular_momentum * angular_momentum;
    // Approximate polar momentum via the spherical-angular component of k;
    // projecting the Cartesian covariant momentum onto the polar direction.
    let rho = (pos[0] * pos[0] + pos[1] * pos[1]).sqrt().max(1e-12);
    let p_theta_like = (pos[2] * (pos[0] * state.k[1] + pos[1] * state.k[2]) / rho
        - rho * state.k[2])
        .abs();

    let lz_term = if sin2 < 1e-12 { 0.0 } else { lz2 / sin2 };
    let carter = p_theta_like * p_theta_like + cos_theta * cos_theta * (lz_term - a * a * e2);

    let h = crate::invariants::hamiltonian(state, metric);

    let rho_inv = Complex64::new(r, a * cos_theta);
    let walker_penrose = rho_inv * carter.max(0.0).sqrt();

    ConstantsOfMotion {
        energy,
        angular_momentum,
        carter_constant: carter,
        hamiltonian: h,
        walker_penrose,
    }
}
