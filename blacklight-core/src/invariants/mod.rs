//! Conservation laws and Hamiltonian monitoring.
//!
//! In Kerr spacetime, null geodesics have conserved energy, axial angular
//! momentum, a Carter constant from the hidden Killing-Yano symmetry, and a
//! Hamiltonian that should remain zero along the null constraint surface.

mod audit;
mod constants_of_motion;
mod renormalization;

pub use audit::NumericalAudit;
pub use constants_of_motion::{ConstantsOfMotion, compute_constants};
pub use renormalization::renormalize_null;

use crate::geodesic::GeodesicState;
use crate::metric::Metric;

/// Compute the Hamiltonian H = (1/2) g^{mu nu} k_mu k_nu.
///
/// For null geodesics this should be 0; non-zero values indicate numerical drift.
pub fn hamiltonian<M: Metric>(state: &GeodesicState, metric: &M) -> f64 {
    let g_inv = metric.contravariant(state.position());
    0.5 * g_inv.contract(&state.k)
}
