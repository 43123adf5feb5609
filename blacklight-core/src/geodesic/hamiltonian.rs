//! Hamiltonian equations of motion for geodesics.

use crate::geodesic::GeodesicState;
use crate::metric::Metric;

/// Compute the affine derivative of the phase-space state (Hamilton's equations).
///
/// dx^mu/dlambda = dH/dk_mu = g^{mu nu} k_nu
/// dk_mu/dlambda = -dH/dx^mu
///
/// The metric is stationary (dH/dt = 0), so dk_t/dlambda = 0; the other
/// three components come from [`Metric::hamiltonian_gradient`].
pub fn get_state_derivative<M: Metric>(state: &GeodesicState, metric: &M) -> GeodesicState {
    let pos = state.position();
    let g_inv = metric.contravariant(pos);
    let dx = g_inv.raise_index(&state.k);

    let grad = metric.hamiltonian_gradient(pos, state.k);

    GeodesicState {
        x: dx,
        k: [0.0, -grad.dh_dx, -grad.dh_dy, -grad.dh_dz],
    }
}
