//! Momentum renormalization for null geodesics.
//!
//! Projects the energy component k_t onto the null constraint surface H = 0,
//! holding the spatial momentum fixed, to correct numerical drift
//! accumulated during integration (and to solve for k_t when a ray is
//! constructed from a spatial direction alone, e.g. at the camera).

use crate::geodesic::GeodesicState;
use crate::metric::Metric;

/// Renormalize momentum to strictly satisfy H = 0 (null geodesic condition).
///
/// Solves the quadratic A k_t^2 + B k_t + C = 0 for k_t, choosing the
/// future-pointing root (k_t < 0) closest to the current value.
pub fn renormalize_null<M: Metric>(state: &mut GeodesicState, metric: &M) {
    let g_inv = metric.contravariant(state.position());
    let g = g_inv.as_array();
    let k = state.k;

    let a_quad = g[0]; // g^tt
    let b_quad = 2.0 * (g[1] * k[1] + g[2] * k[2] + g[3] * k[3]); // 2 g^{t i} k_i
    let c_quad = g[5] * k[1] * k[1]
        + g[10] * k[2] * k[2]
        + g[15] * k[3] * k[3]
        + 2.0 * g[6] * k[1] * k[2]
        + 2.0 * g[7] * k[1] * k[3]
        + 2.0 * g[11] * k[2] * k[3];

    if a_quad.abs() < 1e-12 {
        return;
    }
    let discriminant = b_quad * b_quad - 4.0 * a_quad * c_quad;
    if discriminant < 0.0 {
        return;
    }
    let sqrt_d = discriminant.sqrt();
    let sol1 = (-b_quad + sqrt_d) / (2.0 * a_quad);
    let sol2 = (-b_quad - sqrt_d) / (2.0 * a_quad);

    // Prefer the negative (future-pointing) root; between two negative
    // roots, keep whichever is closer to the current value.
    state.k[0] = match (sol1 < 0.0, sol2 < 0.0) {
        (true, false) => sol1,
        (false, true) => sol2,
        _ => {
            if (sol1 - k[0]).abs() < (sol2 - k[0]).abs() {
                sol1
            } else {
                sol2
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::Kerr;

    #[test]
    fn renormalized_state_is_null() {
        let bh = Kerr::new(1.0, 0.8);
        let mut state = GeodesicState::new(0.0, [15.0, 3.0, 1.0], [-1.0, 0.4, 0.2, 0.1]);
        renormalize_null(&mut state, &bh);
        let h = crate::invariants::hamiltonian(&state, &bh);
        assert!(h.abs() < 1e-9);
        assert!(state.k[0] < 0.0);
    }
}
