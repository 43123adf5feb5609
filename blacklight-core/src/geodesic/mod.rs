//! Geodesic integration: ray states, integrators, and trajectory computation.
//!
//! Traces null geodesics (photon paths) through any spacetime that
//! implements [`Metric`](crate::metric::Metric), in Cartesian Kerr-Schild
//! coordinates.

mod hamiltonian;
mod integrator;
mod termination;

pub use hamiltonian::get_state_derivative;
pub use integrator::{AdaptiveStepper, StepOptions, dormand_prince_step};
pub use termination::TerminationReason;

use crate::metric::Metric;

/// 8-dimensional phase-space state for a geodesic.
///
/// Coordinates x^mu = (t, x, y, z) in Cartesian Kerr-Schild.
/// Covariant momentum k_mu = (k_t, k_x, k_y, k_z).
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct GeodesicState {
    /// Spacetime coordinates (t, x, y, z).
    pub x: [f64; 4],
    /// Covariant 4-momentum (k_t, k_x, k_y, k_z).
    pub k: [f64; 4],
}

impl GeodesicState {
    /// Create a new geodesic state.
    pub fn new(t: f64, pos: [f64; 3], k: [f64; 4]) -> Self {
        Self { x: [t, pos[0], pos[1], pos[2]], k }
    }

    /// Spatial position (x, y, z).
    #[inline]
    pub fn position(&self) -> [f64; 3] {
        [self.x[1], self.x[2], self.x[3]]
    }

    /// Radial Kerr-Schild coordinate at the current position.
    pub fn r<M: Metric>(&self, metric: &M) -> f64 {
        metric.kerr_schild_radius(self.position())
    }

    /// Create a null ray at `pos` with spatial covariant momentum
    /// `k_spatial`, solving for the energy component k_t from the null
    /// constraint via [`crate::invariants::renormalize_null`].
    pub fn null_ray<M: Metric>(metric: &M, pos: [f64; 3], k_spatial: [f64; 3]) -> Self {
        let mut state = Self::new(0.0, pos, [-1.0, k_spatial[0], k_spatial[1], k_spatial[2]]);
        crate::invariants::renormalize_null(&mut state, metric);
        state
    }
}

// ===== Butcher tableau helpers shared by the adaptive stepper =====
impl GeodesicState {
    pub(crate) fn add_scaled(&self, d: Self, s: f64) -> Self {
        let mut n = *self;
        for i in 0..4 {
            n.x[i] += d.x[i] * s;
            n.k[i] += d.k[i] * s;
        }
        n
    }

    pub(crate) fn combine(base: &Self, terms: &[(Self, f64)]) -> Self {
        let mut n = *base;
        for (d, s) in terms {
            for i in 0..4 {
                n.x[i] += d.x[i] * s;
                n.k[i] += d.k[i] * s;
            }
        }
        n
    }
}

/// The result of integrating a geodesic to completion.
#[derive(Debug, Clone)]
pub struct Trajectory {
    /// The final state after integration (at the camera, after reversal).
    pub final_state: GeodesicState,
    /// Reason integration stopped.
    pub termination: TerminationReason,
    /// Number of integration steps taken.
    pub steps_taken: usize,
    /// Maximum absolute Hamiltonian value during integration (should be ~0 for null rays).
    pub max_hamiltonian_drift: f64,
    /// Path from camera to termination surface, front-to-back as integrated.
    /// Always recorded: the sampler (component D) needs it to build samples.
    pub path: Vec<GeodesicState>,
}

impl Trajectory {
    /// Whether this ray should be treated as flagged (integration failure).
    pub fn is_flagged(&self) -> bool {
        matches!(self.termination, TerminationReason::Flagged)
    }

    /// The path reversed into source-to-camera order, the order the
    /// radiative-transfer integrator walks a ray in.
    pub fn path_source_to_camera(&self) -> Vec<GeodesicState> {
        let mut reversed = self.path.clone();
        reversed.reverse();
        reversed
    }
}

/// Options controlling a single geodesic integration.
#[derive(Debug, Clone)]
pub struct IntegrationOptions {
    pub tolerance_abs: f64,
    pub tolerance_rel: f64,
    pub initial_step: f64,
    pub max_steps: usize,
    pub max_retries: usize,
    pub escape_radius: f64,
    pub renormalize_interval: usize,
    pub horizon_epsilon: f64,
    pub min_step: f64,
    pub max_step: f64,
}

impl Default for IntegrationOptions {
    fn default() -> Self {
        Self {
            tolerance_abs: 1e-8,
            tolerance_rel: 1e-8,
            initial_step: 0.01,
            max_steps: 10_000,
            max_retries: 20,
            escape_radius: 1000.0,
            renormalize_interval: 10,
            horizon_epsilon: 1e-3,
            min_step: 1e-5,
            max_step: 10.0,
        }
    }
}

/// Integrate a camera-to-source null geodesic through a given spacetime.
///
/// Rays are shot backwards from the camera; on return the path is in
/// camera-to-source order (`path`) with a convenience accessor
/// ([`Trajectory::path_source_to_camera`]) for the transfer integrator,
/// which walks from the far end of the ray towards the camera.
pub fn integrate<M: Metric>(
    initial: &GeodesicState,
    metric: &M,
    options: &IntegrationOptions,
) -> Trajectory {
    let mut state = *initial;
    let mut stepper = AdaptiveStepper::new(StepOptions {
        tolerance_abs: options.tolerance_abs,
        tolerance_rel: options.tolerance_rel,
        min_step: options.min_step,
        max_step: options.max_step,
        max_retries: options.max_retries,
    });
    let mut h = options.initial_step;

    let horizon = metric.event_horizon();
    let mut max_drift = 0.0;
    let mut steps = 0;
    let mut path = vec![state];

    crate::invariants::renormalize_null(&mut state, metric);

    for _ in 0..options.max_steps {
        let r = state.r(metric);
        if r < horizon * (1.0 + options.horizon_epsilon) {
            return finish(state, TerminationReason::Horizon, steps, max_drift, path);
        }
        if r > options.escape_radius {
            return finish(state, TerminationReason::Escape, steps, max_drift, path);
        }

        match stepper.step(&mut state, metric, h) {
            Some(next_h) => h = next_h,
            None => return finish(state, TerminationReason::Flagged, steps, max_drift, path),
        }

        if !state.x.iter().all(|v| v.is_finite()) || !state.k.iter().all(|v| v.is_finite()) {
            return finish(state, TerminationReason::Flagged, steps, max_drift, path);
        }

        if steps % options.renormalize_interval == 0 {
            crate::invariants::renormalize_null(&mut state, metric);
        }

        let h_val = crate::invariants::hamiltonian(&state, metric).abs();
        if h_val > max_drift {
            max_drift = h_val;
        }

        steps += 1;
        path.push(state);
    }

    finish(state, TerminationReason::MaxSteps, steps, max_drift, path)
}

fn finish(
    state: GeodesicState,
    termination: TerminationReason,
    steps: usize,
    max_drift: f64,
    path: Vec<GeodesicState>,
) -> Trajectory {
    Trajectory { final_state: state, termination, steps_taken: steps, max_hamiltonian_drift: max_drift, path }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::{Kerr, Minkowski};

    #[test]
    fn escaping_ray_terminates_with_escape() {
        let bh = Kerr::new(1.0, 0.5);
        let ray = GeodesicState::null_ray(&bh, [50.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        let traj = integrate(&ray, &bh, &IntegrationOptions { escape_radius: 200.0, ..Default::default() });
        assert_eq!(traj.termination, TerminationReason::Escape);
    }

    #[test]
    fn infalling_ray_is_swallowed() {
        let bh = Kerr::new(1.0, 0.5);
        let ray = GeodesicState::null_ray(&bh, [10.0, 0.0, 0.0], [-1.0, 0.0, 0.0]);
        let traj = integrate(&ray, &bh, &IntegrationOptions::default());
        assert_eq!(traj.termination, TerminationReason::Horizon);
    }

    #[test]
    fn flat_space_ray_travels_in_straight_line() {
        let flat = Minkowski;
        let ray = GeodesicState::null_ray(&flat, [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        let traj = integrate(&ray, &flat, &IntegrationOptions { escape_radius: 50.0, ..Default::default() });
        assert_eq!(traj.termination, TerminationReason::Escape);
        assert!(traj.final_state.position()[1].abs() < 1e-6);
        assert!(traj.final_state.position()[2].abs() < 1e-6);
    }
}
