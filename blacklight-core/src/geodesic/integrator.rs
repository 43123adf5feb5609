//! Adaptive Dormand-Prince 5(4) integrator for null geodesics.
//!
//! Dormand-Prince is a 7-stage, FSAL (first-same-as-last), embedded 4th/5th
//! order Runge-Kutta pair: the 5th-order solution is advanced, and the
//! difference against the embedded 4th-order solution drives step-size
//! control.

use crate::geodesic::{GeodesicState, hamiltonian::get_state_derivative};
use crate::metric::Metric;

/// Tolerances and bounds for the adaptive step-size controller.
#[derive(Debug, Clone, Copy)]
pub struct StepOptions {
    pub tolerance_abs: f64,
    pub tolerance_rel: f64,
    pub min_step: f64,
    pub max_step: f64,
    pub max_retries: usize,
}

/// Adaptive step-size controller driving the Dormand-Prince stepper.
pub struct AdaptiveStepper {
    opts: StepOptions,
    safety_factor: f64,
    min_factor: f64,
    max_factor: f64,
}

impl AdaptiveStepper {
    pub fn new(opts: StepOptions) -> Self {
        Self { opts, safety_factor: 0.9, min_factor: 0.2, max_factor: 5.0 }
    }

    /// Perform a single adaptive step, retrying with a shrunk step on
    /// rejection. Updates `state` in place and returns the step size
    /// recommended for the following call, or `None` if `max_retries` was
    /// exhausted without an accepted step (the caller should flag the ray).
    pub fn step<M: Metric>(&mut self, state: &mut GeodesicState, metric: &M, h_try: f64) -> Option<f64> {
        let mut h = h_try.clamp(-self.opts.max_step, self.opts.max_step);
        if h == 0.0 {
            h = self.opts.min_step;
        }

        for _ in 0..self.opts.max_retries {
            let (candidate, error_norm) = dormand_prince_step(state, metric, h, &self.opts);

            if error_norm <= 1.0 {
                *state = candidate;
                let growth = if error_norm < 1e-10 {
                    self.max_factor
                } else {
                    (self.safety_factor * error_norm.powf(-0.2)).clamp(self.min_factor, self.max_factor)
                };
                return Some((h * growth).clamp(-self.opts.max_step, self.opts.max_step));
            }

            let shrink = (self.safety_factor * error_norm.powf(-0.25)).clamp(self.min_factor, 1.0);
            h *= shrink;
            if h.abs() < self.opts.min_step {
                h = self.opts.min_step * h.signum();
                let (forced, _) = dormand_prince_step(state, metric, h, &self.opts);
                *state = forced;
                return Some(h);
            }
        }
        None
    }
}

/// Single Dormand-Prince 5(4) step. Returns (candidate 5th-order state,
/// normalized error estimate).
pub fn dormand_prince_step<M: Metric>(
    state: &GeodesicState,
    metric: &M,
    h: f64,
    opts: &StepOptions,
) -> (GeodesicState, f64) {
    let k1 = get_state_derivative(state, metric);
    let k2 = get_state_derivative(&state.add_scaled(k1, h * (1.0 / 5.0)), metric);
    let k3 = get_state_derivative(
        &GeodesicState::combine(state, &[(k1, h * 3.0 / 40.0), (k2, h * 9.0 / 40.0)]),
        metric,
    );
    let k4 = get_state_derivative(
        &GeodesicState::combine(
            state,
            &[(k1, h * 44.0 / 45.0), (k2, h * -56.0 / 15.0), (k3, h * 32.0 / 9.0)],
        ),
        metric,
    );
    let k5 = get_state_derivative(
        &GeodesicState::combine(
            state,
            &[
                (k1, h * 19372.0 / 6561.0),
                (k2, h * -25360.0 / 2187.0),
                (k3, h * 64448.0 / 6561.0),
                (k4, h * -212.0 / 729.0),
            ],
        ),
        metric,
    );
    let k6 = get_state_derivative(
        &GeodesicState::combine(
            state,
            &[
                (k1, h * 9017.0 / 3168.0),
                (k2, h * -355.0 / 33.0),
                (k3, h * 46732.0 / 5247.0),
                (k4, h * 49.0 / 176.0),
                (k5, h * -5103.0 / 18656.0),
            ],
        ),
        metric,
    );

    // 5th-order solution; note k7 below is the FSAL stage, f(y5).
    let y5 = GeodesicState::combine(
        state,
        &[
            (k1, h * 35.0 / 384.0),
            (k3, h * 500.0 / 1113.0),
            (k4, h * 125.0 / 192.0),
            (k5, h * -2187.0 / 6784.0),
            (k6, h * 11.0 / 84.0),
        ],
    );
    let k7 = get_state_derivative(&y5, metric);

    // Embedded 4th-order solution.
    let y4 = GeodesicState::combine(
        state,
        &[
            (k1, h * 5179.0 / 57600.0),
            (k3, h * 7571.0 / 16695.0),
            (k4, h * 393.0 / 640.0),
            (k5, h * -92097.0 / 339200.0),
            (k6, h * 187.0 / 2100.0),
            (k7, h * 1.0 / 40.0),
        ],
    );

    let mut error_norm = 0.0f64;
    for i in 0..4 {
        let tol_x = opts.tolerance_abs + opts.tolerance_rel * y5.x[i].abs().max(state.x[i].abs());
        let tol_k = opts.tolerance_abs + opts.tolerance_rel * y5.k[i].abs().max(state.k[i].abs());
        error_norm = error_norm.max(((y5.x[i] - y4.x[i]) / tol_x).abs());
        error_norm = error_norm.max(((y5.k[i] - y4.k[i]) / tol_k).abs());
    }

    (y5, error_norm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::Minkowski;

    #[test]
    fn flat_space_step_has_near_zero_error() {
        let flat = Minkowski;
        let state = GeodesicState::new(0.0, [10.0, 0.0, 0.0], [-1.0, 1.0, 0.0, 0.0]);
        let opts = StepOptions { tolerance_abs: 1e-10, tolerance_rel: 1e-10, min_step: 1e-6, max_step: 10.0, max_retries: 5 };
        let (_next, err) = dormand_prince_step(&state, &flat, 0.5, &opts);
        assert!(err < 1e-6);
    }
}
