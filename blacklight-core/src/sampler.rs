//! Resampling a traced geodesic onto transfer-step midpoints.
//!
//! The integrator records states at its own adaptively chosen steps; the
//! transfer integrator instead wants midpoint samples with the step size
//! Delta-lambda attached, walking from the far end of the ray towards the
//! camera. This module bridges the two.

use crate::geodesic::{GeodesicState, Trajectory};
use crate::metric::Metric;

/// One radiative-transfer sample: state at the segment midpoint plus the
/// affine-parameter length of the segment it represents.
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    pub state: GeodesicState,
    pub dlambda: f64,
}

/// Resample a trajectory's source-to-camera path into transfer-step
/// midpoints. A sample falling inside the horizon is dropped (the
/// trajectory should already terminate there, but a defensive clip keeps a
/// stray integrator overshoot from poisoning the sample array).
pub fn resample<M: Metric>(trajectory: &Trajectory, metric: &M) -> Vec<Sample> {
    let path = trajectory.path_source_to_camera();
    if path.len() < 2 {
        return Vec::new();
    }

    let horizon = metric.event_horizon();
    let mut samples = Vec::with_capacity(path.len() - 1);

    for pair in path.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let dlambda = (b.x[0] - a.x[0]).abs().max((b.x[1] - a.x[1]).abs()).max(1e-12);
        let mid = midpoint(&a, &b);
        if mid.r(metric) < horizon {
            continue;
        }
        samples.push(Sample { state: mid, dlambda });
    }
    samples
}

fn midpoint(a: &GeodesicState, b: &GeodesicState) -> GeodesicState {
    let mut x = [0.0; 4];
    let mut k = [0.0; 4];
    for i in 0..4 {
        x[i] = 0.5 * (a.x[i] + b.x[i]);
        k[i] = 0.5 * (a.k[i] + b.k[i]);
    }
    GeodesicState { x, k }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesic::{IntegrationOptions, integrate};
    use crate::metric::Kerr;

    #[test]
    fn resampling_an_escaping_ray_yields_one_fewer_sample_than_path_states() {
        let bh = Kerr::new(1.0, 0.5);
        let ray = crate::geodesic::GeodesicState::null_ray(&bh, [50.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        let traj = integrate(&ray, &bh, &IntegrationOptions { escape_radius: 80.0, ..Default::default() });
        let samples = resample(&traj, &bh);
        assert_eq!(samples.len(), traj.path.len() - 1);
    }
}
