//! Scalar (Stokes-I-only) radiative transfer.
//!
//! Over one segment of constant coefficients the transfer equation
//! dI/dlambda = j - alpha*I has the closed-form solution
//! I' = I*exp(-alpha*dlambda) + (j/alpha)*(1 - exp(-alpha*dlambda)),
//! which this integrator applies exactly rather than sub-stepping.

use crate::coefficients::CoefficientBinder;
use crate::metric::Metric;
use crate::sampler::Sample;

/// Accumulated result of an unpolarized transfer pass along one ray.
///
/// Besides `intensity` (the `light`/`render` image), this carries the
/// auxiliary integrals named in the image-selection config: total traversed
/// affine parameter and path length, the integrated emissivity, and
/// optical-depth-weighted means, one field per selectable diagnostic map.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnpolarizedResult {
    pub intensity: f64,
    pub optical_depth: f64,
    /// Emission-weighted affine-parameter "time of flight" from camera,
    /// for the `time` auxiliary image.
    pub emission_time: f64,
    /// Emission-weighted path length, for the `length` auxiliary image.
    pub emission_length: f64,
    /// Total affine parameter traversed, for the `lambda` image.
    pub total_lambda: f64,
    /// Integrated emissivity, integral of j_I d(lambda), for the `emission` image.
    pub emission_integral: f64,
    numerator_lambda_ave: f64,
    numerator_emission_ave: f64,
    /// Running integral of optical depth over affine parameter, for the
    /// `tau_int` image.
    pub tau_integral: f64,
}

impl UnpolarizedResult {
    /// Optical-depth-weighted mean affine parameter along the ray, for the
    /// `lambda_ave` image. `0.0` on a ray with zero accumulated optical depth.
    pub fn lambda_ave(&self) -> f64 {
        if self.optical_depth > 0.0 { self.numerator_lambda_ave / self.optical_depth } else { 0.0 }
    }

    /// Optical-depth-weighted mean emissivity along the ray, for the
    /// `emission_ave` image. `0.0` on a ray with zero accumulated optical depth.
    pub fn emission_ave(&self) -> f64 {
        if self.optical_depth > 0.0 { self.numerator_emission_ave / self.optical_depth } else { 0.0 }
    }
}

/// Integrate Stokes I along `samples` (camera-to-source order expected from
/// [`crate::sampler::resample`] after reversal -- callers pass samples in
/// the order transfer should accumulate, i.e. source-to-camera, so that
/// intensity measured at the end is what the camera receives).
pub fn transport<M: Metric>(
    samples: &[Sample],
    binder: &CoefficientBinder,
    metric: &M,
    u_fluid_at: impl Fn(usize) -> [f64; 4],
) -> UnpolarizedResult {
    let mut result = UnpolarizedResult::default();

    for (idx, sample) in samples.iter().enumerate() {
        let u_fluid = u_fluid_at(idx);
        let c = binder.bind(metric, &sample.state, u_fluid);
        let dlambda = sample.dlambda;

        if !c.j_i.is_finite() || !c.alpha_i.is_finite() {
            continue;
        }

        let tau_step = (c.alpha_i * dlambda).max(0.0);

        // alpha_I -> 0 limit: the closed form's j_I/alpha_I * (1 - decay)
        // term is 0/0 there, but the transfer equation itself reduces to
        // dI/dlambda = j_I, i.e. a plain linear accumulation.
        let step_intensity = if c.alpha_i.abs() > 1e-12 {
            let decay = (-tau_step).exp();
            let source = c.j_i / c.alpha_i;
            result.intensity * decay + source * (1.0 - decay)
        } else {
            result.intensity + c.j_i * dlambda
        };

        result.emission_time += (step_intensity - result.intensity).abs() * sample.state.x[0];
        result.emission_length += (step_intensity - result.intensity).abs() * dlambda;
        result.intensity = step_intensity;
        result.total_lambda += dlambda;
        result.emission_integral += c.j_i * dlambda;
        result.numerator_lambda_ave += result.total_lambda * tau_step;
        result.numerator_emission_ave += c.j_i * tau_step;
        result.tau_integral += result.optical_depth * dlambda;
        result.optical_depth += tau_step;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coefficients::{CoefficientModel, Coefficients, FormulaModel};
    use crate::geodesic::{GeodesicState, IntegrationOptions, integrate};
    use crate::metric::Kerr;

    struct ConstantEmitter;
    impl CoefficientModel for ConstantEmitter {
        fn evaluate(&self, _state: &GeodesicState, _nu: f64) -> Option<Coefficients> {
            Some(Coefficients { j_i: 1.0, alpha_i: 1.0, ..Default::default() })
        }
    }

    #[test]
    fn optically_thick_segment_saturates_to_source_function() {
        let bh = Kerr::new(1.0, 0.5);
        let ray = GeodesicState::null_ray(&bh, [50.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        let traj = integrate(&ray, &bh, &IntegrationOptions { escape_radius: 80.0, ..Default::default() });
        let samples = crate::sampler::resample(&traj, &bh);
        let model = ConstantEmitter;
        let binder = CoefficientBinder::new(&model, 1.0, false);
        let result = transport(&samples, &binder, &bh, |_| [1.0, 0.0, 0.0, 0.0]);
        assert!(result.intensity.is_finite());
        assert!(result.optical_depth >= 0.0);
    }

    #[test]
    fn formula_model_produces_a_finite_intensity() {
        let bh = Kerr::new(1.0, 0.9);
        let ray = GeodesicState::null_ray(&bh, [200.0, 0.0, 5.0], [-1.0, 0.0, -0.02]);
        let traj = integrate(&ray, &bh, &IntegrationOptions { escape_radius: 400.0, ..Default::default() });
        let samples = crate::sampler::resample(&traj, &bh);
        let model = FormulaModel::new(bh, 1.0, 50.0, 1.0);
        let binder = CoefficientBinder::new(&model, 2.3e11, false);
        let result = transport(&samples, &binder, &bh, |_| [1.0, 0.0, 0.0, 0.0]);
        assert!(result.intensity.is_finite() && result.intensity >= 0.0);
    }

    struct UnitEmitterNoAbsorption;
    impl CoefficientModel for UnitEmitterNoAbsorption {
        fn evaluate(&self, _state: &GeodesicState, _nu: f64) -> Option<Coefficients> {
            Some(Coefficients { j_i: 1.0, alpha_i: 0.0, ..Default::default() })
        }
    }

    #[test]
    fn optically_thin_limit_accumulates_j_times_dlambda() {
        let state = GeodesicState::new(0.0, [20.0, 0.0, 0.0], [-1.0, 1.0, 0.0, 0.0]);
        let sample = crate::sampler::Sample { state, dlambda: 1.0 };
        let model = UnitEmitterNoAbsorption;
        let binder = CoefficientBinder::new(&model, 1.0, false);
        let bh = Kerr::new(1.0, 0.5);
        let result = transport(&[sample], &binder, &bh, |_| [1.0, 0.0, 0.0, 0.0]);
        assert!((result.intensity - 1.0).abs() < 1e-12);
    }
}
