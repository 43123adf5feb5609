//! The coefficient binder: adapts a pluggable physical model into the eight
//! transport coefficients the radiative-transfer integrator needs at every
//! sample.
//!
//! The model is selected once, at [`crate::render::Renderer`] construction,
//! as a `Box<dyn CoefficientModel>` -- a capability chosen once and invoked
//! uniformly in the sample loop, rather than branching on `model_type`
//! inside it.

mod fluid;
mod formula;

pub use fluid::{FluidGrid, SimulationModel, UniformGrid};
pub use formula::FormulaModel;

use crate::geodesic::GeodesicState;
use crate::metric::Metric;

/// The eight transport coefficients at a single sample, in the fluid
/// (comoving) frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct Coefficients {
    pub j_i: f64,
    pub j_q: f64,
    pub j_v: f64,
    pub alpha_i: f64,
    pub alpha_q: f64,
    pub alpha_v: f64,
    pub rho_q: f64,
    pub rho_v: f64,
}

/// A pluggable source of emission/absorption/Faraday coefficients.
pub trait CoefficientModel: Sync {
    /// Evaluate coefficients at geodesic state `state` (fluid-frame
    /// frequency `nu_fluid` already folded in by the caller via the
    /// redshift factor). Returns `None` where the fluid is undefined
    /// (outside the modeled region); the binder then applies the
    /// `fallback_nan` policy.
    fn evaluate(&self, state: &GeodesicState, nu_fluid: f64) -> Option<Coefficients>;
}

/// Binds a coefficient model to geodesic samples, normalizing the observed
/// camera frequency to each sample's fluid-frame frequency via the
/// gravitational + Doppler redshift factor (k.u)_emit / (k.u)_cam, and
/// Lorentz-invariant units (j scaled by nu^2, alpha scaled by 1/nu).
pub struct CoefficientBinder<'a> {
    model: &'a dyn CoefficientModel,
    nu_camera: f64,
    fallback_nan: bool,
}

impl<'a> CoefficientBinder<'a> {
    pub fn new(model: &'a dyn CoefficientModel, nu_camera: f64, fallback_nan: bool) -> Self {
        Self { model, nu_camera, fallback_nan }
    }

    /// Evaluate coefficients for one sample, given the fluid's contravariant
    /// 4-velocity `u_fluid` at the sample.
    pub fn bind<M: Metric>(&self, _metric: &M, state: &GeodesicState, u_fluid: [f64; 4]) -> Coefficients {
        let g_factor = redshift_factor(state, u_fluid);
        let nu_fluid = self.nu_camera * g_factor;

        match self.model.evaluate(state, nu_fluid) {
            Some(mut c) => {
                let nu2 = nu_fluid * nu_fluid;
                c.j_i /= nu2.max(1e-300);
                c.j_q /= nu2.max(1e-300);
                c.j_v /= nu2.max(1e-300);
                c.alpha_i *= nu_fluid;
                c.alpha_q *= nu_fluid;
                c.alpha_v *= nu_fluid;
                c
            }
            None => {
                if self.fallback_nan {
                    Coefficients {
                        j_i: f64::NAN,
                        j_q: f64::NAN,
                        j_v: f64::NAN,
                        alpha_i: f64::NAN,
                        alpha_q: f64::NAN,
                        alpha_v: f64::NAN,
                        rho_q: f64::NAN,
                        rho_v: f64::NAN,
                    }
                } else {
                    Coefficients::default()
                }
            }
        }
    }
}

/// g = (k.u)_emit / (k.u)_cam, the ratio used to shift the camera-frame
/// frequency into the fluid's comoving frame. k.u = k_mu u^mu needs no
/// metric: k is already covariant and u contravariant. The camera is taken
/// as a static observer at large r, where k.u_cam ~ -k_t.
fn redshift_factor(state: &GeodesicState, u_fluid: [f64; 4]) -> f64 {
    let k_dot_u_emit: f64 = (0..4).map(|i| state.k[i] * u_fluid[i]).sum();
    let k_dot_u_cam = -state.k[0];
    if k_dot_u_cam.abs() < 1e-300 {
        1.0
    } else {
        (k_dot_u_emit / k_dot_u_cam).abs()
    }
}
