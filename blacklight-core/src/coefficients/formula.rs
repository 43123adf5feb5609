//! The reference analytic coefficient source: a Page-Thorne thin-disk
//! synchrotron toy model, grounded directly in [`crate::physics::disk`] and
//! [`crate::physics::spectrum`].

use crate::coefficients::{CoefficientModel, Coefficients};
use crate::geodesic::GeodesicState;
use crate::metric::{Kerr, Metric, Orbit};
use crate::physics::{disk, spectrum};

/// Analytic thin-disk model: emits as a Planck blackbody at the Page-Thorne
/// effective temperature within `[r_isco, r_outer]`, in the equatorial
/// plane only (|z| < `half_thickness`).
pub struct FormulaModel {
    pub hole: Kerr,
    pub accretion_rate: f64,
    pub r_outer: f64,
    pub half_thickness: f64,
}

impl FormulaModel {
    pub fn new(hole: Kerr, accretion_rate: f64, r_outer: f64, half_thickness: f64) -> Self {
        Self { hole, accretion_rate, r_outer, half_thickness }
    }
}

impl CoefficientModel for FormulaModel {
    fn evaluate(&self, state: &GeodesicState, nu_fluid: f64) -> Option<Coefficients> {
        let pos = state.position();
        if pos[2].abs() > self.half_thickness {
            return None;
        }

        let r = self.hole.kerr_schild_radius(pos);
        let r_isco = self.hole.isco(Orbit::Prograde);
        if r < r_isco || r > self.r_outer {
            return None;
        }

        let temperature = disk::temperature(r, &self.hole, self.accretion_rate);
        if temperature <= 0.0 {
            return None;
        }

        // Planck emissivity at the fluid-frame frequency, converted from
        // wavelength-space planck_law via nu = c / lambda.
        let c = crate::constants::SI_C;
        let lambda = if nu_fluid > 0.0 { c / nu_fluid } else { f64::INFINITY };
        let j_i = spectrum::planck_law(lambda, temperature).max(0.0);

        // Optically thick near the midplane, thin in the skin: blend
        // absorptivity so alpha_I*j_I/alpha_I recovers the source function.
        let alpha_i = (j_i / (temperature.powi(3) + 1.0)).max(1e-12);

        Some(Coefficients {
            j_i,
            j_q: 0.1 * j_i,
            j_v: 0.0,
            alpha_i,
            alpha_q: 0.1 * alpha_i,
            alpha_v: 0.0,
            rho_q: 0.0,
            rho_v: 0.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_emission_outside_the_disk_annulus() {
        let hole = Kerr::new(1.0, 0.9);
        let model = FormulaModel::new(hole, 1.0, 50.0, 0.5);
        let inside_horizon = GeodesicState::new(0.0, [1.5, 0.0, 0.0], [-1.0, 0.0, 0.0, 0.0]);
        assert!(model.evaluate(&inside_horizon, 1e14).is_none());
    }

    #[test]
    fn emission_is_positive_within_the_disk_annulus() {
        let hole = Kerr::new(1.0, 0.9);
        let model = FormulaModel::new(hole, 1.0, 50.0, 0.5);
        let r_mid = 0.5 * (hole.isco(Orbit::Prograde) + 50.0);
        let in_disk = GeodesicState::new(0.0, [r_mid, 0.0, 0.0], [-1.0, 0.0, 0.0, 0.0]);
        let c = model.evaluate(&in_disk, 1e14).unwrap();
        assert!(c.j_i > 0.0);
        assert!(c.alpha_i > 0.0);
    }
}
