//! The simulation-snapshot collaborator.
//!
//! A real GRMHD snapshot reader (HDF5 or an AMR binary grid) is out of
//! scope here; [`FluidGrid`] is the trait a real reader would implement,
//! and [`UniformGrid`] is a small in-memory stand-in sufficient for tests
//! and for `SimulationModel`'s own unit coverage.

use crate::coefficients::{CoefficientModel, Coefficients};
use crate::geodesic::GeodesicState;

/// Local fluid state at a point, in the fluid's comoving frame.
#[derive(Debug, Clone, Copy)]
pub struct FluidState {
    pub density: f64,
    pub temperature: f64,
    /// Contravariant 4-velocity of the fluid at this point.
    pub four_velocity: [f64; 4],
    /// Comoving-frame magnetic field magnitude (used by Faraday coefficients).
    pub b_field: f64,
}

/// A volumetric fluid snapshot, sampled at a Cartesian Kerr-Schild position.
pub trait FluidGrid: Sync {
    /// Sample the fluid state at `x`. Returns `None` outside the grid's
    /// domain or where the cell is masked invalid.
    fn sample(&self, x: [f64; 3]) -> Option<FluidState>;
}

/// A uniform, analytically defined fluid fill -- the in-memory `FluidGrid`
/// this expanded spec ships in place of a real snapshot reader. Density
/// falls off as a power law in Kerr-Schild radius outside `r_in`.
pub struct UniformGrid {
    pub r_in: f64,
    pub r_out: f64,
    pub density_0: f64,
    pub temperature_0: f64,
    pub b_field_0: f64,
    pub power_law_index: f64,
}

impl FluidGrid for UniformGrid {
    fn sample(&self, x: [f64; 3]) -> Option<FluidState> {
        let r = (x[0] * x[0] + x[1] * x[1] + x[2] * x[2]).sqrt();
        if r < self.r_in || r > self.r_out {
            return None;
        }
        let falloff = (self.r_in / r).powf(self.power_law_index);
        // Rigid azimuthal rotation about z, at rest radially/vertically --
        // a crude stand-in for a thin Keplerian disk's fluid frame.
        let omega = (self.r_in / r).powf(1.5) / self.r_in.powf(1.5).max(1e-12) * 0.1;
        let four_velocity = [1.0, -omega * x[1], omega * x[0], 0.0];
        Some(FluidState {
            density: self.density_0 * falloff,
            temperature: self.temperature_0 * falloff,
            four_velocity,
            b_field: self.b_field_0 * falloff.sqrt(),
        })
    }
}

/// Coefficient model backed by a [`FluidGrid`]: evaluates synchrotron
/// emission/absorption from the local density, temperature, and field
/// strength rather than from a closed-form disk formula.
pub struct SimulationModel<G: FluidGrid> {
    pub grid: G,
}

impl<G: FluidGrid> SimulationModel<G> {
    pub fn new(grid: G) -> Self {
        Self { grid }
    }
}

impl<G: FluidGrid> CoefficientModel for SimulationModel<G> {
    fn evaluate(&self, state: &GeodesicState, nu_fluid: f64) -> Option<Coefficients> {
        let fluid = self.grid.sample(state.position())?;
        if !fluid.density.is_finite() || fluid.density <= 0.0 {
            return None;
        }

        // Thermal synchrotron toy emissivity/absorptivity, grounded in the
        // same Planck-function-weighted scaling as the formula model but
        // driven by grid temperature/density/field rather than a closed
        // form in r.
        let theta_e = (crate::constants::SI_KB * fluid.temperature
            / (9.109e-31 * crate::constants::SI_C * crate::constants::SI_C))
            .max(1e-6);
        let nu_c = 2.8e6 * fluid.b_field;
        let x = nu_fluid / (nu_c * theta_e * theta_e).max(1e-300);

        let j_i = fluid.density * fluid.b_field * x.sqrt() * (-x.cbrt()).exp();
        let alpha_i = j_i / (nu_fluid * nu_fluid).max(1e-300) * crate::constants::SI_KB * fluid.temperature;

        Some(Coefficients {
            j_i,
            j_q: 0.3 * j_i,
            j_v: 0.05 * j_i,
            alpha_i,
            alpha_q: 0.3 * alpha_i,
            alpha_v: 0.05 * alpha_i,
            rho_q: 0.0,
            rho_v: 0.1 * fluid.b_field,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_grid_returns_none_outside_its_annulus() {
        let grid = UniformGrid { r_in: 6.0, r_out: 40.0, density_0: 1.0, temperature_0: 1e9, b_field_0: 10.0, power_law_index: 2.0 };
        assert!(grid.sample([1.0, 0.0, 0.0]).is_none());
        assert!(grid.sample([20.0, 0.0, 0.0]).is_some());
    }

    #[test]
    fn simulation_model_yields_finite_coefficients_inside_grid() {
        let grid = UniformGrid { r_in: 6.0, r_out: 40.0, density_0: 1.0, temperature_0: 1e9, b_field_0: 10.0, power_law_index: 2.0 };
        let model = SimulationModel::new(grid);
        let state = GeodesicState::new(0.0, [10.0, 0.0, 0.0], [-1.0, 0.0, 0.0, 0.0]);
        let c = model.evaluate(&state, 2.3e11).unwrap();
        assert!(c.j_i.is_finite() && c.j_i >= 0.0);
    }
}
