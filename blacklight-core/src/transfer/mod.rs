//! Radiative transfer along a traced, resampled geodesic.
//!
//! Two integrators share the same sample stream: [`unpolarized::transport`]
//! carries a single scalar intensity (analytic exponential step, exact for
//! piecewise-constant coefficients over a segment), and
//! [`polarized::transport`] carries the full Stokes vector including Faraday
//! rotation/conversion, falling back to a first-order matrix exponential when
//! the rotation coefficients are small enough that the o-mode-exact
//! diagonalization would be numerically ill-conditioned.

pub mod polarized;
pub mod unpolarized;

pub use polarized::{PolarizedResult, StokesVector};
pub use unpolarized::UnpolarizedResult;
