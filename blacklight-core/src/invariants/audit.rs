//! Numerical derivative audit for validating the Hamiltonian gradient.

use crate::metric::{HamiltonianGradient, Metric};

/// Verifies a metric's (possibly analytic) Hamiltonian gradient against
/// independent central finite differences, at a different step than the
/// default used internally.
pub struct NumericalAudit<'a, M: Metric> {
    pub metric: &'a M,
    pub eps: f64,
}

impl<'a, M: Metric> NumericalAudit<'a, M> {
    pub fn new(metric: &'a M) -> Self {
        Self { metric, eps: 1e-7 }
    }

    /// Compute dH/dx, dH/dy, dH/dz numerically via central differences.
    pub fn numerical_gradient(&self, x: [f64; 3], p: [f64; 4]) -> HamiltonianGradient {
        let h = |pos: [f64; 3]| 0.5 * self.metric.contravariant(pos).contract(&p);

        let mut xp = x;
        let mut xm = x;
        xp[0] += self.eps;
        xm[0] -= self.eps;
        let dh_dx = (h(xp) - h(xm)) / (2.0 * self.eps);

        let mut yp = x;
        let mut ym = x;
        yp[1] += self.eps;
        ym[1] -= self.eps;
        let dh_dy = (h(yp) - h(ym)) / (2.0 * self.eps);

        let mut zp = x;
        let mut zm = x;
        zp[2] += self.eps;
        zm[2] -= self.eps;
        let dh_dz = (h(zp) - h(zm)) / (2.0 * self.eps);

        HamiltonianGradient { dh_dx, dh_dy, dh_dz }
    }

    /// Compare the metric's gradient against this audit's numerical one and
    /// return the max relative error.
    pub fn max_relative_error(&self, x: [f64; 3], p: [f64; 4]) -> f64 {
        let analytic = self.metric.hamiltonian_gradient(x, p);
        let numerical = self.numerical_gradient(x, p);

        let rel = |a: f64, n: f64| if n.abs() > 1e-15 { ((a - n) / n).abs() } else { (a - n).abs() };

        rel(analytic.dh_dx, numerical.dh_dx)
            .max(rel(analytic.dh_dy, numerical.dh_dy))
            .max(rel(analytic.dh_dz, numerical.dh_dz))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::Kerr;

    #[test]
    fn analytic_gradient_matches_independent_finite_difference() {
        let bh = Kerr::new(1.0, 0.6);
        let audit = NumericalAudit::new(&bh);
        let err = audit.max_relative_error([9.0, 2.0, 1.0], [-1.0, 0.3, 0.1, 0.2]);
        assert!(err < 1e-4);
    }
}
