#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Hyperparameters for the Levenberg-Marquardt line fit
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FitConfig {
    /// The maximum number of Jacobian evaluations to attempt before giving up
    pub max_iter: usize,
    /// Relative reduction of the sum of squared residuals below which an accepted step
    /// is considered converged
    pub ftol: f64,
    /// Relative step size below which the parameters are considered converged
    pub xtol: f64,
    /// Largest cosine between the residual vector and any Jacobian column at which
    /// the parameters are considered converged
    pub gtol: f64,
    /// The starting damping term, relative to the diagonal of $`J^TJ`$
    pub initial_damping: f64,
    /// The multiplier applied to the damping term when a step is rejected, and
    /// divided out when one is accepted
    pub damping_factor: f64,
}

impl FitConfig {
    /// The maximum number of Jacobian evaluations to attempt before giving up
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn ftol(mut self, ftol: f64) -> Self {
        self.ftol = ftol;
        self
    }

    pub fn xtol(mut self, xtol: f64) -> Self {
        self.xtol = xtol;
        self
    }

    pub fn gtol(mut self, gtol: f64) -> Self {
        self.gtol = gtol;
        self
    }

    /// The starting damping term, relative to the diagonal of $`J^TJ`$
    pub fn initial_damping(mut self, initial_damping: f64) -> Self {
        self.initial_damping = initial_damping;
        self
    }

    pub fn damping_factor(mut self, damping_factor: f64) -> Self {
        self.damping_factor = damping_factor;
        self
    }
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_iter: 1_000,
            ftol: 1.49012e-8,
            xtol: 1.49012e-8,
            gtol: 1.49012e-8,
            initial_damping: 1e-3,
            damping_factor: 10.0,
        }
    }
}
