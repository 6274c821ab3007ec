use nalgebra::{DMatrix, DVector, Matrix6, Vector6};
use thiserror::Error;

#[cfg(feature = "parallelism")]
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::redshift::{redshift, redshift_error};

use super::{DoubletModel, DoubletParams, FitConfig, Spectrum, N_PARAMS};

const MIN_DAMPING: f64 = 1e-15;
const MAX_DAMPING: f64 = 1e32;
const MIN_DIAGONAL: f64 = 1e-12;

/// All the ways a line fit can fail
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LineFitError {
    #[error("The wavelength ({wavelength}) and flux ({flux}) arrays do not match in length")]
    LengthMismatch { wavelength: usize, flux: usize },
    #[error("Fitting {parameters} parameters requires at least {parameters} points, found {points}")]
    InsufficientData { points: usize, parameters: usize },
    #[error("The initial guess or the model residuals at it are not finite")]
    NonFiniteResidual,
    #[error("Optimal parameters not found after {iterations} iterations, SSE = {sse}")]
    NotConverged { iterations: usize, sse: f64 },
    #[error("The Jacobian has rank {rank} but {parameters} parameters are being fit, they are not independently constrained")]
    SingularJacobian { rank: usize, parameters: usize },
}

/// The best fitting parameters of a [`DoubletModel`] and their covariance
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DoubletFit {
    pub params: DoubletParams,
    /// The estimated covariance of `params`, in [`DoubletParams::to_vector`] order.
    ///
    /// Filled with `+inf` when there are no residual degrees of freedom.
    pub covariance: Matrix6<f64>,
    /// The sum of squared residuals at `params`
    pub sse: f64,
    /// The number of Jacobian evaluations used
    pub iterations: usize,
    /// The number of points fit
    pub points: usize,
    pub model: DoubletModel,
}

impl DoubletFit {
    pub fn degrees_of_freedom(&self) -> usize {
        self.points.saturating_sub(N_PARAMS)
    }

    /// The 1-sigma uncertainty of each parameter, the square root of the covariance diagonal
    pub fn standard_errors(&self) -> DoubletParams {
        let diag = self.covariance.diagonal();
        DoubletParams::from_vector(&diag.map(f64::sqrt))
    }

    /// The parameter correlation matrix
    pub fn correlation(&self) -> Matrix6<f64> {
        let errors = self.standard_errors().to_vector();
        Matrix6::from_fn(|i, j| self.covariance[(i, j)] / (errors[i] * errors[j]))
    }

    /// The sum of squared residuals per degree of freedom, NaN without any
    pub fn reduced_chi_squared(&self) -> f64 {
        match self.degrees_of_freedom() {
            0 => f64::NAN,
            dof => self.sse / dof as f64,
        }
    }

    pub fn rmse(&self) -> f64 {
        (self.sse / self.points as f64).sqrt()
    }

    /// Evaluate the fitted model over `wavelength`
    pub fn predict(&self, wavelength: &[f64]) -> Vec<f64> {
        self.model.predict(wavelength, &self.params)
    }

    /// Observed minus fitted flux
    pub fn residuals(&self, data: &Spectrum) -> Vec<f64> {
        data.iter()
            .map(|(x, y)| y - self.model.evaluate(x, &self.params))
            .collect()
    }

    /// Compute 1 minus the ratio of the model's squared error to a straight line's
    /// squared error on `data`, clamped to $`[0, 1]`$.
    ///
    /// Approaches 1 when the two lines explain the data much better than a sloped
    /// continuum alone would.
    pub fn score(&self, data: &Spectrum) -> f64 {
        let linear_resid = data.linear_residuals();
        let shape_resid: f64 = self.residuals(data).iter().map(|r| r * r).sum();
        let line_test = shape_resid / if linear_resid > 0.0 { linear_resid } else { 1.0 };
        (1.0 - line_test.max(1e-5)).clamp(0.0, 1.0)
    }

    /// The redshift and its uncertainty for each fitted line given their rest wavelengths
    pub fn redshifts(&self, rest1: f64, rest2: f64) -> [(f64, f64); 2] {
        let errors = self.standard_errors();
        [
            (
                redshift(self.params.center1, rest1),
                redshift_error(errors.center1, rest1),
            ),
            (
                redshift(self.params.center2, rest2),
                redshift_error(errors.center2, rest2),
            ),
        ]
    }
}

/// Fit a [`DoubletModel`] to a [`Spectrum`] by Levenberg-Marquardt least squares
#[derive(Debug, Clone)]
pub struct DoubletFitter<'a, 'b> {
    pub data: Spectrum<'a, 'b>,
    pub model: DoubletModel,
    pub fit: Option<DoubletFit>,
}

impl<'a, 'b> DoubletFitter<'a, 'b> {
    pub fn new(data: Spectrum<'a, 'b>, model: DoubletModel) -> Self {
        Self {
            data,
            model,
            fit: None,
        }
    }

    /// Fit starting from `initial` using the default [`FitConfig`]
    pub fn fit(&mut self, initial: DoubletParams) -> Result<&DoubletFit, LineFitError> {
        self.fit_with(initial, FitConfig::default())
    }

    /// Fit starting from the model's own guess for the enclosed data
    pub fn fit_guess(&mut self, config: FitConfig) -> Result<&DoubletFit, LineFitError> {
        let initial = self.model.guess(&self.data);
        self.fit_with(initial, config)
    }

    /// Fit starting from `initial`.
    ///
    /// The result is kept in [`DoubletFitter::fit`], replacing any previous one. A failed
    /// fit clears it.
    pub fn fit_with(
        &mut self,
        initial: DoubletParams,
        config: FitConfig,
    ) -> Result<&DoubletFit, LineFitError> {
        self.fit = None;
        let fit = self.optimize(initial, &config)?;
        Ok(self.fit.insert(fit))
    }

    fn residuals_at(&self, params: &DoubletParams) -> DVector<f64> {
        DVector::from_iterator(
            self.data.len(),
            self.data
                .iter()
                .map(|(x, y)| y - self.model.evaluate(x, params)),
        )
    }

    /// The largest cosine of the angle between the residuals and any Jacobian column
    fn gradient_cosine(jac: &DMatrix<f64>, jtr: &DVector<f64>, sse: f64) -> f64 {
        let residual_norm = sse.sqrt();
        jac.column_iter()
            .zip(jtr.iter())
            .map(|(col, g)| {
                let col_norm = col.norm();
                if col_norm == 0.0 || residual_norm == 0.0 {
                    0.0
                } else {
                    (g / (col_norm * residual_norm)).abs()
                }
            })
            .fold(0.0, f64::max)
    }

    fn optimize(
        &self,
        initial: DoubletParams,
        config: &FitConfig,
    ) -> Result<DoubletFit, LineFitError> {
        let n = self.data.len();
        if n < N_PARAMS {
            return Err(LineFitError::InsufficientData {
                points: n,
                parameters: N_PARAMS,
            });
        }
        log::info!("Performing a least squares fit of {N_PARAMS} parameters to {n} points");

        if !initial.is_finite() {
            return Err(LineFitError::NonFiniteResidual);
        }
        let mut params: Vector6<f64> = initial.to_vector();
        let mut residuals = self.residuals_at(&initial);
        let mut sse = residuals.norm_squared();
        if !sse.is_finite() {
            return Err(LineFitError::NonFiniteResidual);
        }

        let mut damping = config.initial_damping;
        let mut iterations = 0;
        let mut converged = false;

        while !converged {
            if iterations >= config.max_iter {
                log::debug!("Exhausted {iterations} iterations at SSE = {sse:0.6e}");
                return Err(LineFitError::NotConverged { iterations, sse });
            }
            iterations += 1;

            let current = DoubletParams::from_vector(&params);
            let jac = self.model.jacobian(&self.data.wavelength, &current);
            let jtj = jac.tr_mul(&jac);
            let jtr = jac.tr_mul(&residuals);

            if sse == 0.0 || Self::gradient_cosine(&jac, &jtr, sse) <= config.gtol {
                log::trace!("{iterations}: Gradient orthogonal to residuals");
                break;
            }

            loop {
                let mut damped = jtj.clone();
                for i in 0..N_PARAMS {
                    damped[(i, i)] += damping * jtj[(i, i)].max(MIN_DIAGONAL);
                }

                let step = match damped.cholesky() {
                    Some(decomp) => Vector6::from_iterator(decomp.solve(&jtr).iter().copied()),
                    None => {
                        damping *= config.damping_factor;
                        log::debug!("{iterations}: Damped system not positive definite, damping = {damping:0.3e}");
                        if damping > MAX_DAMPING {
                            return Err(LineFitError::NotConverged { iterations, sse });
                        }
                        continue;
                    }
                };

                let trial = params + step;
                let trial_residuals = self.residuals_at(&DoubletParams::from_vector(&trial));
                let trial_sse = trial_residuals.norm_squared();
                let step_converged =
                    step.norm() <= config.xtol * (params.norm() + config.xtol);

                if trial_sse.is_finite() && trial_sse < sse {
                    let reduction = (sse - trial_sse) / sse;
                    params = trial;
                    residuals = trial_residuals;
                    sse = trial_sse;
                    damping = (damping / config.damping_factor).max(MIN_DAMPING);
                    log::trace!(
                        "{iterations}: SSE = {sse:0.6e}: Reduction = {reduction:0.3e}: Damping = {damping:0.3e}"
                    );
                    converged = reduction <= config.ftol || step_converged;
                    break;
                }

                if step_converged {
                    log::trace!("{iterations}: Step below tolerance without improvement");
                    converged = true;
                    break;
                }

                damping *= config.damping_factor;
                if damping > MAX_DAMPING {
                    return Err(LineFitError::NotConverged { iterations, sse });
                }
            }
        }

        let best = DoubletParams::from_vector(&params);
        let jac = self.model.jacobian(&self.data.wavelength, &best);
        let covariance = covariance_from_jacobian(&jac, sse)?;

        log::info!("Converged after {iterations} iterations, SSE = {sse:0.6e}: {best}");
        Ok(DoubletFit {
            params: best,
            covariance,
            sse,
            iterations,
            points: n,
            model: self.model,
        })
    }

    /// Compute the fitted model's residuals over the enclosed data
    pub fn residuals(&self) -> Option<Vec<f64>> {
        self.fit.as_ref().map(|fit| fit.residuals(&self.data))
    }

    /// Create a synthetic spectrum on the observed wavelength axis using the model
    /// predicted flux
    pub fn predicted(&self) -> Option<Spectrum<'_, '_>> {
        let fit = self.fit.as_ref()?;
        let mut dup = self.data.borrow();
        dup.flux = fit.predict(&self.data.wavelength).into();
        Some(dup)
    }

    /// See [`DoubletFit::score`]
    pub fn score(&self) -> Option<f64> {
        self.fit.as_ref().map(|fit| fit.score(&self.data))
    }
}

/// Estimate the parameter covariance $`\hat{s}^2 (J^TJ)^{-1}`$ from the singular value
/// decomposition of the Jacobian at the optimum, where $`\hat{s}^2`$ is the residual
/// variance.
pub fn covariance_from_jacobian(
    jac: &DMatrix<f64>,
    sse: f64,
) -> Result<Matrix6<f64>, LineFitError> {
    let n = jac.nrows();
    let svd = jac.clone().svd(false, true);
    let singular_values = &svd.singular_values;
    let threshold = f64::EPSILON * (n.max(N_PARAMS) as f64) * singular_values.max();
    let rank = singular_values.iter().filter(|s| **s > threshold).count();
    let v_t = match svd.v_t {
        Some(v_t) if rank == N_PARAMS => v_t,
        _ => {
            return Err(LineFitError::SingularJacobian {
                rank,
                parameters: N_PARAMS,
            })
        }
    };

    let mut covariance = Matrix6::from_fn(|i, j| {
        singular_values
            .iter()
            .enumerate()
            .map(|(k, s)| v_t[(k, i)] * v_t[(k, j)] / (s * s))
            .sum::<f64>()
    });

    let dof = n.saturating_sub(N_PARAMS);
    if dof > 0 {
        covariance *= sse / dof as f64;
    } else {
        log::warn!("No residual degrees of freedom, the covariance cannot be estimated");
        covariance.fill(f64::INFINITY);
    }
    Ok(covariance)
}

/// Fit `wavelength` and `flux` starting from `initial` with the normalized
/// Gaussian model and default [`FitConfig`].
///
/// Returns the best fitting parameters and their covariance. Nothing is printed or drawn,
/// see [`crate::report`] and `crate::plot` for presentation.
pub fn fit_doublet(
    wavelength: &[f64],
    flux: &[f64],
    initial: DoubletParams,
) -> Result<DoubletFit, LineFitError> {
    fit_doublet_with(
        wavelength,
        flux,
        initial,
        DoubletModel::default(),
        FitConfig::default(),
    )
}

/// See [`fit_doublet`]
pub fn fit_doublet_with(
    wavelength: &[f64],
    flux: &[f64],
    initial: DoubletParams,
    model: DoubletModel,
    config: FitConfig,
) -> Result<DoubletFit, LineFitError> {
    let data = Spectrum::from_slices(wavelength, flux)?;
    DoubletFitter::new(data, model)
        .fit_with(initial, config)
        .cloned()
}

fn fit_job(
    job: &(Spectrum<'_, '_>, DoubletParams),
    model: DoubletModel,
    config: FitConfig,
) -> Result<DoubletFit, LineFitError> {
    let (data, initial) = job;
    DoubletFitter::new(data.borrow(), model)
        .fit_with(*initial, config)
        .cloned()
}

/// Fit many independent spectra, each from its own initial guess.
///
/// Results are returned in the same order as `jobs`. With the `parallelism` feature
/// enabled the jobs are spread over the rayon thread pool.
pub fn fit_batch(
    jobs: &[(Spectrum<'_, '_>, DoubletParams)],
    model: DoubletModel,
    config: FitConfig,
) -> Vec<Result<DoubletFit, LineFitError>> {
    cfg_if::cfg_if! {
        if #[cfg(feature = "parallelism")] {
            return jobs.par_iter().map(|job| fit_job(job, model, config)).collect();
        } else {
            return jobs.iter().map(|job| fit_job(job, model, config)).collect();
        }
    }
}
