//! Fitting two Gaussian emission lines with a shared width on a flat continuum.
//!
//! The model is
//!
//! ```math
//! F(x) = \frac{a_1}{\sigma\sqrt{2\pi}}e^{E(x - \mu_1, \sigma)} + \frac{a_2}{\sigma\sqrt{2\pi}}e^{E(x - \mu_2, \sigma)} + c
//! ```
//!
//! where the exponent $`E`$ is selected by [`ExponentForm`]. The six parameters are
//! held in [`DoubletParams`] and evaluated by [`DoubletModel`].
//!
//! # Model Fit Evaluation
//!
//! Parameters are estimated by Levenberg-Marquardt least squares using the analytic
//! Jacobian of the model, see [`DoubletFitter`]. The parameter covariance is
//! $`\hat{s}^2 (J^TJ)^{-1}`$ at the optimum, with $`\hat{s}^2`$ the residual sum of squares
//! per degree of freedom, and the 1-sigma errors are the square roots of its diagonal.
//!
//! The optimizer only searches locally. A poor initial guess can fail to converge or
//! settle in a different minimum; [`DoubletModel::guess`] gives a reasonable start for
//! clean spectra.
//!
//! # Example
//!
//! ```rust
//! use linefit::line_fit::{fit_doublet, DoubletModel, DoubletParams};
//! use linefit::gridspace;
//!
//! let truth = DoubletParams::new(120.0, 40.0, 6563.0, 6583.5, 2.0, 5.0);
//! let wavelength = gridspace(6540.0, 6610.0, 0.5);
//! let flux = DoubletModel::default().predict(&wavelength, &truth);
//!
//! let fit = fit_doublet(&wavelength, &flux, truth).unwrap();
//! let errors = fit.standard_errors();
//! assert!((fit.params.center1 - 6563.0).abs() < 1e-9);
//! assert!(errors.center1 < 1e-9);
//! ```

mod data;
mod doublet;
mod fitter;
mod gaussian;
mod utils;

pub use data::Spectrum;
pub use doublet::{two_line_model, DoubletModel, DoubletParams, N_PARAMS};
pub use fitter::{
    covariance_from_jacobian, fit_batch, fit_doublet, fit_doublet_with, DoubletFit,
    DoubletFitter, LineFitError,
};
pub use gaussian::{gauss, gauss_legacy, ExponentForm, GaussianProfile, FWHM_FOR_SIGMA};
pub use utils::FitConfig;
