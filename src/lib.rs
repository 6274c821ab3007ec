//! `linefit` fits a pair of Gaussian emission lines sharing a single width on top of
//! a flat continuum, and reports the best fitting parameters with their 1-sigma
//! uncertainties.
//!
//! The model and its optimizer live in [`crate::line_fit`]. Fitted line centers can
//! be turned into redshifts with [`crate::redshift`], summarized as text with
//! [`crate::report`], and drawn with `crate::plot` when the `plot` feature is enabled.
//!
//! # Usage
//! ```
//! use linefit::{fit_doublet, gridspace, DoubletModel, DoubletParams};
//! use linefit::redshift::{redshift, H_ALPHA};
//!
//! let truth = DoubletParams::new(150.0, 55.0, 6565.0, 6585.6, 2.2, 10.0);
//! let wavelength = gridspace(6530.0, 6620.0, 0.5);
//! let flux = DoubletModel::default().predict(&wavelength, &truth);
//!
//! let guess = DoubletParams::new(120.0, 40.0, 6564.0, 6586.0, 2.5, 9.0);
//! let fit = fit_doublet(&wavelength, &flux, guess).unwrap();
//! println!("{fit}");
//!
//! let z = redshift(fit.params.center1, H_ALPHA);
//! assert!((z - (6565.0 - H_ALPHA) / H_ALPHA).abs() < 1e-6);
//! ```
//!
//! ## Features
//! - `parallelism` spreads [`fit_batch`] over the rayon thread pool.
//! - `plot` enables SVG rendering of a fit through `plotters`.
//! - `serde` derives `Serialize` and `Deserialize` for the parameter and result types.
pub mod arrayops;
pub mod line_fit;
pub mod redshift;
pub mod report;
pub mod synthetic;

#[cfg(feature = "plot")]
pub mod plot;

pub mod prelude;

pub use crate::arrayops::gridspace;
pub use crate::line_fit::{
    fit_batch, fit_doublet, fit_doublet_with, DoubletFit, DoubletFitter, DoubletModel,
    DoubletParams, ExponentForm, FitConfig, LineFitError, Spectrum,
};
pub use crate::report::FitReport;
