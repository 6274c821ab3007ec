pub use crate::line_fit::{
    DoubletFit, DoubletFitter, DoubletModel, DoubletParams, ExponentForm, FitConfig,
    LineFitError, Spectrum,
};
pub use crate::redshift::{redshift, redshift_error, velocity};
pub use crate::report::FitReport;
