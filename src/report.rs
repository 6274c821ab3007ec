//! Plain text summaries of a [`DoubletFit`].
use std::fmt;

use crate::line_fit::DoubletFit;

const RULE: &str = "=========================================";
const THIN_RULE: &str = "-----------------------------------------";

/// Formats the best fitting parameters of a [`DoubletFit`] with their 1-sigma errors
#[derive(Debug, Clone, Copy)]
pub struct FitReport<'a> {
    pub fit: &'a DoubletFit,
    /// Digits after the decimal point
    pub precision: usize,
}

impl<'a> FitReport<'a> {
    pub fn new(fit: &'a DoubletFit) -> Self {
        Self { fit, precision: 6 }
    }

    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// `(label, error label, value, error)` rows in parameter vector order
    pub fn rows(&self) -> [(&'static str, &'static str, f64, f64); 6] {
        let p = &self.fit.params;
        let e = self.fit.standard_errors();
        [
            ("Line 1 amplitude", "amplitude error", p.amp1, e.amp1),
            ("Line 2 amplitude", "amplitude error", p.amp2, e.amp2),
            ("Line 1 wavelength", "wavelength error", p.center1, e.center1),
            ("Line 2 wavelength", "wavelength error", p.center2, e.center2),
            ("Line width", "width error", p.width, e.width),
            ("Continuum level", "continuum error", p.continuum, e.continuum),
        ]
    }
}

impl fmt::Display for FitReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prec = self.precision;
        writeln!(f, "{RULE}")?;
        writeln!(f, "Best fitting parameters and 1 std errors")?;
        writeln!(f, "{THIN_RULE}")?;
        for (label, error_label, value, error) in self.rows() {
            writeln!(f, "{label}: {value:.prec$} {error_label}: {error:.prec$}")?;
        }
        writeln!(f, "{THIN_RULE}")?;
        writeln!(
            f,
            "SSE: {:.prec$e} reduced chi-squared: {:.prec$e} iterations: {}",
            self.fit.sse,
            self.fit.reduced_chi_squared(),
            self.fit.iterations
        )?;
        write!(f, "{RULE}")
    }
}

impl fmt::Display for DoubletFit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = match f.precision() {
            Some(prec) => FitReport::new(self).precision(prec),
            None => FitReport::new(self),
        };
        fmt::Display::fmt(&report, f)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::line_fit::fit_doublet;
    use crate::synthetic::halpha_nii;

    #[test]
    fn test_report_lines() {
        let (truth, spectrum) = halpha_nii(0.005, 0.2, 11);
        let fit = fit_doublet(&spectrum.wavelength, &spectrum.flux, truth).unwrap();
        let text = FitReport::new(&fit).precision(3).to_string();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 12, "{text}");
        assert_eq!(lines[0], RULE);
        assert!(lines[3].starts_with("Line 1 amplitude: "));
        assert!(lines[5].starts_with(&format!(
            "Line 1 wavelength: {:.3} wavelength error: ",
            fit.params.center1
        )));
        assert!(lines[8].starts_with("Continuum level: "));
        assert!(lines[10].contains(&format!("iterations: {}", fit.iterations)));

        assert_eq!(format!("{fit:.3}"), text);
        assert_eq!(format!("{fit}"), FitReport::new(&fit).to_string());
    }
}
