use std::f64::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// `2 sqrt(2 ln 2)`, the ratio between the full width at half max and $`\sigma`$
pub const FWHM_FOR_SIGMA: f64 = 2.354_820_045_030_949;

/// How the width enters the exponent of the Gaussian profile.
///
/// Both forms share the normalization prefactor $`\frac{a}{\sigma\sqrt{2\pi}}`$ and
/// so agree exactly at the line center.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ExponentForm {
    /// The normalized Gaussian density
    ///
    /// ```math
    /// y = \frac{a}{\sigma\sqrt{2\pi}}\exp\left({\frac{-(x - \mu)^2}{2\sigma^2}}\right)
    /// ```
    #[default]
    Normalized,
    /// The exponent multiplies by $`\sigma^2`$ instead of dividing by it
    ///
    /// ```math
    /// y = \frac{a}{\sigma\sqrt{2\pi}}\exp\left({\frac{-(x - \mu)^2}{2}\sigma^2}\right)
    /// ```
    ///
    /// Under this form the width parameter behaves like an inverse width
    /// inside the exponent. It reproduces results from fits made with the
    /// formula read with left-to-right operator precedence.
    Legacy,
}

impl ExponentForm {
    /// The exponent for an offset `delta = x - mu` from the line center
    #[inline]
    pub fn exponent(&self, delta: f64, sigma: f64) -> f64 {
        match self {
            Self::Normalized => -0.5 * delta * delta / (sigma * sigma),
            Self::Legacy => -0.5 * delta * delta * (sigma * sigma),
        }
    }

    /// $`\partial E / \partial \mu`$
    #[inline]
    fn exponent_center_derivative(&self, delta: f64, sigma: f64) -> f64 {
        match self {
            Self::Normalized => delta / (sigma * sigma),
            Self::Legacy => delta * sigma * sigma,
        }
    }

    /// $`\partial E / \partial \sigma`$
    #[inline]
    fn exponent_width_derivative(&self, delta: f64, sigma: f64) -> f64 {
        match self {
            Self::Normalized => delta * delta / sigma.powi(3),
            Self::Legacy => -delta * delta * sigma,
        }
    }

    /// Convert a standard deviation measured from the data into this form's
    /// width parameter.
    pub fn width_from_sigma(&self, sigma: f64) -> f64 {
        match self {
            Self::Normalized => sigma,
            Self::Legacy => sigma.recip(),
        }
    }
}

/// A single Gaussian emission line
#[derive(Debug, Default, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GaussianProfile {
    /// The integrated line flux
    pub amplitude: f64,
    /// The line center wavelength
    pub center: f64,
    pub width: f64,
}

impl GaussianProfile {
    pub fn new(amplitude: f64, center: f64, width: f64) -> Self {
        Self {
            amplitude,
            center,
            width,
        }
    }

    /// The profile's height at its center, $`\frac{a}{\sigma\sqrt{2\pi}}`$
    #[inline]
    pub fn peak_height(&self) -> f64 {
        self.amplitude / (self.width * (2.0 * PI).sqrt())
    }

    /// Compute the line flux at `x`
    #[inline]
    pub fn density(&self, x: f64, form: ExponentForm) -> f64 {
        self.peak_height() * form.exponent(x - self.center, self.width).exp()
    }

    /// The partial derivatives of [`GaussianProfile::density`] at `x` with respect
    /// to `(amplitude, center, width)`.
    #[inline]
    pub fn gradient(&self, x: f64, form: ExponentForm) -> (f64, f64, f64) {
        let delta = x - self.center;
        let shape = (self.width * (2.0 * PI).sqrt()).recip() * form.exponent(delta, self.width).exp();
        let y = self.amplitude * shape;

        let d_amplitude = shape;
        let d_center = y * form.exponent_center_derivative(delta, self.width);
        let d_width = y * (form.exponent_width_derivative(delta, self.width) - self.width.recip());
        (d_amplitude, d_center, d_width)
    }
}

/// The normalized Gaussian profile at `x`.
///
/// A zero `sigma` is not rejected and produces non-finite values.
#[inline]
pub fn gauss(x: f64, amplitude: f64, mean: f64, sigma: f64) -> f64 {
    GaussianProfile::new(amplitude, mean, sigma).density(x, ExponentForm::Normalized)
}

/// The Gaussian profile at `x` using [`ExponentForm::Legacy`].
#[inline]
pub fn gauss_legacy(x: f64, amplitude: f64, mean: f64, sigma: f64) -> f64 {
    GaussianProfile::new(amplitude, mean, sigma).density(x, ExponentForm::Legacy)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_peak_value() {
        let expected = 1.0 / (2.0 * PI).sqrt();
        assert_eq!(gauss(5.0, 1.0, 5.0, 1.0), expected);
        assert_eq!(gauss_legacy(5.0, 1.0, 5.0, 1.0), expected);
        assert!((expected - 0.398_942_280_4).abs() < 1e-10);
    }

    #[test]
    fn test_forms_differ_off_center() {
        let normal = gauss(7.0, 3.0, 5.0, 2.0);
        let legacy = gauss_legacy(7.0, 3.0, 5.0, 2.0);
        let prefactor = 3.0 / (2.0 * (2.0 * PI).sqrt());
        assert!((normal - prefactor * (-0.5f64).exp()).abs() < 1e-12);
        assert!((legacy - prefactor * (-8.0f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_zero_width_is_not_finite() {
        assert!(!gauss(1.0, 1.0, 0.0, 0.0).is_finite());
    }

    #[test]
    fn test_gradient_matches_finite_difference() {
        for form in [ExponentForm::Normalized, ExponentForm::Legacy] {
            let profile = GaussianProfile::new(12.0, 6563.0, 1.7);
            let x = 6564.1;
            let h = 1e-6;
            let (da, dc, dw) = profile.gradient(x, form);

            let num = |p: GaussianProfile, q: GaussianProfile| {
                (p.density(x, form) - q.density(x, form)) / (2.0 * h)
            };
            let mut hi = profile;
            let mut lo = profile;
            hi.amplitude += h;
            lo.amplitude -= h;
            assert!((da - num(hi, lo)).abs() < 1e-6, "{form:?} amplitude");

            let mut hi = profile;
            let mut lo = profile;
            hi.center += h;
            lo.center -= h;
            assert!((dc - num(hi, lo)).abs() < 1e-5, "{form:?} center");

            let mut hi = profile;
            let mut lo = profile;
            hi.width += h;
            lo.width -= h;
            assert!((dw - num(hi, lo)).abs() < 1e-5, "{form:?} width");
        }
    }
}
