use std::f64::consts::PI;
use std::fmt;

use nalgebra::{DMatrix, Vector6};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{ExponentForm, GaussianProfile, Spectrum, FWHM_FOR_SIGMA};

/// The number of free parameters in [`DoubletParams`]
pub const N_PARAMS: usize = 6;

/// The parameter vector of the two line model.
///
/// Both lines share a single `width`. The field order is the order used by
/// [`DoubletParams::to_vector`], the Jacobian columns and the covariance matrix.
#[derive(Debug, Default, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DoubletParams {
    pub amp1: f64,
    pub amp2: f64,
    pub center1: f64,
    pub center2: f64,
    pub width: f64,
    pub continuum: f64,
}

impl DoubletParams {
    /// Display names in vector order
    pub const NAMES: [&'static str; N_PARAMS] = [
        "amp1",
        "amp2",
        "center1",
        "center2",
        "width",
        "continuum",
    ];

    pub fn new(
        amp1: f64,
        amp2: f64,
        center1: f64,
        center2: f64,
        width: f64,
        continuum: f64,
    ) -> Self {
        Self {
            amp1,
            amp2,
            center1,
            center2,
            width,
            continuum,
        }
    }

    pub fn to_vector(&self) -> Vector6<f64> {
        Vector6::new(
            self.amp1,
            self.amp2,
            self.center1,
            self.center2,
            self.width,
            self.continuum,
        )
    }

    pub fn from_vector(values: &Vector6<f64>) -> Self {
        Self::new(
            values[0], values[1], values[2], values[3], values[4], values[5],
        )
    }

    pub fn as_array(&self) -> [f64; N_PARAMS] {
        [
            self.amp1,
            self.amp2,
            self.center1,
            self.center2,
            self.width,
            self.continuum,
        ]
    }

    /// The first line as a standalone profile
    pub fn line1(&self) -> GaussianProfile {
        GaussianProfile::new(self.amp1, self.center1, self.width)
    }

    /// The second line as a standalone profile
    pub fn line2(&self) -> GaussianProfile {
        GaussianProfile::new(self.amp2, self.center2, self.width)
    }

    pub fn is_finite(&self) -> bool {
        self.as_array().iter().all(|v| v.is_finite())
    }
}

impl From<[f64; N_PARAMS]> for DoubletParams {
    fn from(v: [f64; N_PARAMS]) -> Self {
        Self::new(v[0], v[1], v[2], v[3], v[4], v[5])
    }
}

impl From<DoubletParams> for Vector6<f64> {
    fn from(value: DoubletParams) -> Self {
        value.to_vector()
    }
}

impl fmt::Display for DoubletParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DoubletParams({}, {}, {}, {}, {}, {})",
            self.amp1, self.amp2, self.center1, self.center2, self.width, self.continuum
        )
    }
}

/// Two Gaussian emission lines with a shared width on top of a flat continuum
///
/// ```math
/// F(x) = g(x; a_1, \mu_1, \sigma) + g(x; a_2, \mu_2, \sigma) + c
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DoubletModel {
    pub form: ExponentForm,
}

impl DoubletModel {
    pub fn new(form: ExponentForm) -> Self {
        Self { form }
    }

    /// Compute the model flux at `x`
    #[inline]
    pub fn evaluate(&self, x: f64, params: &DoubletParams) -> f64 {
        params.line1().density(x, self.form) + params.line2().density(x, self.form) + params.continuum
    }

    /// Given a wavelength sequence, produce the complementary sequence of model fluxes
    pub fn predict(&self, wavelength: &[f64], params: &DoubletParams) -> Vec<f64> {
        self.predict_iter(wavelength.iter().copied(), params).collect()
    }

    /// Given a wavelength iterator, produce the complementary iterator of model fluxes
    pub fn predict_iter<'a, I>(
        &'a self,
        wavelength: I,
        params: &'a DoubletParams,
    ) -> impl Iterator<Item = f64> + 'a
    where
        I: IntoIterator<Item = f64>,
        I::IntoIter: 'a,
    {
        wavelength
            .into_iter()
            .map(move |x| self.evaluate(x, params))
    }

    /// The partial derivatives of the model at `x`, in [`DoubletParams::to_vector`] order
    #[inline]
    pub fn jacobian_row(&self, x: f64, params: &DoubletParams) -> [f64; N_PARAMS] {
        let (d_amp1, d_center1, d_width1) = params.line1().gradient(x, self.form);
        let (d_amp2, d_center2, d_width2) = params.line2().gradient(x, self.form);
        [
            d_amp1,
            d_amp2,
            d_center1,
            d_center2,
            d_width1 + d_width2,
            1.0,
        ]
    }

    /// The `n x 6` Jacobian of the model over `wavelength`
    pub fn jacobian(&self, wavelength: &[f64], params: &DoubletParams) -> DMatrix<f64> {
        let mut jac = DMatrix::zeros(wavelength.len(), N_PARAMS);
        for (i, x) in wavelength.iter().copied().enumerate() {
            for (j, d) in self.jacobian_row(x, params).into_iter().enumerate() {
                jac[(i, j)] = d;
            }
        }
        jac
    }

    /// Given observed data, compute some initial parameters.
    ///
    /// The continuum is the median flux, the centers are the two tallest local maxima
    /// at least one full width at half max apart in increasing wavelength order, and the
    /// width comes from the full width at half max of the tallest line. Amplitudes are chosen so each line reproduces its observed height
    /// above the continuum.
    pub fn guess(&self, data: &Spectrum) -> DoubletParams {
        if data.is_empty() {
            return DoubletParams::new(1.0, 1.0, 0.0, 1.0, 1.0, 0.0);
        }
        let continuum = data.median_flux();

        let mut peaks = data.peak_indices(Some(continuum));
        peaks.sort_by(|a, b| data.flux[*b].total_cmp(&data.flux[*a]));
        let primary = peaks
            .first()
            .copied()
            .or_else(|| data.argmax())
            .unwrap_or_default();

        let fallback_sigma = (data.average_spacing() * 2.0).max(f64::EPSILON);
        let sigma = data
            .full_width_at_half_max(primary, continuum)
            .map(|fwhm| fwhm / FWHM_FOR_SIGMA)
            .unwrap_or(fallback_sigma);
        let width = self.form.width_from_sigma(sigma);

        let min_separation = FWHM_FOR_SIGMA * sigma;
        let secondary = peaks
            .iter()
            .copied()
            .find(|i| (data.wavelength[*i] - data.wavelength[primary]).abs() > min_separation);
        let (c1, h1) = (data.wavelength[primary], data.flux[primary] - continuum);
        let (c2, h2) = match secondary {
            Some(i) => (data.wavelength[i], data.flux[i] - continuum),
            None => (c1 + 3.0 * FWHM_FOR_SIGMA * sigma, h1 / 2.0),
        };

        let to_amplitude = |height: f64| height * width * (2.0 * PI).sqrt();
        let (first, second) = if c1 <= c2 {
            ((c1, h1), (c2, h2))
        } else {
            ((c2, h2), (c1, h1))
        };

        let params = DoubletParams::new(
            to_amplitude(first.1),
            to_amplitude(second.1),
            first.0,
            second.0,
            width,
            continuum,
        );
        log::debug!("Initial guess {params}");
        params
    }
}

/// The two line model under the normalized Gaussian form.
#[inline]
pub fn two_line_model(
    x: f64,
    amp1: f64,
    amp2: f64,
    center1: f64,
    center2: f64,
    width: f64,
    continuum: f64,
) -> f64 {
    DoubletModel::default().evaluate(
        x,
        &DoubletParams::new(amp1, amp2, center1, center2, width, continuum),
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::gridspace;
    use crate::line_fit::gauss;

    #[test]
    fn test_sum_of_components() {
        let observed = two_line_model(0.0, 1.0, 2.0, 0.0, 10.0, 1.0, 0.5);
        let expected = gauss(0.0, 1.0, 0.0, 1.0) + gauss(0.0, 2.0, 10.0, 1.0) + 0.5;
        assert_eq!(observed, expected);
    }

    #[test]
    fn test_idempotent() {
        let model = DoubletModel::new(ExponentForm::Legacy);
        let params = DoubletParams::new(3.0, 1.5, 4.0, 6.0, 0.8, 0.2);
        let xs = gridspace(0.0, 10.0, 0.5);
        assert_eq!(model.predict(&xs, &params), model.predict(&xs, &params));
        assert_eq!(
            model.predict(&xs, &params),
            model.predict_iter(xs.iter().copied(), &params).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_vector_order() {
        let params = DoubletParams::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        let v = params.to_vector();
        assert_eq!(v.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(DoubletParams::from_vector(&v), params);
        assert_eq!(DoubletParams::from(params.as_array()), params);
    }

    #[test]
    fn test_jacobian_matches_finite_difference() {
        let params = DoubletParams::new(120.0, 40.0, 6563.0, 6583.0, 2.5, 5.0);
        let xs = gridspace(6550.0, 6595.0, 1.5);
        for form in [ExponentForm::Normalized, ExponentForm::Legacy] {
            let model = DoubletModel::new(form);
            let params = DoubletParams {
                width: form.width_from_sigma(params.width),
                ..params
            };
            let jac = model.jacobian(&xs, &params);
            assert_eq!(jac.shape(), (xs.len(), N_PARAMS));

            let base = params.to_vector();
            for j in 0..N_PARAMS {
                let h = 1e-6 * base[j].abs().max(1.0);
                let mut hi = base;
                let mut lo = base;
                hi[j] += h;
                lo[j] -= h;
                let hi = DoubletParams::from_vector(&hi);
                let lo = DoubletParams::from_vector(&lo);
                for (i, x) in xs.iter().copied().enumerate() {
                    let numeric = (model.evaluate(x, &hi) - model.evaluate(x, &lo)) / (2.0 * h);
                    let analytic = jac[(i, j)];
                    assert!(
                        (numeric - analytic).abs() <= 1e-4 * analytic.abs().max(1.0),
                        "{form:?} column {} at {x}: {numeric} != {analytic}",
                        DoubletParams::NAMES[j]
                    );
                }
            }
        }
    }

    #[test]
    fn test_guess() {
        let truth = DoubletParams::new(120.0, 40.0, 6562.8, 6583.4, 2.0, 5.0);
        let model = DoubletModel::default();
        let wavelength = gridspace(6540.0, 6610.0, 0.1);
        let flux = model.predict(&wavelength, &truth);
        let data = Spectrum::from_vecs(wavelength, flux).unwrap();

        let guess = model.guess(&data);
        assert!((guess.center1 - truth.center1).abs() < 0.2, "{guess}");
        assert!((guess.center2 - truth.center2).abs() < 0.2, "{guess}");
        assert!((guess.width - truth.width).abs() < 0.2, "{guess}");
        assert!((guess.continuum - truth.continuum).abs() < 0.1, "{guess}");
        assert!((guess.amp1 / truth.amp1 - 1.0).abs() < 0.15, "{guess}");
        assert!((guess.amp2 / truth.amp2 - 1.0).abs() < 0.15, "{guess}");
    }
}
