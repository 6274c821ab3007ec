use std::borrow::Cow;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::arrayops::{argmax, median, minmax};

use super::LineFitError;

/// Represent an array pair for flux-over-wavelength data
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Spectrum<'a, 'b> {
    /// The wavelength axis of the spectrum, assumed to be increasing
    pub wavelength: Cow<'a, [f64]>,
    /// The paired flux to fit against
    pub flux: Cow<'b, [f64]>,
}

impl<'a, 'b> Spectrum<'a, 'b> {
    pub fn new(
        wavelength: Cow<'a, [f64]>,
        flux: Cow<'b, [f64]>,
    ) -> Result<Self, LineFitError> {
        if wavelength.len() != flux.len() {
            return Err(LineFitError::LengthMismatch {
                wavelength: wavelength.len(),
                flux: flux.len(),
            });
        }
        Ok(Self { wavelength, flux })
    }

    /// Borrow both arrays without copying them
    pub fn from_slices(wavelength: &'a [f64], flux: &'b [f64]) -> Result<Self, LineFitError> {
        Self::new(Cow::Borrowed(wavelength), Cow::Borrowed(flux))
    }

    /// Take ownership of both arrays
    pub fn from_vecs(wavelength: Vec<f64>, flux: Vec<f64>) -> Result<Self, LineFitError> {
        Self::new(Cow::Owned(wavelength), Cow::Owned(flux))
    }

    /// Create a new [`Spectrum`] that borrows this one's arrays
    pub fn borrow(&self) -> Spectrum<'_, '_> {
        Spectrum {
            wavelength: Cow::Borrowed(self.wavelength.as_ref()),
            flux: Cow::Borrowed(self.flux.as_ref()),
        }
    }

    pub fn len(&self) -> usize {
        self.wavelength.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelength.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.wavelength
            .iter()
            .copied()
            .zip(self.flux.iter().copied())
    }

    pub fn get(&self, index: usize) -> Option<(f64, f64)> {
        Some((*self.wavelength.get(index)?, *self.flux.get(index)?))
    }

    /// The wavelength span covered by the spectrum
    pub fn wavelength_range(&self) -> (f64, f64) {
        minmax(&self.wavelength)
    }

    pub fn average_spacing(&self) -> f64 {
        if self.len() < 2 {
            return 0.0;
        }
        let (lo, hi) = self.wavelength_range();
        (hi - lo) / (self.len() - 1) as f64
    }

    /// The index of the most intense point
    pub fn argmax(&self) -> Option<usize> {
        argmax(&self.flux)
    }

    /// The largest observed flux, or zero for an empty spectrum
    pub fn max_flux(&self) -> f64 {
        self.argmax().map(|i| self.flux[i]).unwrap_or_default()
    }

    /// The median flux, a simple continuum estimate
    pub fn median_flux(&self) -> f64 {
        median(&self.flux).unwrap_or_default()
    }

    /// Find the indices of local maxima, optionally above some `min_height` threshold.
    pub fn peak_indices(&self, min_height: Option<f64>) -> Vec<usize> {
        let min_height = min_height.unwrap_or(f64::NEG_INFINITY);
        let n = self.len();
        let mut indices = Vec::new();
        for (i, y) in self
            .flux
            .iter()
            .copied()
            .enumerate()
            .take(n.saturating_sub(1))
            .skip(1)
        {
            if y > min_height && y >= self.flux[i - 1] && y >= self.flux[i + 1] {
                indices.push(i);
            }
        }
        indices
    }

    /// Estimate the full width at half max of the peak at `index` above a flat `baseline`
    /// by walking outwards until the flux drops below half height.
    ///
    /// Returns `None` when the point isn't above the baseline or no crossing brackets it.
    pub fn full_width_at_half_max(&self, index: usize, baseline: f64) -> Option<f64> {
        let (_, apex) = self.get(index)?;
        let height = apex - baseline;
        if height <= 0.0 {
            return None;
        }
        let half = baseline + height / 2.0;

        let mut left = index;
        while left > 0 && self.flux[left] > half {
            left -= 1;
        }
        let mut right = index;
        while right + 1 < self.len() && self.flux[right] > half {
            right += 1;
        }

        let left_x = self.half_max_crossing(left, left + 1, half);
        let right_x = self.half_max_crossing(right, right.saturating_sub(1), half);
        let width = right_x - left_x;
        if width > 0.0 && width.is_finite() {
            Some(width)
        } else {
            None
        }
    }

    /// Linearly interpolate the wavelength at which the flux crosses `half` between
    /// the point `outer`, below half height, and its neighbor `inner`.
    fn half_max_crossing(&self, outer: usize, inner: usize, half: f64) -> f64 {
        let x1 = self.wavelength[outer];
        let y1 = self.flux[outer];
        let (x2, y2) = match self.get(inner) {
            Some(pt) => pt,
            None => return x1,
        };
        if y1 >= half || (y2 - y1).abs() < f64::EPSILON {
            return x1;
        }
        x1 + (x2 - x1) * ((half - y1) / (y2 - y1))
    }

    /// Compute the sum of squared residuals against a straight line fit
    pub fn linear_residuals(&self) -> f64 {
        let n = self.len() as f64;
        if n < 2.0 {
            return 0.0;
        }
        let (sx, sy) = self
            .iter()
            .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
        let (xbar, ybar) = (sx / n, sy / n);
        let (cov, var) = self.iter().fold((0.0, 0.0), |(cov, var), (x, y)| {
            (cov + (x - xbar) * (y - ybar), var + (x - xbar).powi(2))
        });
        let slope = if var > 0.0 { cov / var } else { 0.0 };
        let intercept = ybar - slope * xbar;
        self.iter()
            .map(|(x, y)| (y - (intercept + slope * x)).powi(2))
            .sum()
    }
}

impl<'a, 'b> TryFrom<(Vec<f64>, Vec<f64>)> for Spectrum<'a, 'b> {
    type Error = LineFitError;

    fn try_from((wavelength, flux): (Vec<f64>, Vec<f64>)) -> Result<Self, Self::Error> {
        Self::from_vecs(wavelength, flux)
    }
}

impl<'a, 'b> TryFrom<(&'a [f64], &'b [f64])> for Spectrum<'a, 'b> {
    type Error = LineFitError;

    fn try_from((wavelength, flux): (&'a [f64], &'b [f64])) -> Result<Self, Self::Error> {
        Self::from_slices(wavelength, flux)
    }
}
