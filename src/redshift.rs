//! Redshift arithmetic for emission line centers.
//!
//! None of these functions guard against a zero rest wavelength or a redshift
//! of `-1`; they return non-finite values instead.

/// Rest wavelength of Hα in air, in Ångströms
pub const H_ALPHA: f64 = 6562.80;
/// Rest wavelength of the weaker [N II] line in air, in Ångströms
pub const NII_6548: f64 = 6548.05;
/// Rest wavelength of the stronger [N II] line in air, in Ångströms
pub const NII_6583: f64 = 6583.45;

/// Speed of light in km/s
pub const SPEED_OF_LIGHT: f64 = 299_792.458;

/// The redshift of a line observed at `observed` with rest wavelength `rest`
///
/// ```math
/// z = \frac{\lambda_{obs} - \lambda_{rest}}{\lambda_{rest}}
/// ```
#[inline]
pub fn redshift(observed: f64, rest: f64) -> f64 {
    (observed - rest) / rest
}

/// Propagate an uncertainty on the observed wavelength into the redshift
#[inline]
pub fn redshift_error(observed_error: f64, rest: f64) -> f64 {
    (observed_error / rest).abs()
}

/// Where a line with rest wavelength `rest` lands at redshift `z`
#[inline]
pub fn observed_wavelength(rest: f64, z: f64) -> f64 {
    rest * (1.0 + z)
}

/// The rest wavelength of a line observed at `observed` from a source at redshift `z`
#[inline]
pub fn rest_wavelength(observed: f64, z: f64) -> f64 {
    observed / (1.0 + z)
}

/// The line of sight velocity in km/s, valid for `z` much less than 1
#[inline]
pub fn velocity(z: f64) -> f64 {
    SPEED_OF_LIGHT * z
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_redshift() {
        let z = redshift(6565.0, 6563.0);
        assert!((z - 2.0 / 6563.0).abs() < 1e-15);
        assert!((z - 0.0003047).abs() < 1e-7);
        assert_eq!(redshift(6563.0, 6563.0), 0.0);
        assert_eq!(redshift(H_ALPHA, H_ALPHA), 0.0);
        assert!(!redshift(1.0, 0.0).is_finite());
    }

    #[test]
    fn test_inverse() {
        let z = 0.0213;
        for rest in [NII_6548, H_ALPHA, NII_6583] {
            let observed = observed_wavelength(rest, z);
            assert!((redshift(observed, rest) - z).abs() < 1e-12);
            assert!((rest_wavelength(observed, z) - rest).abs() < 1e-9);
        }
        assert!(NII_6548 < H_ALPHA && H_ALPHA < NII_6583);
    }

    #[test]
    fn test_velocity() {
        assert!((velocity(0.001) - 299.792458).abs() < 1e-9);
        assert_eq!(redshift_error(-0.5, 5000.0), 1e-4);
    }
}
