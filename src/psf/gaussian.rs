use serde::{Deserialize, Serialize};

use super::{PsfEvaluator, elliptical_z2};

/// Elliptical Gaussian profile
///
/// $$
/// g(x, y) = A \exp\left(-\frac{z^2}{2}\right),
/// \quad z^2 = \frac{x'^2}{\sigma_x^2} + \frac{y'^2}{\sigma_y^2}
/// $$
/// with `(x', y')` the pixel offsets from the center rotated by `theta`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct GaussianPsf {
    xsig: f64,
    ysig: f64,
    theta: f64,
    npix: usize,
}

impl GaussianPsf {
    pub fn new(xsig: f64, ysig: f64, theta: f64, npix: usize) -> Self {
        Self {
            xsig,
            ysig,
            theta,
            npix,
        }
    }

    /// Full width at half maximum of the geometric-mean axis
    pub fn fwhm(&self) -> f64 {
        2.0 * (2.0 * f64::ln(2.0)).sqrt() * (self.xsig * self.ysig).sqrt()
    }
}

impl PsfEvaluator for GaussianPsf {
    #[inline]
    fn npix(&self) -> usize {
        self.npix
    }

    fn value(&self, x: f64, y: f64, pars: &[f64; 3]) -> f64 {
        let (z2, _, _) = elliptical_z2(x, y, pars[1], pars[2], self.xsig, self.ysig, self.theta);
        pars[0] * f64::exp(-0.5 * z2)
    }

    fn value_and_grad(&self, x: f64, y: f64, pars: &[f64; 3]) -> (f64, [f64; 3]) {
        let (z2, dz2_dx, dz2_dy) =
            elliptical_z2(x, y, pars[1], pars[2], self.xsig, self.ysig, self.theta);
        let profile = f64::exp(-0.5 * z2);
        let value = pars[0] * profile;
        // dg/dz2 = -g/2
        let dv_dz2 = -0.5 * value;
        (value, [profile, dv_dz2 * dz2_dx, dv_dz2 * dz2_dy])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::psf::PsfModel;
    use crate::psf::tests::check_gradient;
    use approx::assert_relative_eq;

    #[test]
    fn peak_value_is_amplitude() {
        let psf = GaussianPsf::new(1.5, 2.0, 0.7, 21);
        assert_relative_eq!(psf.value(3.2, 4.1, &[250.0, 3.2, 4.1]), 250.0);
    }

    #[test]
    fn circular_symmetry() {
        let psf = GaussianPsf::new(1.3, 1.3, 0.0, 21);
        let pars = [100.0, 10.0, 10.0];
        assert_relative_eq!(
            psf.value(12.0, 10.0, &pars),
            psf.value(10.0, 12.0, &pars),
            max_relative = 1e-14,
        );
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let psf: PsfModel = GaussianPsf::new(1.5, 1.1, 0.4, 21).into();
        check_gradient(&psf, &[120.0, 9.7, 10.4]);
    }
}
