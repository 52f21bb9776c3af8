//! PSF evaluator capability
//!
//! Every supported point-spread-function profile is a variant of [PsfModel]
//! and implements [PsfEvaluator]: model values and the analytic Jacobian with
//! respect to the three per-star fit parameters `[amp, xcen, ycen]`. Shape
//! parameters (widths, rotation, wing strengths, lookup tables) are fixed
//! state of the profile and are not fitted here.

use enum_dispatch::enum_dispatch;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

mod empirical;
mod gaussian;
mod gausspow;
mod moffat;
mod penny;

pub use empirical::EmpiricalPsf;
pub use gaussian::GaussianPsf;
pub use gausspow::GaussPowPsf;
pub use moffat::MoffatPsf;
pub use penny::PennyPsf;

#[enum_dispatch]
pub trait PsfEvaluator {
    /// Side of the square PSF stamp, pixels
    fn npix(&self) -> usize;

    /// Model value at pixel `(x, y)` for parameters `[amp, xcen, ycen]`
    fn value(&self, x: f64, y: f64, pars: &[f64; 3]) -> f64;

    /// Model value and its gradient with respect to `[amp, xcen, ycen]`
    fn value_and_grad(&self, x: f64, y: f64, pars: &[f64; 3]) -> (f64, [f64; 3]);
}

/// All PSF profiles are available as variants of this enum
#[enum_dispatch(PsfEvaluator)]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[non_exhaustive]
pub enum PsfModel {
    Gaussian(GaussianPsf),
    Moffat(MoffatPsf),
    Penny(PennyPsf),
    GaussPow(GaussPowPsf),
    EmpiricalLookup(EmpiricalPsf),
}

impl PsfModel {
    /// Model values at the given pixel coordinates
    pub fn evaluate(&self, x: &[f64], y: &[f64], pars: &[f64; 3]) -> Array1<f64> {
        debug_assert_eq!(x.len(), y.len());
        x.iter()
            .zip(y.iter())
            .map(|(&xi, &yi)| self.value(xi, yi, pars))
            .collect()
    }

    /// Model values and the `n x 3` Jacobian at the given pixel coordinates
    pub fn evaluate_with_jacobian(
        &self,
        x: &[f64],
        y: &[f64],
        pars: &[f64; 3],
    ) -> (Array1<f64>, Array2<f64>) {
        debug_assert_eq!(x.len(), y.len());
        let n = x.len();
        let mut values = Array1::zeros(n);
        let mut jac = Array2::zeros((n, 3));
        for (i, (&xi, &yi)) in x.iter().zip(y.iter()).enumerate() {
            let (v, g) = self.value_and_grad(xi, yi, pars);
            values[i] = v;
            jac[(i, 0)] = g[0];
            jac[(i, 1)] = g[1];
            jac[(i, 2)] = g[2];
        }
        (values, jac)
    }
}

/// Elliptical radial term `z2 = xp^2/xsig^2 + yp^2/ysig^2` in coordinates
/// rotated by `theta`, together with its gradient `(dz2/dxcen, dz2/dycen)`
pub(crate) fn elliptical_z2(
    x: f64,
    y: f64,
    xcen: f64,
    ycen: f64,
    xsig: f64,
    ysig: f64,
    theta: f64,
) -> (f64, f64, f64) {
    let (sint, cost) = theta.sin_cos();
    let dx = x - xcen;
    let dy = y - ycen;
    let xp = dx * cost + dy * sint;
    let yp = -dx * sint + dy * cost;
    let xs2 = xsig * xsig;
    let ys2 = ysig * ysig;
    let z2 = xp * xp / xs2 + yp * yp / ys2;
    let dz2_dx = -2.0 * (xp * cost / xs2 - yp * sint / ys2);
    let dz2_dy = -2.0 * (xp * sint / xs2 + yp * cost / ys2);
    (z2, dz2_dx, dz2_dy)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Check the analytic gradient of a profile against central finite
    /// differences over a grid of pixel offsets
    pub fn check_gradient(psf: &PsfModel, pars: &[f64; 3]) {
        const H: f64 = 1e-6;
        for &x in &[pars[1] - 2.3, pars[1] - 0.4, pars[1], pars[1] + 1.7] {
            for &y in &[pars[2] - 1.9, pars[2], pars[2] + 0.8, pars[2] + 2.6] {
                let (_, grad) = psf.value_and_grad(x, y, pars);
                for k in 0..3 {
                    let mut lo = *pars;
                    let mut hi = *pars;
                    lo[k] -= H;
                    hi[k] += H;
                    let numeric =
                        (psf.value(x, y, &hi) - psf.value(x, y, &lo)) / (2.0 * H);
                    assert_relative_eq!(grad[k], numeric, epsilon = 1e-6, max_relative = 1e-5);
                }
            }
        }
    }

    #[test]
    fn evaluate_matches_value() {
        let psf: PsfModel = GaussianPsf::new(1.5, 1.2, 0.3, 15).into();
        let pars = [100.0, 5.0, 6.0];
        let x = [4.0, 5.0, 6.0];
        let y = [6.5, 6.0, 5.5];
        let values = psf.evaluate(&x, &y, &pars);
        let (values2, jac) = psf.evaluate_with_jacobian(&x, &y, &pars);
        for i in 0..3 {
            assert_relative_eq!(values[i], psf.value(x[i], y[i], &pars), max_relative = 1e-14);
            assert_relative_eq!(values[i], values2[i], max_relative = 1e-14);
            // d/damp is the unit-amplitude profile
            assert_relative_eq!(jac[(i, 0)] * pars[0], values[i], max_relative = 1e-12);
        }
    }
}
