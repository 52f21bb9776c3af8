use serde::{Deserialize, Serialize};

use super::{PsfEvaluator, elliptical_z2};

/// Elliptical Moffat profile
///
/// $$
/// g(x, y) = A \left(1 + z^2\right)^{-\beta}
/// $$
/// The power-law wings make it a better match than a Gaussian for
/// atmospheric seeing.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct MoffatPsf {
    xsig: f64,
    ysig: f64,
    theta: f64,
    beta: f64,
    npix: usize,
}

impl MoffatPsf {
    pub fn new(xsig: f64, ysig: f64, theta: f64, beta: f64, npix: usize) -> Self {
        Self {
            xsig,
            ysig,
            theta,
            beta,
            npix,
        }
    }
}

impl PsfEvaluator for MoffatPsf {
    #[inline]
    fn npix(&self) -> usize {
        self.npix
    }

    fn value(&self, x: f64, y: f64, pars: &[f64; 3]) -> f64 {
        let (z2, _, _) = elliptical_z2(x, y, pars[1], pars[2], self.xsig, self.ysig, self.theta);
        pars[0] * (1.0 + z2).powf(-self.beta)
    }

    fn value_and_grad(&self, x: f64, y: f64, pars: &[f64; 3]) -> (f64, [f64; 3]) {
        let (z2, dz2_dx, dz2_dy) =
            elliptical_z2(x, y, pars[1], pars[2], self.xsig, self.ysig, self.theta);
        let base = 1.0 + z2;
        let profile = base.powf(-self.beta);
        let value = pars[0] * profile;
        let dv_dz2 = -self.beta * pars[0] * base.powf(-self.beta - 1.0);
        (value, [profile, dv_dz2 * dz2_dx, dv_dz2 * dz2_dy])
    }
}
