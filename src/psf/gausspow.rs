use serde::{Deserialize, Serialize};

use super::{PsfEvaluator, elliptical_z2};

/// Power-law Gaussian profile (DoPHOT style)
///
/// $$
/// g(x, y) = \frac{A}{1 + \frac{z^2}{2} + \beta_4 \frac{z^4}{4}
///   + \beta_6 \frac{z^6}{6}}
/// $$
/// For `beta4 = beta6 = 0` this is a Lorentzian-like core; the extra terms
/// tune the kurtosis of the wings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct GaussPowPsf {
    xsig: f64,
    ysig: f64,
    theta: f64,
    beta4: f64,
    beta6: f64,
    npix: usize,
}

impl GaussPowPsf {
    pub fn new(xsig: f64, ysig: f64, theta: f64, beta4: f64, beta6: f64, npix: usize) -> Self {
        Self {
            xsig,
            ysig,
            theta,
            beta4,
            beta6,
            npix,
        }
    }
}

impl PsfEvaluator for GaussPowPsf {
    #[inline]
    fn npix(&self) -> usize {
        self.npix
    }

    fn value(&self, x: f64, y: f64, pars: &[f64; 3]) -> f64 {
        let (z2, _, _) = elliptical_z2(x, y, pars[1], pars[2], self.xsig, self.ysig, self.theta);
        let denom = 1.0 + 0.5 * z2 + 0.25 * self.beta4 * z2 * z2
            + self.beta6 * z2 * z2 * z2 / 6.0;
        pars[0] / denom
    }

    fn value_and_grad(&self, x: f64, y: f64, pars: &[f64; 3]) -> (f64, [f64; 3]) {
        let (z2, dz2_dx, dz2_dy) =
            elliptical_z2(x, y, pars[1], pars[2], self.xsig, self.ysig, self.theta);
        let denom = 1.0 + 0.5 * z2 + 0.25 * self.beta4 * z2 * z2
            + self.beta6 * z2 * z2 * z2 / 6.0;
        let ddenom_dz2 = 0.5 + 0.5 * self.beta4 * z2 + 0.5 * self.beta6 * z2 * z2;
        let profile = 1.0 / denom;
        let dv_dz2 = -pars[0] * ddenom_dz2 / (denom * denom);
        (pars[0] * profile, [profile, dv_dz2 * dz2_dx, dv_dz2 * dz2_dy])
    }
}
