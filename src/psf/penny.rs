use serde::{Deserialize, Serialize};

use super::{PsfEvaluator, elliptical_z2};

/// Penny profile: elliptical Gaussian core plus circular Lorentzian wings
///
/// $$
/// g(x, y) = A \left[(1 - f_w) \exp\left(-\frac{z^2}{2}\right)
///   + \frac{f_w}{1 + r^2/\sigma_w^2}\right]
/// $$
/// where `f_w` is the fractional wing amplitude `relamp` and `r` the
/// unrotated radial offset from the center.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct PennyPsf {
    xsig: f64,
    ysig: f64,
    theta: f64,
    relamp: f64,
    wsig: f64,
    npix: usize,
}

impl PennyPsf {
    pub fn new(xsig: f64, ysig: f64, theta: f64, relamp: f64, wsig: f64, npix: usize) -> Self {
        Self {
            xsig,
            ysig,
            theta,
            relamp,
            wsig,
            npix,
        }
    }
}

impl PsfEvaluator for PennyPsf {
    #[inline]
    fn npix(&self) -> usize {
        self.npix
    }

    fn value(&self, x: f64, y: f64, pars: &[f64; 3]) -> f64 {
        let (z2, _, _) = elliptical_z2(x, y, pars[1], pars[2], self.xsig, self.ysig, self.theta);
        let dx = x - pars[1];
        let dy = y - pars[2];
        let r2 = dx * dx + dy * dy;
        let core = (1.0 - self.relamp) * f64::exp(-0.5 * z2);
        let wing = self.relamp / (1.0 + r2 / (self.wsig * self.wsig));
        pars[0] * (core + wing)
    }

    fn value_and_grad(&self, x: f64, y: f64, pars: &[f64; 3]) -> (f64, [f64; 3]) {
        let (z2, dz2_dx, dz2_dy) =
            elliptical_z2(x, y, pars[1], pars[2], self.xsig, self.ysig, self.theta);
        let dx = x - pars[1];
        let dy = y - pars[2];
        let ws2 = self.wsig * self.wsig;
        let base = 1.0 + (dx * dx + dy * dy) / ws2;

        let core = (1.0 - self.relamp) * f64::exp(-0.5 * z2);
        let wing = self.relamp / base;
        let profile = core + wing;

        // d(core)/dcen via the chain rule on z2; d(wing)/dcen via r^2
        let dcore_dz2 = -0.5 * core;
        let dwing_scale = 2.0 * self.relamp / (base * base * ws2);
        let dp_dx = dcore_dz2 * dz2_dx + dwing_scale * dx;
        let dp_dy = dcore_dz2 * dz2_dy + dwing_scale * dy;

        (
            pars[0] * profile,
            [profile, pars[0] * dp_dx, pars[0] * dp_dy],
        )
    }
}
