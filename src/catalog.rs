use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// One input catalog row: a candidate star with an initial guess
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct StarEntry {
    pub id: i64,
    /// Initial amplitude (peak counts above the local background)
    pub amp: f64,
    /// Initial x center, pixels
    pub x: f64,
    /// Initial y center, pixels
    pub y: f64,
}

impl StarEntry {
    pub fn new(id: i64, amp: f64, x: f64, y: f64) -> Self {
        Self { id, amp, x, y }
    }
}

/// Best-fit parameters and uncertainties for one star
///
/// Uncertainties are NaN when the covariance estimate was unavailable
/// (too few fit pixels or a singular Hessian).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct StarSolution {
    pub id: i64,
    pub amp: f64,
    pub amp_err: f64,
    pub x: f64,
    pub x_err: f64,
    pub y: f64,
    pub y_err: f64,
    /// Outer iteration on which the star froze, or the terminal iteration
    /// count if it never converged
    pub niter: usize,
    /// Chi-square of the residuals over the star's fit pixels
    pub chisq: f64,
    /// RMS of the fit-pixel residuals as a fraction of the amplitude
    pub rms: f64,
}

/// Everything the fit produces: the star table, the best-fit model image
/// (stars only, no sky) and the sky image
#[derive(Clone, Debug)]
pub struct FitResults {
    /// One row per input star, ordered by descending initial amplitude
    pub stars: Vec<StarSolution>,
    pub model: Array2<f64>,
    pub sky: Array2<f64>,
}
