use serde::{Deserialize, Serialize};

/// Configuration of the outer fitting loop
///
/// The defaults reproduce the standard simultaneous-fit setup: at most ten
/// outer iterations, convergence at 0.5 "percent" parameter change, smooth
/// sky re-estimated every second iteration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FitConfig {
    /// Maximum number of outer iterations
    pub maxiter: usize,
    /// Convergence threshold on the per-parameter percent change.
    ///
    /// Amplitude uses a true percentage of its own magnitude while x/y use
    /// the absolute pixel displacement scaled by 100; both are compared
    /// against this same threshold.
    pub minpercdiff: f64,
    /// Re-estimate the smooth sky every `reskyiter` outer iterations
    pub reskyiter: usize,
    /// Never freeze converged stars
    pub nofreeze: bool,
    /// Emit per-solve diagnostics through the `log` facade
    pub verbose: bool,
}

impl FitConfig {
    #[inline]
    pub fn default_maxiter() -> usize {
        10
    }

    #[inline]
    pub fn default_minpercdiff() -> f64 {
        0.5
    }

    #[inline]
    pub fn default_reskyiter() -> usize {
        2
    }
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            maxiter: Self::default_maxiter(),
            minpercdiff: Self::default_minpercdiff(),
            reskyiter: Self::default_reskyiter(),
            nofreeze: false,
            verbose: false,
        }
    }
}
