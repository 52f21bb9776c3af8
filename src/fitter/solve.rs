//! Per-star Gauss-Newton solve with line search and bounded steps

use itertools::izip;
use log::{debug, info};
use nalgebra::{Matrix3, Vector3};
use ndarray::{Array1, Array2};

use super::AllFitter;
use crate::array_stats::quadratic_vertex;
use crate::error::PhotError;
use crate::sky;

/// Half-width of the allowed x/y window around the current center, pixels
const CENTER_OFFSET: f64 = 10.0;
/// Maximum position change per solve, pixels
const MAX_CENTER_STEP: f64 = 0.5;
/// Inset so parameters never sit exactly on a bound
const BOUND_EPS: f64 = 1e-30;
/// Rounds of step halving when a step would cross a bound
const MAX_HALVINGS: usize = 2;

impl AllFitter {
    /// One nonlinear least-squares iteration for star `i`
    ///
    /// Updates the parameter vector, the residual and model buffers, the
    /// freeze state and the per-star chi-square/rms diagnostics. Frozen
    /// stars are skipped.
    pub fn solve_star(&mut self, i: usize) -> Result<(), PhotError> {
        self.check_star(i)?;
        if self.freeze.is_frozen(i) {
            return Ok(());
        }

        let find = self.footprints.fit.row(i).to_vec();
        let (fx, fy) = self.coords_of(&find);
        let err: Vec<f64> = find.iter().map(|&p| self.error[p]).collect();
        let wt: Vec<f64> = err.iter().map(|&e| 1.0 / (e * e)).collect();
        let mut resid: Vec<f64> = find.iter().map(|&p| self.resid[p]).collect();

        // Local sky relative to the smooth sky image; a per-solve
        // correction only, never folded back into the sky buffer.
        let local_sky = self.local_sky(i);
        for r in resid.iter_mut() {
            *r -= local_sky;
        }

        let pars = self.star_pars(i)?;
        let (model0, jac) = self.psf.evaluate_with_jacobian(&fx, &fy, &pars);

        let mut dbeta = weighted_normal_solve(&jac, &resid, &wt);
        for d in dbeta.iter_mut() {
            // shouldn't happen, recover by ignoring the component
            if !d.is_finite() {
                debug!("star {i}: non-finite step component zeroed");
                *d = 0.0;
            }
        }

        // Line search: chi-square at step scales 0, 0.5 and 1, then the
        // vertex of the parabola through the three samples.
        let data: Vec<f64> = resid
            .iter()
            .zip(model0.iter())
            .map(|(&r, &m)| r + m)
            .collect();
        let half_pars = [
            pars[0] + 0.5 * dbeta[0],
            pars[1] + 0.5 * dbeta[1],
            pars[2] + 0.5 * dbeta[2],
        ];
        let full_pars = [pars[0] + dbeta[0], pars[1] + dbeta[1], pars[2] + dbeta[2]];
        let model1 = self.psf.evaluate(&fx, &fy, &half_pars);
        let model2 = self.psf.evaluate(&fx, &fy, &full_pars);
        let alpha = line_search_alpha(
            weighted_ssr(&data, &model0, &wt),
            weighted_ssr(&data, &model1, &wt),
            weighted_ssr(&data, &model2, &wt),
        );
        let step = [alpha * dbeta[0], alpha * dbeta[1], alpha * dbeta[2]];

        let (lower, upper) = self.star_bounds(&pars);
        let maxsteps = max_steps(&pars);
        let bestpars = bounded_step(&pars, &step, &lower, &upper, &maxsteps);

        let percdiff = percent_diff(&pars, &bestpars);

        let converged = percdiff.iter().all(|&p| p <= self.config.minpercdiff);
        if !self.config.nofreeze && converged {
            // The candidate is discarded: the last committed parameters
            // stand, so the footprint buffers need no update.
            self.freeze.freeze_star(i);
            self.star_niter[i] = self.niter;
            if self.config.verbose {
                info!("star {i} frozen at iteration {}", self.niter);
            }
        } else {
            self.commit_star_pars(i, &bestpars);

            // Update residual and model over the full footprint, not just
            // the fit pixels, to keep image == model + sky + resid exact
            // beyond the fit radius.
            let full = self.footprints.full.row(i).to_vec();
            let (xf, yf) = self.coords_of(&full);
            let prev = self.psf.evaluate(&xf, &yf, &pars);
            let new = self.psf.evaluate(&xf, &yf, &bestpars);
            for (k, &p) in full.iter().enumerate() {
                self.resid[p] += prev[k] - new[k];
                self.modelim[p] += new[k] - prev[k];
            }
        }

        // Diagnostics from the committed state of the buffers
        let amp = self.pars[3 * i];
        let mut chisq = 0.0;
        let mut rms = 0.0;
        for (k, &p) in find.iter().enumerate() {
            let r = self.resid[p];
            chisq += r * r * wt[k];
            let scaled = r / amp;
            rms += scaled * scaled;
        }
        self.star_chisq[i] = chisq;
        self.star_rms[i] = (rms / find.len() as f64).sqrt();

        if self.config.verbose {
            info!(
                "star {i} iter {}: pars {:?} percdiff {:?} chisq {chisq:.6}",
                self.niter,
                self.star_pars(i)?,
                percdiff,
            );
        }

        Ok(())
    }

    /// Per-solve parameter bounds: non-negative amplitude, centers within
    /// ±[CENTER_OFFSET] of the current position clamped to the image
    fn star_bounds(&self, pars: &[f64; 3]) -> ([f64; 3], [f64; 3]) {
        let lower = [
            0.0,
            (pars[1] - CENTER_OFFSET).max(0.0),
            (pars[2] - CENTER_OFFSET).max(0.0),
        ];
        let upper = [
            f64::INFINITY,
            (pars[1] + CENTER_OFFSET).min((self.nx - 1) as f64),
            (pars[2] + CENTER_OFFSET).min((self.ny - 1) as f64),
        ];
        (lower, upper)
    }
}

/// Maximum step per parameter: a quarter of the amplitude (at least 1)
/// and a fixed center cap
fn max_steps(pars: &[f64; 3]) -> [f64; 3] {
    [
        (pars[0].abs() * 0.25).max(1.0),
        MAX_CENTER_STEP,
        MAX_CENTER_STEP,
    ]
}

/// Apply step caps, halve any component that would cross a bound (at most
/// [MAX_HALVINGS] rounds) and clamp the result inside the bounds with a
/// tiny inset
fn bounded_step(
    pars: &[f64; 3],
    step: &[f64; 3],
    lower: &[f64; 3],
    upper: &[f64; 3],
    maxsteps: &[f64; 3],
) -> [f64; 3] {
    let mut limited = [0.0; 3];
    for k in 0..3 {
        limited[k] = step[k].signum() * step[k].abs().min(maxsteps[k]);
    }
    for _ in 0..MAX_HALVINGS {
        let mut any_bad = false;
        for k in 0..3 {
            let candidate = pars[k] + limited[k];
            if candidate <= lower[k] || candidate >= upper[k] {
                limited[k] /= 2.0;
                any_bad = true;
            }
        }
        if !any_bad {
            break;
        }
    }
    let mut out = [0.0; 3];
    for k in 0..3 {
        out[k] = (pars[k] + limited[k]).clamp(lower[k] + BOUND_EPS, upper[k] - BOUND_EPS);
    }
    out
}

/// Solve the weighted normal equations `(J^T W J) d = J^T W r` for one
/// star via QR; a singular system yields a zero step
fn weighted_normal_solve(jac: &Array2<f64>, resid: &[f64], wt: &[f64]) -> [f64; 3] {
    let mut ata = Matrix3::<f64>::zeros();
    let mut atb = Vector3::<f64>::zeros();
    for (row, &r, &w) in izip!(jac.rows(), resid, wt) {
        let j = [row[0], row[1], row[2]];
        for a in 0..3 {
            atb[a] += w * j[a] * r;
            for b in 0..3 {
                ata[(a, b)] += w * j[a] * j[b];
            }
        }
    }
    let delta = ata.qr().solve(&atb).unwrap_or_else(Vector3::zeros);
    [delta[0], delta[1], delta[2]]
}

/// Step scale from the three-point parabolic line search: vertex of the
/// parabola through the chi-squares at scales 0, 0.5 and 1, clamped to
/// `[0, 1]`; a degenerate (collinear) triple falls back to a full step
fn line_search_alpha(chisq0: f64, chisq1: f64, chisq2: f64) -> f64 {
    let alpha = quadratic_vertex(&[0.0, 0.5, 1.0], &[chisq0, chisq1, chisq2]);
    if alpha.is_finite() {
        alpha.clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// Per-parameter change used by the convergence test
///
/// Amplitude is a true percentage of its own magnitude (floored at 1e-4);
/// x and y are the absolute pixel displacement scaled by 100. All three
/// are compared against the same threshold.
fn percent_diff(old: &[f64; 3], new: &[f64; 3]) -> [f64; 3] {
    [
        (new[0] - old[0]).abs() / old[0].abs().max(1e-4) * 100.0,
        (new[1] - old[1]).abs() * 100.0,
        (new[2] - old[2]).abs() * 100.0,
    ]
}

/// Error-weighted sum of squared residuals of `data` against `model`
fn weighted_ssr(data: &[f64], model: &Array1<f64>, wt: &[f64]) -> f64 {
    izip!(data, model, wt)
        .map(|(&d, &m, &w)| {
            let r = d - m;
            r * r * w
        })
        .sum()
}

impl AllFitter {
    /// Robust local sky for star `i` from its annulus pixels, recorded for
    /// diagnostics
    pub(super) fn local_sky(&mut self, i: usize) -> f64 {
        let sind = self.footprints.sky.row(i);
        let resid: Vec<f64> = sind.iter().map(|&p| self.resid[p]).collect();
        let sigma: Vec<f64> = sind.iter().map(|&p| self.error[p]).collect();
        let value = sky::annulus_value(&resid, &sigma);
        self.star_sky[i] = value;
        value
    }
}
