//! Simultaneous fitting of all stars in an image
//!
//! [AllFitter] owns flattened copies of the image, the error image and the
//! running sky/model/residual buffers, plus the interleaved parameter
//! vector `[amp0, x0, y0, amp1, x1, y1, ..., sky_offset]`. The residual
//! buffer always satisfies `image == model + sky + resid` exactly, because
//! every parameter update adds back the old stamp and subtracts the new one
//! over the star's full footprint.

mod freeze;
mod solve;

pub use freeze::{FreezeState, StarState};

use log::{debug, info};
use nalgebra::Matrix3;
use ndarray::{Array1, Array2};

use crate::catalog::{FitResults, StarEntry, StarSolution};
use crate::config::FitConfig;
use crate::error::PhotError;
use crate::footprint::FootprintTable;
use crate::psf::{PsfEvaluator, PsfModel};
use crate::sky;

/// Extra pixels beyond the PSF stamp half-width for the sky annulus radius
const SKY_RADIUS_MARGIN: usize = 10;

#[derive(Debug)]
pub struct AllFitter {
    psf: PsfModel,
    config: FitConfig,
    nx: usize,
    ny: usize,
    /// Flattened input image, row-major
    image: Array1<f64>,
    /// Flattened per-pixel 1-sigma uncertainties
    error: Array1<f64>,
    /// Smooth sky image
    skyim: Array1<f64>,
    /// Sum of all star models
    modelim: Array1<f64>,
    /// `image - skyim - modelim`, kept exact by construction
    resid: Array1<f64>,
    sky_boxsize: usize,
    ids: Vec<i64>,
    /// `[amp, x, y]` per star plus a trailing sky offset
    pars: Vec<f64>,
    nstars: usize,
    niter: usize,
    footprints: FootprintTable,
    freeze: FreezeState,
    star_sky: Vec<f64>,
    star_niter: Vec<usize>,
    star_chisq: Vec<f64>,
    star_rms: Vec<f64>,
}

impl AllFitter {
    /// Set up a simultaneous fit of `catalog` against `image`
    ///
    /// Stars are sorted by descending initial amplitude so the brightest
    /// are solved first within each outer iteration. Footprints are indexed
    /// once from the initial centers.
    pub fn new(
        psf: PsfModel,
        image: &Array2<f64>,
        error: &Array2<f64>,
        catalog: &[StarEntry],
        fitradius: f64,
        config: FitConfig,
    ) -> Result<Self, PhotError> {
        if image.dim() != error.dim() {
            return Err(PhotError::ShapeMismatch {
                image: image.dim(),
                error: error.dim(),
            });
        }
        if catalog.is_empty() {
            return Err(PhotError::EmptyCatalog);
        }

        let (ny, nx) = image.dim();
        let nstars = catalog.len();

        let mut stars: Vec<StarEntry> = catalog.to_vec();
        stars.sort_by(|a, b| b.amp.total_cmp(&a.amp));

        let hpsfnpix = psf.npix() / 2;
        let skyradius = (hpsfnpix + SKY_RADIUS_MARGIN) as f64;
        let sky_boxsize = 2 * (hpsfnpix + SKY_RADIUS_MARGIN) + 1;

        let ids: Vec<i64> = stars.iter().map(|s| s.id).collect();
        let mut pars = vec![0.0; 3 * nstars + 1];
        for (i, star) in stars.iter().enumerate() {
            pars[3 * i] = star.amp;
            pars[3 * i + 1] = star.x;
            pars[3 * i + 2] = star.y;
        }

        let xcen: Vec<f64> = stars.iter().map(|s| s.x).collect();
        let ycen: Vec<f64> = stars.iter().map(|s| s.y).collect();
        let footprints =
            FootprintTable::collate((ny, nx), &xcen, &ycen, hpsfnpix, fitradius, skyradius);

        let skyim2 = sky::smooth(image, sky_boxsize);
        let image_flat = Array1::from_iter(image.iter().copied());
        let error_flat = Array1::from_iter(error.iter().copied());
        let skyim = Array1::from_iter(skyim2.iter().copied());

        let mut fitter = Self {
            psf,
            config,
            nx,
            ny,
            image: image_flat.clone(),
            error: error_flat,
            resid: &image_flat - &skyim,
            skyim,
            modelim: Array1::zeros(nx * ny),
            sky_boxsize,
            ids,
            pars,
            nstars,
            niter: 0,
            footprints,
            freeze: FreezeState::new(nstars),
            star_sky: vec![0.0; nstars],
            star_niter: vec![0; nstars],
            star_chisq: vec![f64::NAN; nstars],
            star_rms: vec![f64::NAN; nstars],
        };

        // Subtract every star's initial model over its full footprint
        for i in 0..nstars {
            let full = fitter.footprints.full.row(i).to_vec();
            let (xf, yf) = fitter.coords_of(&full);
            let star_pars = fitter.star_pars(i)?;
            let model = fitter.psf.evaluate(&xf, &yf, &star_pars);
            for (k, &p) in full.iter().enumerate() {
                fitter.resid[p] -= model[k];
                fitter.modelim[p] += model[k];
            }
        }

        Ok(fitter)
    }

    #[inline]
    pub fn nstars(&self) -> usize {
        self.nstars
    }

    /// Outer iterations performed so far
    #[inline]
    pub fn niter(&self) -> usize {
        self.niter
    }

    /// Additive sky offset shared by all stars, the trailing parameter
    #[inline]
    pub fn sky_offset(&self) -> f64 {
        self.pars[3 * self.nstars]
    }

    /// Current amplitudes in fitting order
    pub fn amps(&self) -> Vec<f64> {
        (0..self.nstars).map(|i| self.pars[3 * i]).collect()
    }

    /// Current x centers in fitting order
    pub fn xcens(&self) -> Vec<f64> {
        (0..self.nstars).map(|i| self.pars[3 * i + 1]).collect()
    }

    /// Current y centers in fitting order
    pub fn ycens(&self) -> Vec<f64> {
        (0..self.nstars).map(|i| self.pars[3 * i + 2]).collect()
    }

    fn check_star(&self, i: usize) -> Result<(), PhotError> {
        if i < self.nstars {
            Ok(())
        } else {
            Err(PhotError::StarIndexOutOfBounds {
                index: i,
                nstars: self.nstars,
            })
        }
    }

    /// Current `[amp, xcen, ycen]` of star `i`
    pub fn star_pars(&self, i: usize) -> Result<[f64; 3], PhotError> {
        self.check_star(i)?;
        Ok([
            self.pars[3 * i],
            self.pars[3 * i + 1],
            self.pars[3 * i + 2],
        ])
    }

    /// Catalog id of star `i`
    pub fn star_id(&self, i: usize) -> Result<i64, PhotError> {
        self.check_star(i)?;
        Ok(self.ids[i])
    }

    /// Number of fitting pixels of star `i`
    pub fn star_fit_npix(&self, i: usize) -> Result<usize, PhotError> {
        self.check_star(i)?;
        Ok(self.footprints.fit.count(i))
    }

    /// Local annulus sky of star `i` from its most recent solve
    pub fn star_local_sky(&self, i: usize) -> Result<f64, PhotError> {
        self.check_star(i)?;
        Ok(self.star_sky[i])
    }

    /// Chi-square of star `i` over its fit pixels from its most recent solve
    pub fn star_chisq(&self, i: usize) -> Result<f64, PhotError> {
        self.check_star(i)?;
        Ok(self.star_chisq[i])
    }

    pub fn is_frozen(&self, i: usize) -> Result<bool, PhotError> {
        self.check_star(i)?;
        Ok(self.freeze.is_frozen(i))
    }

    fn commit_star_pars(&mut self, i: usize, pars: &[f64; 3]) {
        self.pars[3 * i] = pars[0];
        self.pars[3 * i + 1] = pars[1];
        self.pars[3 * i + 2] = pars[2];
    }

    /// Pixel coordinates of flattened indices
    fn coords_of(&self, indices: &[usize]) -> (Vec<f64>, Vec<f64>) {
        let x = indices.iter().map(|&p| (p % self.nx) as f64).collect();
        let y = indices.iter().map(|&p| (p / self.nx) as f64).collect();
        (x, y)
    }

    /// Weighted sum of squared residuals over the union of all fitting
    /// pixels
    pub fn chisq(&self) -> f64 {
        self.footprints
            .fit_pixels
            .iter()
            .map(|&p| {
                let r = self.resid[p];
                let e = self.error[p];
                r * r / (e * e)
            })
            .sum()
    }

    /// Re-estimate the smooth sky from the star-subtracted image and fold
    /// the change into the residuals, preserving `image == model + sky + resid`
    pub fn resky(&mut self) {
        let star_subtracted = Array2::from_shape_fn((self.ny, self.nx), |(j, i)| {
            let p = j * self.nx + i;
            self.image[p] - self.modelim[p]
        });
        let new_sky2 = sky::smooth(&star_subtracted, self.sky_boxsize);
        let new_sky = Array1::from_iter(new_sky2.iter().copied());
        self.resid += &self.skyim;
        self.resid -= &new_sky;
        self.skyim = new_sky;
    }

    /// Release all frozen stars and parameters so the fit can continue
    pub fn unfreeze(&mut self) {
        self.freeze.unfreeze();
    }

    /// Run the outer loop: solve every free star once per iteration, then
    /// periodically re-estimate the smooth sky. Stops when all stars froze
    /// or the iteration cap is reached.
    pub fn run(&mut self) -> Result<(), PhotError> {
        self.niter = 1;
        while self.niter < self.config.maxiter && self.freeze.n_free_stars() > 0 {
            for i in 0..self.nstars {
                if !self.freeze.is_frozen(i) {
                    self.solve_star(i)?;
                }
            }
            if self.config.reskyiter > 0 && self.niter % self.config.reskyiter == 0 {
                if self.config.verbose {
                    info!("re-estimating the smooth sky at iteration {}", self.niter);
                }
                self.resky();
            }
            self.niter += 1;
        }
        // Stars that never froze report the terminal iteration count
        for n in self.star_niter.iter_mut() {
            if *n == 0 {
                *n = self.niter;
            }
        }
        if self.config.verbose {
            info!(
                "finished after {} iterations, total chisq {:.6}",
                self.niter,
                self.chisq()
            );
        }
        Ok(())
    }

    /// Parameter covariance of star `i` from the weighted Gauss-Newton
    /// Hessian over its fit pixels, scaled by the reduced chi-square
    pub fn star_covariance(&self, i: usize) -> Result<Matrix3<f64>, PhotError> {
        self.check_star(i)?;
        let find = self.footprints.fit.row(i);
        let n = find.len();
        if n <= 3 {
            return Err(PhotError::UncertaintyUnavailable { index: i, npix: n });
        }

        let indices = find.to_vec();
        let (fx, fy) = self.coords_of(&indices);
        let pars = self.star_pars(i)?;
        let (_, jac) = self.psf.evaluate_with_jacobian(&fx, &fy, &pars);

        let mut hess = Matrix3::<f64>::zeros();
        let mut chisq = 0.0;
        for (k, &p) in indices.iter().enumerate() {
            let e = self.error[p];
            let w = 1.0 / (e * e);
            let j = [jac[(k, 0)], jac[(k, 1)], jac[(k, 2)]];
            for a in 0..3 {
                for b in 0..3 {
                    hess[(a, b)] += w * j[a] * j[b];
                }
            }
            let r = self.resid[p];
            chisq += r * r * w;
        }

        let cov = hess
            .try_inverse()
            .ok_or(PhotError::UncertaintyUnavailable { index: i, npix: n })?;
        Ok(cov * (chisq / (n - 3) as f64))
    }

    /// 1-sigma uncertainties `[amp_err, x_err, y_err]` of star `i`
    pub fn star_errors(&self, i: usize) -> Result<[f64; 3], PhotError> {
        let cov = self.star_covariance(i)?;
        Ok([
            cov[(0, 0)].max(0.0).sqrt(),
            cov[(1, 1)].max(0.0).sqrt(),
            cov[(2, 2)].max(0.0).sqrt(),
        ])
    }

    /// Best-fit model image, stars only
    pub fn model_image(&self) -> Array2<f64> {
        self.flat_to_image(&self.modelim)
    }

    /// Smooth sky plus the fitted constant sky offset
    pub fn sky_image(&self) -> Array2<f64> {
        let mut out = self.flat_to_image(&self.skyim);
        out += self.sky_offset();
        out
    }

    fn flat_to_image(&self, flat: &Array1<f64>) -> Array2<f64> {
        Array2::from_shape_fn((self.ny, self.nx), |(j, i)| flat[j * self.nx + i])
    }

    /// Assemble the star table and output images from the current state
    pub fn results(&self) -> Result<FitResults, PhotError> {
        let mut stars = Vec::with_capacity(self.nstars);
        for i in 0..self.nstars {
            let pars = self.star_pars(i)?;
            let errors = match self.star_errors(i) {
                Ok(e) => e,
                Err(err) => {
                    debug!("star {i}: {err}");
                    [f64::NAN; 3]
                }
            };
            stars.push(StarSolution {
                id: self.ids[i],
                amp: pars[0],
                amp_err: errors[0],
                x: pars[1],
                x_err: errors[1],
                y: pars[2],
                y_err: errors[2],
                niter: self.star_niter[i],
                chisq: self.star_chisq[i],
                rms: self.star_rms[i],
            });
        }
        Ok(FitResults {
            stars,
            model: self.model_image(),
            sky: self.sky_image(),
        })
    }
}

/// Fit all catalog stars simultaneously and return the star table with the
/// model and sky images
pub fn fit(
    psf: PsfModel,
    image: &Array2<f64>,
    error: &Array2<f64>,
    catalog: &[StarEntry],
    fitradius: f64,
    config: FitConfig,
) -> Result<FitResults, PhotError> {
    let mut fitter = AllFitter::new(psf, image, error, catalog, fitradius, config)?;
    fitter.run()?;
    fitter.results()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    use crate::psf::GaussianPsf;
    use crate::tests::{add_noise, render_scene};

    fn gaussian_psf() -> PsfModel {
        GaussianPsf::new(1.5, 1.5, 0.0, 15).into()
    }

    fn assert_conservation(fitter: &AllFitter) {
        for p in 0..fitter.image.len() {
            let lhs = fitter.image[p];
            let rhs = fitter.modelim[p] + fitter.skyim[p] + fitter.resid[p];
            assert!(
                (lhs - rhs).abs() < 1e-9,
                "pixel {p}: image {lhs} vs model+sky+resid {rhs}"
            );
        }
    }

    #[test]
    fn single_star_zero_noise() {
        let truth = StarEntry::new(1, 5000.0, 10.3, 10.7);
        let psf = gaussian_psf();
        let (image, error) = render_scene((21, 21), &psf, &[truth], 100.0);
        let guess = StarEntry::new(1, 4500.0, 10.0, 11.0);
        let config = FitConfig {
            nofreeze: true,
            ..FitConfig::default()
        };
        let results = fit(psf, &image, &error, &[guess], 5.0, config).unwrap();
        let star = &results.stars[0];
        assert_relative_eq!(star.amp, 5000.0, max_relative = 1e-3);
        assert_relative_eq!(star.x, 10.3, epsilon = 1e-3);
        assert_relative_eq!(star.y, 10.7, epsilon = 1e-3);
        assert!(star.amp_err.is_finite() && star.amp_err > 0.0);
        assert!(star.chisq.is_finite());
        assert!(star.rms.is_finite());
    }

    #[test]
    fn two_overlapping_stars_with_noise() {
        let psf = gaussian_psf();
        let truth = [
            StarEntry::new(7, 3000.0, 18.3, 10.4),
            StarEntry::new(8, 1500.0, 22.3, 10.6),
        ];
        let (mut image, error) = render_scene((21, 41), &psf, &truth, 200.0);
        add_noise(&mut image, 1.0, 42);
        let guesses = [
            StarEntry::new(7, 2700.0, 18.0, 10.0),
            StarEntry::new(8, 1700.0, 22.6, 10.9),
        ];
        let config = FitConfig {
            maxiter: 15,
            nofreeze: true,
            ..FitConfig::default()
        };
        let results = fit(psf, &image, &error, &guesses, 4.0, config).unwrap();
        // stars come back sorted by descending initial amplitude
        assert_eq!(results.stars[0].id, 7);
        assert_eq!(results.stars[1].id, 8);
        assert_relative_eq!(results.stars[0].amp, 3000.0, max_relative = 0.01);
        assert_relative_eq!(results.stars[1].amp, 1500.0, max_relative = 0.01);
        assert_relative_eq!(results.stars[0].x, 18.3, epsilon = 0.05);
        assert_relative_eq!(results.stars[1].x, 22.3, epsilon = 0.05);
    }

    #[test]
    fn per_star_chisq_is_non_increasing() {
        let psf = gaussian_psf();
        let truth = [
            StarEntry::new(1, 3000.0, 18.3, 10.4),
            StarEntry::new(2, 1500.0, 22.3, 10.6),
        ];
        let (image, error) = render_scene((21, 41), &psf, &truth, 200.0);
        let guesses = [
            StarEntry::new(1, 2700.0, 18.1, 10.2),
            StarEntry::new(2, 1650.0, 22.5, 10.8),
        ];
        let config = FitConfig {
            nofreeze: true,
            ..FitConfig::default()
        };
        let mut fitter = AllFitter::new(psf, &image, &error, &guesses, 4.0, config).unwrap();
        let mut prev = [f64::INFINITY; 2];
        for _ in 0..8 {
            for i in 0..2 {
                fitter.solve_star(i).unwrap();
            }
            for i in 0..2 {
                let chisq = fitter.star_chisq(i).unwrap();
                assert!(
                    chisq <= prev[i] * 1.01 + 1e-9,
                    "star {i}: chisq {chisq} rose above {}",
                    prev[i]
                );
                prev[i] = chisq;
            }
        }
        // the fit made real progress, not just no regressions
        assert!(prev[0] < 1.0 && prev[1] < 1.0, "final chisqs {prev:?}");
    }

    #[test]
    fn buffers_stay_conserved() {
        let psf = gaussian_psf();
        let truth = StarEntry::new(1, 4000.0, 10.2, 9.8);
        let (image, error) = render_scene((21, 21), &psf, &[truth], 50.0);
        let guess = StarEntry::new(1, 3600.0, 10.5, 9.5);
        let mut fitter =
            AllFitter::new(psf, &image, &error, &[guess], 5.0, FitConfig::default()).unwrap();
        assert_conservation(&fitter);
        fitter.solve_star(0).unwrap();
        assert_conservation(&fitter);
        fitter.resky();
        assert_conservation(&fitter);
        fitter.run().unwrap();
        assert_conservation(&fitter);
    }

    #[test]
    fn chisq_is_the_raw_weighted_sum_over_the_registry() {
        let psf = gaussian_psf();
        let truth = StarEntry::new(1, 4000.0, 10.2, 9.8);
        // deliberately wrong guess so the residuals are large and known
        let guess = StarEntry::new(1, 3000.0, 10.2, 9.8);
        let (image, error) = render_scene((21, 21), &psf, &[truth], 50.0);
        let fitter =
            AllFitter::new(psf, &image, &error, &[guess], 5.0, FitConfig::default()).unwrap();
        // unit errors, so chisq is the plain sum of squared residuals
        let expected: f64 = fitter
            .footprints
            .fit_pixels
            .iter()
            .map(|&p| fitter.resid[p] * fitter.resid[p])
            .sum();
        assert!(expected > 1e4, "the mismatched guess must leave residuals");
        assert_relative_eq!(fitter.chisq(), expected, max_relative = 1e-12);
        // the raw sum, not a per-degree-of-freedom reduction
        let dof = (fitter.footprints.ntotpix() - 4) as f64;
        assert!((fitter.chisq() - expected / dof).abs() > 1.0);
    }

    #[test]
    fn global_chisq_improves() {
        let psf = gaussian_psf();
        let truth = StarEntry::new(1, 5000.0, 10.3, 10.7);
        let (image, error) = render_scene((21, 21), &psf, &[truth], 100.0);
        let guess = StarEntry::new(1, 4000.0, 10.0, 11.0);
        let config = FitConfig {
            nofreeze: true,
            ..FitConfig::default()
        };
        let mut fitter = AllFitter::new(psf, &image, &error, &[guess], 5.0, config).unwrap();
        let before = fitter.chisq();
        fitter.run().unwrap();
        let after = fitter.chisq();
        assert!(
            after < before,
            "chisq must improve: {before} -> {after}"
        );
    }

    #[test]
    fn converged_star_freezes_and_stays_put() {
        let psf = gaussian_psf();
        let truth = StarEntry::new(1, 5000.0, 10.3, 10.7);
        let (image, error) = render_scene((21, 21), &psf, &[truth], 100.0);
        // start at the truth so the first solve converges immediately
        let mut fitter =
            AllFitter::new(psf, &image, &error, &[truth], 5.0, FitConfig::default()).unwrap();
        fitter.run().unwrap();
        assert!(fitter.is_frozen(0).unwrap());
        let results = fitter.results().unwrap();
        assert_eq!(results.stars[0].niter, 1);
        assert_relative_eq!(results.stars[0].amp, 5000.0, max_relative = 1e-6);
        assert_relative_eq!(results.stars[0].x, 10.3, epsilon = 1e-9);
        assert_relative_eq!(results.stars[0].y, 10.7, epsilon = 1e-9);
        fitter.unfreeze();
        assert!(!fitter.is_frozen(0).unwrap());
        assert!(fitter.freeze.frozen_pars().iter().all(|&f| !f));
    }

    #[test]
    fn nofreeze_runs_to_the_iteration_cap() {
        let psf = gaussian_psf();
        let truth = StarEntry::new(1, 5000.0, 10.3, 10.7);
        let (image, error) = render_scene((21, 21), &psf, &[truth], 100.0);
        let config = FitConfig {
            maxiter: 4,
            nofreeze: true,
            ..FitConfig::default()
        };
        let mut fitter = AllFitter::new(psf, &image, &error, &[truth], 5.0, config).unwrap();
        fitter.run().unwrap();
        assert!(!fitter.is_frozen(0).unwrap());
        assert_eq!(fitter.niter(), 4);
        // never-frozen stars carry the terminal iteration count
        assert_eq!(fitter.results().unwrap().stars[0].niter, 4);
    }

    #[test]
    fn too_few_fit_pixels_has_no_uncertainty() {
        let psf = gaussian_psf();
        let truth = StarEntry::new(1, 5000.0, 10.3, 10.7);
        let (image, error) = render_scene((21, 21), &psf, &[truth], 100.0);
        // fit radius so small only the nearest pixel qualifies
        let fitter =
            AllFitter::new(psf, &image, &error, &[truth], 0.5, FitConfig::default()).unwrap();
        let npix = fitter.star_fit_npix(0).unwrap();
        assert!(npix <= 3);
        assert_eq!(
            fitter.star_covariance(0).unwrap_err(),
            PhotError::UncertaintyUnavailable { index: 0, npix }
        );
        let results = fitter.results().unwrap();
        assert!(results.stars[0].amp_err.is_nan());
        assert!(results.stars[0].x_err.is_nan());
        assert!(results.stars[0].y_err.is_nan());
    }

    #[test]
    fn strided_accessors_match_parameter_layout() {
        let psf = gaussian_psf();
        let stars = [
            StarEntry::new(3, 800.0, 8.0, 9.0),
            StarEntry::new(4, 2000.0, 30.0, 11.0),
        ];
        let (image, error) = render_scene((21, 41), &psf, &stars, 10.0);
        let fitter =
            AllFitter::new(psf, &image, &error, &stars, 4.0, FitConfig::default()).unwrap();
        // brightest first
        assert_eq!(fitter.star_id(0).unwrap(), 4);
        assert_eq!(fitter.amps(), vec![2000.0, 800.0]);
        assert_eq!(fitter.xcens(), vec![30.0, 8.0]);
        assert_eq!(fitter.ycens(), vec![11.0, 9.0]);
        assert_eq!(fitter.sky_offset(), 0.0);
        for i in 0..2 {
            let pars = fitter.star_pars(i).unwrap();
            assert_eq!(pars, [fitter.amps()[i], fitter.xcens()[i], fitter.ycens()[i]]);
        }
    }

    #[test]
    fn accessors_check_star_index() {
        let psf = gaussian_psf();
        let truth = StarEntry::new(1, 5000.0, 10.3, 10.7);
        let (image, error) = render_scene((21, 21), &psf, &[truth], 100.0);
        let fitter =
            AllFitter::new(psf, &image, &error, &[truth], 5.0, FitConfig::default()).unwrap();
        let expected = PhotError::StarIndexOutOfBounds {
            index: 5,
            nstars: 1,
        };
        assert_eq!(fitter.star_pars(5).unwrap_err(), expected);
        assert_eq!(fitter.star_id(5).unwrap_err(), expected);
        assert_eq!(fitter.star_chisq(5).unwrap_err(), expected);
        assert_eq!(fitter.star_local_sky(5).unwrap_err(), expected);
    }

    #[test]
    fn rejects_bad_input() {
        let psf = gaussian_psf();
        let image = Array2::<f64>::zeros((21, 21));
        let error = Array2::<f64>::ones((20, 21));
        let star = StarEntry::new(1, 100.0, 10.0, 10.0);
        assert_eq!(
            AllFitter::new(psf.clone(), &image, &error, &[star], 5.0, FitConfig::default())
                .unwrap_err(),
            PhotError::ShapeMismatch {
                image: (21, 21),
                error: (20, 21),
            }
        );
        let error = Array2::<f64>::ones((21, 21));
        assert_eq!(
            AllFitter::new(psf, &image, &error, &[], 5.0, FitConfig::default()).unwrap_err(),
            PhotError::EmptyCatalog
        );
    }
}
