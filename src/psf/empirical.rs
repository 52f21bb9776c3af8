use ndarray::{Array3, ArrayD, Ix3};
use serde::{Deserialize, Serialize};

use super::PsfEvaluator;
use crate::error::PhotError;

/// Empirical PSF: a tabulated profile with optional spatial variation
///
/// The lookup table has shape `(ny, nx, norder)`: one `ny x nx` stamp per
/// spatial-variation plane. With `norder == 1` the PSF is constant over the
/// image; with `norder == 4` the planes are combined with the terms
/// `1, x/W, y/H, xy/(W·H)` evaluated at the star center, where `(H, W)` is
/// the image shape. The stamp is sampled with bilinear interpolation and is
/// zero outside its support.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EmpiricalPsf {
    data: Array3<f64>,
    imshape: (usize, usize),
}

impl EmpiricalPsf {
    pub fn new(data: Array3<f64>, imshape: (usize, usize)) -> Self {
        Self { data, imshape }
    }

    /// Construct from a dynamic-dimensional table, validating that it is 3-D
    pub fn from_dyn(data: ArrayD<f64>, imshape: (usize, usize)) -> Result<Self, PhotError> {
        let ndim = data.ndim();
        let data = data
            .into_dimensionality::<Ix3>()
            .map_err(|_| PhotError::LookupTableDimension { ndim })?;
        Ok(Self::new(data, imshape))
    }

    fn norder(&self) -> usize {
        self.data.dim().2.min(4)
    }

    /// Spatial-variation terms evaluated at the star center
    fn spatial_terms(&self, xcen: f64, ycen: f64) -> [f64; 4] {
        let (ny, nx) = self.imshape;
        let relx = xcen / nx as f64;
        let rely = ycen / ny as f64;
        [1.0, relx, rely, relx * rely]
    }

    /// Bilinear sample of plane `k` at stamp coordinates `(xi, yi)` with the
    /// in-cell gradient; zero outside the stamp
    fn sample(&self, xi: f64, yi: f64, k: usize) -> (f64, f64, f64) {
        let (ny, nx, _) = self.data.dim();
        if xi < 0.0 || yi < 0.0 || xi > (nx - 1) as f64 || yi > (ny - 1) as f64 {
            return (0.0, 0.0, 0.0);
        }
        let x0 = (xi.floor() as usize).min(nx - 2);
        let y0 = (yi.floor() as usize).min(ny - 2);
        let fx = xi - x0 as f64;
        let fy = yi - y0 as f64;
        let a = self.data[(y0, x0, k)];
        let b = self.data[(y0, x0 + 1, k)];
        let c = self.data[(y0 + 1, x0, k)];
        let d = self.data[(y0 + 1, x0 + 1, k)];
        let value = a * (1.0 - fx) * (1.0 - fy) + b * fx * (1.0 - fy)
            + c * (1.0 - fx) * fy
            + d * fx * fy;
        let dv_dx = (b - a) * (1.0 - fy) + (d - c) * fy;
        let dv_dy = (c - a) * (1.0 - fx) + (d - b) * fx;
        (value, dv_dx, dv_dy)
    }
}

impl PsfEvaluator for EmpiricalPsf {
    #[inline]
    fn npix(&self) -> usize {
        self.data.dim().1
    }

    fn value(&self, x: f64, y: f64, pars: &[f64; 3]) -> f64 {
        self.value_and_grad(x, y, pars).0
    }

    fn value_and_grad(&self, x: f64, y: f64, pars: &[f64; 3]) -> (f64, [f64; 3]) {
        let (ny, nx, _) = self.data.dim();
        let xi = x - pars[1] + (nx - 1) as f64 / 2.0;
        let yi = y - pars[2] + (ny - 1) as f64 / 2.0;
        let terms = self.spatial_terms(pars[1], pars[2]);

        let mut profile = 0.0;
        let mut dp_dxi = 0.0;
        let mut dp_dyi = 0.0;
        for k in 0..self.norder() {
            let (v, dv_dx, dv_dy) = self.sample(xi, yi, k);
            profile += terms[k] * v;
            dp_dxi += terms[k] * dv_dx;
            dp_dyi += terms[k] * dv_dy;
        }

        // The spatial terms vary on the image scale and are treated as
        // constant within one solve; only the stamp coordinates move with
        // the center (d xi/d xcen = -1).
        (
            pars[0] * profile,
            [profile, -pars[0] * dp_dxi, -pars[0] * dp_dyi],
        )
    }
}
