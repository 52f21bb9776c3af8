//! Sky background estimation
//!
//! Two estimators work together: a smooth global sky image obtained from a
//! box median filter over the star-subtracted image, and a robust local sky
//! value from a star's annulus pixels used as a per-solve correction.

use ndarray::Array2;

use crate::array_stats::{median, weighted_mean};

/// Box median filter: each output pixel is the median of the `boxsize`-wide
/// window around it, clipped at the image edges
pub fn smooth(image: &Array2<f64>, boxsize: usize) -> Array2<f64> {
    let (ny, nx) = image.dim();
    let half = (boxsize / 2) as isize;
    let mut out = Array2::zeros((ny, nx));
    let mut window = Vec::with_capacity(boxsize * boxsize);
    for j in 0..ny {
        let y_lo = (j as isize - half).max(0) as usize;
        let y_hi = (j + half as usize + 1).min(ny);
        for i in 0..nx {
            let x_lo = (i as isize - half).max(0) as usize;
            let x_hi = (i + half as usize + 1).min(nx);
            window.clear();
            for jj in y_lo..y_hi {
                for ii in x_lo..x_hi {
                    window.push(image[(jj, ii)]);
                }
            }
            out[(j, i)] = median(&window).unwrap_or(0.0);
        }
    }
    out
}

/// Robust sky value from annulus pixels
///
/// Inverse-variance weights are reweighted by
/// `1 / (1 + |resid - median(resid)|^2 / median(sigma))` to suppress pixels
/// contaminated by faint neighbors (Stetson's scheme), then the weighted
/// mean of the residuals is returned. Empty input yields 0.
pub fn annulus_value(resid: &[f64], sigma: &[f64]) -> f64 {
    let (Some(med), Some(med_sigma)) = (median(resid), median(sigma)) else {
        return 0.0;
    };
    let weights: Vec<f64> = resid
        .iter()
        .zip(sigma.iter())
        .map(|(&r, &s)| {
            let wt = 1.0 / (s * s);
            let dev = r - med;
            wt / (1.0 + dev * dev / med_sigma)
        })
        .collect();
    weighted_mean(resid, &weights).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    #[test]
    fn smooth_of_constant_is_constant() {
        let image = Array2::from_elem((16, 16), 42.0);
        let sky = smooth(&image, 5);
        for &v in sky.iter() {
            assert_relative_eq!(v, 42.0);
        }
    }

    #[test]
    fn smooth_rejects_single_hot_pixel() {
        let mut image = Array2::from_elem((16, 16), 10.0);
        image[(8, 8)] = 1e6;
        let sky = smooth(&image, 7);
        assert_relative_eq!(sky[(8, 8)], 10.0);
    }

    #[test]
    fn annulus_constant_sky() {
        let resid = vec![100.0; 50];
        let sigma = vec![3.0; 50];
        assert_relative_eq!(annulus_value(&resid, &sigma), 100.0, max_relative = 1e-12);
    }

    #[test]
    fn annulus_downweights_outliers() {
        let mut resid = vec![50.0; 40];
        // a handful of pixels contaminated by a neighbor star
        for r in resid.iter_mut().take(4) {
            *r = 5000.0;
        }
        let sigma = vec![5.0; 40];
        let sky = annulus_value(&resid, &sigma);
        let naive = resid.iter().sum::<f64>() / resid.len() as f64;
        assert!(sky < naive, "robust estimate {sky} must undercut the naive mean {naive}");
        assert!((sky - 50.0).abs() < 10.0, "sky {sky} should stay near 50");
    }

    #[test]
    fn annulus_empty_is_zero() {
        assert_eq!(annulus_value(&[], &[]), 0.0);
    }
}
