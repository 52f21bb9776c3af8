//! Per-star pixel index sets into the flattened image
//!
//! Every star carries three ravel-index sets computed from its *initial*
//! center: the full circular footprint (radius = half the PSF stamp), the
//! fitting footprint (radius = fit radius) and the sky annulus
//! (0.7–1.0 × sky radius). The sets are computed once at construction and
//! are not re-indexed as centers move during the fit.

use std::f64::consts::PI;

/// Jagged index sets stored as one fixed-width buffer plus per-row counts,
/// trimmed to the maximum observed count
#[derive(Clone, Debug)]
pub struct IndexTable {
    data: Vec<usize>,
    width: usize,
    counts: Vec<usize>,
}

impl IndexTable {
    fn from_rows(rows: &[Vec<usize>]) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let counts: Vec<usize> = rows.iter().map(Vec::len).collect();
        let mut data = vec![0; width * rows.len()];
        for (i, row) in rows.iter().enumerate() {
            data[i * width..i * width + row.len()].copy_from_slice(row);
        }
        Self {
            data,
            width,
            counts,
        }
    }

    /// Index set of star `i`
    #[inline]
    pub fn row(&self, i: usize) -> &[usize] {
        &self.data[i * self.width..i * self.width + self.counts[i]]
    }

    #[inline]
    pub fn count(&self, i: usize) -> usize {
        self.counts[i]
    }
}

/// The three index sets of all stars plus the deduplicated union of the
/// fitting footprints
#[derive(Clone, Debug)]
pub struct FootprintTable {
    pub full: IndexTable,
    pub fit: IndexTable,
    pub sky: IndexTable,
    /// Sorted, deduplicated union of all fitting-footprint indices
    pub fit_pixels: Vec<usize>,
}

impl FootprintTable {
    pub fn collate(
        imshape: (usize, usize),
        xcen: &[f64],
        ycen: &[f64],
        hpsfnpix: usize,
        fitradius: f64,
        skyradius: f64,
    ) -> Self {
        let nstars = xcen.len();
        let mut full_rows = Vec::with_capacity(nstars);
        let mut fit_rows = Vec::with_capacity(nstars);
        let mut sky_rows = Vec::with_capacity(nstars);
        for (&x, &y) in xcen.iter().zip(ycen.iter()) {
            let (full, fit, sky) =
                star_pixel_sets(imshape, x, y, hpsfnpix, fitradius, skyradius);
            full_rows.push(full);
            fit_rows.push(fit);
            sky_rows.push(sky);
        }

        let mut fit_pixels: Vec<usize> = fit_rows.iter().flatten().copied().collect();
        fit_pixels.sort_unstable();
        fit_pixels.dedup();

        Self {
            full: IndexTable::from_rows(&full_rows),
            fit: IndexTable::from_rows(&fit_rows),
            sky: IndexTable::from_rows(&sky_rows),
            fit_pixels,
        }
    }

    /// Total number of unique fitting pixels across all stars
    #[inline]
    pub fn ntotpix(&self) -> usize {
        self.fit_pixels.len()
    }
}

/// Classify every pixel in the sky bounding box of one star
///
/// Returns (full footprint, fitting footprint, sky annulus) as ravel indices
/// into the flattened image. Out-of-image pixels are clipped.
pub fn star_pixel_sets(
    imshape: (usize, usize),
    xcen: f64,
    ycen: f64,
    hpsfnpix: usize,
    fitradius: f64,
    skyradius: f64,
) -> (Vec<usize>, Vec<usize>, Vec<usize>) {
    let (ny, nx) = imshape;
    let nfpix = 2 * hpsfnpix + 1;
    let nfit = (2.0 * fitradius).floor() as usize + 2;

    let mut full = Vec::with_capacity(nfpix * nfpix);
    let mut fit = Vec::with_capacity(nfit * nfit);
    let mut sky = Vec::with_capacity((PI * skyradius * skyradius).ceil() as usize);

    let x_lo = (xcen - skyradius).floor().max(0.0) as usize;
    let x_hi = (((xcen + skyradius).ceil() as isize + 1).max(0) as usize).min(nx);
    let y_lo = (ycen - skyradius).floor().max(0.0) as usize;
    let y_hi = (((ycen + skyradius).ceil() as isize + 1).max(0) as usize).min(ny);

    for y in y_lo..y_hi {
        for x in x_lo..x_hi {
            let dx = x as f64 - xcen;
            let dy = y as f64 - ycen;
            let r = (dx * dx + dy * dy).sqrt();
            let index = y * nx + x;
            if r <= skyradius && r >= 0.7 * skyradius {
                sky.push(index);
            }
            if r <= hpsfnpix as f64 {
                full.push(index);
            }
            if r <= fitradius {
                fit.push(index);
            }
        }
    }

    (full, fit, sky)
}
