//! Simultaneous PSF photometry
//!
//! `psfphot` fits every star of an input catalog against an image at the
//! same time: each star gets three parameters (amplitude and center), the
//! fit iterates over stars solving small per-star nonlinear least-squares
//! problems against a shared residual image, and a smooth sky background is
//! re-estimated as the stars converge. Converged stars freeze so the
//! remaining work shrinks every iteration.
//!
//! The high-level entry point is [fit]; [AllFitter] exposes the same fit
//! step by step for callers that want to inspect intermediate state.
//!
//! ```
//! use ndarray::Array2;
//! use psfphot::{fit, FitConfig, GaussianPsf, PsfModel, StarEntry};
//!
//! # fn main() -> Result<(), psfphot::PhotError> {
//! let psf: PsfModel = GaussianPsf::new(1.5, 1.5, 0.0, 15).into();
//! // a flat scene with one star at (10.3, 10.7)
//! let image = Array2::from_shape_fn((21, 21), |(j, i)| {
//!     use psfphot::PsfEvaluator;
//!     100.0 + psf.value(i as f64, j as f64, &[5000.0, 10.3, 10.7])
//! });
//! let error = Array2::from_elem((21, 21), 1.0);
//! let catalog = [StarEntry::new(1, 4500.0, 10.0, 11.0)];
//!
//! let results = fit(psf, &image, &error, &catalog, 5.0, FitConfig::default())?;
//! let star = &results.stars[0];
//! assert!((star.x - 10.3).abs() < 0.01);
//! assert!((star.y - 10.7).abs() < 0.01);
//! # Ok(())
//! # }
//! ```


pub mod array_stats;
mod catalog;
mod config;
mod error;
mod fitter;
pub mod footprint;
pub mod psf;
pub mod sky;

pub use catalog::{FitResults, StarEntry, StarSolution};
pub use config::FitConfig;
pub use error::PhotError;
pub use fitter::{AllFitter, FreezeState, StarState, fit};
pub use psf::{
    EmpiricalPsf, GaussPowPsf, GaussianPsf, MoffatPsf, PennyPsf, PsfEvaluator, PsfModel,
};
