/// Error returned from [crate::AllFitter] and [crate::fit]
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PhotError {
    #[error("star index {index} is out of bounds for {nstars} stars")]
    StarIndexOutOfBounds { index: usize, nstars: usize },

    #[error("image shape {image:?} and error shape {error:?} differ")]
    ShapeMismatch {
        image: (usize, usize),
        error: (usize, usize),
    },

    #[error("input catalog is empty")]
    EmptyCatalog,

    #[error("PSF lookup table must have 3 dimensions, got {ndim}")]
    LookupTableDimension { ndim: usize },

    #[error("uncertainty unavailable for star {index}: {npix} fit pixels for 3 parameters")]
    UncertaintyUnavailable { index: usize, npix: usize },
}
