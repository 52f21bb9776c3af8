//! Convergence bookkeeping for stars and parameters
//!
//! Freezing is tracked twice: one flag per parameter of the `3N + 1`
//! parameter vector and one state per star. A star is `Frozen` iff all
//! three of its own parameters are frozen; the trailing sky-offset flag is
//! independent of any star. Both representations are mutated together so
//! they can never disagree.

/// Per-star convergence state; `Frozen` is terminal until [FreezeState::unfreeze]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StarState {
    Free,
    Frozen,
}

#[derive(Clone, Debug)]
pub struct FreezeState {
    /// One flag per entry of the parameter vector, `3 * nstars + 1`
    pars: Vec<bool>,
    stars: Vec<StarState>,
}

impl FreezeState {
    pub fn new(nstars: usize) -> Self {
        Self {
            pars: vec![false; 3 * nstars + 1],
            stars: vec![StarState::Free; nstars],
        }
    }

    #[inline]
    pub fn is_frozen(&self, star: usize) -> bool {
        self.stars[star] == StarState::Frozen
    }

    /// Freeze all three parameters of one star and the star itself
    pub fn freeze_star(&mut self, star: usize) {
        for flag in &mut self.pars[3 * star..3 * star + 3] {
            *flag = true;
        }
        self.stars[star] = StarState::Frozen;
        debug_assert!(self.pars[3 * star..3 * star + 3].iter().all(|&f| f));
    }

    pub fn n_free_stars(&self) -> usize {
        self.stars
            .iter()
            .filter(|&&s| s == StarState::Free)
            .count()
    }

    /// Reset every star and every parameter, including the sky offset
    pub fn unfreeze(&mut self) {
        self.pars.fill(false);
        self.stars.fill(StarState::Free);
    }

    /// Parameter-level flags, `3 * nstars + 1` entries
    #[inline]
    pub fn frozen_pars(&self) -> &[bool] {
        &self.pars
    }
}
