//! Batched random sampling for the simulation loop.
//!
//! A cycle performs on the order of `population × venues-per-person + venues × visitors`
//! Bernoulli trials, so drawing one value at a time from a general-purpose generator is a
//! bottleneck. A [`Sampler`] fills a buffer of uniform draws in one pass and serves them from a
//! cursor, refilling transparently when the buffer runs dry. Refills continue the same
//! generator stream, so the sequence of values a sampler yields depends only on its seed and
//! never on its batch size.
//!
//! Samplers are passed explicitly to whatever needs randomness. There is no global generator.
mod sampling_algorithms;

pub use sampling_algorithms::{
    sample_distinct_indices, sample_multiple_from_known_length, sample_single_from_known_length,
};

use log::trace;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::ContagionError;
use crate::hashing::hash_str;
use crate::params::Parameters;

/// Number of uniform draws generated per refill unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 4096;

pub struct Sampler<R = SmallRng> {
    rng: R,
    batch: Vec<f64>,
    /// Index of the next unread value in `batch`. Equal to `batch.len()` when exhausted.
    cursor: usize,
}

impl Sampler<SmallRng> {
    /// Creates a sampler over a `SmallRng` seeded with `seed`.
    ///
    /// # Errors
    ///
    /// Returns `ContagionError::InvalidParameter` if `batch_size` is zero.
    pub fn new(seed: u64, batch_size: usize) -> Result<Self, ContagionError> {
        trace!("creating sampler (seed={seed}, batch_size={batch_size})");
        Sampler::from_rng(SmallRng::seed_from_u64(seed), batch_size)
    }

    /// Creates a sampler for a named stream. The seed is offset by a hash of `name`, so two
    /// streams with the same base seed but different names are independent.
    ///
    /// # Errors
    ///
    /// Returns `ContagionError::InvalidParameter` if `batch_size` is zero.
    pub fn from_stream(
        base_seed: u64,
        name: &str,
        batch_size: usize,
    ) -> Result<Self, ContagionError> {
        trace!("creating sampler stream {name:?} (base seed={base_seed})");
        Sampler::new(base_seed.wrapping_add(hash_str(name)), batch_size)
    }

    /// Creates the main simulation sampler from `seed` and `sampler_batch_size`.
    ///
    /// # Errors
    ///
    /// Returns `ContagionError::InvalidParameter` if the configured batch size is zero.
    pub fn from_parameters(parameters: &Parameters) -> Result<Self, ContagionError> {
        Sampler::new(parameters.seed, parameters.sampler_batch_size)
    }
}

impl<R: Rng> Sampler<R> {
    /// Wraps an existing generator.
    ///
    /// # Errors
    ///
    /// Returns `ContagionError::InvalidParameter` if `batch_size` is zero.
    pub fn from_rng(rng: R, batch_size: usize) -> Result<Self, ContagionError> {
        if batch_size == 0 {
            return Err(ContagionError::InvalidParameter(
                "sampler batch size must be positive".to_string(),
            ));
        }
        Ok(Sampler {
            rng,
            batch: vec![0.0; batch_size],
            cursor: batch_size,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch.len()
    }

    fn refill(&mut self) {
        for slot in &mut self.batch {
            *slot = self.rng.random::<f64>();
        }
        self.cursor = 0;
    }

    /// Returns the next uniform draw in `[0, 1)`.
    #[inline]
    pub fn next_uniform(&mut self) -> f64 {
        if self.cursor == self.batch.len() {
            self.refill();
        }
        let value = self.batch[self.cursor];
        self.cursor += 1;
        value
    }

    /// Returns `true` with probability `p`. `p <= 0` is always `false` and `p >= 1` is always
    /// `true`. Exactly one draw is consumed whatever the value of `p`.
    #[inline]
    pub fn bernoulli(&mut self, p: f64) -> bool {
        let draw = self.next_uniform();
        if p <= 0.0 {
            false
        } else if p >= 1.0 {
            true
        } else {
            draw < p
        }
    }

    /// Returns a uniformly distributed index in `0..len`.
    ///
    /// # Errors
    ///
    /// Returns `ContagionError::EmptyCandidateSet` if `len` is zero.
    #[allow(clippy::cast_precision_loss)]
    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::cast_sign_loss)]
    pub fn choose_index(&mut self, len: usize) -> Result<usize, ContagionError> {
        if len == 0 {
            return Err(ContagionError::EmptyCandidateSet(
                "cannot choose an index from an empty range".to_string(),
            ));
        }
        let index = (self.next_uniform() * len as f64) as usize;
        // Guards against rounding up to `len` for draws just below 1.
        Ok(index.min(len - 1))
    }

    /// Returns a uniformly distributed integer in `low..=high`. If `high < low`, returns `low`.
    pub fn range_inclusive(&mut self, low: usize, high: usize) -> usize {
        let span = high.saturating_sub(low) + 1;
        // `span` is never zero
        low + self.choose_index(span).unwrap_or(0)
    }

    /// Draws `count` distinct indices from `0..len`, in the order they were drawn.
    ///
    /// # Errors
    ///
    /// Returns `ContagionError::EmptyCandidateSet` if `count > len`.
    pub fn sample_distinct(&mut self, len: usize, count: usize) -> Result<Vec<usize>, ContagionError> {
        sample_distinct_indices(self, len, count)
    }
}
