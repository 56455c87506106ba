//! The single random source of a simulation.
//!
//! Every stochastic draw (placement, attribute sampling, movement, infection, death, isolation,
//! curing and vaccination) goes through one seeded generator stored in the `Context`, so a run
//! is fully reproducible from its seed and the order of the draws. The generator lives behind a
//! `RefCell` so that sampling only needs a shared borrow of the `Context`.
mod sampling_algorithms;

use std::cell::{RefCell, RefMut};

use log::trace;
use rand::distr::uniform::{SampleRange, SampleUniform};
use rand::distr::Distribution;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

pub use sampling_algorithms::{sample_multiple_from_known_length, sample_single_from_known_length};

use crate::context::Context;
use crate::define_data_plugin;

struct RandomSource {
    base_seed: u64,
    rng: RefCell<StdRng>,
}

define_data_plugin!(RngPlugin, Option<RandomSource>, None);

fn get_rng(context: &Context) -> RefMut<'_, StdRng> {
    let source = context
        .get_data_container(RngPlugin)
        .and_then(Option::as_ref)
        .expect("You must initialize the random number generator with a base seed");
    source
        .rng
        .try_borrow_mut()
        .expect("the random number generator is already borrowed")
}

// This is a trait extension on Context for
// random number generation functionality.
pub trait ContextRandomExt {
    /// Seeds the random source. Calling this again resets the generator, so the same seed
    /// replays the same sequence of draws.
    fn init_random(&mut self, base_seed: u64);

    /// The seed the random source was last initialized with, if any.
    fn get_base_seed(&self) -> Option<u64>;

    /// Applies `sampler` to the generator and returns its result.
    ///
    /// # Panics
    ///
    /// Panics if `init_random` was not called yet.
    fn sample<T>(&self, sampler: impl FnOnce(&mut StdRng) -> T) -> T;

    /// Draws a value from the given distribution.
    fn sample_distr<T>(&self, distribution: impl Distribution<T>) -> T;

    /// Draws a value uniformly from `range`.
    fn sample_range<S, T>(&self, range: S) -> T
    where
        S: SampleRange<T>,
        T: SampleUniform;

    /// A Bernoulli draw that is true with probability `p`.
    fn sample_bool(&self, p: f64) -> bool;

    /// Shuffles `items` in place into a uniformly random permutation.
    fn shuffle<T>(&self, items: &mut [T]);
}

impl ContextRandomExt for Context {
    fn init_random(&mut self, base_seed: u64) {
        trace!("initializing random source with seed {base_seed}");
        *self.get_data_mut(RngPlugin) = Some(RandomSource {
            base_seed,
            rng: RefCell::new(StdRng::seed_from_u64(base_seed)),
        });
    }

    fn get_base_seed(&self) -> Option<u64> {
        self.get_data_container(RngPlugin)
            .and_then(Option::as_ref)
            .map(|source| source.base_seed)
    }

    fn sample<T>(&self, sampler: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = get_rng(self);
        sampler(&mut rng)
    }

    fn sample_distr<T>(&self, distribution: impl Distribution<T>) -> T {
        self.sample(|rng| distribution.sample(rng))
    }

    fn sample_range<S, T>(&self, range: S) -> T
    where
        S: SampleRange<T>,
        T: SampleUniform,
    {
        self.sample(|rng| rng.random_range(range))
    }

    fn sample_bool(&self, p: f64) -> bool {
        self.sample(|rng| rng.random_bool(p))
    }

    fn shuffle<T>(&self, items: &mut [T]) {
        self.sample(|rng| items.shuffle(rng));
    }
}
