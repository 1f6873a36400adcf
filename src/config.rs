/*
 * Configuration of the bootstrap resampling. `BootstrapConfig` owns the random source, so
 * drawing resamples advances it; build it with `BootstrapConfigBuilder`.
*/
use either::Either as LeftOrRight;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt::{self, Debug, Display};

/// Default number of resamples.
pub const DEFAULT_RESAMPLES: usize = 1000;

/// Random source and size of a bootstrap run.
pub struct BootstrapConfig {
    rng: StdRng,
    resamples: usize,
    parallel: bool,
}

impl BootstrapConfig {
    pub fn new(rng: StdRng, resamples: usize) -> Self {
        Self {
            rng,
            resamples,
            parallel: false,
        }
    }

    pub fn resamples(&self) -> usize {
        self.resamples
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// One row per resample, each holding `n` indices drawn uniformly with replacement from
    /// `0..n`. Indices are drawn row by row so that a seed fixes the whole matrix.
    pub fn draw_indices(&mut self, n: usize) -> Array2<usize> {
        let resamples = self.resamples;
        if n == 0 {
            return Array2::zeros((resamples, 0));
        }
        let rng = &mut self.rng;
        Array2::from_shape_simple_fn((resamples, n), || rng.gen_range(0..n))
    }
}

impl Debug for BootstrapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapConfig")
            .field("resamples", &self.resamples)
            .field("parallel", &self.parallel)
            .finish_non_exhaustive()
    }
}

impl Display for BootstrapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Number of resamples: {}\n Using parallel computations: {}",
            self.resamples, self.parallel
        )
    }
}

/// This builder can be used to build and customize a `BootstrapConfig` structure. Without a seed
/// or a generator, the random source is seeded from the operating system.
pub struct BootstrapConfigBuilder {
    rng: Option<LeftOrRight<u64, StdRng>>,
    resamples: usize,
    parallel: bool,
}

impl BootstrapConfigBuilder {
    pub fn new() -> Self {
        Self {
            rng: None,
            resamples: DEFAULT_RESAMPLES,
            parallel: false,
        }
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.rng = Some(LeftOrRight::Left(seed));
        self
    }
    pub fn rng(mut self, rng: StdRng) -> Self {
        self.rng = Some(LeftOrRight::Right(rng));
        self
    }
    pub fn resamples(mut self, resamples: usize) -> Self {
        self.resamples = resamples;
        self
    }
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
    pub fn build(self) -> BootstrapConfig {
        let rng = match self.rng {
            Some(source) => source.either(StdRng::seed_from_u64, |rng| rng),
            None => StdRng::from_entropy(),
        };
        BootstrapConfig {
            rng,
            resamples: self.resamples,
            parallel: self.parallel,
        }
    }
}

impl Default for BootstrapConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl From<BootstrapConfigBuilder> for BootstrapConfig {
    fn from(value: BootstrapConfigBuilder) -> Self {
        value.build()
    }
}
