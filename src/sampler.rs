//! Job sampling.
//!
//! [`JobSampler`] draws a sample of `k` records from a [`RecordSource`] in a
//! single pass, uniformly or weighted by category. Every pass reopens the
//! source and starts from an empty reservoir, so passes are independent; the
//! sampler itself holds only its configuration.
//!
//! Output order is reservoir order, not source order.
//!
//! Notes:
//! - `*_with_rng` entrypoints take the random source explicitly.
//! - [`JobSampler::sample`] reseeds a fresh `StdRng` per pass when a seed is
//!   configured, so seeded passes over the same source are identical.
//! - A pass is driven synchronously by the caller. Iterating one sampler from
//!   several consumers simply runs several independent passes.

use std::fmt;
use std::vec;

use rand::prelude::*;
use tracing::debug;

use crate::config::SamplerConfig;
use crate::error::{ConfigError, SampleError};
use crate::reservoir::{UniformReservoir, WeightError, WeightedReservoir};
use crate::source::RecordSource;
use crate::weights::{WeightTable, Weighting};

/// Counters for one completed pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Records pulled from the source.
    pub seen: usize,
    /// Records in the final sample, `min(k, seen)`.
    pub kept: usize,
}

/// Reservoir sampler over a re-openable record source.
pub struct JobSampler<'k, S: RecordSource> {
    source: S,
    k: usize,
    weighting: Weighting<'k, S::Record>,
    seed: Option<u64>,
}

impl<'k, S: RecordSource> JobSampler<'k, S> {
    /// Uniform sampler of `k` records; `k == 0` is rejected.
    pub fn new(source: S, k: usize) -> Result<Self, ConfigError> {
        if k == 0 {
            return Err(ConfigError::ZeroSampleSize);
        }
        Ok(Self {
            source,
            k,
            weighting: Weighting::Uniform,
            seed: None,
        })
    }

    /// Build from settings. Fails if `config` carries weights, since there is
    /// no key function to categorize records; use
    /// [`from_config_keyed`](Self::from_config_keyed) for that.
    pub fn from_config(source: S, config: SamplerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        if config.weights.is_some() {
            return Err(ConfigError::MissingKeyFunction);
        }
        let sampler = Self::new(source, config.k)?;
        Ok(match config.seed {
            Some(seed) => sampler.with_seed(seed),
            None => sampler,
        })
    }

    /// Build from settings, categorizing records with `key` when the config
    /// carries weights. Without weights the key is unused.
    pub fn from_config_keyed<F>(
        source: S,
        config: SamplerConfig,
        key: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&S::Record) -> String + 'k,
    {
        config.validate()?;
        let mut sampler = Self::new(source, config.k)?;
        if let Some(table) = config.weights {
            sampler = sampler.weighted(table, key);
        }
        if let Some(seed) = config.seed {
            sampler = sampler.with_seed(seed);
        }
        Ok(sampler)
    }

    /// Weight records by `table[key(record)]` (absent categories weigh 1).
    pub fn weighted<F>(self, table: WeightTable, key: F) -> Self
    where
        F: Fn(&S::Record) -> String + 'k,
    {
        self.with_weighting(Weighting::weighted(table, key))
    }

    /// Replace the weighting scheme.
    pub fn with_weighting(mut self, weighting: Weighting<'k, S::Record>) -> Self {
        self.weighting = weighting;
        self
    }

    /// Make [`sample`](Self::sample) deterministic.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Target sample size.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Seed used by [`sample`](Self::sample), if any.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Current weighting scheme.
    pub fn weighting(&self) -> &Weighting<'k, S::Record> {
        &self.weighting
    }

    /// The wrapped source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run one pass using the configured seed, or the thread RNG if unseeded.
    pub fn sample(&self) -> Result<Vec<S::Record>, SampleError<S::Error>> {
        let mut rng = self.pass_rng();
        self.sample_with_rng(&mut rng)
    }

    /// Run one pass with a caller-supplied RNG.
    pub fn sample_with_rng<G: Rng + ?Sized>(
        &self,
        rng: &mut G,
    ) -> Result<Vec<S::Record>, SampleError<S::Error>> {
        self.sample_with_stats(rng).map(|(sample, _)| sample)
    }

    /// Run one pass, also reporting how many records the source produced.
    pub fn sample_with_stats<G: Rng + ?Sized>(
        &self,
        rng: &mut G,
    ) -> Result<(Vec<S::Record>, PassStats), SampleError<S::Error>> {
        let (sample, seen) = match &self.weighting {
            Weighting::Uniform => {
                let mut reservoir = UniformReservoir::new(self.k)?;
                for record in self.source.records() {
                    reservoir.offer_with_rng(record.map_err(SampleError::Source)?, rng);
                }
                let seen = reservoir.seen();
                (reservoir.into_samples(), seen)
            }
            Weighting::Weighted { table, key } => {
                let mut reservoir = WeightedReservoir::new(self.k)?;
                for record in self.source.records() {
                    let record = record.map_err(SampleError::Source)?;
                    let category = key(&record);
                    let weight = table.weight_of(&category);
                    reservoir
                        .offer_with_rng(record, weight, rng)
                        .map_err(|e| weight_error(category, e))?;
                }
                let seen = reservoir.seen();
                (reservoir.into_samples(), seen)
            }
        };

        let stats = PassStats {
            seen,
            kept: sample.len(),
        };
        debug!(
            k = self.k,
            seen = stats.seen,
            kept = stats.kept,
            weighted = !self.weighting.is_uniform(),
            "sampling pass complete"
        );
        Ok((sample, stats))
    }

    /// A lazy pass: nothing is read from the source until the first `next()`.
    pub fn pass_with_rng<G: Rng>(&self, rng: G) -> Pass<'_, 'k, S, G> {
        Pass {
            sampler: self,
            rng,
            state: PassState::Uninitialized,
        }
    }

    /// A lazy pass using the configured seed or the thread RNG.
    pub fn pass(&self) -> Pass<'_, 'k, S, Box<dyn RngCore>> {
        self.pass_with_rng(self.pass_rng())
    }

    /// Unbounded sequence of independent passes drawing from one RNG stream.
    pub fn passes_with_rng<G: Rng>(&self, rng: G) -> Passes<'_, 'k, S, G> {
        Passes { sampler: self, rng }
    }

    fn pass_rng(&self) -> Box<dyn RngCore> {
        match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        }
    }
}

fn weight_error<E>(category: String, err: WeightError) -> SampleError<E> {
    let config = match err {
        WeightError::NonFinite(weight) => ConfigError::NonFiniteWeight { category, weight },
        WeightError::NonPositive(weight) => ConfigError::NonPositiveWeight { category, weight },
    };
    SampleError::Config(config)
}

impl<S: RecordSource + fmt::Debug> fmt::Debug for JobSampler<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobSampler")
            .field("source", &self.source)
            .field("k", &self.k)
            .field("weighting", &self.weighting)
            .field("seed", &self.seed)
            .finish()
    }
}

impl<'s, 'k, S: RecordSource> IntoIterator for &'s JobSampler<'k, S> {
    type Item = Result<S::Record, SampleError<S::Error>>;
    type IntoIter = Pass<'s, 'k, S, Box<dyn RngCore>>;

    fn into_iter(self) -> Self::IntoIter {
        self.pass()
    }
}

enum PassState<R> {
    Uninitialized,
    Exhausted(vec::IntoIter<R>),
    Done,
}

/// One sampling pass, yielding the sampled records.
///
/// The whole source is consumed (the reservoir is built) on the first call to
/// `next()`. If that fails, the error is yielded once and the pass ends.
/// Dropping a pass early needs no cleanup.
pub struct Pass<'s, 'k, S: RecordSource, G> {
    sampler: &'s JobSampler<'k, S>,
    rng: G,
    state: PassState<S::Record>,
}

impl<S: RecordSource, G: Rng> Iterator for Pass<'_, '_, S, G> {
    type Item = Result<S::Record, SampleError<S::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        if let PassState::Uninitialized = self.state {
            match self.sampler.sample_with_rng(&mut self.rng) {
                Ok(sample) => self.state = PassState::Exhausted(sample.into_iter()),
                Err(e) => {
                    self.state = PassState::Done;
                    return Some(Err(e));
                }
            }
        }

        match &mut self.state {
            PassState::Exhausted(held) => match held.next() {
                Some(record) => Some(Ok(record)),
                None => {
                    self.state = PassState::Done;
                    None
                }
            },
            PassState::Uninitialized | PassState::Done => None,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.state {
            PassState::Uninitialized => (0, Some(self.sampler.k)),
            PassState::Exhausted(held) => held.size_hint(),
            PassState::Done => (0, Some(0)),
        }
    }
}

/// Repeated independent passes; never ends on its own.
pub struct Passes<'s, 'k, S: RecordSource, G> {
    sampler: &'s JobSampler<'k, S>,
    rng: G,
}

impl<S: RecordSource, G: Rng> Iterator for Passes<'_, '_, S, G> {
    type Item = Result<Vec<S::Record>, SampleError<S::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.sampler.sample_with_rng(&mut self.rng))
    }
}
