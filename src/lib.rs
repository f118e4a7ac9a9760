//! `jobsample`: streaming reservoir sampling for job-posting corpora.
//!
//! Draw a fixed-size random sample from a record stream of unknown length in
//! one pass, optionally biased per category, without holding the stream in
//! memory.
//!
//! Exposed modules:
//! - `source`: the re-openable record source abstraction.
//! - `filter`: predicate filtering over a source.
//! - `weights`: category weight tables and uniform/weighted selection.
//! - `reservoir`: uniform (Algorithm L) and weighted (A-Res) reservoirs.
//! - `sampler`: the job sampler, one independent sample per pass.
//! - `config`: serializable sampler settings.
//!
//! ```
//! use jobsample::{JobSampler, RecordFilter, WeightTable};
//! use rand::SeedableRng;
//!
//! let corpus: Vec<(String, u32)> = (0..1000).map(|i| (format!("{}", 11 + 2 * (i % 4)), i)).collect();
//! let filtered = RecordFilter::pass_through(corpus).with(|(soc, _)| soc == "11" || soc == "13");
//! let weights = WeightTable::try_from_iter([("11", 1.0), ("13", 2.0)])?;
//! let sampler = JobSampler::new(filtered, 100)?.weighted(weights, |(soc, _)| soc.clone());
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//! let sample = sampler.sample_with_rng(&mut rng)?;
//! assert_eq!(sample.len(), 100);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod filter;
pub mod reservoir;
pub mod sampler;
pub mod source;
pub mod weights;

mod error;

pub use config::SamplerConfig;
pub use error::{ConfigError, SampleError};
pub use filter::{Filtered, Predicate, RecordFilter};
pub use reservoir::{UniformReservoir, WeightError, WeightedReservoir};
pub use sampler::{JobSampler, Pass, PassStats, Passes};
pub use source::{FnSource, RecordSource};
pub use weights::{WeightTable, Weighting, DEFAULT_WEIGHT};
