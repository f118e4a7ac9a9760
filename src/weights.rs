//! Category weights.
//!
//! A [`WeightTable`] maps category keys to positive relative weights; keys not
//! in the table weigh 1. [`Weighting`] is the sampler-side choice between plain
//! uniform sampling and weighted sampling through a key function.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Weight applied to categories missing from a table.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Category key -> relative weight. Every stored weight is finite and > 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "HashMap<String, f64>", into = "HashMap<String, f64>")]
pub struct WeightTable {
    weights: HashMap<String, f64>,
}

impl WeightTable {
    /// An empty table (every category weighs [`DEFAULT_WEIGHT`]).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table, rejecting the first invalid weight.
    pub fn try_from_iter<I, K>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        let mut table = Self::new();
        for (category, weight) in entries {
            table.insert(category, weight)?;
        }
        Ok(table)
    }

    /// Set the weight of `category`, returning the previous weight if any.
    pub fn insert(
        &mut self,
        category: impl Into<String>,
        weight: f64,
    ) -> Result<Option<f64>, ConfigError> {
        let category = category.into();
        check_weight(&category, weight)?;
        Ok(self.weights.insert(category, weight))
    }

    /// Weight of `category`, or [`DEFAULT_WEIGHT`] when absent.
    pub fn weight_of(&self, category: &str) -> f64 {
        self.weights
            .get(category)
            .copied()
            .unwrap_or(DEFAULT_WEIGHT)
    }

    /// Explicit entry for `category`, if one exists.
    pub fn get(&self, category: &str) -> Option<f64> {
        self.weights.get(category).copied()
    }

    /// Number of explicit entries.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// True when every category weighs [`DEFAULT_WEIGHT`].
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Explicit entries, in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(k, &w)| (k.as_str(), w))
    }
}

impl TryFrom<HashMap<String, f64>> for WeightTable {
    type Error = ConfigError;

    fn try_from(weights: HashMap<String, f64>) -> Result<Self, Self::Error> {
        for (category, &weight) in &weights {
            check_weight(category, weight)?;
        }
        Ok(Self { weights })
    }
}

impl From<WeightTable> for HashMap<String, f64> {
    fn from(table: WeightTable) -> Self {
        table.weights
    }
}

/// Validate one weight for `category`.
pub(crate) fn check_weight(category: &str, weight: f64) -> Result<(), ConfigError> {
    if !weight.is_finite() {
        return Err(ConfigError::NonFiniteWeight {
            category: category.to_owned(),
            weight,
        });
    }
    if weight <= 0.0 {
        return Err(ConfigError::NonPositiveWeight {
            category: category.to_owned(),
            weight,
        });
    }
    Ok(())
}

/// Maps a record to its category key.
pub type KeyFn<'k, R> = Box<dyn Fn(&R) -> String + 'k>;

/// How records are weighted during a pass.
pub enum Weighting<'k, R> {
    /// Every record is equally likely to be kept.
    Uniform,
    /// Records weigh `table.weight_of(key(record))`.
    Weighted { table: WeightTable, key: KeyFn<'k, R> },
}

impl<'k, R> Weighting<'k, R> {
    /// Weighted sampling with `key` deriving each record's category.
    pub fn weighted<F>(table: WeightTable, key: F) -> Self
    where
        F: Fn(&R) -> String + 'k,
    {
        Self::Weighted {
            table,
            key: Box::new(key),
        }
    }

    /// True for [`Weighting::Uniform`].
    pub fn is_uniform(&self) -> bool {
        matches!(self, Self::Uniform)
    }
}

impl<R> Default for Weighting<'_, R> {
    fn default() -> Self {
        Self::Uniform
    }
}

impl<R> fmt::Debug for Weighting<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uniform => f.write_str("Uniform"),
            Self::Weighted { table, .. } => f
                .debug_struct("Weighted")
                .field("table", table)
                .finish_non_exhaustive(),
        }
    }
}
