//! Reservoirs.
//!
//! Fixed-capacity working sets that keep a random sample of size `k` from a
//! stream of unknown length, in one pass and O(k) memory.
//!
//! - [`UniformReservoir`]: **Algorithm L** (Li, 1994). Instead of drawing a
//!   random number per item, it computes how many items to skip before the
//!   next replacement, so the RNG is touched O(k(1 + log(N/k))) times.
//! - [`WeightedReservoir`]: **A-Res** (Efraimidis & Spirakis, 2006). Each item
//!   with weight `w` gets the key `u^(1/w)`, `u ~ Uniform(0,1)`, and the `k`
//!   largest keys survive. Keys live in a min-heap, so an offer costs O(log k).
//!
//! ## References
//!
//! - Vitter (1985): reservoir sampling "Algorithm R".
//! - Li (1994): reservoir sampling "Algorithm L" (skip-based).
//! - Efraimidis & Spirakis (2006): weighted random sampling with a reservoir.
//!
//! Neither reservoir preserves stream order in its output.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rand::prelude::*;
use thiserror::Error;
use tracing::trace;

use crate::error::ConfigError;

/// A uniform reservoir of capacity `k` (Algorithm L).
#[derive(Debug, Clone)]
pub struct UniformReservoir<T> {
    k: usize,
    seen: usize,
    samples: Vec<T>,
    skip: usize,
    w: f64,
}

impl<T> UniformReservoir<T> {
    /// Create an empty reservoir holding at most `k` items.
    pub fn new(k: usize) -> Result<Self, ConfigError> {
        if k == 0 {
            return Err(ConfigError::ZeroSampleSize);
        }
        Ok(Self {
            k,
            seen: 0,
            samples: Vec::with_capacity(k),
            skip: 0,
            w: 0.0,
        })
    }

    /// Offer the next item of the stream.
    #[inline]
    pub fn offer_with_rng<R: Rng + ?Sized>(&mut self, item: T, rng: &mut R) {
        self.seen += 1;

        if self.samples.len() < self.k {
            self.samples.push(item);
            if self.samples.len() == self.k {
                self.w = (open_unit(rng).ln() / self.k as f64).exp();
                self.next_skip(rng);
            }
            return;
        }

        if self.skip > 0 {
            self.skip -= 1;
            return;
        }

        let slot = rng.random_range(0..self.k);
        self.samples[slot] = item;
        trace!(slot, seen = self.seen, "uniform reservoir replacement");

        self.w *= (open_unit(rng).ln() / self.k as f64).exp();
        self.next_skip(rng);
    }

    // S = floor(ln(U) / ln(1 - W))
    fn next_skip<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let denom = (1.0 - self.w).max(1e-10).ln();
        let skip = (open_unit(rng).ln() / denom).floor();
        self.skip = if skip.is_finite() && skip > 0.0 {
            skip as usize
        } else {
            0
        };
    }

    /// Current sample, at most `k` items.
    pub fn samples(&self) -> &[T] {
        &self.samples
    }

    /// Consume the reservoir, returning the held items.
    pub fn into_samples(self) -> Vec<T> {
        self.samples
    }

    /// Items offered so far.
    pub fn seen(&self) -> usize {
        self.seen
    }

    /// Maximum number of held items, `k`.
    pub fn capacity(&self) -> usize {
        self.k
    }

    /// Number of items currently held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True before the first item is offered.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Drop all held items and forget the stream position.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.seen = 0;
        self.skip = 0;
        self.w = 0.0;
    }
}

/// An item weight the weighted reservoir cannot use.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeightError {
    #[error("weight must be finite (got {0})")]
    NonFinite(f64),
    #[error("weight must be > 0 (got {0})")]
    NonPositive(f64),
}

#[derive(Debug, Clone)]
struct Keyed<T> {
    key: f64,
    item: T,
}

// Reversed so the std max-heap pops the smallest key first.
impl<T> Ord for Keyed<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other.key.total_cmp(&self.key)
    }
}

impl<T> PartialOrd for Keyed<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> PartialEq for Keyed<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key.total_cmp(&other.key) == Ordering::Equal
    }
}

impl<T> Eq for Keyed<T> {}

/// A weighted reservoir of capacity `k` (A-Res).
///
/// A new item evicts the current minimum only when its key is strictly
/// greater; on a tie the held item stays.
#[derive(Debug, Clone)]
pub struct WeightedReservoir<T> {
    k: usize,
    seen: usize,
    heap: BinaryHeap<Keyed<T>>,
}

impl<T> WeightedReservoir<T> {
    /// Create an empty reservoir holding at most `k` items.
    pub fn new(k: usize) -> Result<Self, ConfigError> {
        if k == 0 {
            return Err(ConfigError::ZeroSampleSize);
        }
        Ok(Self {
            k,
            seen: 0,
            heap: BinaryHeap::with_capacity(k),
        })
    }

    /// Offer the next item of the stream with its relative weight.
    #[inline]
    pub fn offer_with_rng<R: Rng + ?Sized>(
        &mut self,
        item: T,
        weight: f64,
        rng: &mut R,
    ) -> Result<(), WeightError> {
        if !weight.is_finite() {
            return Err(WeightError::NonFinite(weight));
        }
        if weight <= 0.0 {
            return Err(WeightError::NonPositive(weight));
        }
        self.seen += 1;

        let key = (open_unit(rng).ln() / weight).exp();

        if self.heap.len() < self.k {
            self.heap.push(Keyed { key, item });
            return Ok(());
        }

        if let Some(mut min) = self.heap.peek_mut() {
            if key > min.key {
                trace!(evicted = min.key, key, seen = self.seen, "weighted reservoir eviction");
                *min = Keyed { key, item };
            }
        }
        Ok(())
    }

    /// Smallest key currently held (the eviction threshold once full).
    pub fn threshold(&self) -> Option<f64> {
        self.heap.peek().map(|e| e.key)
    }

    /// Keys of the held items, for diagnostics.
    pub fn keys(&self) -> impl Iterator<Item = f64> + '_ {
        self.heap.iter().map(|e| e.key)
    }

    /// Held items, in heap order.
    pub fn samples(&self) -> impl Iterator<Item = &T> {
        self.heap.iter().map(|e| &e.item)
    }

    /// Consume the reservoir, returning the held items.
    pub fn into_samples(self) -> Vec<T> {
        self.heap.into_vec().into_iter().map(|e| e.item).collect()
    }

    /// Items accepted for consideration so far.
    pub fn seen(&self) -> usize {
        self.seen
    }

    /// Maximum number of held items, `k`.
    pub fn capacity(&self) -> usize {
        self.k
    }

    /// Number of items currently held.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// True before the first item is offered.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drop all held items and reset the seen count.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.seen = 0;
    }
}

/// Uniform draw from the open interval (0, 1), so `ln` stays finite.
#[inline]
fn open_unit<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.random::<f64>().max(f64::MIN_POSITIVE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn zero_capacity_is_rejected() {
        assert_eq!(
            UniformReservoir::<u8>::new(0).unwrap_err(),
            ConfigError::ZeroSampleSize
        );
        assert_eq!(
            WeightedReservoir::<u8>::new(0).unwrap_err(),
            ConfigError::ZeroSampleSize
        );
    }

    #[test]
    fn uniform_keeps_k_items() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut r = UniformReservoir::new(5).unwrap();
        for i in 0..100 {
            r.offer_with_rng(i, &mut rng);
        }
        assert_eq!(r.len(), 5);
        assert_eq!(r.seen(), 100);
        assert_eq!(r.capacity(), 5);
    }

    #[test]
    fn uniform_short_stream_keeps_everything_in_order() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut r = UniformReservoir::new(10).unwrap();
        for i in 0..3 {
            r.offer_with_rng(i, &mut rng);
        }
        assert_eq!(r.samples(), &[0, 1, 2]);
    }

    #[test]
    fn uniform_distribution_chi_squared() {
        // Deterministic chi-squared smoke test: catches a biased slot choice or
        // broken skip math without being flaky.
        let n = 100;
        let k = 10;
        let trials = 10_000;
        let mut counts = vec![0; n];

        for t in 0..trials {
            let mut rng = ChaCha8Rng::seed_from_u64(t as u64);
            let mut r = UniformReservoir::new(k).unwrap();
            for i in 0..n {
                r.offer_with_rng(i, &mut rng);
            }
            for &item in r.samples() {
                counts[item] += 1;
            }
        }

        let expected = trials as f64 * (k as f64 / n as f64);
        let chi2: f64 = counts
            .iter()
            .map(|&c| {
                let diff = c as f64 - expected;
                (diff * diff) / expected
            })
            .sum();

        // df = 99; E[chi2] ~ df, Var ~ 2*df.
        assert!(
            chi2 < 250.0,
            "chi2 too large (chi2={chi2:.2}, expected~{}). counts={counts:?}",
            n - 1
        );
    }

    #[test]
    fn uniform_clear_resets() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut r = UniformReservoir::new(2).unwrap();
        for i in 0..10 {
            r.offer_with_rng(i, &mut rng);
        }
        r.clear();
        assert!(r.is_empty());
        assert_eq!(r.seen(), 0);
    }

    #[test]
    fn weighted_keeps_k_items() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut r = WeightedReservoir::new(5).unwrap();
        for i in 0..100 {
            r.offer_with_rng(i, 1.0, &mut rng).unwrap();
        }
        assert_eq!(r.len(), 5);
        assert_eq!(r.seen(), 100);
        assert_eq!(r.keys().count(), 5);
    }

    #[test]
    fn weighted_rejects_bad_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut r = WeightedReservoir::new(2).unwrap();
        assert_eq!(
            r.offer_with_rng(1, 0.0, &mut rng),
            Err(WeightError::NonPositive(0.0))
        );
        assert!(matches!(
            r.offer_with_rng(2, f64::NAN, &mut rng),
            Err(WeightError::NonFinite(w)) if w.is_nan()
        ));
        assert!(r.is_empty());
        assert_eq!(r.seen(), 0);
    }

    /// Returns the same word on every draw, so every offer gets the same key.
    struct ConstRng(u64);

    impl RngCore for ConstRng {
        fn next_u32(&mut self) -> u32 {
            (self.0 >> 32) as u32
        }

        fn next_u64(&mut self) -> u64 {
            self.0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for (i, b) in dest.iter_mut().enumerate() {
                *b = self.0.to_le_bytes()[i % 8];
            }
        }
    }

    #[test]
    fn weighted_equal_keys_keep_incumbents() {
        let mut rng = ConstRng(1 << 63);
        let mut r = WeightedReservoir::new(3).unwrap();
        for i in 0..10 {
            r.offer_with_rng(i, 1.0, &mut rng).unwrap();
        }
        let mut held = r.into_samples();
        held.sort();
        assert_eq!(held, vec![0, 1, 2]);
    }

    #[test]
    fn weighted_clear_resets() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut r = WeightedReservoir::new(2).unwrap();
        for i in 0..10 {
            r.offer_with_rng(i, 2.0, &mut rng).unwrap();
        }
        r.clear();
        assert!(r.is_empty());
        assert_eq!(r.seen(), 0);
        assert_eq!(r.threshold(), None);

        r.offer_with_rng(42, 1.0, &mut rng).unwrap();
        assert_eq!(r.into_samples(), vec![42]);
    }

    #[test]
    fn weighted_threshold_is_min_key() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut r = WeightedReservoir::new(4).unwrap();
        for i in 0..50 {
            r.offer_with_rng(i, 1.0 + (i % 3) as f64, &mut rng).unwrap();
        }
        let min = r.keys().fold(f64::INFINITY, f64::min);
        assert_eq!(r.threshold(), Some(min));
        assert!(r.keys().all(|k| (0.0..=1.0).contains(&k)));
    }

    #[test]
    fn weighted_biases_toward_large_weights() {
        let mut counts = [0usize; 3];
        for t in 0..2_000 {
            let mut rng = ChaCha8Rng::seed_from_u64(t);
            let mut r = WeightedReservoir::new(1).unwrap();
            r.offer_with_rng(0, 100.0, &mut rng).unwrap();
            r.offer_with_rng(1, 1.0, &mut rng).unwrap();
            r.offer_with_rng(2, 1.0, &mut rng).unwrap();
            counts[r.into_samples()[0]] += 1;
        }
        assert!(counts[0] > counts[1]);
        assert!(counts[0] > counts[2]);
    }

    #[test]
    fn weighted_unit_weights_are_uniform() {
        let n = 50;
        let k = 5;
        let trials = 10_000;
        let mut counts = vec![0; n];

        for t in 0..trials {
            let mut rng = ChaCha8Rng::seed_from_u64(t as u64);
            let mut r = WeightedReservoir::new(k).unwrap();
            for i in 0..n {
                r.offer_with_rng(i, 1.0, &mut rng).unwrap();
            }
            for &item in r.samples() {
                counts[item] += 1;
            }
        }

        let expected = trials as f64 * (k as f64 / n as f64);
        let chi2: f64 = counts
            .iter()
            .map(|&c| {
                let diff = c as f64 - expected;
                (diff * diff) / expected
            })
            .sum();

        // df = 49.
        assert!(chi2 < 130.0, "chi2 too large (chi2={chi2:.2}). counts={counts:?}");
    }
}
