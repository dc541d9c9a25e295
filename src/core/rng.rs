//! Random number generation and the weighted pool shared by deck draws,
//! resource bonuses, zombie rewards and modifier salvage.
//!
//! ## Seeding
//!
//! A command picks its RNG through [`RngSource`], in this precedence:
//!
//! 1. an explicit seed supplied by the caller,
//! 2. a deterministic deck-draw seed (when configuration enables it),
//! 3. the wall clock.
//!
//! The deterministic seed is a 64-bit FNV-1a hash, see [`deck_draw_seed`].
//! Its exact byte layout is part of the replay contract.
//!
//! ```
//! use cardboard::core::{BoardRng, WeightedPool};
//!
//! let pool = WeightedPool::new(vec![("berry", 3), ("stone", 1), ("never", 0)]);
//! let mut rng = BoardRng::new(42);
//!
//! let drawn = pool.draw(&mut rng).unwrap();
//! assert_ne!(*drawn, "never");
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::ids::StackId;

/// Seeded RNG for one command.
#[derive(Clone, Debug)]
pub struct BoardRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl BoardRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Seed from the wall clock.
    #[must_use]
    pub fn from_clock() -> Self {
        let now = chrono::Utc::now();
        let seed = now
            .timestamp_nanos_opt()
            .unwrap_or_else(|| now.timestamp_micros()) as u64;
        Self::new(seed)
    }

    /// The seed this RNG started from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform integer in `0..upper`. `upper` must be positive.
    pub fn below(&mut self, upper: i64) -> i64 {
        self.inner.gen_range(0..upper)
    }

    /// Random boolean with given probability of true. Out-of-range
    /// probabilities are clamped.
    pub fn gen_bool(&mut self, probability: f64) -> bool {
        if probability.is_nan() || probability <= 0.0 {
            return false;
        }
        if probability >= 1.0 {
            return true;
        }
        self.inner.gen_bool(probability)
    }
}

/// Where a command gets its randomness from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RngSource {
    /// Caller-supplied seed. Always wins.
    Explicit(u64),
    /// Seed derived from `(deck, pack stack, Z counter)`.
    Deterministic {
        deck_id: String,
        stack_id: StackId,
        z: u64,
    },
    /// Wall-clock seed.
    Clock,
}

impl RngSource {
    /// Pick a source: an explicit seed overrides everything, otherwise the
    /// deterministic triple is used only if provided.
    #[must_use]
    pub fn resolve(explicit: Option<u64>, deterministic: Option<(String, StackId, u64)>) -> Self {
        match (explicit, deterministic) {
            (Some(seed), _) => RngSource::Explicit(seed),
            (None, Some((deck_id, stack_id, z))) => RngSource::Deterministic { deck_id, stack_id, z },
            (None, None) => RngSource::Clock,
        }
    }

    /// Build the RNG.
    #[must_use]
    pub fn into_rng(self) -> BoardRng {
        match self {
            RngSource::Explicit(seed) => BoardRng::new(seed),
            RngSource::Deterministic { deck_id, stack_id, z } => {
                BoardRng::new(deck_draw_seed(&deck_id, stack_id, z))
            }
            RngSource::Clock => BoardRng::from_clock(),
        }
    }
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(mut hash: u64, bytes: &[u8]) -> u64 {
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Deterministic deck-draw seed.
///
/// 64-bit FNV-1a over the bytes of
/// `deck_id ‖ 0x00 ‖ decimal(stack_id) ‖ 0x00 ‖ decimal(z)`.
#[must_use]
pub fn deck_draw_seed(deck_id: &str, stack_id: StackId, z: u64) -> u64 {
    let mut hash = fnv1a(FNV_OFFSET, deck_id.as_bytes());
    hash = fnv1a(hash, &[0]);
    hash = fnv1a(hash, stack_id.raw().to_string().as_bytes());
    hash = fnv1a(hash, &[0]);
    fnv1a(hash, z.to_string().as_bytes())
}

/// One weighted entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weighted<T> {
    pub item: T,
    pub weight: i64,
}

/// Integer-weighted choice. Entries with weight `<= 0` are never drawn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeightedPool<T> {
    entries: Vec<Weighted<T>>,
    total: i64,
}

impl<T> WeightedPool<T> {
    /// Build a pool from `(item, weight)` pairs.
    pub fn new(entries: impl IntoIterator<Item = (T, i64)>) -> Self {
        let entries: Vec<_> = entries
            .into_iter()
            .map(|(item, weight)| Weighted { item, weight })
            .collect();
        // saturates; entries past i64::MAX of cumulative weight become unreachable
        let total = entries
            .iter()
            .fold(0i64, |acc, e| acc.saturating_add(e.weight.max(0)));
        Self { entries, total }
    }

    /// Sum of eligible weights.
    #[must_use]
    pub fn total_weight(&self) -> i64 {
        self.total
    }

    /// True if nothing can be drawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total <= 0
    }

    /// Draw one entry proportionally to its weight.
    pub fn draw(&self, rng: &mut BoardRng) -> Option<&T> {
        if self.total <= 0 {
            return None;
        }

        let mut threshold = rng.below(self.total);
        for entry in self.entries.iter().filter(|e| e.weight > 0) {
            if threshold < entry.weight {
                return Some(&entry.item);
            }
            threshold -= entry.weight;
        }

        None
    }

    /// Draw `count` entries with replacement.
    pub fn draw_many(&self, rng: &mut BoardRng, count: usize) -> Vec<&T> {
        (0..count).filter_map(|_| self.draw(rng)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let mut rng1 = BoardRng::new(42);
        let mut rng2 = BoardRng::new(42);

        for _ in 0..100 {
            assert_eq!(rng1.below(1000), rng2.below(1000));
        }
    }

    #[test]
    fn test_zero_weights_never_drawn() {
        let pool = WeightedPool::new(vec![("a", 0), ("b", 5), ("c", -3)]);
        let mut rng = BoardRng::new(7);

        for _ in 0..200 {
            assert_eq!(pool.draw(&mut rng), Some(&"b"));
        }
    }

    #[test]
    fn test_huge_weights_saturate() {
        let pool = WeightedPool::new(vec![("a", i64::MAX), ("b", i64::MAX), ("c", 1)]);
        assert_eq!(pool.total_weight(), i64::MAX);

        let mut rng = BoardRng::new(3);
        for _ in 0..50 {
            assert_eq!(pool.draw(&mut rng), Some(&"a"));
        }
    }

    #[test]
    fn test_empty_pool() {
        let pool: WeightedPool<&str> = WeightedPool::new(vec![]);
        assert!(pool.is_empty());
        assert_eq!(pool.draw(&mut BoardRng::new(1)), None);

        let zeroes = WeightedPool::new(vec![("a", 0), ("b", 0)]);
        assert!(zeroes.is_empty());
    }

    #[test]
    fn test_weights_are_roughly_honored() {
        let pool = WeightedPool::new(vec![("heavy", 9), ("light", 1)]);
        let mut rng = BoardRng::new(99);

        let heavy = pool
            .draw_many(&mut rng, 2000)
            .into_iter()
            .filter(|&&item| item == "heavy")
            .count();

        assert!(heavy > 1600 && heavy < 1950, "heavy drawn {heavy} times");
    }

    #[test]
    fn test_deck_seed_is_stable() {
        let a = deck_draw_seed("starter", StackId(10), 3);
        let b = deck_draw_seed("starter", StackId(10), 3);
        assert_eq!(a, b);

        assert_ne!(a, deck_draw_seed("starter", StackId(10), 4));
        assert_ne!(a, deck_draw_seed("starter", StackId(11), 3));
        assert_ne!(a, deck_draw_seed("other", StackId(10), 3));
    }

    #[test]
    fn test_fnv_reference_vector() {
        // FNV-1a 64 of "a"
        assert_eq!(fnv1a(FNV_OFFSET, b"a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn test_explicit_seed_overrides() {
        let source = RngSource::resolve(Some(5), Some(("deck".into(), StackId(1), 2)));
        assert_eq!(source, RngSource::Explicit(5));

        let source = RngSource::resolve(None, Some(("deck".into(), StackId(1), 2)));
        assert!(matches!(source, RngSource::Deterministic { .. }));

        assert_eq!(RngSource::resolve(None, None), RngSource::Clock);
    }

    #[test]
    fn test_gen_bool_clamps() {
        let mut rng = BoardRng::new(3);
        assert!(!rng.gen_bool(0.0));
        assert!(!rng.gen_bool(-1.0));
        assert!(rng.gen_bool(1.0));
        assert!(rng.gen_bool(2.5));
    }
}
