//! Randomized generation of synthetic book data and unbiased ISBN sampling.

use std::collections::HashSet;

use rand::distr::{Alphanumeric, Distribution};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use bookstore_types::{BookStoreError, Isbn, Result, StockBook};

/// Largest ISBN the generator hands out.
const MAX_ISBN: Isbn = 99_999_999;

/// Length of generated title and author tokens.
const TOKEN_LEN: usize = 12;

/// Generates synthetic stock records and samples ISBN sets.
///
/// Each generator owns its RNG, so instances can be used from concurrent
/// workers without any shared state. Seeded construction makes the output
/// reproducible in tests.
#[derive(Debug)]
pub struct BookSetGenerator {
    rng: SmallRng,
    /// Running count of generated records. Bookkeeping only.
    generated: u64,
}

impl BookSetGenerator {
    /// Creates a generator with a random seed.
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Creates a generator with a fixed seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            generated: 0,
        }
    }

    /// Samples `count` distinct ISBNs uniformly from `universe`, without
    /// replacement.
    ///
    /// Fails with an invalid-argument error when `count` exceeds the size of
    /// the universe. The caller's set is never mutated.
    pub fn sample_isbns(&mut self, universe: &HashSet<Isbn>, count: usize) -> Result<HashSet<Isbn>> {
        if count > universe.len() {
            return Err(BookStoreError::invalid_argument(
                "requested sample size exceeds universe size",
            ));
        }

        // Draw over a private pool that shrinks with every pick, so the
        // selection stays uniform and terminates in exactly `count` steps.
        let mut pool: Vec<Isbn> = universe.iter().copied().collect();
        let mut selected = HashSet::with_capacity(count);
        for _ in 0..count {
            let idx = self.rng.random_range(0..pool.len());
            selected.insert(pool.swap_remove(idx));
        }
        Ok(selected)
    }

    /// Generates exactly `count` synthetic stock records.
    ///
    /// ISBNs are drawn uniformly from a large range; collisions across
    /// records are accepted test-data noise and not deduplicated.
    pub fn next_stock_books(&mut self, count: usize) -> Vec<StockBook> {
        (0..count).map(|_| self.next_stock_book()).collect()
    }

    fn next_stock_book(&mut self) -> StockBook {
        self.generated += 1;
        StockBook {
            isbn: self.rng.random_range(1..=MAX_ISBN),
            title: self.token(),
            author: self.token(),
            price: self.rng.random_range(1.0..100.0),
            num_copies: self.rng.random_range(1..=10),
            num_sale_misses: self.rng.random_range(0..100),
            num_times_rated: self.rng.random_range(0..1000),
            total_rating: self.rng.random_range(0..5000),
            editor_pick: self.rng.random_bool(0.5),
        }
    }

    fn token(&mut self) -> String {
        Alphanumeric
            .sample_iter(&mut self.rng)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect()
    }

    /// Number of synthetic records this generator has produced so far.
    pub fn generated(&self) -> u64 {
        self.generated
    }
}

impl Default for BookSetGenerator {
    fn default() -> Self {
        Self::new()
    }
}
