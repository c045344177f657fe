//! Simulated bookstore clients and their interaction mix.
//!
//! A [`Worker`] is one simulated client. It runs a warmup phase whose
//! outcomes are discarded, then a measured phase in which every iteration
//! picks one of three interaction kinds under the configured probability
//! distribution and records success and timing. Collaborator failures mark
//! the iteration unsuccessful and the loop continues; nothing short of a
//! panic aborts a worker.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use bookstore_service::{BookStore, StockManager};
use bookstore_types::{BookCopy, BookStoreError, Isbn, Result};

use crate::config::WorkloadParams;
use crate::generator::BookSetGenerator;

/// Immutable bundle of workload parameters and collaborator handles.
///
/// One configuration is built per [`Worker`]; all configurations of a
/// benchmark point share the same collaborators. The handles are shared,
/// not owned: the driver creates and tears the collaborators down.
#[derive(Debug, Clone)]
pub struct WorkloadConfiguration {
    params: WorkloadParams,
    book_store: Arc<dyn BookStore>,
    stock_manager: Arc<dyn StockManager>,
}

impl WorkloadConfiguration {
    /// Validates the parameters and creates the configuration.
    ///
    /// The interaction percentages must be non-negative and must not sum to
    /// more than 100; the remainder up to 100 drives customer interactions.
    pub fn new(
        params: WorkloadParams,
        book_store: Arc<dyn BookStore>,
        stock_manager: Arc<dyn StockManager>,
    ) -> Result<Self> {
        if params.percent_rare_stock_manager < 0.0
            || params.percent_frequent_stock_manager < 0.0
        {
            return Err(BookStoreError::invalid_argument(
                "interaction percentages must be non-negative",
            ));
        }
        if params.percent_rare_stock_manager + params.percent_frequent_stock_manager > 100.0 {
            return Err(BookStoreError::invalid_argument(
                "interaction percentages must not sum to more than 100",
            ));
        }
        Ok(Self {
            params,
            book_store,
            stock_manager,
        })
    }
}

/// The measurement record a [`Worker`] produces once its measured phase
/// completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerRunResult {
    /// Measured interactions that completed without error.
    pub successful_interactions: u64,
    /// Wall time of the measured phase, in nanoseconds.
    pub elapsed_ns: u128,
    /// Measured interactions attempted.
    pub total_runs: u64,
    /// Customer interactions that completed without error.
    pub successful_customer_interactions: u64,
    /// Customer interactions attempted.
    pub total_customer_interactions: u64,
}

/// A single simulated client.
///
/// Each worker owns its RNG and its [`BookSetGenerator`], so concurrent
/// workers never contend on shared random state.
#[derive(Debug)]
pub struct Worker {
    config: WorkloadConfiguration,
    generator: BookSetGenerator,
    rng: SmallRng,
    total_customer_interactions: u64,
    successful_customer_interactions: u64,
}

impl Worker {
    /// Creates a worker with a randomly seeded RNG.
    pub fn new(config: WorkloadConfiguration) -> Self {
        Self {
            config,
            generator: BookSetGenerator::new(),
            rng: SmallRng::seed_from_u64(rand::random()),
            total_customer_interactions: 0,
            successful_customer_interactions: 0,
        }
    }

    /// Runs the warmup phase followed by the measured phase and reports the
    /// measurement.
    pub async fn run(mut self) -> WorkerRunResult {
        for _ in 0..self.config.params.warmup_runs {
            let roll = self.rng.random_range(0.0f32..100.0);
            self.run_interaction(roll).await;
        }

        self.total_customer_interactions = 0;
        self.successful_customer_interactions = 0;
        let mut successful_interactions = 0;

        let total_runs = self.config.params.measured_runs;
        let start = Instant::now();
        for _ in 0..total_runs {
            let roll = self.rng.random_range(0.0f32..100.0);
            if self.run_interaction(roll).await {
                successful_interactions += 1;
            }
        }
        let elapsed_ns = start.elapsed().as_nanos();

        WorkerRunResult {
            successful_interactions,
            elapsed_ns,
            total_runs,
            successful_customer_interactions: self.successful_customer_interactions,
            total_customer_interactions: self.total_customer_interactions,
        }
    }

    /// Executes the interaction picked by the given roll in `[0, 100)` and
    /// returns whether it succeeded.
    async fn run_interaction(&mut self, roll: f32) -> bool {
        let rare = self.config.params.percent_rare_stock_manager;
        let frequent = self.config.params.percent_frequent_stock_manager;

        let outcome = if roll < rare {
            self.run_rare_stock_manager().await
        } else if roll < rare + frequent {
            self.run_frequent_stock_manager().await
        } else {
            self.total_customer_interactions += 1;
            let outcome = self.run_customer().await;
            if outcome.is_ok() {
                self.successful_customer_interactions += 1;
            }
            outcome
        };

        match outcome {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!("interaction failed: {err}");
                false
            }
        }
    }

    /// The new-stock-acquisition interaction: offer the store a batch of
    /// fresh synthetic books it does not already carry.
    async fn run_rare_stock_manager(&mut self) -> Result<()> {
        let listing = self.config.stock_manager.get_books().await?;
        let candidates = self
            .generator
            .next_stock_books(self.config.params.num_books_to_add);

        // Candidates are filtered against the listing fetched above, not
        // against each other; a batch may still carry duplicate ISBNs.
        let books_to_add: Vec<_> = candidates
            .into_iter()
            .filter(|candidate| !listing.iter().any(|book| book.isbn == candidate.isbn))
            .collect();

        // An empty batch, when every candidate collided, is a legal no-op.
        self.config.stock_manager.add_books(&books_to_add).await
    }

    /// The replenishment interaction: top up the books with the fewest
    /// copies in stock.
    async fn run_frequent_stock_manager(&mut self) -> Result<()> {
        let mut listing = self.config.stock_manager.get_books().await?;

        let count = self.config.params.num_books_with_least_copies;
        if count > listing.len() {
            return Err(BookStoreError::invalid_argument(
                "replenishment count exceeds the stock listing size",
            ));
        }

        // Stable sort: books with equal copy counts keep their relative order.
        listing.sort_by_key(|book| book.num_copies);

        let copies: HashSet<BookCopy> = listing[..count]
            .iter()
            .map(|book| BookCopy::new(book.isbn, self.config.params.num_add_copies))
            .collect();
        self.config.stock_manager.add_copies(&copies).await
    }

    /// The customer interaction: buy a random subset of the editor picks.
    async fn run_customer(&mut self) -> Result<()> {
        let picks = self
            .config
            .book_store
            .get_editor_picks(self.config.params.num_editor_picks)
            .await?;

        let isbns: HashSet<Isbn> = picks.iter().map(|book| book.isbn).collect();
        let selected = self
            .generator
            .sample_isbns(&isbns, self.config.params.num_books_to_buy)?;

        let books_to_buy: HashSet<BookCopy> = picks
            .iter()
            .filter(|book| selected.contains(&book.isbn))
            .map(|book| BookCopy::new(book.isbn, self.config.params.num_book_copies_to_buy))
            .collect();
        self.config.book_store.buy_books(&books_to_buy).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bookstore_types::{Book, StockBook};

    use super::*;

    /// Book store stub recording purchases and editor-pick fetches.
    #[derive(Debug, Default)]
    struct StubBookStore {
        picks: Vec<Book>,
        fail_purchases: bool,
        editor_pick_calls: AtomicUsize,
        purchases: Mutex<Vec<HashSet<BookCopy>>>,
    }

    #[async_trait::async_trait]
    impl BookStore for StubBookStore {
        async fn get_editor_picks(&self, count: usize) -> Result<Vec<Book>> {
            self.editor_pick_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.picks.iter().take(count).cloned().collect())
        }

        async fn buy_books(&self, books: &HashSet<BookCopy>) -> Result<()> {
            self.purchases.lock().unwrap().push(books.clone());
            if self.fail_purchases {
                return Err(BookStoreError::InsufficientCopies(1));
            }
            Ok(())
        }
    }

    /// Stock manager stub recording listings, added books and added copies.
    #[derive(Debug, Default)]
    struct StubStockManager {
        books: Vec<StockBook>,
        get_calls: AtomicUsize,
        add_books_calls: AtomicUsize,
        added_copies: Mutex<Vec<HashSet<BookCopy>>>,
    }

    #[async_trait::async_trait]
    impl StockManager for StubStockManager {
        async fn get_books(&self) -> Result<Vec<StockBook>> {
            self.get_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.books.clone())
        }

        async fn add_books(&self, _books: &[StockBook]) -> Result<()> {
            self.add_books_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn add_copies(&self, copies: &HashSet<BookCopy>) -> Result<()> {
            self.added_copies.lock().unwrap().push(copies.clone());
            Ok(())
        }
    }

    fn book(isbn: Isbn) -> Book {
        Book {
            isbn,
            title: format!("title {isbn}"),
            author: format!("author {isbn}"),
            price: 10.0,
        }
    }

    fn stock_book(isbn: Isbn, num_copies: u32) -> StockBook {
        StockBook {
            isbn,
            title: format!("title {isbn}"),
            author: format!("author {isbn}"),
            price: 10.0,
            num_copies,
            num_sale_misses: 0,
            num_times_rated: 0,
            total_rating: 0,
            editor_pick: false,
        }
    }

    fn params(rare: f32, frequent: f32, warmup: u64, measured: u64) -> WorkloadParams {
        WorkloadParams {
            percent_rare_stock_manager: rare,
            percent_frequent_stock_manager: frequent,
            warmup_runs: warmup,
            measured_runs: measured,
            ..WorkloadParams::default()
        }
    }

    fn configuration(
        params: WorkloadParams,
        store: &Arc<StubBookStore>,
        stock: &Arc<StubStockManager>,
    ) -> WorkloadConfiguration {
        WorkloadConfiguration::new(params, store.clone(), stock.clone()).unwrap()
    }

    #[test]
    fn rejects_invalid_percentages() {
        let store: Arc<StubBookStore> = Arc::default();
        let stock: Arc<StubStockManager> = Arc::default();

        let err =
            WorkloadConfiguration::new(params(60.0, 50.0, 0, 1), store.clone(), stock.clone())
                .unwrap_err();
        assert!(matches!(err, BookStoreError::InvalidArgument(_)));

        let err =
            WorkloadConfiguration::new(params(-1.0, 10.0, 0, 1), store.clone(), stock.clone())
                .unwrap_err();
        assert!(matches!(err, BookStoreError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn rare_only_distribution_touches_only_the_stock_manager() {
        let store: Arc<StubBookStore> = Arc::default();
        let stock: Arc<StubStockManager> = Arc::default();

        let config = configuration(params(100.0, 0.0, 0, 7), &store, &stock);
        let result = Worker::new(config).run().await;

        assert_eq!(stock.get_calls.load(Ordering::SeqCst), 7);
        assert_eq!(stock.add_books_calls.load(Ordering::SeqCst), 7);
        assert_eq!(store.editor_pick_calls.load(Ordering::SeqCst), 0);
        assert!(store.purchases.lock().unwrap().is_empty());

        assert_eq!(result.total_runs, 7);
        assert_eq!(result.successful_interactions, 7);
        assert_eq!(result.total_customer_interactions, 0);
        assert_eq!(result.successful_customer_interactions, 0);
    }

    #[tokio::test]
    async fn customer_only_distribution_counts_every_purchase() {
        let store = Arc::new(StubBookStore {
            picks: (1..=5).map(book).collect(),
            ..Default::default()
        });
        let stock: Arc<StubStockManager> = Arc::default();

        let mut workload = params(0.0, 0.0, 0, 10);
        workload.num_books_to_buy = 3;
        let config = configuration(workload, &store, &stock);
        let result = Worker::new(config).run().await;

        assert_eq!(result.total_customer_interactions, 10);
        assert_eq!(result.successful_customer_interactions, 10);
        assert_eq!(result.successful_interactions, 10);
        assert_eq!(result.total_runs, 10);

        let purchases = store.purchases.lock().unwrap();
        assert_eq!(purchases.len(), 10);
        for purchase in purchases.iter() {
            assert_eq!(purchase.len(), 3);
        }
    }

    #[tokio::test]
    async fn replenishment_targets_the_least_stocked_books() {
        let store: Arc<StubBookStore> = Arc::default();
        let stock = Arc::new(StubStockManager {
            books: vec![stock_book(11, 5), stock_book(12, 1), stock_book(13, 3)],
            ..Default::default()
        });

        let mut workload = params(0.0, 100.0, 0, 1);
        workload.num_books_with_least_copies = 2;
        workload.num_add_copies = 10;
        let config = configuration(workload, &store, &stock);
        let result = Worker::new(config).run().await;

        assert_eq!(result.successful_interactions, 1);
        let added = stock.added_copies.lock().unwrap();
        assert_eq!(added.len(), 1);
        assert_eq!(
            added[0],
            HashSet::from([BookCopy::new(12, 10), BookCopy::new(13, 10)])
        );
    }

    #[tokio::test]
    async fn replenishment_fails_on_short_listings() {
        let store: Arc<StubBookStore> = Arc::default();
        let stock = Arc::new(StubStockManager {
            books: vec![stock_book(11, 5)],
            ..Default::default()
        });

        let mut workload = params(0.0, 100.0, 0, 4);
        workload.num_books_with_least_copies = 2;
        let config = configuration(workload, &store, &stock);
        let result = Worker::new(config).run().await;

        assert_eq!(result.total_runs, 4);
        assert_eq!(result.successful_interactions, 0);
        assert!(stock.added_copies.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_purchases_count_as_failed_iterations() {
        let store = Arc::new(StubBookStore {
            picks: (1..=10).map(book).collect(),
            fail_purchases: true,
            ..Default::default()
        });
        let stock: Arc<StubStockManager> = Arc::default();

        let config = configuration(params(0.0, 0.0, 0, 10), &store, &stock);
        let result = Worker::new(config).run().await;

        assert_eq!(result.total_runs, 10);
        assert_eq!(result.successful_interactions, 0);
        assert_eq!(result.total_customer_interactions, 10);
        assert_eq!(result.successful_customer_interactions, 0);
        // A failed iteration never aborts the worker.
        assert_eq!(store.purchases.lock().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn sampler_failures_fail_the_customer_interaction() {
        // Two editor picks, but the workload wants to buy three distinct
        // books: the sampler precondition failure becomes the iteration's
        // failure and the purchase is never attempted.
        let store = Arc::new(StubBookStore {
            picks: (1..=2).map(book).collect(),
            ..Default::default()
        });
        let stock: Arc<StubStockManager> = Arc::default();

        let mut workload = params(0.0, 0.0, 0, 5);
        workload.num_books_to_buy = 3;
        let config = configuration(workload, &store, &stock);
        let result = Worker::new(config).run().await;

        assert_eq!(result.successful_interactions, 0);
        assert_eq!(result.total_customer_interactions, 5);
        assert_eq!(result.successful_customer_interactions, 0);
        assert!(store.purchases.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn warmup_outcomes_are_discarded() {
        let store = Arc::new(StubBookStore {
            picks: (1..=10).map(book).collect(),
            ..Default::default()
        });
        let stock: Arc<StubStockManager> = Arc::default();

        let config = configuration(params(0.0, 0.0, 20, 10), &store, &stock);
        let result = Worker::new(config).run().await;

        // The 20 warmup purchases happened but only the 10 measured ones
        // are counted.
        assert_eq!(store.purchases.lock().unwrap().len(), 30);
        assert_eq!(result.total_runs, 10);
        assert_eq!(result.total_customer_interactions, 10);
        assert!(result.successful_interactions <= result.total_runs);
        assert!(
            result.successful_customer_interactions <= result.total_customer_interactions
        );
    }
}
