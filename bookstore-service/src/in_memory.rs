//! In-process bookstore backed by a `HashMap`.
//!
//! This is the binding used for local-mode benchmarks and for tests. The
//! store is [`Clone`] so one instance can serve as both the [`BookStore`]
//! and the [`StockManager`] handle while callers keep a copy for direct
//! inspection.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use rand::seq::IteratorRandom;

use bookstore_types::{Book, BookCopy, BookStoreError, Isbn, Result, StockBook};

use crate::{BookStore, StockManager};

type Stock = HashMap<Isbn, StockBook>;

/// An in-process, concurrency-safe bookstore.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookStore {
    stock: Arc<Mutex<Stock>>,
}

impl InMemoryBookStore {
    /// Creates an empty bookstore.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of distinct books in stock.
    pub fn len(&self) -> usize {
        self.stock.lock().unwrap().len()
    }

    /// Returns `true` if no books are in stock.
    pub fn is_empty(&self) -> bool {
        self.stock.lock().unwrap().is_empty()
    }

    /// Returns a clone of the stored record, if present.
    pub fn get_stored(&self, isbn: Isbn) -> Option<StockBook> {
        self.stock.lock().unwrap().get(&isbn).cloned()
    }

    fn validate(book: &StockBook) -> Result<()> {
        if book.isbn == 0 {
            return Err(BookStoreError::invalid_argument("isbn must be positive"));
        }
        if book.title.is_empty() || book.author.is_empty() {
            return Err(BookStoreError::invalid_argument(
                "title and author must not be empty",
            ));
        }
        if book.price < 0.0 {
            return Err(BookStoreError::invalid_argument(
                "price must not be negative",
            ));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl BookStore for InMemoryBookStore {
    async fn get_editor_picks(&self, count: usize) -> Result<Vec<Book>> {
        let stock = self.stock.lock().unwrap();
        let picks: Vec<Book> = stock
            .values()
            .filter(|book| book.editor_pick)
            .map(StockBook::summary)
            .collect();
        if count > picks.len() {
            return Err(BookStoreError::invalid_argument(
                "requested number of editor picks exceeds those in stock",
            ));
        }
        Ok(picks.into_iter().choose_multiple(&mut rand::rng(), count))
    }

    async fn buy_books(&self, books: &HashSet<BookCopy>) -> Result<()> {
        let mut stock = self.stock.lock().unwrap();

        // Validate the whole batch up front; the purchase is all-or-nothing.
        let mut missed: Option<Isbn> = None;
        for copy in books {
            if copy.num_copies == 0 {
                return Err(BookStoreError::invalid_argument(
                    "number of copies to buy must be positive",
                ));
            }
            let book = stock
                .get(&copy.isbn)
                .ok_or(BookStoreError::UnknownIsbn(copy.isbn))?;
            if book.num_copies < copy.num_copies {
                missed = Some(copy.isbn);
            }
        }

        // Record sale misses for every book we could not sell.
        if let Some(missed) = missed {
            for copy in books {
                let book = stock.get_mut(&copy.isbn).expect("validated above");
                if book.num_copies < copy.num_copies {
                    book.num_sale_misses += 1;
                }
            }
            return Err(BookStoreError::InsufficientCopies(missed));
        }

        for copy in books {
            let book = stock.get_mut(&copy.isbn).expect("validated above");
            book.num_copies -= copy.num_copies;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl StockManager for InMemoryBookStore {
    async fn get_books(&self) -> Result<Vec<StockBook>> {
        Ok(self.stock.lock().unwrap().values().cloned().collect())
    }

    async fn add_books(&self, books: &[StockBook]) -> Result<()> {
        let mut stock = self.stock.lock().unwrap();

        for book in books {
            Self::validate(book)?;
            if stock.contains_key(&book.isbn) {
                return Err(BookStoreError::DuplicateIsbn(book.isbn));
            }
        }
        // A batch may carry the same ISBN twice; the second insert wins,
        // matching last-write semantics of the map.
        for book in books {
            stock.insert(book.isbn, book.clone());
        }
        Ok(())
    }

    async fn add_copies(&self, copies: &HashSet<BookCopy>) -> Result<()> {
        let mut stock = self.stock.lock().unwrap();

        for copy in copies {
            if copy.num_copies == 0 {
                return Err(BookStoreError::invalid_argument(
                    "number of copies to add must be positive",
                ));
            }
            if !stock.contains_key(&copy.isbn) {
                return Err(BookStoreError::UnknownIsbn(copy.isbn));
            }
        }
        for copy in copies {
            let book = stock.get_mut(&copy.isbn).expect("validated above");
            book.num_copies += copy.num_copies;
        }
        Ok(())
    }
}
