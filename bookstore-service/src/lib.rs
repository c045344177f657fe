//! The capability sets a bookstore exposes, and the in-process binding.
//!
//! Workload code depends only on the [`BookStore`] and [`StockManager`]
//! traits, never on a concrete binding. Two bindings exist: the
//! [`InMemoryBookStore`] in this crate, and the HTTP proxies in the
//! `bookstore-client` crate.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

use std::collections::HashSet;
use std::fmt::Debug;

use bookstore_types::{Book, BookCopy, Result, StockBook};

mod in_memory;

pub use in_memory::InMemoryBookStore;

/// The customer-facing capability set of a bookstore.
#[async_trait::async_trait]
pub trait BookStore: Debug + Send + Sync + 'static {
    /// Returns `count` randomly selected books flagged as editor picks.
    ///
    /// Fails with an invalid-argument error when fewer than `count` books
    /// are flagged.
    async fn get_editor_picks(&self, count: usize) -> Result<Vec<Book>>;

    /// Buys the given quantities of the given books.
    ///
    /// The purchase is all-or-nothing: if any book is unknown or does not
    /// hold enough copies, no copies are sold.
    async fn buy_books(&self, books: &HashSet<BookCopy>) -> Result<()>;
}

/// The stock-management capability set of a bookstore.
#[async_trait::async_trait]
pub trait StockManager: Debug + Send + Sync + 'static {
    /// Returns the full current stock listing.
    async fn get_books(&self) -> Result<Vec<StockBook>>;

    /// Adds new books to the stock.
    ///
    /// Fails when any record is malformed or its ISBN is already in stock;
    /// in that case no books are added. An empty batch is a legal no-op.
    async fn add_books(&self, books: &[StockBook]) -> Result<()>;

    /// Adds copies of books that are already in stock.
    ///
    /// Fails when any ISBN is unknown or any quantity is not positive; in
    /// that case no copies are added.
    async fn add_copies(&self, copies: &HashSet<BookCopy>) -> Result<()>;
}
