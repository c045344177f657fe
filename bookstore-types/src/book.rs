//! Book records as they travel between the workload and the store.
//!
//! This module contains the three shapes a book takes on the wire:
//!
//!  - [`StockBook`] is the full stock record the stock manager deals in
//!  - [`Book`] is the customer-facing summary returned by editor-pick queries
//!  - [`BookCopy`] pairs an ISBN with a quantity for purchases and restocking

use serde::{Deserialize, Serialize};

/// A book identifier. Always a positive integer.
pub type Isbn = u32;

/// A full stock record, as held and returned by the stock manager.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StockBook {
    /// The identifier of the book.
    pub isbn: Isbn,
    /// The title of the book.
    pub title: String,
    /// The author of the book.
    pub author: String,
    /// The price of a single copy.
    pub price: f32,
    /// The number of copies currently in stock.
    pub num_copies: u32,
    /// How many purchases failed because no copies were left.
    pub num_sale_misses: u64,
    /// How many times the book has been rated.
    pub num_times_rated: u64,
    /// The sum of all ratings the book has received.
    pub total_rating: u64,
    /// Whether the book is featured as an editor pick.
    pub editor_pick: bool,
}

impl StockBook {
    /// Returns the customer-facing summary of this record.
    pub fn summary(&self) -> Book {
        Book {
            isbn: self.isbn,
            title: self.title.clone(),
            author: self.author.clone(),
            price: self.price,
        }
    }
}

/// The customer-facing summary of a book.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// The identifier of the book.
    pub isbn: Isbn,
    /// The title of the book.
    pub title: String,
    /// The author of the book.
    pub author: String,
    /// The price of a single copy.
    pub price: f32,
}

/// An ISBN paired with a number of copies.
///
/// Used both for purchases (how many copies to buy) and for restocking (how
/// many copies to add).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookCopy {
    /// The identifier of the book.
    pub isbn: Isbn,
    /// The number of copies to buy or add.
    pub num_copies: u32,
}

impl BookCopy {
    /// Creates a new ISBN/quantity pair.
    pub fn new(isbn: Isbn, num_copies: u32) -> Self {
        Self { isbn, num_copies }
    }
}
