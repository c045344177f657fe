//! The error taxonomy shared by all bookstore bindings.

use thiserror::Error;

use crate::book::Isbn;

/// A convenience `Result` alias using [`BookStoreError`].
pub type Result<T> = std::result::Result<T, BookStoreError>;

/// Errors that can occur when talking to a bookstore.
#[derive(Debug, Error)]
pub enum BookStoreError {
    /// A sizing or content parameter violates a precondition.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A book with this ISBN is already in stock.
    #[error("isbn {0} is already in stock")]
    DuplicateIsbn(Isbn),

    /// No book with this ISBN is in stock.
    #[error("isbn {0} is not in stock")]
    UnknownIsbn(Isbn),

    /// The store does not hold enough copies to satisfy a purchase.
    #[error("not enough copies of isbn {0} in stock")]
    InsufficientCopies(Isbn),

    /// A remote call failed, either on the transport or with a non-success
    /// response from the server.
    #[error("remote call failed: {0}")]
    Remote(String),
}

impl BookStoreError {
    /// Creates an [`InvalidArgument`](Self::InvalidArgument) error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
