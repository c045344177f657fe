//! HTTP bindings of the bookstore capability sets.
//!
//! These proxies speak JSON to a bookstore server and implement the same
//! [`BookStore`](bookstore_service::BookStore) and
//! [`StockManager`](bookstore_service::StockManager) traits as the
//! in-process binding, so workload code cannot tell the two apart.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod client;

pub use client::{HttpBookStore, HttpStockManager};
