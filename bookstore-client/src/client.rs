//! The HTTP proxies talking to a remote bookstore server.

use std::collections::HashSet;
use std::sync::Arc;

use bookstore_service::{BookStore, StockManager};
use bookstore_types::{Book, BookCopy, BookStoreError, Result, StockBook};

/// Maps a transport-level failure into the bookstore error taxonomy.
fn transport(err: reqwest::Error) -> BookStoreError {
    BookStoreError::Remote(err.to_string())
}

/// Turns a non-success response into a [`BookStoreError::Remote`] carrying
/// the status and the server's error body.
async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BookStoreError::Remote(format!("{status}: {body}")))
}

/// The customer-facing capability set, bound over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBookStore {
    http: reqwest::Client,
    base_url: Arc<str>,
}

impl HttpBookStore {
    /// Creates a proxy targeting the bookstore server at `base_url`.
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').into(),
        })
    }
}

#[async_trait::async_trait]
impl BookStore for HttpBookStore {
    async fn get_editor_picks(&self, count: usize) -> Result<Vec<Book>> {
        let url = format!("{}/store/editor-picks", self.base_url);
        let response = self
            .http
            .get(url)
            .query(&[("count", count)])
            .send()
            .await
            .map_err(transport)?;
        expect_success(response)
            .await?
            .json()
            .await
            .map_err(transport)
    }

    async fn buy_books(&self, books: &HashSet<BookCopy>) -> Result<()> {
        let url = format!("{}/store/buy", self.base_url);
        let response = self
            .http
            .post(url)
            .json(books)
            .send()
            .await
            .map_err(transport)?;
        expect_success(response).await?;
        Ok(())
    }
}

/// The stock-management capability set, bound over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStockManager {
    http: reqwest::Client,
    base_url: Arc<str>,
}

impl HttpStockManager {
    /// Creates a proxy targeting the bookstore server at `base_url`.
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').into(),
        })
    }
}

#[async_trait::async_trait]
impl StockManager for HttpStockManager {
    async fn get_books(&self) -> Result<Vec<StockBook>> {
        let url = format!("{}/stock/books", self.base_url);
        let response = self.http.get(url).send().await.map_err(transport)?;
        expect_success(response)
            .await?
            .json()
            .await
            .map_err(transport)
    }

    async fn add_books(&self, books: &[StockBook]) -> Result<()> {
        let url = format!("{}/stock/books", self.base_url);
        let response = self
            .http
            .post(url)
            .json(books)
            .send()
            .await
            .map_err(transport)?;
        expect_success(response).await?;
        Ok(())
    }

    async fn add_copies(&self, copies: &HashSet<BookCopy>) -> Result<()> {
        let url = format!("{}/stock/copies", self.base_url);
        let response = self
            .http
            .post(url)
            .json(copies)
            .send()
            .await
            .map_err(transport)?;
        expect_success(response).await?;
        Ok(())
    }
}
