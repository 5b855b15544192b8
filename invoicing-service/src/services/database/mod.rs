//! Invoice persistence for invoicing-service.
//!
//! The [`Database`] trait is the store contract; [`InFileDatabase`] keeps
//! invoices in a JSON Lines file with a separate id-counter file and
//! [`InMemoryDatabase`] keeps them in process memory. Both search with the
//! same first-match-wins predicate list from [`search`].

mod in_file;
mod in_memory;
pub mod search;

pub use in_file::InFileDatabase;
pub use in_memory::InMemoryDatabase;
pub use search::{SearchField, SEARCH_PRIORITY};

use async_trait::async_trait;
use chrono::NaiveDate;
use service_core::error::AppError;
use thiserror::Error;

use crate::models::Invoice;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    InvalidPath(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed invoice record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Id file holds a non-numeric value: {0:?}")]
    CorruptIdFile(String),

    #[error("Invoice ids exhausted: last id is {0}")]
    IdsExhausted(u64),

    #[error("Invoice {0} not found")]
    NotFound(u64),

    #[error("Invoice has no id")]
    MissingId,
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => {
                AppError::NotFound(anyhow::anyhow!("Invoice {} not found", id))
            }
            StoreError::MissingId => AppError::BadRequest(anyhow::anyhow!("Invoice has no id")),
            StoreError::InvalidPath(msg) => AppError::ConfigError(anyhow::anyhow!(msg)),
            other => AppError::StorageError(anyhow::Error::new(other)),
        }
    }
}

/// Invoice store contract.
///
/// Stores hand out ids themselves: `save_invoice` ignores any id on its input
/// and returns the one it assigned.
#[async_trait]
pub trait Database: Send + Sync {
    /// Persist a copy of `invoice` under a freshly assigned id.
    async fn save_invoice(&self, invoice: &Invoice) -> Result<u64, StoreError>;

    /// Replace the stored invoice carrying `invoice.id`.
    async fn update_invoice(&self, invoice: &Invoice) -> Result<(), StoreError>;

    async fn remove_invoice(&self, id: u64) -> Result<(), StoreError>;

    async fn get(&self, id: u64) -> Result<Option<Invoice>, StoreError>;

    /// Linear search over every stored invoice; see [`search::matched_field`].
    ///
    /// `issued_date_from`/`issued_date_to` are accepted but not applied: a
    /// range with a blank template yields no results. Callers relying on range
    /// filtering get an empty list until the range predicate is added.
    async fn find(
        &self,
        search_params: Option<&Invoice>,
        issued_date_from: Option<NaiveDate>,
        issued_date_to: Option<NaiveDate>,
    ) -> Result<Vec<Invoice>, StoreError>;

    async fn get_all(&self) -> Result<Vec<Invoice>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
