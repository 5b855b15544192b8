//! Service layer between the HTTP handlers and the invoice store.

use chrono::NaiveDate;
use std::future::Future;
use std::sync::Arc;

use crate::models::Invoice;
use crate::services::database::{Database, StoreError};
use crate::services::metrics::INVOICE_OPERATIONS_TOTAL;

/// Thin pass-through over a shared [`Database`] handle.
#[derive(Clone)]
pub struct InvoiceService {
    db: Arc<dyn Database>,
}

async fn counted<T, F>(operation: &'static str, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    let result = fut.await;
    let outcome = if result.is_ok() { "ok" } else { "error" };
    INVOICE_OPERATIONS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
    result
}

impl InvoiceService {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    pub async fn get_all(&self) -> Result<Vec<Invoice>, StoreError> {
        counted("get_all", self.db.get_all()).await
    }

    pub async fn find_by_id(&self, id: u64) -> Result<Option<Invoice>, StoreError> {
        counted("get", self.db.get(id)).await
    }

    pub async fn find_invoices(
        &self,
        filter: Option<&Invoice>,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
    ) -> Result<Vec<Invoice>, StoreError> {
        counted("find", self.db.find(filter, date_from, date_to)).await
    }

    /// Save `invoice` and return it as stored, carrying its new id.
    pub async fn save_invoice(&self, invoice: &Invoice) -> Result<Invoice, StoreError> {
        let id = counted("save", self.db.save_invoice(invoice)).await?;
        Ok(invoice.clone().with_id(id))
    }

    pub async fn update_invoice(&self, invoice: &Invoice) -> Result<(), StoreError> {
        counted("update", self.db.update_invoice(invoice)).await
    }

    pub async fn remove_invoice(&self, id: u64) -> Result<(), StoreError> {
        counted("remove", self.db.remove_invoice(id)).await
    }

    pub async fn health_check(&self) -> Result<(), StoreError> {
        self.db.health_check().await
    }
}
