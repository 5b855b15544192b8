use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use super::{search, Database, StoreError};
use crate::models::Invoice;

/// Process-local invoice store. Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryDatabase {
    invoices: RwLock<BTreeMap<u64, Invoice>>,
    last_id: AtomicU64,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Database for InMemoryDatabase {
    #[instrument(skip(self, invoice), fields(identifier = ?invoice.identifier))]
    async fn save_invoice(&self, invoice: &Invoice) -> Result<u64, StoreError> {
        let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.invoices
            .write()
            .await
            .insert(id, invoice.clone().with_id(id));

        info!(invoice_id = id, "Invoice saved");
        Ok(id)
    }

    #[instrument(skip(self, invoice), fields(invoice_id = ?invoice.id))]
    async fn update_invoice(&self, invoice: &Invoice) -> Result<(), StoreError> {
        let id = invoice.id.ok_or(StoreError::MissingId)?;
        let mut invoices = self.invoices.write().await;
        let slot = invoices.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        *slot = invoice.clone();

        info!(invoice_id = id, "Invoice updated");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_invoice(&self, id: u64) -> Result<(), StoreError> {
        self.invoices
            .write()
            .await
            .remove(&id)
            .ok_or(StoreError::NotFound(id))?;

        info!(invoice_id = id, "Invoice removed");
        Ok(())
    }

    async fn get(&self, id: u64) -> Result<Option<Invoice>, StoreError> {
        Ok(self.invoices.read().await.get(&id).cloned())
    }

    #[instrument(skip(self, search_params))]
    async fn find(
        &self,
        search_params: Option<&Invoice>,
        issued_date_from: Option<NaiveDate>,
        issued_date_to: Option<NaiveDate>,
    ) -> Result<Vec<Invoice>, StoreError> {
        let invoices = self.invoices.read().await;
        let found = search::filter_invoices(invoices.values().cloned(), search_params);

        debug!(
            scanned = invoices.len(),
            found = found.len(),
            ?issued_date_from,
            ?issued_date_to,
            "Invoice search completed"
        );
        Ok(found)
    }

    async fn get_all(&self) -> Result<Vec<Invoice>, StoreError> {
        Ok(self.invoices.read().await.values().cloned().collect())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
