//! Services module for invoicing-service.

pub mod database;
pub mod invoice_service;
pub mod metrics;

pub use database::{Database, InFileDatabase, InMemoryDatabase, StoreError};
pub use invoice_service::InvoiceService;
pub use metrics::{get_metrics, init_metrics};
