//! HTTP handlers for invoicing-service.

pub mod health;
pub mod invoices;

pub use health::{health_check, metrics_endpoint, readiness_check};
