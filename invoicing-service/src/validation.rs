//! Required-field checks for invoices and their entries.
//!
//! Validators never stop at the first problem: they return every violated
//! rule, one [`FieldViolation`] each, sorted by field path. An empty result
//! means the value is valid.

use service_core::error::FieldViolation;
use validator::Validate;

use crate::models::{Invoice, InvoiceEntry};

/// Check that `description`, `price` and `vat` are all present.
pub fn validate_entry(entry: &InvoiceEntry) -> Vec<FieldViolation> {
    match entry.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => FieldViolation::from_validation_errors(&errors),
    }
}

/// Checks applied before an invoice is saved or replaced: `identifier`,
/// `issuedDate`, `buyer` and `seller` are required, and every entry must pass
/// [`validate_entry`]. Entry violations are reported as `entries[i].field`.
pub fn validate_invoice_for_save(invoice: &Invoice) -> Vec<FieldViolation> {
    match invoice.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => FieldViolation::from_validation_errors(&errors),
    }
}
