//! Domain models for invoicing-service.

mod invoice;
mod invoice_entry;
mod vat;

pub use invoice::{Invoice, InvoiceDetails};
pub use invoice_entry::InvoiceEntry;
pub use vat::Vat;
