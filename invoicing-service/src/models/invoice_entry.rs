//! Invoice entry (line item) model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Vat;

/// One billed line on an invoice.
///
/// Entries compare by value. `PartialEq` treats `12.5` and `12.50` as equal
/// prices; search does not (see `SearchField::Entries`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
pub struct InvoiceEntry {
    #[validate(required(message = "description is required"))]
    #[serde(default)]
    pub description: Option<String>,

    #[validate(required(message = "price is required"))]
    #[serde(default)]
    pub price: Option<Decimal>,

    #[validate(required(message = "vat is required"))]
    #[serde(default)]
    pub vat: Option<Vat>,
}

impl InvoiceEntry {
    pub fn new(description: impl Into<String>, price: Decimal, vat: Vat) -> Self {
        Self {
            description: Some(description.into()),
            price: Some(price),
            vat: Some(vat),
        }
    }

    /// Tax owed on this entry, if both price and category are known.
    pub fn vat_amount(&self) -> Option<Decimal> {
        Some(self.price? * self.vat?.rate())
    }
}
