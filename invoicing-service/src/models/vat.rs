//! VAT categories for invoice entries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// VAT category applied to an invoice entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Vat {
    Regular,
    Reduced8,
    Reduced5,
    Zero,
}

impl Vat {
    /// Tax rate as a fraction (`0.23` for the regular rate).
    pub fn rate(&self) -> Decimal {
        match self {
            Vat::Regular => Decimal::new(23, 2),
            Vat::Reduced8 => Decimal::new(8, 2),
            Vat::Reduced5 => Decimal::new(5, 2),
            Vat::Zero => Decimal::ZERO,
        }
    }
}
