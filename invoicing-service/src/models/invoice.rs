//! Invoice model for invoicing-service.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::InvoiceEntry;

/// Invoice document.
///
/// Every field is optional: the same shape is used for request bodies before
/// validation and as the search template passed to `find`. `id` is assigned by
/// the store and ignored on save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    #[validate(required(message = "identifier is required"))]
    #[serde(default)]
    pub identifier: Option<String>,

    #[validate(required(message = "issuedDate is required"))]
    #[serde(default, rename = "issuedDate")]
    pub issued_date: Option<NaiveDate>,

    #[validate(required(message = "buyer is required"))]
    #[serde(default)]
    pub buyer: Option<String>,

    #[validate(required(message = "seller is required"))]
    #[serde(default)]
    pub seller: Option<String>,

    #[validate(nested)]
    #[serde(default)]
    pub entries: Vec<InvoiceEntry>,
}

impl Invoice {
    pub fn new(
        identifier: impl Into<String>,
        issued_date: NaiveDate,
        buyer: impl Into<String>,
        seller: impl Into<String>,
        entries: Vec<InvoiceEntry>,
    ) -> Self {
        Self {
            id: None,
            identifier: Some(identifier.into()),
            issued_date: Some(issued_date),
            buyer: Some(buyer.into()),
            seller: Some(seller.into()),
            entries,
        }
    }

    /// Copy of this invoice carrying `id`; every other field is preserved.
    pub fn with_id(self, id: u64) -> Self {
        Self {
            id: Some(id),
            ..self
        }
    }

    /// True when no field is set, i.e. the template matches nothing.
    pub fn is_blank(&self) -> bool {
        self.id.is_none()
            && self.identifier.is_none()
            && self.issued_date.is_none()
            && self.buyer.is_none()
            && self.seller.is_none()
            && self.entries.is_empty()
    }

    pub fn net_total(&self) -> Decimal {
        self.entries
            .iter()
            .filter_map(|e| e.price)
            .sum::<Decimal>()
            .round_dp(2)
    }

    /// VAT over all entries, rounded to the cent.
    pub fn vat_total(&self) -> Decimal {
        self.entries
            .iter()
            .filter_map(InvoiceEntry::vat_amount)
            .sum::<Decimal>()
            .round_dp(2)
    }

    pub fn gross_total(&self) -> Decimal {
        self.net_total() + self.vat_total()
    }
}

/// An invoice with its computed amounts, as served by `GET /invoices/:id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDetails {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub net_total: Decimal,
    pub vat_total: Decimal,
    pub gross_total: Decimal,
}

impl From<Invoice> for InvoiceDetails {
    fn from(invoice: Invoice) -> Self {
        Self {
            net_total: invoice.net_total(),
            vat_total: invoice.vat_total(),
            gross_total: invoice.gross_total(),
            invoice,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Vat;

    fn sample() -> Invoice {
        Invoice::new(
            "FV/2018/01",
            NaiveDate::from_ymd_opt(2018, 3, 12).unwrap(),
            "Buyer Sp. z o.o.",
            "Seller S.A.",
            vec![
                InvoiceEntry::new("Consulting", Decimal::new(10000, 2), Vat::Regular),
                InvoiceEntry::new("Books", Decimal::new(5000, 2), Vat::Reduced5),
            ],
        )
    }

    #[test]
    fn totals_sum_entries() {
        let invoice = sample();
        assert_eq!(invoice.net_total(), Decimal::new(150, 0));
        assert_eq!(invoice.vat_total(), Decimal::new(2550, 2));
        assert_eq!(invoice.gross_total(), Decimal::new(17550, 2));
    }

    #[test]
    fn details_flatten_invoice_and_add_totals() {
        let json = serde_json::to_value(InvoiceDetails::from(sample().with_id(7))).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["issuedDate"], "2018-03-12");
        assert_eq!(json["netTotal"], "150.00");
        assert_eq!(json["vatTotal"], "25.50");
        assert_eq!(json["grossTotal"], "175.50");
    }

    #[test]
    fn with_id_keeps_other_fields() {
        let invoice = sample();
        let saved = invoice.clone().with_id(42);
        assert_eq!(saved.id, Some(42));
        assert_eq!(Invoice { id: None, ..saved }, invoice);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(sample().with_id(1)).unwrap();
        assert_eq!(json["issuedDate"], "2018-03-12");
        assert_eq!(json["entries"][0]["vat"], "REGULAR");
        assert_eq!(json["entries"][0]["price"], "100.00");
    }

    #[test]
    fn deserializes_numeric_price_and_missing_fields() {
        let invoice: Invoice = serde_json::from_str(
            r#"{"identifier":"A1","entries":[{"description":"x","price":12.5,"vat":"ZERO"}]}"#,
        )
        .unwrap();

        assert_eq!(invoice.identifier.as_deref(), Some("A1"));
        assert!(invoice.buyer.is_none());
        assert_eq!(invoice.entries[0].price, Some(Decimal::new(125, 1)));
        assert_eq!(invoice.entries[0].vat, Some(Vat::Zero));
    }

    #[test]
    fn empty_template_is_blank() {
        assert!(Invoice::default().is_blank());
        assert!(!sample().is_blank());
    }
}
