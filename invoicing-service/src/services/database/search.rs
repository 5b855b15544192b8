//! Search-template matching shared by every store.
//!
//! A template is a partially filled [`Invoice`]. Its set fields are checked
//! against a stored invoice in [`SEARCH_PRIORITY`] order and the first field
//! that matches decides inclusion; later fields are not consulted. Unset
//! fields are skipped, so several set fields behave as an OR.

use crate::models::{Invoice, InvoiceEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Id,
    Identifier,
    Buyer,
    Seller,
    IssuedDate,
    /// Any template entry equal to one of the invoice's entries, prices
    /// compared together with their scale (`12.5` does not match `12.50`).
    Entries,
}

pub const SEARCH_PRIORITY: [SearchField; 6] = [
    SearchField::Id,
    SearchField::Identifier,
    SearchField::Buyer,
    SearchField::Seller,
    SearchField::IssuedDate,
    SearchField::Entries,
];

impl SearchField {
    /// `None` when the template leaves this field unset.
    pub fn matches(self, template: &Invoice, invoice: &Invoice) -> Option<bool> {
        match self {
            SearchField::Id => template.id.map(|id| invoice.id == Some(id)),
            SearchField::Identifier => template
                .identifier
                .as_ref()
                .map(|v| invoice.identifier.as_ref() == Some(v)),
            SearchField::Buyer => template
                .buyer
                .as_ref()
                .map(|v| invoice.buyer.as_ref() == Some(v)),
            SearchField::Seller => template
                .seller
                .as_ref()
                .map(|v| invoice.seller.as_ref() == Some(v)),
            SearchField::IssuedDate => template
                .issued_date
                .map(|date| invoice.issued_date == Some(date)),
            SearchField::Entries => {
                if template.entries.is_empty() {
                    None
                } else {
                    Some(
                        template
                            .entries
                            .iter()
                            .any(|wanted| {
                                invoice.entries.iter().any(|entry| same_entry(wanted, entry))
                            }),
                    )
                }
            }
        }
    }
}

fn same_entry(a: &InvoiceEntry, b: &InvoiceEntry) -> bool {
    let same_price = match (a.price, b.price) {
        (Some(x), Some(y)) => x == y && x.scale() == y.scale(),
        (x, y) => x == y,
    };
    same_price && a.description == b.description && a.vat == b.vat
}

/// First field, in priority order, on which `invoice` matches `template`.
pub fn matched_field(template: &Invoice, invoice: &Invoice) -> Option<SearchField> {
    SEARCH_PRIORITY
        .iter()
        .copied()
        .find(|field| field.matches(template, invoice) == Some(true))
}

/// Keep the invoices matching `template`, preserving input order.
pub fn filter_invoices<I>(invoices: I, template: Option<&Invoice>) -> Vec<Invoice>
where
    I: IntoIterator<Item = Invoice>,
{
    let Some(template) = template else {
        return Vec::new();
    };

    invoices
        .into_iter()
        .filter(|invoice| matched_field(template, invoice).is_some())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InvoiceEntry, Vat};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn invoice(id: u64, identifier: &str, buyer: &str, seller: &str) -> Invoice {
        Invoice::new(
            identifier,
            NaiveDate::from_ymd_opt(2018, 5, id as u32).unwrap(),
            buyer,
            seller,
            vec![InvoiceEntry::new(
                format!("item-{}", id),
                Decimal::new(id as i64 * 100, 0),
                Vat::Regular,
            )],
        )
        .with_id(id)
    }

    #[test]
    fn unset_fields_are_skipped() {
        let stored = invoice(1, "A", "Acme", "Globex");
        for field in SEARCH_PRIORITY {
            assert_eq!(field.matches(&Invoice::default(), &stored), None);
        }
    }

    #[test]
    fn id_is_checked_before_buyer() {
        let stored = invoice(1, "A", "Acme", "Globex");
        let template = Invoice {
            id: Some(1),
            buyer: Some("Acme".to_string()),
            ..Invoice::default()
        };
        assert_eq!(matched_field(&template, &stored), Some(SearchField::Id));
    }

    #[test]
    fn buyer_match_wins_even_if_seller_differs() {
        let stored = invoice(1, "A", "Acme", "Globex");
        let template = Invoice {
            buyer: Some("Acme".to_string()),
            seller: Some("Initech".to_string()),
            ..Invoice::default()
        };
        assert_eq!(matched_field(&template, &stored), Some(SearchField::Buyer));
    }

    #[test]
    fn falls_through_to_later_fields() {
        let stored = invoice(2, "B", "Acme", "Globex");
        let template = Invoice {
            id: Some(99),
            seller: Some("Globex".to_string()),
            ..Invoice::default()
        };
        assert_eq!(matched_field(&template, &stored), Some(SearchField::Seller));
    }

    #[test]
    fn entries_match_by_value() {
        let stored = invoice(3, "C", "Acme", "Globex");
        let template = Invoice {
            entries: vec![
                InvoiceEntry::new("other", Decimal::ONE, Vat::Zero),
                InvoiceEntry::new("item-3", Decimal::new(300, 0), Vat::Regular),
            ],
            ..Invoice::default()
        };
        assert_eq!(matched_field(&template, &stored), Some(SearchField::Entries));

        let miss = Invoice {
            entries: vec![InvoiceEntry::new("item-3", Decimal::new(300, 0), Vat::Zero)],
            ..Invoice::default()
        };
        assert_eq!(matched_field(&miss, &stored), None);
    }

    #[test]
    fn entry_prices_must_share_scale() {
        let stored = invoice(3, "C", "Acme", "Globex");
        let same_scale = Invoice {
            entries: vec![InvoiceEntry::new("item-3", Decimal::new(300, 0), Vat::Regular)],
            ..Invoice::default()
        };
        let wider_scale = Invoice {
            entries: vec![InvoiceEntry::new("item-3", Decimal::new(30000, 2), Vat::Regular)],
            ..Invoice::default()
        };

        assert_eq!(matched_field(&same_scale, &stored), Some(SearchField::Entries));
        assert_eq!(matched_field(&wider_scale, &stored), None);
    }

    #[test]
    fn filter_keeps_order_and_handles_missing_template() {
        let invoices = vec![
            invoice(1, "A", "Acme", "Globex"),
            invoice(2, "B", "Initech", "Globex"),
            invoice(3, "C", "Acme", "Hooli"),
        ];
        let template = Invoice {
            buyer: Some("Acme".to_string()),
            ..Invoice::default()
        };

        let ids: Vec<_> = filter_invoices(invoices.clone(), Some(&template))
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec![Some(1), Some(3)]);

        assert!(filter_invoices(invoices, None).is_empty());
    }
}
