//! Invoice CRUD and search handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use service_core::error::AppError;

use crate::models::{Invoice, InvoiceDetails};
use crate::services::metrics::VALIDATION_FAILURES_TOTAL;
use crate::startup::AppState;
use crate::validation::validate_invoice_for_save;

/// Optional search fields for `GET /invoices`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSearchQuery {
    pub identifier: Option<String>,
    pub buyer: Option<String>,
    pub seller: Option<String>,
    pub issued_date: Option<NaiveDate>,
}

impl InvoiceSearchQuery {
    /// The search template, or `None` when no parameter was given.
    fn into_template(self) -> Option<Invoice> {
        let template = Invoice {
            identifier: self.identifier,
            buyer: self.buyer,
            seller: self.seller,
            issued_date: self.issued_date,
            ..Invoice::default()
        };
        (!template.is_blank()).then_some(template)
    }
}

fn reject_invalid(invoice: &Invoice) -> Result<(), AppError> {
    let violations = validate_invoice_for_save(invoice);
    if violations.is_empty() {
        return Ok(());
    }

    for violation in &violations {
        VALIDATION_FAILURES_TOTAL
            .with_label_values(&[violation.field.as_str()])
            .inc();
    }
    tracing::info!(violations = violations.len(), "Invoice rejected by validation");
    Err(AppError::Invalid(violations))
}

/// List every invoice, or search when query parameters are present.
#[tracing::instrument(skip(state))]
pub async fn list_invoices(
    State(state): State<AppState>,
    Query(query): Query<InvoiceSearchQuery>,
) -> Result<Json<Vec<Invoice>>, AppError> {
    tracing::info!("Received find invoices request");

    let invoices = match query.into_template() {
        Some(template) => {
            state
                .invoices
                .find_invoices(Some(&template), None, None)
                .await?
        }
        None => state.invoices.get_all().await?,
    };

    Ok(Json(invoices))
}

/// Single invoice with its net, VAT and gross totals.
#[tracing::instrument(skip(state))]
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<InvoiceDetails>, AppError> {
    state
        .invoices
        .find_by_id(id)
        .await?
        .map(|invoice| Json(InvoiceDetails::from(invoice)))
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice {} not found", id)))
}

/// Invoices issued between the two dates.
///
/// The store does not apply the range yet, so this currently answers `[]`.
#[tracing::instrument(skip(state))]
pub async fn find_invoices_by_date_range(
    State(state): State<AppState>,
    Path((date_from, date_to)): Path<(NaiveDate, NaiveDate)>,
) -> Result<Json<Vec<Invoice>>, AppError> {
    tracing::info!("Received find invoices within date range request");

    let invoices = state
        .invoices
        .find_invoices(None, Some(date_from), Some(date_to))
        .await?;

    Ok(Json(invoices))
}

#[tracing::instrument(skip(state, invoice))]
pub async fn save_invoice(
    State(state): State<AppState>,
    Json(invoice): Json<Invoice>,
) -> Result<Json<Invoice>, AppError> {
    tracing::info!("Received save invoice request");
    reject_invalid(&invoice)?;

    let saved = state.invoices.save_invoice(&invoice).await?;
    Ok(Json(saved))
}

/// Body is the bare invoice id.
#[tracing::instrument(skip(state))]
pub async fn remove_invoice(
    State(state): State<AppState>,
    Json(id): Json<u64>,
) -> Result<StatusCode, AppError> {
    tracing::info!("Received remove invoice request");
    state.invoices.remove_invoice(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace invoice `id`; the path id wins over any id in the body.
#[tracing::instrument(skip(state, invoice))]
pub async fn update_invoice(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(invoice): Json<Invoice>,
) -> Result<StatusCode, AppError> {
    tracing::info!("Received update invoice request");
    reject_invalid(&invoice)?;

    state.invoices.update_invoice(&invoice.with_id(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
