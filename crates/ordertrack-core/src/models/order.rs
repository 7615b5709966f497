//! Orders created from imported invoices.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::invoice::InvoiceData;
use crate::error::ExtractionError;
use crate::invoice::{ExtractionOutcome, Field};

/// A new order ready to be persisted, with all tracking flags cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub invoice_number: String,
    pub store: Option<String>,
    pub client_name: String,
    pub product_name: String,
    pub sold_at: NaiveDateTime,
    /// Components picked and set aside.
    pub prepared: bool,
    /// PC assembled.
    pub built: bool,
    /// Handed over to the client.
    pub delivered: bool,
    /// Free-form staff note.
    pub status: Option<String>,
}

impl OrderDraft {
    pub fn from_invoice(invoice: &InvoiceData) -> Self {
        Self {
            invoice_number: invoice.invoice_number.clone(),
            store: invoice.store.clone(),
            client_name: invoice.client_name.clone(),
            product_name: invoice.product_name.clone(),
            sold_at: invoice.sold_at,
            prepared: false,
            built: false,
            delivered: false,
            status: None,
        }
    }
}

impl From<InvoiceData> for OrderDraft {
    fn from(invoice: InvoiceData) -> Self {
        Self::from_invoice(&invoice)
    }
}

/// Outcome of importing one invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    Created,
    AlreadyExists,
    Error,
}

/// Import result returned to the calling workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub status: ImportStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderDraft>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
}

impl ImportReport {
    pub fn created(order: OrderDraft) -> Self {
        Self {
            status: ImportStatus::Created,
            order: Some(order),
            errors: None,
        }
    }

    pub fn already_exists(order: OrderDraft) -> Self {
        Self {
            status: ImportStatus::AlreadyExists,
            order: Some(order),
            errors: None,
        }
    }

    /// Fail-fast error, reported as `{"code": ...}`.
    pub fn from_error(error: &ExtractionError) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert("code".to_string(), error.code().to_string());
        Self {
            status: ImportStatus::Error,
            order: None,
            errors: Some(errors),
        }
    }

    /// Collect-all errors, keyed by field name.
    pub fn from_field_errors(field_errors: &BTreeMap<Field, String>) -> Self {
        let errors = field_errors
            .iter()
            .map(|(field, message)| (field.name().to_string(), message.clone()))
            .collect();
        Self {
            status: ImportStatus::Error,
            order: None,
            errors: Some(errors),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == ImportStatus::Error
    }
}

/// Invoice numbers already imported during this run.
///
/// Invoice numbers are unique per order, so a repeated number reports
/// `already_exists` instead of creating a second order.
#[derive(Debug, Default)]
pub struct ImportLedger {
    seen: HashSet<String>,
}

impl ImportLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a parsed invoice and report whether it creates a new order.
    pub fn import(&mut self, invoice: InvoiceData) -> ImportReport {
        let order = OrderDraft::from(invoice);
        if self.seen.insert(order.invoice_number.clone()) {
            ImportReport::created(order)
        } else {
            ImportReport::already_exists(order)
        }
    }

    /// Import a fail-fast parse result.
    pub fn import_result(&mut self, result: Result<InvoiceData, ExtractionError>) -> ImportReport {
        match result {
            Ok(invoice) => self.import(invoice),
            Err(e) => ImportReport::from_error(&e),
        }
    }

    /// Import a collect-all outcome.
    pub fn import_outcome(&mut self, outcome: ExtractionOutcome) -> ImportReport {
        match outcome {
            ExtractionOutcome::Success(invoice) => self.import(invoice),
            ExtractionOutcome::Failure(errors) => ImportReport::from_field_errors(&errors),
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
