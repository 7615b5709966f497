//! Core library for PC-build order tracking.
//!
//! This crate provides:
//! - PDF text recovery through an ordered chain of backends
//! - Field extraction from French sales invoices (invoice number, sale
//!   timestamp, store, client, product)
//! - Fail-fast and collect-all result assembly with stable error codes
//! - Order drafts and import reports built from extracted invoices

pub mod error;
pub mod invoice;
pub mod models;
pub mod pdf;

pub use error::{Absence, ErrorCode, ExtractionError, FieldError, PdfError, Result, TrackError};
pub use invoice::rules::{CompiledRules, FieldExtractor, RuleSet};
pub use invoice::{ExtractionOutcome, Field, FieldOutcomes, InvoiceParser, NormalizedText};
pub use models::config::TrackConfig;
pub use models::invoice::InvoiceData;
pub use models::order::{ImportLedger, ImportReport, ImportStatus, OrderDraft};
pub use pdf::{BackendChain, BackendKind, TextBackend};
