//! Invoice field extraction module.

mod normalize;
mod parser;
pub mod rules;

pub use normalize::{collapse_whitespace, normalize_lines, NormalizedText};
pub use parser::{ExtractionOutcome, FieldOutcomes, InvoiceParser};

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, FieldError};

/// Result type for a single field extraction.
pub type FieldResult<T> = std::result::Result<T, FieldError>;

/// The five fields read from a sales invoice.
///
/// Variant order is the order in which extractors run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    InvoiceNumber,
    SoldAt,
    Store,
    ClientName,
    ProductName,
}

impl Field {
    /// All fields in extraction order.
    pub const ALL: [Field; 5] = [
        Field::InvoiceNumber,
        Field::SoldAt,
        Field::Store,
        Field::ClientName,
        Field::ProductName,
    ];

    /// Field name as used in error maps.
    pub fn name(&self) -> &'static str {
        match self {
            Field::InvoiceNumber => "invoice_number",
            Field::SoldAt => "sold_at",
            Field::Store => "store",
            Field::ClientName => "client_name",
            Field::ProductName => "product_name",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Field::InvoiceNumber => "Invoice number",
            Field::SoldAt => "Sold date",
            Field::Store => "Store",
            Field::ClientName => "Client name",
            Field::ProductName => "Product name",
        }
    }

    /// Error code reported when this field is missing.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Field::InvoiceNumber => ErrorCode::MissingInvoiceNumber,
            Field::SoldAt => ErrorCode::MissingSoldAt,
            Field::Store => ErrorCode::MissingStore,
            Field::ClientName => ErrorCode::MissingClient,
            Field::ProductName => ErrorCode::MissingProduct,
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
