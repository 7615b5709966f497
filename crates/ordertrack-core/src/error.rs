//! Error types for the ordertrack-core library.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::invoice::Field;

/// Main error type for the ordertrack library.
#[derive(Error, Debug)]
pub enum TrackError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Invoice extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// A single text backend that gave up, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendFailure {
    /// Backend name (e.g. `pdf_extract`).
    pub backend: String,
    /// Failure reason reported by the backend.
    pub reason: String,
}

impl fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.backend, self.reason)
    }
}

/// Errors related to PDF text extraction.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Every configured backend failed.
    #[error("all text backends failed: [{}]", join_failures(.0))]
    AllBackendsFailed(Vec<BackendFailure>),
}

fn join_failures(failures: &[BackendFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Stable error codes consumed by the calling workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    PdfTextExtractionFailed,
    MissingInvoiceNumber,
    MissingSoldAt,
    MissingStore,
    MissingClient,
    MissingProduct,
}

impl ErrorCode {
    /// The wire form of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::PdfTextExtractionFailed => "PDF_TEXT_EXTRACTION_FAILED",
            ErrorCode::MissingInvoiceNumber => "MISSING_INVOICE_NUMBER",
            ErrorCode::MissingSoldAt => "MISSING_SOLD_AT",
            ErrorCode::MissingStore => "MISSING_STORE",
            ErrorCode::MissingClient => "MISSING_CLIENT",
            ErrorCode::MissingProduct => "MISSING_PRODUCT",
        }
    }

    /// French message shown to shop staff.
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorCode::PdfTextExtractionFailed => "Impossible de lire le texte du PDF",
            ErrorCode::MissingInvoiceNumber => "Numéro de facture introuvable dans la facture",
            ErrorCode::MissingSoldAt => "Date de vente introuvable dans la facture",
            ErrorCode::MissingStore => "Magasin introuvable dans la facture",
            ErrorCode::MissingClient => "Nom du client introuvable dans la facture",
            ErrorCode::MissingProduct => "Produit introuvable dans la facture",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a field has no value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Absence {
    /// The marker or pattern does not occur in the document.
    NotFound,
    /// The marker was found but its payload did not parse.
    Malformed { value: String },
}

/// A field that could not be positively matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub absence: Absence,
}

impl FieldError {
    pub fn not_found(field: Field) -> Self {
        Self {
            field,
            absence: Absence::NotFound,
        }
    }

    pub fn malformed(field: Field, value: impl Into<String>) -> Self {
        Self {
            field,
            absence: Absence::Malformed {
                value: value.into(),
            },
        }
    }

    /// Stable code for the missing field.
    pub fn code(&self) -> ErrorCode {
        self.field.error_code()
    }

    /// Human-readable description used in collect-all error maps.
    pub fn description(&self) -> String {
        match &self.absence {
            Absence::NotFound => format!("{} not found", self.field.label()),
            Absence::Malformed { value } => {
                format!("{} malformed: {:?}", self.field.label(), value)
            }
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code(), self.description())
    }
}

impl std::error::Error for FieldError {}

/// Errors related to invoice field extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Text could not be recovered from the PDF container.
    #[error("PDF_TEXT_EXTRACTION_FAILED: {0}")]
    TextExtraction(#[from] PdfError),

    /// A required field is missing or malformed.
    #[error("{0}")]
    MissingField(#[from] FieldError),
}

impl ExtractionError {
    /// Stable code identifying the failure kind.
    pub fn code(&self) -> ErrorCode {
        match self {
            ExtractionError::TextExtraction(_) => ErrorCode::PdfTextExtractionFailed,
            ExtractionError::MissingField(e) => e.code(),
        }
    }
}

/// Result type for the ordertrack library.
pub type Result<T> = std::result::Result<T, TrackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(ErrorCode::PdfTextExtractionFailed.as_str(), "PDF_TEXT_EXTRACTION_FAILED");
        assert_eq!(ErrorCode::MissingInvoiceNumber.as_str(), "MISSING_INVOICE_NUMBER");
        assert_eq!(ErrorCode::MissingSoldAt.as_str(), "MISSING_SOLD_AT");
        assert_eq!(ErrorCode::MissingStore.as_str(), "MISSING_STORE");
        assert_eq!(ErrorCode::MissingClient.as_str(), "MISSING_CLIENT");
        assert_eq!(ErrorCode::MissingProduct.as_str(), "MISSING_PRODUCT");
    }

    #[test]
    fn test_error_code_serializes_as_wire_string() {
        let json = serde_json::to_string(&ErrorCode::MissingSoldAt).unwrap();
        assert_eq!(json, "\"MISSING_SOLD_AT\"");
    }

    #[test]
    fn test_extraction_error_code() {
        let err = ExtractionError::from(FieldError::not_found(Field::ClientName));
        assert_eq!(err.code(), ErrorCode::MissingClient);

        let err = ExtractionError::from(PdfError::AllBackendsFailed(vec![]));
        assert_eq!(err.code(), ErrorCode::PdfTextExtractionFailed);
    }

    #[test]
    fn test_text_extraction_message_starts_with_code() {
        let err = ExtractionError::from(PdfError::NoPages);
        assert!(err.to_string().starts_with("PDF_TEXT_EXTRACTION_FAILED: "));
        assert!(err.to_string().ends_with(&PdfError::NoPages.to_string()));
    }

    #[test]
    fn test_all_backends_failed_keeps_reasons() {
        let err = PdfError::AllBackendsFailed(vec![
            BackendFailure {
                backend: "pdf_extract".to_string(),
                reason: "bad xref".to_string(),
            },
            BackendFailure {
                backend: "lopdf".to_string(),
                reason: "no pages".to_string(),
            },
        ]);
        let message = err.to_string();
        assert!(message.contains("pdf_extract: bad xref"));
        assert!(message.contains("lopdf: no pages"));
    }
}
