//! PDF text extraction module.
//!
//! The container format is handled by third-party crates; this module only
//! chains them so that the first backend producing text wins.

mod extractor;

pub use extractor::{LopdfBackend, PdfExtractBackend, PlainTextBackend};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{BackendFailure, PdfError};
use crate::models::config::PdfConfig;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for text extraction backends.
pub trait TextBackend: Send + Sync {
    /// Short name used in logs and failure reports.
    fn name(&self) -> &'static str;

    /// Recover the text of a whole document.
    fn extract_text(&self, data: &[u8]) -> Result<String>;
}

/// Selectable backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// `pdf-extract` crate.
    PdfExtract,
    /// `lopdf` built-in text extraction.
    Lopdf,
    /// Input is already UTF-8 text.
    PlainText,
}

impl BackendKind {
    pub fn create(&self) -> Box<dyn TextBackend> {
        match self {
            BackendKind::PdfExtract => Box::new(PdfExtractBackend::new()),
            BackendKind::Lopdf => Box::new(LopdfBackend::new()),
            BackendKind::PlainText => Box::new(PlainTextBackend),
        }
    }
}

/// Ordered list of backends tried in sequence.
pub struct BackendChain {
    backends: Vec<Box<dyn TextBackend>>,
    min_text_length: usize,
}

impl BackendChain {
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
            min_text_length: 1,
        }
    }

    pub fn from_config(config: &PdfConfig) -> Self {
        let mut chain = Self::new().with_min_text_length(config.min_text_length);
        for kind in &config.backends {
            chain.backends.push(kind.create());
        }
        chain
    }

    /// Append a backend at the end of the chain.
    pub fn with_backend(mut self, backend: impl TextBackend + 'static) -> Self {
        self.backends.push(Box::new(backend));
        self
    }

    /// Set the minimum non-whitespace length a result needs to be accepted.
    pub fn with_min_text_length(mut self, min_text_length: usize) -> Self {
        self.min_text_length = min_text_length;
        self
    }

    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Run backends in order and return the first usable text.
    ///
    /// Fails with every backend's reason once the chain is exhausted.
    pub fn extract_text(&self, data: &[u8]) -> Result<String> {
        let mut failures = Vec::with_capacity(self.backends.len());

        for backend in &self.backends {
            let reason = match backend.extract_text(data) {
                Ok(text) => {
                    let chars = text.chars().filter(|c| !c.is_whitespace()).count();
                    if chars >= self.min_text_length {
                        debug!("Backend {} extracted {} characters", backend.name(), chars);
                        return Ok(text);
                    }
                    format!("only {} non-whitespace characters extracted", chars)
                }
                Err(e) => e.to_string(),
            };

            warn!("Text backend {} failed: {}", backend.name(), reason);
            failures.push(BackendFailure {
                backend: backend.name().to_string(),
                reason,
            });
        }

        Err(PdfError::AllBackendsFailed(failures))
    }
}

impl Default for BackendChain {
    fn default() -> Self {
        Self::from_config(&PdfConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    struct Fixed(&'static str, std::result::Result<&'static str, &'static str>, Arc<AtomicUsize>);

    impl TextBackend for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        fn extract_text(&self, _data: &[u8]) -> Result<String> {
            self.2.fetch_add(1, Ordering::SeqCst);
            self.1
                .map(str::to_string)
                .map_err(|e| PdfError::TextExtraction(e.to_string()))
        }
    }

    #[test]
    fn test_default_chain_order() {
        assert_eq!(BackendChain::default().backend_names(), vec!["pdf_extract", "lopdf"]);
    }

    #[test]
    fn test_first_success_wins() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = BackendChain::new()
            .with_backend(Fixed("a", Err("boom"), calls.clone()))
            .with_backend(Fixed("b", Ok("Facture N° 1"), calls.clone()))
            .with_backend(Fixed("c", Ok("never"), calls.clone()));

        assert_eq!(chain.extract_text(b"").unwrap(), "Facture N° 1");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_exhausted_chain_reports_each_backend() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = BackendChain::new()
            .with_backend(Fixed("a", Err("bad xref"), calls.clone()))
            .with_backend(Fixed("b", Ok("  \n "), calls.clone()));

        match chain.extract_text(b"") {
            Err(PdfError::AllBackendsFailed(failures)) => {
                assert_eq!(failures.len(), 2);
                assert_eq!(failures[0].backend, "a");
                assert!(failures[0].reason.contains("bad xref"));
                assert_eq!(failures[1].backend, "b");
                assert!(failures[1].reason.contains("0 non-whitespace"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_empty_chain_fails() {
        assert!(matches!(
            BackendChain::new().extract_text(b"%PDF-1.7"),
            Err(PdfError::AllBackendsFailed(failures)) if failures.is_empty()
        ));
    }
}
