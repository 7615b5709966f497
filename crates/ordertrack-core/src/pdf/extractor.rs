//! PDF text backends using pdf-extract and lopdf.

use std::panic::{self, AssertUnwindSafe};

use lopdf::Document;
use tracing::debug;

use super::{Result, TextBackend};
use crate::error::PdfError;

/// Text extraction through the `pdf-extract` crate.
///
/// `pdf-extract` panics on some malformed files, so calls run behind
/// `catch_unwind` and a panic is reported as an ordinary failure.
#[derive(Debug, Clone, Default)]
pub struct PdfExtractBackend;

impl PdfExtractBackend {
    pub fn new() -> Self {
        Self
    }
}

impl TextBackend for PdfExtractBackend {
    fn name(&self) -> &'static str {
        "pdf_extract"
    }

    fn extract_text(&self, data: &[u8]) -> Result<String> {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(data)
        }));

        match result {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(PdfError::TextExtraction(e.to_string())),
            Err(_) => Err(PdfError::TextExtraction(
                "pdf-extract panicked (malformed document)".to_string(),
            )),
        }
    }
}

/// Text extraction through `lopdf`'s content-stream decoder.
#[derive(Debug, Clone, Default)]
pub struct LopdfBackend;

impl LopdfBackend {
    pub fn new() -> Self {
        Self
    }

    fn load(&self, data: &[u8]) -> Result<Document> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
        }

        Ok(doc)
    }
}

impl TextBackend for LopdfBackend {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn extract_text(&self, data: &[u8]) -> Result<String> {
        let doc = self.load(data)?;

        let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
        if pages.is_empty() {
            return Err(PdfError::NoPages);
        }

        let mut text = String::new();
        for page in pages {
            let page_text = doc
                .extract_text(&[page])
                .map_err(|e| PdfError::TextExtraction(format!("page {}: {}", page, e)))?;
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&page_text);
        }

        debug!("lopdf extracted {} characters", text.len());
        Ok(text)
    }
}

/// Backend for input that is already UTF-8 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextBackend;

impl TextBackend for PlainTextBackend {
    fn name(&self) -> &'static str {
        "plain_text"
    }

    fn extract_text(&self, data: &[u8]) -> Result<String> {
        String::from_utf8(data.to_vec()).map_err(|e| PdfError::TextExtraction(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_extract_rejects_garbage() {
        assert!(PdfExtractBackend::new().extract_text(b"not a pdf").is_err());
    }

    #[test]
    fn test_lopdf_rejects_garbage() {
        assert!(matches!(
            LopdfBackend::new().extract_text(b"not a pdf"),
            Err(PdfError::Parse(_))
        ));
    }

    #[test]
    fn test_plain_text_backend() {
        let text = PlainTextBackend.extract_text("Facture N° 02-13073-1".as_bytes()).unwrap();
        assert_eq!(text, "Facture N° 02-13073-1");
        assert!(PlainTextBackend.extract_text(&[0xff, 0xfe]).is_err());
    }
}
