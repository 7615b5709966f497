//! Invoice parser assembling the five field extractors.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ExtractionError, PdfError, TrackError};
use crate::models::config::TrackConfig;
use crate::models::invoice::InvoiceData;
use crate::pdf::BackendChain;

use super::rules::{CompiledRules, FieldExtractor};
use super::{Field, FieldResult, NormalizedText};

/// Per-field outcomes of one extraction pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOutcomes {
    pub invoice_number: FieldResult<String>,
    pub sold_at: FieldResult<NaiveDateTime>,
    pub store: FieldResult<String>,
    pub client_name: FieldResult<String>,
    pub product_name: FieldResult<String>,
}

impl FieldOutcomes {
    /// Failure descriptions keyed by field, in extraction order.
    pub fn errors(&self, require_store: bool) -> BTreeMap<Field, String> {
        let mut errors = BTreeMap::new();
        let failures = [
            self.invoice_number.as_ref().err(),
            self.sold_at.as_ref().err(),
            self.store.as_ref().err().filter(|_| require_store),
            self.client_name.as_ref().err(),
            self.product_name.as_ref().err(),
        ];
        for error in failures.into_iter().flatten() {
            errors.insert(error.field, error.description());
        }
        errors
    }

    /// Combine the outcomes into a record, or every failure at once.
    pub fn into_outcome(self, require_store: bool) -> ExtractionOutcome {
        let errors = self.errors(require_store);

        match self {
            FieldOutcomes {
                invoice_number: Ok(invoice_number),
                sold_at: Ok(sold_at),
                store,
                client_name: Ok(client_name),
                product_name: Ok(product_name),
            } if errors.is_empty() => ExtractionOutcome::Success(InvoiceData {
                invoice_number,
                sold_at,
                store: store.ok(),
                client_name,
                product_name,
            }),
            _ => ExtractionOutcome::Failure(errors),
        }
    }
}

/// Result of a collect-all extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionOutcome {
    Success(InvoiceData),
    Failure(BTreeMap<Field, String>),
}

impl ExtractionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExtractionOutcome::Success(_))
    }

    pub fn invoice(&self) -> Option<&InvoiceData> {
        match self {
            ExtractionOutcome::Success(invoice) => Some(invoice),
            ExtractionOutcome::Failure(_) => None,
        }
    }

    /// Field errors; empty on success.
    pub fn errors(&self) -> BTreeMap<Field, String> {
        match self {
            ExtractionOutcome::Success(_) => BTreeMap::new(),
            ExtractionOutcome::Failure(errors) => errors.clone(),
        }
    }
}

/// Rule-based invoice parser.
///
/// Stateless between calls; one instance can serve many threads.
pub struct InvoiceParser {
    rules: CompiledRules,
    backends: BackendChain,
    /// Whether a missing store line fails the extraction.
    require_store: bool,
}

impl InvoiceParser {
    /// Create a parser with the built-in rules and PDF backends.
    pub fn new() -> Self {
        Self {
            rules: CompiledRules::default(),
            backends: BackendChain::default(),
            require_store: true,
        }
    }

    /// Build a parser from configuration, compiling its rule set.
    pub fn from_config(config: &TrackConfig) -> Result<Self, TrackError> {
        let rules = CompiledRules::new(&config.extraction.rules)
            .map_err(|e| TrackError::Config(format!("invalid extraction rule: {}", e)))?;

        Ok(Self {
            rules,
            backends: BackendChain::from_config(&config.pdf),
            require_store: config.extraction.require_store,
        })
    }

    /// Set whether a missing store fails the extraction.
    pub fn with_require_store(mut self, require: bool) -> Self {
        self.require_store = require;
        self
    }

    /// Replace the PDF text backends.
    pub fn with_backends(mut self, backends: BackendChain) -> Self {
        self.backends = backends;
        self
    }

    /// Replace the compiled extraction rules.
    pub fn with_rules(mut self, rules: CompiledRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn requires_store(&self) -> bool {
        self.require_store
    }

    /// Run all five extractors over the same text.
    pub fn extract_fields(&self, text: &str) -> FieldOutcomes {
        let doc = NormalizedText::new(text);
        debug!("Extracting fields from {} lines", doc.lines.len());

        FieldOutcomes {
            invoice_number: self.rules.invoice_number.extract(&doc),
            sold_at: self.rules.sold_at.extract(&doc),
            store: self.rules.store.extract(&doc),
            client_name: self.rules.client.extract(&doc),
            product_name: self.rules.product.extract(&doc),
        }
    }

    /// Fail-fast parse: stop at the first missing field.
    pub fn parse(&self, text: &str) -> Result<InvoiceData, ExtractionError> {
        let doc = NormalizedText::new(text);
        info!("Parsing invoice from {} characters of text", text.len());

        let invoice_number = self.rules.invoice_number.extract(&doc)?;
        let sold_at = self.rules.sold_at.extract(&doc)?;
        let store = match self.rules.store.extract(&doc) {
            Ok(store) => Some(store),
            Err(_) if !self.require_store => {
                debug!("Store not found, continuing without it");
                None
            }
            Err(e) => return Err(e.into()),
        };
        let client_name = self.rules.client.extract(&doc)?;
        let product_name = self.rules.product.extract(&doc)?;

        let invoice = InvoiceData {
            invoice_number,
            sold_at,
            store,
            client_name,
            product_name,
        };
        log_preview(&invoice);
        Ok(invoice)
    }

    /// Collect-all parse: run every extractor, then report all failures.
    pub fn parse_collect_all(&self, text: &str) -> ExtractionOutcome {
        info!("Parsing invoice from {} characters of text", text.len());

        let outcome = self.extract_fields(text).into_outcome(self.require_store);
        match &outcome {
            ExtractionOutcome::Success(invoice) => log_preview(invoice),
            ExtractionOutcome::Failure(errors) => {
                debug!("Extraction failed for {} field(s): {:?}", errors.len(), errors.keys());
            }
        }
        outcome
    }

    /// Recover the text of a PDF through the configured backends.
    pub fn extract_text(&self, data: &[u8]) -> Result<String, PdfError> {
        self.backends.extract_text(data)
    }

    /// Fail-fast parse of a PDF document.
    pub fn parse_pdf(&self, data: &[u8]) -> Result<InvoiceData, ExtractionError> {
        let text = self.extract_text(data)?;
        self.parse(&text)
    }

    /// Collect-all parse of a PDF document.
    pub fn parse_pdf_collect_all(&self, data: &[u8]) -> Result<ExtractionOutcome, PdfError> {
        let text = self.extract_text(data)?;
        Ok(self.parse_collect_all(&text))
    }
}

impl Default for InvoiceParser {
    fn default() -> Self {
        Self::new()
    }
}

fn log_preview(invoice: &InvoiceData) {
    info!(
        invoice = %invoice.invoice_number,
        sold_at = %invoice.sold_at,
        store = invoice.store.as_deref().unwrap_or("-"),
        client = %invoice.client_name,
        product = %invoice.product_name,
        "Invoice parse preview"
    );
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::{ErrorCode, FieldError};
    use crate::pdf::PlainTextBackend;

    const INVOICE: &str = r#"
        DREAM STATION Lyon
        12 rue de la République, 69002 Lyon

        Facture N° 02-13073-1
        Date : 16/01/2026, 10:01:41

        Mme Jane Doe
        4 place Bellecour

        PACK COMPLET PC GAMER Raijin        1   1 499,00
        PC GAMER Raijin - CPU Ryzen 5 7600
        PC GAMER Raijin - Carte graphique RTX 4070
        PC GAMER Raijin

        Total TTC 1 499,00
        Facture N° 02-13073-1 - page 1/1
    "#;

    fn expected() -> InvoiceData {
        InvoiceData {
            invoice_number: "02-13073-1".to_string(),
            sold_at: NaiveDate::from_ymd_opt(2026, 1, 16)
                .unwrap()
                .and_hms_opt(10, 1, 41)
                .unwrap(),
            store: Some("DREAM STATION Lyon".to_string()),
            client_name: "Mme Jane Doe".to_string(),
            product_name: "PACK COMPLET PC GAMER Raijin 1 1 499,00".to_string(),
        }
    }

    #[test]
    fn test_parse_basic_invoice() {
        let parser = InvoiceParser::new();
        assert_eq!(parser.parse(INVOICE).unwrap(), expected());
    }

    #[test]
    fn test_collect_all_matches_fail_fast() {
        let parser = InvoiceParser::new();
        let outcome = parser.parse_collect_all(INVOICE);
        assert!(outcome.errors().is_empty());
        assert_eq!(outcome, ExtractionOutcome::Success(expected()));
    }

    #[test]
    fn test_fail_fast_stops_at_first_missing_field() {
        let text = INVOICE.replace("Facture N°", "Devis").replace("Mme Jane Doe", "Jane Doe");
        let err = InvoiceParser::new().parse(&text).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MissingInvoiceNumber);
    }

    #[test]
    fn test_collect_all_reports_every_missing_field() {
        let text = INVOICE.replace("Facture N°", "Devis").replace("Mme Jane Doe", "Jane Doe");
        let errors = InvoiceParser::new().parse_collect_all(&text).errors();
        assert_eq!(
            errors.keys().copied().collect::<Vec<_>>(),
            vec![Field::InvoiceNumber, Field::ClientName]
        );
        assert_eq!(errors[&Field::InvoiceNumber], "Invoice number not found");
        assert_eq!(errors[&Field::ClientName], "Client name not found");
    }

    #[test]
    fn test_store_optional_when_not_required() {
        let text = INVOICE.replace("DREAM STATION Lyon", "Boutique Lyon");
        let strict = InvoiceParser::new();
        assert_eq!(strict.parse(&text).unwrap_err().code(), ErrorCode::MissingStore);
        assert_eq!(
            strict.parse_collect_all(&text).errors().keys().copied().collect::<Vec<_>>(),
            vec![Field::Store]
        );

        let lenient = InvoiceParser::new().with_require_store(false);
        let invoice = lenient.parse(&text).unwrap();
        assert_eq!(invoice.store, None);
        assert_eq!(lenient.parse_collect_all(&text).invoice(), Some(&invoice));
    }

    #[test]
    fn test_extract_fields_exposes_store_absence() {
        let text = INVOICE.replace("DREAM STATION Lyon", "Boutique Lyon");
        let outcomes = InvoiceParser::new().with_require_store(false).extract_fields(&text);
        assert_eq!(outcomes.store, Err(FieldError::not_found(Field::Store)));
        assert!(outcomes.errors(false).is_empty());
        assert_eq!(outcomes.errors(true).len(), 1);
    }

    #[test]
    fn test_parse_pdf_surfaces_text_extraction_failure() {
        let parser = InvoiceParser::new().with_backends(BackendChain::new());
        let err = parser.parse_pdf(b"%PDF-1.7").unwrap_err();
        assert_eq!(err.code(), ErrorCode::PdfTextExtractionFailed);
        assert!(parser.parse_pdf_collect_all(b"%PDF-1.7").is_err());
    }

    #[test]
    fn test_parse_through_plain_text_backend() {
        let parser = InvoiceParser::new()
            .with_backends(BackendChain::new().with_backend(PlainTextBackend));
        assert_eq!(parser.parse_pdf(INVOICE.as_bytes()).unwrap(), expected());
    }

    #[test]
    fn test_with_rules_swaps_extractors() {
        let mut rules = crate::invoice::rules::RuleSet::default();
        rules.store_brand = "Boutique".to_string();
        let parser = InvoiceParser::new().with_rules(CompiledRules::new(&rules).unwrap());
        assert!(parser.requires_store());

        let text = INVOICE.replace("DREAM STATION Lyon", "Boutique Lyon");
        assert_eq!(parser.parse(&text).unwrap().store.as_deref(), Some("Boutique Lyon"));
        assert_eq!(parser.parse(INVOICE).unwrap_err().code(), ErrorCode::MissingStore);
        assert!(!parser.with_require_store(false).requires_store());
    }

    #[test]
    fn test_from_config_rejects_invalid_rules() {
        let mut config = TrackConfig::default();
        config.extraction.rules.product_family = "(".to_string();
        assert!(matches!(
            InvoiceParser::from_config(&config),
            Err(TrackError::Config(_))
        ));
    }

    #[test]
    fn test_from_config_custom_brand() {
        let mut config = TrackConfig::default();
        config.extraction.rules.store_brand = "Boutique".to_string();
        let parser = InvoiceParser::from_config(&config).unwrap();
        let text = INVOICE.replace("DREAM STATION Lyon", "Boutique Lyon");
        assert_eq!(parser.parse(&text).unwrap().store.as_deref(), Some("Boutique Lyon"));
    }
}
