//! Invoice number extraction ("Facture N° 02-13073-1").

use regex::Regex;
use tracing::trace;

use super::patterns::{marker_regex, RuleSet, INVOICE_NUMBER_PAYLOAD};
use super::{rest_of_line, FieldExtractor};
use crate::error::FieldError;
use crate::invoice::{Field, FieldResult, NormalizedText};

/// Invoice number extractor.
///
/// Scans the unsplit text; the first occurrence in document order wins,
/// since footers often repeat the number.
#[derive(Debug, Clone)]
pub struct InvoiceNumberExtractor {
    marker: Regex,
    pattern: Regex,
}

impl InvoiceNumberExtractor {
    pub fn from_rules(rules: &RuleSet) -> Result<Self, regex::Error> {
        let marker = marker_regex(&rules.invoice_marker);
        Ok(Self {
            pattern: Regex::new(&format!("{marker}{INVOICE_NUMBER_PAYLOAD}"))?,
            marker: Regex::new(&marker)?,
        })
    }
}

impl FieldExtractor for InvoiceNumberExtractor {
    type Output = String;

    fn field(&self) -> Field {
        Field::InvoiceNumber
    }

    fn extract(&self, text: &NormalizedText<'_>) -> FieldResult<String> {
        if let Some(caps) = self.pattern.captures(text.raw) {
            let value = caps[1].trim();
            trace!("invoice number candidate {:?}", value);
            if value.chars().any(|c| c.is_ascii_digit()) {
                return Ok(value.to_string());
            }
            return Err(FieldError::malformed(self.field(), value));
        }

        match rest_of_line(&self.marker, text.raw) {
            Some(rest) => Err(FieldError::malformed(self.field(), rest)),
            None => Err(FieldError::not_found(self.field())),
        }
    }
}
