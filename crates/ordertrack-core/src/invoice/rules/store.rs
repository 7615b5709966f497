//! Store line extraction.

use super::patterns::RuleSet;
use super::FieldExtractor;
use crate::error::FieldError;
use crate::invoice::{collapse_whitespace, Field, FieldResult, NormalizedText};

/// Store extractor: first line containing the brand, case-insensitive.
///
/// Absence is always reported; whether it is fatal is up to the caller.
#[derive(Debug, Clone)]
pub struct StoreExtractor {
    brand: String,
}

impl StoreExtractor {
    pub fn from_rules(rules: &RuleSet) -> Self {
        Self {
            brand: collapse_whitespace(&rules.store_brand).to_lowercase(),
        }
    }
}

impl FieldExtractor for StoreExtractor {
    type Output = String;

    fn field(&self) -> Field {
        Field::Store
    }

    fn extract(&self, text: &NormalizedText<'_>) -> FieldResult<String> {
        if self.brand.is_empty() {
            return Err(FieldError::not_found(self.field()));
        }

        text.lines
            .iter()
            .find(|line| line.to_lowercase().contains(&self.brand))
            .cloned()
            .ok_or_else(|| FieldError::not_found(self.field()))
    }
}
