//! Client name extraction from honorific-prefixed lines.

use regex::Regex;

use super::patterns::RuleSet;
use super::FieldExtractor;
use crate::error::FieldError;
use crate::invoice::{Field, FieldResult, NormalizedText};

/// Client extractor: first line starting with an honorific and a space.
///
/// Only line starts count, so "Informed Mme about order" is not a client.
#[derive(Debug, Clone)]
pub struct ClientExtractor {
    pattern: Option<Regex>,
}

impl ClientExtractor {
    pub fn from_rules(rules: &RuleSet) -> Result<Self, regex::Error> {
        let alternatives: Vec<String> = rules
            .honorifics
            .iter()
            .map(|h| h.trim())
            .filter(|h| !h.is_empty())
            .map(regex::escape)
            .collect();

        let pattern = if alternatives.is_empty() {
            None
        } else {
            Some(Regex::new(&format!(r"^(?:{})\s+\S", alternatives.join("|")))?)
        };

        Ok(Self { pattern })
    }
}

impl FieldExtractor for ClientExtractor {
    type Output = String;

    fn field(&self) -> Field {
        Field::ClientName
    }

    fn extract(&self, text: &NormalizedText<'_>) -> FieldResult<String> {
        let Some(pattern) = &self.pattern else {
            return Err(FieldError::not_found(self.field()));
        };

        text.lines
            .iter()
            .find(|line| pattern.is_match(line))
            .cloned()
            .ok_or_else(|| FieldError::not_found(self.field()))
    }
}
