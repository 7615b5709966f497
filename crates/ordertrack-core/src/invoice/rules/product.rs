//! Product line extraction with component filtering and deduplication.

use std::collections::HashSet;

use regex::Regex;
use tracing::trace;

use super::patterns::RuleSet;
use super::FieldExtractor;
use crate::error::FieldError;
use crate::invoice::{collapse_whitespace, Field, FieldResult, NormalizedText};

/// Product extractor.
///
/// Invoices list the top-level product more than once and mix it with
/// component line items that also mention the product family. Lines naming
/// a component keyword are dropped, the rest are deduplicated on their
/// lower-cased form, and the first survivor in document order is the
/// canonical product description.
#[derive(Debug, Clone)]
pub struct ProductExtractor {
    family: Regex,
    component_keywords: Vec<String>,
}

impl ProductExtractor {
    pub fn from_rules(rules: &RuleSet) -> Result<Self, regex::Error> {
        let component_keywords = rules
            .component_keywords
            .iter()
            .map(|k| collapse_whitespace(k).to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        Ok(Self {
            family: Regex::new(&rules.product_family)?,
            component_keywords,
        })
    }

    /// Component keyword contained in `line`, if any.
    pub fn component_keyword(&self, line: &str) -> Option<&str> {
        let key = collapse_whitespace(line).to_lowercase();
        self.component_keywords
            .iter()
            .find(|keyword| key.contains(keyword.as_str()))
            .map(String::as_str)
    }

    /// Distinct top-level product lines in document order.
    pub fn candidates(&self, lines: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut products = Vec::new();

        for line in lines {
            if !self.family.is_match(line) {
                continue;
            }

            let cleaned = collapse_whitespace(line);
            if let Some(keyword) = self.component_keyword(&cleaned) {
                trace!("skipping component line {:?} (keyword {:?})", cleaned, keyword);
                continue;
            }

            if seen.insert(cleaned.to_lowercase()) {
                products.push(cleaned);
            }
        }

        products
    }
}

impl FieldExtractor for ProductExtractor {
    type Output = String;

    fn field(&self) -> Field {
        Field::ProductName
    }

    fn extract(&self, text: &NormalizedText<'_>) -> FieldResult<String> {
        self.candidates(&text.lines)
            .into_iter()
            .next()
            .ok_or_else(|| FieldError::not_found(self.field()))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn extractor() -> ProductExtractor {
        ProductExtractor::from_rules(&RuleSet::default()).unwrap()
    }

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_canonical_product_wins() {
        let text = NormalizedText::new(
            "PACK COMPLET PC GAMER Raijin\nPC GAMER Raijin - CPU Ryzen 5\nPC GAMER Raijin\nPC GAMER Raijin",
        );
        assert_eq!(extractor().extract(&text).unwrap(), "PACK COMPLET PC GAMER Raijin");
    }

    #[test]
    fn test_candidates_are_deduplicated_case_insensitively() {
        let candidates = extractor().candidates(&lines(&[
            "PC GAMER Raijin",
            "pc gamer  RAIJIN",
            "Écran 27 pouces",
            "PACK COMPLET PC GAMER Raijin",
            "PC GAMER Raijin",
        ]));
        assert_eq!(
            candidates,
            vec!["PC GAMER Raijin", "PACK COMPLET PC GAMER Raijin"]
        );
    }

    #[test]
    fn test_component_lines_are_dropped() {
        let extractor = extractor();
        let components = [
            "PC GAMER Raijin - Boitier NZXT H5",
            "PC GAMER Raijin - CPU Ryzen 5 7600",
            "PC GAMER Raijin - Carte mere B650",
            "PC GAMER Raijin - CARTE MÈRE B650",
            "PC GAMER Raijin - RAM 32 Go DDR5",
            "PC GAMER Raijin - SSD 1 To",
            "PC GAMER Raijin - Ventirad",
            "PC GAMER Raijin - Carte graphique RTX 4070",
            "PC GAMER Raijin - Alimentation 750W",
        ];
        for line in components {
            assert!(extractor.component_keyword(line).is_some(), "{line}");
        }
        assert!(extractor.candidates(&lines(&components)).is_empty());
    }

    #[test]
    fn test_family_spacing_and_case() {
        let text = NormalizedText::new("Pack Complet   pc\tgamer Kaze");
        assert_eq!(extractor().extract(&text).unwrap(), "Pack Complet pc gamer Kaze");
    }

    #[test]
    fn test_only_components_is_missing() {
        let text = NormalizedText::new("PC GAMER Raijin - CPU Ryzen 5\nPC GAMER Raijin - SSD 1 To");
        assert_eq!(
            extractor().extract(&text).unwrap_err(),
            FieldError::not_found(Field::ProductName)
        );
    }

    #[test]
    fn test_no_family_line_is_missing() {
        let text = NormalizedText::new("Souris sans fil\nClavier mécanique");
        assert!(extractor().extract(&text).is_err());
    }

    #[test]
    fn test_extended_keyword_table() {
        let mut rules = RuleSet::default();
        rules.component_keywords.push("watercooling".to_string());
        let extractor = ProductExtractor::from_rules(&rules).unwrap();
        let text = NormalizedText::new("PC GAMER Raijin Watercooling 360\nPC GAMER Raijin");
        assert_eq!(extractor.extract(&text).unwrap(), "PC GAMER Raijin");
    }
}
