//! Rule-based field extractors for French sales invoices.

pub mod client;
pub mod invoice_number;
pub mod patterns;
pub mod product;
pub mod sold_at;
pub mod store;

pub use client::ClientExtractor;
pub use invoice_number::InvoiceNumberExtractor;
pub use patterns::{RuleSet, DEFAULT_RULES};
pub use product::ProductExtractor;
pub use sold_at::SoldAtExtractor;
pub use store::StoreExtractor;

use super::{Field, FieldResult, NormalizedText};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// The field this extractor fills.
    fn field(&self) -> Field;

    /// Extract the field, or report precisely why it is absent.
    fn extract(&self, text: &NormalizedText<'_>) -> FieldResult<Self::Output>;
}

/// The five extractors compiled from one [`RuleSet`].
#[derive(Debug, Clone)]
pub struct CompiledRules {
    pub invoice_number: InvoiceNumberExtractor,
    pub sold_at: SoldAtExtractor,
    pub store: StoreExtractor,
    pub client: ClientExtractor,
    pub product: ProductExtractor,
}

impl CompiledRules {
    /// Compile every pattern of a rule set.
    pub fn new(rules: &RuleSet) -> Result<Self, regex::Error> {
        Ok(Self {
            invoice_number: InvoiceNumberExtractor::from_rules(rules)?,
            sold_at: SoldAtExtractor::from_rules(rules)?,
            store: StoreExtractor::from_rules(rules),
            client: ClientExtractor::from_rules(rules)?,
            product: ProductExtractor::from_rules(rules)?,
        })
    }
}

impl Default for CompiledRules {
    fn default() -> Self {
        DEFAULT_RULES.clone()
    }
}

/// Text following the first occurrence of `marker`, up to the end of its line.
pub(crate) fn rest_of_line<'t>(marker: &regex::Regex, text: &'t str) -> Option<&'t str> {
    let m = marker.find(text)?;
    let rest = &text[m.end()..];
    let end = rest.find(['\n', '\r']).unwrap_or(rest.len());
    Some(rest[..end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_default_rules() {
        let rules = CompiledRules::new(&RuleSet::default()).unwrap();
        assert_eq!(rules.invoice_number.field(), Field::InvoiceNumber);
        assert_eq!(rules.product.field(), Field::ProductName);
    }

    #[test]
    fn test_invalid_product_pattern_is_rejected() {
        let rules = RuleSet {
            product_family: "PC (GAMER".to_string(),
            ..RuleSet::default()
        };
        assert!(CompiledRules::new(&rules).is_err());
    }

    #[test]
    fn test_rest_of_line() {
        let marker = regex::Regex::new("Date").unwrap();
        assert_eq!(rest_of_line(&marker, "x\nDate : demain \nsuite"), Some(": demain"));
        assert_eq!(rest_of_line(&marker, "rien"), None);
    }
}
