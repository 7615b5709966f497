//! Pattern tables for French sales invoices.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use super::CompiledRules;

/// Label printed before the invoice number.
pub const INVOICE_MARKER: &str = "Facture N°";

/// Label printed before the sale date and time.
pub const DATE_MARKER: &str = "Date :";

/// Brand substring identifying the store line.
pub const STORE_BRAND: &str = "DREAM STATION";

/// Honorifics that open a client-name line.
pub const HONORIFICS: &[&str] = &["Mme", "M.", "Mr", "Mlle"];

/// Product-family pattern for top-level product lines.
pub const PRODUCT_FAMILY: &str = r"(?i)(?:PACK COMPLET\s+)?PC\s+GAMER";

/// Keywords marking a line as a component line item.
pub const COMPONENT_KEYWORDS: &[&str] = &[
    "boitier",
    "cpu",
    "carte mere",
    "carte mère",
    "ram",
    "ssd",
    "ventirad",
    "carte graphique",
    "alimentation",
];

/// Date/time layout following the date marker (day-month-year).
pub const SOLD_AT_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Configurable pattern table driving the field extractors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    /// Invoice-number label (case-sensitive).
    pub invoice_marker: String,

    /// Sale date label (case-sensitive).
    pub date_marker: String,

    /// Store brand substring (case-insensitive).
    pub store_brand: String,

    /// Client-name honorifics, anchored at line start.
    pub honorifics: Vec<String>,

    /// Product-family regex.
    pub product_family: String,

    /// Component keywords, compared against lower-cased lines.
    pub component_keywords: Vec<String>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            invoice_marker: INVOICE_MARKER.to_string(),
            date_marker: DATE_MARKER.to_string(),
            store_brand: STORE_BRAND.to_string(),
            honorifics: HONORIFICS.iter().map(|s| s.to_string()).collect(),
            product_family: PRODUCT_FAMILY.to_string(),
            component_keywords: COMPONENT_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl RuleSet {
    /// Rule name to pattern pairs, in extractor order.
    pub fn named_patterns(&self) -> Vec<(&'static str, String)> {
        vec![
            ("invoice_marker", self.invoice_marker.clone()),
            ("date_marker", self.date_marker.clone()),
            ("store_brand", self.store_brand.clone()),
            ("honorifics", self.honorifics.join("|")),
            ("product_family", self.product_family.clone()),
            ("component_keywords", self.component_keywords.join("|")),
        ]
    }
}

/// Turn a printed label into a regex that tolerates layout whitespace.
///
/// Words are separated by `\s+`; a token starting with punctuation may
/// follow the previous one with no space at all ("Date:" and "Date :").
pub fn marker_regex(marker: &str) -> String {
    let mut pattern = String::new();
    for (i, token) in marker.split_whitespace().enumerate() {
        if i > 0 {
            let glued = token.chars().next().is_some_and(|c| !c.is_alphanumeric());
            pattern.push_str(if glued { r"\s*" } else { r"\s+" });
        }
        pattern.push_str(&regex::escape(token));
    }
    pattern
}

/// Date and time payload following the date marker.
pub const SOLD_AT_PAYLOAD: &str = r"\s*([0-9]{2}/[0-9]{2}/[0-9]{4}),\s*([0-9]{2}:[0-9]{2}:[0-9]{2})";

/// Digit/hyphen run following the invoice marker.
pub const INVOICE_NUMBER_PAYLOAD: &str = r"\s*([0-9-]+)";

lazy_static! {
    /// Rules compiled from the built-in tables.
    pub static ref DEFAULT_RULES: CompiledRules =
        CompiledRules::new(&RuleSet::default()).unwrap();
}
