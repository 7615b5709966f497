//! Configuration structures for invoice import.

use serde::{Deserialize, Serialize};

use crate::invoice::rules::RuleSet;
use crate::pdf::BackendKind;

/// Main configuration for ordertrack.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    /// PDF text extraction configuration.
    pub pdf: PdfConfig,

    /// Invoice field extraction configuration.
    pub extraction: ExtractionConfig,
}

/// PDF text extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Text backends, tried in order until one succeeds.
    pub backends: Vec<BackendKind>,

    /// Minimum non-whitespace characters for a backend result to count.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            backends: vec![BackendKind::PdfExtract, BackendKind::Lopdf],
            min_text_length: 1,
        }
    }
}

/// Invoice field extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Treat a missing store line as an extraction failure.
    pub require_store: bool,

    /// Pattern tables for the field extractors.
    pub rules: RuleSet,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            require_store: true,
            rules: RuleSet::default(),
        }
    }
}

impl TrackConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
