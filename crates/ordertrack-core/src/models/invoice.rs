//! Structured record extracted from a sales invoice.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Fields read from one sales invoice.
///
/// Built fresh per extraction call and owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceData {
    /// Vendor invoice number (e.g. `02-13073-1`).
    pub invoice_number: String,

    /// Sale time as printed on the invoice, without timezone.
    pub sold_at: NaiveDateTime,

    /// Store line, absent when the caller tolerates a missing store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,

    /// Client line, honorific included.
    pub client_name: String,

    /// Canonical product description.
    pub product_name: String,
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn test_sold_at_serializes_as_iso_local_time() {
        let data = InvoiceData {
            invoice_number: "02-13073-1".to_string(),
            sold_at: NaiveDate::from_ymd_opt(2026, 1, 16)
                .unwrap()
                .and_hms_opt(10, 1, 41)
                .unwrap(),
            store: None,
            client_name: "Mme Jane Doe".to_string(),
            product_name: "PC GAMER Raijin".to_string(),
        };

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["sold_at"], "2026-01-16T10:01:41");
        assert!(json.get("store").is_none());
    }
}
