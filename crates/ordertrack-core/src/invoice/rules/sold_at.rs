//! Sale timestamp extraction ("Date : 16/01/2026, 10:01:41").

use chrono::NaiveDateTime;
use regex::Regex;
use tracing::trace;

use super::patterns::{marker_regex, RuleSet, SOLD_AT_FORMAT, SOLD_AT_PAYLOAD};
use super::{rest_of_line, FieldExtractor};
use crate::error::FieldError;
use crate::invoice::{Field, FieldResult, NormalizedText};

/// Sale timestamp extractor.
///
/// The payload is always day/month/year followed by a 24h time. No other
/// layout is tried.
#[derive(Debug, Clone)]
pub struct SoldAtExtractor {
    marker: Regex,
    pattern: Regex,
}

impl SoldAtExtractor {
    pub fn from_rules(rules: &RuleSet) -> Result<Self, regex::Error> {
        let marker = marker_regex(&rules.date_marker);
        Ok(Self {
            pattern: Regex::new(&format!("{marker}{SOLD_AT_PAYLOAD}"))?,
            marker: Regex::new(&marker)?,
        })
    }
}

impl FieldExtractor for SoldAtExtractor {
    type Output = NaiveDateTime;

    fn field(&self) -> Field {
        Field::SoldAt
    }

    fn extract(&self, text: &NormalizedText<'_>) -> FieldResult<NaiveDateTime> {
        if let Some(caps) = self.pattern.captures(text.raw) {
            let stamp = format!("{} {}", &caps[1], &caps[2]);
            trace!("sale timestamp candidate {:?}", stamp);
            return NaiveDateTime::parse_from_str(&stamp, SOLD_AT_FORMAT)
                .map_err(|_| FieldError::malformed(self.field(), format!("{}, {}", &caps[1], &caps[2])));
        }

        match rest_of_line(&self.marker, text.raw) {
            Some(rest) => Err(FieldError::malformed(self.field(), rest)),
            None => Err(FieldError::not_found(self.field())),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::error::Absence;

    fn extract(raw: &str) -> FieldResult<NaiveDateTime> {
        let extractor = SoldAtExtractor::from_rules(&RuleSet::default()).unwrap();
        extractor.extract(&NormalizedText::new(raw))
    }

    #[test]
    fn test_extract_day_month_year() {
        let sold_at = extract("Facture N° 02-13073-1\nDate : 16/01/2026, 10:01:41\n").unwrap();
        let expected = NaiveDate::from_ymd_opt(2026, 1, 16)
            .unwrap()
            .and_hms_opt(10, 1, 41)
            .unwrap();
        assert_eq!(sold_at, expected);
    }

    #[test]
    fn test_ambiguous_date_is_day_first() {
        let sold_at = extract("Date : 02/03/2026, 09:00:00").unwrap();
        assert_eq!(sold_at.date(), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
    }

    #[test]
    fn test_month_day_order_is_rejected() {
        let err = extract("Date : 13/16/2026, 10:01:41").unwrap_err();
        assert_eq!(
            err.absence,
            Absence::Malformed {
                value: "13/16/2026, 10:01:41".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_time_is_rejected() {
        assert!(extract("Date : 16/01/2026, 25:01:41").is_err());
    }

    #[test]
    fn test_missing_time_is_malformed() {
        let err = extract("Date : 16/01/2026").unwrap_err();
        assert_eq!(err.field, Field::SoldAt);
        assert_eq!(
            err.absence,
            Absence::Malformed {
                value: "16/01/2026".to_string()
            }
        );
    }

    #[test]
    fn test_missing_marker() {
        let err = extract("Le 16/01/2026, 10:01:41").unwrap_err();
        assert_eq!(err, FieldError::not_found(Field::SoldAt));
    }
}
