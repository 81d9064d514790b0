//! Zero report rules

use super::push_header_rules;
use crate::rules::{ParsedValueRule, RuleSet, Subject};
use nibrs_model::{FieldValue, ZeroReport};

/// Incident number every zero report must carry
pub const ZERO_REPORT_IDENTIFIER: &str = "000000000000";

const ZERO_REPORT_MONTH: &str = "Zero Report Month";
const ZERO_REPORT_YEAR: &str = "Zero Report Year";

/// Rules for zero reports.
#[must_use]
pub fn rules() -> RuleSet<ZeroReport> {
    let mut rules = RuleSet::new();
    push_header_rules(&mut rules, |z: &ZeroReport| &z.header);
    rules
        .push(|z: &ZeroReport| {
            let identifier = z.header.identifier.as_deref();
            (identifier.map(str::trim) != Some(ZERO_REPORT_IDENTIFIER)).then(|| {
                z.template()
                    .error("015", "2", identifier.map(FieldValue::from))
            })
        })
        .push(
            ParsedValueRule::new(|z: &ZeroReport| &z.zero_report_month, ZERO_REPORT_MONTH)
                .required("001"),
        )
        .push(
            ParsedValueRule::new(|z: &ZeroReport| &z.zero_report_year, ZERO_REPORT_YEAR)
                .required("001"),
        );
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use nibrs_model::{NibrsError, Parsed, ReportHeader};

    fn zero_report() -> ZeroReport {
        ZeroReport {
            header: ReportHeader {
                ori: Some("WA1234567".to_string()),
                identifier: Some(ZERO_REPORT_IDENTIFIER.to_string()),
                year_of_tape: Some(2016),
                month_of_tape: Some(6),
                ..ReportHeader::default()
            },
            zero_report_month: Parsed::present(5),
            zero_report_year: Parsed::present(2016),
            ..ZeroReport::default()
        }
    }

    fn codes(report: &ZeroReport) -> Vec<String> {
        rules()
            .apply(report)
            .iter()
            .map(|e| e.code.to_string())
            .collect()
    }

    #[test]
    fn test_valid_zero_report() {
        assert!(codes(&zero_report()).is_empty());
    }

    #[test]
    fn test_identifier_must_be_zeros() {
        let mut z = zero_report();
        z.header.identifier = Some("54236732".to_string());
        let errors = rules().apply(&z);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code.as_str(), "015");
        assert_eq!(errors[0].offending_values(), "54236732");
    }

    #[test]
    fn test_zero_report_period() {
        let mut z = zero_report();
        z.zero_report_month = Parsed::missing();
        z.zero_report_year =
            Parsed::invalid(NibrsError::new("001").with_value(FieldValue::from("20X6")));
        assert_eq!(codes(&z), vec!["001", "001"]);
    }

    #[test]
    fn test_empty_report_reports_every_missing_field() {
        assert_eq!(
            codes(&ZeroReport::default()),
            vec!["101", "101", "101", "015", "001", "001"]
        );
    }
}
