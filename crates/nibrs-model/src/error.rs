//! Structured validation errors
//!
//! A [`NibrsError`] is the single currency of both decode-time field problems and
//! rule violations. It is immutable in spirit: rules build one from an
//! [`ErrorTemplate`] and hand it back, nothing mutates it afterwards.
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)] // Fluent setters are designed for chaining.

use crate::metadata::{ReportSource, ReportStamp, SegmentType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Three-character error code from the externally defined taxonomy (e.g. `"101"`, `"404"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCode(String);

impl ErrorCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Build a segment-prefixed code such as `409` from segment type `4` and suffix `"09"`.
    pub fn for_segment(segment_type: SegmentType, suffix: &str) -> Self {
        Self(format!("{}{suffix}", segment_type.code()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Codes ending in `06` report duplicate values and only echo the repeated item.
    pub fn is_duplicate_value_code(&self) -> bool {
        self.0.ends_with("06")
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ErrorCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for ErrorCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

/// Offending value attached to an error
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldValue {
    /// Coded or free text value
    Text(String),
    /// Integer value
    Integer(i64),
    /// Calendar date
    Date(NaiveDate),
    /// Repeated slots of an array-valued field, blank slots as `None`
    List(Vec<Option<String>>),
}

impl FieldValue {
    /// Non-null items rendered the way the error report prints them.
    pub fn rendered_items(&self) -> Vec<String> {
        match self {
            FieldValue::Text(s) => vec![s.clone()],
            FieldValue::Integer(i) => vec![format!("{i:02}")],
            FieldValue::Date(d) => vec![d.format("%Y%m%d").to_string()],
            FieldValue::List(items) => items.iter().flatten().cloned().collect(),
        }
    }

    /// Text form of a scalar value; `None` for lists.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FieldValue::List(items) => {
                let shown: Vec<&str> = items
                    .iter()
                    .map(|i| i.as_deref().unwrap_or("null"))
                    .collect();
                write!(f, "[{}]", shown.join(", "))
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Integer(i64::from(value))
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

impl From<&[Option<String>]> for FieldValue {
    fn from(value: &[Option<String>]) -> Self {
        FieldValue::List(value.to_vec())
    }
}

/// A single validation or decode error
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NibrsError {
    /// Error code from the catalog
    pub code: ErrorCode,

    /// Documented data element the error refers to (e.g. `"26"`, `"2A"`)
    pub data_element: Option<String>,

    /// Segment type the error was raised against
    pub segment_type: Option<SegmentType>,

    /// Disambiguates repeated same-type segments within one report
    pub within_segment: Option<String>,

    /// Source location of the offending segment
    pub context: Option<ReportSource>,

    /// Offending value
    pub value: Option<FieldValue>,

    /// Owning report
    pub report: Option<ReportStamp>,

    /// Whether the catalog treats this as a warning
    pub warning: bool,

    /// Whether the error spans segments (no single segment type applies)
    pub cross_segment: bool,
}

impl NibrsError {
    /// Create a bare error carrying only its code.
    pub fn new(code: impl Into<ErrorCode>) -> Self {
        Self {
            code: code.into(),
            data_element: None,
            segment_type: None,
            within_segment: None,
            context: None,
            value: None,
            report: None,
            warning: false,
            cross_segment: false,
        }
    }

    pub fn with_data_element(mut self, data_element: impl Into<String>) -> Self {
        self.data_element = Some(data_element.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<Option<FieldValue>>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_code(mut self, code: impl Into<ErrorCode>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_segment_type(mut self, segment_type: SegmentType) -> Self {
        self.segment_type = Some(segment_type);
        self
    }

    pub fn with_within_segment(mut self, within: impl Into<Option<String>>) -> Self {
        self.within_segment = within.into();
        self
    }

    pub fn with_context(mut self, context: ReportSource) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_report(mut self, report: ReportStamp) -> Self {
        self.report = Some(report);
        self
    }

    pub fn as_warning(mut self, warning: bool) -> Self {
        self.warning = warning;
        self
    }

    /// Mark the error as spanning segments.
    pub fn cross_segment(mut self) -> Self {
        self.cross_segment = true;
        self
    }

    /// Identifier of the owning report, empty when the error is not attached to one.
    pub fn report_unique_id(&self) -> &str {
        self.report.as_ref().map_or("", ReportStamp::unique_id)
    }

    /// Offending values as printed in the error report.
    ///
    /// Null slots are dropped, integers are zero-padded to two digits and dates
    /// print as `YYYYMMDD`. Duplicate-value codes echo only the first repeated
    /// item; every other code concatenates the distinct items in slot order.
    pub fn offending_values(&self) -> String {
        let Some(value) = &self.value else {
            return String::new();
        };
        let duplicates_only = self.code.is_duplicate_value_code();
        let mut seen = HashSet::new();
        let mut out: Vec<String> = Vec::new();
        for item in value.rendered_items() {
            let first_sighting = seen.insert(item.clone());
            if duplicates_only && first_sighting {
                continue;
            }
            if !out.contains(&item) {
                out.push(item);
            }
            if duplicates_only {
                break;
            }
        }
        out.concat()
    }
}

impl fmt::Display for NibrsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error {}", self.code)?;
        if let Some(de) = &self.data_element {
            write!(f, " (data element {de})")?;
        }
        if let Some(report) = &self.report {
            write!(f, " in report '{}'", report.unique_id())?;
        }
        if let Some(t) = self.segment_type {
            write!(f, " segment {t}")?;
        }
        if let Some(value) = &self.value {
            write!(f, ": {value}")?;
        }
        Ok(())
    }
}

impl std::error::Error for NibrsError {}

/// Pre-filled segment/report context from which errors are stamped out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorTemplate {
    pub segment_type: SegmentType,
    pub within_segment: Option<String>,
    pub context: Option<ReportSource>,
    pub report: Option<ReportStamp>,
}

impl ErrorTemplate {
    pub fn new(segment_type: SegmentType) -> Self {
        Self {
            segment_type,
            within_segment: None,
            context: None,
            report: None,
        }
    }

    pub fn with_within_segment(mut self, within: impl Into<Option<String>>) -> Self {
        self.within_segment = within.into();
        self
    }

    pub fn with_context(mut self, context: ReportSource) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_report(mut self, report: ReportStamp) -> Self {
        self.report = Some(report);
        self
    }

    /// Stamp out an error with this template's context and the given code.
    pub fn build(&self, code: impl Into<ErrorCode>) -> NibrsError {
        NibrsError {
            code: code.into(),
            data_element: None,
            segment_type: Some(self.segment_type),
            within_segment: self.within_segment.clone(),
            context: self.context.clone(),
            value: None,
            report: self.report.clone(),
            warning: false,
            cross_segment: false,
        }
    }

    /// Stamp out an error with code, data element and offending value.
    pub fn error(
        &self,
        code: impl Into<ErrorCode>,
        data_element: &str,
        value: impl Into<Option<FieldValue>>,
    ) -> NibrsError {
        self.build(code)
            .with_data_element(data_element)
            .with_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[Option<&str>]) -> FieldValue {
        FieldValue::List(items.iter().map(|i| i.map(str::to_string)).collect())
    }

    #[test]
    fn test_error_equality_is_value_based() {
        let template = ErrorTemplate::new(SegmentType::Offense)
            .with_within_segment(Some("13A".to_string()))
            .with_context(ReportSource::new("input.txt", 3));
        let a = template.error("204", "9", FieldValue::from("99"));
        let b = template.error("204", "9", FieldValue::from("99"));
        assert_eq!(a, b);
        assert_ne!(a, b.clone().with_data_element("10"));
    }

    #[test]
    fn test_segment_prefixed_codes() {
        assert_eq!(ErrorCode::for_segment(SegmentType::Victim, "09").as_str(), "409");
        assert_eq!(
            ErrorCode::for_segment(SegmentType::GroupBArrestee, "22").as_str(),
            "722"
        );
    }

    #[test]
    fn test_offending_values_drop_nulls_and_pad_integers() {
        let e = NibrsError::new("204").with_value(list(&[Some("A"), None, Some("B")]));
        assert_eq!(e.offending_values(), "AB");

        let e = NibrsError::new("401").with_value(FieldValue::Integer(7));
        assert_eq!(e.offending_values(), "07");

        let date = NaiveDate::from_ymd_opt(2016, 5, 12).unwrap();
        let e = NibrsError::new("305").with_value(FieldValue::Date(date));
        assert_eq!(e.offending_values(), "20160512");
    }

    #[test]
    fn test_duplicate_codes_echo_only_repeated_item() {
        let e = NibrsError::new("206").with_value(list(&[Some("A"), Some("B"), Some("B")]));
        assert_eq!(e.offending_values(), "B");
    }

    #[test]
    fn test_template_stamps_context() {
        let stamp = ReportStamp {
            identifier: Some("54236732".to_string()),
            ..ReportStamp::default()
        };
        let template = ErrorTemplate::new(SegmentType::Victim)
            .with_within_segment(Some("1".to_string()))
            .with_report(stamp);
        let e = template.build("404");
        assert_eq!(e.segment_type, Some(SegmentType::Victim));
        assert_eq!(e.within_segment.as_deref(), Some("1"));
        assert_eq!(e.report_unique_id(), "54236732");
        assert!(!e.cross_segment);
    }
}
