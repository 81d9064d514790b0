//! Line classification: the header columns every segment shares

use crate::field::{FieldError, FieldSource};
use crate::layout::{header, HEADER_LENGTH};
use crate::{Error, Result};
use nibrs_model::{ActionType, ErrorCode, ReportHeader, ReportSource, ReportStamp, SegmentType};
use tracing::warn;

/// One input line with its header columns decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSegment {
    pub line: String,
    /// Line length in characters
    pub length: usize,
    pub source: ReportSource,
    /// Segment-type code as read, possibly unknown
    pub type_code: char,
    pub action: ActionType,
    pub ori: Option<String>,
    pub identifier: Option<String>,
}

impl RawSegment {
    /// Read the header columns of `line`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LineTooShort`] when the line cannot hold a full header.
    pub fn classify(line: &str, source: ReportSource) -> Result<Self> {
        let type_code = line.chars().nth(header::SEGMENT_TYPE.begin - 1);
        let length = line.chars().count();
        if length < HEADER_LENGTH {
            return Err(Error::LineTooShort { length, type_code });
        }
        let action = line
            .chars()
            .nth(header::ACTION.begin - 1)
            .map_or(ActionType::Other(' '), ActionType::from_code);

        Ok(Self {
            line: line.to_string(),
            length,
            source,
            type_code: type_code.unwrap_or(' '),
            action,
            ori: line.text(header::ORI),
            identifier: line.text(header::IDENTIFIER),
        })
    }

    /// # Errors
    ///
    /// Returns [`Error::UnknownSegmentType`] for a code outside `0`-`7`.
    pub fn segment_type(&self) -> Result<SegmentType> {
        SegmentType::from_code(self.type_code).ok_or(Error::UnknownSegmentType(self.type_code))
    }

    /// Declared segment length, checked against the lengths the segment type allows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MandatoryField`] for a non-numeric length and
    /// [`Error::InvalidLength`] for a length outside `allowed`.
    pub fn declared_length(&self, segment_type: SegmentType, allowed: &[usize]) -> Result<usize> {
        let length = self
            .line
            .integer::<usize>(header::SEGMENT_LENGTH)
            .map_err(|source| Error::MandatoryField {
                name: "Segment Length",
                code: ErrorCode::new("001"),
                source,
            })?
            .unwrap_or(0);

        if !allowed.contains(&length) {
            return Err(Error::InvalidLength {
                segment_type,
                length,
            });
        }
        if length != self.length {
            warn!(
                line = self.source.line,
                declared = length,
                actual = self.length,
                "segment length does not match line length"
            );
        }
        Ok(length)
    }

    /// Header of a report opened by this segment; month and year of tape are mandatory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MandatoryField`] with code `t01` for non-numeric tape columns.
    pub fn report_header(&self, segment_type: SegmentType) -> Result<ReportHeader> {
        let mandatory = |name: &'static str| {
            move |source: FieldError| Error::MandatoryField {
                name,
                code: ErrorCode::for_segment(segment_type, "01"),
                source,
            }
        };
        let month_of_tape = self
            .line
            .integer::<u32>(header::MONTH_OF_TAPE)
            .map_err(mandatory("Month of Tape"))?;
        let year_of_tape = self
            .line
            .integer::<i32>(header::YEAR_OF_TAPE)
            .map_err(mandatory("Year of Tape"))?;

        Ok(ReportHeader {
            action: self.action,
            year_of_tape,
            month_of_tape,
            city_indicator: self.line.text(header::CITY_INDICATOR),
            ori: self.ori.clone(),
            identifier: self.identifier.clone(),
        })
    }

    /// Best-effort stamp used to attribute a failure to this segment's report.
    #[must_use]
    pub fn stamp(&self) -> ReportStamp {
        ReportStamp {
            identifier: self.identifier.clone(),
            ori: self.ori.clone(),
            action: self.action,
            year_of_tape: self.line.integer(header::YEAR_OF_TAPE).ok().flatten(),
            month_of_tape: self.line.integer(header::MONTH_OF_TAPE).ok().flatten(),
            segment_type: SegmentType::from_code(self.type_code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN: &str = "00871I022003    TN0390500111502      20021115 19N                                      ";

    fn classify(line: &str) -> Result<RawSegment> {
        RawSegment::classify(line, ReportSource::new("test", 1))
    }

    #[test]
    fn test_classify_admin_line() {
        let raw = classify(ADMIN).unwrap();
        assert_eq!(raw.segment_type().unwrap(), SegmentType::Administrative);
        assert_eq!(raw.action, ActionType::Add);
        assert_eq!(raw.identifier.as_deref(), Some("111502"));
        assert_eq!(raw.ori.as_deref(), Some("TN0390500"));
        assert_eq!(
            raw.declared_length(SegmentType::Administrative, &[87, 88]).unwrap(),
            87
        );
        let header = raw.report_header(SegmentType::Administrative).unwrap();
        assert_eq!(header.year_of_tape, Some(2003));
        assert_eq!(header.month_of_tape, Some(2));
    }

    #[test]
    fn test_multibyte_city_indicator_keeps_columns() {
        let line = ADMIN.replacen("    TN", "É   TN", 1);
        let raw = classify(&line).unwrap();
        assert_eq!(raw.length, 87);
        assert_eq!(raw.identifier.as_deref(), Some("111502"));
        assert_eq!(raw.ori.as_deref(), Some("TN0390500"));
        let header = raw.report_header(SegmentType::Administrative).unwrap();
        assert_eq!(header.city_indicator.as_deref(), Some("É"));
    }

    #[test]
    fn test_short_line() {
        let err = classify("00871I02").unwrap_err();
        assert!(matches!(
            err,
            Error::LineTooShort {
                length: 8,
                type_code: Some('1')
            }
        ));
    }

    #[test]
    fn test_bad_length_and_type() {
        let raw = classify(&ADMIN.replacen("0087", "0099", 1)).unwrap();
        assert!(matches!(
            raw.declared_length(SegmentType::Administrative, &[87, 88]),
            Err(Error::InvalidLength { length: 99, .. })
        ));

        let raw = classify(&ADMIN.replacen("00871", "00879", 1)).unwrap();
        assert!(matches!(raw.segment_type(), Err(Error::UnknownSegmentType('9'))));

        let raw = classify(&ADMIN.replacen("0087", "00X7", 1)).unwrap();
        assert!(matches!(
            raw.declared_length(SegmentType::Administrative, &[87]),
            Err(Error::MandatoryField { name: "Segment Length", .. })
        ));
    }

    #[test]
    fn test_non_numeric_tape_year() {
        let raw = classify(&ADMIN.replacen("2003", "20X3", 1)).unwrap();
        let err = raw.report_header(SegmentType::Administrative).unwrap_err();
        let Error::MandatoryField { code, .. } = err else {
            panic!("expected mandatory field error");
        };
        assert_eq!(code.as_str(), "101");
        assert_eq!(raw.stamp().year_of_tape, None);
    }
}
