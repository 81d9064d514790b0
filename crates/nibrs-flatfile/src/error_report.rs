//! Fixed-width error report returned to submitting agencies
//!
//! Every error becomes one 146-column line (or one line per offending item for
//! the codes that enumerate them), followed by a single summary line. An empty
//! error list therefore still produces exactly one line.

use crate::layout::Field;
use crate::field::LineBuffer;
use crate::Result;
use chrono::{Local, NaiveDate};
use nibrs_catalog::Catalog;
use nibrs_model::{NibrsError, SegmentType};
use std::io::Write;
use std::sync::Arc;
use tracing::debug;

pub const LINE_LENGTH: usize = 146;

/// ORI column value marking the summary line
pub const SUMMARY_ORI: &str = "999999999";

const YEAR: Field = Field::new(1, 4);
const MONTH: Field = YEAR.after(2);
const LINE_NUMBER: Field = MONTH.after(7);
const ACTION: Field = LINE_NUMBER.after(1);
const ORI: Field = ACTION.after(9);
const IDENTIFIER: Field = ORI.after(12);
const SEGMENT_TYPE: Field = IDENTIFIER.after(1);
const OFFENSE_ID: Field = SEGMENT_TYPE.after(3);
const PERSON_ID: Field = OFFENSE_ID.after(3);
const PROPERTY_ID: Field = PERSON_ID.after(1);
const DATA_ELEMENT: Field = PROPERTY_ID.after(3);
const ERROR_CODE: Field = DATA_ELEMENT.after(3);
const OFFENDING_VALUES: Field = ERROR_CODE.after(12);
const MESSAGE: Field = OFFENDING_VALUES.after(79);

/// Formats validation errors using catalog messages
#[derive(Debug, Clone)]
pub struct ErrorReportWriter {
    catalog: Arc<Catalog>,
    processed_on: Option<NaiveDate>,
}

impl Default for ErrorReportWriter {
    fn default() -> Self {
        Self::new(Arc::new(Catalog::builtin()))
    }
}

impl ErrorReportWriter {
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            processed_on: None,
        }
    }

    /// Fix the date printed on the summary line; today's local date otherwise.
    #[must_use]
    pub fn with_processing_date(mut self, date: NaiveDate) -> Self {
        self.processed_on = Some(date);
        self
    }

    /// Render every line of the report, summary line last.
    #[must_use]
    pub fn format_lines(&self, errors: &[NibrsError]) -> Vec<String> {
        let mut lines: Vec<String> = errors.iter().flat_map(|e| self.error_lines(e)).collect();
        lines.push(self.summary_line());
        lines
    }

    /// Write the report to `writer`, each line terminated by `\n`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] when writing fails.
    pub fn write<W: Write>(&self, mut writer: W, errors: &[NibrsError]) -> Result<()> {
        let lines = self.format_lines(errors);
        for line in &lines {
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        debug!(error_count = errors.len(), line_count = lines.len(), "Wrote error report");
        Ok(())
    }

    fn error_lines(&self, error: &NibrsError) -> Vec<String> {
        let mut line = LineBuffer::new(LINE_LENGTH);
        if let Some(stamp) = &error.report {
            line.put_number(YEAR, stamp.year_of_tape);
            line.put_number(MONTH, stamp.month_of_tape);
            line.put(ACTION, Some(&stamp.action.code().to_string()));
            line.put(ORI, stamp.ori.as_deref());
            line.put(IDENTIFIER, stamp.identifier.as_deref());
        }
        line.put_number(LINE_NUMBER, error.context.as_ref().map(|c| c.line));
        if let Some(segment_type) = error.segment_type {
            if !error.cross_segment {
                line.put(SEGMENT_TYPE, Some(&segment_type.code().to_string()));
            }
            if let Some(within) = &error.within_segment {
                put_within_segment(&mut line, segment_type, within);
            }
        }
        if let Some(de) = &error.data_element {
            let padded = if de.len() == 1 && de.chars().all(|c| c.is_ascii_digit()) {
                format!("0{de}")
            } else {
                de.clone()
            };
            line.put(DATA_ELEMENT, Some(&padded));
        }
        line.put(ERROR_CODE, Some(error.code.as_str()));

        let per_item = (error.code.as_str() == "404" && error.data_element.as_deref() == Some("35"))
            || error.code.as_str() == "342";
        let items = match (&error.value, per_item) {
            (Some(value), true) => value.rendered_items(),
            _ => vec![error.offending_values()],
        };
        items
            .iter()
            .map(|item| {
                line.put(OFFENDING_VALUES, Some(item.trim()));
                let message = self.catalog.errors.message_for(error.code.as_str(), item.trim());
                line.put(MESSAGE, Some(&message));
                line.to_string()
            })
            .collect()
    }

    fn summary_line(&self) -> String {
        let date = self.processed_on.unwrap_or_else(|| Local::now().date_naive());
        let mut line = LineBuffer::new(LINE_LENGTH);
        line.put(ORI, Some(SUMMARY_ORI));
        line.put(
            MESSAGE,
            Some(&format!("processed submission on {}", date.format("%m/%d/%y"))),
        );
        line.to_string()
    }
}

fn put_within_segment(line: &mut LineBuffer, segment_type: SegmentType, within: &str) {
    match segment_type {
        SegmentType::Offense => line.put(OFFENSE_ID, Some(within)),
        SegmentType::Victim
        | SegmentType::Offender
        | SegmentType::GroupAArrestee
        | SegmentType::GroupBArrestee => {
            line.put(PERSON_ID, Some(&format!("{within:0>3}")));
        }
        SegmentType::Property => line.put(PROPERTY_ID, Some(within)),
        SegmentType::Administrative | SegmentType::ZeroReport => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nibrs_model::{ActionType, ErrorTemplate, FieldValue, ReportSource, ReportStamp};

    fn stamp() -> ReportStamp {
        ReportStamp {
            identifier: Some("54236732".to_string()),
            ori: Some("WA1234567".to_string()),
            action: ActionType::Add,
            year_of_tape: Some(2016),
            month_of_tape: Some(5),
            segment_type: Some(SegmentType::Administrative),
        }
    }

    fn writer() -> ErrorReportWriter {
        ErrorReportWriter::default()
            .with_processing_date(NaiveDate::from_ymd_opt(2016, 6, 1).unwrap())
    }

    #[test]
    fn test_empty_list_is_one_summary_line() {
        let lines = writer().format_lines(&[]);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), LINE_LENGTH);
        assert_eq!(&lines[0][14..23], SUMMARY_ORI);
        assert!(lines[0][61..].starts_with("processed submission on 06/01/16"));
    }

    #[test]
    fn test_error_line_columns() {
        let error = ErrorTemplate::new(SegmentType::Victim)
            .with_within_segment(Some("1".to_string()))
            .with_context(ReportSource::new("in.txt", 12))
            .with_report(stamp())
            .error("404", "3", FieldValue::from("X"));
        let lines = writer().format_lines(&[error]);
        assert_eq!(lines.len(), 2);
        let line = &lines[0];
        assert_eq!(line.len(), LINE_LENGTH);
        assert_eq!(&line[0..4], "2016");
        assert_eq!(&line[4..6], "05");
        assert_eq!(&line[6..13], "0000012");
        assert_eq!(&line[13..14], "I");
        assert_eq!(&line[14..23], "WA1234567");
        assert_eq!(&line[23..35], "54236732    ");
        assert_eq!(&line[35..36], "4");
        assert_eq!(&line[39..42], "001");
        assert_eq!(&line[43..46], "03 ");
        assert_eq!(&line[46..49], "404");
        assert_eq!(&line[49..61], "X           ");
    }

    #[test]
    fn test_cross_segment_and_offense_id() {
        let error = ErrorTemplate::new(SegmentType::Offense)
            .with_within_segment(Some("13A".to_string()))
            .with_report(stamp())
            .build("065")
            .with_data_element("L 2")
            .cross_segment();
        let line = &writer().format_lines(&[error])[0];
        assert_eq!(&line[35..36], " ");
        assert_eq!(&line[36..39], "13A");
        assert_eq!(&line[43..46], "L 2");
    }

    #[test]
    fn test_relationship_errors_print_one_line_per_item() {
        let error = ErrorTemplate::new(SegmentType::Victim)
            .with_report(stamp())
            .error(
                "404",
                "35",
                FieldValue::List(vec![Some("XX".to_string()), None, Some("YY".to_string())]),
            );
        let lines = writer().format_lines(&[error]);
        assert_eq!(lines.len(), 3);
        assert_eq!(&lines[0][49..51], "XX");
        assert_eq!(&lines[1][49..51], "YY");
    }

    #[test]
    fn test_error_without_report_has_blank_period() {
        let error = NibrsError::new("001").with_context(ReportSource::new("in.txt", 3));
        let line = &writer().format_lines(&[error])[0];
        assert_eq!(&line[0..6], "      ");
        assert_eq!(&line[6..13], "0000003");
        assert_eq!(&line[46..49], "001");
    }

    #[test]
    fn test_write_terminates_lines() {
        let mut out = Vec::new();
        writer().write(&mut out, &[]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with('\n'));
        assert_eq!(text.lines().count(), 1);
    }
}
