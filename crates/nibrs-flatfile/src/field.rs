//! Positional field access over fixed-width lines
//!
//! Columns are 1-based and inclusive, as in the published segment layouts, and
//! count characters rather than bytes.
//! Reading trims surrounding blanks and treats an all-blank or out-of-range
//! field as absent. Writing pads every field to its exact width.

use crate::layout::Field;
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Date format used by every date column
pub const DATE_FORMAT: &str = "%Y%m%d";

/// A field whose text does not convert to the expected type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("columns {begin}-{end}: '{value}' is not a valid {expected}")]
pub struct FieldError {
    pub begin: usize,
    pub end: usize,
    /// Trimmed text that failed to convert
    pub value: String,
    pub expected: &'static str,
}

pub type FieldResult<T> = std::result::Result<T, FieldError>;

/// Trimmed text of columns `begin..=end`, or `None` when the line is too short
/// or the columns are blank.
#[must_use]
pub fn extract_string(begin: usize, end: usize, line: &str) -> Option<String> {
    if begin == 0 || end < begin {
        return None;
    }
    let text = if line.is_ascii() {
        line.get(begin - 1..end.min(line.len()))?.trim().to_string()
    } else {
        let slice: String = line.chars().skip(begin - 1).take(end + 1 - begin).collect();
        slice.trim().to_string()
    };
    (!text.is_empty()).then_some(text)
}

/// Unsigned integer in columns `begin..=end`.
///
/// # Errors
///
/// Returns a [`FieldError`] when the trimmed text is not all ASCII digits.
pub fn extract_integer<T>(begin: usize, end: usize, line: &str) -> FieldResult<Option<T>>
where
    T: FromStr,
{
    let Some(text) = extract_string(begin, end, line) else {
        return Ok(None);
    };
    let parsed = text
        .bytes()
        .all(|b| b.is_ascii_digit())
        .then(|| text.parse::<T>().ok())
        .flatten();
    match parsed {
        Some(value) => Ok(Some(value)),
        None => Err(FieldError {
            begin,
            end,
            value: text,
            expected: "number",
        }),
    }
}

/// `YYYYMMDD` date in columns `begin..=end`.
///
/// # Errors
///
/// Returns a [`FieldError`] when the text is not an eight-digit calendar date.
pub fn extract_date(begin: usize, end: usize, line: &str) -> FieldResult<Option<NaiveDate>> {
    let Some(text) = extract_string(begin, end, line) else {
        return Ok(None);
    };
    let well_formed = text.len() == 8 && text.bytes().all(|b| b.is_ascii_digit());
    match well_formed
        .then(|| NaiveDate::parse_from_str(&text, DATE_FORMAT).ok())
        .flatten()
    {
        Some(date) => Ok(Some(date)),
        None => Err(FieldError {
            begin,
            end,
            value: text,
            expected: "date",
        }),
    }
}

/// Read helpers keyed by layout field rather than raw column numbers.
pub trait FieldSource {
    fn text(&self, field: Field) -> Option<String>;

    /// # Errors
    ///
    /// Returns a [`FieldError`] for non-numeric text.
    fn integer<T: FromStr>(&self, field: Field) -> FieldResult<Option<T>>;

    /// # Errors
    ///
    /// Returns a [`FieldError`] for text that is not a `YYYYMMDD` date.
    fn date(&self, field: Field) -> FieldResult<Option<NaiveDate>>;
}

impl FieldSource for str {
    fn text(&self, field: Field) -> Option<String> {
        extract_string(field.begin, field.end(), self)
    }

    fn integer<T: FromStr>(&self, field: Field) -> FieldResult<Option<T>> {
        extract_integer(field.begin, field.end(), self)
    }

    fn date(&self, field: Field) -> FieldResult<Option<NaiveDate>> {
        extract_date(field.begin, field.end(), self)
    }
}

/// Fixed-width output line, space-filled until written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineBuffer {
    chars: Vec<char>,
}

impl LineBuffer {
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self {
            chars: vec![' '; width],
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.chars.len()
    }

    /// Overlay `value` left-aligned into `field`, truncating to its width.
    pub fn put(&mut self, field: Field, value: Option<&str>) {
        self.fill(field, ' ');
        if let Some(value) = value {
            for (slot, c) in self.slots(field).zip(value.chars()) {
                *slot = c;
            }
        }
    }

    /// Overlay `value` right-aligned with leading zeros.
    pub fn put_number(&mut self, field: Field, value: Option<impl fmt::Display>) {
        match value {
            Some(v) => {
                let text = format!("{v:0>width$}", width = field.width);
                let start = text.len().saturating_sub(field.width);
                self.put(field, Some(&text[start..]));
            }
            None => self.fill(field, ' '),
        }
    }

    /// Overlay a date as `YYYYMMDD`.
    pub fn put_date(&mut self, field: Field, value: Option<NaiveDate>) {
        let text = value.map(|d| d.format(DATE_FORMAT).to_string());
        self.put(field, text.as_deref());
    }

    fn fill(&mut self, field: Field, c: char) {
        for slot in self.slots(field) {
            *slot = c;
        }
    }

    fn slots(&mut self, field: Field) -> impl Iterator<Item = &mut char> {
        let start = (field.begin - 1).min(self.chars.len());
        let end = field.end().min(self.chars.len());
        self.chars[start..end].iter_mut()
    }
}

impl fmt::Display for LineBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.chars {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN: &str = "00871I022003    TN0390500111502      20021115 19N                                      ";

    #[test]
    fn test_extract_string_trims_and_bounds() {
        assert_eq!(extract_string(17, 25, ADMIN).as_deref(), Some("TN0390500"));
        assert_eq!(extract_string(26, 37, ADMIN).as_deref(), Some("111502"));
        assert_eq!(extract_string(13, 16, ADMIN), None);
        assert_eq!(extract_string(200, 210, ADMIN), None);
        assert_eq!(extract_string(1, 4, ""), None);
    }

    #[test]
    fn test_extract_string_partial_tail() {
        assert_eq!(extract_string(3, 10, "0087").as_deref(), Some("87"));
    }

    #[test]
    fn test_extract_string_counts_characters() {
        let line = ADMIN.replacen("    TN", "É   TN", 1);
        assert_eq!(extract_string(13, 16, &line).as_deref(), Some("É"));
        assert_eq!(extract_string(17, 25, &line).as_deref(), Some("TN0390500"));
        assert_eq!(extract_string(26, 37, &line).as_deref(), Some("111502"));
    }

    #[test]
    fn test_extract_integer() {
        assert_eq!(extract_integer::<u32>(1, 4, ADMIN), Ok(Some(87)));
        assert_eq!(extract_integer::<u32>(47, 48, ADMIN), Ok(Some(19)));
        assert_eq!(extract_integer::<u32>(13, 16, ADMIN), Ok(None));
        let err = extract_integer::<u32>(17, 25, ADMIN).unwrap_err();
        assert_eq!(err.value, "TN0390500");
        assert_eq!((err.begin, err.end), (17, 25));
        assert!(extract_integer::<u32>(1, 2, "+5").is_err());
    }

    #[test]
    fn test_extract_date() {
        assert_eq!(
            extract_date(38, 45, ADMIN),
            Ok(NaiveDate::from_ymd_opt(2002, 11, 15))
        );
        assert!(extract_date(1, 8, "20021345").is_err());
        assert!(extract_date(1, 8, "2002111").is_err());
        assert_eq!(extract_date(50, 57, ADMIN), Ok(None));
    }

    #[test]
    fn test_line_buffer_padding() {
        let mut line = LineBuffer::new(12);
        line.put(Field::new(1, 4), Some("AB"));
        line.put_number(Field::new(5, 3), Some(7));
        line.put_number(Field::new(8, 2), None::<u32>);
        line.put(Field::new(10, 2), Some("TOOLONG"));
        assert_eq!(line.to_string(), "AB  007  TO ");
        assert_eq!(line.width(), 12);
    }

    #[test]
    fn test_line_buffer_date() {
        let mut line = LineBuffer::new(8);
        line.put_date(Field::new(1, 8), NaiveDate::from_ymd_opt(2016, 5, 2));
        assert_eq!(line.to_string(), "20160502");
    }
}
