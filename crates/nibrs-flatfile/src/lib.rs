#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # nibrs-flatfile
//!
//! Fixed-width NIBRS flat-file codec.
//!
//! - [`Decoder`] groups lines into [`Report`](nibrs_model::Report)s, streaming
//!   each finished report (or the failure that ended it) as soon as the next
//!   report begins.
//! - [`Encoder`] writes reports back out as segment lines.
//! - [`ErrorReportWriter`] formats validation errors as the 146-column error
//!   report returned to submitting agencies.

/// Per-segment field builders.
pub mod builder;
/// Streaming decoder state machine.
pub mod decoder;
/// Segment line encoder.
pub mod encoder;
/// Fixed-width error report.
pub mod error_report;
/// Positional field access.
pub mod field;
/// Column layouts.
pub mod layout;
/// Header classification of raw lines.
pub mod segment;

pub use decoder::{
    CollectingListener, DecodeEvent, DecodeFailure, Decoder, DecoderConfig, ReportListener,
};
pub use encoder::Encoder;
pub use error_report::ErrorReportWriter;
pub use field::{FieldError, FieldSource, LineBuffer};
pub use segment::RawSegment;

use nibrs_model::{ErrorCode, FieldValue, NibrsError, ReportSource, ReportStamp, SegmentType};
use thiserror::Error;

/// Structural decode errors: each one fails the report it occurs in
#[derive(Error, Debug)]
pub enum Error {
    #[error("Line of length {length} is shorter than the 37-column segment header")]
    LineTooShort {
        length: usize,
        type_code: Option<char>,
    },

    #[error("Mandatory field '{name}' is invalid: {source}")]
    MandatoryField {
        name: &'static str,
        code: ErrorCode,
        #[source]
        source: FieldError,
    },

    #[error("Unknown segment type '{0}'")]
    UnknownSegmentType(char),

    #[error("Segment type {segment_type} does not allow length {length}")]
    InvalidLength {
        segment_type: SegmentType,
        length: usize,
    },

    #[error("Segment type {segment_type} out of sequence in report '{identifier}'")]
    OutOfSequence {
        segment_type: SegmentType,
        identifier: String,
    },

    #[error("Line is not valid UTF-8 from column {column}")]
    InvalidEncoding { column: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Render this structural error as a [`NibrsError`] for the error report.
    #[must_use]
    pub fn to_nibrs_error(&self, context: &ReportSource, report: Option<ReportStamp>) -> NibrsError {
        let error = match self {
            Error::LineTooShort { length, type_code } => {
                let error = NibrsError::new("001")
                    .with_data_element("Segment Length")
                    .with_value(FieldValue::Integer(i64::try_from(*length).unwrap_or(i64::MAX)));
                match type_code.and_then(SegmentType::from_code) {
                    Some(t) => error.with_segment_type(t),
                    None => error,
                }
            }
            Error::MandatoryField { name, code, source } => NibrsError::new(code.clone())
                .with_data_element(*name)
                .with_value(FieldValue::Text(source.value.clone())),
            Error::UnknownSegmentType(code) => {
                NibrsError::new("051").with_value(FieldValue::Text(code.to_string()))
            }
            Error::OutOfSequence { segment_type, .. } => NibrsError::new("051")
                .with_segment_type(*segment_type)
                .with_value(FieldValue::Text(segment_type.code().to_string())),
            Error::InvalidLength {
                segment_type,
                length,
            } => NibrsError::new(ErrorCode::for_segment(*segment_type, "01"))
                .with_segment_type(*segment_type)
                .with_data_element("Segment Length")
                .with_value(FieldValue::Integer(i64::try_from(*length).unwrap_or(i64::MAX))),
            Error::InvalidEncoding { column } => NibrsError::new("001")
                .with_data_element("Character Set")
                .with_value(FieldValue::Integer(i64::try_from(*column).unwrap_or(i64::MAX))),
            Error::Io(e) => NibrsError::new("001").with_value(FieldValue::Text(e.to_string())),
        };
        let error = error.with_context(context.clone());
        match report {
            Some(stamp) => {
                let error = match (error.segment_type, stamp.segment_type) {
                    (None, Some(t)) => error.with_segment_type(t),
                    _ => error,
                };
                error.with_report(stamp)
            }
            None => error,
        }
    }
}

/// Result type for flat-file operations
pub type Result<T> = std::result::Result<T, Error>;
