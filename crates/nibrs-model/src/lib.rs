#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # nibrs-model
//!
//! Data model for NIBRS flat-file submissions.
//!
//! A submission is a stream of reports: Group A incidents (an administrative
//! segment owning offense, property, victim, offender and arrestee segments),
//! Group B arrests and zero reports. Decoded fields that may fail conversion are
//! held as [`Parsed`] values so that the validator can report the failure
//! alongside ordinary rule violations, all as [`NibrsError`] records.

/// Age token decoding and comparison.
pub mod age;
/// Structured errors, offending values and error templates.
pub mod error;
/// Segment types, action codes and traceability metadata.
pub mod metadata;
/// Tri-state decoded values.
pub mod parsed;
/// Report aggregates.
pub mod report;
/// Child segments and the person capability.
pub mod segment;

pub use age::Age;
pub use error::{ErrorCode, ErrorTemplate, FieldValue, NibrsError};
pub use metadata::{ActionType, ReportSource, ReportStamp, SegmentType};
pub use parsed::Parsed;
pub use report::{ChildSegment, GroupAIncident, GroupBArrest, Report, ReportHeader, ZeroReport};
pub use segment::{
    ArresteeSegment, DrugQuantity, OffenderSegment, OffenseSegment, Person, PropertySegment,
    Segment, VictimSegment,
};

use thiserror::Error;

/// Errors raised while assembling model values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Unknown segment type code '{0}'")]
    UnknownSegmentType(char),

    #[error("Segment type {child} cannot be attached to a report opened by segment type {parent}")]
    ChildNotAllowed {
        child: SegmentType,
        parent: SegmentType,
    },
}

/// Result type for model operations
pub type Result<T> = std::result::Result<T, Error>;
