#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # nibrs-validation
//!
//! Rule engine for decoded NIBRS reports.
//!
//! Generic rules ([`rules`]) are parameterized by an accessor function, a data
//! element and an error code. Per-segment factories ([`factory`]) assemble them
//! into ordered [`RuleSet`]s, and [`ReportValidator`] runs every set against a
//! report, collecting all violations as [`NibrsError`](nibrs_model::NibrsError)
//! records. No rule short-circuits another.
//!
//! ```rust
//! use nibrs_catalog::Catalog;
//! use nibrs_model::{Report, ZeroReport};
//! use nibrs_validation::ReportValidator;
//!
//! let validator = ReportValidator::new(&Catalog::builtin()).unwrap();
//! let errors = validator.validate(&Report::Zero(ZeroReport::default()));
//! assert!(errors.iter().any(|e| e.code.as_str() == "101"));
//! ```

/// Report validator and its configuration.
pub mod engine;
/// Per-segment rule assemblies.
pub mod factory;
/// Generic rules and rule sets.
pub mod rules;

pub use engine::{ReportValidator, ValidationConfig};
pub use rules::{
    Coded, DuplicateValueRule, ExclusiveValueRule, IdentifierFormatRule, IncidentRule,
    NotAllBlankRule, NotBlankRule, NumericValueRule, ParsedValueRule, Rule, RuleExt, RuleSet,
    StringValueRule, Subject, ValidValueRule,
};

use thiserror::Error;

/// Configuration errors raised while assembling rules
#[derive(Error, Debug)]
pub enum Error {
    #[error("Catalog error: {0}")]
    Catalog(#[from] nibrs_catalog::Error),

    #[error("Invalid identifier pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
