#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # nibrs-pipeline
//!
//! Decode a submission, validate its reports concurrently and merge the errors
//! back into submission order.
//!
//! Decoding is sequential; each decoded report becomes one validation task on
//! the tokio runtime, bounded by [`PipelineConfig::max_concurrency`]. Decode
//! failures are kept in the position where the decoder reported them, so the
//! merged error list reads the same whatever order the tasks finish in.

pub mod pipeline;

pub use pipeline::{Pipeline, PipelineConfig, PipelineOutcome, PipelineStats};

use thiserror::Error;

/// Errors that can occur in the pipeline
#[derive(Error, Debug)]
pub enum Error {
    #[error("Decode error: {0}")]
    Decode(#[from] nibrs_flatfile::Error),

    #[error("Validator setup error: {0}")]
    Validation(#[from] nibrs_validation::Error),

    #[error("Validation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Concurrency limiter closed: {0}")]
    Limiter(#[from] tokio::sync::AcquireError),
}

pub type Result<T> = std::result::Result<T, Error>;
