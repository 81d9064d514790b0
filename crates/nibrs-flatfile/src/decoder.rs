//! Streaming decoder: groups segment lines into reports
//!
//! Lines are grouped by identifier. A report is emitted only once the next
//! identifier (or the end of input) shows that it is complete, and only if
//! every one of its segments was built without a structural error. An incident
//! that fails is reported once as a [`DecodeFailure`], and its remaining lines
//! are skipped.

use crate::builder::{build_child, build_report};
use crate::segment::RawSegment;
use crate::{Error, Result};
use nibrs_model::{NibrsError, Report, ReportSource, ReportStamp, SegmentType};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::io::{BufRead, ErrorKind};
use tracing::{debug, trace, warn};

/// Decoder options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Action codes to decode; lines with any other action are skipped
    pub included_actions: Vec<char>,

    /// Name recorded as the source of every segment
    pub source_name: String,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            included_actions: vec!['I'],
            source_name: "input".to_string(),
        }
    }
}

impl DecoderConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_included_actions(mut self, actions: impl IntoIterator<Item = char>) -> Self {
        self.included_actions = actions.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }
}

/// A report that could not be built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeFailure {
    /// Identifier of the failed incident; `None` when the line was unreadable
    pub identifier: Option<String>,

    /// The structural error, ready for the error report
    pub error: NibrsError,
}

/// One decoder output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DecodeEvent {
    Report(Report),
    Failure(DecodeFailure),
}

/// Callback interface for [`decode_with_listener`]
pub trait ReportListener {
    fn on_report(&mut self, report: Report);
    fn on_failure(&mut self, failure: DecodeFailure);
}

/// Listener that keeps everything it is given
#[derive(Debug, Default)]
pub struct CollectingListener {
    pub reports: Vec<Report>,
    pub failures: Vec<DecodeFailure>,
}

impl ReportListener for CollectingListener {
    fn on_report(&mut self, report: Report) {
        self.reports.push(report);
    }

    fn on_failure(&mut self, failure: DecodeFailure) {
        self.failures.push(failure);
    }
}

#[derive(Debug)]
enum State {
    Idle,
    Building { identifier: String, report: Report },
    Failed { identifier: String, failure: DecodeFailure },
}

impl State {
    fn identifier(&self) -> Option<&str> {
        match self {
            State::Idle => None,
            State::Building { identifier, .. } | State::Failed { identifier, .. } => {
                Some(identifier)
            }
        }
    }
}

/// Pull-based decoder over a buffered reader
///
/// Iterating yields reports and failures in input order. A line that is not
/// valid UTF-8 fails only the report it belongs to. Reading stops at the first
/// I/O error, after flushing the report in progress; the error is kept for
/// [`Decoder::take_error`].
pub struct Decoder<R: BufRead> {
    reader: R,
    buffer: Vec<u8>,
    config: DecoderConfig,
    line_number: usize,
    state: State,
    pending: VecDeque<DecodeEvent>,
    io_error: Option<std::io::Error>,
    finished: bool,
}

impl<R: BufRead> Decoder<R> {
    pub fn new(reader: R, config: DecoderConfig) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            config,
            line_number: 0,
            state: State::Idle,
            pending: VecDeque::new(),
            io_error: None,
            finished: false,
        }
    }

    /// Number of lines read so far, blank lines included.
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// The I/O error that ended the stream, if any.
    #[must_use]
    pub fn io_error(&self) -> Option<&std::io::Error> {
        self.io_error.as_ref()
    }

    /// Take the I/O error that ended the stream.
    pub fn take_error(&mut self) -> Option<Error> {
        self.io_error.take().map(Error::Io)
    }

    fn process(&mut self, line: &str) {
        if line.trim().is_empty() {
            trace!(line = self.line_number, "skipping blank line");
            return;
        }
        let source = ReportSource::new(self.config.source_name.clone(), self.line_number);
        let raw = match RawSegment::classify(line, source.clone()) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(line = self.line_number, error = %e, "unreadable segment");
                self.pending.push_back(DecodeEvent::Failure(DecodeFailure {
                    identifier: None,
                    error: e.to_nibrs_error(&source, None),
                }));
                return;
            }
        };
        if !self.config.included_actions.contains(&raw.action.code()) {
            trace!(
                line = self.line_number,
                action = %raw.action.code(),
                "skipping excluded action"
            );
            return;
        }

        let identifier = raw.identifier.clone().unwrap_or_default();
        let segment_type = raw.segment_type();
        let same_report = self.state.identifier() == Some(identifier.as_str())
            && !matches!(segment_type, Ok(SegmentType::ZeroReport));

        match segment_type {
            Err(e) if same_report => self.fail(&raw, &e),
            Err(e) => {
                self.flush();
                self.state = State::Failed {
                    identifier,
                    failure: failure(&raw, &e, raw.stamp()),
                };
            }
            Ok(segment_type) if !same_report => {
                self.flush();
                debug!(
                    line = self.line_number,
                    identifier = %identifier,
                    segment_type = %segment_type,
                    "starting report"
                );
                self.state = match build_report(&raw, segment_type) {
                    Ok(report) => State::Building { identifier, report },
                    Err(e) => State::Failed {
                        failure: failure(&raw, &e, raw.stamp()),
                        identifier,
                    },
                };
            }
            Ok(segment_type) => self.add_child(&raw, segment_type),
        }
    }

    /// Fail the report a line with invalid bytes belongs to, or report the
    /// line on its own when its header is unreadable.
    fn process_undecodable(&mut self, bytes: &[u8], valid_up_to: usize) {
        let column = std::str::from_utf8(&bytes[..valid_up_to]).map_or(1, |s| s.chars().count() + 1);
        warn!(line = self.line_number, column, "line is not valid UTF-8");
        let error = Error::InvalidEncoding { column };
        let text = String::from_utf8_lossy(bytes);
        let source = ReportSource::new(self.config.source_name.clone(), self.line_number);

        let Ok(raw) = RawSegment::classify(&text, source.clone()) else {
            self.pending.push_back(DecodeEvent::Failure(DecodeFailure {
                identifier: None,
                error: error.to_nibrs_error(&source, None),
            }));
            return;
        };
        if !self.config.included_actions.contains(&raw.action.code()) {
            return;
        }
        let identifier = raw.identifier.clone().unwrap_or_default();
        if self.state.identifier() == Some(identifier.as_str()) {
            self.fail(&raw, &error);
        } else {
            self.flush();
            self.state = State::Failed {
                failure: failure(&raw, &error, raw.stamp()),
                identifier,
            };
        }
    }

    fn add_child(&mut self, raw: &RawSegment, segment_type: SegmentType) {
        let State::Building { report, .. } = &mut self.state else {
            trace!(line = self.line_number, "skipping line of failed report");
            return;
        };
        let stamp = report.stamp();
        let result = build_child(raw, segment_type, &stamp).and_then(|child| {
            report.attach(child).map_err(|_| Error::OutOfSequence {
                segment_type,
                identifier: stamp.unique_id().to_string(),
            })
        });
        if let Err(e) = result {
            self.fail(raw, &e);
        }
    }

    /// Fail the report in progress.
    fn fail(&mut self, raw: &RawSegment, error: &Error) {
        let state = std::mem::replace(&mut self.state, State::Idle);
        self.state = match state {
            State::Building { identifier, report } => {
                warn!(identifier = %identifier, line = self.line_number, error = %error, "report failed");
                State::Failed {
                    failure: failure(raw, error, report.stamp()),
                    identifier,
                }
            }
            other => other,
        };
    }

    /// Emit the report in progress, or its failure.
    fn flush(&mut self) {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Idle => {}
            State::Building { identifier, report } => {
                debug!(identifier = %identifier, "report complete");
                self.pending.push_back(DecodeEvent::Report(report));
            }
            State::Failed { identifier, failure } => {
                debug!(identifier = %identifier, code = %failure.error.code, "report discarded");
                self.pending.push_back(DecodeEvent::Failure(failure));
            }
        }
    }
}

fn failure(raw: &RawSegment, error: &Error, stamp: ReportStamp) -> DecodeFailure {
    DecodeFailure {
        identifier: raw.identifier.clone(),
        error: error.to_nibrs_error(&raw.source, Some(stamp)),
    }
}

fn strip_line_ending(bytes: &[u8]) -> &[u8] {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    bytes.strip_suffix(b"\r").unwrap_or(bytes)
}

impl<R: BufRead> Iterator for Decoder<R> {
    type Item = DecodeEvent;

    fn next(&mut self) -> Option<DecodeEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            if self.finished {
                return None;
            }
            let mut buffer = std::mem::take(&mut self.buffer);
            buffer.clear();
            match self.reader.read_until(b'\n', &mut buffer) {
                Ok(0) => {
                    self.flush();
                    self.finished = true;
                }
                Ok(_) => {
                    self.line_number += 1;
                    let bytes = strip_line_ending(&buffer);
                    match std::str::from_utf8(bytes) {
                        Ok(line) => self.process(line),
                        Err(e) => self.process_undecodable(bytes, e.valid_up_to()),
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    warn!(line = self.line_number + 1, error = %e, "read failed, ending stream");
                    self.flush();
                    self.io_error = Some(e);
                    self.finished = true;
                }
            }
            self.buffer = buffer;
        }
    }
}

/// Decode `reader`, handing every report and failure to `listener` in input order.
///
/// # Errors
///
/// Returns [`Error::Io`] if reading fails; everything decoded before the
/// failure has already been delivered.
pub fn decode_with_listener<R, L>(reader: R, config: DecoderConfig, listener: &mut L) -> Result<()>
where
    R: BufRead,
    L: ReportListener + ?Sized,
{
    let mut decoder = Decoder::new(reader, config);
    for event in decoder.by_ref() {
        match event {
            DecodeEvent::Report(report) => listener.on_report(report),
            DecodeEvent::Failure(failure) => listener.on_failure(failure),
        }
    }
    decoder.take_error().map_or(Ok(()), Err)
}
