//! Segment classification codes and source/report traceability metadata
#![allow(clippy::must_use_candidate)] // Constructor helpers are clear at call sites without #[must_use].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Segment-type code carried in column 5 of every flat-file line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SegmentType {
    /// Zero report ('0'): no incidents this period
    ZeroReport,
    /// Administrative segment ('1'): parent of a Group A incident
    Administrative,
    /// Offense segment ('2')
    Offense,
    /// Property segment ('3')
    Property,
    /// Victim segment ('4')
    Victim,
    /// Offender segment ('5')
    Offender,
    /// Group A arrestee segment ('6')
    GroupAArrestee,
    /// Group B arrest report ('7')
    GroupBArrestee,
}

impl SegmentType {
    /// All segment types in flat-file code order.
    pub const ALL: [SegmentType; 8] = [
        SegmentType::ZeroReport,
        SegmentType::Administrative,
        SegmentType::Offense,
        SegmentType::Property,
        SegmentType::Victim,
        SegmentType::Offender,
        SegmentType::GroupAArrestee,
        SegmentType::GroupBArrestee,
    ];

    /// Single-character flat-file code.
    pub fn code(self) -> char {
        match self {
            SegmentType::ZeroReport => '0',
            SegmentType::Administrative => '1',
            SegmentType::Offense => '2',
            SegmentType::Property => '3',
            SegmentType::Victim => '4',
            SegmentType::Offender => '5',
            SegmentType::GroupAArrestee => '6',
            SegmentType::GroupBArrestee => '7',
        }
    }

    /// Look up a segment type by its flat-file code.
    pub fn from_code(code: char) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    /// Whether a segment of this type opens a new report.
    pub fn starts_report(self) -> bool {
        matches!(
            self,
            SegmentType::ZeroReport | SegmentType::Administrative | SegmentType::GroupBArrestee
        )
    }
}

impl fmt::Display for SegmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl TryFrom<char> for SegmentType {
    type Error = crate::Error;

    fn try_from(code: char) -> crate::Result<Self> {
        Self::from_code(code).ok_or(crate::Error::UnknownSegmentType(code))
    }
}

/// Action code carried in column 6 of every flat-file line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ActionType {
    /// Incident report ('I')
    #[default]
    Add,
    /// Delete ('D')
    Delete,
    /// Any other code, kept verbatim
    Other(char),
}

impl ActionType {
    pub fn code(self) -> char {
        match self {
            ActionType::Add => 'I',
            ActionType::Delete => 'D',
            ActionType::Other(c) => c,
        }
    }

    pub fn from_code(code: char) -> Self {
        match code {
            'I' => ActionType::Add,
            'D' => ActionType::Delete,
            other => ActionType::Other(other),
        }
    }
}

/// Where a segment came from: source name plus 1-based line number
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportSource {
    /// Source file path or stream identifier
    pub name: String,

    /// Line number (1-indexed)
    pub line: usize,
}

impl ReportSource {
    pub fn new(name: impl Into<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            line,
        }
    }
}

impl fmt::Display for ReportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.line)
    }
}

/// Identifying fields of the owning report, copied onto children and errors
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportStamp {
    /// Incident number (Group A / zero report) or arrest transaction number (Group B)
    pub identifier: Option<String>,

    /// Originating agency identifier
    pub ori: Option<String>,

    /// Action code of the report's opening segment
    pub action: ActionType,

    /// Reporting period year
    pub year_of_tape: Option<i32>,

    /// Reporting period month
    pub month_of_tape: Option<u32>,

    /// Segment type that opened the report
    pub segment_type: Option<SegmentType>,
}

impl ReportStamp {
    /// Unique identifier of the owning report, empty when absent.
    pub fn unique_id(&self) -> &str {
        self.identifier.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_type_codes_round_trip() {
        for t in SegmentType::ALL {
            assert_eq!(SegmentType::from_code(t.code()), Some(t));
        }
        assert_eq!(SegmentType::from_code('9'), None);
        assert!(SegmentType::try_from('X').is_err());
    }

    #[test]
    fn test_report_starting_segments() {
        assert!(SegmentType::Administrative.starts_report());
        assert!(SegmentType::ZeroReport.starts_report());
        assert!(SegmentType::GroupBArrestee.starts_report());
        assert!(!SegmentType::Victim.starts_report());
    }

    #[test]
    fn test_action_type_codes() {
        assert_eq!(ActionType::from_code('I'), ActionType::Add);
        assert_eq!(ActionType::from_code('D'), ActionType::Delete);
        assert_eq!(ActionType::from_code('W'), ActionType::Other('W'));
        assert_eq!(ActionType::Other('W').code(), 'W');
    }
}
