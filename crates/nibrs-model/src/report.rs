//! Report aggregates: Group A incidents, Group B arrests and zero reports
#![allow(clippy::must_use_candidate)]

use crate::error::ErrorTemplate;
use crate::metadata::{ActionType, ReportSource, ReportStamp, SegmentType};
use crate::parsed::Parsed;
use crate::segment::{
    ArresteeSegment, OffenderSegment, OffenseSegment, PropertySegment, Segment, VictimSegment,
};
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Header columns shared by every segment of a report (columns 6-37)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportHeader {
    pub action: ActionType,
    pub year_of_tape: Option<i32>,
    pub month_of_tape: Option<u32>,
    pub city_indicator: Option<String>,
    pub ori: Option<String>,
    pub identifier: Option<String>,
}

impl ReportHeader {
    /// Stamp copied onto children and errors of a report opened by `segment_type`.
    pub fn stamp(&self, segment_type: SegmentType) -> ReportStamp {
        ReportStamp {
            identifier: self.identifier.clone(),
            ori: self.ori.clone(),
            action: self.action,
            year_of_tape: self.year_of_tape,
            month_of_tape: self.month_of_tape,
            segment_type: Some(segment_type),
        }
    }
}

/// A Group A incident: administrative segment plus its children
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupAIncident {
    pub header: ReportHeader,
    pub source: ReportSource,
    pub incident_date: Parsed<NaiveDate>,
    pub report_date_indicator: Option<String>,
    pub incident_hour: Parsed<u32>,
    pub exceptional_clearance_code: Option<String>,
    pub exceptional_clearance_date: Parsed<NaiveDate>,
    pub cargo_theft: Option<String>,
    pub offenses: Vec<OffenseSegment>,
    pub properties: Vec<PropertySegment>,
    pub victims: Vec<VictimSegment>,
    pub offenders: Vec<OffenderSegment>,
    pub arrestees: Vec<ArresteeSegment>,
}

impl GroupAIncident {
    pub fn stamp(&self) -> ReportStamp {
        self.header.stamp(SegmentType::Administrative)
    }

    pub fn error_template(&self) -> ErrorTemplate {
        ErrorTemplate::new(SegmentType::Administrative)
            .with_context(self.source.clone())
            .with_report(self.stamp())
    }

    pub fn add_offense(&mut self, mut offense: OffenseSegment) {
        offense.stamp = self.stamp();
        self.offenses.push(offense);
    }

    pub fn add_property(&mut self, mut property: PropertySegment) {
        property.stamp = self.stamp();
        self.properties.push(property);
    }

    pub fn add_victim(&mut self, mut victim: VictimSegment) {
        victim.stamp = self.stamp();
        self.victims.push(victim);
    }

    pub fn add_offender(&mut self, mut offender: OffenderSegment) {
        offender.stamp = self.stamp();
        self.offenders.push(offender);
    }

    pub fn add_arrestee(&mut self, mut arrestee: ArresteeSegment) {
        arrestee.stamp = self.stamp();
        self.arrestees.push(arrestee);
    }

    /// Offense segment with the given UCR code, if reported.
    pub fn offense(&self, ucr_code: &str) -> Option<&OffenseSegment> {
        self.offenses
            .iter()
            .find(|o| o.ucr_offense_code.as_deref() == Some(ucr_code))
    }

    /// Offender segment with the given sequence number, if reported.
    pub fn offender(&self, sequence_number: u32) -> Option<&OffenderSegment> {
        self.offenders
            .iter()
            .find(|o| o.sequence_number.get() == Some(sequence_number))
    }

    /// Number of child segments of all types.
    pub fn child_count(&self) -> usize {
        self.offenses.len()
            + self.properties.len()
            + self.victims.len()
            + self.offenders.len()
            + self.arrestees.len()
    }
}

/// A Group B arrest report: one or more `7` arrestee segments sharing an ATN
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupBArrest {
    pub header: ReportHeader,
    pub source: ReportSource,
    pub arrestees: Vec<ArresteeSegment>,
}

impl GroupBArrest {
    pub fn stamp(&self) -> ReportStamp {
        self.header.stamp(SegmentType::GroupBArrestee)
    }

    pub fn error_template(&self) -> ErrorTemplate {
        ErrorTemplate::new(SegmentType::GroupBArrestee)
            .with_context(self.source.clone())
            .with_report(self.stamp())
    }

    pub fn add_arrestee(&mut self, mut arrestee: ArresteeSegment) {
        arrestee.stamp = self.stamp();
        self.arrestees.push(arrestee);
    }
}

/// A zero report: the agency had no incidents for the reporting period
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZeroReport {
    pub header: ReportHeader,
    pub source: ReportSource,
    pub zero_report_month: Parsed<u32>,
    pub zero_report_year: Parsed<i32>,
}

impl ZeroReport {
    pub fn stamp(&self) -> ReportStamp {
        self.header.stamp(SegmentType::ZeroReport)
    }

    pub fn error_template(&self) -> ErrorTemplate {
        ErrorTemplate::new(SegmentType::ZeroReport)
            .with_context(self.source.clone())
            .with_report(self.stamp())
    }
}

/// Child segment awaiting attachment to the report currently being built
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildSegment {
    Offense(OffenseSegment),
    Property(PropertySegment),
    Victim(VictimSegment),
    Offender(OffenderSegment),
    Arrestee(ArresteeSegment),
}

impl ChildSegment {
    pub fn segment_type(&self) -> SegmentType {
        match self {
            ChildSegment::Offense(s) => s.segment_type(),
            ChildSegment::Property(s) => s.segment_type(),
            ChildSegment::Victim(s) => s.segment_type(),
            ChildSegment::Offender(s) => s.segment_type(),
            ChildSegment::Arrestee(s) => s.segment_type(),
        }
    }
}

/// A fully decoded report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Report {
    GroupA(GroupAIncident),
    GroupB(GroupBArrest),
    Zero(ZeroReport),
}

impl Report {
    pub fn header(&self) -> &ReportHeader {
        match self {
            Report::GroupA(r) => &r.header,
            Report::GroupB(r) => &r.header,
            Report::Zero(r) => &r.header,
        }
    }

    /// Incident number or arrest transaction number.
    pub fn identifier(&self) -> Option<&str> {
        self.header().identifier.as_deref()
    }

    pub fn action(&self) -> ActionType {
        self.header().action
    }

    pub fn source(&self) -> &ReportSource {
        match self {
            Report::GroupA(r) => &r.source,
            Report::GroupB(r) => &r.source,
            Report::Zero(r) => &r.source,
        }
    }

    /// Segment type of the report's opening segment.
    pub fn segment_type(&self) -> SegmentType {
        match self {
            Report::GroupA(_) => SegmentType::Administrative,
            Report::GroupB(_) => SegmentType::GroupBArrestee,
            Report::Zero(_) => SegmentType::ZeroReport,
        }
    }

    pub fn stamp(&self) -> ReportStamp {
        self.header().stamp(self.segment_type())
    }

    /// Attach a child segment, rejecting types the report kind cannot own.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChildNotAllowed`] for offense/property/victim/offender/Group A
    /// arrestee segments under a Group B or zero report, and for Group B arrestees
    /// under anything but a Group B report.
    pub fn attach(&mut self, child: ChildSegment) -> Result<()> {
        let child_type = child.segment_type();
        let parent_type = self.segment_type();
        trace!(
            identifier = self.identifier().unwrap_or_default(),
            child = %child_type,
            "attaching child segment"
        );
        match (self, child) {
            (Report::GroupA(r), ChildSegment::Offense(s)) => r.add_offense(s),
            (Report::GroupA(r), ChildSegment::Property(s)) => r.add_property(s),
            (Report::GroupA(r), ChildSegment::Victim(s)) => r.add_victim(s),
            (Report::GroupA(r), ChildSegment::Offender(s)) => r.add_offender(s),
            (Report::GroupA(r), ChildSegment::Arrestee(s)) if !s.is_group_b() => r.add_arrestee(s),
            (Report::GroupB(r), ChildSegment::Arrestee(s)) if s.is_group_b() => r.add_arrestee(s),
            _ => {
                return Err(Error::ChildNotAllowed {
                    child: child_type,
                    parent: parent_type,
                });
            }
        }
        Ok(())
    }
}
