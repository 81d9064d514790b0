//! Per-segment rule assemblies
//!
//! Each factory builds the ordered [`RuleSet`] for one subject type from a
//! [`Catalog`], failing fast when a code list it needs is missing. Rule order is
//! stable so that error output is deterministic.

pub mod arrestee;
pub mod group_b;
pub mod incident;
pub mod offender;
pub mod offense;
pub mod person;
pub mod property;
pub mod victim;
pub mod zero_report;

use crate::rules::{RuleSet, Subject};
use crate::Result;
use chrono::{Datelike, NaiveDate};
use nibrs_catalog::Catalog;
use nibrs_model::{
    ArresteeSegment, FieldValue, GroupAIncident, GroupBArrest, OffenderSegment, OffenseSegment,
    PropertySegment, ReportHeader, SegmentType, VictimSegment, ZeroReport,
};
use tracing::debug;

/// Every rule set needed to validate any report
pub struct ReportRules {
    pub incident: RuleSet<GroupAIncident>,
    pub offense: RuleSet<OffenseSegment>,
    pub property: RuleSet<PropertySegment>,
    pub victim: RuleSet<VictimSegment>,
    pub offender: RuleSet<OffenderSegment>,
    pub group_a_arrestee: RuleSet<ArresteeSegment>,
    pub group_b: RuleSet<GroupBArrest>,
    pub group_b_arrestee: RuleSet<ArresteeSegment>,
    pub zero_report: RuleSet<ZeroReport>,
}

impl ReportRules {
    /// Assemble every factory against `catalog`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Catalog`] if a referenced code list is missing.
    pub fn from_catalog(catalog: &Catalog) -> Result<Self> {
        let rules = Self {
            incident: incident::rules(catalog)?,
            offense: offense::rules(catalog)?,
            property: property::rules(catalog)?,
            victim: victim::rules(catalog)?,
            offender: offender::rules(catalog)?,
            group_a_arrestee: arrestee::rules(catalog, SegmentType::GroupAArrestee)?,
            group_b: group_b::rules(),
            group_b_arrestee: arrestee::rules(catalog, SegmentType::GroupBArrestee)?,
            zero_report: zero_report::rules(),
        };
        debug!(
            incident = rules.incident.len(),
            offense = rules.offense.len(),
            property = rules.property.len(),
            victim = rules.victim.len(),
            offender = rules.offender.len(),
            arrestee = rules.group_a_arrestee.len(),
            "Assembled rule sets"
        );
        Ok(rules)
    }

    /// Arrestee rules matching the arrestee's segment type.
    #[must_use]
    pub fn arrestee(&self, arrestee: &ArresteeSegment) -> &RuleSet<ArresteeSegment> {
        if arrestee.is_group_b() {
            &self.group_b_arrestee
        } else {
            &self.group_a_arrestee
        }
    }
}

/// Data element reported for the submission year
pub const YEAR_OF_TAPE: &str = "Year of Tape";
/// Data element reported for the submission month
pub const MONTH_OF_TAPE: &str = "Month of Tape";
/// First submission year accepted
pub const MIN_YEAR_OF_TAPE: i32 = 1991;

/// Mandatory ORI and submission period checks shared by every report type.
pub(crate) fn push_header_rules<S: Subject + 'static>(
    rules: &mut RuleSet<S>,
    header: fn(&S) -> &ReportHeader,
) {
    rules
        .push(move |s: &S| {
            header(s)
                .ori
                .as_deref()
                .is_none_or(|o| o.trim().is_empty())
                .then(|| s.template().error("101", "1", None))
        })
        .push(move |s: &S| {
            header(s)
                .year_of_tape
                .is_none()
                .then(|| s.template().error("101", YEAR_OF_TAPE, None))
        })
        .push(move |s: &S| {
            header(s)
                .month_of_tape
                .is_none()
                .then(|| s.template().error("101", MONTH_OF_TAPE, None))
        })
        .push(move |s: &S| {
            let year = header(s).year_of_tape?;
            (year < MIN_YEAR_OF_TAPE).then(|| {
                s.template()
                    .error("104", YEAR_OF_TAPE, FieldValue::Integer(i64::from(year)))
            })
        })
        .push(move |s: &S| {
            let month = header(s).month_of_tape?;
            (!(1..=12).contains(&month))
                .then(|| s.template().error("104", MONTH_OF_TAPE, FieldValue::from(month)))
        });
}

/// Whether `value` is one of `codes`.
pub(crate) fn is_one_of(value: Option<&str>, codes: &[&str]) -> bool {
    value.is_some_and(|v| codes.contains(&v))
}

/// Whether any populated slot is one of `codes`.
pub(crate) fn any_of(slots: &[Option<String>], codes: &[&str]) -> bool {
    slots.iter().any(|s| is_one_of(s.as_deref(), codes))
}

/// Last day of the submission month, when the tape period is a real month.
pub(crate) fn tape_month_end(year: Option<i32>, month: Option<u32>) -> Option<NaiveDate> {
    next_month_start(year?, month?).and_then(|d| d.pred_opt())
}

/// First day of the month after the submission month.
pub(crate) fn next_month_start(year: i32, month: u32) -> Option<NaiveDate> {
    if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
}

/// Earliest incident date accepted for a submission month: January 1 of the
/// year before the month following the submission month.
pub(crate) fn earliest_incident_date(year: Option<i32>, month: Option<u32>) -> Option<NaiveDate> {
    let next = next_month_start(year?, month?)?;
    NaiveDate::from_ymd_opt(next.year() - 1, 1, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tape_month_end() {
        assert_eq!(
            tape_month_end(Some(2016), Some(2)),
            NaiveDate::from_ymd_opt(2016, 2, 29)
        );
        assert_eq!(
            tape_month_end(Some(2016), Some(12)),
            NaiveDate::from_ymd_opt(2016, 12, 31)
        );
        assert_eq!(tape_month_end(Some(2016), Some(13)), None);
        assert_eq!(tape_month_end(None, Some(1)), None);
    }

    #[test]
    fn test_earliest_incident_date() {
        assert_eq!(
            earliest_incident_date(Some(2016), Some(6)),
            NaiveDate::from_ymd_opt(2015, 1, 1)
        );
        assert_eq!(
            earliest_incident_date(Some(2016), Some(12)),
            NaiveDate::from_ymd_opt(2016, 1, 1)
        );
    }

    #[test]
    fn test_builtin_catalog_assembles() {
        let rules = ReportRules::from_catalog(&Catalog::builtin()).unwrap();
        assert!(!rules.incident.is_empty());
        assert!(!rules.group_b_arrestee.is_empty());
    }

    #[test]
    fn test_missing_code_list_fails_fast() {
        let mut catalog = Catalog::builtin();
        catalog.code_lists = nibrs_catalog::CodeListRegistry::new();
        assert!(ReportRules::from_catalog(&catalog).is_err());
    }
}
