//! Child segments of a report
//!
//! Repeated sub-fields are fixed-size arrays sized to the flat-file slot count,
//! blank slots held as `None` (or `Parsed::Missing`).

use crate::age::Age;
use crate::error::ErrorTemplate;
use crate::metadata::{ActionType, ReportSource, ReportStamp, SegmentType};
use crate::parsed::Parsed;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Common behaviour of every segment that can carry errors
pub trait Segment {
    /// Segment-type code of this segment.
    fn segment_type(&self) -> SegmentType;

    /// Identifier distinguishing this segment among its same-type siblings.
    fn within_segment_id(&self) -> Option<String>;

    /// Source location of the segment.
    fn source(&self) -> &ReportSource;

    /// Identifying fields of the owning report.
    fn stamp(&self) -> &ReportStamp;

    /// Action code of the owning report.
    fn action(&self) -> ActionType {
        self.stamp().action
    }

    /// Template pre-filled with this segment's context.
    fn error_template(&self) -> ErrorTemplate {
        ErrorTemplate::new(self.segment_type())
            .with_within_segment(self.within_segment_id())
            .with_context(self.source().clone())
            .with_report(self.stamp().clone())
    }
}

/// Demographic fields shared by victims, offenders and arrestees
pub trait Person {
    fn age(&self) -> Option<&Age>;
    fn sex(&self) -> Option<&str>;
    fn race(&self) -> Option<&str>;
    fn ethnicity(&self) -> Option<&str>;
    fn resident_status(&self) -> Option<&str>;

    /// Whether the segment describes a person at all.
    fn is_person(&self) -> bool {
        true
    }

    /// Whether the person is explicitly unknown.
    fn is_unknown(&self) -> bool {
        false
    }
}

/// Estimated drug quantity: nine whole digits plus three decimal digits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DrugQuantity {
    pub whole: u64,
    pub thousandths: u32,
}

impl DrugQuantity {
    #[must_use]
    pub fn new(whole: u64, thousandths: u32) -> Self {
        Self { whole, thousandths }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        self.whole as f64 + f64::from(self.thousandths) / 1000.0
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.whole == 0 && self.thousandths == 0
    }
}

impl fmt::Display for DrugQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}", self.whole, self.thousandths)
    }
}

/// Offense segment ('2')
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffenseSegment {
    pub source: ReportSource,
    pub stamp: ReportStamp,
    pub ucr_offense_code: Option<String>,
    pub attempted_completed: Option<String>,
    pub suspected_of_using: [Option<String>; OffenseSegment::SUSPECTED_OF_USING_SLOTS],
    pub location_type: Option<String>,
    pub premises_entered: Parsed<u32>,
    pub method_of_entry: Option<String>,
    pub criminal_activity: [Option<String>; OffenseSegment::CRIMINAL_ACTIVITY_SLOTS],
    pub weapon_force: [Option<String>; OffenseSegment::WEAPON_SLOTS],
    pub automatic_weapon: [Option<String>; OffenseSegment::WEAPON_SLOTS],
    pub bias_motivation: [Option<String>; OffenseSegment::BIAS_SLOTS],
}

impl OffenseSegment {
    pub const SUSPECTED_OF_USING_SLOTS: usize = 3;
    pub const CRIMINAL_ACTIVITY_SLOTS: usize = 3;
    pub const WEAPON_SLOTS: usize = 3;
    pub const BIAS_SLOTS: usize = 5;
}

impl Segment for OffenseSegment {
    fn segment_type(&self) -> SegmentType {
        SegmentType::Offense
    }

    fn within_segment_id(&self) -> Option<String> {
        self.ucr_offense_code.clone()
    }

    fn source(&self) -> &ReportSource {
        &self.source
    }

    fn stamp(&self) -> &ReportStamp {
        &self.stamp
    }
}

/// Property segment ('3')
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySegment {
    pub source: ReportSource,
    pub stamp: ReportStamp,
    pub loss_type: Option<String>,
    pub descriptions: [Option<String>; PropertySegment::PROPERTY_SLOTS],
    pub values: [Parsed<u64>; PropertySegment::PROPERTY_SLOTS],
    pub recovered_dates: [Parsed<NaiveDate>; PropertySegment::PROPERTY_SLOTS],
    pub stolen_vehicles: Parsed<u32>,
    pub recovered_vehicles: Parsed<u32>,
    pub drug_types: [Option<String>; PropertySegment::DRUG_SLOTS],
    pub drug_quantities: [Parsed<DrugQuantity>; PropertySegment::DRUG_SLOTS],
    pub drug_measurements: [Option<String>; PropertySegment::DRUG_SLOTS],
}

impl PropertySegment {
    pub const PROPERTY_SLOTS: usize = 10;
    pub const DRUG_SLOTS: usize = 3;
}

impl Segment for PropertySegment {
    fn segment_type(&self) -> SegmentType {
        SegmentType::Property
    }

    fn within_segment_id(&self) -> Option<String> {
        self.loss_type.clone()
    }

    fn source(&self) -> &ReportSource {
        &self.source
    }

    fn stamp(&self) -> &ReportStamp {
        &self.stamp
    }
}

/// Victim segment ('4')
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VictimSegment {
    pub source: ReportSource,
    pub stamp: ReportStamp,
    pub sequence_number: Parsed<u32>,
    pub offense_connections: [Option<String>; VictimSegment::OFFENSE_CONNECTION_SLOTS],
    pub victim_type: Option<String>,
    pub age: Option<Age>,
    pub sex: Option<String>,
    pub race: Option<String>,
    pub ethnicity: Option<String>,
    pub resident_status: Option<String>,
    pub aggravated_assault: [Option<String>; VictimSegment::AGGRAVATED_ASSAULT_SLOTS],
    pub justifiable_homicide: Option<String>,
    pub injuries: [Option<String>; VictimSegment::INJURY_SLOTS],
    pub offender_numbers: [Parsed<u32>; VictimSegment::RELATED_OFFENDER_SLOTS],
    pub relationships: [Option<String>; VictimSegment::RELATED_OFFENDER_SLOTS],
    pub officer_activity: Option<String>,
    pub officer_assignment: Option<String>,
    pub officer_other_ori: Option<String>,
}

impl VictimSegment {
    pub const OFFENSE_CONNECTION_SLOTS: usize = 10;
    pub const AGGRAVATED_ASSAULT_SLOTS: usize = 2;
    pub const INJURY_SLOTS: usize = 5;
    pub const RELATED_OFFENDER_SLOTS: usize = 10;

    /// Law enforcement officer victim ('L').
    #[must_use]
    pub fn is_law_enforcement_officer(&self) -> bool {
        self.victim_type.as_deref() == Some("L")
    }

    /// Whether any LEOKA (officer killed or assaulted) field is populated.
    #[must_use]
    pub fn has_officer_fields(&self) -> bool {
        self.officer_activity.is_some()
            || self.officer_assignment.is_some()
            || self.officer_other_ori.is_some()
    }

    /// Relationship codes paired with the offender they relate to.
    pub fn related_offenders(&self) -> impl Iterator<Item = (u32, Option<&str>)> + '_ {
        self.offender_numbers
            .iter()
            .zip(self.relationships.iter())
            .filter_map(|(n, r)| n.get().map(|n| (n, r.as_deref())))
    }
}

impl Segment for VictimSegment {
    fn segment_type(&self) -> SegmentType {
        SegmentType::Victim
    }

    fn within_segment_id(&self) -> Option<String> {
        self.sequence_number.get().map(|n| n.to_string())
    }

    fn source(&self) -> &ReportSource {
        &self.source
    }

    fn stamp(&self) -> &ReportStamp {
        &self.stamp
    }
}

impl Person for VictimSegment {
    fn age(&self) -> Option<&Age> {
        self.age.as_ref()
    }

    fn sex(&self) -> Option<&str> {
        self.sex.as_deref()
    }

    fn race(&self) -> Option<&str> {
        self.race.as_deref()
    }

    fn ethnicity(&self) -> Option<&str> {
        self.ethnicity.as_deref()
    }

    fn resident_status(&self) -> Option<&str> {
        self.resident_status.as_deref()
    }

    fn is_person(&self) -> bool {
        matches!(self.victim_type.as_deref(), Some("I" | "L"))
    }
}

/// Offender segment ('5')
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffenderSegment {
    pub source: ReportSource,
    pub stamp: ReportStamp,
    pub sequence_number: Parsed<u32>,
    pub age: Option<Age>,
    pub sex: Option<String>,
    pub race: Option<String>,
    pub ethnicity: Option<String>,
}

impl Segment for OffenderSegment {
    fn segment_type(&self) -> SegmentType {
        SegmentType::Offender
    }

    fn within_segment_id(&self) -> Option<String> {
        self.sequence_number.get().map(|n| n.to_string())
    }

    fn source(&self) -> &ReportSource {
        &self.source
    }

    fn stamp(&self) -> &ReportStamp {
        &self.stamp
    }
}

impl Person for OffenderSegment {
    fn age(&self) -> Option<&Age> {
        self.age.as_ref()
    }

    fn sex(&self) -> Option<&str> {
        self.sex.as_deref()
    }

    fn race(&self) -> Option<&str> {
        self.race.as_deref()
    }

    fn ethnicity(&self) -> Option<&str> {
        self.ethnicity.as_deref()
    }

    fn resident_status(&self) -> Option<&str> {
        None
    }

    /// Sequence number 00 marks an offender about whom nothing is known.
    fn is_unknown(&self) -> bool {
        self.sequence_number.get() == Some(0)
    }
}

/// Arrestee segment: Group A ('6') or Group B ('7')
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArresteeSegment {
    pub segment_type: SegmentType,
    pub source: ReportSource,
    pub stamp: ReportStamp,
    pub sequence_number: Parsed<u32>,
    pub arrest_transaction_number: Option<String>,
    pub arrest_date: Parsed<NaiveDate>,
    pub type_of_arrest: Option<String>,
    pub multiple_arrestee_indicator: Option<String>,
    pub ucr_offense_code: Option<String>,
    pub armed_with: [Option<String>; ArresteeSegment::ARMED_WITH_SLOTS],
    pub automatic_weapon: [Option<String>; ArresteeSegment::ARMED_WITH_SLOTS],
    pub age: Option<Age>,
    pub sex: Option<String>,
    pub race: Option<String>,
    pub ethnicity: Option<String>,
    pub resident_status: Option<String>,
    pub disposition_under_18: Option<String>,
}

impl ArresteeSegment {
    pub const ARMED_WITH_SLOTS: usize = 2;

    /// Empty arrestee of the given kind.
    #[must_use]
    pub fn new(segment_type: SegmentType) -> Self {
        Self {
            segment_type,
            source: ReportSource::default(),
            stamp: ReportStamp::default(),
            sequence_number: Parsed::Missing,
            arrest_transaction_number: None,
            arrest_date: Parsed::Missing,
            type_of_arrest: None,
            multiple_arrestee_indicator: None,
            ucr_offense_code: None,
            armed_with: Default::default(),
            automatic_weapon: Default::default(),
            age: None,
            sex: None,
            race: None,
            ethnicity: None,
            resident_status: None,
            disposition_under_18: None,
        }
    }

    #[must_use]
    pub fn is_group_b(&self) -> bool {
        self.segment_type == SegmentType::GroupBArrestee
    }

    /// Whether the arrestee's age places them under 18.
    #[must_use]
    pub fn is_juvenile(&self) -> bool {
        match &self.age {
            Some(age) if !age.is_unknown() && age.error.is_none() => {
                age.is_non_numeric()
                    || age.max.is_some_and(|m| m < 18)
                    || (age.min.is_some_and(|m| m < 18) && age.average().is_some_and(|a| a < 18))
            }
            _ => false,
        }
    }
}

impl Segment for ArresteeSegment {
    fn segment_type(&self) -> SegmentType {
        self.segment_type
    }

    fn within_segment_id(&self) -> Option<String> {
        self.sequence_number.get().map(|n| n.to_string())
    }

    fn source(&self) -> &ReportSource {
        &self.source
    }

    fn stamp(&self) -> &ReportStamp {
        &self.stamp
    }
}

impl Person for ArresteeSegment {
    fn age(&self) -> Option<&Age> {
        self.age.as_ref()
    }

    fn sex(&self) -> Option<&str> {
        self.sex.as_deref()
    }

    fn race(&self) -> Option<&str> {
        self.race.as_deref()
    }

    fn ethnicity(&self) -> Option<&str> {
        self.ethnicity.as_deref()
    }

    fn resident_status(&self) -> Option<&str> {
        self.resident_status.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_victim_person_and_officer() {
        let mut victim = VictimSegment {
            victim_type: Some("I".to_string()),
            ..VictimSegment::default()
        };
        assert!(victim.is_person());
        assert!(!victim.is_law_enforcement_officer());

        victim.victim_type = Some("B".to_string());
        assert!(!victim.is_person());

        victim.victim_type = Some("L".to_string());
        victim.officer_activity = Some("01".to_string());
        assert!(victim.is_person() && victim.has_officer_fields());
    }

    #[test]
    fn test_offender_sequence_zero_is_unknown() {
        let mut offender = OffenderSegment {
            sequence_number: Parsed::present(0),
            ..OffenderSegment::default()
        };
        assert!(offender.is_unknown());
        offender.sequence_number = Parsed::present(1);
        assert!(!offender.is_unknown());
        offender.sequence_number = Parsed::missing();
        assert!(!offender.is_unknown());
    }

    #[test]
    fn test_arrestee_juvenile() {
        let mut arrestee = ArresteeSegment::new(SegmentType::GroupAArrestee);
        assert!(!arrestee.is_juvenile());
        arrestee.age = Some(Age::single(16));
        assert!(arrestee.is_juvenile());
        arrestee.age = Some(Age::range(16, 19));
        assert!(arrestee.is_juvenile());
        arrestee.age = Some(Age::range(17, 25));
        assert!(!arrestee.is_juvenile());
        arrestee.age = Some(Age::code("00"));
        assert!(!arrestee.is_juvenile());
    }

    #[test]
    fn test_error_template_carries_within_segment_id() {
        let offense = OffenseSegment {
            ucr_offense_code: Some("13A".to_string()),
            source: ReportSource::new("in.txt", 2),
            ..OffenseSegment::default()
        };
        let template = offense.error_template();
        assert_eq!(template.segment_type, SegmentType::Offense);
        assert_eq!(template.within_segment.as_deref(), Some("13A"));
        assert_eq!(template.context.map(|c| c.line), Some(2));
    }

    #[test]
    fn test_related_offenders_skip_blank_slots() {
        let mut victim = VictimSegment::default();
        victim.offender_numbers[0] = Parsed::present(1);
        victim.relationships[0] = Some("SE".to_string());
        victim.offender_numbers[2] = Parsed::present(2);
        let related: Vec<_> = victim.related_offenders().collect();
        assert_eq!(related, vec![(1, Some("SE")), (2, None)]);
    }

    #[test]
    fn test_drug_quantity_display() {
        assert_eq!(DrugQuantity::new(12, 5).to_string(), "12.005");
        assert!((DrugQuantity::new(1, 500).as_f64() - 1.5).abs() < f64::EPSILON);
    }
}
