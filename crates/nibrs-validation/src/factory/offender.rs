//! Offender segment rules

use super::person::{age_error, age_order, first_person_field, PersonValueRule};
use crate::rules::{NumericValueRule, ParsedValueRule, RuleSet, Subject};
use crate::Result;
use nibrs_catalog::{codelist::names, Catalog};
use nibrs_model::{
    Age, FieldValue, GroupAIncident, NibrsError, OffenderSegment, Person, VictimSegment,
};

/// Relationships implying the victim and offender share a sex
const SAME_SEX_RELATIONSHIPS: &[&str] = &["HR"];

/// Relationships implying the victim and offender differ in sex
const OPPOSITE_SEX_RELATIONSHIPS: &[&str] = &["BG", "SE", "CS", "XS"];

/// Relationships where the victim is the offender's parent or grandparent
const VICTIM_OLDER: &[&str] = &["PA", "GP"];

/// Relationships where the victim is the offender's child or grandchild
const VICTIM_YOUNGER: &[&str] = &["CH", "GC"];

const SPOUSE: &str = "SE";
const MIN_SPOUSE_AGE: u32 = 10;
const UNKNOWN_SEX: &str = "U";

/// Relationship codes every victim reports toward this offender.
fn relationships_to<'a>(
    offender: &OffenderSegment,
    incident: &'a GroupAIncident,
) -> impl Iterator<Item = (&'a VictimSegment, &'a str)> {
    let sequence = offender.sequence_number.get();
    incident.victims.iter().flat_map(move |victim| {
        victim
            .related_offenders()
            .filter(move |(n, _)| Some(*n) == sequence)
            .filter_map(move |(_, r)| r.map(|r| (victim, r)))
    })
}

fn comparable(age: Option<&Age>) -> Option<&Age> {
    age.filter(|a| !a.is_unknown() && !a.has_error())
}

/// Rules for offender segments.
///
/// # Errors
///
/// Returns [`crate::Error::Catalog`] if a code list is missing from `catalog`.
pub fn rules(catalog: &Catalog) -> Result<RuleSet<OffenderSegment>> {
    let mut rules = RuleSet::new();
    rules
        .push(
            ParsedValueRule::new(|o: &OffenderSegment| &o.sequence_number, "36").required("501"),
        )
        .push(NumericValueRule::new(
            |o: &OffenderSegment| o.sequence_number.get().map(i64::from),
            |n, o: &OffenderSegment| {
                (!(0..=99).contains(&n)).then(|| o.template().error("501", "36", None))
            },
        ))
        .push(PersonValueRule::required(
            |o: &OffenderSegment| o.sex.as_deref(),
            "38",
            "504",
            catalog.code_list(names::SEX)?,
        ))
        .push(PersonValueRule::required(
            |o: &OffenderSegment| o.race.as_deref(),
            "39",
            "504",
            catalog.code_list(names::RACE)?,
        ))
        .push(PersonValueRule::optional(
            |o: &OffenderSegment| o.ethnicity.as_deref(),
            "39A",
            "504",
            catalog.code_list(names::ETHNICITY)?,
        ))
        .push(age_error::<OffenderSegment>("37"))
        .push(age_order::<OffenderSegment>("37", "510"))
        .push(|o: &OffenderSegment| {
            if !o.is_unknown() {
                return None;
            }
            let (de, value) = first_person_field(o, ["37", "38", "39", "39A", ""])?;
            Some(o.template().error("552", de, value))
        })
        .push_incident(spouse_younger_than_ten)
        .push_incident(sex_inconsistent_with_relationship)
        .push_incident(age_inconsistent_with_relationship)
        .push_incident(|o: &OffenderSegment, incident: &GroupAIncident| {
            let code = incident.exceptional_clearance_code.as_deref()?;
            (o.is_unknown() && code != "N")
                .then(|| o.template().error("557", "36", FieldValue::from(code)))
        });
    Ok(rules)
}

fn spouse_younger_than_ten(o: &OffenderSegment, incident: &GroupAIncident) -> Option<NibrsError> {
    let age = o.age.as_ref().filter(|a| !a.has_error() && !a.is_non_numeric())?;
    let young = age.min.is_some_and(|m| m < MIN_SPOUSE_AGE);
    let spouse = relationships_to(o, incident).any(|(_, r)| r == SPOUSE);
    (young && spouse).then(|| o.template().error("550", "37", FieldValue::from(age.to_raw())))
}

fn sex_inconsistent_with_relationship(
    o: &OffenderSegment,
    incident: &GroupAIncident,
) -> Option<NibrsError> {
    let offender_sex = o.sex.as_deref().filter(|s| *s != UNKNOWN_SEX)?;
    let inconsistent = relationships_to(o, incident).any(|(victim, relationship)| {
        let Some(victim_sex) = victim.sex.as_deref().filter(|s| *s != UNKNOWN_SEX) else {
            return false;
        };
        let same = victim_sex == offender_sex;
        (SAME_SEX_RELATIONSHIPS.contains(&relationship) && !same)
            || (OPPOSITE_SEX_RELATIONSHIPS.contains(&relationship) && same)
    });
    inconsistent.then(|| o.template().error("553", "38", FieldValue::from(offender_sex)))
}

fn age_inconsistent_with_relationship(
    o: &OffenderSegment,
    incident: &GroupAIncident,
) -> Option<NibrsError> {
    let offender_age = comparable(o.age.as_ref())?;
    let inconsistent = relationships_to(o, incident).any(|(victim, relationship)| {
        let Some(victim_age) = comparable(victim.age.as_ref()) else {
            return false;
        };
        (VICTIM_OLDER.contains(&relationship) && !victim_age.is_older_than(offender_age, true))
            || (VICTIM_YOUNGER.contains(&relationship)
                && !victim_age.is_younger_than(offender_age, true))
    });
    inconsistent.then(|| {
        o.template()
            .error("554", "37", FieldValue::from(offender_age.to_raw()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nibrs_model::{Parsed, SegmentType};

    fn text(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    fn offender(sequence: u32) -> OffenderSegment {
        OffenderSegment {
            sequence_number: Parsed::present(sequence),
            age: Some(Age::single(30)),
            sex: text("M"),
            race: text("W"),
            ethnicity: text("N"),
            ..OffenderSegment::default()
        }
    }

    fn incident(relationship: &str, victim_age: u32, victim_sex: &str) -> GroupAIncident {
        let mut victim = VictimSegment {
            sequence_number: Parsed::present(1),
            victim_type: text("I"),
            age: Some(Age::single(victim_age)),
            sex: text(victim_sex),
            ..VictimSegment::default()
        };
        victim.offender_numbers[0] = Parsed::present(1);
        victim.relationships[0] = text(relationship);
        GroupAIncident {
            exceptional_clearance_code: text("N"),
            victims: vec![victim],
            ..GroupAIncident::default()
        }
    }

    fn codes(offender: &OffenderSegment, incident: &GroupAIncident) -> Vec<String> {
        rules(&Catalog::builtin())
            .unwrap()
            .apply_in(offender, incident)
            .iter()
            .map(|e| e.code.to_string())
            .collect()
    }

    #[test]
    fn test_valid_offender_has_no_errors() {
        assert!(codes(&offender(1), &incident("AQ", 25, "F")).is_empty());
    }

    #[test]
    fn test_unknown_offender() {
        let unknown = OffenderSegment {
            sequence_number: Parsed::present(0),
            ..OffenderSegment::default()
        };
        let mut context = incident("AQ", 25, "F");
        assert!(codes(&unknown, &context).is_empty());

        context.exceptional_clearance_code = text("A");
        assert_eq!(codes(&unknown, &context), vec!["557"]);

        let described = OffenderSegment {
            race: text("W"),
            ..unknown
        };
        assert_eq!(codes(&described, &context), vec!["552", "557"]);
    }

    #[test]
    fn test_required_demographics() {
        let mut subject = offender(1);
        subject.sex = None;
        subject.race = text("Z");
        assert_eq!(codes(&subject, &incident("AQ", 25, "F")), vec!["504", "504"]);
    }

    #[test]
    fn test_non_numeric_age() {
        let mut subject = offender(1);
        subject.age = Age::parse("BB", SegmentType::Offender);
        assert_eq!(codes(&subject, &incident("AQ", 25, "F")), vec!["556"]);
    }

    #[test]
    fn test_sex_consistency() {
        assert_eq!(codes(&offender(1), &incident("BG", 25, "M")), vec!["553"]);
        assert_eq!(codes(&offender(1), &incident("HR", 25, "F")), vec!["553"]);
        assert!(codes(&offender(1), &incident("HR", 25, "M")).is_empty());
    }

    #[test]
    fn test_age_consistency() {
        assert_eq!(codes(&offender(1), &incident("PA", 20, "F")), vec!["554"]);
        assert!(codes(&offender(1), &incident("PA", 55, "F")).is_empty());
        assert_eq!(codes(&offender(1), &incident("CH", 40, "F")), vec!["554"]);
    }

    #[test]
    fn test_spouse_younger_than_ten() {
        let mut subject = offender(1);
        subject.age = Some(Age::single(9));
        assert_eq!(codes(&subject, &incident("SE", 9, "F")), vec!["550"]);
    }
}
