//! Victim segment rules

use super::any_of;
use super::person::{age_error, age_order, first_person_field, PersonValueRule};
use crate::rules::{
    Coded, DuplicateValueRule, NotAllBlankRule, NumericValueRule, ParsedValueRule, RuleExt,
    RuleSet, Subject, ValidValueRule,
};
use crate::Result;
use nibrs_catalog::{codelist::names, Catalog, CodeList};
use nibrs_model::{FieldValue, GroupAIncident, NibrsError, Person, VictimSegment};
use std::collections::HashSet;

/// Offenses for which person victims must report an injury
const INJURY_OFFENSES: &[&str] = &[
    "100", "11A", "11B", "11C", "11D", "120", "13A", "13B", "210", "64A", "64B",
];

const JUSTIFIABLE_HOMICIDE: &str = "09C";
const SPOUSE: &str = "SE";
const MIN_SPOUSE_AGE: u32 = 10;

const INDIVIDUAL: &str = "I";

fn offense_connections(v: &VictimSegment) -> &[Option<String>] {
    &v.offense_connections
}

fn injuries(v: &VictimSegment) -> &[Option<String>] {
    &v.injuries
}

fn aggravated_assault(v: &VictimSegment) -> &[Option<String>] {
    &v.aggravated_assault
}

fn connected_to(v: &VictimSegment, offenses: &[&str]) -> bool {
    any_of(&v.offense_connections, offenses)
}

fn offender_number_slots(v: &VictimSegment) -> Vec<Option<String>> {
    v.offender_numbers
        .iter()
        .map(|n| n.get().map(|n| format!("{n:02}")))
        .collect()
}

/// Rules for victim segments.
///
/// # Errors
///
/// Returns [`crate::Error::Catalog`] if a code list is missing from `catalog`.
pub fn rules(catalog: &Catalog) -> Result<RuleSet<VictimSegment>> {
    let relationships = catalog.code_list(names::RELATIONSHIP)?.clone();
    let mut rules = RuleSet::new();
    rules
        .push(ParsedValueRule::new(|v: &VictimSegment| &v.sequence_number, "23").required("401"))
        .push(NumericValueRule::new(
            |v: &VictimSegment| v.sequence_number.get().map(i64::from),
            |n, v: &VictimSegment| {
                (!(1..=999).contains(&n)).then(|| v.template().error("401", "23", None))
            },
        ))
        .push(NotAllBlankRule::new(offense_connections, "24", "401"))
        .push(ValidValueRule::new(
            |v: &VictimSegment| Coded::Slots(offense_connections(v)),
            "24",
            "401",
            catalog.code_list(names::GROUP_A_OFFENSE)?,
        ))
        .push(
            ValidValueRule::new(
                |v: &VictimSegment| Coded::Single(v.victim_type.as_deref()),
                "25",
                "401",
                catalog.code_list(names::VICTIM_TYPE)?,
            )
            .rejecting_null(),
        )
        .push(
            NotAllBlankRule::new(injuries, "33", "401").unless(|v: &VictimSegment| {
                !(v.is_person() && connected_to(v, INJURY_OFFENSES))
            }),
        )
        .push(ParsedValueRule::slots(
            |v: &VictimSegment| &v.offender_numbers,
            "34",
        ))
        .push(ValidValueRule::new(
            |v: &VictimSegment| Coded::Single(v.officer_activity.as_deref()),
            "25A",
            "404",
            catalog.code_list(names::OFFICER_ACTIVITY)?,
        ))
        .push(ValidValueRule::new(
            |v: &VictimSegment| Coded::Single(v.officer_assignment.as_deref()),
            "25B",
            "404",
            catalog.code_list(names::OFFICER_ASSIGNMENT)?,
        ))
        .push(age_error::<VictimSegment>("26"))
        .push(ValidValueRule::new(
            |v: &VictimSegment| Coded::Slots(injuries(v)),
            "33",
            "404",
            catalog.code_list(names::INJURY)?,
        ))
        .push(PersonValueRule::required(
            |v: &VictimSegment| v.sex.as_deref(),
            "27",
            "404",
            catalog.code_list(names::SEX)?,
        ))
        .push(PersonValueRule::required(
            |v: &VictimSegment| v.race.as_deref(),
            "28",
            "404",
            catalog.code_list(names::RACE)?,
        ))
        .push(PersonValueRule::optional(
            |v: &VictimSegment| v.ethnicity.as_deref(),
            "29",
            "404",
            catalog.code_list(names::ETHNICITY)?,
        ))
        .push(PersonValueRule::optional(
            |v: &VictimSegment| v.resident_status.as_deref(),
            "30",
            "404",
            catalog.code_list(names::RESIDENT_STATUS)?,
        ))
        .push(ValidValueRule::new(
            |v: &VictimSegment| Coded::Slots(aggravated_assault(v)),
            "31",
            "404",
            catalog.code_list(names::AGGRAVATED_ASSAULT)?,
        ))
        .push(ValidValueRule::new(
            |v: &VictimSegment| Coded::Single(v.justifiable_homicide.as_deref()),
            "32",
            "404",
            catalog.code_list(names::JUSTIFIABLE_HOMICIDE)?,
        ))
        .push(
            NotAllBlankRule::new(aggravated_assault, "31", "404")
                .unless(|v: &VictimSegment| !connected_to(v, &[JUSTIFIABLE_HOMICIDE])),
        )
        .push(|v: &VictimSegment| {
            (connected_to(v, &[JUSTIFIABLE_HOMICIDE]) && v.justifiable_homicide.is_none())
                .then(|| v.template().error("404", "32", None))
        })
        .push(move |v: &VictimSegment| invalid_relationships(v, &relationships))
        .push(DuplicateValueRule::new(injuries, "33", "406"))
        .push(DuplicateValueRule::new(aggravated_assault, "31", "406"))
        .push(DuplicateValueRule::new(offense_connections, "24", "406"))
        .push(|v: &VictimSegment| {
            let numbers = offender_number_slots(v);
            let mut seen = HashSet::new();
            numbers
                .iter()
                .flatten()
                .any(|n| !seen.insert(n))
                .then(|| v.template().error("406", "34", FieldValue::List(numbers.clone())))
        })
        .push(age_order::<VictimSegment>("26", "410"))
        .push(|v: &VictimSegment| {
            let age = v.age.as_ref()?;
            let spouse = v.related_offenders().any(|(_, r)| r == Some(SPOUSE));
            let young = !age.has_error() && age.min.is_some_and(|m| m < MIN_SPOUSE_AGE);
            (spouse && young)
                .then(|| v.template().error("450", "26", FieldValue::from(age.to_raw())))
        })
        .push(|v: &VictimSegment| {
            if v.victim_type.as_deref() != Some(INDIVIDUAL) {
                return None;
            }
            first_missing(&[
                ("26", v.age.is_none()),
                ("27", v.sex.is_none()),
                ("28", v.race.is_none()),
            ])
            .map(|de| v.template().error("453", de, None))
        })
        .push(|v: &VictimSegment| {
            if !v.is_law_enforcement_officer() {
                return None;
            }
            first_missing(&[
                ("25A", v.officer_activity.is_none()),
                ("25B", v.officer_assignment.is_none()),
                ("26", v.age.is_none()),
                ("27", v.sex.is_none()),
                ("28", v.race.is_none()),
            ])
            .map(|de| v.template().error("454", de, None))
        })
        .push(|v: &VictimSegment| {
            if v.is_person() || v.victim_type.is_none() {
                return None;
            }
            let (de, value) = first_person_field(v, ["26", "27", "28", "29", "30"])?;
            Some(v.template().error("458", de, value))
        })
        .push(|v: &VictimSegment| {
            if v.is_law_enforcement_officer() {
                return None;
            }
            [
                ("25A", v.officer_activity.as_deref()),
                ("25B", v.officer_assignment.as_deref()),
                ("25C", v.officer_other_ori.as_deref()),
            ]
            .into_iter()
            .find_map(|(de, value)| {
                value.map(|val| v.template().error("483", de, FieldValue::from(val)))
            })
        })
        .push_incident(unknown_offender_number);
    Ok(rules)
}

/// Data element of the first missing field.
fn first_missing(fields: &[(&'static str, bool)]) -> Option<&'static str> {
    fields.iter().find(|(_, missing)| *missing).map(|(de, _)| *de)
}

/// Relationships paired with no offender, or outside the valid set.
fn invalid_relationships(v: &VictimSegment, valid: &CodeList) -> Option<NibrsError> {
    let invalid: Vec<Option<String>> = v
        .offender_numbers
        .iter()
        .zip(v.relationships.iter())
        .filter_map(|(number, relationship)| {
            let relationship = relationship.as_deref()?;
            let bad = match number.get() {
                None => !number.is_invalid(),
                Some(0) => false,
                Some(_) => !valid.is_valid(relationship),
            };
            bad.then(|| Some(relationship.to_string()))
        })
        .collect();
    (!invalid.is_empty()).then(|| {
        v.template()
            .error("404", "35", FieldValue::List(invalid))
    })
}

fn unknown_offender_number(v: &VictimSegment, incident: &GroupAIncident) -> Option<NibrsError> {
    let unknown = v
        .related_offenders()
        .map(|(n, _)| n)
        .find(|n| *n != 0 && incident.offender(*n).is_none())?;
    Some(
        v.template()
            .error("404", "34", FieldValue::Text(format!("{unknown:02}"))),
    )
}
