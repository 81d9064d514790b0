//! Property segment rules

use super::{any_of, is_one_of, tape_month_end};
use crate::rules::{
    Coded, DuplicateValueRule, NotBlankRule, ParsedValueRule, RuleSet, Subject, ValidValueRule,
};
use crate::Result;
use nibrs_catalog::{codelist::names, Catalog};
use nibrs_model::{FieldValue, GroupAIncident, NibrsError, Parsed, PropertySegment};
use std::collections::HashSet;

/// Values at or above this amount raise a warning
pub const LARGE_VALUE: u64 = 1_000_000;

/// Descriptions that may carry a zero value
const ZERO_VALUE_ALLOWED: &[&str] = &["09", "22", "48", "65", "66", "77", "99"];

/// Descriptions whose value must be zero
const ZERO_VALUE_REQUIRED: &[&str] = &["09", "22", "48", "65", "66"];

/// Descriptions covering motor vehicles
const VEHICLE_DESCRIPTIONS: &[&str] = &["03", "05", "24", "28", "37"];

/// Drug types that may be measured by number of plants
const PLANT_DRUGS: &[&str] = &["E", "G", "K"];

const PENDING_INVENTORY: &str = "88";
const OVER_THREE_TYPES: &str = "X";
const UNKNOWN_DRUG: &str = "U";
const NUMBER_OF_PLANTS: &str = "NP";
const MOTOR_VEHICLE_THEFT: &str = "240";
const DRUG_OFFENSE: &str = "35A";

const NONE_LOSS: &str = "1";
const RECOVERED: &str = "5";
const STOLEN: &str = "7";
const UNKNOWN_LOSS: &str = "8";

fn descriptions(p: &PropertySegment) -> &[Option<String>] {
    &p.descriptions
}

/// Description and value pairs, blank descriptions included.
fn described_values(p: &PropertySegment) -> impl Iterator<Item = (Option<&str>, &Parsed<u64>)> {
    p.descriptions
        .iter()
        .map(Option::as_deref)
        .zip(p.values.iter())
}

fn value_field(value: u64) -> FieldValue {
    FieldValue::Integer(i64::try_from(value).unwrap_or(i64::MAX))
}

fn has_property_data(p: &PropertySegment) -> bool {
    p.descriptions.iter().any(Option::is_some)
        || p.values.iter().any(|v| !v.is_missing())
        || p.recovered_dates.iter().any(|d| !d.is_missing())
        || !p.stolen_vehicles.is_missing()
        || !p.recovered_vehicles.is_missing()
        || p.drug_types.iter().any(Option::is_some)
}

/// Rules for property segments.
///
/// # Errors
///
/// Returns [`crate::Error::Catalog`] if a code list is missing from `catalog`.
pub fn rules(catalog: &Catalog) -> Result<RuleSet<PropertySegment>> {
    let mut rules = RuleSet::new();
    rules
        .push(NotBlankRule::new(
            |p: &PropertySegment| p.loss_type.as_deref(),
            "14",
            "301",
        ))
        .push(ValidValueRule::new(
            |p: &PropertySegment| Coded::Single(p.loss_type.as_deref()),
            "14",
            "304",
            catalog.code_list(names::PROPERTY_LOSS)?,
        ))
        .push(ValidValueRule::new(
            |p: &PropertySegment| Coded::Slots(descriptions(p)),
            "15",
            "304",
            catalog.code_list(names::PROPERTY_DESCRIPTION)?,
        ))
        .push(ValidValueRule::new(
            |p: &PropertySegment| Coded::Slots(&p.drug_types),
            "20",
            "304",
            catalog.code_list(names::DRUG_TYPE)?,
        ))
        .push(ValidValueRule::new(
            |p: &PropertySegment| Coded::Slots(&p.drug_measurements),
            "22",
            "304",
            catalog.code_list(names::DRUG_MEASUREMENT)?,
        ))
        .push(ParsedValueRule::slots(|p: &PropertySegment| &p.values, "16"))
        .push(ParsedValueRule::slots(
            |p: &PropertySegment| &p.recovered_dates,
            "17",
        ))
        .push(ParsedValueRule::new(
            |p: &PropertySegment| &p.stolen_vehicles,
            "18",
        ))
        .push(ParsedValueRule::new(
            |p: &PropertySegment| &p.recovered_vehicles,
            "19",
        ))
        .push(ParsedValueRule::slots(
            |p: &PropertySegment| &p.drug_quantities,
            "21",
        ))
        .push(DuplicateValueRule::new(descriptions, "15", "306"))
        .push(duplicate_drug_measure)
        .push(|p: &PropertySegment| {
            let large: Vec<Option<String>> = p
                .values
                .iter()
                .filter_map(Parsed::get)
                .filter(|v| *v >= LARGE_VALUE)
                .map(|v| Some(format!("{v:09}")))
                .collect();
            (!large.is_empty())
                .then(|| p.template().error("342", "16", FieldValue::List(large)))
        })
        .push(|p: &PropertySegment| {
            described_values(p).find_map(|(description, value)| {
                let zero = value.get()? == 0;
                (zero && description.is_some() && !is_one_of(description, ZERO_VALUE_ALLOWED))
                    .then(|| p.template().error("351", "16", value_field(0)))
            })
        })
        .push(|p: &PropertySegment| {
            described_values(p).find_map(|(description, value)| {
                let value = value.get()?;
                (description == Some(PENDING_INVENTORY) && value != 1)
                    .then(|| p.template().error("353", "16", value_field(value)))
            })
        })
        .push(|p: &PropertySegment| {
            described_values(p).find_map(|(description, value)| {
                let value = value.get()?;
                description
                    .is_none()
                    .then(|| p.template().error("354", "15", value_field(value)))
            })
        })
        .push(|p: &PropertySegment| {
            let dated = p.recovered_dates.iter().find_map(Parsed::get)?;
            (p.loss_type.as_deref() != Some(RECOVERED))
                .then(|| p.template().error("355", "17", FieldValue::from(dated)))
        })
        .push(|p: &PropertySegment| {
            vehicles_without_description(p, p.stolen_vehicles.get(), "18")
        })
        .push(|p: &PropertySegment| {
            vehicles_without_description(p, p.recovered_vehicles.get(), "19")
        })
        .push(|p: &PropertySegment| {
            let quantified = p
                .drug_types
                .iter()
                .zip(p.drug_quantities.iter())
                .any(|(t, q)| t.as_deref() == Some(OVER_THREE_TYPES) && !q.is_missing());
            quantified.then(|| {
                p.template()
                    .error("363", "21", FieldValue::from(p.drug_types.as_slice()))
            })
        })
        .push(|p: &PropertySegment| {
            let measured = p
                .drug_types
                .iter()
                .zip(p.drug_measurements.iter())
                .any(|(t, m)| t.as_deref() == Some(OVER_THREE_TYPES) && m.is_some());
            measured.then(|| {
                p.template()
                    .error("363", "22", FieldValue::from(p.drug_measurements.as_slice()))
            })
        })
        .push(|p: &PropertySegment| {
            let mismatch = p
                .drug_types
                .iter()
                .zip(p.drug_measurements.iter())
                .any(|(t, m)| {
                    m.as_deref() == Some(NUMBER_OF_PLANTS)
                        && t.is_some()
                        && !is_one_of(t.as_deref(), PLANT_DRUGS)
                });
            mismatch.then(|| {
                p.template()
                    .error("367", "22", FieldValue::from(NUMBER_OF_PLANTS))
            })
        })
        .push(|p: &PropertySegment| {
            described_values(p).find_map(|(description, value)| {
                let value = value.get()?;
                (value != 0 && is_one_of(description, ZERO_VALUE_REQUIRED))
                    .then(|| p.template().error("391", "16", value_field(value)))
            })
        })
        .push_incident(recovered_date_outside_window)
        .push_incident(data_with_no_loss)
        .push_incident(stolen_vehicles_without_theft);
    Ok(rules)
}

/// A drug type entered twice with the same measurement, or unknown drug entered twice.
fn duplicate_drug_measure(p: &PropertySegment) -> Option<NibrsError> {
    let mut seen = HashSet::new();
    let mut unknown = 0;
    let duplicated = p
        .drug_types
        .iter()
        .zip(p.drug_measurements.iter())
        .filter_map(|(t, m)| t.as_deref().map(|t| (t, m.as_deref())))
        .any(|(drug, measure)| {
            if drug == UNKNOWN_DRUG {
                unknown += 1;
            }
            !seen.insert((drug, measure)) || unknown > 1
        });
    duplicated.then(|| {
        p.template()
            .error("306", "20", FieldValue::from(p.drug_types.as_slice()))
    })
}

fn vehicles_without_description(
    p: &PropertySegment,
    count: Option<u32>,
    data_element: &str,
) -> Option<NibrsError> {
    let count = count?;
    (count > 0 && !any_of(descriptions(p), VEHICLE_DESCRIPTIONS))
        .then(|| p.template().error("359", data_element, FieldValue::from(count)))
}

fn recovered_date_outside_window(
    p: &PropertySegment,
    incident: &GroupAIncident,
) -> Option<NibrsError> {
    let incident_date = incident.incident_date.get();
    let last = tape_month_end(incident.header.year_of_tape, incident.header.month_of_tape);
    p.recovered_dates
        .iter()
        .filter_map(Parsed::get)
        .find(|d| incident_date.is_some_and(|i| *d < i) || last.is_some_and(|l| *d > l))
        .map(|d| p.template().error("305", "17", FieldValue::from(d)))
}

fn data_with_no_loss(p: &PropertySegment, incident: &GroupAIncident) -> Option<NibrsError> {
    let loss = p.loss_type.as_deref()?;
    let drug_seizure = loss == NONE_LOSS && incident.offense(DRUG_OFFENSE).is_some();
    let no_loss = loss == UNKNOWN_LOSS || (loss == NONE_LOSS && !drug_seizure);
    (no_loss && has_property_data(p)).then(|| p.template().error("352", "14", FieldValue::from(loss)))
}

fn stolen_vehicles_without_theft(
    p: &PropertySegment,
    incident: &GroupAIncident,
) -> Option<NibrsError> {
    let count = p.stolen_vehicles.get()?;
    let completed_theft = incident
        .offense(MOTOR_VEHICLE_THEFT)
        .is_some_and(|o| o.attempted_completed.as_deref() == Some("C"));
    (p.loss_type.as_deref() != Some(STOLEN) || !completed_theft)
        .then(|| p.template().error("357", "18", FieldValue::from(count)))
}
