//! Administrative segment and whole-incident rules

use super::{any_of, earliest_incident_date, is_one_of, push_header_rules, tape_month_end};
use crate::rules::{
    Coded, IdentifierFormatRule, NotBlankRule, NumericValueRule, ParsedValueRule, RuleExt,
    RuleSet, Subject, ValidValueRule,
};
use crate::Result;
use chrono::NaiveDate;
use nibrs_catalog::{codelist::names, Catalog};
use nibrs_model::{FieldValue, GroupAIncident, NibrsError, PropertySegment};
use std::collections::HashSet;

/// Offenses for which the cargo theft indicator is mandatory
pub const CARGO_THEFT_OFFENSES: &[&str] = &[
    "120", "210", "220", "23D", "23F", "23H", "240", "26A", "26B", "26C", "26E", "510", "270",
];

/// Exceptional clearance codes that require a clearance date
const CLEARED_EXCEPTIONALLY: &[&str] = &["A", "B", "C", "D", "E"];

/// Offenses allowing recovered property that was never reported stolen
const RECOVERY_ONLY_OFFENSES: &[&str] = &["250", "280"];

/// Vehicle descriptions covering recovered vehicle parts (38)
const VEHICLE_DESCRIPTIONS: &[&str] = &["03", "05"];

const VEHICLE_PARTS: &str = "38";

const STOLEN: &str = "7";
const RECOVERED: &str = "5";

fn identifier(i: &GroupAIncident) -> Option<&str> {
    i.header.identifier.as_deref()
}

fn has_cargo_theft_offense(incident: &GroupAIncident) -> bool {
    incident
        .offenses
        .iter()
        .any(|o| is_one_of(o.ucr_offense_code.as_deref(), CARGO_THEFT_OFFENSES))
}

fn earliest_reportable() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1991, 1, 1)
}

/// Rules for a Group A incident's administrative segment.
///
/// # Errors
///
/// Returns [`crate::Error`] if a code list is missing from `catalog` or an
/// identifier pattern fails to compile.
pub fn rules(catalog: &Catalog) -> Result<RuleSet<GroupAIncident>> {
    let mut rules = RuleSet::new();
    push_header_rules(&mut rules, |i: &GroupAIncident| &i.header);
    rules
        .push(NotBlankRule::new(identifier, "2", "101"))
        .push(ParsedValueRule::new(|i: &GroupAIncident| &i.incident_date, "3").required("101"))
        .push(
            ValidValueRule::new(
                |i: &GroupAIncident| Coded::Single(i.exceptional_clearance_code.as_deref()),
                "4",
                "101",
                catalog.code_list(names::CLEARED_EXCEPTIONALLY)?,
            )
            .rejecting_null(),
        )
        .push(ValidValueRule::new(
            |i: &GroupAIncident| Coded::Single(i.report_date_indicator.as_deref()),
            "3",
            "104",
            catalog.code_list(names::REPORT_DATE_INDICATOR)?,
        ))
        .push(
            ValidValueRule::new(
                |i: &GroupAIncident| Coded::Single(i.cargo_theft.as_deref()),
                "2A",
                "104",
                catalog.code_list(names::CARGO_THEFT)?,
            )
            .unless(|i: &GroupAIncident| !has_cargo_theft_offense(i)),
        )
        .push(ParsedValueRule::new(|i: &GroupAIncident| &i.incident_hour, "3"))
        .push(ParsedValueRule::new(
            |i: &GroupAIncident| &i.exceptional_clearance_date,
            "5",
        ))
        .push(IdentifierFormatRule::no_embedded_blanks(identifier, "2", "115")?)
        .push(IdentifierFormatRule::characters(identifier, "2", "117")?)
        .push(|i: &GroupAIncident| {
            (has_cargo_theft_offense(i) && i.cargo_theft.is_none())
                .then(|| i.template().error("119", "2A", None))
        })
        .push(NumericValueRule::new(
            |i: &GroupAIncident| i.incident_hour.get().map(i64::from),
            |hour, i: &GroupAIncident| (hour > 23).then(|| i.template().error("152", "3", None)),
        ))
        .push(|i: &GroupAIncident| {
            let date = i.exceptional_clearance_date.get()?;
            (i.exceptional_clearance_code.as_deref() == Some("N"))
                .then(|| i.template().error("153", "4", FieldValue::from(date)))
        })
        .push(|i: &GroupAIncident| {
            let cleared = i.exceptional_clearance_date.get()?;
            let incident = i.incident_date.get()?;
            (cleared < incident).then(|| i.template().error("155", "5", FieldValue::from(cleared)))
        })
        .push(|i: &GroupAIncident| {
            (i.exceptional_clearance_date.is_missing()
                && is_one_of(i.exceptional_clearance_code.as_deref(), CLEARED_EXCEPTIONALLY))
            .then(|| i.template().error("156", "5", None))
        })
        .push(|i: &GroupAIncident| {
            let date = i.incident_date.get()?;
            let last = tape_month_end(i.header.year_of_tape, i.header.month_of_tape)?;
            (date > last).then(|| i.template().error("170", "3", FieldValue::from(date)))
        })
        .push(|i: &GroupAIncident| {
            let date = i.incident_date.get()?;
            let first = earliest_incident_date(i.header.year_of_tape, i.header.month_of_tape)?;
            (date < first).then(|| i.template().error("171", "3", FieldValue::from(date)))
        })
        .push(|i: &GroupAIncident| {
            let date = i.incident_date.get()?;
            (date < earliest_reportable()?)
                .then(|| i.template().error("172", "3", FieldValue::from(date)))
        })
        .push(recovered_not_stolen)
        .push(recovered_vehicles_exceed_stolen);
    Ok(rules)
}

fn properties_with_loss<'a>(
    incident: &'a GroupAIncident,
    loss: &'a str,
) -> impl Iterator<Item = &'a PropertySegment> {
    incident
        .properties
        .iter()
        .filter(move |p| p.loss_type.as_deref() == Some(loss))
}

fn recovered_not_stolen(incident: &GroupAIncident) -> Option<NibrsError> {
    if incident
        .offenses
        .iter()
        .any(|o| is_one_of(o.ucr_offense_code.as_deref(), RECOVERY_ONLY_OFFENSES))
    {
        return None;
    }
    let stolen: HashSet<&str> = properties_with_loss(incident, STOLEN)
        .flat_map(|p| p.descriptions.iter().flatten().map(String::as_str))
        .collect();
    let stolen_vehicle = properties_with_loss(incident, STOLEN)
        .any(|p| any_of(&p.descriptions, VEHICLE_DESCRIPTIONS));

    properties_with_loss(incident, RECOVERED).find_map(|recovered| {
        let unmatched: Vec<Option<String>> = recovered
            .descriptions
            .iter()
            .flatten()
            .filter(|d| !stolen.contains(d.as_str()))
            .filter(|d| !(d.as_str() == VEHICLE_PARTS && stolen_vehicle))
            .map(|d| Some(d.clone()))
            .collect();
        (!unmatched.is_empty()).then(|| {
            recovered
                .template()
                .error("072", "15", FieldValue::List(unmatched))
        })
    })
}

fn recovered_vehicles_exceed_stolen(incident: &GroupAIncident) -> Option<NibrsError> {
    let count = |loss: &str, vehicles: fn(&PropertySegment) -> Option<u32>| -> Option<u32> {
        properties_with_loss(incident, loss)
            .filter_map(vehicles)
            .reduce(|a, b| a + b)
    };
    let recovered = count(RECOVERED, |p| p.recovered_vehicles.get())?;
    let stolen = count(STOLEN, |p| p.stolen_vehicles.get()).unwrap_or(0);
    (recovered > stolen).then(|| {
        incident
            .template()
            .error("073", "19", FieldValue::from(recovered))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nibrs_model::{OffenseSegment, Parsed, ReportHeader};

    fn incident() -> GroupAIncident {
        GroupAIncident {
            header: ReportHeader {
                year_of_tape: Some(2016),
                month_of_tape: Some(6),
                ori: Some("WA1234567".to_string()),
                identifier: Some("54236732".to_string()),
                ..ReportHeader::default()
            },
            incident_date: Parsed::present(NaiveDate::from_ymd_opt(2016, 5, 12).unwrap()),
            incident_hour: Parsed::present(10),
            exceptional_clearance_code: Some("N".to_string()),
            ..GroupAIncident::default()
        }
    }

    fn codes(errors: &[NibrsError]) -> Vec<&str> {
        errors.iter().map(|e| e.code.as_str()).collect()
    }

    fn property(loss: &str, descriptions: &[&str]) -> PropertySegment {
        let mut property = PropertySegment {
            loss_type: Some(loss.to_string()),
            ..PropertySegment::default()
        };
        for (slot, d) in property.descriptions.iter_mut().zip(descriptions) {
            *slot = Some((*d).to_string());
        }
        property
    }

    fn validate(incident: &GroupAIncident) -> Vec<NibrsError> {
        rules(&Catalog::builtin()).unwrap().apply(incident)
    }

    #[test]
    fn test_valid_incident_has_no_errors() {
        assert!(validate(&incident()).is_empty());
    }

    #[test]
    fn test_missing_mandatory_fields() {
        let errors = validate(&GroupAIncident::default());
        assert_eq!(codes(&errors), vec!["101", "101", "101", "101", "101", "101"]);
        let elements: Vec<_> = errors
            .iter()
            .filter_map(|e| e.data_element.as_deref())
            .collect();
        assert_eq!(elements, vec!["1", "Year of Tape", "Month of Tape", "2", "3", "4"]);
    }

    #[test]
    fn test_identifier_format() {
        let mut subject = incident();
        subject.header.identifier = Some("54 36".to_string());
        assert_eq!(codes(&validate(&subject)), vec!["115", "117"]);

        subject.header.identifier = Some("abc".to_string());
        assert_eq!(codes(&validate(&subject)), vec!["117"]);
    }

    #[test]
    fn test_incident_date_window() {
        let mut subject = incident();
        subject.incident_date = Parsed::present(NaiveDate::from_ymd_opt(2016, 7, 1).unwrap());
        assert_eq!(codes(&validate(&subject)), vec!["170"]);

        subject.incident_date = Parsed::present(NaiveDate::from_ymd_opt(2014, 12, 31).unwrap());
        assert_eq!(codes(&validate(&subject)), vec!["171"]);
    }

    #[test]
    fn test_clearance_rules() {
        let mut subject = incident();
        subject.exceptional_clearance_date =
            Parsed::present(NaiveDate::from_ymd_opt(2016, 5, 1).unwrap());
        assert_eq!(codes(&validate(&subject)), vec!["153", "155"]);

        subject.exceptional_clearance_code = Some("A".to_string());
        subject.exceptional_clearance_date = Parsed::missing();
        assert_eq!(codes(&validate(&subject)), vec!["156"]);
    }

    #[test]
    fn test_cargo_theft_indicator() {
        let mut subject = incident();
        subject.offenses.push(OffenseSegment {
            ucr_offense_code: Some("120".to_string()),
            ..OffenseSegment::default()
        });
        assert_eq!(codes(&validate(&subject)), vec!["119"]);

        subject.cargo_theft = Some("X".to_string());
        assert_eq!(codes(&validate(&subject)), vec!["104"]);

        subject.cargo_theft = Some("Y".to_string());
        assert!(validate(&subject).is_empty());
    }

    #[test]
    fn test_hour_out_of_range() {
        let mut subject = incident();
        subject.incident_hour = Parsed::present(24);
        let errors = validate(&subject);
        assert_eq!(codes(&errors), vec!["152"]);
        assert_eq!(errors[0].value, Some(FieldValue::Integer(24)));
    }

    #[test]
    fn test_recovered_property_must_be_stolen() {
        let mut subject = incident();
        subject.properties.push(property("7", &["03", "20"]));
        subject.properties.push(property("5", &["20", "38", "77"]));
        let errors = validate(&subject);
        assert_eq!(codes(&errors), vec!["072"]);
        assert_eq!(errors[0].offending_values(), "77");

        subject.offenses.push(OffenseSegment {
            ucr_offense_code: Some("250".to_string()),
            ..OffenseSegment::default()
        });
        assert!(validate(&subject).is_empty());
    }

    #[test]
    fn test_recovered_vehicles_exceed_stolen() {
        let mut subject = incident();
        let mut stolen = property("7", &["03"]);
        stolen.stolen_vehicles = Parsed::present(1);
        let mut recovered = property("5", &["03"]);
        recovered.recovered_vehicles = Parsed::present(2);
        subject.properties = vec![stolen, recovered];
        assert_eq!(codes(&validate(&subject)), vec!["073"]);
    }
}
