//! Offense segment rules

use super::{any_of, is_one_of};
use crate::rules::{
    Coded, DuplicateValueRule, ExclusiveValueRule, NotAllBlankRule, NotBlankRule,
    ParsedValueRule, RuleExt, RuleSet, Subject, ValidValueRule,
};
use crate::Result;
use nibrs_catalog::{codelist::names, Catalog};
use nibrs_model::{FieldValue, GroupAIncident, NibrsError, OffenseSegment};

/// Criminal activities allowed only with these offenses, one group per row
const ACTIVITY_RESTRICTIONS: &[(&[&str], &[&str])] = &[
    (
        &["B", "C", "D", "E", "O", "P", "T", "U"],
        &["250", "280", "35A", "35B", "39C", "370", "520"],
    ),
    (
        &["J", "G", "N"],
        &[
            "09B", "100", "11A", "11B", "11C", "11D", "120", "13A", "13B", "13C",
        ],
    ),
    (&["A", "F", "I", "S"], &["720"]),
];

/// Offenses requiring a criminal activity
const ACTIVITY_REQUIRED: &[&str] = &["250", "280", "35A", "35B", "39C", "370", "520", "720"];

/// Offenses requiring a weapon or force
const WEAPON_REQUIRED: &[&str] = &[
    "09A", "09B", "09C", "100", "11A", "11B", "11C", "11D", "120", "13A", "13B", "210", "520",
    "64A", "64B",
];

/// Homicides and assaults, which cannot be attempted
const ALWAYS_COMPLETED: &[&str] = &["09A", "09B", "09C", "13A", "13B", "13C"];

const HOMICIDES: &[&str] = &["09A", "09B", "09C"];

const FIREARMS: &[&str] = &["11", "12", "13", "14", "15"];

/// Weapons allowed for simple assault
const SIMPLE_ASSAULT_WEAPONS: &[&str] = &["40", "90", "95", "99"];

const BURGLARY: &str = "220";
const SIMPLE_ASSAULT: &str = "13B";
const JUSTIFIABLE_HOMICIDE: &str = "09C";

/// Lodging locations, where the number of premises entered applies
const LODGING_LOCATIONS: &[&str] = &["14", "19"];

fn ucr(o: &OffenseSegment) -> Option<&str> {
    o.ucr_offense_code.as_deref()
}

fn criminal_activity(o: &OffenseSegment) -> &[Option<String>] {
    &o.criminal_activity
}

fn weapons(o: &OffenseSegment) -> &[Option<String>] {
    &o.weapon_force
}

fn suspected_of_using(o: &OffenseSegment) -> &[Option<String>] {
    &o.suspected_of_using
}

fn bias(o: &OffenseSegment) -> &[Option<String>] {
    &o.bias_motivation
}

fn is_lodging_burglary(o: &OffenseSegment) -> bool {
    ucr(o) == Some(BURGLARY) && is_one_of(o.location_type.as_deref(), LODGING_LOCATIONS)
}

/// Rules for offense segments.
///
/// # Errors
///
/// Returns [`crate::Error::Catalog`] if a code list is missing from `catalog`.
pub fn rules(catalog: &Catalog) -> Result<RuleSet<OffenseSegment>> {
    let all_offenses = catalog.code_list(names::OFFENSE_CODE)?.clone();
    let group_a = catalog.code_list(names::GROUP_A_OFFENSE)?.clone();
    let mut rules = RuleSet::new();
    rules
        .push(
            ValidValueRule::new(
                |o: &OffenseSegment| Coded::Single(ucr(o)),
                "6",
                "201",
                catalog.code_list(names::OFFENSE_CODE)?,
            )
            .rejecting_null(),
        )
        .push(
            ValidValueRule::new(
                |o: &OffenseSegment| Coded::Slots(suspected_of_using(o)),
                "8",
                "201",
                catalog.code_list(names::SUSPECTED_OF_USING)?,
            )
            .rejecting_null(),
        )
        .push(NotBlankRule::new(
            |o: &OffenseSegment| o.attempted_completed.as_deref(),
            "7",
            "201",
        ))
        .push(NotBlankRule::new(
            |o: &OffenseSegment| o.location_type.as_deref(),
            "9",
            "201",
        ))
        .push(NotAllBlankRule::new(bias, "8A", "201"))
        .push(ValidValueRule::new(
            |o: &OffenseSegment| Coded::Slots(bias(o)),
            "8A",
            "204",
            catalog.code_list(names::BIAS_MOTIVATION)?,
        ))
        .push(ValidValueRule::new(
            |o: &OffenseSegment| Coded::Single(o.location_type.as_deref()),
            "9",
            "204",
            catalog.code_list(names::LOCATION)?,
        ))
        .push(ValidValueRule::new(
            |o: &OffenseSegment| Coded::Single(o.method_of_entry.as_deref()),
            "11",
            "204",
            catalog.code_list(names::METHOD_OF_ENTRY)?,
        ))
        .push(ValidValueRule::new(
            |o: &OffenseSegment| Coded::Slots(criminal_activity(o)),
            "12",
            "204",
            catalog.code_list(names::CRIMINAL_ACTIVITY)?,
        ))
        .push(ValidValueRule::new(
            |o: &OffenseSegment| Coded::Slots(weapons(o)),
            "13",
            "204",
            catalog.code_list(names::WEAPON_FORCE)?,
        ))
        .push(ValidValueRule::new(
            |o: &OffenseSegment| Coded::Slots(&o.automatic_weapon),
            "13",
            "204",
            catalog.code_list(names::AUTOMATIC_WEAPON)?,
        ))
        .push(ParsedValueRule::new(
            |o: &OffenseSegment| &o.premises_entered,
            "10",
        ))
        .push(DuplicateValueRule::new(criminal_activity, "12", "206"))
        .push(DuplicateValueRule::new(weapons, "13", "206"))
        .push(DuplicateValueRule::new(suspected_of_using, "8", "206"))
        .push(DuplicateValueRule::new(bias, "8A", "206"))
        .push(ExclusiveValueRule::new(criminal_activity, "12", "207"))
        .push(ExclusiveValueRule::new(weapons, "13", "207").with_exclusive(&["99"]))
        .push(ExclusiveValueRule::new(suspected_of_using, "8", "207"))
        .push(ExclusiveValueRule::new(bias, "8A", "207").with_exclusive(&["88", "99"]))
        .push(activity_not_allowed)
        .push(
            NotAllBlankRule::new(criminal_activity, "12", "220")
                .unless(|o: &OffenseSegment| !is_one_of(ucr(o), ACTIVITY_REQUIRED)),
        )
        .push(
            NotAllBlankRule::new(weapons, "13", "221")
                .unless(|o: &OffenseSegment| !is_one_of(ucr(o), WEAPON_REQUIRED)),
        )
        .push(ValidValueRule::new(
            |o: &OffenseSegment| Coded::Single(o.attempted_completed.as_deref()),
            "7",
            "251",
            catalog.code_list(names::ATTEMPTED_COMPLETED)?,
        ))
        .push(|o: &OffenseSegment| {
            let premises = o.premises_entered.get()?;
            (!is_lodging_burglary(o))
                .then(|| o.template().error("252", "10", FieldValue::from(premises)))
        })
        .push(
            NotBlankRule::new(|o: &OffenseSegment| o.method_of_entry.as_deref(), "11", "253")
                .unless(|o: &OffenseSegment| ucr(o) != Some(BURGLARY)),
        )
        .push(|o: &OffenseSegment| {
            let method = o.method_of_entry.as_deref()?;
            (ucr(o) != Some(BURGLARY))
                .then(|| o.template().error("254", "11", FieldValue::from(method)))
        })
        .push(|o: &OffenseSegment| {
            let invalid = o.automatic_weapon.iter().flatten().any(|a| a != "A");
            invalid.then(|| {
                o.template()
                    .error("255", "13", FieldValue::from(o.automatic_weapon.as_slice()))
            })
        })
        .push(|o: &OffenseSegment| {
            let attempted = o.attempted_completed.as_deref()?;
            (is_one_of(ucr(o), ALWAYS_COMPLETED) && attempted != "C")
                .then(|| o.template().error("256", "7", FieldValue::from(attempted)))
        })
        .push(|o: &OffenseSegment| {
            (is_lodging_burglary(o) && !o.premises_entered.is_present())
                .then(|| o.template().error("257", "10", None))
        })
        .push(automatic_without_firearm)
        .push(move |o: &OffenseSegment| {
            let code = ucr(o)?;
            (all_offenses.is_valid(code) && !group_a.is_valid(code))
                .then(|| o.template().error("264", "6", FieldValue::from(code)))
        })
        .push(|o: &OffenseSegment| {
            let invalid = ucr(o) == Some(SIMPLE_ASSAULT)
                && o
                    .weapon_force
                    .iter()
                    .flatten()
                    .any(|w| !SIMPLE_ASSAULT_WEAPONS.contains(&w.as_str()));
            invalid.then(|| o.template().error("265", "13", FieldValue::from(weapons(o))))
        })
        .push(|o: &OffenseSegment| {
            (is_one_of(ucr(o), HOMICIDES) && any_of(weapons(o), &["99"]))
                .then(|| o.template().error("267", "13", FieldValue::from(weapons(o))))
        })
        .push(|o: &OffenseSegment| {
            (ucr(o) == Some(SIMPLE_ASSAULT) && any_of(weapons(o), FIREARMS))
                .then(|| o.template().error("269", "13", FieldValue::from(weapons(o))))
        })
        .push(|o: &OffenseSegment| {
            let biased = o.bias_motivation.iter().flatten().any(|b| b != "88");
            (ucr(o) == Some(JUSTIFIABLE_HOMICIDE) && biased)
                .then(|| o.template().error("270", "8A", FieldValue::from(bias(o))))
        })
        .push_incident(not_connected_to_victim);
    Ok(rules)
}

fn activity_not_allowed(o: &OffenseSegment) -> Option<NibrsError> {
    let offense = ucr(o)?;
    let disallowed = o.criminal_activity.iter().flatten().any(|activity| {
        ACTIVITY_RESTRICTIONS.iter().any(|(activities, offenses)| {
            activities.contains(&activity.as_str()) && !offenses.contains(&offense)
        })
    });
    disallowed.then(|| {
        o.template()
            .error("219", "12", FieldValue::from(criminal_activity(o)))
    })
}

fn automatic_without_firearm(o: &OffenseSegment) -> Option<NibrsError> {
    let mismatch = o
        .automatic_weapon
        .iter()
        .zip(o.weapon_force.iter())
        .any(|(automatic, weapon)| {
            automatic.as_deref() == Some("A") && !is_one_of(weapon.as_deref(), FIREARMS)
        });
    mismatch.then(|| o.template().error("258", "13", FieldValue::from(weapons(o))))
}

fn not_connected_to_victim(o: &OffenseSegment, incident: &GroupAIncident) -> Option<NibrsError> {
    let offense = ucr(o)?;
    let connected = incident
        .victims
        .iter()
        .any(|v| v.offense_connections.iter().flatten().any(|c| c == offense));
    (!connected).then(|| {
        o.template()
            .build("065")
            .with_data_element("L 2")
            .with_value(FieldValue::from(offense))
            .with_within_segment(None)
            .cross_segment()
    })
}
