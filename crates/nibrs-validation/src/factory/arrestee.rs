//! Arrestee segment rules
//!
//! Group A (`6`) and Group B (`7`) arrestees share one assembly; the segment
//! type picks the error code family, so `x01` becomes `601` or `701`.

use super::person::{age_error, age_order};
use super::tape_month_end;
use crate::rules::{
    Coded, DuplicateValueRule, ExclusiveValueRule, IdentifierFormatRule, NotAllBlankRule,
    NotBlankRule, NumericValueRule, ParsedValueRule, RuleExt, RuleSet, StringValueRule, Subject,
    ValidValueRule,
};
use crate::Result;
use nibrs_catalog::{codelist::names, Catalog};
use nibrs_model::{ArresteeSegment, ErrorCode, FieldValue, GroupAIncident, SegmentType};

const FIREARMS: &[&str] = &["11", "12", "13", "14", "15"];
const UNARMED: &str = "01";
const AUTOMATIC: &str = "A";
const UNKNOWN_SEX: &str = "U";
const JUSTIFIABLE_HOMICIDE: &str = "09C";
const RUNAWAY: &str = "90I";
const MAX_RUNAWAY_AGE: u32 = 17;

/// Arrest transaction number; Group B arrests carry it as the report identifier.
fn transaction_number(a: &ArresteeSegment) -> Option<&str> {
    if a.is_group_b() {
        a.stamp.identifier.as_deref()
    } else {
        a.arrest_transaction_number.as_deref()
    }
}

fn armed_with(a: &ArresteeSegment) -> &[Option<String>] {
    &a.armed_with
}

fn is_adult(a: &ArresteeSegment) -> bool {
    a.age
        .as_ref()
        .is_some_and(|age| !age.is_unknown() && !age.has_error() && !a.is_juvenile())
}

/// Rules for arrestee segments of `segment_type`.
///
/// # Errors
///
/// Returns [`crate::Error::Catalog`] if a code list is missing from `catalog`.
pub fn rules(catalog: &Catalog, segment_type: SegmentType) -> Result<RuleSet<ArresteeSegment>> {
    let code = |suffix: &str| ErrorCode::for_segment(segment_type, suffix);
    let mut rules = RuleSet::new();
    rules
        .push(
            ParsedValueRule::new(|a: &ArresteeSegment| &a.sequence_number, "40")
                .required(code("01").as_str()),
        )
        .push({
            let c = code("01");
            NumericValueRule::new(
                |a: &ArresteeSegment| a.sequence_number.get().map(i64::from),
                move |n, a: &ArresteeSegment| {
                    (!(1..=99).contains(&n)).then(|| a.template().error(c.clone(), "40", None))
                },
            )
        })
        .push(NotBlankRule::new(transaction_number, "41", code("01").as_str()))
        .push(IdentifierFormatRule::no_embedded_blanks(
            transaction_number,
            "41",
            code("15").as_str(),
        )?)
        .push(IdentifierFormatRule::characters(
            transaction_number,
            "41",
            code("17").as_str(),
        )?)
        .push(
            ParsedValueRule::new(|a: &ArresteeSegment| &a.arrest_date, "42")
                .required(code("01").as_str()),
        )
        .push(NotBlankRule::new(
            |a: &ArresteeSegment| a.type_of_arrest.as_deref(),
            "43",
            code("01").as_str(),
        ))
        .push(ValidValueRule::new(
            |a: &ArresteeSegment| Coded::Single(a.type_of_arrest.as_deref()),
            "43",
            code("04").as_str(),
            catalog.code_list(names::TYPE_OF_ARREST)?,
        ))
        .push(NotBlankRule::new(
            |a: &ArresteeSegment| a.ucr_offense_code.as_deref(),
            "45",
            code("01").as_str(),
        ))
        .push(ValidValueRule::new(
            |a: &ArresteeSegment| Coded::Single(a.ucr_offense_code.as_deref()),
            "45",
            code("04").as_str(),
            catalog.code_list(names::OFFENSE_CODE)?,
        ))
        .push(NotAllBlankRule::new(armed_with, "46", code("01").as_str()))
        .push(ValidValueRule::new(
            |a: &ArresteeSegment| Coded::Slots(armed_with(a)),
            "46",
            code("04").as_str(),
            catalog.code_list(names::ARRESTEE_ARMED_WITH)?,
        ))
        .push(DuplicateValueRule::new(armed_with, "46", code("06").as_str()))
        .push(
            ExclusiveValueRule::new(armed_with, "46", code("07").as_str())
                .with_exclusive(&[UNARMED]),
        )
        .push(ValidValueRule::new(
            |a: &ArresteeSegment| Coded::Slots(&a.automatic_weapon),
            "46",
            code("54").as_str(),
            catalog.code_list(names::AUTOMATIC_WEAPON)?,
        ))
        .push({
            let c = code("55");
            move |a: &ArresteeSegment| {
                let weapon = a
                    .armed_with
                    .iter()
                    .zip(&a.automatic_weapon)
                    .filter(|(_, auto)| auto.as_deref() == Some(AUTOMATIC))
                    .find_map(|(weapon, _)| {
                        weapon.as_deref().filter(|w| !FIREARMS.contains(w))
                    })?;
                Some(a.template().error(c.clone(), "46", FieldValue::from(weapon)))
            }
        })
        .push(NotBlankRule::present(
            |a: &ArresteeSegment| a.age.is_some(),
            "47",
            code("01").as_str(),
        ))
        .push(age_error::<ArresteeSegment>("47"))
        .push(age_order::<ArresteeSegment>("47", code("10")))
        .push(NotBlankRule::new(
            |a: &ArresteeSegment| a.sex.as_deref(),
            "48",
            code("01").as_str(),
        ))
        .push(
            ValidValueRule::new(
                |a: &ArresteeSegment| Coded::Single(a.sex.as_deref()),
                "48",
                code("04").as_str(),
                catalog.code_list(names::SEX_OF_ARRESTEE)?,
            )
            .unless(|a: &ArresteeSegment| a.sex.as_deref() == Some(UNKNOWN_SEX)),
        )
        .push({
            let c = if segment_type == SegmentType::GroupBArrestee {
                ErrorCode::new("758")
            } else {
                ErrorCode::new("667")
            };
            StringValueRule::new(
                |a: &ArresteeSegment| a.sex.as_deref(),
                move |sex, a: &ArresteeSegment| {
                    (sex == UNKNOWN_SEX).then(|| a.template().error(c.clone(), "48", None))
                },
            )
        })
        .push(NotBlankRule::new(
            |a: &ArresteeSegment| a.race.as_deref(),
            "49",
            code("01").as_str(),
        ))
        .push(ValidValueRule::new(
            |a: &ArresteeSegment| Coded::Single(a.race.as_deref()),
            "49",
            code("04").as_str(),
            catalog.code_list(names::RACE)?,
        ))
        .push(ValidValueRule::new(
            |a: &ArresteeSegment| Coded::Single(a.ethnicity.as_deref()),
            "50",
            code("04").as_str(),
            catalog.code_list(names::ETHNICITY)?,
        ))
        .push(ValidValueRule::new(
            |a: &ArresteeSegment| Coded::Single(a.resident_status.as_deref()),
            "51",
            code("04").as_str(),
            catalog.code_list(names::RESIDENT_STATUS)?,
        ))
        .push(ValidValueRule::new(
            |a: &ArresteeSegment| Coded::Single(a.disposition_under_18.as_deref()),
            "52",
            code("04").as_str(),
            catalog.code_list(names::DISPOSITION_UNDER_18)?,
        ))
        .push({
            let c = code("52");
            move |a: &ArresteeSegment| {
                (a.is_juvenile() && a.disposition_under_18.is_none())
                    .then(|| a.template().error(c.clone(), "52", None))
            }
        })
        .push({
            let c = code("53");
            move |a: &ArresteeSegment| {
                let disposition = a.disposition_under_18.as_deref()?;
                is_adult(a).then(|| {
                    a.template()
                        .error(c.clone(), "52", FieldValue::from(disposition))
                })
            }
        })
        .push({
            let c = code("05");
            move |a: &ArresteeSegment| {
                let date = a.arrest_date.get()?;
                let end = tape_month_end(a.stamp.year_of_tape, a.stamp.month_of_tape)?;
                (date > end).then(|| a.template().error(c.clone(), "42", FieldValue::from(date)))
            }
        });

    if segment_type == SegmentType::GroupBArrestee {
        push_group_b_rules(&mut rules, catalog)?;
    } else {
        push_group_a_rules(&mut rules, catalog)?;
    }
    Ok(rules)
}

fn push_group_a_rules(rules: &mut RuleSet<ArresteeSegment>, catalog: &Catalog) -> Result<()> {
    rules
        .push(NotBlankRule::new(
            |a: &ArresteeSegment| a.multiple_arrestee_indicator.as_deref(),
            "44",
            "601",
        ))
        .push(ValidValueRule::new(
            |a: &ArresteeSegment| Coded::Single(a.multiple_arrestee_indicator.as_deref()),
            "44",
            "604",
            catalog.code_list(names::MULTIPLE_ARRESTEE)?,
        ))
        .push(StringValueRule::new(
            |a: &ArresteeSegment| a.ucr_offense_code.as_deref(),
            |offense, a: &ArresteeSegment| {
                (offense == JUSTIFIABLE_HOMICIDE).then(|| a.template().error("670", "45", None))
            },
        ))
        .push_incident(|a: &ArresteeSegment, incident: &GroupAIncident| {
            let arrested = a.arrest_date.get()?;
            let occurred = incident.incident_date.get()?;
            (arrested < occurred)
                .then(|| a.template().error("665", "42", FieldValue::from(arrested)))
        });
    Ok(())
}

fn push_group_b_rules(rules: &mut RuleSet<ArresteeSegment>, catalog: &Catalog) -> Result<()> {
    let group_b = catalog.code_list(names::GROUP_B_OFFENSE)?.clone();
    rules
        .push(StringValueRule::new(
            |a: &ArresteeSegment| a.ucr_offense_code.as_deref(),
            move |offense, a: &ArresteeSegment| {
                (!group_b.is_valid(offense)).then(|| a.template().error("760", "45", None))
            },
        ))
        .push(|a: &ArresteeSegment| {
            if a.ucr_offense_code.as_deref() != Some(RUNAWAY) {
                return None;
            }
            let age = a.age.as_ref();
            let too_old = age.is_none_or(|age| {
                age.is_non_numeric() || age.min.is_some_and(|m| m > MAX_RUNAWAY_AGE)
            });
            too_old.then(|| {
                a.template()
                    .error("761", "47", age.map(|age| FieldValue::from(age.to_raw())))
            })
        });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use nibrs_model::{Age, Parsed, ReportStamp};

    fn text(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn arrestee(segment_type: SegmentType) -> ArresteeSegment {
        let mut arrestee = ArresteeSegment::new(segment_type);
        arrestee.stamp = ReportStamp {
            identifier: text("54236732"),
            ori: text("WA1234567"),
            year_of_tape: Some(2016),
            month_of_tape: Some(6),
            ..ReportStamp::default()
        };
        arrestee.sequence_number = Parsed::present(1);
        arrestee.arrest_date = Parsed::present(date(2016, 5, 12));
        arrestee.type_of_arrest = text("T");
        arrestee.ucr_offense_code = text("13A");
        arrestee.armed_with[0] = text("01");
        arrestee.age = Some(Age::single(25));
        arrestee.sex = text("M");
        arrestee.race = text("W");
        arrestee.ethnicity = text("N");
        arrestee.resident_status = text("R");
        if segment_type == SegmentType::GroupAArrestee {
            arrestee.arrest_transaction_number = text("02-000895");
            arrestee.multiple_arrestee_indicator = text("N");
        } else {
            arrestee.ucr_offense_code = text("90D");
        }
        arrestee
    }

    fn incident() -> GroupAIncident {
        GroupAIncident {
            incident_date: Parsed::present(date(2016, 5, 1)),
            ..GroupAIncident::default()
        }
    }

    fn codes(arrestee: &ArresteeSegment) -> Vec<String> {
        rules(&Catalog::builtin(), arrestee.segment_type)
            .unwrap()
            .apply_in(arrestee, &incident())
            .iter()
            .map(|e| e.code.to_string())
            .collect()
    }

    #[test]
    fn test_valid_arrestees_have_no_errors() {
        assert!(codes(&arrestee(SegmentType::GroupAArrestee)).is_empty());
        assert!(codes(&arrestee(SegmentType::GroupBArrestee)).is_empty());
    }

    #[test]
    fn test_codes_follow_segment_type() {
        let mut a = arrestee(SegmentType::GroupAArrestee);
        a.type_of_arrest = None;
        assert_eq!(codes(&a), vec!["601"]);

        let mut b = arrestee(SegmentType::GroupBArrestee);
        b.type_of_arrest = text("X");
        assert_eq!(codes(&b), vec!["704"]);
    }

    #[test]
    fn test_transaction_number_format() {
        let mut a = arrestee(SegmentType::GroupAArrestee);
        a.arrest_transaction_number = text("02 000895");
        assert_eq!(codes(&a), vec!["615", "617"]);

        a.arrest_transaction_number = text("02_000895");
        assert_eq!(codes(&a), vec!["617"]);
    }

    #[test]
    fn test_armed_with_rules() {
        let mut a = arrestee(SegmentType::GroupAArrestee);
        a.armed_with = [text("01"), text("01")];
        assert_eq!(codes(&a), vec!["606"]);

        a.armed_with = [text("01"), text("11")];
        assert_eq!(codes(&a), vec!["607"]);

        a.armed_with = [text("16"), None];
        a.automatic_weapon = [text("A"), None];
        assert_eq!(codes(&a), vec!["655"]);

        a.armed_with = [text("12"), None];
        a.automatic_weapon = [text("B"), None];
        assert_eq!(codes(&a), vec!["654"]);
    }

    #[test]
    fn test_juvenile_disposition() {
        let mut a = arrestee(SegmentType::GroupAArrestee);
        a.age = Some(Age::single(15));
        assert_eq!(codes(&a), vec!["652"]);

        a.disposition_under_18 = text("H");
        assert!(codes(&a).is_empty());

        a.age = Some(Age::single(30));
        assert_eq!(codes(&a), vec!["653"]);
    }

    #[test]
    fn test_unknown_sex() {
        let mut a = arrestee(SegmentType::GroupAArrestee);
        a.sex = text("U");
        assert_eq!(codes(&a), vec!["667"]);

        let mut b = arrestee(SegmentType::GroupBArrestee);
        b.sex = text("U");
        assert_eq!(codes(&b), vec!["758"]);
    }

    #[test]
    fn test_arrest_dates() {
        let mut a = arrestee(SegmentType::GroupAArrestee);
        a.arrest_date = Parsed::present(date(2016, 7, 1));
        assert_eq!(codes(&a), vec!["605"]);

        a.arrest_date = Parsed::present(date(2016, 4, 30));
        assert_eq!(codes(&a), vec!["665"]);
    }

    #[test]
    fn test_offense_restrictions() {
        let mut a = arrestee(SegmentType::GroupAArrestee);
        a.ucr_offense_code = text("09C");
        assert_eq!(codes(&a), vec!["670"]);

        let mut b = arrestee(SegmentType::GroupBArrestee);
        b.ucr_offense_code = text("13A");
        assert_eq!(codes(&b), vec!["760"]);

        b.ucr_offense_code = text("90I");
        assert_eq!(codes(&b), vec!["761"]);
        b.age = Some(Age::single(15));
        b.disposition_under_18 = text("R");
        assert!(codes(&b).is_empty());
    }

    #[test]
    fn test_group_b_identifier_is_transaction_number() {
        let mut b = arrestee(SegmentType::GroupBArrestee);
        b.stamp.identifier = None;
        assert_eq!(codes(&b), vec!["701"]);
    }
}
