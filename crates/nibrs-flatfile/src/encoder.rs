//! Segment encoder: renders reports back into fixed-width lines

use crate::field::LineBuffer;
use crate::layout::{
    administrative, group_a_arrestee, group_b_arrestee, header, offender, offense, property,
    victim, zero_report, Field, Repeated,
};
use crate::Result;
use chrono::NaiveDate;
use nibrs_model::{
    Age, ArresteeSegment, DrugQuantity, FieldValue, GroupAIncident, GroupBArrest,
    OffenderSegment, OffenseSegment, Parsed, PropertySegment, Report, ReportHeader, SegmentType,
    VictimSegment, ZeroReport,
};
use std::fmt::Display;
use std::io::Write;
use tracing::{debug, trace};

/// Writes reports as flat-file segment lines
#[derive(Debug, Clone, Copy, Default)]
pub struct Encoder;

impl Encoder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Write every report to `writer`, one line per segment.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] when writing fails.
    pub fn write<'a, W, I>(&self, mut writer: W, reports: I) -> Result<()>
    where
        W: Write,
        I: IntoIterator<Item = &'a Report>,
    {
        let mut count = 0_usize;
        for report in reports {
            writer.write_all(encode_report(report).as_bytes())?;
            trace!(identifier = report.identifier().unwrap_or_default(), "Wrote report");
            count += 1;
        }
        writer.flush()?;
        debug!(report_count = count, "Finished writing flat file");
        Ok(())
    }
}

/// Render a report: its opening segment, then offenses, properties, victims,
/// offenders and arrestees, each line terminated by `\n`.
#[must_use]
pub fn encode_report(report: &Report) -> String {
    let lines = match report {
        Report::GroupA(incident) => encode_incident(incident),
        Report::GroupB(arrest) => encode_group_b(arrest),
        Report::Zero(zero) => vec![encode_zero_report(zero)],
    };
    lines.into_iter().fold(String::new(), |mut out, line| {
        out.push_str(&line);
        out.push('\n');
        out
    })
}

fn encode_incident(incident: &GroupAIncident) -> Vec<String> {
    let header = &incident.header;
    std::iter::once(encode_administrative(incident))
        .chain(incident.offenses.iter().map(|s| encode_offense(header, s)))
        .chain(incident.properties.iter().map(|s| encode_property(header, s)))
        .chain(incident.victims.iter().map(|s| encode_victim(header, s)))
        .chain(incident.offenders.iter().map(|s| encode_offender(header, s)))
        .chain(incident.arrestees.iter().map(|s| encode_arrestee(header, s)))
        .collect()
}

fn encode_group_b(arrest: &GroupBArrest) -> Vec<String> {
    arrest
        .arrestees
        .iter()
        .map(|s| encode_arrestee(&arrest.header, s))
        .collect()
}

/// Start a line of `length` columns with the common header filled in.
fn start_line(
    length: usize,
    segment_type: SegmentType,
    report: &ReportHeader,
    identifier: Option<&str>,
) -> LineBuffer {
    let mut line = LineBuffer::new(length);
    line.put_number(header::SEGMENT_LENGTH, Some(length));
    line.put(header::SEGMENT_TYPE, Some(&segment_type.code().to_string()));
    line.put(header::ACTION, Some(&report.action.code().to_string()));
    line.put_number(header::MONTH_OF_TAPE, report.month_of_tape);
    line.put_number(header::YEAR_OF_TAPE, report.year_of_tape);
    line.put(header::CITY_INDICATOR, report.city_indicator.as_deref());
    line.put(header::ORI, report.ori.as_deref());
    line.put(header::IDENTIFIER, identifier);
    line
}

fn put_parsed<T: Display>(line: &mut LineBuffer, field: Field, value: &Parsed<T>) {
    match value {
        Parsed::Present(v) => line.put_number(field, Some(v)),
        Parsed::Invalid(e) => line.put(field, raw_text(e.value.as_ref())),
        Parsed::Missing => line.put(field, None),
    }
}

fn put_parsed_date(line: &mut LineBuffer, field: Field, value: &Parsed<NaiveDate>) {
    match value {
        Parsed::Present(d) => line.put_date(field, Some(*d)),
        Parsed::Invalid(e) => line.put(field, raw_text(e.value.as_ref())),
        Parsed::Missing => line.put(field, None),
    }
}

fn raw_text(value: Option<&FieldValue>) -> Option<&str> {
    value.and_then(FieldValue::as_text)
}

fn put_slots(line: &mut LineBuffer, group: Repeated, values: &[Option<String>]) {
    for (i, value) in values.iter().take(group.count).enumerate() {
        line.put(group.slot(i), value.as_deref());
    }
}

fn put_age(line: &mut LineBuffer, field: Field, age: Option<&Age>) {
    let raw = age.map(Age::to_raw);
    line.put(field, raw.as_deref());
}

/// Administrative segment, 88 columns when a cargo-theft indicator is present.
#[must_use]
pub fn encode_administrative(incident: &GroupAIncident) -> String {
    use administrative::{
        CARGO_THEFT, CLEARANCE_CODE, CLEARANCE_DATE, INCIDENT_DATE, INCIDENT_HOUR, LENGTH,
        LENGTH_WITH_CARGO_THEFT, REPORT_DATE_INDICATOR,
    };
    let length = if incident.cargo_theft.is_some() {
        LENGTH_WITH_CARGO_THEFT
    } else {
        LENGTH
    };
    let header = &incident.header;
    let mut line = start_line(
        length,
        SegmentType::Administrative,
        header,
        header.identifier.as_deref(),
    );
    put_parsed_date(&mut line, INCIDENT_DATE, &incident.incident_date);
    line.put(REPORT_DATE_INDICATOR, incident.report_date_indicator.as_deref());
    put_parsed(&mut line, INCIDENT_HOUR, &incident.incident_hour);
    line.put(CLEARANCE_CODE, incident.exceptional_clearance_code.as_deref());
    put_parsed_date(&mut line, CLEARANCE_DATE, &incident.exceptional_clearance_date);
    line.put(CARGO_THEFT, incident.cargo_theft.as_deref());
    line.to_string()
}

#[must_use]
pub fn encode_offense(header: &ReportHeader, offense: &OffenseSegment) -> String {
    use offense::{
        ATTEMPTED_COMPLETED, AUTOMATIC_WEAPON, BIAS, CRIMINAL_ACTIVITY, LENGTH, LOCATION,
        METHOD_OF_ENTRY, PREMISES_ENTERED, SUSPECTED_OF_USING, UCR_CODE, WEAPON,
    };
    let mut line = start_line(LENGTH, SegmentType::Offense, header, header.identifier.as_deref());
    line.put(UCR_CODE, offense.ucr_offense_code.as_deref());
    line.put(ATTEMPTED_COMPLETED, offense.attempted_completed.as_deref());
    put_slots(&mut line, SUSPECTED_OF_USING, &offense.suspected_of_using);
    line.put(LOCATION, offense.location_type.as_deref());
    put_parsed(&mut line, PREMISES_ENTERED, &offense.premises_entered);
    line.put(METHOD_OF_ENTRY, offense.method_of_entry.as_deref());
    put_slots(&mut line, CRIMINAL_ACTIVITY, &offense.criminal_activity);
    put_slots(&mut line, WEAPON, &offense.weapon_force);
    put_slots(&mut line, AUTOMATIC_WEAPON, &offense.automatic_weapon);
    put_slots(&mut line, BIAS, &offense.bias_motivation);
    line.to_string()
}

#[must_use]
pub fn encode_property(header: &ReportHeader, property: &PropertySegment) -> String {
    use property::{
        DESCRIPTION, DRUG_MEASUREMENT, DRUG_QUANTITY_FRACTION, DRUG_QUANTITY_WHOLE, DRUG_TYPE,
        LENGTH, LOSS_TYPE, RECOVERED_DATE, RECOVERED_VEHICLES, STOLEN_VEHICLES, VALUE,
    };
    let mut line = start_line(LENGTH, SegmentType::Property, header, header.identifier.as_deref());
    line.put(LOSS_TYPE, property.loss_type.as_deref());
    put_slots(&mut line, DESCRIPTION, &property.descriptions);
    for (i, value) in property.values.iter().enumerate() {
        put_parsed(&mut line, VALUE.slot(i), value);
    }
    for (i, date) in property.recovered_dates.iter().enumerate() {
        put_parsed_date(&mut line, RECOVERED_DATE.slot(i), date);
    }
    put_parsed(&mut line, STOLEN_VEHICLES, &property.stolen_vehicles);
    put_parsed(&mut line, RECOVERED_VEHICLES, &property.recovered_vehicles);
    put_slots(&mut line, DRUG_TYPE, &property.drug_types);
    for (i, quantity) in property.drug_quantities.iter().enumerate() {
        let (whole, fraction) = (DRUG_QUANTITY_WHOLE.slot(i), DRUG_QUANTITY_FRACTION.slot(i));
        match quantity {
            Parsed::Present(DrugQuantity { whole: w, thousandths }) => {
                line.put_number(whole, Some(w));
                line.put_number(fraction, Some(thousandths));
            }
            Parsed::Invalid(e) => line.put(whole, raw_text(e.value.as_ref())),
            Parsed::Missing => {}
        }
    }
    put_slots(&mut line, DRUG_MEASUREMENT, &property.drug_measurements);
    line.to_string()
}

/// Victim segment, 141 columns when any officer field is present.
#[must_use]
pub fn encode_victim(header: &ReportHeader, victim: &VictimSegment) -> String {
    use victim::{
        AGE, AGGRAVATED_ASSAULT, ETHNICITY, INJURY, JUSTIFIABLE_HOMICIDE, LENGTH,
        LENGTH_WITH_LEOKA, OFFENDER_NUMBER, OFFENSE_CONNECTION, OFFICER_ACTIVITY,
        OFFICER_ASSIGNMENT, OFFICER_OTHER_ORI, RACE, RELATIONSHIP, RESIDENT_STATUS,
        SEQUENCE_NUMBER, SEX, VICTIM_TYPE,
    };
    let leoka = victim.has_officer_fields();
    let length = if leoka { LENGTH_WITH_LEOKA } else { LENGTH };
    let mut line = start_line(length, SegmentType::Victim, header, header.identifier.as_deref());
    put_parsed(&mut line, SEQUENCE_NUMBER, &victim.sequence_number);
    put_slots(&mut line, OFFENSE_CONNECTION, &victim.offense_connections);
    line.put(VICTIM_TYPE, victim.victim_type.as_deref());
    put_age(&mut line, AGE, victim.age.as_ref());
    line.put(SEX, victim.sex.as_deref());
    line.put(RACE, victim.race.as_deref());
    line.put(ETHNICITY, victim.ethnicity.as_deref());
    line.put(RESIDENT_STATUS, victim.resident_status.as_deref());
    put_slots(&mut line, AGGRAVATED_ASSAULT, &victim.aggravated_assault);
    line.put(JUSTIFIABLE_HOMICIDE, victim.justifiable_homicide.as_deref());
    put_slots(&mut line, INJURY, &victim.injuries);
    for (i, number) in victim.offender_numbers.iter().enumerate() {
        put_parsed(&mut line, OFFENDER_NUMBER.slot(i), number);
    }
    put_slots(&mut line, RELATIONSHIP, &victim.relationships);
    if leoka {
        line.put(OFFICER_ACTIVITY, victim.officer_activity.as_deref());
        line.put(OFFICER_ASSIGNMENT, victim.officer_assignment.as_deref());
        line.put(OFFICER_OTHER_ORI, victim.officer_other_ori.as_deref());
    }
    line.to_string()
}

/// Offender segment, 46 columns when ethnicity is present.
#[must_use]
pub fn encode_offender(header: &ReportHeader, offender: &OffenderSegment) -> String {
    use offender::{AGE, ETHNICITY, LENGTH, LENGTH_WITH_ETHNICITY, RACE, SEQUENCE_NUMBER, SEX};
    let length = if offender.ethnicity.is_some() {
        LENGTH_WITH_ETHNICITY
    } else {
        LENGTH
    };
    let mut line = start_line(length, SegmentType::Offender, header, header.identifier.as_deref());
    put_parsed(&mut line, SEQUENCE_NUMBER, &offender.sequence_number);
    put_age(&mut line, AGE, offender.age.as_ref());
    line.put(SEX, offender.sex.as_deref());
    line.put(RACE, offender.race.as_deref());
    line.put(ETHNICITY, offender.ethnicity.as_deref());
    line.to_string()
}

/// Group A (`6`) or Group B (`7`) arrestee, depending on the segment's type.
#[must_use]
pub fn encode_arrestee(header: &ReportHeader, arrestee: &ArresteeSegment) -> String {
    if arrestee.is_group_b() {
        encode_group_b_arrestee(header, arrestee)
    } else {
        encode_group_a_arrestee(header, arrestee)
    }
}

fn encode_group_a_arrestee(header: &ReportHeader, arrestee: &ArresteeSegment) -> String {
    use group_a_arrestee::{
        AGE, ARMED_WITH, ARREST_DATE, AUTOMATIC_WEAPON, DISPOSITION_UNDER_18, ETHNICITY, LENGTH,
        MULTIPLE_ARRESTEE, OFFENSE, RACE, RESIDENT_STATUS, SEQUENCE_NUMBER, SEX,
        TRANSACTION_NUMBER, TYPE_OF_ARREST,
    };
    let mut line = start_line(
        LENGTH,
        SegmentType::GroupAArrestee,
        header,
        header.identifier.as_deref(),
    );
    put_parsed(&mut line, SEQUENCE_NUMBER, &arrestee.sequence_number);
    line.put(TRANSACTION_NUMBER, arrestee.arrest_transaction_number.as_deref());
    put_parsed_date(&mut line, ARREST_DATE, &arrestee.arrest_date);
    line.put(TYPE_OF_ARREST, arrestee.type_of_arrest.as_deref());
    line.put(MULTIPLE_ARRESTEE, arrestee.multiple_arrestee_indicator.as_deref());
    line.put(OFFENSE, arrestee.ucr_offense_code.as_deref());
    put_slots(&mut line, ARMED_WITH, &arrestee.armed_with);
    put_slots(&mut line, AUTOMATIC_WEAPON, &arrestee.automatic_weapon);
    put_age(&mut line, AGE, arrestee.age.as_ref());
    line.put(SEX, arrestee.sex.as_deref());
    line.put(RACE, arrestee.race.as_deref());
    line.put(ETHNICITY, arrestee.ethnicity.as_deref());
    line.put(RESIDENT_STATUS, arrestee.resident_status.as_deref());
    line.put(DISPOSITION_UNDER_18, arrestee.disposition_under_18.as_deref());
    line.to_string()
}

fn encode_group_b_arrestee(header: &ReportHeader, arrestee: &ArresteeSegment) -> String {
    use group_b_arrestee::{
        AGE, ARMED_WITH, ARREST_DATE, AUTOMATIC_WEAPON, DISPOSITION_UNDER_18, ETHNICITY, LENGTH,
        OFFENSE, RACE, RESIDENT_STATUS, SEQUENCE_NUMBER, SEX, TYPE_OF_ARREST,
    };
    let identifier = arrestee
        .arrest_transaction_number
        .as_deref()
        .or(header.identifier.as_deref());
    let mut line = start_line(LENGTH, SegmentType::GroupBArrestee, header, identifier);
    put_parsed(&mut line, SEQUENCE_NUMBER, &arrestee.sequence_number);
    put_parsed_date(&mut line, ARREST_DATE, &arrestee.arrest_date);
    line.put(TYPE_OF_ARREST, arrestee.type_of_arrest.as_deref());
    line.put(OFFENSE, arrestee.ucr_offense_code.as_deref());
    put_slots(&mut line, ARMED_WITH, &arrestee.armed_with);
    put_slots(&mut line, AUTOMATIC_WEAPON, &arrestee.automatic_weapon);
    put_age(&mut line, AGE, arrestee.age.as_ref());
    line.put(SEX, arrestee.sex.as_deref());
    line.put(RACE, arrestee.race.as_deref());
    line.put(ETHNICITY, arrestee.ethnicity.as_deref());
    line.put(RESIDENT_STATUS, arrestee.resident_status.as_deref());
    line.put(DISPOSITION_UNDER_18, arrestee.disposition_under_18.as_deref());
    line.to_string()
}

/// Zero report; a missing identifier is written as twelve zeros.
#[must_use]
pub fn encode_zero_report(zero: &ZeroReport) -> String {
    let header = &zero.header;
    let identifier = header.identifier.as_deref().unwrap_or(zero_report::IDENTIFIER);
    let mut line = start_line(
        zero_report::LENGTH,
        SegmentType::ZeroReport,
        header,
        Some(identifier),
    );
    put_parsed(&mut line, zero_report::MONTH, &zero.zero_report_month);
    put_parsed(&mut line, zero_report::YEAR, &zero.zero_report_year);
    line.to_string()
}
