//! Field builders: one function per segment type, mapping columns onto the model
//!
//! Structural problems (segment length, tape period) are returned as errors and
//! fail the whole report. Individual field conversion failures are kept in the
//! segment as [`Parsed::Invalid`] for the validator to report.

use crate::field::FieldSource;
use crate::layout::{
    administrative, group_a_arrestee, group_b_arrestee, offender, offense, property, victim,
    zero_report, Field, Repeated,
};
use crate::segment::RawSegment;
use crate::{Error, Result};
use chrono::NaiveDate;
use nibrs_model::{
    Age, ArresteeSegment, ChildSegment, DrugQuantity, ErrorTemplate, FieldValue, GroupAIncident,
    GroupBArrest, OffenderSegment, OffenseSegment, Parsed, PropertySegment, Report,
    ReportStamp, SegmentType, VictimSegment, ZeroReport,
};
use std::str::FromStr;
use tracing::trace;

/// Reads typed fields from one line, stamping conversion errors from a template
struct FieldReader<'a> {
    line: &'a str,
    template: ErrorTemplate,
}

impl<'a> FieldReader<'a> {
    fn new(raw: &'a RawSegment, segment_type: SegmentType, stamp: ReportStamp) -> Self {
        Self {
            line: &raw.line,
            template: ErrorTemplate::new(segment_type)
                .with_context(raw.source.clone())
                .with_report(stamp),
        }
    }

    fn within(&mut self, id: Option<String>) {
        self.template = self.template.clone().with_within_segment(id);
    }

    fn text(&self, field: Field) -> Option<String> {
        self.line.text(field)
    }

    fn slots<const N: usize>(&self, group: Repeated) -> [Option<String>; N] {
        std::array::from_fn(|i| (i < group.count).then(|| self.text(group.slot(i))).flatten())
    }

    fn integer<T: FromStr>(&self, field: Field, code: &str, data_element: Option<&str>) -> Parsed<T> {
        match self.line.integer(field) {
            Ok(value) => Parsed::from_option(value),
            Err(e) => Parsed::invalid(self.invalid(code, data_element, e.value)),
        }
    }

    fn date(&self, field: Field, code: &str, data_element: &str) -> Parsed<NaiveDate> {
        match self.line.date(field) {
            Ok(value) => Parsed::from_option(value),
            Err(e) => Parsed::invalid(self.invalid(code, Some(data_element), e.value)),
        }
    }

    fn age(&self, field: Field) -> Option<Age> {
        self.text(field)
            .and_then(|raw| Age::parse_with(&raw, &self.template))
    }

    fn invalid(
        &self,
        code: &str,
        data_element: Option<&str>,
        value: String,
    ) -> nibrs_model::NibrsError {
        let error = self.template.build(code).with_value(FieldValue::Text(value));
        match data_element {
            Some(de) => error.with_data_element(de),
            None => error,
        }
    }
}

/// Build the report opened by a `0`, `1` or `7` segment.
///
/// # Errors
///
/// Returns an [`Error::OutOfSequence`] when `raw` cannot open a report, and
/// length or tape-period errors from the header.
pub fn build_report(raw: &RawSegment, segment_type: SegmentType) -> Result<Report> {
    trace!(line = raw.source.line, segment_type = %segment_type, "opening report");
    match segment_type {
        SegmentType::Administrative => build_incident(raw).map(Report::GroupA),
        SegmentType::GroupBArrestee => build_group_b(raw).map(Report::GroupB),
        SegmentType::ZeroReport => build_zero_report(raw).map(Report::Zero),
        other => Err(Error::OutOfSequence {
            segment_type: other,
            identifier: raw.identifier.clone().unwrap_or_default(),
        }),
    }
}

/// Build a child segment belonging to the report stamped `stamp`.
///
/// # Errors
///
/// Returns [`Error::OutOfSequence`] for segment types that open reports (other
/// than additional Group B arrestees), and length errors.
pub fn build_child(
    raw: &RawSegment,
    segment_type: SegmentType,
    stamp: &ReportStamp,
) -> Result<ChildSegment> {
    match segment_type {
        SegmentType::Offense => build_offense(raw, stamp).map(ChildSegment::Offense),
        SegmentType::Property => build_property(raw, stamp).map(ChildSegment::Property),
        SegmentType::Victim => build_victim(raw, stamp).map(ChildSegment::Victim),
        SegmentType::Offender => build_offender(raw, stamp).map(ChildSegment::Offender),
        SegmentType::GroupAArrestee => {
            build_group_a_arrestee(raw, stamp).map(ChildSegment::Arrestee)
        }
        SegmentType::GroupBArrestee => {
            build_group_b_arrestee(raw, stamp).map(ChildSegment::Arrestee)
        }
        SegmentType::Administrative | SegmentType::ZeroReport => Err(Error::OutOfSequence {
            segment_type,
            identifier: raw.identifier.clone().unwrap_or_default(),
        }),
    }
}

fn build_incident(raw: &RawSegment) -> Result<GroupAIncident> {
    use administrative::{
        CARGO_THEFT, CLEARANCE_CODE, CLEARANCE_DATE, INCIDENT_DATE, INCIDENT_HOUR, LENGTH,
        LENGTH_WITH_CARGO_THEFT, REPORT_DATE_INDICATOR,
    };
    let segment_type = SegmentType::Administrative;
    let length = raw.declared_length(segment_type, &[LENGTH, LENGTH_WITH_CARGO_THEFT])?;
    let header = raw.report_header(segment_type)?;
    let r = FieldReader::new(raw, segment_type, header.stamp(segment_type));

    Ok(GroupAIncident {
        incident_date: r.date(INCIDENT_DATE, "105", "3"),
        report_date_indicator: r.text(REPORT_DATE_INDICATOR),
        incident_hour: r.integer(INCIDENT_HOUR, "104", Some("3")),
        exceptional_clearance_code: r.text(CLEARANCE_CODE),
        exceptional_clearance_date: r.date(CLEARANCE_DATE, "105", "5"),
        cargo_theft: (length == LENGTH_WITH_CARGO_THEFT)
            .then(|| r.text(CARGO_THEFT))
            .flatten(),
        header,
        source: raw.source.clone(),
        ..GroupAIncident::default()
    })
}

fn build_group_b(raw: &RawSegment) -> Result<GroupBArrest> {
    let segment_type = SegmentType::GroupBArrestee;
    raw.declared_length(segment_type, &[group_b_arrestee::LENGTH])?;
    let header = raw.report_header(segment_type)?;
    let mut report = GroupBArrest {
        header,
        source: raw.source.clone(),
        arrestees: Vec::new(),
    };
    let arrestee = build_group_b_arrestee(raw, &report.stamp())?;
    report.add_arrestee(arrestee);
    Ok(report)
}

fn build_zero_report(raw: &RawSegment) -> Result<ZeroReport> {
    let segment_type = SegmentType::ZeroReport;
    raw.declared_length(segment_type, &[zero_report::LENGTH])?;
    let header = raw.report_header(segment_type)?;
    let r = FieldReader::new(raw, segment_type, header.stamp(segment_type));

    Ok(ZeroReport {
        zero_report_month: r.integer(zero_report::MONTH, "001", None),
        zero_report_year: r.integer(zero_report::YEAR, "001", None),
        header,
        source: raw.source.clone(),
    })
}

fn build_offense(raw: &RawSegment, stamp: &ReportStamp) -> Result<OffenseSegment> {
    use offense::{
        ATTEMPTED_COMPLETED, AUTOMATIC_WEAPON, BIAS, CRIMINAL_ACTIVITY, LEGACY_LENGTH, LENGTH,
        LOCATION, METHOD_OF_ENTRY, PREMISES_ENTERED, SUSPECTED_OF_USING, UCR_CODE, WEAPON,
    };
    let segment_type = SegmentType::Offense;
    let length = raw.declared_length(segment_type, &[LENGTH, LEGACY_LENGTH])?;
    let mut r = FieldReader::new(raw, segment_type, stamp.clone());
    let ucr_offense_code = r.text(UCR_CODE);
    r.within(ucr_offense_code.clone());

    let bias = if length == LEGACY_LENGTH {
        Repeated::new(BIAS.first, BIAS.stride, 1)
    } else {
        BIAS
    };

    Ok(OffenseSegment {
        source: raw.source.clone(),
        stamp: stamp.clone(),
        ucr_offense_code,
        attempted_completed: r.text(ATTEMPTED_COMPLETED),
        suspected_of_using: r.slots(SUSPECTED_OF_USING),
        location_type: r.text(LOCATION),
        premises_entered: r.integer(PREMISES_ENTERED, "204", Some("10")),
        method_of_entry: r.text(METHOD_OF_ENTRY),
        criminal_activity: r.slots(CRIMINAL_ACTIVITY),
        weapon_force: r.slots(WEAPON),
        automatic_weapon: r.slots(AUTOMATIC_WEAPON),
        bias_motivation: r.slots(bias),
    })
}

fn build_property(raw: &RawSegment, stamp: &ReportStamp) -> Result<PropertySegment> {
    use property::{
        DESCRIPTION, DRUG_MEASUREMENT, DRUG_QUANTITY_FRACTION, DRUG_QUANTITY_WHOLE, DRUG_TYPE,
        LENGTH, LOSS_TYPE, RECOVERED_DATE, RECOVERED_VEHICLES, STOLEN_VEHICLES, VALUE,
    };
    let segment_type = SegmentType::Property;
    raw.declared_length(segment_type, &[LENGTH])?;
    let mut r = FieldReader::new(raw, segment_type, stamp.clone());
    let loss_type = r.text(LOSS_TYPE);
    r.within(loss_type.clone());

    Ok(PropertySegment {
        source: raw.source.clone(),
        stamp: stamp.clone(),
        loss_type,
        descriptions: r.slots(DESCRIPTION),
        values: std::array::from_fn(|i| r.integer(VALUE.slot(i), "304", Some("16"))),
        recovered_dates: std::array::from_fn(|i| r.date(RECOVERED_DATE.slot(i), "305", "17")),
        stolen_vehicles: r.integer(STOLEN_VEHICLES, "304", Some("18")),
        recovered_vehicles: r.integer(RECOVERED_VEHICLES, "304", Some("19")),
        drug_types: r.slots(DRUG_TYPE),
        drug_quantities: std::array::from_fn(|i| {
            drug_quantity(&r, DRUG_QUANTITY_WHOLE.slot(i), DRUG_QUANTITY_FRACTION.slot(i))
        }),
        drug_measurements: r.slots(DRUG_MEASUREMENT),
    })
}

fn drug_quantity(r: &FieldReader<'_>, whole: Field, fraction: Field) -> Parsed<DrugQuantity> {
    let whole_part = r.integer::<u64>(whole, "304", Some("21"));
    let fraction_part = r.integer::<u32>(fraction, "304", Some("21"));
    match (whole_part, fraction_part) {
        (Parsed::Invalid(e), _) | (_, Parsed::Invalid(e)) => Parsed::Invalid(e),
        (Parsed::Missing, Parsed::Missing) => Parsed::Missing,
        (w, f) => Parsed::present(DrugQuantity::new(w.get().unwrap_or(0), f.get().unwrap_or(0))),
    }
}

fn build_victim(raw: &RawSegment, stamp: &ReportStamp) -> Result<VictimSegment> {
    use victim::{
        AGE, AGGRAVATED_ASSAULT, ETHNICITY, INJURY, JUSTIFIABLE_HOMICIDE, LENGTH,
        LENGTH_WITH_LEOKA, OFFENDER_NUMBER, OFFENSE_CONNECTION, OFFICER_ACTIVITY,
        OFFICER_ASSIGNMENT, OFFICER_OTHER_ORI, RACE, RELATIONSHIP, RESIDENT_STATUS,
        SEQUENCE_NUMBER, SEX, VICTIM_TYPE,
    };
    let segment_type = SegmentType::Victim;
    let length = raw.declared_length(segment_type, &[LENGTH, LENGTH_WITH_LEOKA])?;
    let mut r = FieldReader::new(raw, segment_type, stamp.clone());
    r.within(r.text(SEQUENCE_NUMBER));
    let leoka = length == LENGTH_WITH_LEOKA;
    let leoka_field = |field: Field| leoka.then(|| r.text(field)).flatten();

    Ok(VictimSegment {
        source: raw.source.clone(),
        stamp: stamp.clone(),
        sequence_number: r.integer(SEQUENCE_NUMBER, "401", Some("23")),
        offense_connections: r.slots(OFFENSE_CONNECTION),
        victim_type: r.text(VICTIM_TYPE),
        age: r.age(AGE),
        sex: r.text(SEX),
        race: r.text(RACE),
        ethnicity: r.text(ETHNICITY),
        resident_status: r.text(RESIDENT_STATUS),
        aggravated_assault: r.slots(AGGRAVATED_ASSAULT),
        justifiable_homicide: r.text(JUSTIFIABLE_HOMICIDE),
        injuries: r.slots(INJURY),
        offender_numbers: std::array::from_fn(|i| {
            r.integer(OFFENDER_NUMBER.slot(i), "402", Some("34"))
        }),
        relationships: r.slots(RELATIONSHIP),
        officer_activity: leoka_field(OFFICER_ACTIVITY),
        officer_assignment: leoka_field(OFFICER_ASSIGNMENT),
        officer_other_ori: leoka_field(OFFICER_OTHER_ORI),
    })
}

fn build_offender(raw: &RawSegment, stamp: &ReportStamp) -> Result<OffenderSegment> {
    use offender::{AGE, ETHNICITY, LENGTH, LENGTH_WITH_ETHNICITY, RACE, SEQUENCE_NUMBER, SEX};
    let segment_type = SegmentType::Offender;
    let length = raw.declared_length(segment_type, &[LENGTH, LENGTH_WITH_ETHNICITY])?;
    let mut r = FieldReader::new(raw, segment_type, stamp.clone());
    r.within(r.text(SEQUENCE_NUMBER));

    Ok(OffenderSegment {
        source: raw.source.clone(),
        stamp: stamp.clone(),
        sequence_number: r.integer(SEQUENCE_NUMBER, "501", Some("36")),
        age: r.age(AGE),
        sex: r.text(SEX),
        race: r.text(RACE),
        ethnicity: (length == LENGTH_WITH_ETHNICITY)
            .then(|| r.text(ETHNICITY))
            .flatten(),
    })
}

fn build_group_a_arrestee(raw: &RawSegment, stamp: &ReportStamp) -> Result<ArresteeSegment> {
    use group_a_arrestee::{
        AGE, ARMED_WITH, ARREST_DATE, AUTOMATIC_WEAPON, DISPOSITION_UNDER_18, ETHNICITY, LENGTH,
        MULTIPLE_ARRESTEE, OFFENSE, RACE, RESIDENT_STATUS, SEQUENCE_NUMBER, SEX,
        TRANSACTION_NUMBER, TYPE_OF_ARREST,
    };
    let segment_type = SegmentType::GroupAArrestee;
    raw.declared_length(segment_type, &[LENGTH])?;
    let mut r = FieldReader::new(raw, segment_type, stamp.clone());
    r.within(r.text(SEQUENCE_NUMBER));

    Ok(ArresteeSegment {
        source: raw.source.clone(),
        stamp: stamp.clone(),
        sequence_number: r.integer(SEQUENCE_NUMBER, "601", Some("40")),
        arrest_transaction_number: r.text(TRANSACTION_NUMBER),
        arrest_date: r.date(ARREST_DATE, "605", "42"),
        type_of_arrest: r.text(TYPE_OF_ARREST),
        multiple_arrestee_indicator: r.text(MULTIPLE_ARRESTEE),
        ucr_offense_code: r.text(OFFENSE),
        armed_with: r.slots(ARMED_WITH),
        automatic_weapon: r.slots(AUTOMATIC_WEAPON),
        age: r.age(AGE),
        sex: r.text(SEX),
        race: r.text(RACE),
        ethnicity: r.text(ETHNICITY),
        resident_status: r.text(RESIDENT_STATUS),
        disposition_under_18: r.text(DISPOSITION_UNDER_18),
        ..ArresteeSegment::new(segment_type)
    })
}

fn build_group_b_arrestee(raw: &RawSegment, stamp: &ReportStamp) -> Result<ArresteeSegment> {
    use group_b_arrestee::{
        AGE, ARMED_WITH, ARREST_DATE, AUTOMATIC_WEAPON, DISPOSITION_UNDER_18, ETHNICITY, LENGTH,
        OFFENSE, RACE, RESIDENT_STATUS, SEQUENCE_NUMBER, SEX, TYPE_OF_ARREST,
    };
    let segment_type = SegmentType::GroupBArrestee;
    raw.declared_length(segment_type, &[LENGTH])?;
    let mut r = FieldReader::new(raw, segment_type, stamp.clone());
    r.within(r.text(SEQUENCE_NUMBER));

    Ok(ArresteeSegment {
        source: raw.source.clone(),
        stamp: stamp.clone(),
        sequence_number: r.integer(SEQUENCE_NUMBER, "701", Some("40")),
        arrest_transaction_number: raw.identifier.clone(),
        arrest_date: r.date(ARREST_DATE, "705", "42"),
        type_of_arrest: r.text(TYPE_OF_ARREST),
        ucr_offense_code: r.text(OFFENSE),
        armed_with: r.slots(ARMED_WITH),
        automatic_weapon: r.slots(AUTOMATIC_WEAPON),
        age: r.age(AGE),
        sex: r.text(SEX),
        race: r.text(RACE),
        ethnicity: r.text(ETHNICITY),
        resident_status: r.text(RESIDENT_STATUS),
        disposition_under_18: r.text(DISPOSITION_UNDER_18),
        ..ArresteeSegment::new(segment_type)
    })
}
