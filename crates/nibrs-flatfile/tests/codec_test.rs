//! Integration tests for decoding and re-encoding flat files

use nibrs_flatfile::encoder::encode_report;
use nibrs_flatfile::{
    decoder::decode_with_listener, CollectingListener, DecodeEvent, Decoder, DecoderConfig,
    Encoder, ErrorReportWriter,
};
use chrono::NaiveDate;
use nibrs_model::{
    ActionType, Age, ArresteeSegment, DrugQuantity, GroupAIncident, GroupBArrest, OffenderSegment,
    OffenseSegment, Parsed, PropertySegment, Report, ReportHeader, ReportSource, ReportStamp,
    SegmentType, VictimSegment, ZeroReport,
};
use std::io::{BufReader, Write};

const ADMIN: &str =
    "00871I062016    WA123456754236732    20160512 10N                                      ";
const OFFENSE: &str =
    "00712I062016    WA123456754236732    13ACN  20   N  40       88        ";
const PROPERTY: &str = "03073I062016    WA123456754236732    720000000500        77000000100                                                                                                                                                                                                                                               ";
const VICTIM: &str = "01294I062016    WA123456754236732    00113A                           I25  FWNR01   N    01AQ                                    ";
const OFFENDER: &str = "00465I062016    WA123456754236732    0130  MWN";
const ARRESTEE: &str = "01106I062016    WA123456754236732    0116-000123   20160513ON13A01    30  MWNR                                ";
const GROUP_B: &str = "00667I062016    WA123456716-000777   0120160520O90D01    22  MWNR ";
const ZERO: &str = "00430I062016    WA1234567000000000000052016";

fn with_identifier(line: &str, identifier: &str) -> String {
    format!("{}{identifier:<12}{}", &line[..25], &line[37..])
}

fn submission() -> String {
    [ADMIN, OFFENSE, PROPERTY, VICTIM, OFFENDER, ARRESTEE, GROUP_B, ZERO]
        .iter()
        .map(|l| format!("{l}\n"))
        .collect()
}

#[test]
fn test_decode_full_submission() {
    let events: Vec<_> = Decoder::new(submission().as_bytes(), DecoderConfig::default()).collect();
    assert_eq!(events.len(), 3);

    let DecodeEvent::Report(Report::GroupA(incident)) = &events[0] else {
        panic!("expected group A incident");
    };
    assert_eq!(incident.header.identifier.as_deref(), Some("54236732"));
    assert_eq!(incident.offenses.len(), 1);
    assert_eq!(incident.properties.len(), 1);
    assert_eq!(incident.victims.len(), 1);
    assert_eq!(incident.offenders.len(), 1);
    assert_eq!(incident.arrestees.len(), 1);

    let victim = &incident.victims[0];
    assert_eq!(victim.sequence_number.get(), Some(1));
    assert_eq!(victim.offense_connections[0].as_deref(), Some("13A"));
    assert_eq!(victim.age, Some(Age::single(25)));
    assert_eq!(victim.offender_numbers[0].get(), Some(1));
    assert_eq!(victim.relationships[0].as_deref(), Some("AQ"));

    let property = &incident.properties[0];
    assert_eq!(property.values[0].get(), Some(500));
    assert_eq!(property.descriptions[1].as_deref(), Some("77"));

    let arrestee = &incident.arrestees[0];
    assert_eq!(arrestee.arrest_transaction_number.as_deref(), Some("16-000123"));
    assert_eq!(arrestee.segment_type, SegmentType::GroupAArrestee);

    let DecodeEvent::Report(Report::GroupB(arrest)) = &events[1] else {
        panic!("expected group B arrest");
    };
    assert_eq!(arrest.arrestees.len(), 1);
    assert_eq!(arrest.arrestees[0].ucr_offense_code.as_deref(), Some("90D"));

    let DecodeEvent::Report(Report::Zero(zero)) = &events[2] else {
        panic!("expected zero report");
    };
    assert_eq!(zero.zero_report_month.get(), Some(5));
    assert_eq!(zero.zero_report_year.get(), Some(2016));
}

#[test]
fn test_decode_then_encode_reproduces_input() {
    let input = submission();
    let mut listener = CollectingListener::default();
    decode_with_listener(input.as_bytes(), DecoderConfig::default(), &mut listener).unwrap();
    assert!(listener.failures.is_empty());

    let encoded: String = listener.reports.iter().map(encode_report).collect();
    assert_eq!(encoded, input);
}

#[test]
fn test_failed_incident_is_dropped_alone() {
    let bad_victim = VICTIM.replacen("0129", "0130", 1);
    let second = |line: &str| with_identifier(line, "54236733");
    let lines = [
        ADMIN.to_string(),
        second(ADMIN),
        second(OFFENSE),
        second(&bad_victim),
        second(OFFENDER),
        second(ARRESTEE),
        with_identifier(ADMIN, "54236734"),
    ];
    let input = lines.join("\n");

    let events: Vec<_> = Decoder::new(input.as_bytes(), DecoderConfig::default()).collect();
    let identifiers: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            DecodeEvent::Report(r) => r.identifier().map(str::to_string),
            DecodeEvent::Failure(_) => None,
        })
        .collect();
    assert_eq!(identifiers, vec!["54236732", "54236734"]);

    let failures: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            DecodeEvent::Failure(f) => Some(f),
            DecodeEvent::Report(_) => None,
        })
        .collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].identifier.as_deref(), Some("54236733"));
    assert_eq!(failures[0].error.code.as_str(), "401");
    assert_eq!(failures[0].error.context.as_ref().map(|c| c.line), Some(4));
}

#[test]
fn test_zero_reports_never_merge() {
    let input = format!("{ZERO}\n{ZERO}\n");
    let events: Vec<_> = Decoder::new(input.as_bytes(), DecoderConfig::default()).collect();
    assert_eq!(events.len(), 2);
    assert!(events
        .iter()
        .all(|e| matches!(e, DecodeEvent::Report(Report::Zero(_)))));
}

#[test]
fn test_multiple_group_b_arrestees_share_a_report() {
    let second = GROUP_B.replacen("   01", "   02", 1);
    let input = format!("{GROUP_B}\n{second}\n");
    let events: Vec<_> = Decoder::new(input.as_bytes(), DecoderConfig::default()).collect();
    let [DecodeEvent::Report(Report::GroupB(arrest))] = events.as_slice() else {
        panic!("expected a single group B report");
    };
    assert_eq!(arrest.arrestees.len(), 2);
    assert_eq!(arrest.arrestees[1].sequence_number.get(), Some(2));
}

#[test]
fn test_files_round_trip_through_disk() -> anyhow::Result<()> {
    let mut input = tempfile::NamedTempFile::new()?;
    input.write_all(submission().as_bytes())?;

    let reader = BufReader::new(std::fs::File::open(input.path())?);
    let config = DecoderConfig::default().with_source_name(input.path().display().to_string());
    let reports: Vec<Report> = Decoder::new(reader, config)
        .filter_map(|e| match e {
            DecodeEvent::Report(r) => Some(r),
            DecodeEvent::Failure(_) => None,
        })
        .collect();

    let output = tempfile::NamedTempFile::new()?;
    Encoder::new().write(output.reopen()?, &reports)?;
    assert_eq!(std::fs::read_to_string(output.path())?, submission());
    Ok(())
}

#[test]
fn test_decode_failures_in_error_report() {
    let input = format!("{OFFENDER}\n");
    let errors: Vec<_> = Decoder::new(input.as_bytes(), DecoderConfig::default())
        .filter_map(|e| match e {
            DecodeEvent::Failure(f) => Some(f.error),
            DecodeEvent::Report(_) => None,
        })
        .collect();
    let lines = ErrorReportWriter::default().format_lines(&errors);
    assert_eq!(lines.len(), 2);
    assert_eq!(&lines[0][23..35], "54236732    ");
    assert_eq!(&lines[0][46..49], "051");
}

#[test]
fn test_decoded_reports_serialize_to_json() -> anyhow::Result<()> {
    let events: Vec<_> = Decoder::new(format!("{ZERO}\n").as_bytes(), DecoderConfig::default())
        .collect();
    let json = serde_json::to_value(&events)?;
    assert_eq!(json[0]["event"], "report");
    assert_eq!(json[0]["kind"], "zero");
    Ok(())
}

fn text(value: &str) -> Option<String> {
    Some(value.to_string())
}

fn date(y: i32, m: u32, d: u32) -> Parsed<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d).map_or(Parsed::Missing, Parsed::present)
}

fn header(identifier: &str) -> ReportHeader {
    ReportHeader {
        action: ActionType::Add,
        year_of_tape: Some(2016),
        month_of_tape: Some(6),
        city_indicator: text("SEA1"),
        ori: text("WA1234567"),
        identifier: text(identifier),
    }
}

/// Group A incident with every column of every segment filled, using the
/// longest length variant of each segment type.
fn full_incident() -> GroupAIncident {
    let mut incident = GroupAIncident {
        header: header("54236732"),
        source: ReportSource::default(),
        incident_date: date(2016, 5, 12),
        report_date_indicator: text("R"),
        incident_hour: Parsed::present(10),
        exceptional_clearance_code: text("A"),
        exceptional_clearance_date: date(2016, 5, 20),
        cargo_theft: text("Y"),
        ..GroupAIncident::default()
    };
    incident.add_offense(OffenseSegment {
        ucr_offense_code: text("120"),
        attempted_completed: text("C"),
        suspected_of_using: [text("A"), text("C"), text("D")],
        location_type: text("14"),
        premises_entered: Parsed::present(3),
        method_of_entry: text("F"),
        criminal_activity: [text("B"), text("C"), text("E")],
        weapon_force: [text("11"), text("12"), text("13")],
        automatic_weapon: [text("A"), text("A"), text("A")],
        bias_motivation: [text("11"), text("12"), text("13"), text("14"), text("15")],
        ..OffenseSegment::default()
    });
    incident.add_property(PropertySegment {
        loss_type: text("7"),
        descriptions: std::array::from_fn(|i| text(&format!("{:02}", i + 1))),
        values: std::array::from_fn(|i| Parsed::present(1000 * (i as u64 + 1))),
        recovered_dates: std::array::from_fn(|i| date(2016, 5, 13 + i as u32)),
        stolen_vehicles: Parsed::present(2),
        recovered_vehicles: Parsed::present(1),
        drug_types: [text("A"), text("E"), text("H")],
        drug_quantities: [
            Parsed::present(DrugQuantity::new(1, 500)),
            Parsed::present(DrugQuantity::new(123_456_789, 999)),
            Parsed::present(DrugQuantity::new(0, 1)),
        ],
        drug_measurements: [text("GM"), text("KG"), text("NP")],
        ..PropertySegment::default()
    });
    incident.add_victim(VictimSegment {
        sequence_number: Parsed::present(1),
        offense_connections: std::array::from_fn(|_| text("120")),
        victim_type: text("L"),
        age: Some(Age::single(25)),
        sex: text("F"),
        race: text("W"),
        ethnicity: text("N"),
        resident_status: text("R"),
        aggravated_assault: [text("01"), text("02")],
        justifiable_homicide: text("A"),
        injuries: [text("B"), text("I"), text("L"), text("M"), text("O")],
        offender_numbers: std::array::from_fn(|i| Parsed::present(i as u32 + 1)),
        relationships: std::array::from_fn(|_| text("ST")),
        officer_activity: text("01"),
        officer_assignment: text("F"),
        officer_other_ori: text("WA7654321"),
        ..VictimSegment::default()
    });
    incident.add_offender(OffenderSegment {
        sequence_number: Parsed::present(1),
        age: Some(Age::single(30)),
        sex: text("M"),
        race: text("B"),
        ethnicity: text("H"),
        ..OffenderSegment::default()
    });
    incident.add_arrestee(ArresteeSegment {
        sequence_number: Parsed::present(1),
        arrest_transaction_number: text("16-000123"),
        arrest_date: date(2016, 5, 21),
        type_of_arrest: text("O"),
        multiple_arrestee_indicator: text("M"),
        ucr_offense_code: text("120"),
        armed_with: [text("11"), text("12")],
        automatic_weapon: [text("A"), text("A")],
        age: Some(Age::range(16, 17)),
        sex: text("M"),
        race: text("B"),
        ethnicity: text("H"),
        resident_status: text("N"),
        disposition_under_18: text("R"),
        ..ArresteeSegment::new(SegmentType::GroupAArrestee)
    });
    incident
}

fn full_arrest() -> GroupBArrest {
    let mut arrest = GroupBArrest {
        header: header("16-000777"),
        ..GroupBArrest::default()
    };
    arrest.add_arrestee(ArresteeSegment {
        sequence_number: Parsed::present(1),
        arrest_transaction_number: text("16-000777"),
        arrest_date: date(2016, 5, 20),
        type_of_arrest: text("T"),
        ucr_offense_code: text("90D"),
        armed_with: [text("13"), text("14")],
        automatic_weapon: [text("A"), None],
        age: Some(Age::range(24, 28)),
        sex: text("F"),
        race: text("A"),
        ethnicity: text("N"),
        resident_status: text("R"),
        disposition_under_18: text("H"),
        ..ArresteeSegment::new(SegmentType::GroupBArrestee)
    });
    arrest
}

fn full_zero_report() -> ZeroReport {
    ZeroReport {
        header: header("000000000000"),
        zero_report_month: Parsed::present(5),
        zero_report_year: Parsed::present(2016),
        ..ZeroReport::default()
    }
}

/// Clear the traceability fields the decoder fills from the input position.
fn without_provenance(report: Report) -> Report {
    fn clear(source: &mut ReportSource, stamp: &mut ReportStamp) {
        *source = ReportSource::default();
        *stamp = ReportStamp::default();
    }
    match report {
        Report::GroupA(mut incident) => {
            incident.source = ReportSource::default();
            incident.offenses.iter_mut().for_each(|s| clear(&mut s.source, &mut s.stamp));
            incident.properties.iter_mut().for_each(|s| clear(&mut s.source, &mut s.stamp));
            incident.victims.iter_mut().for_each(|s| clear(&mut s.source, &mut s.stamp));
            incident.offenders.iter_mut().for_each(|s| clear(&mut s.source, &mut s.stamp));
            incident.arrestees.iter_mut().for_each(|s| clear(&mut s.source, &mut s.stamp));
            Report::GroupA(incident)
        }
        Report::GroupB(mut arrest) => {
            arrest.source = ReportSource::default();
            arrest.arrestees.iter_mut().for_each(|s| clear(&mut s.source, &mut s.stamp));
            Report::GroupB(arrest)
        }
        Report::Zero(mut zero) => {
            zero.source = ReportSource::default();
            Report::Zero(zero)
        }
    }
}

#[test]
fn test_fully_populated_reports_round_trip() {
    let reports = vec![
        Report::GroupA(full_incident()),
        Report::GroupB(full_arrest()),
        Report::Zero(full_zero_report()),
    ];
    let encoded: String = reports.iter().map(encode_report).collect();

    let lengths: Vec<usize> = encoded.lines().map(|l| l.chars().count()).collect();
    assert_eq!(lengths, vec![88, 71, 307, 141, 46, 110, 66, 43]);
    for line in encoded.lines() {
        assert_eq!(line[..4].parse::<usize>().ok(), Some(line.len()));
    }

    let mut listener = CollectingListener::default();
    decode_with_listener(encoded.as_bytes(), DecoderConfig::default(), &mut listener).unwrap();
    assert!(listener.failures.is_empty(), "{:?}", listener.failures);

    let decoded: Vec<Report> = listener.reports.into_iter().map(without_provenance).collect();
    let expected: Vec<Report> = reports.into_iter().map(without_provenance).collect();
    assert_eq!(decoded, expected);

    let reencoded: String = decoded.iter().map(encode_report).collect();
    assert_eq!(reencoded, encoded);
}

#[test]
fn test_short_administrative_line_example() {
    let line = "00871I022003    TN0390500111502      20021115 19N        ";
    let events: Vec<_> = Decoder::new(line.as_bytes(), DecoderConfig::default()).collect();
    let [DecodeEvent::Report(report)] = events.as_slice() else {
        panic!("expected one report, got {events:?}");
    };
    assert_eq!(report.segment_type(), SegmentType::Administrative);
    let Report::GroupA(incident) = report else {
        panic!("expected group A");
    };
    assert_eq!(incident.header.action, ActionType::Add);
    assert_eq!(incident.header.identifier.as_deref(), Some("111502"));
    assert_eq!(incident.header.ori.as_deref(), Some("TN0390500"));
    assert_eq!(incident.incident_hour.get(), Some(19));
}
