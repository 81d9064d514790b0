//! Column layouts for every segment type
//!
//! Each field is declared by start column and width, and most fields are
//! chained from their predecessor with [`Field::after`], so widening a field
//! shifts everything behind it instead of silently overlapping.

/// A fixed-width column range (1-based start, width in characters)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub begin: usize,
    pub width: usize,
}

impl Field {
    #[must_use]
    pub const fn new(begin: usize, width: usize) -> Self {
        Self { begin, width }
    }

    /// Last column, inclusive
    #[must_use]
    pub const fn end(self) -> usize {
        self.begin + self.width - 1
    }

    /// The field of `width` columns immediately following this one.
    #[must_use]
    pub const fn after(self, width: usize) -> Field {
        Field::new(self.end() + 1, width)
    }

    /// The same field shifted right by `columns`.
    #[must_use]
    pub const fn offset(self, columns: usize) -> Field {
        Field::new(self.begin + columns, self.width)
    }
}

/// A field repeated `count` times, `stride` columns apart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Repeated {
    pub first: Field,
    pub stride: usize,
    pub count: usize,
}

impl Repeated {
    #[must_use]
    pub const fn new(first: Field, stride: usize, count: usize) -> Self {
        Self {
            first,
            stride,
            count,
        }
    }

    /// Contiguous repetition with no interleaved fields
    #[must_use]
    pub const fn packed(first: Field, count: usize) -> Self {
        Self::new(first, first.width, count)
    }

    #[must_use]
    pub const fn slot(self, index: usize) -> Field {
        self.first.offset(self.stride * index)
    }

    /// Last column used by the final slot of a packed group
    #[must_use]
    pub const fn end(self) -> usize {
        self.slot(self.count - 1).end()
    }
}

/// Minimum line length: every segment carries the full header
pub const HEADER_LENGTH: usize = header::IDENTIFIER.end();

/// Columns shared by every segment
pub mod header {
    use super::Field;

    pub const SEGMENT_LENGTH: Field = Field::new(1, 4);
    pub const SEGMENT_TYPE: Field = SEGMENT_LENGTH.after(1);
    pub const ACTION: Field = SEGMENT_TYPE.after(1);
    pub const MONTH_OF_TAPE: Field = ACTION.after(2);
    pub const YEAR_OF_TAPE: Field = MONTH_OF_TAPE.after(4);
    pub const CITY_INDICATOR: Field = YEAR_OF_TAPE.after(4);
    pub const ORI: Field = CITY_INDICATOR.after(9);
    /// Incident number, or arrest transaction number on Group B segments
    pub const IDENTIFIER: Field = ORI.after(12);
}

pub mod zero_report {
    use super::{header, Field};

    pub const LENGTH: usize = 43;
    pub const MONTH: Field = header::IDENTIFIER.after(2);
    pub const YEAR: Field = MONTH.after(4);
    /// Identifier every zero report carries
    pub const IDENTIFIER: &str = "000000000000";
}

pub mod administrative {
    use super::{header, Field};

    pub const LENGTH: usize = 87;
    pub const LENGTH_WITH_CARGO_THEFT: usize = 88;
    pub const INCIDENT_DATE: Field = header::IDENTIFIER.after(8);
    pub const REPORT_DATE_INDICATOR: Field = INCIDENT_DATE.after(1);
    pub const INCIDENT_HOUR: Field = REPORT_DATE_INDICATOR.after(2);
    pub const CLEARANCE_CODE: Field = INCIDENT_HOUR.after(1);
    pub const CLEARANCE_DATE: Field = CLEARANCE_CODE.after(8);
    pub const CARGO_THEFT: Field = Field::new(LENGTH_WITH_CARGO_THEFT, 1);
}

pub mod offense {
    use super::{header, Field, Repeated};

    pub const LENGTH: usize = 71;
    /// Older layout carrying a single bias motivation
    pub const LEGACY_LENGTH: usize = 63;
    pub const UCR_CODE: Field = header::IDENTIFIER.after(3);
    pub const ATTEMPTED_COMPLETED: Field = UCR_CODE.after(1);
    pub const SUSPECTED_OF_USING: Repeated = Repeated::packed(ATTEMPTED_COMPLETED.after(1), 3);
    pub const LOCATION: Field = Field::new(SUSPECTED_OF_USING.end() + 1, 2);
    pub const PREMISES_ENTERED: Field = LOCATION.after(2);
    pub const METHOD_OF_ENTRY: Field = PREMISES_ENTERED.after(1);
    pub const CRIMINAL_ACTIVITY: Repeated = Repeated::packed(METHOD_OF_ENTRY.after(1), 3);
    /// Weapon code (2) followed by its automatic indicator (1)
    pub const WEAPON: Repeated = Repeated::new(Field::new(CRIMINAL_ACTIVITY.end() + 1, 2), 3, 3);
    pub const AUTOMATIC_WEAPON: Repeated = Repeated::new(WEAPON.first.after(1), 3, 3);
    pub const BIAS: Repeated = Repeated::packed(Field::new(AUTOMATIC_WEAPON.slot(2).end() + 1, 2), 5);
}

pub mod property {
    use super::{header, Field, Repeated};

    pub const LENGTH: usize = 307;
    pub const LOSS_TYPE: Field = header::IDENTIFIER.after(1);
    const ITEM_STRIDE: usize = 19;
    pub const DESCRIPTION: Repeated = Repeated::new(LOSS_TYPE.after(2), ITEM_STRIDE, 10);
    pub const VALUE: Repeated = Repeated::new(DESCRIPTION.first.after(9), ITEM_STRIDE, 10);
    pub const RECOVERED_DATE: Repeated = Repeated::new(VALUE.first.after(8), ITEM_STRIDE, 10);
    pub const STOLEN_VEHICLES: Field = RECOVERED_DATE.slot(9).after(2);
    pub const RECOVERED_VEHICLES: Field = STOLEN_VEHICLES.after(2);
    const DRUG_STRIDE: usize = 15;
    pub const DRUG_TYPE: Repeated = Repeated::new(RECOVERED_VEHICLES.after(1), DRUG_STRIDE, 3);
    pub const DRUG_QUANTITY_WHOLE: Repeated =
        Repeated::new(DRUG_TYPE.first.after(9), DRUG_STRIDE, 3);
    pub const DRUG_QUANTITY_FRACTION: Repeated =
        Repeated::new(DRUG_QUANTITY_WHOLE.first.after(3), DRUG_STRIDE, 3);
    pub const DRUG_MEASUREMENT: Repeated =
        Repeated::new(DRUG_QUANTITY_FRACTION.first.after(2), DRUG_STRIDE, 3);
}

pub mod victim {
    use super::{header, Field, Repeated};

    pub const LENGTH: usize = 129;
    pub const LENGTH_WITH_LEOKA: usize = 141;
    pub const SEQUENCE_NUMBER: Field = header::IDENTIFIER.after(3);
    pub const OFFENSE_CONNECTION: Repeated = Repeated::packed(SEQUENCE_NUMBER.after(3), 10);
    pub const VICTIM_TYPE: Field = Field::new(OFFENSE_CONNECTION.end() + 1, 1);
    pub const AGE: Field = VICTIM_TYPE.after(4);
    pub const SEX: Field = AGE.after(1);
    pub const RACE: Field = SEX.after(1);
    pub const ETHNICITY: Field = RACE.after(1);
    pub const RESIDENT_STATUS: Field = ETHNICITY.after(1);
    pub const AGGRAVATED_ASSAULT: Repeated = Repeated::packed(RESIDENT_STATUS.after(2), 2);
    pub const JUSTIFIABLE_HOMICIDE: Field = Field::new(AGGRAVATED_ASSAULT.end() + 1, 1);
    pub const INJURY: Repeated = Repeated::packed(JUSTIFIABLE_HOMICIDE.after(1), 5);
    /// Offender number (2) followed by the relationship to that offender (2)
    pub const OFFENDER_NUMBER: Repeated = Repeated::new(Field::new(INJURY.end() + 1, 2), 4, 10);
    pub const RELATIONSHIP: Repeated = Repeated::new(OFFENDER_NUMBER.first.after(2), 4, 10);
    pub const OFFICER_ACTIVITY: Field = Field::new(RELATIONSHIP.slot(9).end() + 1, 2);
    pub const OFFICER_ASSIGNMENT: Field = OFFICER_ACTIVITY.after(1);
    pub const OFFICER_OTHER_ORI: Field = OFFICER_ASSIGNMENT.after(9);
}

pub mod offender {
    use super::{header, Field};

    pub const LENGTH: usize = 45;
    pub const LENGTH_WITH_ETHNICITY: usize = 46;
    pub const SEQUENCE_NUMBER: Field = header::IDENTIFIER.after(2);
    pub const AGE: Field = SEQUENCE_NUMBER.after(4);
    pub const SEX: Field = AGE.after(1);
    pub const RACE: Field = SEX.after(1);
    pub const ETHNICITY: Field = RACE.after(1);
}

pub mod group_a_arrestee {
    use super::{header, Field, Repeated};

    pub const LENGTH: usize = 110;
    pub const SEQUENCE_NUMBER: Field = header::IDENTIFIER.after(2);
    pub const TRANSACTION_NUMBER: Field = SEQUENCE_NUMBER.after(12);
    pub const ARREST_DATE: Field = TRANSACTION_NUMBER.after(8);
    pub const TYPE_OF_ARREST: Field = ARREST_DATE.after(1);
    pub const MULTIPLE_ARRESTEE: Field = TYPE_OF_ARREST.after(1);
    pub const OFFENSE: Field = MULTIPLE_ARRESTEE.after(3);
    pub const ARMED_WITH: Repeated = Repeated::new(OFFENSE.after(2), 3, 2);
    pub const AUTOMATIC_WEAPON: Repeated = Repeated::new(ARMED_WITH.first.after(1), 3, 2);
    pub const AGE: Field = AUTOMATIC_WEAPON.slot(1).after(4);
    pub const SEX: Field = AGE.after(1);
    pub const RACE: Field = SEX.after(1);
    pub const ETHNICITY: Field = RACE.after(1);
    pub const RESIDENT_STATUS: Field = ETHNICITY.after(1);
    pub const DISPOSITION_UNDER_18: Field = RESIDENT_STATUS.after(1);
}

pub mod group_b_arrestee {
    use super::{header, Field, Repeated};

    pub const LENGTH: usize = 66;
    pub const SEQUENCE_NUMBER: Field = header::IDENTIFIER.after(2);
    pub const ARREST_DATE: Field = SEQUENCE_NUMBER.after(8);
    pub const TYPE_OF_ARREST: Field = ARREST_DATE.after(1);
    pub const OFFENSE: Field = TYPE_OF_ARREST.after(3);
    pub const ARMED_WITH: Repeated = Repeated::new(OFFENSE.after(2), 3, 2);
    pub const AUTOMATIC_WEAPON: Repeated = Repeated::new(ARMED_WITH.first.after(1), 3, 2);
    pub const AGE: Field = AUTOMATIC_WEAPON.slot(1).after(4);
    pub const SEX: Field = AGE.after(1);
    pub const RACE: Field = SEX.after(1);
    pub const ETHNICITY: Field = RACE.after(1);
    pub const RESIDENT_STATUS: Field = ETHNICITY.after(1);
    pub const DISPOSITION_UNDER_18: Field = RESIDENT_STATUS.after(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(field: Field) -> (usize, usize) {
        (field.begin, field.end())
    }

    #[test]
    fn test_header_columns() {
        assert_eq!(columns(header::SEGMENT_TYPE), (5, 5));
        assert_eq!(columns(header::MONTH_OF_TAPE), (7, 8));
        assert_eq!(columns(header::ORI), (17, 25));
        assert_eq!(columns(header::IDENTIFIER), (26, 37));
        assert_eq!(HEADER_LENGTH, 37);
    }

    #[test]
    fn test_administrative_columns() {
        assert_eq!(columns(administrative::INCIDENT_DATE), (38, 45));
        assert_eq!(columns(administrative::INCIDENT_HOUR), (47, 48));
        assert_eq!(columns(administrative::CLEARANCE_DATE), (50, 57));
    }

    #[test]
    fn test_offense_columns() {
        assert_eq!(columns(offense::SUSPECTED_OF_USING.slot(2)), (44, 44));
        assert_eq!(columns(offense::LOCATION), (45, 46));
        assert_eq!(columns(offense::CRIMINAL_ACTIVITY.slot(0)), (50, 50));
        assert_eq!(columns(offense::WEAPON.slot(2)), (59, 60));
        assert_eq!(columns(offense::AUTOMATIC_WEAPON.slot(2)), (61, 61));
        assert_eq!(columns(offense::BIAS.slot(0)), (62, 63));
        assert_eq!(offense::BIAS.end(), offense::LENGTH);
    }

    #[test]
    fn test_property_columns() {
        assert_eq!(columns(property::DESCRIPTION.slot(1)), (58, 59));
        assert_eq!(columns(property::VALUE.slot(0)), (41, 49));
        assert_eq!(columns(property::RECOVERED_DATE.slot(9)), (221, 228));
        assert_eq!(columns(property::STOLEN_VEHICLES), (229, 230));
        assert_eq!(columns(property::DRUG_TYPE.slot(0)), (233, 233));
        assert_eq!(columns(property::DRUG_QUANTITY_FRACTION.slot(0)), (243, 245));
        assert_eq!(columns(property::DRUG_MEASUREMENT.slot(2)), (276, 277));
    }

    #[test]
    fn test_victim_columns() {
        assert_eq!(columns(victim::VICTIM_TYPE), (71, 71));
        assert_eq!(columns(victim::AGE), (72, 75));
        assert_eq!(columns(victim::JUSTIFIABLE_HOMICIDE), (84, 84));
        assert_eq!(columns(victim::INJURY.slot(4)), (89, 89));
        assert_eq!(columns(victim::OFFENDER_NUMBER.slot(0)), (90, 91));
        assert_eq!(columns(victim::RELATIONSHIP.slot(9)), (128, 129));
        assert_eq!(victim::OFFICER_OTHER_ORI.end(), victim::LENGTH_WITH_LEOKA);
    }

    #[test]
    fn test_person_and_arrestee_columns() {
        assert_eq!(offender::ETHNICITY.end(), offender::LENGTH_WITH_ETHNICITY);
        assert_eq!(columns(group_a_arrestee::ARMED_WITH.slot(1)), (68, 69));
        assert_eq!(columns(group_a_arrestee::AGE), (71, 74));
        assert_eq!(group_a_arrestee::DISPOSITION_UNDER_18.end(), 79);
        assert_eq!(columns(group_b_arrestee::AGE), (58, 61));
        assert_eq!(group_b_arrestee::DISPOSITION_UNDER_18.end(), group_b_arrestee::LENGTH);
        assert_eq!(zero_report::YEAR.end(), zero_report::LENGTH);
    }
}
