//! Error-code catalog: message text, description and severity per code

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder replaced by the offending value when a message is rendered
pub const VALUE_PLACEHOLDER: &str = "[value]";

/// Catalog entry for one error code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDefinition {
    pub code: String,
    /// Short message printed in the error report, may contain `[value]`
    pub message: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Warnings are reported but do not reject the submission
    #[serde(default)]
    pub warning: bool,
}

impl ErrorDefinition {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            description: None,
            warning: false,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn as_warning(mut self) -> Self {
        self.warning = true;
        self
    }
}

/// Error definitions keyed by code
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCatalog {
    definitions: BTreeMap<String, ErrorDefinition>,
}

impl ErrorCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding a definition for every code the decoder and rule factories emit.
    #[must_use]
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for (code, message) in BUILTIN_MESSAGES {
            catalog.insert(ErrorDefinition::new(*code, *message));
        }
        for code in BUILTIN_WARNINGS {
            if let Some(def) = catalog.definitions.get_mut(*code) {
                def.warning = true;
            }
        }
        catalog
    }

    /// Add or replace a definition.
    pub fn insert(&mut self, definition: ErrorDefinition) {
        self.definitions.insert(definition.code.clone(), definition);
    }

    #[must_use]
    pub fn get(&self, code: &str) -> Option<&ErrorDefinition> {
        self.definitions.get(code)
    }

    #[must_use]
    pub fn is_warning(&self, code: &str) -> bool {
        self.get(code).is_some_and(|d| d.warning)
    }

    /// Rendered message for `code` with `[value]` replaced by `offending`.
    #[must_use]
    pub fn message_for(&self, code: &str, offending: &str) -> String {
        match self.get(code) {
            Some(def) => def.message.replace(VALUE_PLACEHOLDER, offending),
            None => format!("Unknown error code {code}"),
        }
    }

    /// Definitions in code order
    pub fn iter(&self) -> impl Iterator<Item = &ErrorDefinition> {
        self.definitions.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

const BUILTIN_WARNINGS: &[&str] = &["342"];

const BUILTIN_MESSAGES: &[(&str, &str)] = &[
    ("001", "MUST BE POPULATED WITH A VALID DATA VALUE - MANDATORY FIELD"),
    ("015", "ZERO REPORT INCIDENT NUMBER MUST BE 000000000000: [value]"),
    ("051", "INVALID SEGMENT TYPE OR SEGMENT OUT OF SEQUENCE FOR INCIDENT"),
    ("065", "EACH OFFENSE MUST BE CONNECTED TO AT LEAST ONE VICTIM: [value]"),
    ("072", "RECOVERED PROPERTY MUST ALSO BE SUBMITTED AS STOLEN: [value]"),
    ("073", "NUMBER OF RECOVERED VEHICLES CANNOT BE GREATER THAN THE NUMBER STOLEN"),
    ("101", "MUST BE PRESENT - MANDATORY FIELD"),
    ("104", "INVALID DATA VALUE - NOT ON FBI VALIDATION TABLE: [value]"),
    ("105", "THE DATA VALUE IS NOT A VALID DATE: [value]"),
    ("115", "CANNOT HAVE EMBEDDED BLANKS BETWEEN FIRST AND LAST NON-BLANK CHARACTERS"),
    ("117", "CANNOT HAVE CHARACTERS OTHER THAN A-Z, 0-9, AND HYPHEN: [value]"),
    ("119", "CARGO THEFT DATA CAN ONLY BE SUBMITTED FOR SPECIFIC OFFENSES"),
    ("152", "INCIDENT HOUR MUST BE BETWEEN 00 AND 23: [value]"),
    ("153", "CLEARANCE DATE CANNOT BE PRESENT WHEN NOT CLEARED EXCEPTIONALLY"),
    ("155", "EXCEPTIONAL CLEARANCE DATE IS EARLIER THAN INCIDENT DATE"),
    ("156", "EXCEPTIONAL CLEARANCE DATE MUST BE PRESENT WHEN CLEARED EXCEPTIONALLY"),
    ("170", "INCIDENT DATE CANNOT BE AFTER YEAR AND MONTH OF SUBMISSION"),
    ("171", "INCIDENT DATE IS OUTSIDE THE BASE DATE CALCULATION"),
    ("172", "INCIDENT DATE CANNOT BE BEFORE 01/01/1991"),
    ("201", "MUST BE PRESENT - MANDATORY FIELD"),
    ("204", "INVALID DATA VALUE - NOT ON FBI VALIDATION TABLE: [value]"),
    ("206", "ERROR - DUPLICATE DATA VALUE WAS ENTERED: [value]"),
    ("207", "MUTUALLY EXCLUSIVE VALUE CANNOT BE ENTERED WITH OTHER VALUES: [value]"),
    ("219", "DATA CAN ONLY BE ENTERED FOR SPECIFIC OFFENSES: [value]"),
    ("220", "CRIMINAL ACTIVITY MUST BE ENTERED FOR THIS OFFENSE"),
    ("221", "TYPE WEAPON/FORCE INVOLVED MUST BE ENTERED FOR THIS OFFENSE"),
    ("251", "INVALID CODE FOR ATTEMPTED/COMPLETED: [value]"),
    ("252", "NUMBER OF PREMISES ENTERED ONLY ALLOWED FOR BURGLARY AT HOTEL OR STORAGE FACILITY"),
    ("253", "METHOD OF ENTRY MUST BE ENTERED FOR BURGLARY"),
    ("254", "METHOD OF ENTRY ONLY ALLOWED FOR BURGLARY"),
    ("255", "AUTOMATIC WEAPON INDICATOR MUST BE A OR BLANK: [value]"),
    ("256", "OFFENSE MUST BE COMPLETED FOR HOMICIDE OR ASSAULT: [value]"),
    ("257", "NUMBER OF PREMISES ENTERED REQUIRED FOR BURGLARY AT HOTEL OR STORAGE FACILITY"),
    ("258", "AUTOMATIC INDICATOR ONLY ALLOWED FOR FIREARM WEAPON TYPES: [value]"),
    ("264", "GROUP A OFFENSE CODE MUST BE ENTERED: [value]"),
    ("265", "SIMPLE ASSAULT CAN ONLY HAVE PERSONAL WEAPONS OR NONE: [value]"),
    ("267", "KILLINGS MUST HAVE A WEAPON OTHER THAN NONE: [value]"),
    ("269", "SIMPLE ASSAULT CANNOT INVOLVE A FIREARM: [value]"),
    ("270", "JUSTIFIABLE HOMICIDE MUST HAVE BIAS MOTIVATION NONE: [value]"),
    ("301", "MUST BE PRESENT - MANDATORY FIELD"),
    ("304", "INVALID DATA VALUE - NOT ON FBI VALIDATION TABLE: [value]"),
    ("305", "DATE RECOVERED IS INVALID OR OUTSIDE THE INCIDENT PERIOD: [value]"),
    ("306", "ERROR - DUPLICATE DATA VALUE WAS ENTERED: [value]"),
    ("342", "WARNING - PROPERTY VALUE OF $1,000,000 OR MORE: [value]"),
    ("351", "PROPERTY VALUE OF ZERO IS NOT ALLOWED FOR THIS DESCRIPTION: [value]"),
    ("352", "PROPERTY DATA NOT ALLOWED FOR LOSS TYPE NONE OR UNKNOWN: [value]"),
    ("353", "PENDING INVENTORY MUST HAVE A PROPERTY VALUE OF 1: [value]"),
    ("354", "PROPERTY VALUE ENTERED WITHOUT A PROPERTY DESCRIPTION"),
    ("355", "DATE RECOVERED ONLY ALLOWED FOR RECOVERED PROPERTY: [value]"),
    ("357", "STOLEN VEHICLES REQUIRE A COMPLETED MOTOR VEHICLE THEFT: [value]"),
    ("359", "VEHICLE COUNT REQUIRES A VEHICLE PROPERTY DESCRIPTION: [value]"),
    ("363", "QUANTITY AND MEASUREMENT NOT ALLOWED FOR DRUG TYPE X: [value]"),
    ("367", "MEASUREMENT NP ONLY ALLOWED FOR COUNTED DRUG TYPES: [value]"),
    ("391", "PROPERTY VALUE MUST BE ZERO FOR THIS DESCRIPTION: [value]"),
    ("401", "MUST BE PRESENT - MANDATORY FIELD"),
    ("402", "MUST CONTAIN NUMERIC ENTRY: [value]"),
    ("404", "INVALID DATA VALUE - NOT ON FBI VALIDATION TABLE: [value]"),
    ("406", "ERROR - DUPLICATE DATA VALUE WAS ENTERED: [value]"),
    ("409", "AGE OF VICTIM MUST BE 2 OR 4 CHARACTERS: [value]"),
    ("410", "AGE RANGE MINIMUM IS GREATER THAN MAXIMUM: [value]"),
    ("422", "AGE RANGE CANNOT START WITH 00: [value]"),
    ("450", "SPOUSE VICTIM MUST BE AT LEAST 10 YEARS OLD: [value]"),
    ("453", "AGE, SEX AND RACE REQUIRED FOR AN INDIVIDUAL VICTIM"),
    ("454", "OFFICER ACTIVITY, ASSIGNMENT, AGE, SEX AND RACE REQUIRED FOR TYPE L"),
    ("458", "PERSON DATA NOT ALLOWED FOR A NON-PERSON VICTIM: [value]"),
    ("483", "OFFICER DATA ONLY ALLOWED FOR LAW ENFORCEMENT OFFICER VICTIMS: [value]"),
    ("501", "MUST BE PRESENT - MANDATORY FIELD"),
    ("504", "INVALID DATA VALUE - NOT ON FBI VALIDATION TABLE: [value]"),
    ("509", "AGE OF OFFENDER MUST BE 2 OR 4 CHARACTERS: [value]"),
    ("510", "AGE RANGE MINIMUM IS GREATER THAN MAXIMUM: [value]"),
    ("522", "AGE RANGE CANNOT START WITH 00: [value]"),
    ("550", "OFFENDER RELATED AS SPOUSE MUST BE AT LEAST 10 YEARS OLD: [value]"),
    ("552", "UNKNOWN OFFENDER CANNOT HAVE AGE, SEX, RACE OR ETHNICITY: [value]"),
    ("553", "SEX OF VICTIM AND OFFENDER DOES NOT MATCH THE RELATIONSHIP: [value]"),
    ("554", "AGE OF VICTIM AND OFFENDER DOES NOT MATCH THE RELATIONSHIP: [value]"),
    ("556", "AGE OF OFFENDER MUST BE NUMERIC OR 00: [value]"),
    ("557", "UNKNOWN OFFENDER NOT ALLOWED FOR AN EXCEPTIONALLY CLEARED INCIDENT: [value]"),
    ("601", "MUST BE PRESENT - MANDATORY FIELD"),
    ("604", "INVALID DATA VALUE - NOT ON FBI VALIDATION TABLE: [value]"),
    ("605", "ARREST DATE IS INVALID OR AFTER THE MONTH OF SUBMISSION: [value]"),
    ("606", "ERROR - DUPLICATE DATA VALUE WAS ENTERED: [value]"),
    ("607", "MUTUALLY EXCLUSIVE VALUE CANNOT BE ENTERED WITH OTHER VALUES: [value]"),
    ("609", "AGE OF ARRESTEE MUST BE 2 OR 4 CHARACTERS: [value]"),
    ("610", "AGE RANGE MINIMUM IS GREATER THAN MAXIMUM: [value]"),
    ("615", "CANNOT HAVE EMBEDDED BLANKS BETWEEN FIRST AND LAST NON-BLANK CHARACTERS"),
    ("617", "CANNOT HAVE CHARACTERS OTHER THAN A-Z, 0-9, AND HYPHEN: [value]"),
    ("622", "AGE RANGE CANNOT START WITH 00: [value]"),
    ("652", "DISPOSITION REQUIRED FOR A JUVENILE ARRESTEE"),
    ("653", "DISPOSITION ONLY ALLOWED FOR A JUVENILE ARRESTEE: [value]"),
    ("654", "AUTOMATIC WEAPON INDICATOR MUST BE A OR BLANK: [value]"),
    ("655", "AUTOMATIC INDICATOR ONLY ALLOWED FOR FIREARM WEAPON TYPES: [value]"),
    ("664", "AGE OF ARRESTEE MUST BE NUMERIC OR 00: [value]"),
    ("665", "ARREST DATE CANNOT BE BEFORE THE INCIDENT DATE: [value]"),
    ("667", "SEX OF ARRESTEE CANNOT BE U: [value]"),
    ("670", "JUSTIFIABLE HOMICIDE CANNOT BE AN ARREST OFFENSE: [value]"),
    ("701", "MUST BE PRESENT - MANDATORY FIELD"),
    ("704", "INVALID DATA VALUE - NOT ON FBI VALIDATION TABLE: [value]"),
    ("705", "ARREST DATE IS INVALID OR AFTER THE MONTH OF SUBMISSION: [value]"),
    ("706", "ERROR - DUPLICATE DATA VALUE WAS ENTERED: [value]"),
    ("707", "MUTUALLY EXCLUSIVE VALUE CANNOT BE ENTERED WITH OTHER VALUES: [value]"),
    ("709", "AGE OF ARRESTEE MUST BE 2 OR 4 CHARACTERS: [value]"),
    ("710", "AGE RANGE MINIMUM IS GREATER THAN MAXIMUM: [value]"),
    ("715", "CANNOT HAVE EMBEDDED BLANKS BETWEEN FIRST AND LAST NON-BLANK CHARACTERS"),
    ("717", "CANNOT HAVE CHARACTERS OTHER THAN A-Z, 0-9, AND HYPHEN: [value]"),
    ("722", "AGE RANGE CANNOT START WITH 00: [value]"),
    ("752", "DISPOSITION REQUIRED FOR A JUVENILE ARRESTEE"),
    ("753", "DISPOSITION ONLY ALLOWED FOR A JUVENILE ARRESTEE: [value]"),
    ("754", "AUTOMATIC WEAPON INDICATOR MUST BE A OR BLANK: [value]"),
    ("755", "AUTOMATIC INDICATOR ONLY ALLOWED FOR FIREARM WEAPON TYPES: [value]"),
    ("757", "AGE OF ARRESTEE MUST BE NUMERIC OR 00: [value]"),
    ("758", "SEX OF ARRESTEE CANNOT BE U: [value]"),
    ("760", "GROUP B ARREST MUST HAVE A GROUP B OFFENSE: [value]"),
    ("761", "RUNAWAY ARRESTEE MUST BE UNDER 18: [value]"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_structural_codes() {
        let catalog = ErrorCatalog::builtin();
        for code in ["001", "051", "101", "201", "301", "401", "501", "601", "701"] {
            assert!(catalog.get(code).is_some(), "missing {code}");
        }
    }

    #[test]
    fn test_message_substitutes_value() {
        let catalog = ErrorCatalog::builtin();
        assert_eq!(
            catalog.message_for("204", "ZZ"),
            "INVALID DATA VALUE - NOT ON FBI VALIDATION TABLE: ZZ"
        );
        assert_eq!(catalog.message_for("999", "x"), "Unknown error code 999");
    }

    #[test]
    fn test_warning_flags() {
        let catalog = ErrorCatalog::builtin();
        assert!(catalog.is_warning("342"));
        assert!(!catalog.is_warning("304"));
        assert!(!catalog.is_warning("nope"));
    }

    #[test]
    fn test_insert_replaces_definition() {
        let mut catalog = ErrorCatalog::builtin();
        let before = catalog.len();
        catalog.insert(ErrorDefinition::new("204", "BAD [value]").as_warning());
        assert_eq!(catalog.len(), before);
        assert_eq!(catalog.message_for("204", "9"), "BAD 9");
        assert!(catalog.is_warning("204"));
    }

    #[test]
    fn test_codes_are_unique_and_three_digits() {
        let mut seen = std::collections::HashSet::new();
        for (code, _) in BUILTIN_MESSAGES {
            assert_eq!(code.len(), 3);
            assert!(seen.insert(*code), "duplicate {code}");
        }
    }
}
