//! Code lists: named sets of valid values for coded fields

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Built-in code list names
pub mod names {
    pub const SEX: &str = "sex";
    pub const SEX_OF_ARRESTEE: &str = "sex_of_arrestee";
    pub const RACE: &str = "race";
    pub const ETHNICITY: &str = "ethnicity";
    pub const RESIDENT_STATUS: &str = "resident_status";
    pub const VICTIM_TYPE: &str = "victim_type";
    pub const ATTEMPTED_COMPLETED: &str = "attempted_completed";
    pub const METHOD_OF_ENTRY: &str = "method_of_entry";
    pub const PROPERTY_LOSS: &str = "property_loss";
    pub const TYPE_OF_ARREST: &str = "type_of_arrest";
    pub const CLEARED_EXCEPTIONALLY: &str = "cleared_exceptionally";
    pub const CARGO_THEFT: &str = "cargo_theft";
    pub const INJURY: &str = "injury";
    pub const SUSPECTED_OF_USING: &str = "suspected_of_using";
    pub const CRIMINAL_ACTIVITY: &str = "criminal_activity";
    pub const WEAPON_FORCE: &str = "weapon_force";
    pub const LOCATION: &str = "location";
    pub const DISPOSITION_UNDER_18: &str = "disposition_under_18";
    pub const MULTIPLE_ARRESTEE: &str = "multiple_arrestee";
    pub const AUTOMATIC_WEAPON: &str = "automatic_weapon";
    pub const ARRESTEE_ARMED_WITH: &str = "arrestee_armed_with";
    pub const DRUG_TYPE: &str = "drug_type";
    pub const DRUG_MEASUREMENT: &str = "drug_measurement";
    pub const AGGRAVATED_ASSAULT: &str = "aggravated_assault";
    pub const JUSTIFIABLE_HOMICIDE: &str = "justifiable_homicide";
    pub const OFFICER_ASSIGNMENT: &str = "officer_assignment";
    pub const OFFICER_ACTIVITY: &str = "officer_activity";
    pub const RELATIONSHIP: &str = "relationship";
    pub const OFFENSE_CODE: &str = "offense_code";
    pub const GROUP_A_OFFENSE: &str = "group_a_offense";
    pub const GROUP_B_OFFENSE: &str = "group_b_offense";
    pub const PROPERTY_DESCRIPTION: &str = "property_description";
    pub const BIAS_MOTIVATION: &str = "bias_motivation";
    pub const REPORT_DATE_INDICATOR: &str = "report_date_indicator";
}

/// A code list containing allowed values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeList {
    /// Name the rule factories look the list up by
    pub name: String,
    /// Set of allowed codes
    codes: BTreeSet<String>,
    /// Whether validation is case-sensitive
    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,
    /// Description for documentation
    #[serde(default)]
    pub description: Option<String>,
}

fn default_case_sensitive() -> bool {
    true
}

impl CodeList {
    /// Create a new empty code list
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            codes: BTreeSet::new(),
            case_sensitive: true,
            description: None,
        }
    }

    /// Create with a set of codes
    pub fn with_codes<I, S>(name: impl Into<String>, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            codes: codes.into_iter().map(Into::into).collect(),
            case_sensitive: true,
            description: None,
        }
    }

    /// Set case sensitivity
    #[must_use]
    pub fn case_sensitive(mut self, sensitive: bool) -> Self {
        self.case_sensitive = sensitive;
        self
    }

    /// Set description
    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Add a code to the list
    pub fn add(&mut self, code: impl Into<String>) {
        self.codes.insert(code.into());
    }

    /// Check if a code is valid
    #[must_use]
    pub fn is_valid(&self, code: &str) -> bool {
        if self.case_sensitive {
            self.codes.contains(code)
        } else {
            self.codes.iter().any(|c| c.eq_ignore_ascii_case(code))
        }
    }

    /// All codes in sorted order
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.codes.iter().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }
}

/// Registry of named code lists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeListRegistry {
    lists: HashMap<String, CodeList>,
}

impl CodeListRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in NIBRS table.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for list in builtin_lists() {
            registry.register(list);
        }
        registry
    }

    /// Register a code list, replacing any list of the same name
    pub fn register(&mut self, list: CodeList) {
        self.lists.insert(list.name.clone(), list);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CodeList> {
        self.lists.get(name)
    }

    /// Sorted names of all registered lists
    #[must_use]
    pub fn list_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.lists.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn list(name: &str, description: &str, codes: &[&str]) -> CodeList {
    CodeList::with_codes(name, codes.iter().copied()).with_description(description)
}

const GROUP_A_OFFENSES: &[&str] = &[
    "720", "200", "13A", "13B", "13C", "510", "220", "250", "290", "35A", "35B", "270", "210",
    "26A", "26B", "26C", "26D", "26E", "26F", "26G", "39A", "39B", "39C", "39D", "09A", "09B",
    "09C", "64A", "64B", "100", "23A", "23B", "23C", "23D", "23E", "23F", "23G", "23H", "240",
    "370", "40A", "40B", "40C", "120", "11A", "11B", "11C", "11D", "36A", "36B", "280", "520",
];

const GROUP_B_OFFENSES: &[&str] = &[
    "90A", "90B", "90C", "90D", "90E", "90F", "90G", "90H", "90I", "90J",
];

fn builtin_lists() -> Vec<CodeList> {
    use names::{
        SEX, SEX_OF_ARRESTEE, RACE, ETHNICITY, RESIDENT_STATUS, VICTIM_TYPE, ATTEMPTED_COMPLETED,
        METHOD_OF_ENTRY, PROPERTY_LOSS, TYPE_OF_ARREST, CLEARED_EXCEPTIONALLY, CARGO_THEFT, INJURY,
        SUSPECTED_OF_USING, CRIMINAL_ACTIVITY, WEAPON_FORCE, LOCATION, DISPOSITION_UNDER_18,
        MULTIPLE_ARRESTEE, AUTOMATIC_WEAPON, ARRESTEE_ARMED_WITH, DRUG_TYPE, DRUG_MEASUREMENT,
        AGGRAVATED_ASSAULT, JUSTIFIABLE_HOMICIDE, OFFICER_ASSIGNMENT, OFFICER_ACTIVITY,
        RELATIONSHIP, OFFENSE_CODE, GROUP_A_OFFENSE, GROUP_B_OFFENSE, PROPERTY_DESCRIPTION,
        BIAS_MOTIVATION, REPORT_DATE_INDICATOR,
    };
    let all_offenses: Vec<&str> = GROUP_A_OFFENSES
        .iter()
        .chain(GROUP_B_OFFENSES)
        .copied()
        .collect();
    vec![
        list(SEX, "Sex of victim or offender", &["M", "F", "U"]),
        list(SEX_OF_ARRESTEE, "Sex of arrestee", &["M", "F"]),
        list(RACE, "Race", &["W", "B", "I", "A", "P", "U"]),
        list(ETHNICITY, "Ethnicity", &["H", "N", "U"]),
        list(RESIDENT_STATUS, "Resident status", &["N", "R", "U"]),
        list(
            VICTIM_TYPE,
            "Type of victim",
            &["B", "F", "G", "I", "L", "O", "R", "S", "U"],
        ),
        list(ATTEMPTED_COMPLETED, "Offense attempted/completed", &["A", "C"]),
        list(METHOD_OF_ENTRY, "Method of entry", &["F", "N"]),
        list(
            PROPERTY_LOSS,
            "Type of property loss",
            &["1", "2", "3", "4", "5", "6", "7", "8"],
        ),
        list(TYPE_OF_ARREST, "Type of arrest", &["O", "S", "T"]),
        list(
            CLEARED_EXCEPTIONALLY,
            "Cleared exceptionally",
            &["A", "B", "C", "D", "E", "N"],
        ),
        list(CARGO_THEFT, "Cargo theft", &["Y", "N"]),
        list(
            INJURY,
            "Type of injury",
            &["N", "B", "I", "L", "M", "O", "T", "U"],
        ),
        list(SUSPECTED_OF_USING, "Offender suspected of using", &["A", "C", "D", "N"]),
        list(
            CRIMINAL_ACTIVITY,
            "Type of criminal activity / gang information",
            &[
                "A", "B", "C", "D", "F", "E", "I", "O", "P", "S", "T", "U", "J", "G", "N",
            ],
        ),
        list(
            WEAPON_FORCE,
            "Type of weapon/force involved",
            &[
                "11", "12", "13", "14", "15", "20", "30", "35", "40", "50", "60", "65", "70", "85",
                "90", "95", "99",
            ],
        ),
        list(
            LOCATION,
            "Location type",
            &[
                "01", "02", "03", "04", "05", "06", "07", "08", "09", "10", "11", "12", "13", "14",
                "15", "16", "17", "18", "19", "20", "21", "22", "23", "24", "25", "37", "38", "39",
                "40", "41", "42", "44", "45", "46", "47", "48", "49", "50", "51", "52", "53", "54",
                "55", "56", "57", "58",
            ],
        ),
        list(DISPOSITION_UNDER_18, "Disposition of arrestee under 18", &["H", "R"]),
        list(MULTIPLE_ARRESTEE, "Multiple arrestee segments indicator", &["C", "M", "N"]),
        list(AUTOMATIC_WEAPON, "Automatic weapon indicator", &["A"]),
        list(
            ARRESTEE_ARMED_WITH,
            "Arrestee was armed with",
            &["01", "11", "12", "13", "14", "15", "16", "17"],
        ),
        list(
            DRUG_TYPE,
            "Suspected drug type",
            &[
                "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P",
                "U", "X",
            ],
        ),
        list(
            DRUG_MEASUREMENT,
            "Type of drug measurement",
            &["DU", "FO", "GL", "GM", "KG", "LB", "LT", "ML", "NP", "OZ", "XX"],
        ),
        list(
            AGGRAVATED_ASSAULT,
            "Aggravated assault/homicide circumstances",
            &[
                "01", "02", "03", "04", "05", "06", "07", "08", "09", "10", "20", "21", "30", "31",
                "32", "33", "34",
            ],
        ),
        list(
            JUSTIFIABLE_HOMICIDE,
            "Additional justifiable homicide circumstances",
            &["A", "B", "C", "D", "E", "F", "G"],
        ),
        list(
            OFFICER_ASSIGNMENT,
            "Type of officer assignment",
            &["F", "G", "H", "I", "J", "K", "L"],
        ),
        list(
            OFFICER_ACTIVITY,
            "Type of officer activity/circumstance",
            &["01", "02", "03", "04", "05", "06", "07", "08", "09", "10", "11"],
        ),
        list(
            RELATIONSHIP,
            "Relationship of victim to offender",
            &[
                "SE", "CS", "PA", "SB", "CH", "GP", "GC", "IL", "SP", "SC", "SS", "OF", "AQ", "FR",
                "NE", "BE", "BG", "CF", "HR", "XS", "EE", "ER", "OK", "RU", "ST", "VO",
            ],
        ),
        list(OFFENSE_CODE, "UCR offense code", &all_offenses),
        list(GROUP_A_OFFENSE, "Group A UCR offense code", GROUP_A_OFFENSES),
        list(GROUP_B_OFFENSE, "Group B UCR offense code", GROUP_B_OFFENSES),
        list(
            PROPERTY_DESCRIPTION,
            "Property description",
            &[
                "01", "02", "03", "04", "05", "06", "07", "08", "09", "10", "11", "12", "13", "14",
                "15", "16", "17", "18", "19", "20", "21", "22", "23", "24", "25", "26", "27", "28",
                "29", "30", "31", "32", "33", "34", "35", "36", "37", "38", "39", "41", "42", "43",
                "44", "45", "46", "47", "48", "49", "59", "64", "65", "66", "67", "68", "69", "70",
                "71", "72", "73", "74", "75", "76", "77", "78", "79", "80", "88", "99",
            ],
        ),
        list(
            BIAS_MOTIVATION,
            "Bias motivation",
            &[
                "11", "12", "13", "14", "15", "16", "21", "22", "23", "24", "25", "26", "27", "28",
                "29", "31", "32", "33", "41", "42", "43", "44", "45", "51", "52", "61", "62", "71",
                "72", "81", "82", "83", "84", "85", "88", "99",
            ],
        ),
        list(REPORT_DATE_INDICATOR, "Report date indicator", &["R"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_list_membership() {
        let list = CodeList::with_codes("sex", ["M", "F", "U"]);
        assert!(list.is_valid("M"));
        assert!(!list.is_valid("m"));
        assert!(list.clone().case_sensitive(false).is_valid("m"));
        assert!(!list.is_valid("X"));
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_builtin_registry_tables() {
        let registry = CodeListRegistry::builtin();
        let offenses = registry.get(names::OFFENSE_CODE).unwrap();
        assert!(offenses.is_valid("13A"));
        assert!(offenses.is_valid("90J"));
        assert!(!registry.get(names::GROUP_A_OFFENSE).unwrap().is_valid("90J"));
        assert!(registry.get(names::GROUP_B_OFFENSE).unwrap().is_valid("90J"));
        assert!(!registry.get(names::SEX_OF_ARRESTEE).unwrap().is_valid("U"));
        assert!(registry.get("no_such_list").is_none());
    }

    #[test]
    fn test_register_replaces_by_name() {
        let mut registry = CodeListRegistry::builtin();
        registry.register(CodeList::with_codes(names::SEX, ["X"]));
        let sex = registry.get(names::SEX).unwrap();
        assert!(sex.is_valid("X") && !sex.is_valid("M"));
        assert!(registry.list_names().contains(&names::RACE));
    }
}
