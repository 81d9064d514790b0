//! Generic validation rules
//!
//! A rule inspects one subject and returns at most one [`NibrsError`]. The
//! reusable rules below read their field through a plain accessor function
//! given at construction, so one rule type serves every field of the same
//! shape. Closures of the form `Fn(&T) -> Option<NibrsError>` are rules too,
//! and carry the one-off checks.

use crate::Result;
use nibrs_catalog::CodeList;
use nibrs_model::{
    ActionType, ArresteeSegment, ErrorCode, ErrorTemplate, FieldValue, GroupAIncident,
    GroupBArrest, NibrsError, OffenderSegment, OffenseSegment, Parsed, PropertySegment, Segment,
    VictimSegment, ZeroReport,
};
use regex::Regex;
use std::collections::HashSet;

/// Longest identifier accepted by the identifier format rules
pub const MAX_IDENTIFIER_LENGTH: usize = 12;

/// Anything rules can be applied to
pub trait Subject {
    /// Template stamping errors with this subject's context.
    fn template(&self) -> ErrorTemplate;

    /// Action code of the owning report.
    fn report_action(&self) -> ActionType;
}

macro_rules! segment_subject {
    ($($segment:ty),+ $(,)?) => {
        $(
            impl Subject for $segment {
                fn template(&self) -> ErrorTemplate {
                    Segment::error_template(self)
                }

                fn report_action(&self) -> ActionType {
                    Segment::action(self)
                }
            }
        )+
    };
}

segment_subject!(
    OffenseSegment,
    PropertySegment,
    VictimSegment,
    OffenderSegment,
    ArresteeSegment,
);

macro_rules! report_subject {
    ($($report:ty),+ $(,)?) => {
        $(
            impl Subject for $report {
                fn template(&self) -> ErrorTemplate {
                    <$report>::error_template(self)
                }

                fn report_action(&self) -> ActionType {
                    self.header.action
                }
            }
        )+
    };
}

report_subject!(GroupAIncident, GroupBArrest, ZeroReport);

/// A check against a single subject
pub trait Rule<T: ?Sized>: Send + Sync {
    fn apply(&self, subject: &T) -> Option<NibrsError>;
}

impl<T: ?Sized, F> Rule<T> for F
where
    F: Fn(&T) -> Option<NibrsError> + Send + Sync,
{
    fn apply(&self, subject: &T) -> Option<NibrsError> {
        self(subject)
    }
}

/// A check against a child segment that also needs its owning incident
pub trait IncidentRule<S: ?Sized>: Send + Sync {
    fn apply(&self, subject: &S, incident: &GroupAIncident) -> Option<NibrsError>;
}

impl<S: ?Sized, F> IncidentRule<S> for F
where
    F: Fn(&S, &GroupAIncident) -> Option<NibrsError> + Send + Sync,
{
    fn apply(&self, subject: &S, incident: &GroupAIncident) -> Option<NibrsError> {
        self(subject, incident)
    }
}

/// Combinators available on every rule
pub trait RuleExt<T>: Rule<T> + Sized {
    /// Skip this rule for subjects matching `predicate`.
    fn unless(self, predicate: fn(&T) -> bool) -> Unless<Self, T> {
        Unless {
            rule: self,
            predicate,
        }
    }
}

impl<T, R: Rule<T>> RuleExt<T> for R {}

/// Rule wrapped with a skip condition
pub struct Unless<R, T> {
    rule: R,
    predicate: fn(&T) -> bool,
}

impl<T, R: Rule<T>> Rule<T> for Unless<R, T> {
    fn apply(&self, subject: &T) -> Option<NibrsError> {
        if (self.predicate)(subject) {
            None
        } else {
            self.rule.apply(subject)
        }
    }
}

/// Ordered rules for one subject type
pub struct RuleSet<S> {
    rules: Vec<Box<dyn Rule<S>>>,
    incident_rules: Vec<Box<dyn IncidentRule<S>>>,
}

impl<S> Default for RuleSet<S> {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            incident_rules: Vec::new(),
        }
    }
}

impl<S: Subject> RuleSet<S> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: impl Rule<S> + 'static) -> &mut Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn push_incident(&mut self, rule: impl IncidentRule<S> + 'static) -> &mut Self {
        self.incident_rules.push(Box::new(rule));
        self
    }

    /// Apply the context-free rules. Delete actions are not validated.
    pub fn apply(&self, subject: &S) -> Vec<NibrsError> {
        if subject.report_action() == ActionType::Delete {
            return Vec::new();
        }
        self.rules.iter().filter_map(|r| r.apply(subject)).collect()
    }

    /// Apply every rule, including those that consult the owning incident.
    pub fn apply_in(&self, subject: &S, incident: &GroupAIncident) -> Vec<NibrsError> {
        let mut errors = self.apply(subject);
        if subject.report_action() != ActionType::Delete {
            errors.extend(
                self.incident_rules
                    .iter()
                    .filter_map(|r| r.apply(subject, incident)),
            );
        }
        errors
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len() + self.incident_rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Scalar text accessor
pub type TextAccessor<T> = fn(&T) -> Option<&str>;

/// Repeated-slot accessor
pub type SlotsAccessor<T> = fn(&T) -> &[Option<String>];

/// A coded field, scalar or repeated
#[derive(Debug, Clone, Copy)]
pub enum Coded<'a> {
    Single(Option<&'a str>),
    Slots(&'a [Option<String>]),
}

impl Coded<'_> {
    fn values(&self) -> Vec<&str> {
        match self {
            Coded::Single(v) => v.iter().copied().collect(),
            Coded::Slots(slots) => slots.iter().flatten().map(String::as_str).collect(),
        }
    }

    fn to_value(self) -> Option<FieldValue> {
        match self {
            Coded::Single(v) => v.map(FieldValue::from),
            Coded::Slots(slots) => Some(FieldValue::from(slots)),
        }
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

enum BlankCheck<T> {
    Text(TextAccessor<T>),
    Presence(fn(&T) -> bool),
}

/// Flags a mandatory field left blank
pub struct NotBlankRule<T> {
    check: BlankCheck<T>,
    data_element: &'static str,
    code: ErrorCode,
}

impl<T> NotBlankRule<T> {
    pub fn new(accessor: TextAccessor<T>, data_element: &'static str, code: &str) -> Self {
        Self {
            check: BlankCheck::Text(accessor),
            data_element,
            code: ErrorCode::new(code),
        }
    }

    /// Mandatory field of a non-text type, `present` reporting whether it is populated.
    pub fn present(present: fn(&T) -> bool, data_element: &'static str, code: &str) -> Self {
        Self {
            check: BlankCheck::Presence(present),
            data_element,
            code: ErrorCode::new(code),
        }
    }
}

impl<T: Subject> Rule<T> for NotBlankRule<T> {
    fn apply(&self, subject: &T) -> Option<NibrsError> {
        let blank = match self.check {
            BlankCheck::Text(accessor) => is_blank(accessor(subject)),
            BlankCheck::Presence(present) => !present(subject),
        };
        blank.then(|| {
            subject
                .template()
                .error(self.code.clone(), self.data_element, None)
        })
    }
}

/// Flags a repeated field whose slots are all blank; a field with no slots passes
pub struct NotAllBlankRule<T> {
    accessor: SlotsAccessor<T>,
    data_element: &'static str,
    code: ErrorCode,
}

impl<T> NotAllBlankRule<T> {
    pub fn new(accessor: SlotsAccessor<T>, data_element: &'static str, code: &str) -> Self {
        Self {
            accessor,
            data_element,
            code: ErrorCode::new(code),
        }
    }
}

impl<T: Subject> Rule<T> for NotAllBlankRule<T> {
    fn apply(&self, subject: &T) -> Option<NibrsError> {
        let slots = (self.accessor)(subject);
        let all_blank = !slots.is_empty() && slots.iter().all(|s| is_blank(s.as_deref()));
        all_blank.then(|| {
            subject
                .template()
                .error(self.code.clone(), self.data_element, None)
        })
    }
}

/// Flags coded values outside a code list
///
/// Blank values pass unless the rule was built with [`ValidValueRule::rejecting_null`];
/// a repeated field counts as blank only when every slot is blank.
pub struct ValidValueRule<T> {
    accessor: for<'a> fn(&'a T) -> Coded<'a>,
    data_element: &'static str,
    code: ErrorCode,
    allowed: CodeList,
    allow_null: bool,
}

impl<T> ValidValueRule<T> {
    pub fn new(
        accessor: for<'a> fn(&'a T) -> Coded<'a>,
        data_element: &'static str,
        code: &str,
        allowed: &CodeList,
    ) -> Self {
        Self {
            accessor,
            data_element,
            code: ErrorCode::new(code),
            allowed: allowed.clone(),
            allow_null: true,
        }
    }

    /// Rule against an inline set of codes.
    pub fn with_codes(
        accessor: for<'a> fn(&'a T) -> Coded<'a>,
        data_element: &'static str,
        code: &str,
        codes: &[&str],
    ) -> Self {
        Self::new(
            accessor,
            data_element,
            code,
            &CodeList::with_codes(data_element, codes.iter().copied()),
        )
    }

    #[must_use]
    pub fn rejecting_null(mut self) -> Self {
        self.allow_null = false;
        self
    }
}

impl<T: Subject> Rule<T> for ValidValueRule<T> {
    fn apply(&self, subject: &T) -> Option<NibrsError> {
        let coded = (self.accessor)(subject);
        let values = coded.values();
        let violated = if values.is_empty() {
            !self.allow_null
        } else {
            values.iter().any(|v| !self.allowed.is_valid(v))
        };
        violated.then(|| {
            subject
                .template()
                .error(self.code.clone(), self.data_element, coded.to_value())
        })
    }
}

/// Flags a repeated field holding the same value twice
pub struct DuplicateValueRule<T> {
    accessor: SlotsAccessor<T>,
    data_element: &'static str,
    code: ErrorCode,
}

impl<T> DuplicateValueRule<T> {
    pub fn new(accessor: SlotsAccessor<T>, data_element: &'static str, code: &str) -> Self {
        Self {
            accessor,
            data_element,
            code: ErrorCode::new(code),
        }
    }
}

impl<T: Subject> Rule<T> for DuplicateValueRule<T> {
    fn apply(&self, subject: &T) -> Option<NibrsError> {
        let slots = (self.accessor)(subject);
        let mut seen = HashSet::new();
        let duplicated = slots.iter().flatten().any(|v| !seen.insert(v.as_str()));
        duplicated.then(|| {
            subject
                .template()
                .error(self.code.clone(), self.data_element, FieldValue::from(slots))
        })
    }
}

/// Flags an exclusive value ("none", "unknown") entered alongside other values
pub struct ExclusiveValueRule<T> {
    accessor: SlotsAccessor<T>,
    data_element: &'static str,
    code: ErrorCode,
    exclusive: Vec<String>,
}

impl<T> ExclusiveValueRule<T> {
    /// Rule treating `N` as the exclusive value.
    pub fn new(accessor: SlotsAccessor<T>, data_element: &'static str, code: &str) -> Self {
        Self {
            accessor,
            data_element,
            code: ErrorCode::new(code),
            exclusive: vec!["N".to_string()],
        }
    }

    #[must_use]
    pub fn with_exclusive(mut self, values: &[&str]) -> Self {
        self.exclusive = values.iter().map(|v| (*v).to_string()).collect();
        self
    }
}

impl<T: Subject> Rule<T> for ExclusiveValueRule<T> {
    fn apply(&self, subject: &T) -> Option<NibrsError> {
        let slots = (self.accessor)(subject);
        let populated: Vec<&String> = slots.iter().flatten().collect();
        let violated = populated.iter().any(|v| self.exclusive.contains(*v))
            && populated.iter().any(|v| !self.exclusive.contains(*v));
        violated.then(|| {
            subject
                .template()
                .error(self.code.clone(), self.data_element, FieldValue::from(slots))
        })
    }
}

type NumericTest<T> = Box<dyn Fn(i64, &T) -> Option<NibrsError> + Send + Sync>;

/// Applies a test to a numeric field, skipping blanks
///
/// The error returned by the test gets the tested number as its offending value.
pub struct NumericValueRule<T> {
    extract: fn(&T) -> Option<i64>,
    test: NumericTest<T>,
}

impl<T> NumericValueRule<T> {
    pub fn new(
        extract: fn(&T) -> Option<i64>,
        test: impl Fn(i64, &T) -> Option<NibrsError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            extract,
            test: Box::new(test),
        }
    }
}

impl<T> Rule<T> for NumericValueRule<T> {
    fn apply(&self, subject: &T) -> Option<NibrsError> {
        let value = (self.extract)(subject)?;
        (self.test)(value, subject).map(|e| e.with_value(FieldValue::Integer(value)))
    }
}

type StringTest<T> = Box<dyn Fn(&str, &T) -> Option<NibrsError> + Send + Sync>;

/// Applies a test to a text field, skipping blanks
pub struct StringValueRule<T> {
    extract: TextAccessor<T>,
    test: StringTest<T>,
}

impl<T> StringValueRule<T> {
    pub fn new(
        extract: TextAccessor<T>,
        test: impl Fn(&str, &T) -> Option<NibrsError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            extract,
            test: Box::new(test),
        }
    }
}

impl<T> Rule<T> for StringValueRule<T> {
    fn apply(&self, subject: &T) -> Option<NibrsError> {
        let value = (self.extract)(subject)?;
        (self.test)(value, subject).map(|e| e.with_value(FieldValue::from(value)))
    }
}

enum ParsedSource<T, V> {
    One(fn(&T) -> &Parsed<V>),
    Many(fn(&T) -> &[Parsed<V>]),
}

/// Surfaces decode failures held in [`Parsed`] fields
///
/// Reports the stored error of an invalid value and, when a required code is
/// set, a missing value.
pub struct ParsedValueRule<T, V> {
    check: ParsedSource<T, V>,
    data_element: &'static str,
    required: Option<ErrorCode>,
}

impl<T, V> ParsedValueRule<T, V> {
    pub fn new(accessor: fn(&T) -> &Parsed<V>, data_element: &'static str) -> Self {
        Self {
            check: ParsedSource::One(accessor),
            data_element,
            required: None,
        }
    }

    /// Rule over repeated slots; the first invalid slot is reported.
    pub fn slots(accessor: fn(&T) -> &[Parsed<V>], data_element: &'static str) -> Self {
        Self {
            check: ParsedSource::Many(accessor),
            data_element,
            required: None,
        }
    }

    #[must_use]
    pub fn required(mut self, code: &str) -> Self {
        self.required = Some(ErrorCode::new(code));
        self
    }
}

impl<T: Subject, V> Rule<T> for ParsedValueRule<T, V> {
    fn apply(&self, subject: &T) -> Option<NibrsError> {
        let values = match self.check {
            ParsedSource::One(accessor) => std::slice::from_ref(accessor(subject)),
            ParsedSource::Many(accessor) => accessor(subject),
        };
        if let Some(error) = values.iter().find_map(Parsed::error) {
            return Some(error.clone());
        }
        let code = self.required.as_ref()?;
        values.iter().all(Parsed::is_missing).then(|| {
            subject
                .template()
                .error(code.clone(), self.data_element, None)
        })
    }
}

/// Flags identifiers that are too long or outside an allowed pattern
pub struct IdentifierFormatRule<T> {
    accessor: TextAccessor<T>,
    pattern: Regex,
    data_element: &'static str,
    code: ErrorCode,
}

impl<T> IdentifierFormatRule<T> {
    /// Upper-case letters, digits and hyphens, right-filled with blanks.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Pattern`] if the pattern fails to compile.
    pub fn characters(
        accessor: TextAccessor<T>,
        data_element: &'static str,
        code: &str,
    ) -> Result<Self> {
        Self::with_pattern(accessor, r"^[A-Z0-9\-]+ *$", data_element, code)
    }

    /// No blanks between the first and last non-blank characters.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Pattern`] if the pattern fails to compile.
    pub fn no_embedded_blanks(
        accessor: TextAccessor<T>,
        data_element: &'static str,
        code: &str,
    ) -> Result<Self> {
        Self::with_pattern(accessor, r"^[^ ]+ *$", data_element, code)
    }

    /// # Errors
    ///
    /// Returns [`crate::Error::Pattern`] if `pattern` fails to compile.
    pub fn with_pattern(
        accessor: TextAccessor<T>,
        pattern: &str,
        data_element: &'static str,
        code: &str,
    ) -> Result<Self> {
        Ok(Self {
            accessor,
            pattern: Regex::new(pattern)?,
            data_element,
            code: ErrorCode::new(code),
        })
    }
}

impl<T: Subject> Rule<T> for IdentifierFormatRule<T> {
    fn apply(&self, subject: &T) -> Option<NibrsError> {
        let value = (self.accessor)(subject)?;
        let violated = value.len() > MAX_IDENTIFIER_LENGTH || !self.pattern.is_match(value);
        violated.then(|| {
            subject
                .template()
                .error(self.code.clone(), self.data_element, FieldValue::from(value))
        })
    }
}
