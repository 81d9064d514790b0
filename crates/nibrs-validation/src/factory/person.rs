//! Rules shared by victims, offenders and arrestees

use crate::rules::{Rule, Subject, TextAccessor};
use nibrs_catalog::CodeList;
use nibrs_model::{ErrorCode, FieldValue, NibrsError, Person};

/// Coded demographic field, checked only on persons that are not explicitly unknown
pub struct PersonValueRule<S> {
    accessor: TextAccessor<S>,
    data_element: &'static str,
    code: ErrorCode,
    allowed: CodeList,
    allow_null: bool,
}

impl<S> PersonValueRule<S> {
    /// Rule rejecting blank values as well as codes outside `allowed`.
    pub fn required(
        accessor: TextAccessor<S>,
        data_element: &'static str,
        code: &str,
        allowed: &CodeList,
    ) -> Self {
        Self {
            accessor,
            data_element,
            code: ErrorCode::new(code),
            allowed: allowed.clone(),
            allow_null: false,
        }
    }

    /// Rule accepting blank values.
    pub fn optional(
        accessor: TextAccessor<S>,
        data_element: &'static str,
        code: &str,
        allowed: &CodeList,
    ) -> Self {
        Self {
            allow_null: true,
            ..Self::required(accessor, data_element, code, allowed)
        }
    }
}

impl<S: Subject + Person> Rule<S> for PersonValueRule<S> {
    fn apply(&self, subject: &S) -> Option<NibrsError> {
        if !subject.is_person() || subject.is_unknown() {
            return None;
        }
        let value = (self.accessor)(subject);
        let violated = match value {
            None => !self.allow_null,
            Some(v) => !self.allowed.is_valid(v),
        };
        violated.then(|| {
            subject.template().error(
                self.code.clone(),
                self.data_element,
                value.map(FieldValue::from),
            )
        })
    }
}

/// Surfaces the error the age decoder recorded, restamped with the segment's context.
pub fn age_error<S: Subject + Person>(data_element: &'static str) -> impl Rule<S> {
    move |subject: &S| {
        let error = subject.age()?.error.as_ref()?;
        Some(
            subject
                .template()
                .build(error.code.clone())
                .with_data_element(data_element)
                .with_value(error.value.clone()),
        )
    }
}

/// Flags an age range whose lower bound exceeds its upper bound.
pub fn age_order<S: Subject + Person>(
    data_element: &'static str,
    code: impl Into<ErrorCode>,
) -> impl Rule<S> {
    let code = code.into();
    move |subject: &S| {
        let age = subject.age()?;
        let reversed = age.is_age_range() && age.min > age.max;
        reversed.then(|| {
            subject.template().error(
                code.clone(),
                data_element,
                FieldValue::from(age.to_raw()),
            )
        })
    }
}

/// First populated person field, paired with its data element.
///
/// `elements` names the data elements of age, sex, race, ethnicity and
/// resident status, in that order.
pub fn first_person_field<S: Person>(
    subject: &S,
    elements: [&'static str; 5],
) -> Option<(&'static str, FieldValue)> {
    if let Some(age) = subject.age() {
        return Some((elements[0], FieldValue::from(age.to_raw())));
    }
    [
        (elements[1], subject.sex()),
        (elements[2], subject.race()),
        (elements[3], subject.ethnicity()),
        (elements[4], subject.resident_status()),
    ]
    .into_iter()
    .find_map(|(element, value)| value.map(|v| (element, FieldValue::from(v))))
}
