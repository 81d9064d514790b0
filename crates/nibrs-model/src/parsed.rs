//! Tri-state decoded field values

use crate::error::NibrsError;
use serde::{Deserialize, Serialize};

/// A decoded field: blank in the input, present but unparseable, or a valid value
///
/// The invalid state keeps the error raised while parsing so that validation can
/// surface it later without re-reading the line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Parsed<T> {
    /// Field was blank or absent
    Missing,
    /// Field was present but failed structural parsing
    Invalid(Box<NibrsError>),
    /// Field holds a valid value
    Present(T),
}

impl<T> Default for Parsed<T> {
    fn default() -> Self {
        Parsed::Missing
    }
}

impl<T> Parsed<T> {
    #[must_use]
    pub fn missing() -> Self {
        Parsed::Missing
    }

    #[must_use]
    pub fn invalid(error: NibrsError) -> Self {
        Parsed::Invalid(Box::new(error))
    }

    #[must_use]
    pub fn present(value: T) -> Self {
        Parsed::Present(value)
    }

    /// `Present` for `Some`, `Missing` for `None`.
    pub fn from_option(value: Option<T>) -> Self {
        value.map_or(Parsed::Missing, Parsed::Present)
    }

    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Parsed::Missing)
    }

    #[must_use]
    pub fn is_invalid(&self) -> bool {
        matches!(self, Parsed::Invalid(_))
    }

    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self, Parsed::Present(_))
    }

    /// The valid value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Parsed::Present(v) => Some(v),
            _ => None,
        }
    }

    /// The error carried by an invalid value.
    #[must_use]
    pub fn error(&self) -> Option<&NibrsError> {
        match self {
            Parsed::Invalid(e) => Some(e),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Parsed<U> {
        match self {
            Parsed::Missing => Parsed::Missing,
            Parsed::Invalid(e) => Parsed::Invalid(e),
            Parsed::Present(v) => Parsed::Present(f(v)),
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Parsed::Present(v) => Some(v),
            _ => None,
        }
    }
}

impl<T: Copy> Parsed<T> {
    /// Copy of the valid value, if any.
    #[must_use]
    pub fn get(&self) -> Option<T> {
        self.value().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_state_holds() {
        let missing: Parsed<u32> = Parsed::missing();
        assert!(missing.is_missing() && !missing.is_invalid() && !missing.is_present());

        let invalid: Parsed<u32> = Parsed::invalid(NibrsError::new("104"));
        assert!(invalid.is_invalid() && !invalid.is_missing() && !invalid.is_present());
        assert_eq!(invalid.error().map(|e| e.code.as_str()), Some("104"));
        assert_eq!(invalid.value(), None);

        let present = Parsed::present(19_u32);
        assert!(present.is_present());
        assert_eq!(present.get(), Some(19));
        assert!(present.error().is_none());
    }

    #[test]
    fn test_default_is_missing() {
        let values: [Parsed<u32>; 3] = Default::default();
        assert!(values.iter().all(Parsed::is_missing));
    }

    #[test]
    fn test_from_option_and_map() {
        assert_eq!(Parsed::from_option(Some(3)).map(|v| v * 2), Parsed::Present(6));
        assert!(Parsed::<u32>::from_option(None).is_missing());
    }

    #[test]
    fn test_serializes_with_state_tag() {
        let json = serde_json::to_string(&Parsed::present(5_u32)).unwrap();
        assert_eq!(json, r#"{"state":"present","value":5}"#);
        let json = serde_json::to_string(&Parsed::<u32>::missing()).unwrap();
        assert_eq!(json, r#"{"state":"missing"}"#);
    }
}
