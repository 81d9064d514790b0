//! Age field decoding and comparison
//!
//! Ages arrive as a 2- or 4-character token: a single two-digit age, a
//! two-digit range (`"2428"`), or one of the non-numeric codes below.

use crate::error::{ErrorCode, ErrorTemplate, FieldValue, NibrsError};
use crate::metadata::SegmentType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Neonate (under 24 hours)
pub const NEONATE: &str = "NN";
/// Newborn (1-6 days)
pub const NEWBORN: &str = "NB";
/// Baby (7-364 days)
pub const BABY: &str = "BB";
/// Age unknown
pub const UNKNOWN: &str = "00";

/// A decoded age: single value, range, or non-numeric code
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Age {
    /// Lower bound (equal to `max` for a single age)
    pub min: Option<u32>,

    /// Upper bound
    pub max: Option<u32>,

    /// Non-numeric code, or the raw token when it could not be decoded
    pub non_numeric: Option<String>,

    /// Decode error, stamped with the owning report
    pub error: Option<NibrsError>,
}

impl Age {
    /// A single age in years.
    #[must_use]
    pub fn single(years: u32) -> Self {
        Self {
            min: Some(years),
            max: Some(years),
            ..Self::default()
        }
    }

    /// An age range in years.
    #[must_use]
    pub fn range(min: u32, max: u32) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            ..Self::default()
        }
    }

    /// A non-numeric age code such as [`NEONATE`] or [`UNKNOWN`].
    #[must_use]
    pub fn code(code: &str) -> Self {
        let numeric_zero = matches!(code, NEONATE | NEWBORN | BABY);
        Self {
            min: numeric_zero.then_some(0),
            max: numeric_zero.then_some(0),
            non_numeric: Some(code.to_string()),
            error: None,
        }
    }

    /// Decode a raw age token for a segment of the given type.
    ///
    /// Returns `None` for blank input.
    #[must_use]
    pub fn parse(raw: &str, segment_type: SegmentType) -> Option<Self> {
        Self::parse_with(raw, &ErrorTemplate::new(segment_type))
    }

    /// Decode a raw age token, stamping any error from `template`.
    ///
    /// The template's segment type selects the error codes: a non-numeric age
    /// raises the segment's non-numeric code, a malformed length or non-numeric
    /// range maximum raises `t09` and a zero range minimum raises `t22`.
    #[must_use]
    pub fn parse_with(raw: &str, template: &ErrorTemplate) -> Option<Self> {
        let token = raw.trim();
        if token.is_empty() {
            return None;
        }
        let segment_type = template.segment_type;
        let chars: Vec<char> = token.chars().collect();
        let mut age = Age::default();
        let mut code: Option<ErrorCode> = None;

        match chars.len() {
            4 => {
                let low: String = chars[..2].iter().collect();
                let high: String = chars[2..].iter().collect();
                age.min = parse_two_digits(&low);
                if age.min.is_none() {
                    code = Some(non_numeric_code(segment_type));
                }
                age.max = parse_two_digits(&high);
                if age.max.is_none() {
                    code = Some(ErrorCode::for_segment(segment_type, "09"));
                }
                if age.min == Some(0) {
                    code = Some(ErrorCode::for_segment(segment_type, "22"));
                }
            }
            2 => match token {
                NEONATE | NEWBORN | BABY => {
                    age = Age::code(token);
                    if segment_type != SegmentType::Victim {
                        code = Some(non_numeric_code(segment_type));
                    }
                }
                UNKNOWN => age = Age::code(UNKNOWN),
                _ => {
                    if let Some(years) = parse_two_digits(token) {
                        age = Age::single(years);
                    } else {
                        age.non_numeric = Some(token.to_string());
                        code = Some(non_numeric_code(segment_type));
                    }
                }
            },
            3 => {
                age.non_numeric = Some(token.to_string());
                code = Some(ErrorCode::for_segment(segment_type, "09"));
            }
            _ => {
                age.non_numeric = Some(token.to_string());
                code = Some(non_numeric_code(segment_type));
            }
        }

        age.error = code.map(|c| template.build(c).with_value(FieldValue::from(raw)));
        Some(age)
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.non_numeric.as_deref() == Some(UNKNOWN)
    }

    #[must_use]
    pub fn is_neonate(&self) -> bool {
        self.non_numeric.as_deref() == Some(NEONATE)
    }

    #[must_use]
    pub fn is_newborn(&self) -> bool {
        self.non_numeric.as_deref() == Some(NEWBORN)
    }

    #[must_use]
    pub fn is_baby(&self) -> bool {
        self.non_numeric.as_deref() == Some(BABY)
    }

    #[must_use]
    pub fn is_non_numeric(&self) -> bool {
        self.non_numeric.is_some()
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Whether this is a valid numeric range with distinct bounds.
    #[must_use]
    pub fn is_age_range(&self) -> bool {
        self.error.is_none()
            && !self.is_non_numeric()
            && matches!((self.min, self.max), (Some(a), Some(b)) if a != b)
    }

    /// Whether the token was neither two nor four characters long.
    #[must_use]
    pub fn has_invalid_length(&self) -> bool {
        self.error.is_some()
            && self
                .non_numeric
                .as_deref()
                .is_some_and(|t| t.chars().count() > 2)
    }

    /// Midpoint of the range (the age itself for a single age).
    #[must_use]
    pub fn average(&self) -> Option<u32> {
        match (self.min, self.max) {
            (Some(a), Some(b)) => Some((a + b) / 2),
            _ => None,
        }
    }

    /// Lower and upper bound expressed in days.
    ///
    /// Neonate and unknown map to zero days, newborn to one, baby to seven.
    #[must_use]
    pub fn days_range(&self) -> (u32, u32) {
        match self.non_numeric.as_deref() {
            Some(NEWBORN) => (1, 1),
            Some(BABY) => (7, 7),
            Some(_) => (0, 0),
            None => (
                self.min.unwrap_or(0) * 365,
                self.max.unwrap_or(0) * 365,
            ),
        }
    }

    /// Whether this age is younger than `other`.
    ///
    /// Strict mode requires this age's upper bound to be below the other's
    /// lower bound; lenient mode only requires that it could be younger.
    #[must_use]
    pub fn is_younger_than(&self, other: &Age, lenient: bool) -> bool {
        let this = self.days_range();
        let that = other.days_range();
        let this_comp = if lenient { this.0 } else { this.1 };
        let that_comp = if lenient { that.1 } else { that.0 };
        this_comp < that_comp
    }

    /// Whether this age is older than `other`, strict or lenient as above.
    #[must_use]
    pub fn is_older_than(&self, other: &Age, lenient: bool) -> bool {
        let this = self.days_range();
        let that = other.days_range();
        let that_comp = if lenient { that.0 } else { that.1 };
        let this_comp = if lenient { this.1 } else { this.0 };
        this_comp > that_comp
    }

    /// Fixed-width token form used by the encoder.
    #[must_use]
    pub fn to_raw(&self) -> String {
        if let Some(code) = &self.non_numeric {
            return code.clone();
        }
        if let Some(raw) = self
            .error
            .as_ref()
            .and_then(|e| e.value.as_ref())
            .and_then(FieldValue::as_text)
        {
            return raw.trim().to_string();
        }
        match (self.min, self.max) {
            (Some(a), Some(b)) if a == b => format!("{a:02}"),
            (Some(a), Some(b)) => format!("{a:02}{b:02}"),
            (Some(a), None) => format!("{a:02}"),
            _ => String::new(),
        }
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(e) = &self.error {
            let value = e.value.as_ref().map(ToString::to_string).unwrap_or_default();
            return write!(f, "Invalid age: {value}");
        }
        if let Some(code) = &self.non_numeric {
            return f.write_str(code);
        }
        match (self.min, self.max) {
            (Some(a), Some(b)) if a != b => write!(f, "{a}-{b}"),
            (Some(a), _) => write!(f, "{a}"),
            _ => Ok(()),
        }
    }
}

fn parse_two_digits(s: &str) -> Option<u32> {
    if s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

/// Error code raised for a non-numeric age on the given segment type.
fn non_numeric_code(segment_type: SegmentType) -> ErrorCode {
    match segment_type {
        SegmentType::Victim => ErrorCode::new("404"),
        SegmentType::Offender => ErrorCode::new("556"),
        SegmentType::GroupAArrestee => ErrorCode::new("664"),
        SegmentType::GroupBArrestee => ErrorCode::new("757"),
        other => ErrorCode::for_segment(other, "04"),
    }
}
