//! # Coercion Layer
//!
//! Converts raw HTTP inputs into typed primitives under explicit policies.
//! Every function takes `Option<&RawParam>` (absent keys are `None`) and
//! returns `None` on input it cannot recover from. Nothing here panics.
//!
//! ## Normalization
//!
//! All parsers start from [`normalize_single`]: the first value of a
//! repeated key is used, surrounding whitespace is trimmed (unless
//! disabled), and an empty result is rejected (unless allowed).

use dtoschema_core::temporal::{is_iso_date, is_iso_date_time};
use dtoschema_core::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::raw::RawParam;

/// What to do with a value that is empty after trimming.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyPolicy {
    #[default]
    Reject,
    Allow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NormalizeOptions {
    pub trim: bool,
    pub empty: EmptyPolicy,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            trim: true,
            empty: EmptyPolicy::Reject,
        }
    }
}

/// Range policy for numeric parsing. Bounds are inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NumberPolicy {
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Pin out-of-range values to the nearest bound instead of rejecting.
    pub clamp: bool,
    #[serde(flatten)]
    pub normalize: NormalizeOptions,
}

impl NumberPolicy {
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn clamped(mut self) -> Self {
        self.clamp = true;
        self
    }

    fn apply(&self, n: f64) -> Option<f64> {
        let below = self.min.is_some_and(|min| n < min);
        let above = self.max.is_some_and(|max| n > max);
        if !(below || above) {
            return Some(n);
        }
        if !self.clamp {
            return None;
        }
        let mut pinned = n;
        if let Some(min) = self.min {
            pinned = pinned.max(min);
        }
        if let Some(max) = self.max {
            pinned = pinned.min(max);
        }
        Some(pinned)
    }
}

/// Accepted spellings of `true` and `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BooleanOptions {
    pub true_tokens: Vec<String>,
    pub false_tokens: Vec<String>,
    pub case_sensitive: bool,
    #[serde(flatten)]
    pub normalize: NormalizeOptions,
}

impl Default for BooleanOptions {
    fn default() -> Self {
        Self {
            true_tokens: vec!["true".to_string(), "1".to_string()],
            false_tokens: vec!["false".to_string(), "0".to_string()],
            case_sensitive: false,
            normalize: NormalizeOptions::default(),
        }
    }
}

/// Length policy for string parsing, in characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StringPolicy {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    #[serde(flatten)]
    pub normalize: NormalizeOptions,
}

/// The scalar (or first repeated value), trimmed and non-empty per
/// `options`.
pub fn normalize_single(raw: Option<&RawParam>, options: &NormalizeOptions) -> Option<String> {
    let value = raw?.first()?;
    let value = if options.trim { value.trim() } else { value };
    if value.is_empty() && options.empty == EmptyPolicy::Reject {
        return None;
    }
    Some(value.to_string())
}

/// A finite decimal number within the policy's range.
pub fn parse_number(raw: Option<&RawParam>, policy: &NumberPolicy) -> Option<f64> {
    let n = parse_finite(raw, &policy.normalize)?;
    policy.apply(n)
}

/// An exact integer within the policy's range.
pub fn parse_integer(raw: Option<&RawParam>, policy: &NumberPolicy) -> Option<i64> {
    let n = parse_finite(raw, &policy.normalize)?;
    if n.fract() != 0.0 || n.abs() > 9_007_199_254_740_991.0 {
        return None;
    }
    // Fractional bounds tighten to the integers they admit.
    let integral = NumberPolicy {
        min: policy.min.map(f64::ceil),
        max: policy.max.map(f64::floor),
        ..*policy
    };
    if let (Some(min), Some(max)) = (integral.min, integral.max) {
        if min > max {
            return None;
        }
    }
    integral.apply(n).map(|n| n as i64)
}

/// A boolean token.
pub fn parse_boolean(raw: Option<&RawParam>, options: &BooleanOptions) -> Option<bool> {
    let value = normalize_single(raw, &options.normalize)?;
    let matches = |token: &String| {
        if options.case_sensitive {
            *token == value
        } else {
            token.eq_ignore_ascii_case(&value)
        }
    };
    if options.true_tokens.iter().any(matches) {
        Some(true)
    } else if options.false_tokens.iter().any(matches) {
        Some(false)
    } else {
        None
    }
}

/// A positive integer identifier.
pub fn parse_id(raw: Option<&RawParam>) -> Option<i64> {
    parse_integer(raw, &NumberPolicy::default().min(1.0))
}

/// A string within the policy's length bounds.
pub fn parse_string(raw: Option<&RawParam>, policy: &StringPolicy) -> Option<String> {
    let value = normalize_single(raw, &policy.normalize)?;
    let length = value.chars().count();
    if policy.min_length.is_some_and(|min| length < min)
        || policy.max_length.is_some_and(|max| length > max)
    {
        return None;
    }
    Some(value)
}

/// Every value of a repeated key; a single value is split on commas.
///
/// Items are trimmed and empty items dropped per `options`.
pub fn parse_list(raw: Option<&RawParam>, options: &NormalizeOptions) -> Option<Vec<String>> {
    let items: Vec<&str> = match raw? {
        RawParam::Single(s) => s.split(',').collect(),
        RawParam::Many(values) => values.iter().map(String::as_str).collect(),
    };
    Some(
        items
            .into_iter()
            .map(|item| if options.trim { item.trim() } else { item })
            .filter(|item| !item.is_empty() || options.empty == EmptyPolicy::Allow)
            .map(str::to_string)
            .collect(),
    )
}

/// A hyphenated UUID.
pub fn parse_uuid(raw: Option<&RawParam>) -> Option<Uuid> {
    let value = normalize_single(raw, &NormalizeOptions::default())?;
    if value.len() != 36 {
        return None;
    }
    Uuid::parse_str(&value).ok()
}

/// A `YYYY-MM-DD` date, as midnight UTC.
pub fn parse_date(raw: Option<&RawParam>) -> Option<Timestamp> {
    let value = normalize_single(raw, &NormalizeOptions::default())?;
    is_iso_date(&value)
        .then(|| Timestamp::parse(&value))
        .filter(Timestamp::is_valid)
}

/// An RFC 3339 date-time, normalized to UTC.
pub fn parse_date_time(raw: Option<&RawParam>) -> Option<Timestamp> {
    let value = normalize_single(raw, &NormalizeOptions::default())?;
    is_iso_date_time(&value)
        .then(|| Timestamp::parse(&value))
        .filter(Timestamp::is_valid)
}

/// One of `allowed`, compared exactly.
pub fn parse_enum<S: AsRef<str>>(raw: Option<&RawParam>, allowed: &[S]) -> Option<String> {
    let value = normalize_single(raw, &NormalizeOptions::default())?;
    allowed
        .iter()
        .any(|candidate| candidate.as_ref() == value)
        .then_some(value)
}

fn parse_finite(raw: Option<&RawParam>, options: &NormalizeOptions) -> Option<f64> {
    let value = normalize_single(raw, options)?;
    let n: f64 = value.parse().ok()?;
    n.is_finite().then_some(n)
}
