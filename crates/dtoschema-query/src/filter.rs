//! # Filter Paths
//!
//! A filter definition binds a query parameter to a dotted path into the
//! data model and an operator. `posts.some.title` with `contains` and the
//! value `"Hello"` builds
//!
//! ```json
//! { "posts": { "some": { "title": { "contains": "Hello" } } } }
//! ```
//!
//! The quantifiers `some`, `every`, and `none` may only sit between a
//! relation segment and a field segment.

use std::fmt;
use std::str::FromStr;

use dtoschema_core::{DtoRegistry, SchemaNode, Value};
use dtoschema_validate::{ValidationIssues, Validator};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::FilterPathError;
use crate::params::coerce_value;
use crate::raw::QueryMap;

/// Relation quantifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quantifier {
    Some,
    Every,
    None,
}

impl Quantifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Some => "some",
            Self::Every => "every",
            Self::None => "none",
        }
    }

    fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "some" => Some(Self::Some),
            "every" => Some(Self::Every),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Field(String),
    Quantifier(Quantifier),
}

impl PathSegment {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Field(name) => name,
            Self::Quantifier(q) => q.as_str(),
        }
    }
}

/// A parsed dotted filter path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterPath {
    segments: Vec<PathSegment>,
}

impl FilterPath {
    /// Parse and check a dotted path.
    ///
    /// # Errors
    ///
    /// Returns a [`FilterPathError`] for an empty path, an empty or
    /// non-identifier segment, or a quantifier that is first, last, or
    /// follows another quantifier.
    pub fn parse(path: &str) -> Result<Self, FilterPathError> {
        if path.is_empty() {
            return Err(FilterPathError::Empty);
        }
        let parts: Vec<&str> = path.split('.').collect();
        let last = parts.len() - 1;
        let mut segments = Vec::with_capacity(parts.len());
        for (index, part) in parts.iter().enumerate() {
            if part.is_empty() {
                return Err(FilterPathError::EmptySegment {
                    path: path.to_string(),
                    index,
                });
            }
            if let Some(quantifier) = Quantifier::from_segment(part) {
                let after_quantifier =
                    matches!(segments.last(), Some(PathSegment::Quantifier(_)));
                if index == 0 || index == last || after_quantifier {
                    return Err(FilterPathError::MisplacedQuantifier {
                        path: path.to_string(),
                        quantifier: part.to_string(),
                        index,
                    });
                }
                segments.push(PathSegment::Quantifier(quantifier));
                continue;
            }
            if !is_identifier(part) {
                return Err(FilterPathError::InvalidSegment {
                    path: path.to_string(),
                    segment: part.to_string(),
                });
            }
            segments.push(PathSegment::Field(part.to_string()));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }
}

impl FromStr for FilterPath {
    type Err = FilterPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FilterPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.segments.iter().map(PathSegment::as_str).collect();
        f.write_str(&joined.join("."))
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Comparison applied at the end of a filter path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    Equals,
    Not,
    In,
    NotIn,
    Lt,
    Lte,
    Gt,
    Gte,
    Contains,
    StartsWith,
    EndsWith,
}

impl FilterOperator {
    /// The operator key in a built filter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::Not => "not",
            Self::In => "in",
            Self::NotIn => "notIn",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Contains => "contains",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
        }
    }
}

/// Binds a query parameter to a filter path.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterDef {
    /// Query parameter name.
    pub param: String,
    pub path: FilterPath,
    pub operator: FilterOperator,
    /// Schema the parameter is coerced and validated against.
    pub schema: SchemaNode,
}

impl FilterDef {
    /// # Errors
    ///
    /// Returns a [`FilterPathError`] if `path` does not parse.
    pub fn new(
        param: impl Into<String>,
        path: &str,
        operator: FilterOperator,
        schema: SchemaNode,
    ) -> Result<Self, FilterPathError> {
        Ok(Self {
            param: param.into(),
            path: FilterPath::parse(path)?,
            operator,
            schema,
        })
    }
}

/// Nest `{operator: value}` under every segment of `path`.
///
/// `null` and empty-string values produce no filter.
pub fn build_filter(path: &FilterPath, operator: FilterOperator, value: Value) -> Option<Value> {
    match &value {
        Value::Null => return None,
        Value::String(s) if s.is_empty() => return None,
        _ => {}
    }
    let leaf = Value::object([(operator.as_str(), value)]);
    Some(
        path.segments
            .iter()
            .rev()
            .fold(leaf, |inner, segment| Value::object([(segment.as_str(), inner)])),
    )
}

/// Coerce, validate, and combine every filter whose parameter is present.
///
/// Each parameter is validated against its own schema; issues are reported
/// under the parameter name. Parameters that are absent or blank are
/// skipped. Built filters are deep-merged in definition order.
///
/// # Errors
///
/// Returns every validation issue when any parameter fails its schema.
pub fn parse_filters(
    defs: &[FilterDef],
    query: &QueryMap,
    registry: &DtoRegistry,
) -> Result<Option<Value>, ValidationIssues> {
    let validator = Validator::new(registry);
    let mut issues = ValidationIssues::new();
    let mut merged: IndexMap<String, Value> = IndexMap::new();

    for def in defs {
        let Some(raw) = query.get(&def.param) else {
            continue;
        };
        if raw.values().iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        let value = coerce_value(raw, &def.schema, registry);
        let found = validator.validate(&value, &def.schema);
        if !found.is_empty() {
            issues.extend(found.into_iter().map(|issue| issue.under(&def.param)));
            continue;
        }
        if let Some(Value::Object(filter)) = build_filter(&def.path, def.operator, value) {
            deep_merge(&mut merged, filter);
        }
    }

    if !issues.is_empty() {
        tracing::debug!(count = issues.len(), "rejected filter parameters");
        return Err(issues);
    }
    Ok((!merged.is_empty()).then_some(Value::Object(merged)))
}

fn deep_merge(target: &mut IndexMap<String, Value>, source: IndexMap<String, Value>) {
    for (key, value) in source {
        let Value::Object(incoming) = value else {
            target.insert(key, value);
            continue;
        };
        if let Some(Value::Object(existing)) = target.get_mut(&key) {
            deep_merge(existing, incoming);
            continue;
        }
        target.insert(key, Value::Object(incoming));
    }
}
