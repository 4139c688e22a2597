//! # Validation Engine
//!
//! Recursively checks a runtime [`Value`] against a [`SchemaNode`] and
//! returns every issue found, each qualified with the path of the offending
//! value.
//!
//! ## Algorithm
//!
//! 1. A `null` value on a nullable node is accepted.
//! 2. An absent value on an optional node is accepted; on any other node it
//!    is reported as `"is required"`.
//! 3. Otherwise the check dispatches on the node's kind. Containers recurse
//!    into their children; `ref` nodes resolve through the registry.
//!
//! ## Recursion
//!
//! Self-referential DTOs are legal. While a `ref` is being expanded for a
//! particular value, the pair (identity, value address) sits on a guard
//! stack; re-entering the same pair is treated as valid. Independently, a
//! depth limit from [`ValidationConfig`] bounds the walk on adversarially
//! deep input.

use std::collections::HashMap;

use dtoschema_core::{
    DtoId, DtoRegistry, NumberConstraints, SchemaKind, SchemaNode, StringConstraints,
    StringFormat, Value,
};
use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::format::{format_message, matches_format};
use crate::issue::{codes, join_index, join_key, ValidationIssue, ValidationIssues};

/// Default nesting limit.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Tunables of the validation walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationConfig {
    /// Deepest nesting level checked before giving up with an issue.
    pub max_depth: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Validates values against schema nodes resolved through one registry.
///
/// Compiled `pattern` regexes are cached per validator.
#[derive(Debug)]
pub struct Validator<'r> {
    registry: &'r DtoRegistry,
    config: ValidationConfig,
    patterns: Mutex<HashMap<String, Option<Regex>>>,
}

/// Per-call walk state.
struct Walk<'v> {
    issues: Vec<ValidationIssue>,
    expanding: Vec<(DtoId, &'v Value)>,
}

impl<'v> Walk<'v> {
    fn new() -> Self {
        Self {
            issues: Vec::new(),
            expanding: Vec::new(),
        }
    }

    fn report(&mut self, path: &str, message: impl Into<String>, code: &str) {
        self.issues.push(ValidationIssue::new(path, message, code));
    }

    fn is_expanding(&self, id: DtoId, value: &Value) -> bool {
        self.expanding
            .iter()
            .any(|(seen, v)| *seen == id && std::ptr::eq(*v, value))
    }
}

impl<'r> Validator<'r> {
    pub fn new(registry: &'r DtoRegistry) -> Self {
        Self::with_config(registry, ValidationConfig::default())
    }

    pub fn with_config(registry: &'r DtoRegistry, config: ValidationConfig) -> Self {
        Self {
            registry,
            config,
            patterns: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &'r DtoRegistry {
        self.registry
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Issues for a present value.
    pub fn validate(&self, value: &Value, schema: &SchemaNode) -> Vec<ValidationIssue> {
        self.validate_slot(Some(value), schema)
    }

    /// Issues for a possibly-absent value.
    pub fn validate_slot(&self, value: Option<&Value>, schema: &SchemaNode) -> Vec<ValidationIssue> {
        let mut walk = Walk::new();
        self.visit(value, schema, "", 0, &mut walk);
        walk.issues
    }

    /// `Ok(())` if the value conforms, otherwise every issue.
    pub fn check(
        &self,
        value: Option<&Value>,
        schema: &SchemaNode,
    ) -> Result<(), ValidationIssues> {
        ValidationIssues::from(self.validate_slot(value, schema)).into_result()
    }

    /// Whether the value conforms, without collecting messages.
    pub fn is_valid(&self, value: &Value, schema: &SchemaNode) -> bool {
        self.validate(value, schema).is_empty()
    }

    fn visit<'v>(
        &self,
        value: Option<&'v Value>,
        node: &SchemaNode,
        path: &str,
        depth: usize,
        walk: &mut Walk<'v>,
    ) {
        let value = match value {
            None if node.attrs.optional => return,
            None => {
                walk.report(path, "is required", codes::REQUIRED);
                return;
            }
            Some(Value::Null) if node.attrs.nullable => return,
            Some(value) => value,
        };
        if depth > self.config.max_depth {
            walk.report(path, "exceeds maximum nesting depth", codes::MAX_DEPTH);
            return;
        }

        match &node.kind {
            SchemaKind::String(c) => self.check_string(value, c, path, walk),
            SchemaKind::Number(c) => match value {
                Value::Number(n) if n.is_finite() => check_bounds(*n, c, path, walk),
                _ => walk.report(path, "must be a number", codes::TYPE),
            },
            SchemaKind::Integer(c) => match value {
                Value::Number(n) if n.is_finite() && n.fract() == 0.0 => {
                    check_bounds(*n, c, path, walk)
                }
                _ => walk.report(path, "must be an integer", codes::TYPE),
            },
            SchemaKind::Boolean => {
                if !matches!(value, Value::Bool(_)) {
                    walk.report(path, "must be a boolean", codes::TYPE);
                }
            }
            SchemaKind::Null => {
                if !value.is_null() {
                    walk.report(path, "must be null", codes::TYPE);
                }
            }
            SchemaKind::Literal(expected) => {
                if !value.matches_json(expected) {
                    walk.report(path, one_of(std::slice::from_ref(expected)), codes::ENUM);
                }
            }
            SchemaKind::Enum(allowed) => {
                if !allowed.iter().any(|candidate| value.matches_json(candidate)) {
                    walk.report(path, one_of(allowed), codes::ENUM);
                }
            }
            SchemaKind::Array(array) => match value {
                Value::Array(items) => {
                    if let Some(min) = array.min_items.filter(|min| items.len() < *min) {
                        walk.report(
                            path,
                            format!("must contain at least {min} items"),
                            codes::MIN_ITEMS,
                        );
                    }
                    if let Some(max) = array.max_items.filter(|max| items.len() > *max) {
                        walk.report(
                            path,
                            format!("must contain at most {max} items"),
                            codes::MAX_ITEMS,
                        );
                    }
                    for (i, item) in items.iter().enumerate() {
                        self.visit(Some(item), &array.items, &join_index(path, i), depth + 1, walk);
                    }
                }
                _ => walk.report(path, "must be an array", codes::TYPE),
            },
            SchemaKind::Object(object) => match value {
                Value::Object(map) => {
                    for (key, property) in &object.properties {
                        self.visit(map.get(key), property, &join_key(path, key), depth + 1, walk);
                    }
                    if object.additional_properties == Some(false) {
                        for key in map.keys() {
                            if !object.properties.contains_key(key) {
                                walk.report(
                                    &join_key(path, key),
                                    "is not allowed",
                                    codes::ADDITIONAL_PROPERTY,
                                );
                            }
                        }
                    }
                }
                _ => walk.report(path, "must be an object", codes::TYPE),
            },
            SchemaKind::Record(values) => match value {
                Value::Object(map) => {
                    for (key, item) in map {
                        self.visit(Some(item), values, &join_key(path, key), depth + 1, walk);
                    }
                }
                _ => walk.report(path, "must be an object", codes::TYPE),
            },
            SchemaKind::Union(union) => {
                let matched = union.members.iter().any(|member| {
                    let mut trial = Walk {
                        issues: Vec::new(),
                        expanding: walk.expanding.clone(),
                    };
                    self.visit(Some(value), member, path, depth + 1, &mut trial);
                    trial.issues.is_empty()
                });
                if !matched {
                    let message = match &union.name {
                        Some(name) => format!("must match one of {name}"),
                        None => "must match one of the allowed schemas".to_string(),
                    };
                    walk.report(path, message, codes::UNION);
                }
            }
            SchemaKind::Ref(id) => self.check_ref(*id, value, path, depth, walk),
        }
    }

    fn check_ref<'v>(
        &self,
        id: DtoId,
        value: &'v Value,
        path: &str,
        depth: usize,
        walk: &mut Walk<'v>,
    ) {
        let Some(meta) = self.registry.get(&id) else {
            tracing::warn!(%id, path, "schema references an unregistered DTO");
            walk.report(path, "references an unknown schema", codes::UNKNOWN_SCHEMA);
            return;
        };
        if walk.is_expanding(id, value) {
            return;
        }
        walk.expanding.push((id, value));
        self.visit(Some(value), &meta.to_object_schema(), path, depth + 1, walk);
        walk.expanding.pop();
    }

    fn check_string(&self, value: &Value, c: &StringConstraints, path: &str, walk: &mut Walk<'_>) {
        let s = match value {
            Value::String(s) => s,
            Value::Timestamp(ts) => {
                match c.format {
                    Some(format @ (StringFormat::Date | StringFormat::DateTime)) => {
                        if !ts.is_valid() {
                            walk.report(path, format_message(format), codes::FORMAT);
                        }
                    }
                    _ => walk.report(path, "must be a string", codes::TYPE),
                }
                return;
            }
            Value::Bytes(_) if c.format == Some(StringFormat::Byte) => return,
            _ => {
                walk.report(path, "must be a string", codes::TYPE);
                return;
            }
        };

        if let Some(format) = c.format {
            if !matches_format(format, s) {
                walk.report(path, format_message(format), codes::FORMAT);
            }
        }
        let length = s.chars().count();
        if let Some(min) = c.min_length.filter(|min| length < *min) {
            walk.report(
                path,
                format!("must be at least {min} characters"),
                codes::MIN_LENGTH,
            );
        }
        if let Some(max) = c.max_length.filter(|max| length > *max) {
            walk.report(
                path,
                format!("must be at most {max} characters"),
                codes::MAX_LENGTH,
            );
        }
        if let Some(pattern) = &c.pattern {
            if !self.pattern_matches(pattern, s) {
                walk.report(path, format!("must match pattern {pattern}"), codes::PATTERN);
            }
        }
    }

    /// An invalid pattern never matches.
    fn pattern_matches(&self, pattern: &str, s: &str) -> bool {
        let mut cache = self.patterns.lock();
        let compiled = cache.entry(pattern.to_string()).or_insert_with(|| {
            let compiled = Regex::new(pattern);
            if let Err(err) = &compiled {
                tracing::warn!(pattern, error = %err, "invalid string pattern");
            }
            compiled.ok()
        });
        compiled.as_ref().is_some_and(|re| re.is_match(s))
    }
}

fn check_bounds(n: f64, c: &NumberConstraints, path: &str, walk: &mut Walk<'_>) {
    if let Some(min) = c.minimum.filter(|min| n < *min) {
        walk.report(path, format!("must be >= {min}"), codes::MINIMUM);
    }
    if let Some(max) = c.maximum.filter(|max| n > *max) {
        walk.report(path, format!("must be <= {max}"), codes::MAXIMUM);
    }
}

fn one_of(allowed: &[Json]) -> String {
    let rendered: Vec<String> = allowed.iter().map(Json::to_string).collect();
    format!("must be one of: {}", rendered.join(", "))
}

/// Validate a present value with a default-configured [`Validator`].
pub fn validate(registry: &DtoRegistry, value: &Value, schema: &SchemaNode) -> Vec<ValidationIssue> {
    Validator::new(registry).validate(value, schema)
}

/// Validate a possibly-absent value with a default-configured [`Validator`].
pub fn validate_slot(
    registry: &DtoRegistry,
    value: Option<&Value>,
    schema: &SchemaNode,
) -> Vec<ValidationIssue> {
    Validator::new(registry).validate_slot(value, schema)
}
