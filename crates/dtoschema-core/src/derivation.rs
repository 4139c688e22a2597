//! # DTO Derivation Engine
//!
//! `omit`, `pick`, `partial`, and `merge` read registered field maps and
//! register a brand-new DTO under a fresh [`DtoId`]. Sources are never
//! mutated: every derived DTO owns deep copies of the [`FieldMeta`] values it
//! was built from, so a derived DTO is frozen at derivation time.
//!
//! ## Laws
//!
//! For a base DTO `B` and a key set `K`:
//!
//! - `fields(pick(B, K)) ∪ fields(omit(B, K)) = fields(B)` and the two are
//!   disjoint.
//! - `partial(B)` has the keys of `B`, all optional, with identical schemas.
//! - `merge([A, B])` has `keys(A) ∪ keys(B)`; on a clash `B`'s field wins.

use indexmap::IndexMap;

use crate::dto::{DtoMeta, FieldMeta};
use crate::error::DerivationError;
use crate::identity::DtoId;
use crate::node::{SchemaKind, SchemaNode};
use crate::registry::DtoRegistry;

/// Naming and shape options of a derived DTO.
///
/// Unset fields are inherited: the name defaults to `Omit<Base>`,
/// `Pick<Base>`, `Partial<Base>`, or the concatenated base names for a
/// merge; description and `additional_properties` come from the (first)
/// base.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivationOptions {
    pub name: Option<String>,
    pub description: Option<String>,
    pub additional_properties: Option<bool>,
}

impl DerivationOptions {
    /// Options that only set the derived DTO's name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn additional_properties(mut self, allowed: bool) -> Self {
        self.additional_properties = Some(allowed);
        self
    }
}

/// Constraint adjustments applied to an existing field.
///
/// Constraints that do not apply to the field's kind are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldPatch {
    pub optional: Option<bool>,
    pub nullable: Option<bool>,
    pub description: Option<String>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<String>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
}

impl FieldPatch {
    fn apply(&self, field: &mut FieldMeta) {
        if let Some(optional) = self.optional {
            field.optional = optional;
            field.schema.attrs.optional = optional;
        }
        if let Some(nullable) = self.nullable {
            field.schema.attrs.nullable = nullable;
        }
        if let Some(description) = &self.description {
            field.description = Some(description.clone());
            field.schema.attrs.description = Some(description.clone());
        }
        match &mut field.schema.kind {
            SchemaKind::String(c) => {
                c.min_length = self.min_length.or(c.min_length);
                c.max_length = self.max_length.or(c.max_length);
                if self.pattern.is_some() {
                    c.pattern = self.pattern.clone();
                }
            }
            SchemaKind::Number(c) | SchemaKind::Integer(c) => {
                c.minimum = self.minimum.or(c.minimum);
                c.maximum = self.maximum.or(c.maximum);
            }
            SchemaKind::Array(a) => {
                a.min_items = self.min_items.or(a.min_items);
                a.max_items = self.max_items.or(a.max_items);
            }
            _ => {}
        }
    }
}

/// Per-field override used by [`omit`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOverride {
    /// Replace the field wholesale; optionality follows the node.
    Replace(SchemaNode),
    /// Adjust individual constraints of the existing field.
    Patch(FieldPatch),
}

/// Overrides keyed by field name, applied in order.
pub type Overrides = IndexMap<String, FieldOverride>;

/// Base fields minus `excluded`, then `overrides` applied.
///
/// A `Replace` for a key that is not present after exclusion adds the
/// field; a `Patch` for such a key is ignored.
///
/// # Errors
///
/// Returns [`DerivationError::UnknownDto`] if `base` is not registered.
pub fn omit<I, S>(
    registry: &DtoRegistry,
    base: DtoId,
    excluded: I,
    overrides: Option<&Overrides>,
    options: DerivationOptions,
) -> Result<DtoId, DerivationError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let source = lookup(registry, "omit", base)?;
    let mut fields = source.fields.clone();
    for key in excluded {
        fields.shift_remove(key.as_ref());
    }

    for (key, override_) in overrides.into_iter().flatten() {
        match override_ {
            FieldOverride::Replace(node) => {
                fields.insert(key.clone(), FieldMeta::new(node.clone()));
            }
            FieldOverride::Patch(patch) => {
                if let Some(field) = fields.get_mut(key) {
                    patch.apply(field);
                }
            }
        }
    }

    let meta = derived(&source, format!("Omit{}", source.name), fields, options);
    Ok(finish(registry, "omit", meta))
}

/// The base fields named in `included`, in `included` order.
///
/// Keys the base does not have are ignored.
///
/// # Errors
///
/// Returns [`DerivationError::UnknownDto`] if `base` is not registered.
pub fn pick<I, S>(
    registry: &DtoRegistry,
    base: DtoId,
    included: I,
    options: DerivationOptions,
) -> Result<DtoId, DerivationError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let source = lookup(registry, "pick", base)?;
    let mut fields = IndexMap::new();
    for key in included {
        let key = key.as_ref();
        if let Some(field) = source.fields.get(key) {
            fields.insert(key.to_string(), field.clone());
        }
    }

    let meta = derived(&source, format!("Pick{}", source.name), fields, options);
    Ok(finish(registry, "pick", meta))
}

/// Every base field, forced optional. Schemas are copied unchanged.
///
/// # Errors
///
/// Returns [`DerivationError::UnknownDto`] if `base` is not registered.
pub fn partial(
    registry: &DtoRegistry,
    base: DtoId,
    options: DerivationOptions,
) -> Result<DtoId, DerivationError> {
    let source = lookup(registry, "partial", base)?;
    let fields = source
        .fields
        .iter()
        .map(|(key, field)| {
            let mut field = field.clone();
            field.optional = true;
            (key.clone(), field)
        })
        .collect();

    let meta = derived(&source, format!("Partial{}", source.name), fields, options);
    Ok(finish(registry, "partial", meta))
}

/// Left-to-right union of the bases' fields; later bases win on a clash.
///
/// An empty `bases` list yields an empty DTO named `Merged`.
///
/// # Errors
///
/// Returns [`DerivationError::UnknownDto`] for the first unregistered base.
pub fn merge(
    registry: &DtoRegistry,
    bases: &[DtoId],
    options: DerivationOptions,
) -> Result<DtoId, DerivationError> {
    let sources = bases
        .iter()
        .map(|id| lookup(registry, "merge", *id))
        .collect::<Result<Vec<_>, _>>()?;

    let mut fields: IndexMap<String, FieldMeta> = IndexMap::new();
    let mut name = String::new();
    let mut description = None;
    let mut additional_properties = None;
    for source in &sources {
        for (key, field) in &source.fields {
            // A clash keeps the first position but takes the later field.
            fields.insert(key.clone(), field.clone());
        }
        name.push_str(&source.name);
        if description.is_none() {
            description = source.description.clone();
        }
        if source.additional_properties.is_some() {
            additional_properties = source.additional_properties;
        }
    }
    if name.is_empty() {
        name.push_str("Merged");
    }

    let meta = DtoMeta {
        name: options.name.unwrap_or(name),
        description: options.description.or(description),
        fields,
        additional_properties: options.additional_properties.or(additional_properties),
    };
    Ok(finish(registry, "merge", meta))
}

fn lookup(
    registry: &DtoRegistry,
    operation: &'static str,
    id: DtoId,
) -> Result<std::sync::Arc<DtoMeta>, DerivationError> {
    registry
        .get(&id)
        .ok_or(DerivationError::UnknownDto { operation, id })
}

fn derived(
    source: &DtoMeta,
    default_name: String,
    fields: IndexMap<String, FieldMeta>,
    options: DerivationOptions,
) -> DtoMeta {
    DtoMeta {
        name: options.name.unwrap_or(default_name),
        description: options.description.or_else(|| source.description.clone()),
        fields,
        additional_properties: options
            .additional_properties
            .or(source.additional_properties),
    }
}

fn finish(registry: &DtoRegistry, operation: &'static str, meta: DtoMeta) -> DtoId {
    let name = meta.name.clone();
    let field_count = meta.fields.len();
    let id = registry.declare(meta);
    tracing::debug!(operation, %id, %name, fields = field_count, "derived DTO");
    id
}
