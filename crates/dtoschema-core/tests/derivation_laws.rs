//! # Derivation Algebra Properties
//!
//! Property tests over randomly generated DTOs:
//!
//! 1. `pick(B, K)` and `omit(B, K)` partition the fields of `B`.
//! 2. `partial(B)` keeps every key and schema of `B`, all optional.
//! 3. `merge([A, B])` has the union of keys; `B` wins every clash.

use std::collections::BTreeSet;

use dtoschema_core::derivation::{merge, omit, partial, pick};
use dtoschema_core::{node, DerivationOptions, DtoBuilder, DtoId, DtoRegistry, SchemaNode};
use proptest::prelude::*;

fn field_schema() -> impl Strategy<Value = SchemaNode> {
    prop_oneof![
        Just(node::string()),
        Just(node::integer().minimum(0.0)),
        Just(node::boolean()),
        Just(node::email().nullable()),
        Just(node::array(node::number())),
        Just(node::string().optional()),
    ]
}

fn fields() -> impl Strategy<Value = Vec<(String, SchemaNode)>> {
    prop::collection::btree_map("[a-z]{1,6}", field_schema(), 0..10)
        .prop_map(|m| m.into_iter().collect())
}

fn register(registry: &DtoRegistry, name: &str, fields: &[(String, SchemaNode)]) -> DtoId {
    fields
        .iter()
        .fold(DtoBuilder::new(name), |builder, (key, schema)| {
            builder.field(key.clone(), schema.clone())
        })
        .register(registry)
}

fn keys(registry: &DtoRegistry, id: &DtoId) -> BTreeSet<String> {
    registry
        .get(id)
        .map(|meta| meta.fields.keys().cloned().collect())
        .unwrap_or_default()
}

proptest! {
    #[test]
    fn pick_and_omit_partition_the_base(
        base_fields in fields(),
        selection in prop::collection::btree_set("[a-z]{1,6}", 0..6),
    ) {
        let registry = DtoRegistry::new();
        let base = register(&registry, "Base", &base_fields);

        let picked = pick(&registry, base, &selection, DerivationOptions::default()).unwrap();
        let omitted = omit(&registry, base, &selection, None, DerivationOptions::default()).unwrap();

        let base_keys = keys(&registry, &base);
        let picked_keys = keys(&registry, &picked);
        let omitted_keys = keys(&registry, &omitted);

        prop_assert!(picked_keys.is_disjoint(&omitted_keys));
        let union: BTreeSet<String> = picked_keys.union(&omitted_keys).cloned().collect();
        prop_assert_eq!(union, base_keys);
    }

    #[test]
    fn partial_keeps_schemas_and_makes_everything_optional(base_fields in fields()) {
        let registry = DtoRegistry::new();
        let base = register(&registry, "Base", &base_fields);
        let derived = partial(&registry, base, DerivationOptions::default()).unwrap();

        let source = registry.get(&base).unwrap();
        let meta = registry.get(&derived).unwrap();
        prop_assert_eq!(meta.fields.len(), source.fields.len());
        for (key, field) in &meta.fields {
            prop_assert!(field.is_optional());
            prop_assert_eq!(&field.schema, &source.fields[key].schema);
        }
    }

    #[test]
    fn merge_prefers_the_later_base(a_fields in fields(), b_fields in fields()) {
        let registry = DtoRegistry::new();
        let a = register(&registry, "A", &a_fields);
        let b = register(&registry, "B", &b_fields);
        let merged = merge(&registry, &[a, b], DerivationOptions::default()).unwrap();

        let a_meta = registry.get(&a).unwrap();
        let b_meta = registry.get(&b).unwrap();
        let meta = registry.get(&merged).unwrap();

        let expected: BTreeSet<String> = keys(&registry, &a).union(&keys(&registry, &b)).cloned().collect();
        prop_assert_eq!(keys(&registry, &merged), expected);
        for (key, field) in &meta.fields {
            let winner = b_meta.fields.get(key).or_else(|| a_meta.fields.get(key));
            prop_assert_eq!(Some(field), winner);
        }
    }
}

#[test]
fn derived_dtos_are_frozen_copies() {
    let registry = DtoRegistry::new();
    let base = DtoBuilder::new("Post")
        .field("title", node::string())
        .field("body", node::string())
        .register(&registry);
    let picked = pick(&registry, base, ["title"], DerivationOptions::default()).unwrap();
    let picked_again = pick(&registry, base, ["title"], DerivationOptions::default()).unwrap();

    assert_ne!(picked, picked_again);
    assert_eq!(
        registry.get(&picked).unwrap().fields,
        registry.get(&picked_again).unwrap().fields
    );
    assert_eq!(registry.len(), 3);
}
