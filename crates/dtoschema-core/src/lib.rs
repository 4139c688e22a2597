//! # dtoschema-core — Foundational Types for dtoschema
//!
//! This crate is the bedrock of the dtoschema workspace. It defines the
//! runtime description of a DTO's shape and the store every other engine
//! resolves references against. Every other crate in the workspace depends
//! on `dtoschema-core`; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Schema nodes are plain data.** [`SchemaNode`] is an immutable tagged
//!    union built by free constructors in [`node`]. Nothing is checked at
//!    construction time.
//!
//! 2. **Identity, not names.** DTOs are keyed by [`DtoId`]. Two DTOs may
//!    share a name; they never share an identity. A `ref` node stores only
//!    the identity and is resolved lazily, which is what makes recursive
//!    DTOs expressible.
//!
//! 3. **An explicit registry.** [`DtoRegistry`] is a value the application
//!    owns and passes around, not a process-global. It is written once per
//!    identity and read many times.
//!
//! 4. **Derivation copies.** [`derivation::omit`], [`derivation::pick`],
//!    [`derivation::partial`], and [`derivation::merge`] register new DTOs
//!    built from deep copies of their sources.
//!
//! 5. **Absent is not null.** The runtime [`Value`] has a `Null` variant;
//!    an absent value is `None` at the slot where it would have been.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `dtoschema-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod derivation;
pub mod dto;
pub mod error;
pub mod identity;
pub mod node;
pub mod registry;
pub mod temporal;
pub mod value;

// Re-export primary types for ergonomic imports.
pub use derivation::{DerivationOptions, FieldOverride, FieldPatch, Overrides};
pub use dto::{DtoBuilder, DtoMeta, FieldMeta};
pub use error::{DerivationError, RegistryError, SchemaError};
pub use identity::DtoId;
pub use node::{
    ArrayNode, NodeAttrs, NumberConstraints, NumberOptions, ObjectNode, SchemaKind, SchemaNode,
    StringConstraints, StringFormat, StringOptions, UnionNode,
};
pub use registry::DtoRegistry;
pub use temporal::Timestamp;
pub use value::Value;
