//! # dtoschema-validate — Validation and Serialization Engines
//!
//! Two recursive walks over the schema node graph:
//!
//! - [`Validator`] checks an untrusted [`dtoschema_core::Value`] against a
//!   [`dtoschema_core::SchemaNode`] and returns path-qualified
//!   [`ValidationIssue`]s. Validation problems are data, never errors.
//! - [`Serializer`] rewrites a trusted value into its wire shape (binary to
//!   base64, timestamps to ISO strings) and never fails.
//!
//! Both resolve `ref` nodes lazily against a [`dtoschema_core::DtoRegistry`]
//! and terminate on self-referential DTOs.
//!
//! ## Crate Policy
//!
//! - Depends only on `dtoschema-core`.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Safe on arbitrary input: recursion is bounded by
//!   [`ValidationConfig::max_depth`].

pub mod format;
pub mod issue;
pub mod serialize;
pub mod validate;

pub use issue::{codes, ValidationIssue, ValidationIssues};
pub use serialize::{serialize_response, Serializer};
pub use validate::{validate, validate_slot, ValidationConfig, Validator, DEFAULT_MAX_DEPTH};
