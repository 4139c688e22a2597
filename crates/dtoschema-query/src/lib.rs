//! # dtoschema-query — Coercion Layer
//!
//! HTTP query and path values are strings, possibly repeated. This crate
//! turns them into typed values:
//!
//! - [`coerce`]: single-value parsers (`parse_integer`, `parse_boolean`,
//!   `parse_id`, ...) under explicit policies. They return `None` on
//!   anything they cannot recover from.
//! - [`params`]: schema-driven coercion of a whole query map into an object
//!   [`dtoschema_core::Value`] ready for validation.
//! - [`filter`]: the filter-path mini-language (`posts.some.title`) that
//!   turns validated query parameters into a nested filter object.
//!
//! ## Crate Policy
//!
//! - Depends on `dtoschema-core` and `dtoschema-validate` only.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod coerce;
pub mod error;
pub mod filter;
pub mod params;
pub mod raw;

pub use coerce::{
    normalize_single, parse_boolean, parse_date, parse_date_time, parse_enum, parse_id,
    parse_integer, parse_list, parse_number, parse_string, parse_uuid, BooleanOptions,
    EmptyPolicy, NormalizeOptions, NumberPolicy, StringPolicy,
};
pub use error::{FilterPathError, QueryError};
pub use filter::{
    build_filter, parse_filters, FilterDef, FilterOperator, FilterPath, PathSegment, Quantifier,
};
pub use params::{coerce_params, coerce_value};
pub use raw::{QueryMap, RawParam};
