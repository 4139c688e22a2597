//! # Error Types
//!
//! Coercion failures are not errors (they yield `None`). The only
//! fallible operations in this crate are decoding a query string and
//! parsing a filter path.

use thiserror::Error;

/// A query string could not be decoded.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("malformed query string: {0}")]
    Malformed(#[from] serde_urlencoded::de::Error),
}

/// A filter path is not well-formed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterPathError {
    #[error("filter path is empty")]
    Empty,

    #[error("filter path '{path}' has an empty segment at position {index}")]
    EmptySegment { path: String, index: usize },

    #[error("filter path '{path}' has an invalid segment '{segment}'")]
    InvalidSegment { path: String, segment: String },

    /// Quantifiers must sit between a relation and a field.
    #[error("filter path '{path}' has quantifier '{quantifier}' at position {index}, which must sit between a relation and a field")]
    MisplacedQuantifier {
        path: String,
        quantifier: String,
        index: usize,
    },
}
