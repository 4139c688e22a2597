//! # Error Types
//!
//! Errors raised by the registry and the derivation engine. Validation
//! problems are never errors: they are returned as data by the validation
//! engine so that callers can aggregate them.

use thiserror::Error;

use crate::identity::DtoId;

/// Top-level error type for `dtoschema-core`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Registry write rejected.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// A derivation could not be computed.
    #[error("derivation error: {0}")]
    Derivation(#[from] DerivationError),
}

/// Error raised by [`crate::DtoRegistry`] writes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The identity already has metadata; entries are write-once.
    #[error("{id} is already registered as '{existing}'")]
    AlreadyRegistered {
        /// The identity that was written twice.
        id: DtoId,
        /// Name of the DTO already stored under `id`.
        existing: String,
    },
}

/// Error raised by the omit/pick/partial/merge operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DerivationError {
    /// A base DTO has no metadata in the registry.
    #[error("cannot {operation} unknown DTO {id}")]
    UnknownDto {
        /// The derivation that was attempted ("omit", "pick", ...).
        operation: &'static str,
        /// The identity that could not be resolved.
        id: DtoId,
    },
}
