//! # DTO Identity
//!
//! A DTO is identified by an opaque [`DtoId`], never by its declared name.
//! Derived DTOs routinely share names with their bases (or with each
//! other), so every lookup in the registry, every recursion guard, and the
//! OpenAPI deduplication map key on the identity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identity of a declared or derived DTO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DtoId(pub Uuid);

impl DtoId {
    /// Generate a fresh random identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DtoId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DtoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dto:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_are_distinct() {
        assert_ne!(DtoId::new(), DtoId::new());
    }

    #[test]
    fn display_is_prefixed() {
        let id = DtoId::new();
        let rendered = id.to_string();
        assert!(rendered.starts_with("dto:"));
        assert!(rendered.ends_with(&id.as_uuid().to_string()));
    }
}
