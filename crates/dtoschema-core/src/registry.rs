//! # Metadata Registry
//!
//! [`DtoRegistry`] maps a [`DtoId`] to its [`DtoMeta`]. It is an explicit
//! value owned by the application (usually behind an `Arc`) and passed to
//! every engine that needs to resolve `ref` nodes, so tests can use a fresh
//! registry each.
//!
//! ## Write-once Discipline
//!
//! Each identity is written at most once and never mutated afterwards.
//! Declarations happen at startup; request-path code only reads. Reads take
//! an uncontended `parking_lot` read lock and hand out `Arc<DtoMeta>`
//! snapshots, so no lock is ever held while a caller walks a schema.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::dto::DtoMeta;
use crate::error::RegistryError;
use crate::identity::DtoId;
use crate::node::SchemaNode;

/// Store of DTO metadata keyed by identity.
#[derive(Debug, Default)]
pub struct DtoRegistry {
    entries: RwLock<HashMap<DtoId, Arc<DtoMeta>>>,
}

impl DtoRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `meta` under a caller-chosen identity.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AlreadyRegistered`] if `id` already has
    /// metadata. The stored entry is left untouched.
    pub fn register(&self, id: DtoId, meta: DtoMeta) -> Result<(), RegistryError> {
        let mut entries = self.entries.write();
        match entries.entry(id) {
            Entry::Occupied(existing) => Err(RegistryError::AlreadyRegistered {
                id,
                existing: existing.get().name.clone(),
            }),
            Entry::Vacant(slot) => {
                tracing::debug!(%id, name = %meta.name, fields = meta.fields.len(), "registered DTO");
                slot.insert(Arc::new(meta));
                Ok(())
            }
        }
    }

    /// Register `meta` under a freshly generated identity.
    pub fn declare(&self, meta: DtoMeta) -> DtoId {
        let mut entries = self.entries.write();
        let mut id = DtoId::new();
        while entries.contains_key(&id) {
            id = DtoId::new();
        }
        tracing::debug!(%id, name = %meta.name, fields = meta.fields.len(), "declared DTO");
        entries.insert(id, Arc::new(meta));
        id
    }

    /// Metadata for `id`, or `None` if it was never registered.
    pub fn get(&self, id: &DtoId) -> Option<Arc<DtoMeta>> {
        self.entries.read().get(id).cloned()
    }

    pub fn contains(&self, id: &DtoId) -> bool {
        self.entries.read().contains_key(id)
    }

    /// Declared name of `id`.
    pub fn name_of(&self, id: &DtoId) -> Option<String> {
        self.entries.read().get(id).map(|meta| meta.name.clone())
    }

    /// The synthesized `object` schema of `id`.
    pub fn object_schema(&self, id: &DtoId) -> Option<SchemaNode> {
        self.get(id).map(|meta| meta.to_object_schema())
    }

    /// Every registered identity, in no particular order.
    pub fn ids(&self) -> Vec<DtoId> {
        self.entries.read().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
