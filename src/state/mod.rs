// Live state snapshot supplied by the host

mod entity;

pub use entity::EntityState;

use crate::value::resolve_path;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;


/// Keyed lookup of live entity state.
///
/// The host owns the data; everything in this crate only reads it.
pub trait StateProvider {
    /// Look up an entity by id
    fn entity(&self, entity_id: &str) -> Option<&EntityState>;

    /// Resolve the raw source value for an entity.
    ///
    /// Without an attribute path this is the state string. With a path the
    /// value is looked up in [`EntityState::merged_view`]. Unknown entities
    /// and unresolvable paths yield `None`.
    fn resolve(&self, entity_id: &str, attribute: Option<&str>) -> Option<Value> {
        let entity = self.entity(entity_id)?;
        match attribute.map(str::trim).filter(|a| !a.is_empty()) {
            None => Some(Value::String(entity.state.clone())),
            Some(path) => {
                let view = entity.merged_view();
                let resolved = resolve_path(&view, path).cloned();
                if resolved.is_none() {
                    debug!(entity_id = %entity_id, path = %path, "Attribute path did not resolve");
                }
                resolved
            }
        }
    }
}

/// Immutable snapshot of all entity states for one render pass
#[derive(Clone, Debug, Default)]
pub struct StateSnapshot {
    entities: HashMap<String, EntityState>,
}

impl StateSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entity (used while building a snapshot)
    pub fn insert(&mut self, entity: EntityState) {
        self.entities.insert(entity.entity_id.clone(), entity);
    }

    /// Builder-style insert
    pub fn with(mut self, entity: EntityState) -> Self {
        self.insert(entity);
        self
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Load a snapshot from a JSON file.
    ///
    /// Accepts either an object keyed by entity id (the host's state map)
    /// or an array of state objects.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read state snapshot {}", path.display()))?;
        let snapshot: StateSnapshot = serde_json::from_str(&json)
            .context("Failed to deserialize state snapshot JSON")?;
        debug!(entities = snapshot.len(), path = %path.display(), "Loaded state snapshot");
        Ok(snapshot)
    }
}

impl StateProvider for StateSnapshot {
    fn entity(&self, entity_id: &str) -> Option<&EntityState> {
        self.entities.get(entity_id)
    }
}

impl FromIterator<EntityState> for StateSnapshot {
    fn from_iter<I: IntoIterator<Item = EntityState>>(iter: I) -> Self {
        let mut snapshot = StateSnapshot::new();
        for entity in iter {
            snapshot.insert(entity);
        }
        snapshot
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotRepr {
    Keyed(HashMap<String, EntityState>),
    List(Vec<EntityState>),
}

impl<'de> Deserialize<'de> for StateSnapshot {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let snapshot = match SnapshotRepr::deserialize(deserializer)? {
            SnapshotRepr::Keyed(map) => map
                .into_iter()
                .map(|(id, mut entity)| {
                    if entity.entity_id.is_empty() {
                        entity.entity_id = id;
                    }
                    entity
                })
                .collect(),
            SnapshotRepr::List(list) => list.into_iter().collect(),
        };
        Ok(snapshot)
    }
}
