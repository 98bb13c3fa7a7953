//! Raw resource state
//!
//! The last-known serialized form of a resource: an ordered map from
//! property name to raw value, as produced by deserializing a JSON or
//! CBOR representation. Supports per-key change callbacks so that a
//! consumer (the resource's schema cache) can react to writes of a
//! specific key without watching the whole map.

use crate::value::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Callback invoked with the key name after a tracked key is mutated
pub type ChangeCallback = Box<dyn Fn(&str) + Send + Sync>;

#[derive(Default)]
pub struct ResourceState {
    data: BTreeMap<String, Value>,
    tracked: HashMap<String, Vec<ChangeCallback>>,
}

impl ResourceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.data.contains_key(name)
    }

    /// Set a raw value, then notify trackers of that key
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        self.data.insert(name.clone(), value.into());
        self.notify(&name);
    }

    /// Delete a raw value; trackers fire only if an entry was removed
    pub fn delete(&mut self, name: &str) -> Option<Value> {
        let removed = self.data.remove(name);
        if removed.is_some() {
            self.notify(name);
        }
        removed
    }

    /// Register a callback fired on every mutation of exactly this key
    ///
    /// Callbacks run synchronously, after the mutation, in registration
    /// order. Writes to untracked keys notify nobody.
    pub fn track(&mut self, name: impl Into<String>, callback: ChangeCallback) {
        self.tracked.entry(name.into()).or_default().push(callback);
    }

    fn notify(&self, name: &str) {
        if let Some(callbacks) = self.tracked.get(name) {
            for callback in callbacks {
                callback(name);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    /// JSON serialization of the raw state
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.data)
    }

    /// Deserialize raw state from JSON (trackers start empty)
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let data: BTreeMap<String, Value> = serde_json::from_str(json)?;
        Ok(Self {
            data,
            tracked: HashMap::new(),
        })
    }
}

impl From<BTreeMap<String, Value>> for ResourceState {
    fn from(data: BTreeMap<String, Value>) -> Self {
        Self {
            data,
            tracked: HashMap::new(),
        }
    }
}

impl fmt::Debug for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceState")
            .field("data", &self.data)
            .field("tracked", &self.tracked.keys().collect::<Vec<_>>())
            .finish()
    }
}
