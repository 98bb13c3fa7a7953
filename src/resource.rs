//! Resources
//!
//! A resource is a representation of a physical entity (such as a
//! temperature sensor). It couples raw state with a composed schema
//! derived from the state's `rt` value: the schema is cached, cleared
//! whenever `rt` changes, and re-derived lazily on next access.

use crate::error::{OcfError, Result};
use crate::interface::Interface;
use crate::property::PropertyDescriptor;
use crate::rt::{ResourceType, TypeRegistry};
use crate::state::ResourceState;
use crate::value::Value;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Request parameters passed through to the collaborator hooks
pub type Params = BTreeMap<String, String>;

/// Collaborator hooks implemented by the host
///
/// The core invokes these around interface-mediated access: `load` may
/// populate just-in-time property values (live sensor readings) into the
/// state before a retrieve, `save` may persist or apply side effects after
/// an update. The default implementations do nothing.
pub trait ResourceHooks: Send + Sync {
    fn load(
        &mut self,
        state: &mut ResourceState,
        names: &[String],
        params: &Params,
    ) -> Result<()> {
        let _ = (state, names, params);
        Ok(())
    }

    fn save(
        &mut self,
        state: &mut ResourceState,
        names: &[String],
        params: &Params,
    ) -> Result<()> {
        let _ = (state, names, params);
        Ok(())
    }
}

/// Extract the type name list from a raw `rt` value
fn rt_names(value: &Value) -> Result<Vec<String>> {
    let Value::Array(items) = value else {
        return Err(OcfError::DataFormat {
            expected: "array",
            value: value.to_string(),
        });
    };
    items
        .iter()
        .map(|item| match item {
            Value::String(name) => Ok(name.clone()),
            other => Err(OcfError::DataFormat {
                expected: "string",
                value: other.to_string(),
            }),
        })
        .collect()
}

pub struct Resource {
    registry: Arc<TypeRegistry>,
    state: ResourceState,
    /// Derived schema, cleared by the `rt` tracker and re-derived lazily.
    /// Shared with the tracker closure, hence the lock.
    cache: Arc<RwLock<Option<Arc<ResourceType>>>>,
    hooks: Option<Box<dyn ResourceHooks>>,
}

impl Resource {
    /// Create a resource over raw state (possibly empty)
    pub fn new(registry: Arc<TypeRegistry>, data: BTreeMap<String, Value>) -> Self {
        let mut state = ResourceState::from(data);
        let cache: Arc<RwLock<Option<Arc<ResourceType>>>> = Arc::new(RwLock::new(None));
        let invalidate = Arc::clone(&cache);
        state.track(
            "rt",
            Box::new(move |_| {
                log::debug!("rt changed; clearing derived schema cache");
                *invalidate.write() = None;
            }),
        );
        Self {
            registry,
            state,
            cache,
            hooks: None,
        }
    }

    /// Create a resource from a JSON representation of its raw state
    pub fn from_json(registry: Arc<TypeRegistry>, json: &str) -> serde_json::Result<Self> {
        Ok(Self::new(registry, serde_json::from_str(json)?))
    }

    /// Attach collaborator hooks
    pub fn with_hooks(mut self, hooks: Box<dyn ResourceHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Raw state access for (de)serialization; writes through this view
    /// still fire change tracking
    pub fn state(&self) -> &ResourceState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ResourceState {
        &mut self.state
    }

    /// The composed schema for the current `rt` tag set
    ///
    /// Returns the cached derivation when present; otherwise reads `rt`
    /// from state (absent means the empty set), composes, and caches.
    pub fn type_of(&self) -> Result<Arc<ResourceType>> {
        if let Some(cached) = self.cache.read().as_ref() {
            return Ok(Arc::clone(cached));
        }
        let names = match self.state.get("rt") {
            Some(value) => rt_names(value)?,
            None => Vec::new(),
        };
        let ty = self.registry.compose(&names)?;
        *self.cache.write() = Some(Arc::clone(&ty));
        Ok(ty)
    }

    /// Whether the resource currently conforms to the named type
    pub fn conforms_to(&self, name: &str) -> Result<bool> {
        Ok(self.type_of()?.conforms_to(name))
    }

    fn descriptor(&self, name: &str) -> Result<PropertyDescriptor> {
        self.type_of()?
            .property(name)
            .cloned()
            .ok_or_else(|| OcfError::UnknownProperty(name.to_string()))
    }

    /// Typed read: canonicalized state value, or the descriptor default
    /// when the property has never been set
    pub fn get(&self, name: &str) -> Result<Value> {
        let desc = self.descriptor(name)?;
        match self.state.get(name) {
            Some(raw) => desc.canonicalize(raw),
            None => Ok(desc.default.clone()),
        }
    }

    /// Typed write: canonicalizes, then stores
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let desc = self.descriptor(name)?;
        let canonical = desc.canonicalize(&value.into())?;
        self.state.set(name, canonical);
        Ok(())
    }

    /// Remove a property from state; the name must exist in the current
    /// composed schema
    pub fn delete(&mut self, name: &str) -> Result<()> {
        self.descriptor(name)?;
        self.state.delete(name);
        Ok(())
    }

    /// Set the resource type tag set from an explicit list of names
    ///
    /// Names are not validated here; an unregistered name surfaces as
    /// `UnknownType` on the next schema derivation.
    pub fn set_rt<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.set("rt", Value::strings(names));
    }

    /// Set the resource type tag set from a previously-composed type
    pub fn set_rt_type(&mut self, ty: &ResourceType) {
        self.set_rt(ty.leaf_names().iter().cloned());
    }

    /// Retrieve the resource representation visible via an interface
    ///
    /// Invokes the `load` hook for the visible readable names before
    /// reading. A property that has never been set is omitted unless it
    /// is required, in which case its default is reported.
    pub fn retrieve(&mut self, interface: Interface, params: &Params) -> Result<BTreeMap<String, Value>> {
        let ty = self.type_of()?;
        let names: Vec<String> = ty
            .properties()
            .values()
            .filter(|desc| desc.readable && interface.visible(desc))
            .map(|desc| desc.name.clone())
            .collect();

        if let Some(hooks) = self.hooks.as_mut() {
            hooks.load(&mut self.state, &names, params)?;
        }

        let mut data = BTreeMap::new();
        for name in &names {
            if let Some(desc) = ty.property(name) {
                match self.state.get(name) {
                    Some(raw) => {
                        data.insert(name.clone(), desc.canonicalize(raw)?);
                    }
                    None if desc.required => {
                        data.insert(name.clone(), desc.default.clone());
                    }
                    None => {}
                }
            }
        }
        Ok(data)
    }

    /// Update the resource representation via an interface
    ///
    /// Properties not visible through the interface are silently ignored.
    /// If any visible property is read-only the whole update is rejected
    /// with every offending name. The apply itself is best-effort, not
    /// transactional: values are written in name order, and a
    /// canonicalization failure mid-way leaves earlier writes committed.
    /// The `save` hook runs only after a fully successful apply.
    pub fn update(
        &mut self,
        interface: Interface,
        data: &BTreeMap<String, Value>,
        params: &Params,
    ) -> Result<()> {
        let ty = self.type_of()?;
        let mut names: Vec<String> = Vec::new();
        let mut readonly: Vec<String> = Vec::new();
        for name in data.keys() {
            let desc = ty
                .property(name)
                .ok_or_else(|| OcfError::UnknownProperty(name.clone()))?;
            if !interface.visible(desc) {
                continue;
            }
            if !desc.writable {
                readonly.push(name.clone());
            }
            names.push(name.clone());
        }
        if !readonly.is_empty() {
            return Err(OcfError::NotWritable(readonly));
        }

        for name in &names {
            if let Some(value) = data.get(name) {
                self.set(name, value.clone())?;
            }
        }

        if let Some(hooks) = self.hooks.as_mut() {
            hooks.save(&mut self.state, &names, params)?;
        }
        Ok(())
    }

    /// Retrieve via a named interface (the transport-facing boundary)
    pub fn retrieve_named(&mut self, interface: &str, params: &Params) -> Result<BTreeMap<String, Value>> {
        self.retrieve(Interface::from_name(interface)?, params)
    }

    /// Update via a named interface (the transport-facing boundary)
    pub fn update_named(
        &mut self,
        interface: &str,
        data: &BTreeMap<String, Value>,
        params: &Params,
    ) -> Result<()> {
        self.update(Interface::from_name(interface)?, data, params)
    }
}
