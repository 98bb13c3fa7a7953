//! Resource types and the composition engine
//!
//! A resource type is a named, immutable schema fragment: a set of property
//! descriptors, optionally declared as the union of other resource types.
//! The registry composes an unordered set of type names into one derived
//! schema, deterministically and with interning, so identical tag sets
//! always yield the same schema instance. Conformance checks are therefore
//! leaf-name set membership, never a type-hierarchy walk.

use crate::error::{OcfError, Result};
use crate::property::PropertyDescriptor;
use parking_lot::{Mutex, RwLock};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

/// A binary switch (on/off)
pub const BINARY_SWITCH: &str = "oic.r.switch.binary";

/// The brightness of a light or lamp
pub const BRIGHTNESS: &str = "oic.r.light.brightness";

/// A refrigeration function
pub const REFRIGERATION: &str = "oic.r.refrigeration";

static NEXT_TYPE_ID: AtomicU64 = AtomicU64::new(1);

fn next_type_id() -> u64 {
    NEXT_TYPE_ID.fetch_add(1, AtomicOrdering::Relaxed)
}

/// Metadata properties present in every composed schema
fn base_properties() -> BTreeMap<String, PropertyDescriptor> {
    [
        PropertyDescriptor::string("n").meta(),
        PropertyDescriptor::string("id").meta().read_only(),
        PropertyDescriptor::string_array("rt").meta().required().read_only(),
        PropertyDescriptor::string_array("if").meta().required().read_only(),
    ]
    .into_iter()
    .map(|d| (d.name.clone(), d))
    .collect()
}

/// A resource type: either a registered named definition or a synthetic
/// composition of several definitions
///
/// The property map is always complete: it includes the universal metadata
/// properties and everything inherited from parent definitions, so merging
/// whole types never has to re-walk a hierarchy.
#[derive(Debug)]
pub struct ResourceType {
    /// Registered name; `None` for synthetic composed types
    name: Option<String>,

    /// Constituent leaf names; `{name}` for a named definition, the union
    /// of the constituents' leaves for a composed type
    leaves: BTreeSet<String>,

    /// Identifiers of every definition transitively reachable through
    /// composition, self included; its size orders composition precedence
    reachable: BTreeSet<u64>,

    /// Synthesized identifier, used for interning and stable tie-breaking
    id: u64,

    properties: BTreeMap<String, PropertyDescriptor>,
}

impl ResourceType {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The set of constituent leaf names this type was composed from
    pub fn leaf_names(&self) -> &BTreeSet<String> {
        &self.leaves
    }

    pub fn properties(&self) -> &BTreeMap<String, PropertyDescriptor> {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.get(name)
    }

    /// Whether this type includes the named type as a constituent
    ///
    /// Membership is a leaf-name check, so it holds regardless of the
    /// order or path by which the type was composed.
    pub fn conforms_to(&self, name: &str) -> bool {
        self.leaves.contains(name)
    }

    fn depth(&self) -> usize {
        self.reachable.len()
    }
}

/// Canonical precedence order for composition: deeper (more transitively
/// reachable definitions) first, then name ascending with unnamed synthetic
/// types last, then synthesized id.
fn precedence(a: &ResourceType, b: &ResourceType) -> Ordering {
    b.depth()
        .cmp(&a.depth())
        .then_with(|| match (&a.name, &b.name) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.id.cmp(&b.id))
}

/// Fold definitions (sorted highest precedence first) into one property
/// map: lowest precedence inserts first, higher precedence overwrites.
fn merged_properties(defs: &[Arc<ResourceType>]) -> BTreeMap<String, PropertyDescriptor> {
    let mut props = base_properties();
    for def in defs.iter().rev() {
        for (name, desc) in &def.properties {
            props.insert(name.clone(), desc.clone());
        }
    }
    props
}

/// Registry of resource types
///
/// Holds the named definitions and the interned composition cache. The
/// registry is populated explicitly before first use (no import-time side
/// effects) and is safe to share behind an `Arc`.
pub struct TypeRegistry {
    types: RwLock<HashMap<String, Arc<ResourceType>>>,
    composed: Mutex<HashMap<BTreeSet<String>, Arc<ResourceType>>>,
    base: Arc<ResourceType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        let id = next_type_id();
        let base = Arc::new(ResourceType {
            name: None,
            leaves: BTreeSet::new(),
            reachable: BTreeSet::from([id]),
            id,
            properties: base_properties(),
        });
        Self {
            types: RwLock::new(HashMap::new()),
            composed: Mutex::new(HashMap::new()),
            base,
        }
    }

    /// A registry pre-populated with the standard vocabulary
    /// ([`BINARY_SWITCH`], [`BRIGHTNESS`], [`REFRIGERATION`])
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry
            .register(BINARY_SWITCH, [PropertyDescriptor::boolean("value")], &[])
            .and_then(|_| {
                registry.register(BRIGHTNESS, [PropertyDescriptor::integer("brightness")], &[])
            })
            .and_then(|_| {
                registry.register(
                    REFRIGERATION,
                    [
                        PropertyDescriptor::integer("filter").read_only(),
                        PropertyDescriptor::boolean("rapidFreeze"),
                        PropertyDescriptor::boolean("rapidCool"),
                        PropertyDescriptor::boolean("defrost"),
                    ],
                    &[],
                )
            })
            .expect("builtin types are well-formed");
        registry
    }

    /// The canonical empty schema: no properties beyond the universal
    /// metadata properties
    pub fn base(&self) -> Arc<ResourceType> {
        Arc::clone(&self.base)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.read().contains_key(name)
    }

    /// Look up a named definition
    pub fn lookup(&self, name: &str) -> Result<Arc<ResourceType>> {
        self.types
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| OcfError::UnknownType(name.to_string()))
    }

    /// Register a named definition
    ///
    /// `parents` declares the definition as a union of already-registered
    /// types; its own descriptors override any inherited ones. Registering
    /// the same name twice is allowed only if the resulting schema is
    /// identical; a conflicting re-registration is an error.
    pub fn register<S, I>(
        &self,
        name: S,
        properties: I,
        parents: &[&str],
    ) -> Result<Arc<ResourceType>>
    where
        S: Into<String>,
        I: IntoIterator<Item = PropertyDescriptor>,
    {
        let name = name.into();

        let mut parent_defs: Vec<Arc<ResourceType>> = Vec::new();
        for parent in parents {
            let def = self.lookup(parent)?;
            if !parent_defs.iter().any(|d| d.id == def.id) {
                parent_defs.push(def);
            }
        }
        parent_defs.sort_by(|a, b| precedence(a, b));

        let mut props = merged_properties(&parent_defs);
        for desc in properties {
            props.insert(desc.name.clone(), desc);
        }

        let mut reachable = self.base.reachable.clone();
        for def in &parent_defs {
            reachable.extend(def.reachable.iter().copied());
        }

        let mut types = self.types.write();
        if let Some(existing) = types.get(&name) {
            if existing.properties == props {
                return Ok(Arc::clone(existing));
            }
            return Err(OcfError::DuplicateType(name));
        }

        let id = next_type_id();
        reachable.insert(id);
        let def = Arc::new(ResourceType {
            name: Some(name.clone()),
            leaves: BTreeSet::from([name.clone()]),
            reachable,
            id,
            properties: props,
        });
        types.insert(name, Arc::clone(&def));
        Ok(def)
    }

    /// Compose an unordered set of type names into one schema
    ///
    /// The result is interned by the exact name set: two derivations over
    /// the same set return the same instance. A set of exactly one
    /// distinct definition returns that definition itself, not a wrapper;
    /// the empty set returns the base schema.
    pub fn compose<I, S>(&self, names: I) -> Result<Arc<ResourceType>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: BTreeSet<String> = names
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        if names.is_empty() {
            return Ok(Arc::clone(&self.base));
        }
        if let Some(cached) = self.composed.lock().get(&names) {
            return Ok(Arc::clone(cached));
        }

        let mut defs: Vec<Arc<ResourceType>> = Vec::new();
        for name in &names {
            let def = self.lookup(name)?;
            if !defs.iter().any(|d| d.id == def.id) {
                defs.push(def);
            }
        }

        if defs.len() == 1 {
            let def = defs.remove(0);
            self.composed.lock().insert(names, Arc::clone(&def));
            return Ok(def);
        }

        defs.sort_by(|a, b| precedence(a, b));
        let properties = merged_properties(&defs);
        let id = next_type_id();
        let mut reachable = BTreeSet::from([id]);
        let mut leaves = BTreeSet::new();
        for def in &defs {
            reachable.extend(def.reachable.iter().copied());
            leaves.extend(def.leaves.iter().cloned());
        }
        log::debug!(
            "derived composed type [{}]",
            names.iter().cloned().collect::<Vec<_>>().join(",")
        );
        let composed = Arc::new(ResourceType {
            name: None,
            leaves,
            reachable,
            id,
            properties,
        });

        // A racing derivation of the same set keeps the first interned
        // instance, so identity stays stable.
        let mut cache = self.composed.lock();
        let entry = cache.entry(names).or_insert(composed);
        Ok(Arc::clone(entry))
    }

    /// Add `other`'s constituent types to `ty`
    pub fn union(&self, ty: &ResourceType, other: &ResourceType) -> Result<Arc<ResourceType>> {
        self.compose(ty.leaf_names().union(other.leaf_names()))
    }

    /// Remove `other`'s constituent types from `ty`
    ///
    /// Removing every remaining name yields the base schema.
    pub fn subtract(&self, ty: &ResourceType, other: &ResourceType) -> Result<Arc<ResourceType>> {
        self.compose(ty.leaf_names().difference(other.leaf_names()))
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
