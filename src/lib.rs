//! Dynamic resource data model for OCF-style devices
//!
//! Models networked resources whose schema is determined at runtime by the
//! unordered set of resource type tags in their `rt` state value. Tag sets
//! compose deterministically into interned schemas; interfaces filter the
//! composed schema into named access modes for retrieve and update.
//!
//! Transport, encoding, and status-code mapping are collaborator concerns
//! and live outside this crate.

pub mod error;
pub mod interface;
pub mod property;
pub mod resource;
pub mod rt;
pub mod state;
pub mod value;

pub use error::{OcfError, Result};
pub use interface::Interface;
pub use property::{PropertyDescriptor, PropertyKind};
pub use resource::{Params, Resource, ResourceHooks};
pub use rt::{ResourceType, TypeRegistry};
pub use state::{ChangeCallback, ResourceState};
pub use value::Value;
