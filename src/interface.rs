//! Interfaces
//!
//! An interface is a named access mode over a resource: a stateless
//! visibility predicate that gates which properties of the composed schema
//! a retrieve or update may touch.

use crate::error::{OcfError, Result};
use crate::property::PropertyDescriptor;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interface {
    /// Access to all properties of a resource, including common
    /// metadata properties
    Baseline,

    /// Operational writable properties (such as the set point
    /// temperature of a thermostat)
    Actuator,

    /// Operational read-only properties (such as the current
    /// temperature of a thermostat)
    Sensor,

    /// All read-only properties
    ReadOnly,

    /// All writable properties
    ReadWrite,
}

impl Interface {
    pub const ALL: [Interface; 5] = [
        Interface::Baseline,
        Interface::Actuator,
        Interface::Sensor,
        Interface::ReadOnly,
        Interface::ReadWrite,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Interface::Baseline => "oic.if.baseline",
            Interface::Actuator => "oic.if.a",
            Interface::Sensor => "oic.if.s",
            Interface::ReadOnly => "oic.if.r",
            Interface::ReadWrite => "oic.if.rw",
        }
    }

    /// Resolve a named access mode
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|interface| interface.name() == name)
            .ok_or_else(|| OcfError::UnknownInterface(name.to_string()))
    }

    /// Check visibility of a property via this interface
    pub fn visible(self, prop: &PropertyDescriptor) -> bool {
        match self {
            Interface::Baseline => true,
            Interface::Actuator => prop.writable && !prop.meta,
            Interface::Sensor => !prop.writable && !prop.meta,
            Interface::ReadOnly => !prop.writable,
            Interface::ReadWrite => prop.writable,
        }
    }
}
