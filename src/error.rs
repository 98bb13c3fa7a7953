//! Error types for the resource model
//!
//! All failures here are local validation failures: they are reported to
//! the caller exactly once, never retried or swallowed. A transport layer
//! is expected to translate them into protocol status codes.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcfError {
    /// A resource type name used in composition is not registered
    #[error("Unknown resource type: {0}")]
    UnknownType(String),

    /// A property name does not exist in the resource's composed schema
    #[error("Unknown property: {0}")]
    UnknownProperty(String),

    /// An update addressed one or more read-only properties; carries every
    /// offending name, not just the first
    #[error("Not writable: {}", .0.join(", "))]
    NotWritable(Vec<String>),

    /// A raw value cannot be canonicalized to the descriptor's target kind
    #[error("Cannot convert {value} to {expected}")]
    DataFormat {
        expected: &'static str,
        value: String,
    },

    /// An interface name is not a known access mode
    #[error("Unknown interface: {0}")]
    UnknownInterface(String),

    /// A resource type name is already registered with a different schema
    #[error("Conflicting registration for resource type: {0}")]
    DuplicateType(String),
}

pub type Result<T> = std::result::Result<T, OcfError>;
