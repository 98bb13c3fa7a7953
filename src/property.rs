//! Resource property descriptors
//!
//! A property describes a single aspect of a resource. For example: the
//! property `n` describes the resource name, the property `rt` describes
//! the resource type(s), and the property `temperature` might describe the
//! current reading of a temperature sensor.
//!
//! Descriptors are pure value objects: they carry access flags, a default,
//! and a canonicalization rule, and hold no reference to any resource.

use crate::error::{OcfError, Result};
use crate::value::Value;
use uuid::Uuid;

/// Target kind of a property value, driving canonicalization
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyKind {
    Boolean,
    Integer,
    Number,
    String,
    Uuid,
    /// Array of elements, each canonicalized to the element kind
    Array(Box<PropertyKind>),
    /// Ordered set: like `Array`, but duplicates are dropped, keeping the
    /// first occurrence
    Set(Box<PropertyKind>),
}

impl PropertyKind {
    /// Human-readable target name for conversion error reports
    pub fn target_name(&self) -> &'static str {
        match self {
            PropertyKind::Boolean => "boolean",
            PropertyKind::Integer => "integer",
            PropertyKind::Number => "number",
            PropertyKind::String => "string",
            PropertyKind::Uuid => "uuid",
            PropertyKind::Array(_) => "array",
            PropertyKind::Set(_) => "set",
        }
    }

    /// Normalize a raw decoded value into this kind's canonical form
    ///
    /// Coercions follow the value shapes a wire decoder can produce:
    /// numbers and booleans interconvert, strings parse into numbers and
    /// UUIDs, and containers canonicalize element-wise. Anything else is a
    /// `DataFormat` error naming the offending value.
    pub fn canonicalize(&self, raw: &Value) -> Result<Value> {
        match self {
            PropertyKind::Boolean => match raw {
                Value::Bool(b) => Ok(Value::Bool(*b)),
                Value::Int(n) => Ok(Value::Bool(*n != 0)),
                Value::Float(x) => Ok(Value::Bool(*x != 0.0)),
                Value::String(s) => match s.as_str() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    _ => Err(self.mismatch(raw)),
                },
                _ => Err(self.mismatch(raw)),
            },
            PropertyKind::Integer => match raw {
                Value::Int(n) => Ok(Value::Int(*n)),
                Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
                Value::Float(x) if x.is_finite() => Ok(Value::Int(x.trunc() as i64)),
                Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::Int)
                    .map_err(|_| self.mismatch(raw)),
                _ => Err(self.mismatch(raw)),
            },
            PropertyKind::Number => match raw {
                Value::Float(x) => Ok(Value::Float(*x)),
                Value::Int(n) => Ok(Value::Float(*n as f64)),
                Value::Bool(b) => Ok(Value::Float(f64::from(u8::from(*b)))),
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(Value::Float)
                    .map_err(|_| self.mismatch(raw)),
                _ => Err(self.mismatch(raw)),
            },
            PropertyKind::String => match raw {
                Value::String(s) => Ok(Value::String(s.clone())),
                Value::Bool(b) => Ok(Value::String(b.to_string())),
                Value::Int(n) => Ok(Value::String(n.to_string())),
                Value::Float(x) => Ok(Value::String(x.to_string())),
                Value::Uuid(u) => Ok(Value::String(u.to_string())),
                _ => Err(self.mismatch(raw)),
            },
            PropertyKind::Uuid => match raw {
                Value::Uuid(u) => Ok(Value::Uuid(*u)),
                Value::String(s) => Uuid::parse_str(s)
                    .map(Value::Uuid)
                    .map_err(|_| self.mismatch(raw)),
                _ => Err(self.mismatch(raw)),
            },
            PropertyKind::Array(elem) => match raw {
                Value::Array(items) => {
                    let items = items
                        .iter()
                        .map(|item| elem.canonicalize(item))
                        .collect::<Result<Vec<Value>>>()?;
                    Ok(Value::Array(items))
                }
                _ => Err(self.mismatch(raw)),
            },
            PropertyKind::Set(elem) => match raw {
                Value::Array(items) => {
                    let mut out: Vec<Value> = Vec::with_capacity(items.len());
                    for item in items {
                        let item = elem.canonicalize(item)?;
                        if !out.contains(&item) {
                            out.push(item);
                        }
                    }
                    Ok(Value::Array(out))
                }
                _ => Err(self.mismatch(raw)),
            },
        }
    }

    fn mismatch(&self, raw: &Value) -> OcfError {
        OcfError::DataFormat {
            expected: self.target_name(),
            value: raw.to_string(),
        }
    }
}

/// Descriptor for one named resource property
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyDescriptor {
    /// Property name as it appears in resource state
    pub name: String,

    /// Target value kind
    pub kind: PropertyKind,

    /// Metadata properties (such as `n` and `rt`) describe the resource
    /// itself, in contrast to operational properties (such as
    /// `temperature`) which describe its current state
    pub meta: bool,

    /// Property is mandatory in every representation
    pub required: bool,

    /// Property value may be read
    pub readable: bool,

    /// Property value may be written
    pub writable: bool,

    /// Value reported when the property has never been set
    pub default: Value,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            kind,
            meta: false,
            required: false,
            readable: true,
            writable: true,
            default: Value::Null,
        }
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::Boolean)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::Integer)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::Number)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::String)
    }

    pub fn uuid(name: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::Uuid)
    }

    pub fn string_array(name: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::Array(Box::new(PropertyKind::String)))
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }

    /// Normalize a raw value through this descriptor's kind
    pub fn canonicalize(&self, raw: &Value) -> Result<Value> {
        self.kind.canonicalize(raw)
    }
}
