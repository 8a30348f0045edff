//! Per value type encode, decode and compare functions.
//!
//! A [`TypeHandler`] is resolved once per [`ValueType`] by the
//! [`HandlerRegistry`] and shared by every property of that type.

mod composite;
mod enums;
mod primitive;

use core::fmt;
use std::sync::Arc;

use cl_config::IssueKind;
use cl_reflect::Value;
use cl_reflect::info::ValueType;
use cl_utils::hash::{HashMap, HashSet};

use crate::context::Codecs;
use crate::error::RuntimeError;
use crate::json::{JsonReader, JsonWriter};

// -----------------------------------------------------------------------------
// TypeHandler

pub type CompareFn = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;
pub type SerializeFn = Arc<dyn Fn(&Value, &mut JsonWriter, &Codecs) -> Result<(), RuntimeError> + Send + Sync>;
pub type DeserializeFn = Arc<dyn Fn(&mut JsonReader<'_>, &Codecs) -> Result<Value, RuntimeError> + Send + Sync>;

/// Encoding, decoding and equality of one value type.
#[derive(Clone)]
pub struct TypeHandler {
    value_type: ValueType,
    system_default: Value,
    compare: CompareFn,
    serialize: SerializeFn,
    deserialize: DeserializeFn,
}

impl TypeHandler {
    /// A handler comparing values with `==`.
    pub fn new(
        value_type: ValueType,
        serialize: impl Fn(&Value, &mut JsonWriter, &Codecs) -> Result<(), RuntimeError> + Send + Sync + 'static,
        deserialize: impl Fn(&mut JsonReader<'_>, &Codecs) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            system_default: value_type.system_default(),
            value_type,
            compare: Arc::new(|a: &Value, b: &Value| a == b),
            serialize: Arc::new(serialize),
            deserialize: Arc::new(deserialize),
        }
    }

    pub fn with_compare(mut self, compare: impl Fn(&Value, &Value) -> bool + Send + Sync + 'static) -> Self {
        self.compare = Arc::new(compare);
        self
    }

    #[inline]
    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    #[inline]
    pub fn system_default(&self) -> &Value {
        &self.system_default
    }

    #[inline]
    pub fn compare(&self, a: &Value, b: &Value) -> bool {
        (self.compare)(a, b)
    }

    #[inline]
    pub fn serialize(&self, value: &Value, writer: &mut JsonWriter, codecs: &Codecs) -> Result<(), RuntimeError> {
        (self.serialize)(value, writer, codecs)
    }

    #[inline]
    pub fn deserialize(&self, reader: &mut JsonReader<'_>, codecs: &Codecs) -> Result<Value, RuntimeError> {
        (self.deserialize)(reader, codecs)
    }
}

impl fmt::Debug for TypeHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeHandler")
            .field("value_type", &self.value_type)
            .finish_non_exhaustive()
    }
}

#[cold]
fn mismatch(expected: &ValueType, value: &Value) -> RuntimeError {
    RuntimeError::new(format!(
        "Value of kind '{}' cannot be written as '{expected}'",
        value.kind_name()
    ))
}

// -----------------------------------------------------------------------------
// HandlerRegistry

/// Resolves and caches handlers while a context is compiled.
pub struct HandlerRegistry {
    handlers: HashMap<ValueType, TypeHandler>,
    declared: HashSet<Arc<str>>,
}

impl HandlerRegistry {
    /// `declared` are the paths nested object values may refer to.
    pub fn new(declared: impl IntoIterator<Item = Arc<str>>) -> Self {
        Self {
            handlers: HashMap::default(),
            declared: declared.into_iter().collect(),
        }
    }

    /// The handler of `value_type`.
    ///
    /// Fails with [`IssueKind::TypeIsNotSupported`] for opaque types and
    /// objects that are not declared in the context.
    pub fn get(&mut self, value_type: &ValueType) -> Result<TypeHandler, IssueKind> {
        if let Some(handler) = self.handlers.get(value_type) {
            return Ok(handler.clone());
        }

        let handler = match value_type {
            ValueType::Enum(info) => enums::handler(info),
            ValueType::Nullable(inner) => composite::nullable(value_type, self.get(inner)?),
            ValueType::List(item) => composite::list(value_type, self.get(item)?),
            ValueType::Object(path) if self.declared.contains(&**path) => composite::object(value_type, path),
            ValueType::Object(_) | ValueType::Opaque(_) => return Err(not_supported(value_type)),
            _ => primitive::handler(value_type).ok_or_else(|| not_supported(value_type))?,
        };

        self.handlers.insert(value_type.clone(), handler.clone());
        Ok(handler)
    }
}

#[cold]
fn not_supported(value_type: &ValueType) -> IssueKind {
    IssueKind::TypeIsNotSupported {
        value_type: value_type.to_string(),
    }
}

// -----------------------------------------------------------------------------
// Tests
