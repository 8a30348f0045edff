use std::sync::Arc;

use crate::info::ValueType;

/// A named storage slot declared by a class.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldInfo {
    name: Arc<str>,
    value_type: ValueType,
}

impl FieldInfo {
    #[inline]
    pub fn new(name: &str, value_type: ValueType) -> Self {
        Self {
            name: Arc::from(name),
            value_type,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the shared name, cheap to clone.
    #[inline]
    pub fn name_arc(&self) -> &Arc<str> {
        &self.name
    }

    #[inline]
    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }
}
