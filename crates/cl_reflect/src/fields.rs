use core::fmt;
use std::sync::Arc;

use cl_utils::hash::HashMap;

use crate::Value;
use crate::info::ValueType;

// -----------------------------------------------------------------------------
// FieldLayout

/// Slot layout shared by every instance of one compiled type.
///
/// Names resolve to slot indices; when a name is pushed twice the later slot
/// shadows the earlier one.
#[derive(Clone, Debug, Default)]
pub struct FieldLayout {
    names: Vec<Arc<str>>,
    types: Vec<ValueType>,
    index: HashMap<Arc<str>, usize>,
}

impl FieldLayout {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a slot and returns its index.
    pub fn push(&mut self, name: &str, value_type: ValueType) -> usize {
        let slot = self.names.len();
        let name: Arc<str> = Arc::from(name);
        self.names.push(Arc::clone(&name));
        self.types.push(value_type);
        self.index.insert(name, slot);
        slot
    }

    #[inline]
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn slot(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    #[inline]
    pub fn name_at(&self, slot: usize) -> Option<&str> {
        self.names.get(slot).map(|n| &**n)
    }

    #[inline]
    pub fn type_at(&self, slot: usize) -> Option<&ValueType> {
        self.types.get(slot)
    }
}

// -----------------------------------------------------------------------------
// Fields

/// The slot storage of one instance.
///
/// A new instance holds the system default of every slot type.
///
/// # Examples
///
/// ```
/// use cl_reflect::{FieldLayout, Fields, Value, info::ValueType};
///
/// let mut layout = FieldLayout::new();
/// layout.push("_count", ValueType::I32);
/// layout.push("_name", ValueType::String);
///
/// let mut fields = Fields::new(&layout.into_shared());
/// assert_eq!(fields.value("_count"), Value::I32(0));
/// assert!(fields.value("_name").is_null());
///
/// assert!(fields.set("_count", 3_i32));
/// assert!(!fields.set("_missing", 3_i32));
/// assert_eq!(fields.get("_count"), Some(&Value::I32(3)));
/// ```
#[derive(Clone)]
pub struct Fields {
    layout: Arc<FieldLayout>,
    values: Vec<Value>,
}

impl Fields {
    pub fn new(layout: &Arc<FieldLayout>) -> Self {
        Self {
            layout: Arc::clone(layout),
            values: layout.types.iter().map(ValueType::system_default).collect(),
        }
    }

    #[inline]
    pub fn layout(&self) -> &Arc<FieldLayout> {
        &self.layout
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(self.layout.slot(name)?)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        let slot = self.layout.slot(name)?;
        self.values.get_mut(slot)
    }

    /// A clone of the named slot, or [`Value::Null`] if there is none.
    pub fn value(&self, name: &str) -> Value {
        self.get(name).cloned().unwrap_or_default()
    }

    /// Overwrites the named slot. Returns `false` if there is none.
    ///
    /// The value is not type checked.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> bool {
        match self.get_mut(name) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn get_at(&self, slot: usize) -> Option<&Value> {
        self.values.get(slot)
    }

    #[inline]
    pub fn slot_mut(&mut self, slot: usize) -> Option<&mut Value> {
        self.values.get_mut(slot)
    }

    pub fn set_at(&mut self, slot: usize, value: Value) -> bool {
        match self.values.get_mut(slot) {
            Some(current) => {
                *current = value;
                true
            }
            None => false,
        }
    }

    /// Iterates over `(name, value)` in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.layout.names.iter().map(|n| &**n).zip(self.values.iter())
    }
}

impl PartialEq for Fields {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl fmt::Debug for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{FieldLayout, Fields};
    use crate::Value;
    use crate::info::ValueType;

    #[test]
    fn shadowed_names_resolve_to_last_slot() {
        let mut layout = FieldLayout::new();
        assert_eq!(layout.push("_value", ValueType::I32), 0);
        assert_eq!(layout.push("_value", ValueType::String), 1);
        let layout = layout.into_shared();

        let mut fields = Fields::new(&layout);
        assert_eq!(fields.get_at(0), Some(&Value::I32(0)));
        assert!(fields.value("_value").is_null());

        fields.set("_value", "x");
        assert_eq!(fields.get_at(1), Some(&Value::String("x".to_owned())));
        assert_eq!(fields.get_at(0), Some(&Value::I32(0)));
    }
}
