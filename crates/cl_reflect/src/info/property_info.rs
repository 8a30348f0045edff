use core::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::info::ValueType;
use crate::{Fields, Value};

/// Source getter of a property, reading from the instance's slots.
pub type Getter = Arc<dyn Fn(&Fields) -> Value + Send + Sync>;

/// Source setter of a property, writing to the instance's slots.
pub type Setter = Arc<dyn Fn(&mut Fields, Value) + Send + Sync>;

bitflags! {
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
    pub struct PropertyFlags: u8 {
        /// The property may be overridden by generated code.
        const VIRTUAL = 1 << 0;
        /// The property has no body. Always set on interface properties.
        const ABSTRACT = 1 << 1;
    }
}

// -----------------------------------------------------------------------------
// PropertyInfo

/// A named, typed property.
///
/// Class properties carry the accessors the generated code falls back to.
/// Abstract properties have none; their storage is generated.
///
/// # Examples
///
/// ```
/// use cl_reflect::info::{PropertyInfo, ValueType};
/// use cl_reflect::{FieldLayout, Fields, Value};
///
/// let property = PropertyInfo::backed("Test", ValueType::I32, "_test");
/// assert!(property.is_virtual());
///
/// let mut layout = FieldLayout::new();
/// layout.push("_test", ValueType::I32);
/// let mut fields = Fields::new(&layout.into_shared());
///
/// (property.setter().unwrap())(&mut fields, Value::I32(5));
/// assert_eq!((property.getter().unwrap())(&fields), Value::I32(5));
/// ```
#[derive(Clone)]
pub struct PropertyInfo {
    name: Arc<str>,
    value_type: ValueType,
    flags: PropertyFlags,
    getter: Option<Getter>,
    setter: Option<Setter>,
    declaring_type: Arc<str>,
}

impl PropertyInfo {
    /// Creates a non-virtual property without accessors.
    pub fn new(name: &str, value_type: ValueType) -> Self {
        Self {
            name: Arc::from(name),
            value_type,
            flags: PropertyFlags::empty(),
            getter: None,
            setter: None,
            declaring_type: Arc::from(""),
        }
    }

    /// Creates a virtual property reading and writing the field `field`.
    pub fn backed(name: &str, value_type: ValueType, field: &str) -> Self {
        let get_field: Arc<str> = Arc::from(field);
        let set_field = Arc::clone(&get_field);
        Self::new(name, value_type)
            .with_flags(PropertyFlags::VIRTUAL)
            .with_getter(move |fields| fields.value(&get_field))
            .with_setter(move |fields, value| {
                fields.set(&set_field, value);
            })
    }

    pub fn with_flags(mut self, flags: PropertyFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn without_flags(mut self, flags: PropertyFlags) -> Self {
        self.flags -= flags;
        self
    }

    pub fn with_getter(mut self, getter: impl Fn(&Fields) -> Value + Send + Sync + 'static) -> Self {
        self.getter = Some(Arc::new(getter));
        self
    }

    pub fn with_setter(mut self, setter: impl Fn(&mut Fields, Value) + Send + Sync + 'static) -> Self {
        self.setter = Some(Arc::new(setter));
        self
    }

    pub(crate) fn set_declaring_type(&mut self, path: &Arc<str>) {
        self.declaring_type = Arc::clone(path);
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn name_arc(&self) -> &Arc<str> {
        &self.name
    }

    #[inline]
    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    #[inline]
    pub fn flags(&self) -> PropertyFlags {
        self.flags
    }

    #[inline]
    pub fn is_virtual(&self) -> bool {
        self.flags.contains(PropertyFlags::VIRTUAL)
    }

    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.flags.contains(PropertyFlags::ABSTRACT)
    }

    #[inline]
    pub fn getter(&self) -> Option<&Getter> {
        self.getter.as_ref()
    }

    #[inline]
    pub fn setter(&self) -> Option<&Setter> {
        self.setter.as_ref()
    }

    /// Full path of the type declaring this property.
    #[inline]
    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }
}

impl fmt::Debug for PropertyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyInfo")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("flags", &self.flags)
            .field("declaring_type", &self.declaring_type)
            .finish_non_exhaustive()
    }
}
