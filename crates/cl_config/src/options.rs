//! Option declarations and their value enums.
//!
//! An option is identified by a zero-sized declaration type implementing
//! [`OptionDeclaration`]. Extensions declare their own options the same way.

use core::fmt;

use cl_reflect::Value;
use serde::{Deserialize, Serialize};

// -----------------------------------------------------------------------------
// OptionDeclaration

/// Identity, value type and default of a configuration option.
pub trait OptionDeclaration: 'static {
    type Value: Clone + fmt::Display + Send + Sync + 'static;

    /// The builder call that sets this option, used in diagnostics.
    const NAME: &'static str;

    /// The value used when no scope sets the option.
    fn default_value() -> Option<Self::Value> {
        None
    }
}

// -----------------------------------------------------------------------------
// Option values

/// How generated accessors reach a property's storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyAccessMode {
    /// Getter, setter and initialization go straight to the field.
    Field,
    /// Getter and initialization use the field, the setter calls the
    /// property's own setter.
    FieldForGetterAndInitializationPropertyForSetter,
    /// The getter uses the field, setter and initialization call the
    /// property's own setter.
    FieldForGetterPropertyForSetter,
    /// Everything goes through the property's own accessors.
    Property,
}

impl PropertyAccessMode {
    #[inline]
    pub const fn requires_getter(self) -> bool {
        matches!(self, Self::Property)
    }

    #[inline]
    pub const fn requires_setter(self) -> bool {
        !matches!(self, Self::Field)
    }

    #[inline]
    pub const fn requires_field(self) -> bool {
        !matches!(self, Self::Property)
    }

    /// Returns `true` if the generated getter reads the field.
    #[inline]
    pub const fn reads_field(self) -> bool {
        self.requires_field()
    }

    /// Returns `true` if the generated setter writes the field.
    #[inline]
    pub const fn writes_field(self) -> bool {
        matches!(self, Self::Field)
    }

    /// Returns `true` if initialization and decoding write the field.
    #[inline]
    pub const fn initializes_field(self) -> bool {
        matches!(self, Self::Field | Self::FieldForGetterAndInitializationPropertyForSetter)
    }
}

/// Whether the generated setter skips writes of an unchanged value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertySetterMode {
    #[default]
    Set,
    CompareAndSet,
}

/// Whether properties equal to their default are written by the encoder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefaultValueHandling {
    #[default]
    Include,
    IgnoreAndPopulate,
}

/// Initial value of collection properties.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionDefaultValue {
    #[default]
    Empty,
    Null,
}

macro_rules! impl_display_as_debug {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                #[inline]
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    fmt::Debug::fmt(self, f)
                }
            }
        )*
    };
}

impl_display_as_debug!(
    PropertyAccessMode,
    PropertySetterMode,
    DefaultValueHandling,
    CollectionDefaultValue
);

// -----------------------------------------------------------------------------
// Declarations

pub struct UsePropertyAccessMode;

impl OptionDeclaration for UsePropertyAccessMode {
    type Value = PropertyAccessMode;
    const NAME: &'static str = "use_property_access_mode";

    fn default_value() -> Option<PropertyAccessMode> {
        Some(PropertyAccessMode::FieldForGetterAndInitializationPropertyForSetter)
    }
}

/// Explicit backing field name.
pub struct FieldName;

impl OptionDeclaration for FieldName {
    type Value = String;
    const NAME: &'static str = "has_field";
}

pub struct UsePropertySetterMode;

impl OptionDeclaration for UsePropertySetterMode {
    type Value = PropertySetterMode;
    const NAME: &'static str = "use_property_setter_mode";

    fn default_value() -> Option<PropertySetterMode> {
        Some(PropertySetterMode::Set)
    }
}

pub struct UseDefaultValueHandling;

impl OptionDeclaration for UseDefaultValueHandling {
    type Value = DefaultValueHandling;
    const NAME: &'static str = "use_default_value_handling";

    fn default_value() -> Option<DefaultValueHandling> {
        Some(DefaultValueHandling::Include)
    }
}

pub struct HasDefaultValue;

impl OptionDeclaration for HasDefaultValue {
    type Value = Value;
    const NAME: &'static str = "has_default_value";
}

pub struct HasCollectionDefaultValue;

impl OptionDeclaration for HasCollectionDefaultValue {
    type Value = CollectionDefaultValue;
    const NAME: &'static str = "has_collection_default_value";

    fn default_value() -> Option<CollectionDefaultValue> {
        Some(CollectionDefaultValue::Empty)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::PropertyAccessMode;

    #[test]
    fn access_mode_requirements() {
        use PropertyAccessMode::*;

        let table = [
            (Field, false, false, true),
            (FieldForGetterAndInitializationPropertyForSetter, false, true, true),
            (FieldForGetterPropertyForSetter, false, true, true),
            (Property, true, true, false),
        ];
        for (mode, getter, setter, field) in table {
            assert_eq!(mode.requires_getter(), getter, "{mode}");
            assert_eq!(mode.requires_setter(), setter, "{mode}");
            assert_eq!(mode.requires_field(), field, "{mode}");
        }

        assert!(Field.initializes_field());
        assert!(FieldForGetterAndInitializationPropertyForSetter.initializes_field());
        assert!(!FieldForGetterPropertyForSetter.initializes_field());
        assert!(!Property.reads_field());
    }

    #[test]
    fn modes_deserialize_by_name() {
        let mode: PropertyAccessMode = serde_json::from_str("\"FieldForGetterPropertyForSetter\"").unwrap();
        assert_eq!(mode, PropertyAccessMode::FieldForGetterPropertyForSetter);
        assert!(serde_json::from_str::<PropertyAccessMode>("\"Fields\"").is_err());
    }
}
