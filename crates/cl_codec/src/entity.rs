use core::any::Any;
use core::fmt;
use std::sync::Arc;

use cl_config::options::PropertySetterMode;
use cl_reflect::{Fields, ObjectValue, Value};

use crate::compiler::{EntityMeta, PropertyMeta};
use crate::error::RuntimeError;
use crate::extension::{ExtensionState, SetterStage};

// -----------------------------------------------------------------------------
// Entity

/// An instance of a compiled type.
///
/// Property access goes through the generated accessors: getters read the
/// bound field or call the source getter, setters run the setter pipeline
/// with the hooks extensions attached.
///
/// Clones copy the field values and start with fresh extension state.
pub struct Entity {
    meta: Arc<EntityMeta>,
    fields: Fields,
    state: ExtensionState,
}

impl Entity {
    pub(crate) fn from_parts(meta: Arc<EntityMeta>, fields: Fields, state: ExtensionState) -> Self {
        Self { meta, fields, state }
    }

    #[inline]
    pub fn meta(&self) -> &Arc<EntityMeta> {
        &self.meta
    }

    /// Full path of the instance's type.
    #[inline]
    pub fn type_path(&self) -> &str {
        self.meta.type_path()
    }

    /// The discriminator, which is the simple type name.
    #[inline]
    pub fn type_name(&self) -> &str {
        self.meta.discriminator()
    }

    /// Returns `true` if the type is `path` or derives from it.
    pub fn is(&self, path: &str) -> bool {
        self.meta.info().is_assignable_to(path)
    }

    /// Raw slot storage. Reading fields bypasses the generated getters.
    #[inline]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    #[inline]
    pub(crate) fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }

    /// The raw value of the field called `name`.
    #[inline]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn get(&self, name: &str) -> Result<Value, RuntimeError> {
        let index = self
            .meta
            .property_index(name)
            .ok_or_else(|| RuntimeError::property_not_found(name))?;
        self.get_at(index)
    }

    pub fn get_at(&self, index: usize) -> Result<Value, RuntimeError> {
        let property = self.property_at(index)?;
        Ok(property.read(&self.fields))
    }

    /// Sets a property through its setter pipeline.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), RuntimeError> {
        let index = self
            .meta
            .property_index(name)
            .ok_or_else(|| RuntimeError::property_not_found(name))?;
        self.set_at(index, value)
    }

    /// Runs the setter pipeline of the property at `index`:
    ///
    /// 1. `BeforeComparison` hooks.
    /// 2. With `CompareAndSet`, an equal current value skips to step 6.
    /// 3. `BeforeSet` hooks.
    /// 4. The write itself.
    /// 5. `AfterSet` hooks.
    /// 6. `AfterComparison` hooks.
    pub fn set_at(&mut self, index: usize, value: impl Into<Value>) -> Result<(), RuntimeError> {
        let meta = Arc::clone(&self.meta);
        let property = property_of(&meta, index)?;
        let value = value.into();
        if !property.value_type().accepts(&value) {
            return Err(RuntimeError::new(format!(
                "Value of kind '{}' cannot be assigned to property '{}' of type '{}'",
                value.kind_name(),
                property.name(),
                property.value_type()
            )));
        }

        let hooks = property.hooks();
        hooks.run(SetterStage::BeforeComparison, self, property);

        let unchanged = property.setter_mode() == PropertySetterMode::CompareAndSet
            && property.handler().compare(&property.read(&self.fields), &value);
        if !unchanged {
            hooks.run(SetterStage::BeforeSet, self, property);
            property.write(&mut self.fields, value);
            hooks.run(SetterStage::AfterSet, self, property);
        }

        hooks.run(SetterStage::AfterComparison, self, property);
        Ok(())
    }

    #[inline]
    fn property_at(&self, index: usize) -> Result<&PropertyMeta, RuntimeError> {
        property_of(&self.meta, index)
    }

    /// Extension state of type `T`, if an extension attached one.
    #[inline]
    pub fn extension<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.state.get::<T>()
    }

    #[inline]
    pub fn extension_mut<T: Any + Send + Sync>(&mut self) -> Option<&mut T> {
        self.state.get_mut::<T>()
    }
}

fn property_of(meta: &EntityMeta, index: usize) -> Result<&PropertyMeta, RuntimeError> {
    meta.property_at(index).ok_or_else(|| {
        RuntimeError::new(format!(
            "Property index {index} is out of range for '{}'",
            meta.type_path()
        ))
    })
}

impl Clone for Entity {
    fn clone(&self) -> Self {
        Self {
            meta: Arc::clone(&self.meta),
            fields: self.fields.clone(),
            state: self.meta.new_state(),
        }
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.type_path() == other.type_path() && self.fields == other.fields
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("type", &self.meta.type_path())
            .field("fields", &self.fields)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// ObjectValue

impl ObjectValue for Entity {
    fn type_path(&self) -> &str {
        self.meta.type_path()
    }

    fn is_a(&self, type_path: &str) -> bool {
        self.is(type_path)
    }

    fn clone_object(&self) -> Box<dyn ObjectValue> {
        Box::new(self.clone())
    }

    fn eq_object(&self, other: &dyn ObjectValue) -> bool {
        other
            .as_any()
            .downcast_ref::<Entity>()
            .is_some_and(|other| self == other)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}
