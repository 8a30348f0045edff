use std::sync::Arc;

use cl_reflect::Fields;

use super::EntityMeta;
use crate::context::Codecs;
use crate::entity::Entity;
use crate::error::RuntimeError;
use crate::extension::ExtensionState;
use crate::json::{JsonReader, JsonWriter};

/// Name of the type discriminator, always the first property of an object.
pub const DISCRIMINATOR: &str = "_t";

impl EntityMeta {
    /// A new instance: system defaults, source constructors root first,
    /// then configured defaults and empty collections.
    pub(crate) fn create(self: &Arc<Self>) -> Entity {
        let mut fields = Fields::new(&self.layout);
        for constructor in &self.constructors {
            constructor(&mut fields);
        }
        for property in &self.properties {
            if let Some(value) = &property.initial_value {
                property.init(&mut fields, value.clone());
            }
        }
        Entity::from_parts(Arc::clone(self), fields, self.new_state())
    }

    pub(crate) fn new_state(&self) -> ExtensionState {
        let mut state = ExtensionState::new();
        for factory in &self.states {
            factory(&mut state);
        }
        state
    }

    /// Writes `{"_t":"<discriminator>", ...properties}`.
    pub(crate) fn write(
        &self,
        entity: &Entity,
        writer: &mut JsonWriter,
        codecs: &Codecs,
    ) -> Result<(), RuntimeError> {
        writer.begin_object()?;
        writer.key(DISCRIMINATOR);
        writer.write_string(&self.discriminator);
        for property in &self.properties {
            let value = property.read(entity.fields());
            if property.is_omitted(&value) {
                continue;
            }
            writer.key(&property.name);
            property.handler.serialize(&value, writer, codecs)?;
        }
        writer.end_object();
        Ok(())
    }

    /// Reads the properties following the discriminator into a new instance.
    pub(crate) fn read_body(
        self: &Arc<Self>,
        reader: &mut JsonReader<'_>,
        codecs: &Codecs,
    ) -> Result<Entity, RuntimeError> {
        let mut entity = self.create();
        let mut index = 1;
        loop {
            let start = reader.position();
            let Some(name) = reader.next_property(index)? else {
                break;
            };
            index += 1;

            let Some(property) = self.property(&name) else {
                return Err(RuntimeError::at(
                    format!("Property '{name}' not found on an Entity"),
                    start,
                ));
            };
            let value = property.handler.deserialize(reader, codecs)?;
            property.init(entity.fields_mut(), value);
        }
        Ok(entity)
    }
}
