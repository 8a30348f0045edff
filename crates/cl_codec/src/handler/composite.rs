use std::sync::Arc;

use cl_reflect::Value;
use cl_reflect::info::ValueType;

use super::{TypeHandler, mismatch};
use crate::entity::Entity;
use crate::error::RuntimeError;

/// `null` or a value of the inner type.
pub(super) fn nullable(value_type: &ValueType, inner: TypeHandler) -> TypeHandler {
    let write_inner = inner.clone();
    let read_inner = inner.clone();

    TypeHandler::new(
        value_type.clone(),
        move |value, writer, codecs| match value {
            Value::Null => {
                writer.write_null();
                Ok(())
            }
            value => write_inner.serialize(value, writer, codecs),
        },
        move |reader, codecs| {
            if reader.try_read_null()? {
                return Ok(Value::Null);
            }
            read_inner.deserialize(reader, codecs)
        },
    )
    .with_compare(move |a, b| match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (a, b) => inner.compare(a, b),
    })
}

/// A JSON array of the item type, or `null`.
pub(super) fn list(value_type: &ValueType, item: TypeHandler) -> TypeHandler {
    let write_item = item.clone();
    let read_item = item.clone();
    let expected = value_type.clone();

    TypeHandler::new(
        value_type.clone(),
        move |value, writer, codecs| match value {
            Value::Null => {
                writer.write_null();
                Ok(())
            }
            Value::List(items) => {
                writer.begin_array()?;
                for item in items {
                    write_item.serialize(item, writer, codecs)?;
                }
                writer.end_array();
                Ok(())
            }
            other => Err(mismatch(&expected, other)),
        },
        move |reader, codecs| {
            if reader.try_read_null()? {
                return Ok(Value::Null);
            }
            reader.begin_array()?;
            let mut items = Vec::new();
            while reader.next_item(items.len())? {
                items.push(read_item.deserialize(reader, codecs)?);
            }
            Ok(Value::List(items))
        },
    )
    .with_compare(move |a, b| match (a, b) {
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| item.compare(a, b))
        }
        (a, b) => a == b,
    })
}

/// A nested instance of a declared type, written with its discriminator.
pub(super) fn object(value_type: &ValueType, path: &Arc<str>) -> TypeHandler {
    let expected = value_type.clone();
    let path = Arc::clone(path);

    TypeHandler::new(
        value_type.clone(),
        move |value, writer, codecs| match value {
            Value::Null => {
                writer.write_null();
                Ok(())
            }
            Value::Object(object) => match object.as_any().downcast_ref::<Entity>() {
                Some(entity) => codecs.write_entity(entity, writer),
                None => Err(RuntimeError::new(format!(
                    "Instance of '{}' was not created by a context",
                    object.type_path()
                ))),
            },
            other => Err(mismatch(&expected, other)),
        },
        move |reader, codecs| {
            if reader.try_read_null()? {
                return Ok(Value::Null);
            }
            let start = reader.position();
            let entity = codecs.read_entity(reader)?;
            if !entity.is(&path) {
                return Err(RuntimeError::at(
                    format!("Type '{}' is not assignable to '{path}'", entity.type_path()),
                    start,
                ));
            }
            Ok(Value::object(entity))
        },
    )
}

// -----------------------------------------------------------------------------
// Tests
