use std::sync::Arc;

use cl_reflect::info::{EnumInfo, ValueType};
use cl_reflect::{EnumValue, Value};

use super::{TypeHandler, mismatch};
use crate::dispatch::DispatchTree;
use crate::error::RuntimeError;

/// Name/value dispatch of one enum type.
struct EnumTables {
    info: Arc<EnumInfo>,
    by_name: DispatchTree<usize>,
    by_value: DispatchTree<usize>,
}

impl EnumTables {
    fn new(info: &Arc<EnumInfo>) -> Self {
        let members = info.members();
        Self {
            info: Arc::clone(info),
            by_name: DispatchTree::new(members.iter().enumerate().map(|(i, m)| (m.name(), i))),
            // First declared member wins for duplicate values.
            by_value: DispatchTree::with_hashes(members.iter().enumerate().map(|(i, m)| {
                let raw = m.value();
                (raw as u64, Box::from(&raw.to_le_bytes()[..]), i)
            })),
        }
    }

    fn member_of(&self, value: &EnumValue) -> Option<&str> {
        let raw = value.raw();
        let index = match value.member_index() {
            Some(index) => index,
            None => *self.by_value.lookup_hashed(raw as u64, &raw.to_le_bytes())?,
        };
        self.info.members().get(index).map(|m| m.name())
    }

    fn parse(&self, text: &str) -> Option<EnumValue> {
        match self.by_name.lookup(text.as_bytes()) {
            Some(&index) => EnumValue::of_member(&self.info, index),
            None => self.info.parse(text),
        }
    }

    #[cold]
    fn unable(&self, text: &str, position: usize) -> RuntimeError {
        RuntimeError::at(
            format!(
                "Unable to parse '{text}' enum value for the '{}' enum type",
                self.info.name()
            ),
            position,
        )
    }
}

/// Enums are written by member name, or as a number when no member matches.
pub(super) fn handler(info: &Arc<EnumInfo>) -> TypeHandler {
    let tables = Arc::new(EnumTables::new(info));
    let value_type = ValueType::enumeration(info);
    let write_tables = Arc::clone(&tables);
    let expected = value_type.clone();

    TypeHandler::new(
        value_type,
        move |value, writer, _| match value {
            Value::Enum(v) if v.info().path() == write_tables.info.path() => {
                match write_tables.member_of(v) {
                    Some(name) => writer.write_string(name),
                    None => writer.write_number(v.raw()),
                }
                Ok(())
            }
            other => Err(mismatch(&expected, other)),
        },
        move |reader, _| {
            reader.peek()?;
            let start = reader.position();
            if reader.is_number_next()? {
                let text = reader.read_number()?;
                return match text.parse::<i128>() {
                    Ok(raw) if tables.info.underlying().fits(raw) => {
                        Ok(Value::Enum(EnumValue::new(&tables.info, raw)))
                    }
                    _ => Err(tables.unable(text, start)),
                };
            }
            let text = reader.read_string()?;
            tables
                .parse(&text)
                .map(Value::Enum)
                .ok_or_else(|| tables.unable(&text, start))
        },
    )
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use cl_reflect::info::{EnumInfo, IntKind};
    use cl_reflect::{EnumValue, Value};

    use super::handler;
    use crate::context::Codecs;
    use crate::json::{JsonReader, JsonWriter};

    fn sample() -> std::sync::Arc<EnumInfo> {
        EnumInfo::builder("models::EnumULong", IntKind::U64)
            .member("UVal0", 0)
            .member("UVal5", 5)
            .member("UValDup", 5)
            .member("UValMax", u64::MAX as i128)
            .build()
    }

    fn write(value: &EnumValue) -> String {
        let mut writer = JsonWriter::new();
        handler(value.info())
            .serialize(&Value::Enum(value.clone()), &mut writer, &Codecs::empty())
            .unwrap();
        writer.into_string()
    }

    fn read(json: &str) -> Result<Value, String> {
        let info = sample();
        let mut reader = JsonReader::new(json.as_bytes());
        handler(&info)
            .deserialize(&mut reader, &Codecs::empty())
            .map_err(|e| e.to_string())
    }

    #[test]
    fn writes_member_names() {
        let info = sample();
        assert_eq!(write(&info.value("UValDup").unwrap()), r#""UValDup""#);
        assert_eq!(write(&EnumValue::new(&info, 5)), r#""UVal5""#);
        assert_eq!(write(&EnumValue::new(&info, u64::MAX as i128)), r#""UValMax""#);
        assert_eq!(write(&EnumValue::new(&info, 7)), "7");
    }

    #[test]
    fn reads_names_and_numbers() {
        let info = sample();
        assert_eq!(read(r#""UValDup""#), Ok(Value::Enum(info.value("UValDup").unwrap())));
        assert_eq!(read("18446744073709551615"), Ok(Value::Enum(EnumValue::new(&info, u64::MAX as i128))));
        assert_eq!(read("7"), Ok(Value::Enum(EnumValue::new(&info, 7))));
        assert_eq!(
            read("-1"),
            Err("Unable to parse '-1' enum value for the 'EnumULong' enum type (at byte position: 0)".to_string())
        );
        assert_eq!(
            read(r#" "UVal6""#),
            Err("Unable to parse 'UVal6' enum value for the 'EnumULong' enum type (at byte position: 1)".to_string())
        );
    }

    #[test]
    fn reads_flag_combinations() {
        let flags = EnumInfo::builder("models::EnumFlags", IntKind::I32)
            .flags()
            .member("Val0", 1)
            .member("Val1", 2)
            .member("Val2", 4)
            .build();
        let mut reader = JsonReader::new(br#""Val0, Val2""#);
        let value = handler(&flags).deserialize(&mut reader, &Codecs::empty()).unwrap();
        assert_eq!(value.as_enum().map(|v| v.raw()), Some(5));
    }
}
