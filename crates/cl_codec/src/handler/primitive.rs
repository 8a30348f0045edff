use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, NaiveDateTime, SecondsFormat};
use cl_reflect::Value;
use cl_reflect::info::ValueType;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{TypeHandler, mismatch};
use crate::error::RuntimeError;
use crate::json::JsonReader;

const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

macro_rules! integer_handler {
    ($variant:ident, $ty:ty, $name:literal) => {
        TypeHandler::new(
            ValueType::$variant,
            |value, writer, _| match value {
                Value::$variant(v) => {
                    writer.write_number(v);
                    Ok(())
                }
                other => Err(mismatch(&ValueType::$variant, other)),
            },
            |reader, _| reader.read_integer::<$ty>($name).map(Value::$variant),
        )
    };
}

macro_rules! float_handler {
    ($variant:ident, $ty:ident, $name:literal) => {
        TypeHandler::new(
            ValueType::$variant,
            |value, writer, _| match value {
                Value::$variant(v) if v.is_finite() => {
                    writer.write_number(v);
                    Ok(())
                }
                Value::$variant(v) if v.is_nan() => {
                    writer.write_string("NaN");
                    Ok(())
                }
                Value::$variant(v) => {
                    writer.write_string(if *v > 0.0 { "Infinity" } else { "-Infinity" });
                    Ok(())
                }
                other => Err(mismatch(&ValueType::$variant, other)),
            },
            |reader, _| {
                if !reader.is_string_next()? {
                    return reader.read_integer::<$ty>($name).map(Value::$variant);
                }
                let start = reader.position();
                match &*reader.read_string()? {
                    "NaN" => Ok(Value::$variant($ty::NAN)),
                    "Infinity" => Ok(Value::$variant($ty::INFINITY)),
                    "-Infinity" => Ok(Value::$variant($ty::NEG_INFINITY)),
                    other => Err(RuntimeError::at(format!("Unable to parse '{other}' as {}", $name), start)),
                }
            },
        )
    };
}

/// Handlers of the scalar value types.
pub(super) fn handler(value_type: &ValueType) -> Option<TypeHandler> {
    let handler = match value_type {
        ValueType::Bool => TypeHandler::new(
            ValueType::Bool,
            |value, writer, _| match value {
                Value::Bool(v) => {
                    writer.write_bool(*v);
                    Ok(())
                }
                other => Err(mismatch(&ValueType::Bool, other)),
            },
            |reader, _| reader.read_bool().map(Value::Bool),
        ),
        ValueType::I8 => integer_handler!(I8, i8, "i8"),
        ValueType::I16 => integer_handler!(I16, i16, "i16"),
        ValueType::I32 => integer_handler!(I32, i32, "i32"),
        ValueType::I64 => integer_handler!(I64, i64, "i64"),
        ValueType::U8 => integer_handler!(U8, u8, "u8"),
        ValueType::U16 => integer_handler!(U16, u16, "u16"),
        ValueType::U32 => integer_handler!(U32, u32, "u32"),
        ValueType::U64 => integer_handler!(U64, u64, "u64"),
        ValueType::ISize => integer_handler!(ISize, isize, "isize"),
        ValueType::USize => integer_handler!(USize, usize, "usize"),
        ValueType::F32 => float_handler!(F32, f32, "f32"),
        ValueType::F64 => float_handler!(F64, f64, "f64"),
        ValueType::Char => char_handler(),
        ValueType::String => TypeHandler::new(
            ValueType::String,
            |value, writer, _| match value {
                Value::Null => {
                    writer.write_null();
                    Ok(())
                }
                Value::String(v) => {
                    writer.write_string(v);
                    Ok(())
                }
                other => Err(mismatch(&ValueType::String, other)),
            },
            |reader, _| {
                if reader.try_read_null()? {
                    return Ok(Value::Null);
                }
                Ok(Value::String(reader.read_string()?.into_owned()))
            },
        ),
        ValueType::Bytes => bytes_handler(),
        ValueType::Guid => guid_handler(),
        ValueType::Decimal => decimal_handler(),
        ValueType::DateTime => date_time_handler(),
        ValueType::DateTimeOffset => date_time_offset_handler(),
        _ => return None,
    };
    Some(handler)
}

fn char_handler() -> TypeHandler {
    TypeHandler::new(
        ValueType::Char,
        |value, writer, _| match value {
            Value::Char(v) => {
                writer.write_string(v.encode_utf8(&mut [0; 4]));
                Ok(())
            }
            other => Err(mismatch(&ValueType::Char, other)),
        },
        |reader, _| {
            let start = reader.position();
            let text = reader.read_string()?;
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Char(c)),
                _ => Err(RuntimeError::at(
                    format!(
                        "Error while reading char property. String length is {} (!= 1)",
                        text.chars().count()
                    ),
                    start,
                )),
            }
        },
    )
}

fn bytes_handler() -> TypeHandler {
    TypeHandler::new(
        ValueType::Bytes,
        |value, writer, _| match value {
            Value::Null => {
                writer.write_null();
                Ok(())
            }
            Value::Bytes(v) => {
                writer.write_string(&STANDARD.encode(v));
                Ok(())
            }
            other => Err(mismatch(&ValueType::Bytes, other)),
        },
        |reader, _| {
            if reader.try_read_null()? {
                return Ok(Value::Null);
            }
            let start = reader.position();
            let text = reader.read_string()?;
            STANDARD
                .decode(text.as_bytes())
                .map(Value::Bytes)
                .map_err(|e| RuntimeError::at(format!("Unable to parse base64 value: {e}"), start))
        },
    )
}

/// Reads a string and parses it with `parse`, naming `type_name` on failure.
fn parse_string<T>(
    reader: &mut JsonReader<'_>,
    type_name: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<T, RuntimeError> {
    reader.peek()?;
    let start = reader.position();
    let text = reader.read_string()?;
    parse(&text).ok_or_else(|| RuntimeError::at(format!("Unable to parse '{text}' as {type_name}"), start))
}

fn guid_handler() -> TypeHandler {
    TypeHandler::new(
        ValueType::Guid,
        |value, writer, _| match value {
            Value::Guid(v) => {
                writer.write_string(&v.hyphenated().to_string());
                Ok(())
            }
            other => Err(mismatch(&ValueType::Guid, other)),
        },
        |reader, _| parse_string(reader, "Guid", |s| Uuid::parse_str(s).ok()).map(Value::Guid),
    )
}

fn decimal_handler() -> TypeHandler {
    TypeHandler::new(
        ValueType::Decimal,
        |value, writer, _| match value {
            Value::Decimal(v) => {
                writer.write_number(v);
                Ok(())
            }
            other => Err(mismatch(&ValueType::Decimal, other)),
        },
        |reader, _| {
            reader.peek()?;
            let start = reader.position();
            let text = reader.read_number()?;
            text.parse::<Decimal>()
                .or_else(|_| Decimal::from_scientific(text))
                .map(Value::Decimal)
                .map_err(|_| RuntimeError::at(format!("Unable to parse '{text}' as Decimal"), start))
        },
    )
}

fn date_time_handler() -> TypeHandler {
    TypeHandler::new(
        ValueType::DateTime,
        |value, writer, _| match value {
            Value::DateTime(v) => {
                writer.write_string(&v.format(DATE_TIME_FORMAT).to_string());
                Ok(())
            }
            other => Err(mismatch(&ValueType::DateTime, other)),
        },
        |reader, _| {
            parse_string(reader, "DateTime", |s| s.parse::<NaiveDateTime>().ok()).map(Value::DateTime)
        },
    )
}

fn date_time_offset_handler() -> TypeHandler {
    TypeHandler::new(
        ValueType::DateTimeOffset,
        |value, writer, _| match value {
            Value::DateTimeOffset(v) => {
                writer.write_string(&v.to_rfc3339_opts(SecondsFormat::AutoSi, false));
                Ok(())
            }
            other => Err(mismatch(&ValueType::DateTimeOffset, other)),
        },
        |reader, _| {
            parse_string(reader, "DateTimeOffset", |s| DateTime::parse_from_rfc3339(s).ok())
                .map(Value::DateTimeOffset)
        },
    )
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use cl_reflect::Value;
    use cl_reflect::info::ValueType;

    use super::handler;
    use crate::context::Codecs;
    use crate::json::{JsonReader, JsonWriter};

    fn write(value_type: ValueType, value: Value) -> String {
        let mut writer = JsonWriter::new();
        handler(&value_type).unwrap().serialize(&value, &mut writer, &Codecs::empty()).unwrap();
        writer.into_string()
    }

    fn read(value_type: ValueType, json: &str) -> Result<Value, String> {
        let codecs = Codecs::empty();
        let mut reader = JsonReader::new(json.as_bytes());
        handler(&value_type)
            .unwrap()
            .deserialize(&mut reader, &codecs)
            .map_err(|e| e.to_string())
    }

    #[test]
    fn integers_are_range_checked() {
        assert_eq!(read(ValueType::U8, "255"), Ok(Value::U8(255)));
        assert_eq!(
            read(ValueType::U8, "256"),
            Err("Unable to parse '256' as u8 (at byte position: 0)".to_string())
        );
        assert_eq!(read(ValueType::I64, "-9223372036854775808"), Ok(Value::I64(i64::MIN)));
        assert!(read(ValueType::I32, "\"1\"").is_err());
    }

    #[test]
    fn non_finite_floats() {
        assert_eq!(write(ValueType::F64, Value::F64(f64::NAN)), r#""NaN""#);
        assert_eq!(write(ValueType::F32, Value::F32(f32::NEG_INFINITY)), r#""-Infinity""#);
        assert_eq!(write(ValueType::F64, Value::F64(4.25)), "4.25");
        assert_eq!(read(ValueType::F64, r#""Infinity""#), Ok(Value::F64(f64::INFINITY)));
        assert_eq!(read(ValueType::F32, "1e3"), Ok(Value::F32(1000.0)));
        assert!(read(ValueType::F64, r#""inf""#).is_err());
    }

    #[test]
    fn chars_need_exactly_one_character() {
        assert_eq!(write(ValueType::Char, Value::Char('\0')), r#""\u0000""#);
        assert_eq!(read(ValueType::Char, r#""é""#), Ok(Value::Char('é')));
        assert_eq!(
            read(ValueType::Char, r#""ab""#),
            Err("Error while reading char property. String length is 2 (!= 1) (at byte position: 0)".to_string())
        );
        assert!(read(ValueType::Char, r#""""#).is_err());
    }

    #[test]
    fn special_scalars() {
        let guid = uuid::Uuid::parse_str("0f8fad5b-d9cb-469f-a165-70867728950e").unwrap();
        assert_eq!(
            write(ValueType::Guid, Value::Guid(guid)),
            r#""0f8fad5b-d9cb-469f-a165-70867728950e""#
        );
        assert_eq!(
            read(ValueType::Guid, r#""0F8FAD5B-D9CB-469F-A165-70867728950E""#),
            Ok(Value::Guid(guid))
        );

        assert_eq!(write(ValueType::Bytes, Value::Bytes(vec![1, 2, 3])), r#""AQID""#);
        assert_eq!(read(ValueType::Bytes, r#""AQID""#), Ok(Value::Bytes(vec![1, 2, 3])));
        assert_eq!(read(ValueType::Bytes, "null"), Ok(Value::Null));

        let decimal: rust_decimal::Decimal = "4.2".parse().unwrap();
        assert_eq!(write(ValueType::Decimal, Value::Decimal(decimal)), "4.2");
        assert_eq!(read(ValueType::Decimal, "4.2"), Ok(Value::Decimal(decimal)));
        assert_eq!(read(ValueType::Decimal, "4.2e0"), Ok(Value::Decimal(decimal)));
    }

    #[test]
    fn date_times() {
        let value = read(ValueType::DateTime, r#""2020-01-02T03:04:05.5""#).unwrap();
        assert_eq!(write(ValueType::DateTime, value), r#""2020-01-02T03:04:05.500""#);

        let value = read(ValueType::DateTimeOffset, r#""2020-01-02T03:04:05+02:00""#).unwrap();
        assert_eq!(
            write(ValueType::DateTimeOffset, value),
            r#""2020-01-02T03:04:05+02:00""#
        );
        assert!(read(ValueType::DateTime, r#""yesterday""#).is_err());
    }
}
