use core::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::info::{EnumInfo, short_name};
use crate::{EnumValue, Value};

/// The type of a property or field.
///
/// `String`, `Bytes`, `List` and `Object` are reference-like: their system
/// default is [`Value::Null`] and they accept it. `Nullable` wraps a value
/// type to make it accept null too.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    ISize,
    USize,
    Char,
    F32,
    F64,
    String,
    Bytes,
    Guid,
    Decimal,
    DateTime,
    DateTimeOffset,
    Enum(Arc<EnumInfo>),
    Nullable(Box<ValueType>),
    List(Box<ValueType>),
    /// A nested owned type, by full path.
    Object(Arc<str>),
    /// A type no codec exists for.
    Opaque(Arc<str>),
}

impl ValueType {
    #[inline]
    pub fn nullable(inner: ValueType) -> Self {
        Self::Nullable(Box::new(inner))
    }

    #[inline]
    pub fn list(item: ValueType) -> Self {
        Self::List(Box::new(item))
    }

    #[inline]
    pub fn object(path: &str) -> Self {
        Self::Object(Arc::from(path))
    }

    #[inline]
    pub fn opaque(path: &str) -> Self {
        Self::Opaque(Arc::from(path))
    }

    #[inline]
    pub fn enumeration(info: &Arc<EnumInfo>) -> Self {
        Self::Enum(Arc::clone(info))
    }

    /// Returns `true` if [`Value::Null`] is a valid value of this type.
    pub fn is_nullable(&self) -> bool {
        matches!(
            self,
            Self::String | Self::Bytes | Self::Nullable(_) | Self::List(_) | Self::Object(_) | Self::Opaque(_)
        )
    }

    /// The value a freshly allocated slot of this type holds.
    pub fn system_default(&self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::I8 => Value::I8(0),
            Self::I16 => Value::I16(0),
            Self::I32 => Value::I32(0),
            Self::I64 => Value::I64(0),
            Self::U8 => Value::U8(0),
            Self::U16 => Value::U16(0),
            Self::U32 => Value::U32(0),
            Self::U64 => Value::U64(0),
            Self::ISize => Value::ISize(0),
            Self::USize => Value::USize(0),
            Self::Char => Value::Char('\0'),
            Self::F32 => Value::F32(0.0),
            Self::F64 => Value::F64(0.0),
            Self::Guid => Value::Guid(Uuid::nil()),
            Self::Decimal => Value::Decimal(Decimal::ZERO),
            Self::DateTime => Value::DateTime(NaiveDateTime::default()),
            Self::DateTimeOffset => Value::DateTimeOffset(DateTime::<FixedOffset>::default()),
            Self::Enum(info) => Value::Enum(EnumValue::new(info, 0)),
            Self::String
            | Self::Bytes
            | Self::Nullable(_)
            | Self::List(_)
            | Self::Object(_)
            | Self::Opaque(_) => Value::Null,
        }
    }

    /// Returns `true` if `value` may be stored in a slot of this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => self.is_nullable(),
            (Self::Bool, Value::Bool(_))
            | (Self::I8, Value::I8(_))
            | (Self::I16, Value::I16(_))
            | (Self::I32, Value::I32(_))
            | (Self::I64, Value::I64(_))
            | (Self::U8, Value::U8(_))
            | (Self::U16, Value::U16(_))
            | (Self::U32, Value::U32(_))
            | (Self::U64, Value::U64(_))
            | (Self::ISize, Value::ISize(_))
            | (Self::USize, Value::USize(_))
            | (Self::Char, Value::Char(_))
            | (Self::F32, Value::F32(_))
            | (Self::F64, Value::F64(_))
            | (Self::String, Value::String(_))
            | (Self::Bytes, Value::Bytes(_))
            | (Self::Guid, Value::Guid(_))
            | (Self::Decimal, Value::Decimal(_))
            | (Self::DateTime, Value::DateTime(_))
            | (Self::DateTimeOffset, Value::DateTimeOffset(_)) => true,
            (Self::Enum(info), Value::Enum(v)) => info.path() == v.info().path(),
            (Self::Nullable(inner), v) => inner.accepts(v),
            (Self::List(item), Value::List(items)) => items.iter().all(|v| item.accepts(v)),
            (Self::Object(path), Value::Object(v)) => v.is_a(path),
            (Self::Opaque(_), _) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::I8 => f.write_str("i8"),
            Self::I16 => f.write_str("i16"),
            Self::I32 => f.write_str("i32"),
            Self::I64 => f.write_str("i64"),
            Self::U8 => f.write_str("u8"),
            Self::U16 => f.write_str("u16"),
            Self::U32 => f.write_str("u32"),
            Self::U64 => f.write_str("u64"),
            Self::ISize => f.write_str("isize"),
            Self::USize => f.write_str("usize"),
            Self::Char => f.write_str("char"),
            Self::F32 => f.write_str("f32"),
            Self::F64 => f.write_str("f64"),
            Self::String => f.write_str("String"),
            Self::Bytes => f.write_str("Bytes"),
            Self::Guid => f.write_str("Guid"),
            Self::Decimal => f.write_str("Decimal"),
            Self::DateTime => f.write_str("DateTime"),
            Self::DateTimeOffset => f.write_str("DateTimeOffset"),
            Self::Enum(info) => f.write_str(info.name()),
            Self::Nullable(inner) => write!(f, "Option<{inner}>"),
            Self::List(item) => write!(f, "Vec<{item}>"),
            Self::Object(path) | Self::Opaque(path) => f.write_str(short_name(path)),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::ValueType;
    use crate::Value;

    #[test]
    fn nullability() {
        assert!(ValueType::String.accepts(&Value::Null));
        assert!(!ValueType::I32.accepts(&Value::Null));
        assert!(ValueType::nullable(ValueType::I32).accepts(&Value::Null));
        assert!(ValueType::nullable(ValueType::I32).accepts(&Value::I32(1)));
        assert!(!ValueType::nullable(ValueType::I32).accepts(&Value::I64(1)));
    }

    #[test]
    fn lists_check_items() {
        let ty = ValueType::list(ValueType::I32);
        assert!(ty.accepts(&Value::List(vec![Value::I32(1), Value::I32(2)])));
        assert!(!ty.accepts(&Value::List(vec![Value::I32(1), Value::Null])));
        assert_eq!(ty.system_default(), Value::Null);
        assert_eq!(ty.to_string(), "Vec<i32>");
    }

    #[test]
    fn system_defaults() {
        assert_eq!(ValueType::Char.system_default(), Value::Char('\0'));
        assert_eq!(ValueType::F64.system_default(), Value::F64(0.0));
        assert!(ValueType::nullable(ValueType::Guid).system_default().is_null());
    }
}
