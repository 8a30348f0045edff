use core::any::Any;
use core::fmt::{self, Debug, Display};
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::info::EnumInfo;

// -----------------------------------------------------------------------------
// ObjectValue

/// A nested instance stored inside a [`Value::Object`].
///
/// The compiled instance type lives in the codec crate, which depends on this
/// one, so values only see it through this object-safe trait and downcast
/// when they need the concrete type.
pub trait ObjectValue: Debug + Send + Sync + 'static {
    /// The full path of the instance's type.
    fn type_path(&self) -> &str;

    /// Returns `true` if the instance's type is `type_path` or derives from it.
    fn is_a(&self, type_path: &str) -> bool;

    /// Clones the instance behind a new box.
    fn clone_object(&self) -> Box<dyn ObjectValue>;

    /// Structural equality with another instance.
    fn eq_object(&self, other: &dyn ObjectValue) -> bool;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl Clone for Box<dyn ObjectValue> {
    #[inline]
    fn clone(&self) -> Self {
        self.clone_object()
    }
}

impl PartialEq for dyn ObjectValue {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.eq_object(other)
    }
}

// -----------------------------------------------------------------------------
// EnumValue

/// A value of a described enum.
///
/// Besides the raw integer it remembers which member it was created from, so
/// members sharing one numeric value keep their own name on the wire.
/// Equality only looks at the enum and the raw integer.
#[derive(Clone)]
pub struct EnumValue {
    info: Arc<EnumInfo>,
    raw: i128,
    member: Option<usize>,
}

impl EnumValue {
    /// Creates a value from a raw integer, wrapped into the enum's width.
    pub fn new(info: &Arc<EnumInfo>, raw: i128) -> Self {
        Self {
            info: Arc::clone(info),
            raw: info.underlying().wrap(raw),
            member: None,
        }
    }

    /// Creates the value of the member at `index`.
    pub fn of_member(info: &Arc<EnumInfo>, index: usize) -> Option<Self> {
        let member = info.members().get(index)?;
        Some(Self {
            info: Arc::clone(info),
            raw: member.value(),
            member: Some(index),
        })
    }

    #[inline]
    pub fn info(&self) -> &Arc<EnumInfo> {
        &self.info
    }

    #[inline]
    pub fn raw(&self) -> i128 {
        self.raw
    }

    /// Index of the member this value was created from, if any.
    #[inline]
    pub fn member_index(&self) -> Option<usize> {
        self.member
    }

    /// The member name to use for this value.
    ///
    /// The recorded member if there is one, else the first declared member
    /// with the same numeric value.
    pub fn name(&self) -> Option<&str> {
        let index = self.member.or_else(|| self.info.find_member(self.raw))?;
        self.info.members().get(index).map(|m| m.name())
    }
}

impl PartialEq for EnumValue {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
            && (Arc::ptr_eq(&self.info, &other.info) || self.info.path() == other.info.path())
    }
}

impl Debug for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}::{}({})", self.info.name(), name, self.raw),
            None => write!(f, "{}({})", self.info.name(), self.raw),
        }
    }
}

impl Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => Display::fmt(&self.raw, f),
        }
    }
}

// -----------------------------------------------------------------------------
// Value

/// A dynamically typed property or field value.
///
/// `Null` stands for every absent state: a `None` nullable, a null string,
/// byte array, list or nested object.
///
/// # Examples
///
/// ```
/// use cl_reflect::Value;
///
/// let value = Value::from(42_i32);
/// assert_eq!(value.as_i32(), Some(42));
/// assert_eq!(value.to_string(), "42");
///
/// assert!(Value::from(None::<i32>).is_null());
/// assert_eq!(Value::from("42").as_str(), Some("42"));
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    ISize(isize),
    USize(usize),
    Char(char),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    Guid(Uuid),
    Decimal(Decimal),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    Enum(EnumValue),
    List(Vec<Value>),
    Object(Box<dyn ObjectValue>),
}

macro_rules! impl_copy_conversions {
    ($($variant:ident($ty:ty) => $as_fn:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*

        impl Value {
            $(
                #[doc = concat!("Returns the payload of a [`Value::", stringify!($variant), "`].")]
                #[inline]
                pub fn $as_fn(&self) -> Option<$ty> {
                    match self {
                        Self::$variant(v) => Some(*v),
                        _ => None,
                    }
                }
            )*
        }
    };
}

impl_copy_conversions! {
    Bool(bool) => as_bool,
    I8(i8) => as_i8,
    I16(i16) => as_i16,
    I32(i32) => as_i32,
    I64(i64) => as_i64,
    U8(u8) => as_u8,
    U16(u16) => as_u16,
    U32(u32) => as_u32,
    U64(u64) => as_u64,
    ISize(isize) => as_isize,
    USize(usize) => as_usize,
    Char(char) => as_char,
    F32(f32) => as_f32,
    F64(f64) => as_f64,
    Guid(Uuid) => as_guid,
    Decimal(Decimal) => as_decimal,
    DateTime(NaiveDateTime) => as_date_time,
    DateTimeOffset(DateTime<FixedOffset>) => as_date_time_offset,
}

impl From<String> for Value {
    #[inline]
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for Value {
    #[inline]
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<Vec<u8>> for Value {
    #[inline]
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<Vec<Value>> for Value {
    #[inline]
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}

impl From<EnumValue> for Value {
    #[inline]
    fn from(value: EnumValue) -> Self {
        Self::Enum(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    #[inline]
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl Value {
    /// Wraps a nested instance.
    #[inline]
    pub fn object(value: impl ObjectValue) -> Self {
        Self::Object(Box::new(value))
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Self::Enum(v) => Some(v),
            _ => None,
        }
    }

    /// Borrows a nested instance as its concrete type.
    pub fn downcast_object<T: ObjectValue>(&self) -> Option<&T> {
        match self {
            Self::Object(v) => v.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Mutably borrows a nested instance as its concrete type.
    pub fn downcast_object_mut<T: ObjectValue>(&mut self) -> Option<&mut T> {
        match self {
            Self::Object(v) => v.as_any_mut().downcast_mut::<T>(),
            _ => None,
        }
    }

    /// Takes a nested instance out as its concrete type.
    pub fn into_object<T: ObjectValue>(self) -> Option<T> {
        match self {
            Self::Object(v) => v.into_any().downcast::<T>().ok().map(|b| *b),
            _ => None,
        }
    }

    /// Short name of the variant, used in type mismatch messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::ISize(_) => "isize",
            Self::USize(_) => "usize",
            Self::Char(_) => "char",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Guid(_) => "guid",
            Self::Decimal(_) => "decimal",
            Self::DateTime(_) => "datetime",
            Self::DateTimeOffset(_) => "datetime-offset",
            Self::Enum(_) => "enum",
            Self::List(_) => "list",
            Self::Object(_) => "object",
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => Display::fmt(v, f),
            Self::I8(v) => Display::fmt(v, f),
            Self::I16(v) => Display::fmt(v, f),
            Self::I32(v) => Display::fmt(v, f),
            Self::I64(v) => Display::fmt(v, f),
            Self::U8(v) => Display::fmt(v, f),
            Self::U16(v) => Display::fmt(v, f),
            Self::U32(v) => Display::fmt(v, f),
            Self::U64(v) => Display::fmt(v, f),
            Self::ISize(v) => Display::fmt(v, f),
            Self::USize(v) => Display::fmt(v, f),
            Self::Char(v) => Display::fmt(v, f),
            Self::F32(v) => Display::fmt(v, f),
            Self::F64(v) => Display::fmt(v, f),
            Self::String(v) => f.write_str(v),
            Self::Bytes(v) => Debug::fmt(v, f),
            Self::Guid(v) => Display::fmt(v, f),
            Self::Decimal(v) => Display::fmt(v, f),
            Self::DateTime(v) => Display::fmt(&v.format("%Y-%m-%dT%H:%M:%S%.f"), f),
            Self::DateTimeOffset(v) => f.write_str(&v.to_rfc3339()),
            Self::Enum(v) => Display::fmt(v, f),
            Self::List(items) => {
                f.write_str("[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    Display::fmt(item, f)?;
                }
                f.write_str("]")
            }
            Self::Object(v) => write!(f, "{{{}}}", v.type_path()),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{EnumValue, Value};
    use crate::info::{EnumInfo, IntKind};

    #[test]
    fn conversions() {
        assert_eq!(Value::from(7_u8).as_u8(), Some(7));
        assert_eq!(Value::from(7_u8).as_i32(), None);
        assert_eq!(Value::from(Some('x')), Value::Char('x'));
        assert_eq!(Value::from(vec![4_u8, 2]).as_bytes(), Some(&[4_u8, 2][..]));
        assert_eq!(Value::default(), Value::Null);
    }

    #[test]
    fn nan_is_never_equal() {
        assert_ne!(Value::F64(f64::NAN), Value::F64(f64::NAN));
        assert_eq!(Value::F64(f64::INFINITY), Value::F64(f64::INFINITY));
    }

    #[test]
    fn enum_values_compare_by_number() {
        let info = EnumInfo::builder("models::EnumULong", IntKind::U64)
            .member("UValM5Dublicate", -5)
            .member("UValM5", -5)
            .build();

        let first = EnumValue::of_member(&info, 0).unwrap();
        let second = EnumValue::of_member(&info, 1).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_string(), "UValM5Dublicate");
        assert_eq!(second.to_string(), "UValM5");
        assert_eq!(first.raw(), u64::MAX as i128 - 4);

        let plain = EnumValue::new(&info, 42);
        assert_eq!(plain.to_string(), "42");
        assert_eq!(Value::from(plain).to_string(), "42");
    }
}
