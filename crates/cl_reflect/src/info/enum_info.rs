use core::fmt;
use core::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::EnumValue;
use crate::info::short_name;

// -----------------------------------------------------------------------------
// IntKind

/// The integral type underlying an enum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl IntKind {
    #[inline]
    pub const fn is_signed(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    pub const fn min(self) -> i128 {
        match self {
            Self::I8 => i8::MIN as i128,
            Self::I16 => i16::MIN as i128,
            Self::I32 => i32::MIN as i128,
            Self::I64 => i64::MIN as i128,
            Self::U8 | Self::U16 | Self::U32 | Self::U64 => 0,
        }
    }

    pub const fn max(self) -> i128 {
        match self {
            Self::I8 => i8::MAX as i128,
            Self::I16 => i16::MAX as i128,
            Self::I32 => i32::MAX as i128,
            Self::I64 => i64::MAX as i128,
            Self::U8 => u8::MAX as i128,
            Self::U16 => u16::MAX as i128,
            Self::U32 => u32::MAX as i128,
            Self::U64 => u64::MAX as i128,
        }
    }

    /// Returns `true` if `value` is representable without wrapping.
    #[inline]
    pub const fn fits(self, value: i128) -> bool {
        value >= self.min() && value <= self.max()
    }

    /// Truncates `value` to the width of this kind, two's complement style.
    ///
    /// ```
    /// use cl_reflect::info::IntKind;
    ///
    /// assert_eq!(IntKind::U8.wrap(-5), 251);
    /// assert_eq!(IntKind::I8.wrap(255), -1);
    /// ```
    pub const fn wrap(self, value: i128) -> i128 {
        match self {
            Self::I8 => value as i8 as i128,
            Self::I16 => value as i16 as i128,
            Self::I32 => value as i32 as i128,
            Self::I64 => value as i64 as i128,
            Self::U8 => value as u8 as i128,
            Self::U16 => value as u16 as i128,
            Self::U32 => value as u32 as i128,
            Self::U64 => value as u64 as i128,
        }
    }
}

// -----------------------------------------------------------------------------
// EnumMember

/// A named enum member.
#[derive(Clone, Debug)]
pub struct EnumMember {
    name: Arc<str>,
    value: i128,
}

impl EnumMember {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The member's value, already wrapped into the underlying width.
    #[inline]
    pub fn value(&self) -> i128 {
        self.value
    }
}

// -----------------------------------------------------------------------------
// EnumInfo

/// Runtime description of an enum.
///
/// Members keep their declaration order. Several members may share a value;
/// lookups by value return the first declared one.
///
/// # Examples
///
/// ```
/// use cl_reflect::info::{EnumInfo, IntKind};
///
/// let info = EnumInfo::builder("models::EnumByte", IntKind::U8)
///     .member("BVal0", 0)
///     .member("BVal1", 1)
///     .member("BVal2", 2)
///     .build();
///
/// assert_eq!(info.name(), "EnumByte");
/// assert_eq!(info.value("BVal2").unwrap().raw(), 2);
/// assert_eq!(info.parse("BVal1, 2").unwrap().raw(), 3);
/// assert!(info.parse("BVal3").is_none());
/// ```
#[derive(Debug)]
pub struct EnumInfo {
    path: Arc<str>,
    underlying: IntKind,
    flags: bool,
    members: Box<[EnumMember]>,
}

impl EnumInfo {
    /// Starts describing an enum with the given full path.
    pub fn builder(path: &str, underlying: IntKind) -> EnumInfoBuilder {
        EnumInfoBuilder {
            path: Arc::from(path),
            underlying,
            flags: false,
            members: Vec::new(),
        }
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The path without its module prefix.
    #[inline]
    pub fn name(&self) -> &str {
        short_name(&self.path)
    }

    #[inline]
    pub fn underlying(&self) -> IntKind {
        self.underlying
    }

    /// Returns `true` if the enum was declared as a flag set.
    #[inline]
    pub fn is_flags(&self) -> bool {
        self.flags
    }

    #[inline]
    pub fn members(&self) -> &[EnumMember] {
        &self.members
    }

    /// Index of the first member called `name`.
    pub fn member_by_name(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|m| m.name() == name)
    }

    /// Index of the first member whose value is `raw`.
    pub fn find_member(&self, raw: i128) -> Option<usize> {
        self.members.iter().position(|m| m.value == raw)
    }

    /// The value of the member called `name`.
    pub fn value(self: &Arc<Self>, name: &str) -> Option<EnumValue> {
        EnumValue::of_member(self, self.member_by_name(name)?)
    }

    /// Parses the textual form of a value.
    ///
    /// Accepts a member name, an integer, or a comma separated list of both
    /// which is combined with bitwise or. Integers outside the underlying
    /// range are rejected.
    pub fn parse(self: &Arc<Self>, text: &str) -> Option<EnumValue> {
        let mut raw: i128 = 0;
        let mut single = None;
        let mut count = 0_usize;

        for token in text.split(',') {
            let token = token.trim();
            if token.is_empty() {
                return None;
            }
            count += 1;

            if let Some(index) = self.member_by_name(token) {
                raw |= self.members[index].value;
                single = Some(index);
            } else {
                let number: i128 = token.parse().ok()?;
                if !self.underlying.fits(number) {
                    return None;
                }
                raw |= self.underlying.wrap(number);
                single = None;
            }
        }

        match (count, single) {
            (1, Some(index)) => EnumValue::of_member(self, index),
            _ => Some(EnumValue::new(self, raw)),
        }
    }
}

impl PartialEq for EnumInfo {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for EnumInfo {}

impl Hash for EnumInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl fmt::Display for EnumInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// -----------------------------------------------------------------------------
// EnumInfoBuilder

/// Builder returned by [`EnumInfo::builder`].
#[derive(Debug)]
pub struct EnumInfoBuilder {
    path: Arc<str>,
    underlying: IntKind,
    flags: bool,
    members: Vec<EnumMember>,
}

impl EnumInfoBuilder {
    /// Adds a member. The value is wrapped into the underlying width.
    pub fn member(mut self, name: &str, value: i128) -> Self {
        self.members.push(EnumMember {
            name: Arc::from(name),
            value: self.underlying.wrap(value),
        });
        self
    }

    /// Marks the enum as a flag set.
    pub fn flags(mut self) -> Self {
        self.flags = true;
        self
    }

    pub fn build(self) -> Arc<EnumInfo> {
        Arc::new(EnumInfo {
            path: self.path,
            underlying: self.underlying,
            flags: self.flags,
            members: self.members.into_boxed_slice(),
        })
    }
}

// -----------------------------------------------------------------------------
// Tests
