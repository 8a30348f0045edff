//! Descriptions of the types a context can compile.
//!
//! ## Menu
//!
//! - [`TypeInfo`]: An interface or class, built with [`TypeInfo::interface`]
//!   or [`TypeInfo::class`].
//!     - [`FieldInfo`]: A named storage slot of a class.
//!     - [`PropertyInfo`]: A named, typed property with optional source accessors.
//!     - [`MemberInfo`]: Any other named member (method, event), only used for
//!       name collision checks.
//! - [`EnumInfo`]: An enum with an integral [`IntKind`] and its members.
//! - [`ValueType`]: The closed set of property value types.

// -----------------------------------------------------------------------------
// Modules

mod enum_info;
mod field_info;
mod property_info;
mod type_info;
mod value_type;

// -----------------------------------------------------------------------------
// Exports

pub use enum_info::{EnumInfo, EnumInfoBuilder, EnumMember, IntKind};
pub use field_info::FieldInfo;
pub use property_info::{Getter, PropertyFlags, PropertyInfo, Setter};
pub use type_info::{ChangeRaiser, Constructor, MemberInfo, MemberKind};
pub use type_info::{TypeFlags, TypeInfo, TypeInfoBuilder, TypeKind};
pub use value_type::ValueType;

/// Returns the last `::` separated segment of a type path.
#[inline]
pub(crate) fn short_name(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}
