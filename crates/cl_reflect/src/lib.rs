//! Runtime description of the caller's data types.
//!
//! Rust has no runtime reflection over arbitrary structs, so the types a
//! context compiles are described explicitly:
//!
//! - [`info`]: [`TypeInfo`](info::TypeInfo) for interfaces and classes, with
//!   their fields, properties and source accessors, plus
//!   [`EnumInfo`](info::EnumInfo) and the closed [`ValueType`](info::ValueType)
//!   set.
//! - [`Value`]: the dynamically typed value moved through getters, setters
//!   and codecs.
//! - [`Fields`]: the slot storage of one instance.
//!
//! # Examples
//!
//! ```
//! use cl_reflect::info::{PropertyInfo, TypeInfo, ValueType};
//!
//! let root = TypeInfo::interface("models::IRoot")
//!     .property(PropertyInfo::new("RootInt", ValueType::I32))
//!     .property(PropertyInfo::new("RootString", ValueType::String))
//!     .build();
//!
//! assert_eq!(root.name(), "IRoot");
//! assert_eq!(root.properties().len(), 2);
//! ```

// -----------------------------------------------------------------------------
// Modules

mod fields;
mod value;

pub mod info;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use fields::{FieldLayout, Fields};
pub use value::{EnumValue, ObjectValue, Value};
