//! Compiles configured types into instance factories and a JSON codec.
//!
//! A [`ContextBuilder`] collects the declared types and their options. Its
//! build runs in stages:
//!
//! 1. The [`TypeGraph`] is built from the declared types and their
//!    ancestors, validating inheritance and resolving every property.
//! 2. Extensions validate the configuration against the graph.
//! 3. A [`TypeHandler`] is resolved for every property type.
//! 4. Each declared type is compiled into an [`EntityMeta`].
//!
//! Any error aborts the build with every issue reported so far. The built
//! [`Context`] creates [`Entity`] instances and encodes arrays of them as
//! JSON objects carrying a `"_t"` discriminator first.
//!
//! # Examples
//!
//! ```
//! use cl_codec::ContextBuilder;
//! use cl_reflect::Value;
//! use cl_reflect::info::{PropertyInfo, TypeInfo, ValueType};
//!
//! let root = TypeInfo::interface("models::IRoot")
//!     .property(PropertyInfo::new("RootInt", ValueType::I32))
//!     .property(PropertyInfo::new("RootString", ValueType::String))
//!     .build();
//!
//! let mut builder = ContextBuilder::new();
//! builder.entity(&root);
//! let context = builder.build().unwrap();
//!
//! let mut entity = context.create("IRoot").unwrap();
//! entity.set("RootInt", 42).unwrap();
//!
//! let json = context.serialize(&[entity]).unwrap();
//! assert_eq!(json, r#"[{"_t":"IRoot","RootInt":42,"RootString":null}]"#);
//!
//! let decoded = context.deserialize_str(&json).unwrap();
//! assert_eq!(decoded[0].get("RootInt").unwrap(), Value::I32(42));
//! ```

// -----------------------------------------------------------------------------
// Modules

mod compiler;
mod context;
mod entity;
mod error;
mod extension;
mod graph;
mod handler;
mod notify;

pub mod dispatch;
pub mod json;

#[cfg(test)]
mod tests;

// -----------------------------------------------------------------------------
// Top-level exports

pub use compiler::{DISCRIMINATOR, EntityMeta, PropertyMeta};
pub use context::{Codecs, Context, ContextBuilder, EntityFactory};
pub use dispatch::DispatchTree;
pub use entity::Entity;
pub use error::{ClutchError, InternalError, RuntimeError};
pub use extension::{Extension, ExtensionContext, ExtensionState, Hook, SetterHooks, SetterStage, StateFactory};
pub use graph::{Binding, GraphNode, GraphProperty, TypeGraph};
pub use handler::{CompareFn, DeserializeFn, HandlerRegistry, SerializeFn, TypeHandler};
pub use notify::{ChangeNotifier, NotifyChangedBehavior, NotifyContextConfigExt, NotifyPropertyChanged};
pub use notify::{EnableNotifyPropertyChanged, NotifyPropertyConfigExt, SubscriptionId, UseNotifyPropertyChanged};
