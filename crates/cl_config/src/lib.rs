//! Configuration requests of a context and the issues a build reports.
//!
//! - [`ContextConfig`], [`TypeConfig`], [`PropertyConfig`]: fluent builders
//!   recording options per scope, with the call site of every call.
//! - [`OptionBag`]: the options of one scope, keyed by declaration type.
//! - [`options`]: the built-in option declarations.
//! - [`PropertyRequest`]: property options in serde form.
//! - [`Issue`], [`IssueKind`], [`IssueCollector`], [`ConfigurationError`].

// -----------------------------------------------------------------------------
// Modules

mod bag;
mod config;
mod issue;
mod request;

pub mod options;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use bag::{OptionBag, OptionCall, RepeatedOption};
pub use config::{AnyEntityConfig, ContextConfig, PropertyConfig, TypeCharacter, TypeConfig};
pub use issue::{ConfigurationError, Issue, IssueCollector, IssueKind, IssueSource, Severity};
pub use request::PropertyRequest;
