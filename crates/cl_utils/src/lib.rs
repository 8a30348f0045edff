//! Small shared building blocks of the clutch crates.
//!
//! - [`hash`]: hash containers with fixed seeds and the byte-key hash used by
//!   the generated dispatch trees.
//! - [`TypeIdMap`]: a map keyed by [`TypeId`](core::any::TypeId), used for
//!   option slots and per-instance extension state.

// -----------------------------------------------------------------------------
// Modules

mod typeid_map;

pub mod hash;

// -----------------------------------------------------------------------------
// Top-level exports

pub use typeid_map::TypeIdMap;
