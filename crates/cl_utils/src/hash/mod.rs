//! Hash containers with deterministic seeds and the dispatch key hash.

mod hasher;
mod key_hash;

pub use hasher::{FixedHashState, FixedHasher, NoOpHashState, NoOpHasher};
pub use key_hash::fast_hash;

/// A [`hashbrown::HashMap`] hashing with [`FixedHashState`].
///
/// Create instances with `HashMap::default()`.
pub type HashMap<K, V, S = FixedHashState> = hashbrown::HashMap<K, V, S>;

/// A [`hashbrown::HashSet`] hashing with [`FixedHashState`].
pub type HashSet<T, S = FixedHashState> = hashbrown::HashSet<T, S>;

pub use foldhash;
pub use hashbrown;
