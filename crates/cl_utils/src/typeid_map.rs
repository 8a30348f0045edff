use core::any::TypeId;
use core::fmt;

use crate::hash::NoOpHashState;
use crate::hash::hashbrown::HashMap;

/// A map from types to values of one kind `V`.
///
/// Option bags keep one slot per option declaration type, entities one
/// extension state per state type.
///
/// # Examples
///
/// ```
/// use cl_utils::TypeIdMap;
///
/// struct Marker;
///
/// let mut map = TypeIdMap::new();
/// map.insert_type::<Marker>(1);
/// assert_eq!(map.get_type::<Marker>(), Some(&1));
/// assert!(map.get_type::<u8>().is_none());
/// ```
pub struct TypeIdMap<V> {
    entries: HashMap<TypeId, V, NoOpHashState>,
}

impl<V> TypeIdMap<V> {
    #[inline]
    pub const fn new() -> Self {
        Self {
            entries: HashMap::with_hasher(NoOpHashState),
        }
    }

    /// The value under `key`, created by `init` on first access.
    #[inline]
    pub fn get_or_insert(&mut self, key: TypeId, init: impl FnOnce() -> V) -> &mut V {
        self.entries.entry(key).or_insert_with(init)
    }

    #[inline]
    pub fn get_type<T: ?Sized + 'static>(&self) -> Option<&V> {
        self.entries.get(&TypeId::of::<T>())
    }

    #[inline]
    pub fn get_mut_type<T: ?Sized + 'static>(&mut self) -> Option<&mut V> {
        self.entries.get_mut(&TypeId::of::<T>())
    }

    /// Stores `value` for `T`, returning the replaced one.
    #[inline]
    pub fn insert_type<T: ?Sized + 'static>(&mut self, value: V) -> Option<V> {
        self.entries.insert(TypeId::of::<T>(), value)
    }

    #[inline]
    pub fn contains_type<T: ?Sized + 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in unspecified order.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&TypeId, &V)> {
        self.entries.iter()
    }
}

impl<V> Default for TypeIdMap<V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Clone for TypeIdMap<V> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for TypeIdMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.values().enumerate()).finish()
    }
}

// -----------------------------------------------------------------------------
// Tests
