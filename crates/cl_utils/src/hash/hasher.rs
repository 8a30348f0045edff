use core::hash::{BuildHasher, Hasher};

use foldhash::fast::{FixedState, FoldHasher};

// -----------------------------------------------------------------------------
// FixedHashState

const SEED: u64 = 0x3C6E_F372_FE94_F82B;

/// The hasher built by [`FixedHashState`].
pub type FixedHasher = FoldHasher<'static>;

/// foldhash with a constant seed, so equal inputs hash equally in every
/// process.
///
/// # Examples
///
/// ```
/// use core::hash::BuildHasher;
/// use cl_utils::hash::FixedHashState;
///
/// assert_eq!(FixedHashState.hash_one("IRoot"), FixedHashState.hash_one("IRoot"));
/// ```
#[derive(Copy, Clone, Default, Debug)]
pub struct FixedHashState;

impl BuildHasher for FixedHashState {
    type Hasher = FixedHasher;

    #[inline]
    fn build_hasher(&self) -> FixedHasher {
        FixedState::with_seed(SEED).build_hasher()
    }
}

// -----------------------------------------------------------------------------
// NoOpHashState

/// Uses the last `u64` written as the hash.
///
/// Meant for [`TypeId`](core::any::TypeId) keys, which hash themselves
/// through `write_u64`.
#[derive(Copy, Clone, Default, Debug)]
pub struct NoOpHasher(u64);

impl Hasher for NoOpHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.0 = self.0.rotate_left(8) ^ u64::from(byte);
        }
    }

    #[inline]
    fn write_u64(&mut self, value: u64) {
        self.0 = value;
    }
}

#[derive(Copy, Clone, Default, Debug)]
pub struct NoOpHashState;

impl BuildHasher for NoOpHashState {
    type Hasher = NoOpHasher;

    #[inline]
    fn build_hasher(&self) -> NoOpHasher {
        NoOpHasher(0)
    }
}
