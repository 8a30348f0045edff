/// Hashes a raw byte key (a property name, a discriminator, an enum member
/// name) into the fixed-width key walked by the dispatch trees.
///
/// The hash mixes the length with a partial little-endian load of the first
/// bytes:
///
/// - 8 bytes or more: `len ^ u64(bytes[..8])`
/// - 4 to 7 bytes: `len | (u32(bytes[..4]) << 16)`
/// - shorter: `len`
///
/// It is **not** collision free. Every lookup settles equal hashes with a full
/// byte comparison.
///
/// # Examples
///
/// ```
/// use cl_utils::hash::fast_hash;
///
/// assert_eq!(fast_hash(b"_t"), 2);
/// // Only the first 8 bytes and the length take part.
/// assert_eq!(fast_hash(b"RootInt_A"), fast_hash(b"RootInt_B"));
/// ```
#[inline]
pub fn fast_hash(bytes: &[u8]) -> u64 {
    let mut hash = bytes.len() as u64;
    if let Some(head) = bytes.first_chunk::<8>() {
        hash ^= u64::from_le_bytes(*head);
    } else if let Some(head) = bytes.first_chunk::<4>() {
        hash |= (u32::from_le_bytes(*head) as u64) << 16;
    }
    hash
}
