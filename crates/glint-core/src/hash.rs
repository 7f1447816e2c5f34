//! Hashing for dependency comparison keys.
//!
//! Dependency lists (`deps![..]`) store one `u64` per tracked value. The
//! hasher defaults to `ahash`; the `std-hash` feature falls back to the
//! standard library's SipHash for builds that want zero extra dependencies.

use std::hash::{Hash, Hasher};

#[cfg(not(feature = "std-hash"))]
type KeyHasher = ahash::AHasher;

#[cfg(feature = "std-hash")]
type KeyHasher = std::collections::hash_map::DefaultHasher;

/// Hashes one value into a dependency comparison key.
#[inline]
pub fn hash_one<T: Hash>(value: &T) -> u64 {
    let mut hasher = KeyHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::hash_one;

    #[test]
    fn equal_values_hash_equal_within_a_process() {
        assert_eq!(hash_one(&42u32), hash_one(&42u32));
        assert_eq!(hash_one(&"deps"), hash_one(&"deps"));
        assert_ne!(hash_one(&1u32), hash_one(&2u32));
    }
}
