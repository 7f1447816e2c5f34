//! Hash collections, switchable to the std implementations via `std-hash`.

#[cfg(not(feature = "std-hash"))]
mod imp {
    pub type Map<K, V> = hashbrown::HashMap<K, V>;
}

#[cfg(feature = "std-hash")]
mod imp {
    pub type Map<K, V> = std::collections::HashMap<K, V>;
}

pub use imp::Map;
