//! Deterministic hashing for the crate. The hashing data structures in the standard library
//! are randomly seeded, so iteration order over a `std::collections::HashMap` can change from
//! run to run. Everything that feeds the simulation uses the aliases below instead.
//!
//! `HashMap<K, V, S>` does not have a `new` method for a non-default hasher. Use
//! `HashMap::default()` to create one.
//!
//! The `hash_str` free function derives per-stream seed offsets in
//! `crate::random::Sampler::from_stream`.

use xxhash_rust::xxh3::xxh3_64;

pub use rustc_hash::{FxBuildHasher, FxHashMap as HashMap, FxHashSet as HashSet};

/// An insertion-ordered set with the deterministic hasher.
pub type IndexSet<T> = indexmap::IndexSet<T, FxBuildHasher>;

/// A convenience method to compute the hash of a `&str`.
pub fn hash_str(data: &str) -> u64 {
    xxh3_64(data.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_strings() {
        let a = hash_str("hello");
        let b = hash_str("hello");
        let c = hash_str("world");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn index_set_keeps_insertion_order() {
        let mut set: IndexSet<u32> = IndexSet::default();
        for value in [5, 3, 9, 3, 1] {
            set.insert(value);
        }
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![5, 3, 9, 1]);
    }
}
