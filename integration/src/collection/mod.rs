//! Small collection utilities reused across the order-queue and
//! websocket-subscription registries.

/// Fast `IndexMap` using the FNV hasher — good for the small,
/// high-churn keys (symbols, order ids) used throughout.
pub type FnvIndexMap<K, V> = indexmap::IndexMap<K, V, fnv::FnvBuildHasher>;

/// Fast `IndexSet` using the FNV hasher.
pub type FnvIndexSet<T> = indexmap::IndexSet<T, fnv::FnvBuildHasher>;
