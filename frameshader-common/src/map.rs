/// Fast hash map type for small sets keyed by uniform or parameter names.
pub type FastHashMap<K, V> = rustc_hash::FxHashMap<K, V>;
