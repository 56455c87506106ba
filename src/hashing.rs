//! Deterministic `HashMap` and `HashSet` variants. The standard library's hash maps are seeded
//! randomly per process, which would make any iteration over them differ between runs with the
//! same random seed. Use `HashMap::default()` to create one.

pub use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
