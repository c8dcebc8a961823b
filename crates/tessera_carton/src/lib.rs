//! Carton - The shared toolbox for Tessera.
//!
//! Like the carton an artist keeps their tools in, this crate holds the small
//! pieces every other Tessera crate reaches for: fast hash maps, inline
//! strings, stack-allocated vectors and content ids.
//!
//! # Example
//!
//! ```
//! use tessera_carton::{content_hash, CompactString, FxHashMap};
//!
//! let mut ids: FxHashMap<CompactString, String> = FxHashMap::default();
//! ids.insert(CompactString::new("/sites/home"), content_hash("/sites/home"));
//! assert_eq!(ids["/sites/home"].len(), 32);
//! ```

pub mod hash;

// Re-export compact_str::CompactString for convenience
pub use compact_str::CompactString;
pub use compact_str::ToCompactString;

// Re-export smallvec for stack-optimized collections
pub use smallvec::{smallvec, SmallVec};

// Re-export rustc-hash for fast hash maps/sets
pub use rustc_hash::{FxHashMap, FxHashSet};

pub use hash::{content_hash, CONTENT_ID_LEN};
