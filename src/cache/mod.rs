//! Synthesis cache: deterministic audio paths, per-key locking, and
//! get-or-synthesize over the file system.

pub mod key;
pub mod lock;
pub mod persist;
pub mod store;

pub use key::{AudioLayout, BatchKey, CacheKey, Role};
pub use lock::KeyedLocks;
pub use persist::{Persisted, write_atomic};
pub use store::SynthesisCache;
