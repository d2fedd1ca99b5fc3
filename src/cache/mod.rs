//! Caching primitives

mod lru;

pub use lru::LruCache;
