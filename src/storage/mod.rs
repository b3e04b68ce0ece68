//! Persistent backends for the explanation cache.

mod encrypted;

pub use encrypted::SqliteCacheStore;
