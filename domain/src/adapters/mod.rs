//! Dependency-free adapters that live inside the domain crate.
//!
//! Used by unit tests and by the api-server's non-durable
//! `STORAGE_PROVIDER=memory` mode. The durable store lives in the
//! `sqlite-adapter` crate.

pub mod memory_repo;
