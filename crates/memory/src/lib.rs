//! Memory backends for the switchboard request router.
//!
//! Durable state (`SlotStore` implementations) and the ephemeral per-user
//! snippet index live here. The SQLite store is the production backend;
//! the in-memory store backs tests and throwaway sessions.

pub mod embedding;
pub mod in_memory;
pub mod index;
pub mod index_cache;
pub mod sqlite;

pub use embedding::HashEmbedder;
pub use in_memory::InMemoryStore;
pub use index::SnippetIndex;
pub use index_cache::IndexCache;
pub use sqlite::SqliteStore;
