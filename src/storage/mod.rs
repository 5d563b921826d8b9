//! Storage adapters

#[cfg(feature = "in-memory")]
pub mod in_memory;

#[cfg(feature = "in-memory")]
pub use in_memory::{Filter, InMemoryStore, MemoryQuery, Session, SortOrder, TableDef};
