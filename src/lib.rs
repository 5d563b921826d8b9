//! # Joiner
//!
//! A join-resolution engine that turns a nested field selection into one
//! batched relational fetch per level of the selection tree.
//!
//! ## Features
//!
//! - **Batched Fetching**: one `fetch_immediates` call per level, whatever the number of records
//! - **Declarative Types**: columns, single/many relationships, extracted fields, lazy fields
//! - **Foreign-Key Inference**: correlation keys derived from the adapter's foreign keys
//! - **Ordered Mutations**: root mutation fields run strictly one after another
//! - **Pluggable Storage**: any backend implementing [`JoinAdapter`](core::JoinAdapter)
//! - **Partial Results**: failed fields resolve to null with a per-path error list
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use joiner::prelude::*;
//!
//! let store = InMemoryStore::new();
//! store.create_table(
//!     TableDef::new("author")
//!         .column("id", ColumnType::Integer)
//!         .column("name", ColumnType::Text)
//!         .primary_key(["id"]),
//! )?;
//! store.create_table(
//!     TableDef::new("book")
//!         .column("id", ColumnType::Integer)
//!         .column("title", ColumnType::Text)
//!         .column("author_id", ColumnType::Integer)
//!         .primary_key(["id"])
//!         .foreign_key("author_id", "author", "id"),
//! )?;
//!
//! let schema = SchemaBuilder::new(Arc::new(store))
//!     .object_type("Author", "author", |t| t.column("id", "id").column("name", "name"))
//!     .object_type("Book", "book", |t| {
//!         t.column("title", "title")
//!             .column("author_id", "author_id")
//!             .single("author", "Author", |r| r)
//!     })
//!     .query_root("Query", |t| t.many("books", "Book", |r| r))
//!     .build()?;
//!
//! let request = Request::query().field(
//!     FieldRequest::new("books")
//!         .fields(["title"])
//!         .select(FieldRequest::new("author").fields(["name"])),
//! );
//! let response = Executor::new(schema).execute(&request, &Session::new()).await;
//! ```

pub mod config;
pub mod core;
pub mod executor;
pub mod schema;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        adapter::{ForeignKey, JoinAdapter},
        error::{DocumentError, ExecutionError, JoinError, SchemaError},
        field::{ArgumentType, ColumnType, FieldValue, Row, ScalarType},
        naming::FieldNaming,
    };

    // === Schema ===
    pub use crate::schema::{
        Cardinality, FieldDefinition, FnSelect, RelationshipDefinition, Schema, SchemaBuilder,
        SelectGenerator, TypeDefinition,
    };

    // === Execution ===
    pub use crate::executor::{Executor, FieldError, FieldRequest, OperationKind, Request, Response};

    // === Storage ===
    #[cfg(feature = "in-memory")]
    pub use crate::storage::{InMemoryStore, MemoryQuery, Session, SortOrder, TableDef};

    // === Config ===
    pub use crate::config::JoinConfig;

    // === Macros ===
    #[cfg(feature = "in-memory")]
    pub use crate::row;

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use serde_json::{Value, json};
    pub use std::sync::Arc;
}
