//! Request execution
//!
//! The executor is split into several sub-modules:
//! - `core`: executor orchestration
//! - `request` / `response`: the selection tree in, partial data and errors out
//! - `field_resolver`: the batched selection-tree walker
//! - `grouping`: re-attaching child batches to their parents
//! - `query_executor`: root query fields
//! - `mutation_executor`: the ordered mutation sequencer
//! - `document`: GraphQL documents to requests (`graphql` feature)

mod core;
#[cfg(feature = "graphql")]
mod document;
mod field_resolver;
mod grouping;
mod mutation_executor;
mod query_executor;
mod request;
mod response;

pub use self::core::Executor;
pub use request::{FieldRequest, OperationKind, Request};
pub use response::{FieldError, Response};
