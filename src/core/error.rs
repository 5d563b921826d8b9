//! Typed error handling for the join engine
//!
//! Errors fall into three categories:
//!
//! - [`SchemaError`]: raised while building a [`Schema`](crate::schema::Schema).
//!   These are fatal and are meant to fail at startup.
//! - [`ExecutionError`]: raised while resolving a request. They abort the
//!   field (and subtree) they occur in and are reported in the response's
//!   error list, never as a failed request.
//! - [`DocumentError`]: raised while turning a GraphQL document into a
//!   [`Request`](crate::executor::Request).
//!
//! [`JoinError`] wraps all of them for callers that want a single type.

use crate::core::field::ColumnType;
use thiserror::Error;

/// The main error type of the crate
#[derive(Debug, Error)]
pub enum JoinError {
    /// Schema construction errors
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Request-time errors
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// Query document errors
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl JoinError {
    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            JoinError::Schema(e) => e.error_code(),
            JoinError::Execution(e) => e.error_code(),
            JoinError::Document(_) => "DOCUMENT_ERROR",
            JoinError::Config(_) => "CONFIG_ERROR",
        }
    }
}

// =============================================================================
// Schema Errors
// =============================================================================

/// Errors detected while building a schema
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// Two types registered under the same name
    #[error("Type '{name}' is declared more than once")]
    DuplicateType { name: String },

    /// Two fields of one type share a public name
    #[error("Field '{field}' is declared more than once on type '{type_name}'")]
    DuplicateField { type_name: String, field: String },

    /// A relationship or lookup names a type that was never declared
    #[error("Unknown type '{name}'")]
    UnknownType { name: String },

    /// A field refers to a sibling that does not exist
    #[error("Type '{type_name}' has no field '{field}'")]
    UnknownField { type_name: String, field: String },

    /// The adapter does not know the column backing a field
    #[error("Column '{column}' does not exist on type '{type_name}'")]
    UnknownColumn { type_name: String, column: String },

    /// The column's storage type has no scalar output type
    #[error("Column '{column}' on type '{type_name}' has unmapped type {column_type:?}")]
    UnmappedColumnType {
        type_name: String,
        column: String,
        column_type: ColumnType,
    },

    /// Root types have no backing table, so they cannot hold columns
    #[error("Root type '{type_name}' cannot declare column field '{field}'")]
    ColumnOnRoot { type_name: String, field: String },

    /// A lazy field resolved to another lazy field
    #[error("Lazy field '{field}' on type '{type_name}' resolved to another lazy field")]
    LazyChain { type_name: String, field: String },

    /// No foreign key links the two types
    #[error("No foreign key joins '{owner}' to '{target}'; declare the join explicitly")]
    NoForeignKey { owner: String, target: String },

    /// More than one foreign key links the two types
    #[error(
        "Found {candidates} foreign keys joining '{owner}' to '{target}'; declare the join explicitly"
    )]
    AmbiguousForeignKey {
        owner: String,
        target: String,
        candidates: usize,
    },

    /// A relationship points at a root type, which has no records
    #[error("Relationship '{field}' on type '{type_name}' cannot target root type '{target}'")]
    RootTarget {
        type_name: String,
        field: String,
        target: String,
    },

    /// A foreign key points at a column no field exposes
    #[error("Type '{type_name}' has no column field for '{column}'")]
    UnexposedColumn { type_name: String, column: String },

    /// A correlation mapping uses a field that is not an immediate column
    #[error("Join key '{field}' on type '{type_name}' must be a column field")]
    InvalidJoinKey { type_name: String, field: String },

    /// An extract field does not point at a single relationship
    #[error("Extract field '{field}' on type '{type_name}' is invalid: {reason}")]
    InvalidExtract {
        type_name: String,
        field: String,
        reason: String,
    },

    /// No query root was declared
    #[error("Schema has no query root type")]
    MissingQueryRoot,
}

impl SchemaError {
    pub fn error_code(&self) -> &'static str {
        match self {
            SchemaError::DuplicateType { .. } => "DUPLICATE_TYPE",
            SchemaError::DuplicateField { .. } => "DUPLICATE_FIELD",
            SchemaError::UnknownType { .. } => "UNKNOWN_TYPE",
            SchemaError::UnknownField { .. } => "UNKNOWN_FIELD",
            SchemaError::UnknownColumn { .. } => "UNKNOWN_COLUMN",
            SchemaError::UnmappedColumnType { .. } => "UNMAPPED_COLUMN_TYPE",
            SchemaError::ColumnOnRoot { .. } => "COLUMN_ON_ROOT",
            SchemaError::LazyChain { .. } => "LAZY_CHAIN",
            SchemaError::NoForeignKey { .. } => "NO_FOREIGN_KEY",
            SchemaError::AmbiguousForeignKey { .. } => "AMBIGUOUS_FOREIGN_KEY",
            SchemaError::RootTarget { .. } => "ROOT_TARGET",
            SchemaError::UnexposedColumn { .. } => "UNEXPOSED_COLUMN",
            SchemaError::InvalidJoinKey { .. } => "INVALID_JOIN_KEY",
            SchemaError::InvalidExtract { .. } => "INVALID_EXTRACT",
            SchemaError::MissingQueryRoot => "MISSING_QUERY_ROOT",
        }
    }
}

// =============================================================================
// Execution Errors
// =============================================================================

/// Errors raised while resolving a request
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The storage adapter, a select generator or a refinement failed
    #[error("{0}")]
    Adapter(#[from] anyhow::Error),

    /// A single relationship matched several rows for one parent
    #[error(
        "Relationship '{field}' on type '{type_name}' is single but matched {count} rows for one parent"
    )]
    Integrity {
        type_name: String,
        field: String,
        count: usize,
    },

    /// The request selects a field the type does not have
    #[error("Type '{type_name}' has no field '{field}'")]
    UnknownField { type_name: String, field: String },

    /// The request passes an argument the field does not declare
    #[error("Field '{field}' has no argument '{argument}'")]
    UnknownArgument { field: String, argument: String },

    /// The adapter returned a row of the wrong width
    #[error("Adapter returned a row of {actual} values for type '{type_name}', expected {expected}")]
    MalformedRow {
        type_name: String,
        expected: usize,
        actual: usize,
    },

    /// The request has no operation of the requested kind
    #[error("Schema has no {0} root type")]
    MissingRoot(&'static str),

    /// A mutation was skipped because an earlier failure invalidated the context
    #[error("Mutation '{field}' was not executed: the request context is no longer usable")]
    Skipped { field: String },
}

impl ExecutionError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ExecutionError::Adapter(_) => "ADAPTER_ERROR",
            ExecutionError::Integrity { .. } => "INTEGRITY_ERROR",
            ExecutionError::UnknownField { .. } => "UNKNOWN_FIELD",
            ExecutionError::UnknownArgument { .. } => "UNKNOWN_ARGUMENT",
            ExecutionError::MalformedRow { .. } => "MALFORMED_ROW",
            ExecutionError::MissingRoot(_) => "MISSING_ROOT",
            ExecutionError::Skipped { .. } => "MUTATION_SKIPPED",
        }
    }
}

// =============================================================================
// Document Errors
// =============================================================================

/// Errors raised while converting a query document into a request
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    /// The document is not valid GraphQL
    #[error("Failed to parse query: {0}")]
    Parse(String),

    /// The document holds no executable operation
    #[error("No operation found in query")]
    NoOperation,

    /// The named operation is missing
    #[error("Operation '{0}' not found in query")]
    UnknownOperation(String),

    /// Subscriptions are outside the engine
    #[error("Subscriptions are not supported")]
    Subscription,

    /// A fragment spread names an undefined fragment
    #[error("Unknown fragment '{0}'")]
    UnknownFragment(String),

    /// A fragment spreads itself, directly or through others
    #[error("Fragment '{0}' spreads itself")]
    FragmentCycle(String),

    /// A variable is used but not bound
    #[error("Variable '${0}' is not defined")]
    UnboundVariable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_codes() {
        let err = SchemaError::AmbiguousForeignKey {
            owner: "book".to_string(),
            target: "author".to_string(),
            candidates: 2,
        };
        assert_eq!(err.error_code(), "AMBIGUOUS_FOREIGN_KEY");
        assert!(err.to_string().contains("Found 2 foreign keys"));
    }

    #[test]
    fn test_join_error_wraps_schema_error() {
        let err: JoinError = SchemaError::MissingQueryRoot.into();
        assert_eq!(err.error_code(), "MISSING_QUERY_ROOT");
        assert_eq!(err.to_string(), "Schema has no query root type");
    }

    #[test]
    fn test_adapter_error_keeps_message() {
        let err: ExecutionError = anyhow::anyhow!("connection reset").into();
        assert_eq!(err.error_code(), "ADAPTER_ERROR");
        assert_eq!(err.to_string(), "connection reset");
    }

    #[test]
    fn test_integrity_error_message() {
        let err = ExecutionError::Integrity {
            type_name: "Book".to_string(),
            field: "author".to_string(),
            count: 2,
        };
        assert!(err.to_string().contains("matched 2 rows"));
    }

    #[test]
    fn test_document_error_display() {
        assert_eq!(
            DocumentError::UnboundVariable("id".to_string()).to_string(),
            "Variable '$id' is not defined"
        );
    }
}
