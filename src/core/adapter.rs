//! Storage adapter contract consumed by the engine

use crate::core::error::SchemaError;
use crate::core::field::{ColumnType, Row, ScalarType};
use anyhow::Result;
use async_trait::async_trait;
use std::fmt::{Debug, Display};

/// A foreign key declared on a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey<C> {
    /// The referencing column on the local table
    pub column: C,

    /// The referenced table
    pub references_table: String,

    /// The referenced column, normally the remote primary key
    pub references_column: C,
}

impl<C> ForeignKey<C> {
    pub fn new(column: C, references_table: impl Into<String>, references_column: C) -> Self {
        Self {
            column,
            references_table: references_table.into(),
            references_column,
        }
    }
}

/// Capability interface a storage backend implements to be driven by the engine
///
/// The engine never inspects a [`Cursor`](JoinAdapter::Cursor): it obtains
/// one from [`select_all`](JoinAdapter::select_all), narrows it through
/// [`restrict_to_parent`](JoinAdapter::restrict_to_parent) and argument
/// refinements, and hands it back to
/// [`fetch_immediates`](JoinAdapter::fetch_immediates).
///
/// The request [`Context`](JoinAdapter::Context) (a session, a transaction)
/// is owned by the caller and passed to every fetch of one request.
#[async_trait]
pub trait JoinAdapter: Send + Sync + 'static {
    /// Reference to a column of a table
    type Column: Clone + Debug + Display + PartialEq + Send + Sync + 'static;

    /// Query object describing "the records reachable from here"
    type Cursor: Clone + Debug + Send + Sync + 'static;

    /// Request-scoped state threaded through every fetch
    type Context: Send + Sync + 'static;

    /// Unrestricted base query for a table
    fn select_all(&self, table: &str) -> Self::Cursor;

    /// Restrict `cursor` to the records correlated with the records of `parent`
    ///
    /// `keys` pairs each parent column with the child column that must equal it.
    fn restrict_to_parent(
        &self,
        cursor: Self::Cursor,
        parent: &Self::Cursor,
        keys: &[(Self::Column, Self::Column)],
    ) -> Result<Self::Cursor>;

    /// Fetch one row per record matched by `cursor`
    ///
    /// Each row holds the values of `columns` in order. Implementations must
    /// issue a single underlying query per call and must not return the same
    /// record twice.
    async fn fetch_immediates(
        &self,
        table: &str,
        columns: &[Self::Column],
        cursor: &Self::Cursor,
        context: &Self::Context,
    ) -> Result<Vec<Row>>;

    /// Storage type of a column, `None` if the column does not exist
    fn column_type(&self, table: &str, column: &Self::Column) -> Option<ColumnType>;

    /// Output scalar for a storage type
    fn scalar_type_of(
        &self,
        table: &str,
        column: &Self::Column,
        column_type: ColumnType,
    ) -> Result<ScalarType, SchemaError> {
        ScalarType::for_column(table, &column.to_string(), column_type)
    }

    /// Primary key columns of a table
    fn primary_key_of(&self, table: &str) -> Vec<Self::Column>;

    /// Foreign keys declared on a table
    fn foreign_keys_of(&self, table: &str) -> Vec<ForeignKey<Self::Column>>;

    /// Whether later mutations may still run on this context after a failure
    fn context_usable(&self, _context: &Self::Context) -> bool {
        true
    }
}
