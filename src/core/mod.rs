//! Core module containing the adapter contract and shared value types

pub mod adapter;
pub mod error;
pub mod field;
pub mod naming;

pub use adapter::{ForeignKey, JoinAdapter};
pub use error::{DocumentError, ExecutionError, JoinError, SchemaError};
pub use field::{ArgumentType, ColumnType, CorrelationKey, FieldValue, Row, ScalarType};
pub use naming::FieldNaming;
