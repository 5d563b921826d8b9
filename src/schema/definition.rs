//! Field declarations
//!
//! Declarations are what a schema author writes: columns, relationships,
//! extracts and lazy fields, keyed by attribute name. They carry no owner
//! and no public name; [`SchemaBuilder::build`](super::SchemaBuilder::build)
//! binds them and resolves them into [`Field`](super::Field)s.

use crate::core::adapter::JoinAdapter;
use crate::core::field::{ArgumentType, ScalarType};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

/// Refinement applied to a relationship's cursor when its argument is bound
pub type RefineFn<A> = Arc<
    dyn Fn(<A as JoinAdapter>::Cursor, &Value) -> Result<<A as JoinAdapter>::Cursor>
        + Send
        + Sync,
>;

/// Cardinality of a relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// At most one correlated child per parent
    Single,
    /// An ordered, possibly empty, sequence of children
    Many,
}

/// Derives a relationship's base cursor from the parent cursor
///
/// `parent` is `None` when the relationship hangs off a root type.
#[async_trait]
pub trait SelectGenerator<A: JoinAdapter>: Send + Sync {
    async fn generate(
        &self,
        adapter: &A,
        parent: Option<&A::Cursor>,
        context: &A::Context,
    ) -> Result<A::Cursor>;
}

/// [`SelectGenerator`] backed by a synchronous closure
pub struct FnSelect<A, F> {
    func: F,
    _adapter: PhantomData<fn(&A)>,
}

impl<A, F> FnSelect<A, F> {
    pub fn new(func: F) -> Self {
        Self {
            func,
            _adapter: PhantomData,
        }
    }
}

#[async_trait]
impl<A, F> SelectGenerator<A> for FnSelect<A, F>
where
    A: JoinAdapter,
    F: Fn(&A, Option<&A::Cursor>, &A::Context) -> Result<A::Cursor> + Send + Sync,
{
    async fn generate(
        &self,
        adapter: &A,
        parent: Option<&A::Cursor>,
        context: &A::Context,
    ) -> Result<A::Cursor> {
        (self.func)(adapter, parent, context)
    }
}

/// A named relationship argument
pub struct ArgumentDefinition<A: JoinAdapter> {
    pub name: String,
    pub arg_type: ArgumentType,
    pub refine: RefineFn<A>,
}

impl<A: JoinAdapter> Clone for ArgumentDefinition<A> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            arg_type: self.arg_type,
            refine: Arc::clone(&self.refine),
        }
    }
}

/// A scalar field read straight from a column
pub struct ColumnDefinition<A: JoinAdapter> {
    pub column: A::Column,
    pub scalar: Option<ScalarType>,
}

/// A relationship to another type
pub struct RelationshipDefinition<A: JoinAdapter> {
    pub(crate) cardinality: Cardinality,
    pub(crate) target: String,
    pub(crate) join: Option<Vec<(String, String)>>,
    pub(crate) select: Option<Arc<dyn SelectGenerator<A>>>,
    pub(crate) arguments: Vec<ArgumentDefinition<A>>,
}

impl<A: JoinAdapter> RelationshipDefinition<A> {
    fn new(cardinality: Cardinality, target: impl Into<String>) -> Self {
        Self {
            cardinality,
            target: target.into(),
            join: None,
            select: None,
            arguments: Vec::new(),
        }
    }

    /// Relationship yielding at most one record of `target`
    pub fn single(target: impl Into<String>) -> Self {
        Self::new(Cardinality::Single, target)
    }

    /// Relationship yielding a list of records of `target`
    pub fn many(target: impl Into<String>) -> Self {
        Self::new(Cardinality::Many, target)
    }

    /// Correlate explicitly: each pair is (owner attribute, target attribute)
    ///
    /// Without it, object-to-object relationships infer the join from
    /// foreign keys.
    pub fn join_on<I, L, R>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (L, R)>,
        L: Into<String>,
        R: Into<String>,
    {
        self.join = Some(
            pairs
                .into_iter()
                .map(|(local, remote)| (local.into(), remote.into()))
                .collect(),
        );
        self
    }

    /// Replace the default base select
    pub fn select(mut self, generator: impl SelectGenerator<A> + 'static) -> Self {
        self.select = Some(Arc::new(generator));
        self
    }

    /// Replace the default base select with a closure
    pub fn select_with<F>(self, func: F) -> Self
    where
        F: Fn(&A, Option<&A::Cursor>, &A::Context) -> Result<A::Cursor> + Send + Sync + 'static,
    {
        self.select(FnSelect::new(func))
    }

    /// Declare an argument; refinements run in declaration order
    pub fn arg<F>(mut self, name: impl Into<String>, arg_type: ArgumentType, refine: F) -> Self
    where
        F: Fn(A::Cursor, &Value) -> Result<A::Cursor> + Send + Sync + 'static,
    {
        self.arguments.push(ArgumentDefinition {
            name: name.into(),
            arg_type,
            refine: Arc::new(refine),
        });
        self
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

/// A scalar read out of a sibling single relationship
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractDefinition {
    /// Attribute name of the sibling relationship
    pub relationship: String,
    /// Attribute name of the field on the relationship's target
    pub field: String,
}

/// A declaration resolved when the schema is built
pub struct LazyDefinition<A: JoinAdapter>(Box<dyn FnOnce() -> FieldDefinition<A> + Send>);

impl<A: JoinAdapter> LazyDefinition<A> {
    pub(crate) fn resolve(self) -> FieldDefinition<A> {
        (self.0)()
    }
}

/// Any field declaration
pub enum FieldDefinition<A: JoinAdapter> {
    Column(ColumnDefinition<A>),
    Relationship(RelationshipDefinition<A>),
    Extract(ExtractDefinition),
    Lazy(LazyDefinition<A>),
}

impl<A: JoinAdapter> FieldDefinition<A> {
    /// Column field whose scalar type comes from the adapter
    pub fn column(column: impl Into<A::Column>) -> Self {
        FieldDefinition::Column(ColumnDefinition {
            column: column.into(),
            scalar: None,
        })
    }

    /// Column field with an explicit scalar type
    pub fn typed_column(column: impl Into<A::Column>, scalar: ScalarType) -> Self {
        FieldDefinition::Column(ColumnDefinition {
            column: column.into(),
            scalar: Some(scalar),
        })
    }

    pub fn extract(relationship: impl Into<String>, field: impl Into<String>) -> Self {
        FieldDefinition::Extract(ExtractDefinition {
            relationship: relationship.into(),
            field: field.into(),
        })
    }

    pub fn lazy<F>(func: F) -> Self
    where
        F: FnOnce() -> FieldDefinition<A> + Send + 'static,
    {
        FieldDefinition::Lazy(LazyDefinition(Box::new(func)))
    }
}

impl<A: JoinAdapter> From<RelationshipDefinition<A>> for FieldDefinition<A> {
    fn from(def: RelationshipDefinition<A>) -> Self {
        FieldDefinition::Relationship(def)
    }
}

impl<A: JoinAdapter> From<ExtractDefinition> for FieldDefinition<A> {
    fn from(def: ExtractDefinition) -> Self {
        FieldDefinition::Extract(def)
    }
}

/// Where a type's records come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSource {
    /// A root type: a single empty record, no adapter call
    Root,
    /// An object type backed by a table
    Table(String),
}

/// Declaration of one type and its fields, in declaration order
pub struct TypeDefinition<A: JoinAdapter> {
    pub(crate) name: String,
    pub(crate) source: TypeSource,
    pub(crate) fields: Vec<(String, FieldDefinition<A>)>,
}

impl<A: JoinAdapter> TypeDefinition<A> {
    /// Object type backed by `table`
    pub fn object(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: TypeSource::Table(table.into()),
            fields: Vec::new(),
        }
    }

    /// Root type (query or mutation entry point)
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: TypeSource::Root,
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add any field declaration
    pub fn field(mut self, attr_name: impl Into<String>, def: impl Into<FieldDefinition<A>>) -> Self {
        self.fields.push((attr_name.into(), def.into()));
        self
    }

    pub fn column(self, attr_name: impl Into<String>, column: impl Into<A::Column>) -> Self {
        self.field(attr_name, FieldDefinition::column(column))
    }

    pub fn typed_column(
        self,
        attr_name: impl Into<String>,
        column: impl Into<A::Column>,
        scalar: ScalarType,
    ) -> Self {
        self.field(attr_name, FieldDefinition::typed_column(column, scalar))
    }

    pub fn single<F>(self, attr_name: impl Into<String>, target: impl Into<String>, configure: F) -> Self
    where
        F: FnOnce(RelationshipDefinition<A>) -> RelationshipDefinition<A>,
    {
        self.field(attr_name, configure(RelationshipDefinition::single(target)))
    }

    pub fn many<F>(self, attr_name: impl Into<String>, target: impl Into<String>, configure: F) -> Self
    where
        F: FnOnce(RelationshipDefinition<A>) -> RelationshipDefinition<A>,
    {
        self.field(attr_name, configure(RelationshipDefinition::many(target)))
    }

    pub fn extract(
        self,
        attr_name: impl Into<String>,
        relationship: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        self.field(attr_name, FieldDefinition::extract(relationship, field))
    }

    pub fn lazy<F>(self, attr_name: impl Into<String>, func: F) -> Self
    where
        F: FnOnce() -> FieldDefinition<A> + Send + 'static,
    {
        self.field(attr_name, FieldDefinition::lazy(func))
    }
}
