//! Schema: a registry of join types and their resolved field tables
//!
//! Types are declared with [`TypeDefinition`]s, registered on a
//! [`SchemaBuilder`], and resolved once by [`SchemaBuilder::build`]. The
//! resulting [`Schema`] is read-only and shared across requests.

pub mod builder;
pub mod definition;
pub mod descriptor;
pub(crate) mod foreign_key;
pub mod sdl;

pub use builder::SchemaBuilder;
pub use definition::{
    ArgumentDefinition, Cardinality, FieldDefinition, FnSelect, RelationshipDefinition,
    SelectGenerator, TypeDefinition, TypeSource,
};
pub use descriptor::{
    BaseSelect, ExtractField, Field, FieldDescriptor, ImmediateField, JoinKey, Relationship,
};

use crate::core::adapter::JoinAdapter;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Stable index of a type inside its [`Schema`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(pub(crate) usize);

/// A type of the schema with its memoized field table
pub struct JoinType<A: JoinAdapter> {
    pub(crate) key: TypeKey,
    pub(crate) name: String,
    pub(crate) source: TypeSource,
    pub(crate) fields: IndexMap<String, Field<A>>,
}

impl<A: JoinAdapter> JoinType<A> {
    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &TypeSource {
        &self.source
    }

    /// Backing table, `None` for root types
    pub fn table(&self) -> Option<&str> {
        match &self.source {
            TypeSource::Table(table) => Some(table),
            TypeSource::Root => None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.source == TypeSource::Root
    }

    /// Fields keyed by public name, in declaration order
    pub fn fields(&self) -> &IndexMap<String, Field<A>> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field<A>> {
        self.fields.get(name)
    }
}

impl<A: JoinAdapter> fmt::Debug for JoinType<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinType")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A built schema bound to its storage adapter
pub struct Schema<A: JoinAdapter> {
    pub(crate) adapter: Arc<A>,
    pub(crate) types: Vec<JoinType<A>>,
    pub(crate) by_name: HashMap<String, TypeKey>,
    pub(crate) query_root: TypeKey,
    pub(crate) mutation_root: Option<TypeKey>,
}

impl<A: JoinAdapter> Schema<A> {
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Look up a type by key
    ///
    /// Keys are only handed out by this schema, so the lookup cannot miss.
    pub fn join_type(&self, key: TypeKey) -> &JoinType<A> {
        &self.types[key.0]
    }

    pub fn type_by_name(&self, name: &str) -> Option<&JoinType<A>> {
        self.by_name.get(name).map(|key| self.join_type(*key))
    }

    pub fn types(&self) -> impl Iterator<Item = &JoinType<A>> {
        self.types.iter()
    }

    pub fn query_root(&self) -> &JoinType<A> {
        self.join_type(self.query_root)
    }

    pub fn mutation_root(&self) -> Option<&JoinType<A>> {
        self.mutation_root.map(|key| self.join_type(key))
    }
}

impl<A: JoinAdapter> fmt::Debug for Schema<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("types", &self.types)
            .field("query_root", &self.query_root().name())
            .field("mutation_root", &self.mutation_root().map(JoinType::name))
            .finish()
    }
}
