//! Resolved field descriptors
//!
//! A [`Field`] is immutable once the schema is built. Relationships refer to
//! their target through a [`TypeKey`] and are resolved through the
//! [`Schema`] at execution time, so cyclic type graphs need no special care.

use super::definition::{ArgumentDefinition, Cardinality, SelectGenerator};
use super::{Schema, TypeKey};
use crate::core::adapter::JoinAdapter;
use crate::core::error::ExecutionError;
use crate::core::field::ScalarType;
use anyhow::anyhow;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// A field of a [`JoinType`](super::JoinType), bound to its owner and public name
pub struct Field<A: JoinAdapter> {
    pub(crate) owner: TypeKey,
    pub(crate) attr_name: String,
    pub(crate) name: String,
    pub(crate) descriptor: FieldDescriptor<A>,
}

impl<A: JoinAdapter> Field<A> {
    pub fn owner(&self) -> TypeKey {
        self.owner
    }

    /// Declared attribute name
    pub fn attr_name(&self) -> &str {
        &self.attr_name
    }

    /// Public output name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &FieldDescriptor<A> {
        &self.descriptor
    }

    pub fn as_immediate(&self) -> Option<&ImmediateField<A>> {
        match &self.descriptor {
            FieldDescriptor::Immediate(immediate) => Some(immediate),
            _ => None,
        }
    }

    pub fn as_relationship(&self) -> Option<&Relationship<A>> {
        match &self.descriptor {
            FieldDescriptor::Relationship(relationship) => Some(relationship),
            _ => None,
        }
    }
}

impl<A: JoinAdapter> fmt::Debug for Field<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

/// What a field resolves to
pub enum FieldDescriptor<A: JoinAdapter> {
    /// A column fetched alongside the record
    Immediate(ImmediateField<A>),
    /// Records of another type correlated with this one
    Relationship(Relationship<A>),
    /// A value read from a sibling single relationship
    Extract(ExtractField),
}

impl<A: JoinAdapter> fmt::Debug for FieldDescriptor<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDescriptor::Immediate(immediate) => f
                .debug_struct("Immediate")
                .field("column", &immediate.column)
                .field("scalar", &immediate.scalar)
                .finish(),
            FieldDescriptor::Relationship(relationship) => f
                .debug_struct("Relationship")
                .field("cardinality", &relationship.cardinality)
                .field("target", &relationship.target)
                .field("keys", &relationship.keys)
                .finish(),
            FieldDescriptor::Extract(extract) => fmt::Debug::fmt(extract, f),
        }
    }
}

pub struct ImmediateField<A: JoinAdapter> {
    pub column: A::Column,
    pub scalar: ScalarType,
}

/// One pair of the correlation-key mapping
pub struct JoinKey<A: JoinAdapter> {
    /// Field on the owning type
    pub local: String,
    /// Field on the target type
    pub remote: String,
    pub local_column: A::Column,
    pub remote_column: A::Column,
}

impl<A: JoinAdapter> fmt::Debug for JoinKey<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.local, self.remote)
    }
}

/// How a relationship derives its unrefined child cursor
pub enum BaseSelect<A: JoinAdapter> {
    /// Every record of the target
    All,
    /// Target records correlated with the parent cursor through the join keys
    Join,
    /// A caller-supplied generator
    Custom(Arc<dyn SelectGenerator<A>>),
}

/// A resolved relationship binding
pub struct Relationship<A: JoinAdapter> {
    pub(crate) cardinality: Cardinality,
    pub(crate) target: TypeKey,
    pub(crate) keys: Vec<JoinKey<A>>,
    pub(crate) base: BaseSelect<A>,
    pub(crate) arguments: Vec<ArgumentDefinition<A>>,
}

impl<A: JoinAdapter> Relationship<A> {
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn target(&self) -> TypeKey {
        self.target
    }

    /// Correlation mapping, owner field → target field
    pub fn keys(&self) -> &[JoinKey<A>] {
        &self.keys
    }

    pub fn base(&self) -> &BaseSelect<A> {
        &self.base
    }

    pub fn arguments(&self) -> &[ArgumentDefinition<A>] {
        &self.arguments
    }

    pub fn argument(&self, name: &str) -> Option<&ArgumentDefinition<A>> {
        self.arguments.iter().find(|arg| arg.name == name)
    }

    /// Derive the child cursor for this relationship
    ///
    /// The base cursor comes from the parent cursor; then every declared
    /// argument present in `args` refines it, in declaration order. Absent
    /// arguments are skipped.
    pub async fn generate_select(
        &self,
        schema: &Schema<A>,
        args: &Map<String, Value>,
        parent: Option<&A::Cursor>,
        context: &A::Context,
    ) -> Result<A::Cursor, ExecutionError> {
        let adapter = schema.adapter();
        let target = schema.join_type(self.target);
        let table = target
            .table()
            .ok_or_else(|| anyhow!("Relationship target '{}' has no table", target.name()))?;

        let mut cursor = match &self.base {
            BaseSelect::All => adapter.select_all(table),
            BaseSelect::Join => {
                let parent = parent.ok_or_else(|| {
                    anyhow!("Join into '{}' requires a parent cursor", target.name())
                })?;
                let pairs: Vec<_> = self
                    .keys
                    .iter()
                    .map(|key| (key.local_column.clone(), key.remote_column.clone()))
                    .collect();
                adapter.restrict_to_parent(adapter.select_all(table), parent, &pairs)?
            }
            BaseSelect::Custom(generator) => generator.generate(adapter, parent, context).await?,
        };

        for argument in &self.arguments {
            if let Some(value) = args.get(&argument.name) {
                cursor = (argument.refine)(cursor, value)?;
            }
        }

        Ok(cursor)
    }
}

/// A scalar read out of a sibling single relationship
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractField {
    /// Public name of the sibling relationship
    pub relationship: String,
    /// Public name of the field on the relationship's target
    pub field: String,
}
