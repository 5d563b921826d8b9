//! Two-phase schema construction
//!
//! 1. Binding: every declared field gets its owner and public name, duplicate
//!    names are rejected and lazy declarations are resolved exactly once.
//! 2. Resolution: columns are typed through the adapter, relationships are
//!    bound to their target key and correlation mapping (explicit or
//!    inferred from foreign keys), extracts are checked against their
//!    relationship and must end at a column without looping back.
//!
//! Every failure is a [`SchemaError`] returned from [`SchemaBuilder::build`].

use super::definition::{
    Cardinality, ExtractDefinition, FieldDefinition, RelationshipDefinition, TypeDefinition,
    TypeSource,
};
use super::descriptor::{
    BaseSelect, ExtractField, Field, FieldDescriptor, ImmediateField, JoinKey, Relationship,
};
use super::foreign_key::{ColumnField, TableFields, infer_join};
use super::{JoinType, Schema, TypeKey};
use crate::config::JoinConfig;
use crate::core::adapter::JoinAdapter;
use crate::core::error::SchemaError;
use crate::core::naming::FieldNaming;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Collects type declarations and builds an immutable [`Schema`]
pub struct SchemaBuilder<A: JoinAdapter> {
    adapter: Arc<A>,
    naming: FieldNaming,
    types: Vec<TypeDefinition<A>>,
    query_root: Option<String>,
    mutation_root: Option<String>,
}

impl<A: JoinAdapter> SchemaBuilder<A> {
    pub fn new(adapter: Arc<A>) -> Self {
        Self {
            adapter,
            naming: FieldNaming::default(),
            types: Vec::new(),
            query_root: None,
            mutation_root: None,
        }
    }

    /// Apply the schema-related settings of a configuration
    pub fn with_config(mut self, config: &JoinConfig) -> Self {
        self.naming = config.field_naming;
        self
    }

    pub fn with_naming(mut self, naming: FieldNaming) -> Self {
        self.naming = naming;
        self
    }

    /// Register a type declaration
    pub fn register(mut self, definition: TypeDefinition<A>) -> Self {
        self.types.push(definition);
        self
    }

    /// Declare an object type backed by `table`
    pub fn object_type<F>(self, name: impl Into<String>, table: impl Into<String>, configure: F) -> Self
    where
        F: FnOnce(TypeDefinition<A>) -> TypeDefinition<A>,
    {
        self.register(configure(TypeDefinition::object(name, table)))
    }

    /// Declare the root type of query operations
    pub fn query_root<F>(mut self, name: impl Into<String>, configure: F) -> Self
    where
        F: FnOnce(TypeDefinition<A>) -> TypeDefinition<A>,
    {
        let name = name.into();
        self.query_root = Some(name.clone());
        self.register(configure(TypeDefinition::root(name)))
    }

    /// Declare the root type of mutation operations
    pub fn mutation_root<F>(mut self, name: impl Into<String>, configure: F) -> Self
    where
        F: FnOnce(TypeDefinition<A>) -> TypeDefinition<A>,
    {
        let name = name.into();
        self.mutation_root = Some(name.clone());
        self.register(configure(TypeDefinition::root(name)))
    }

    /// Bind and resolve every declared type
    pub fn build(self) -> Result<Schema<A>, SchemaError> {
        let Self {
            adapter,
            naming,
            types,
            query_root,
            mutation_root,
        } = self;

        let mut by_name = HashMap::new();
        for (index, definition) in types.iter().enumerate() {
            if by_name
                .insert(definition.name.clone(), TypeKey(index))
                .is_some()
            {
                return Err(SchemaError::DuplicateType {
                    name: definition.name.clone(),
                });
            }
        }

        let query_root = query_root.ok_or(SchemaError::MissingQueryRoot)?;
        let query_root = lookup(&by_name, &query_root)?;
        let mutation_root = mutation_root
            .map(|name| lookup(&by_name, &name))
            .transpose()?;

        let bound = types
            .into_iter()
            .map(|definition| bind_type(definition, naming))
            .collect::<Result<Vec<_>, _>>()?;

        let snapshots = bound
            .iter()
            .map(TypeSnapshot::of)
            .collect::<Vec<TypeSnapshot<A::Column>>>();

        let resolver = Resolver {
            adapter: adapter.as_ref(),
            by_name: &by_name,
            snapshots: &snapshots,
        };

        let mut resolved = Vec::with_capacity(bound.len());
        for (index, bound_type) in bound.into_iter().enumerate() {
            resolved.push(resolver.resolve_type(TypeKey(index), bound_type)?);
        }

        tracing::debug!(types = resolved.len(), "schema built");

        Ok(Schema {
            adapter,
            types: resolved,
            by_name,
            query_root,
            mutation_root,
        })
    }
}

fn lookup(by_name: &HashMap<String, TypeKey>, name: &str) -> Result<TypeKey, SchemaError> {
    by_name
        .get(name)
        .copied()
        .ok_or_else(|| SchemaError::UnknownType {
            name: name.to_string(),
        })
}

// =============================================================================
// Phase 1: binding
// =============================================================================

struct BoundField<A: JoinAdapter> {
    attr: String,
    name: String,
    definition: FieldDefinition<A>,
}

struct BoundType<A: JoinAdapter> {
    name: String,
    source: TypeSource,
    fields: Vec<BoundField<A>>,
}

fn bind_type<A: JoinAdapter>(
    definition: TypeDefinition<A>,
    naming: FieldNaming,
) -> Result<BoundType<A>, SchemaError> {
    let mut seen = HashSet::new();
    let mut fields = Vec::with_capacity(definition.fields.len());

    for (attr, field_definition) in definition.fields {
        let name = naming.public_name(&attr);
        if !seen.insert(name.clone()) {
            return Err(SchemaError::DuplicateField {
                type_name: definition.name.clone(),
                field: name,
            });
        }

        let field_definition = match field_definition {
            FieldDefinition::Lazy(lazy) => match lazy.resolve() {
                FieldDefinition::Lazy(_) => {
                    return Err(SchemaError::LazyChain {
                        type_name: definition.name.clone(),
                        field: name,
                    });
                }
                resolved => resolved,
            },
            other => other,
        };

        fields.push(BoundField {
            attr,
            name,
            definition: field_definition,
        });
    }

    Ok(BoundType {
        name: definition.name,
        source: definition.source,
        fields,
    })
}

// =============================================================================
// Phase 2: resolution
// =============================================================================

/// What resolution needs to know about every type while types are consumed
struct TypeSnapshot<C> {
    name: String,
    table: Option<String>,
    /// attribute → public name, every field
    names: HashMap<String, String>,
    /// column fields in declaration order
    columns: Vec<ColumnField<C>>,
    /// attribute → index into `columns`
    column_attrs: HashMap<String, usize>,
    /// attribute → (cardinality, target type name)
    relationships: HashMap<String, (Cardinality, String)>,
    /// attribute → (relationship attribute, target field attribute)
    extracts: HashMap<String, (String, String)>,
}

impl<C: Clone> TypeSnapshot<C> {
    fn of<A: JoinAdapter<Column = C>>(bound: &BoundType<A>) -> Self {
        let mut snapshot = Self {
            name: bound.name.clone(),
            table: match &bound.source {
                TypeSource::Table(table) => Some(table.clone()),
                TypeSource::Root => None,
            },
            names: HashMap::new(),
            columns: Vec::new(),
            column_attrs: HashMap::new(),
            relationships: HashMap::new(),
            extracts: HashMap::new(),
        };

        for field in &bound.fields {
            snapshot
                .names
                .insert(field.attr.clone(), field.name.clone());
            match &field.definition {
                FieldDefinition::Column(column) => {
                    snapshot
                        .column_attrs
                        .insert(field.attr.clone(), snapshot.columns.len());
                    snapshot.columns.push(ColumnField {
                        name: field.name.clone(),
                        column: column.column.clone(),
                    });
                }
                FieldDefinition::Relationship(relationship) => {
                    snapshot.relationships.insert(
                        field.attr.clone(),
                        (relationship.cardinality, relationship.target.clone()),
                    );
                }
                FieldDefinition::Extract(extract) => {
                    snapshot.extracts.insert(
                        field.attr.clone(),
                        (extract.relationship.clone(), extract.field.clone()),
                    );
                }
                FieldDefinition::Lazy(_) => {}
            }
        }

        snapshot
    }

    fn column(&self, attr: &str) -> Result<&ColumnField<C>, SchemaError> {
        self.column_attrs
            .get(attr)
            .map(|index| &self.columns[*index])
            .ok_or_else(|| SchemaError::InvalidJoinKey {
                type_name: self.name.clone(),
                field: attr.to_string(),
            })
    }

    fn table_fields(&self) -> Option<TableFields<'_, C>> {
        self.table.as_deref().map(|table| TableFields {
            type_name: &self.name,
            table,
            fields: &self.columns,
        })
    }
}

struct Resolver<'a, A: JoinAdapter> {
    adapter: &'a A,
    by_name: &'a HashMap<String, TypeKey>,
    snapshots: &'a [TypeSnapshot<A::Column>],
}

impl<A: JoinAdapter> Resolver<'_, A> {
    fn resolve_type(&self, key: TypeKey, bound: BoundType<A>) -> Result<JoinType<A>, SchemaError> {
        let mut fields = IndexMap::with_capacity(bound.fields.len());

        for field in bound.fields {
            let descriptor = match field.definition {
                FieldDefinition::Column(column) => {
                    let TypeSource::Table(table) = &bound.source else {
                        return Err(SchemaError::ColumnOnRoot {
                            type_name: bound.name.clone(),
                            field: field.name,
                        });
                    };
                    let scalar = match column.scalar {
                        Some(scalar) => scalar,
                        None => {
                            let column_type = self
                                .adapter
                                .column_type(table, &column.column)
                                .ok_or_else(|| SchemaError::UnknownColumn {
                                    type_name: bound.name.clone(),
                                    column: column.column.to_string(),
                                })?;
                            self.adapter
                                .scalar_type_of(table, &column.column, column_type)?
                        }
                    };
                    FieldDescriptor::Immediate(ImmediateField {
                        column: column.column,
                        scalar,
                    })
                }
                FieldDefinition::Relationship(relationship) => FieldDescriptor::Relationship(
                    self.resolve_relationship(key, &field.name, relationship)?,
                ),
                FieldDefinition::Extract(extract) => {
                    FieldDescriptor::Extract(self.resolve_extract(key, &field.attr, &field.name, extract)?)
                }
                FieldDefinition::Lazy(_) => {
                    return Err(SchemaError::LazyChain {
                        type_name: bound.name.clone(),
                        field: field.name,
                    });
                }
            };

            fields.insert(
                field.name.clone(),
                Field {
                    owner: key,
                    attr_name: field.attr,
                    name: field.name,
                    descriptor,
                },
            );
        }

        Ok(JoinType {
            key,
            name: bound.name,
            source: bound.source,
            fields,
        })
    }

    fn resolve_relationship(
        &self,
        owner_key: TypeKey,
        field_name: &str,
        definition: RelationshipDefinition<A>,
    ) -> Result<Relationship<A>, SchemaError> {
        let owner = &self.snapshots[owner_key.0];
        let target_key = lookup(self.by_name, &definition.target)?;
        let target = &self.snapshots[target_key.0];

        let Some(target_fields) = target.table_fields() else {
            return Err(SchemaError::RootTarget {
                type_name: owner.name.clone(),
                field: field_name.to_string(),
                target: target.name.clone(),
            });
        };

        let keys = match &definition.join {
            Some(pairs) => pairs
                .iter()
                .map(|(local, remote)| {
                    let local = owner.column(local)?;
                    let remote = target.column(remote)?;
                    Ok(join_key(local.clone(), remote.clone()))
                })
                .collect::<Result<Vec<_>, SchemaError>>()?,
            None if definition.select.is_some() => Vec::new(),
            None => match owner.table_fields() {
                Some(owner_fields) => {
                    let (local, remote) = infer_join(self.adapter, &owner_fields, &target_fields)?;
                    vec![join_key(local, remote)]
                }
                // root relationships select everything
                None => Vec::new(),
            },
        };

        let base = match definition.select {
            Some(generator) => BaseSelect::Custom(generator),
            None if keys.is_empty() => BaseSelect::All,
            None => BaseSelect::Join,
        };

        Ok(Relationship {
            cardinality: definition.cardinality,
            target: target_key,
            keys,
            base,
            arguments: definition.arguments,
        })
    }

    fn resolve_extract(
        &self,
        owner_key: TypeKey,
        attr: &str,
        field_name: &str,
        definition: ExtractDefinition,
    ) -> Result<ExtractField, SchemaError> {
        let owner = &self.snapshots[owner_key.0];
        let invalid = |reason: String| SchemaError::InvalidExtract {
            type_name: owner.name.clone(),
            field: field_name.to_string(),
            reason,
        };

        let (cardinality, target_name) = owner
            .relationships
            .get(&definition.relationship)
            .ok_or_else(|| invalid(format!("'{}' is not a relationship", definition.relationship)))?;
        if *cardinality != Cardinality::Single {
            return Err(invalid(format!(
                "'{}' is not a single relationship",
                definition.relationship
            )));
        }

        let target_key = lookup(self.by_name, target_name)?;
        let target = &self.snapshots[target_key.0];
        let field = target.names.get(&definition.field).ok_or_else(|| {
            invalid(format!("'{}' has no field '{}'", target.name, definition.field))
        })?;

        // Follow chained extracts down to the column they read
        let mut visited = HashSet::from([(owner_key, attr.to_string())]);
        let mut current = (target_key, definition.field.clone());
        loop {
            let snapshot = &self.snapshots[current.0.0];
            let public = snapshot.names.get(&current.1).unwrap_or(&current.1);
            if !visited.insert(current.clone()) {
                return Err(invalid(format!(
                    "extract chain loops back to '{}.{}'",
                    snapshot.name, public
                )));
            }
            if snapshot.column_attrs.contains_key(&current.1) {
                break;
            }
            let (relationship, next_field) = snapshot.extracts.get(&current.1).ok_or_else(|| {
                invalid(format!("'{}.{}' is not a column", snapshot.name, public))
            })?;
            let (_, next_target) = snapshot.relationships.get(relationship).ok_or_else(|| {
                invalid(format!(
                    "'{}.{}' extracts through unknown relationship '{}'",
                    snapshot.name, public, relationship
                ))
            })?;
            current = (lookup(self.by_name, next_target)?, next_field.clone());
        }

        Ok(ExtractField {
            relationship: owner.names[&definition.relationship].clone(),
            field: field.clone(),
        })
    }
}

fn join_key<A: JoinAdapter>(local: ColumnField<A::Column>, remote: ColumnField<A::Column>) -> JoinKey<A> {
    JoinKey {
        local: local.name,
        remote: remote.name,
        local_column: local.column,
        remote_column: remote.column,
    }
}
