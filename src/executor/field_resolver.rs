//! Selection-tree walker
//!
//! [`resolve_level`] resolves one level of the selection tree for a batch of
//! records: it issues a single `fetch_immediates` call for the level, derives
//! every relationship's child cursor from the same parent cursor, recurses
//! once per relationship, and re-attaches the children to their parents by
//! correlation key. The number of fetches therefore grows with the depth of
//! the selection tree, never with the number of records.

use anyhow::anyhow;
use futures::future::{BoxFuture, FutureExt, join_all};
use serde_json::{Map, Value};
use std::borrow::Cow;

use super::grouping::{Groups, Record};
use super::request::FieldRequest;
use super::response::FieldError;
use crate::core::adapter::JoinAdapter;
use crate::core::error::ExecutionError;
use crate::core::field::{CorrelationKey, Row, ScalarType};
use crate::schema::{Cardinality, FieldDescriptor, JoinType, Relationship, Schema, TypeKey};

/// Request-scoped state shared by every level of one execution
pub(crate) struct Walker<'a, A: JoinAdapter> {
    pub schema: &'a Schema<A>,
    pub context: &'a A::Context,
    pub concurrent_relationships: bool,
}

/// Resolved records of one level plus the errors raised beneath it
#[derive(Debug, Default)]
pub(crate) struct Level {
    pub records: Vec<Record>,
    pub errors: Vec<FieldError>,
}

/// Where an output key takes its value from
enum Slot {
    Immediate { index: usize, scalar: ScalarType },
    Relationship(usize),
    Extract { job: usize, field: String },
    Null,
}

/// One relationship fetch of a level
struct Job<'r, A: JoinAdapter> {
    /// Public name of the relationship field
    field: &'r str,
    relationship: &'r Relationship<A>,
    args: Cow<'r, Map<String, Value>>,
    selections: Cow<'r, [FieldRequest]>,
    /// Output keys whose errors this job reports
    keys: Vec<&'r str>,
    /// Indexes of the local join columns in the fetched rows
    local: Vec<usize>,
    /// Public names of the target fields the children correlate on
    remote: Vec<String>,
}

/// Resolve `selections` on the records of `type_key` matched by `cursor`
///
/// `key_fields` names the fields the parent correlates on; every returned
/// record is tagged with their values. Root types have no cursor.
pub(crate) fn resolve_level<'a, A: JoinAdapter>(
    walker: &'a Walker<'a, A>,
    type_key: TypeKey,
    selections: &'a [FieldRequest],
    cursor: Option<&'a A::Cursor>,
    key_fields: &'a [String],
    path: &'a [String],
) -> BoxFuture<'a, Result<Level, ExecutionError>> {
    async move { resolve_level_impl(walker, type_key, selections, cursor, key_fields, path).await }
        .boxed()
}

/// Implementation of resolve_level
async fn resolve_level_impl<A: JoinAdapter>(
    walker: &Walker<'_, A>,
    type_key: TypeKey,
    selections: &[FieldRequest],
    cursor: Option<&A::Cursor>,
    key_fields: &[String],
    path: &[String],
) -> Result<Level, ExecutionError> {
    let schema = walker.schema;
    let join_type = schema.join_type(type_key);
    let mut errors = Vec::new();

    // Plan the level: output slots, fetched columns and relationship jobs
    let mut columns: Vec<A::Column> = Vec::new();
    let mut slots = Vec::with_capacity(selections.len());
    let mut jobs: Vec<Job<'_, A>> = Vec::new();
    let mut extract_jobs: Vec<(&str, usize)> = Vec::new();

    for selection in selections {
        let slot = match plan_field(join_type, selection) {
            Ok(FieldDescriptor::Immediate(immediate)) => Slot::Immediate {
                index: column_index(&mut columns, &immediate.column),
                scalar: immediate.scalar,
            },
            Ok(FieldDescriptor::Relationship(relationship)) => {
                jobs.push(Job {
                    field: &selection.name,
                    relationship,
                    args: Cow::Borrowed(&selection.args),
                    selections: Cow::Borrowed(&selection.selections),
                    keys: vec![selection.key.as_str()],
                    local: Vec::new(),
                    remote: Vec::new(),
                });
                Slot::Relationship(jobs.len() - 1)
            }
            Ok(FieldDescriptor::Extract(extract)) => {
                let job = match extract_jobs
                    .iter()
                    .find(|(name, _)| *name == extract.relationship)
                {
                    Some((_, job)) => *job,
                    None => {
                        let relationship = join_type
                            .field(&extract.relationship)
                            .and_then(|field| field.as_relationship())
                            .ok_or_else(|| ExecutionError::UnknownField {
                                type_name: join_type.name().to_string(),
                                field: extract.relationship.clone(),
                            })?;
                        jobs.push(Job {
                            field: &extract.relationship,
                            relationship,
                            args: Cow::Owned(Map::new()),
                            selections: Cow::Owned(Vec::new()),
                            keys: Vec::new(),
                            local: Vec::new(),
                            remote: Vec::new(),
                        });
                        extract_jobs.push((&extract.relationship, jobs.len() - 1));
                        jobs.len() - 1
                    }
                };

                let hidden = &mut jobs[job];
                hidden.keys.push(&selection.key);
                if !hidden
                    .selections
                    .iter()
                    .any(|requested| requested.name == extract.field)
                {
                    hidden
                        .selections
                        .to_mut()
                        .push(FieldRequest::new(extract.field.clone()));
                }
                Slot::Extract {
                    job,
                    field: extract.field.clone(),
                }
            }
            Err(error) => {
                report(&mut errors, &error, path, &selection.key);
                Slot::Null
            }
        };
        slots.push(slot);
    }

    let key_indexes = key_fields
        .iter()
        .map(|name| {
            join_type
                .field(name)
                .and_then(|field| field.as_immediate())
                .map(|immediate| column_index(&mut columns, &immediate.column))
                .ok_or_else(|| ExecutionError::UnknownField {
                    type_name: join_type.name().to_string(),
                    field: name.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    for job in &mut jobs {
        for key in job.relationship.keys() {
            job.local.push(column_index(&mut columns, &key.local_column));
            job.remote.push(key.remote.clone());
        }
    }

    let rows = fetch_rows(walker, join_type, &columns, cursor).await?;

    // Resolve every relationship against the same parent cursor
    let child_paths: Vec<Vec<String>> = jobs
        .iter()
        .map(|job| child_path(path, job.keys.first().copied().unwrap_or(job.field)))
        .collect();
    let pending: Vec<_> = jobs
        .iter()
        .zip(&child_paths)
        .map(|(job, child_path)| resolve_job(walker, job, cursor, child_path))
        .collect();
    let outcomes = if walker.concurrent_relationships {
        join_all(pending).await
    } else {
        let mut outcomes = Vec::with_capacity(pending.len());
        for job in pending {
            outcomes.push(job.await);
        }
        outcomes
    };

    // Attach children to every parent row
    let mut attached: Vec<Option<Vec<Value>>> = Vec::with_capacity(jobs.len());
    for (job, outcome) in jobs.iter().zip(outcomes) {
        let level = match outcome {
            Ok(level) => level,
            Err(error) => {
                for key in &job.keys {
                    report(&mut errors, &error, path, key);
                }
                attached.push(None);
                continue;
            }
        };
        errors.extend(level.errors);

        let groups = Groups::new(level.records);
        let keys: Vec<Option<CorrelationKey>> = rows
            .iter()
            .map(|row| CorrelationKey::from_row(row, &job.local))
            .collect();
        tracing::debug!(
            type_name = %join_type.name(),
            field = job.field,
            groups = groups.len(),
            parents = rows.len(),
            "grouped relationship"
        );

        let cardinality = job.relationship.cardinality();
        if cardinality == Cardinality::Single {
            let widest = groups.widest(keys.iter().map(Option::as_ref));
            if widest > 1 {
                let error = ExecutionError::Integrity {
                    type_name: join_type.name().to_string(),
                    field: job.field.to_string(),
                    count: widest,
                };
                for key in &job.keys {
                    report(&mut errors, &error, path, key);
                }
                attached.push(None);
                continue;
            }
        }

        attached.push(Some(
            keys.iter()
                .map(|key| groups.attach(key.as_ref(), cardinality))
                .collect(),
        ));
    }

    // Assemble one output object per row, in request order
    let mut records = Vec::with_capacity(rows.len());
    for (position, row) in rows.iter().enumerate() {
        // null keys never correlate, so no parent could claim this record
        let Some(key) = CorrelationKey::from_row(row, &key_indexes) else {
            continue;
        };

        let mut value = Map::new();
        for (selection, slot) in selections.iter().zip(&slots) {
            let output = match slot {
                Slot::Immediate { index, scalar } => scalar.coerce(&row[*index]),
                Slot::Relationship(job) => attached_value(&attached, *job, position),
                Slot::Extract { job, field } => match attached_value(&attached, *job, position) {
                    Value::Object(mut child) => child.remove(field).unwrap_or(Value::Null),
                    _ => Value::Null,
                },
                Slot::Null => Value::Null,
            };
            value.insert(selection.key.clone(), output);
        }
        records.push(Record { key, value });
    }

    Ok(Level { records, errors })
}

/// Descriptor of a requested field, with its arguments checked
fn plan_field<'t, A: JoinAdapter>(
    join_type: &'t JoinType<A>,
    selection: &FieldRequest,
) -> Result<&'t FieldDescriptor<A>, ExecutionError> {
    let field = join_type
        .field(&selection.name)
        .ok_or_else(|| ExecutionError::UnknownField {
            type_name: join_type.name().to_string(),
            field: selection.name.clone(),
        })?;

    let declared = |argument: &str| {
        field
            .as_relationship()
            .is_some_and(|relationship| relationship.argument(argument).is_some())
    };
    if let Some(argument) = selection.args.keys().find(|argument| !declared(argument.as_str())) {
        return Err(ExecutionError::UnknownArgument {
            field: selection.name.clone(),
            argument: argument.clone(),
        });
    }

    Ok(field.descriptor())
}

/// Position of `column` in the fetch list, appending it if needed
fn column_index<C: PartialEq + Clone>(columns: &mut Vec<C>, column: &C) -> usize {
    match columns.iter().position(|existing| existing == column) {
        Some(index) => index,
        None => {
            columns.push(column.clone());
            columns.len() - 1
        }
    }
}

/// The level's single fetch; root types yield one empty row without a fetch
async fn fetch_rows<A: JoinAdapter>(
    walker: &Walker<'_, A>,
    join_type: &JoinType<A>,
    columns: &[A::Column],
    cursor: Option<&A::Cursor>,
) -> Result<Vec<Row>, ExecutionError> {
    let Some(table) = join_type.table() else {
        return Ok(vec![Vec::new()]);
    };
    let cursor = cursor.ok_or_else(|| {
        ExecutionError::Adapter(anyhow!("No cursor to fetch type '{}'", join_type.name()))
    })?;

    let rows = walker
        .schema
        .adapter()
        .fetch_immediates(table, columns, cursor, walker.context)
        .await?;
    tracing::debug!(
        type_name = %join_type.name(),
        columns = columns.len(),
        rows = rows.len(),
        "fetched immediates"
    );

    if let Some(row) = rows.iter().find(|row| row.len() != columns.len()) {
        return Err(ExecutionError::MalformedRow {
            type_name: join_type.name().to_string(),
            expected: columns.len(),
            actual: row.len(),
        });
    }

    Ok(rows)
}

/// Derive the child cursor of a job and resolve the target level with it
fn resolve_job<'a, A: JoinAdapter>(
    walker: &'a Walker<'a, A>,
    job: &'a Job<'a, A>,
    cursor: Option<&'a A::Cursor>,
    path: &'a [String],
) -> BoxFuture<'a, Result<Level, ExecutionError>> {
    async move {
        let relationship = job.relationship;
        let child_cursor = relationship
            .generate_select(walker.schema, &job.args, cursor, walker.context)
            .await?;

        resolve_level(
            walker,
            relationship.target(),
            &job.selections,
            Some(&child_cursor),
            &job.remote,
            path,
        )
        .await
    }
    .boxed()
}

fn attached_value(attached: &[Option<Vec<Value>>], job: usize, position: usize) -> Value {
    attached[job]
        .as_ref()
        .and_then(|values| values.get(position))
        .cloned()
        .unwrap_or(Value::Null)
}

fn child_path(path: &[String], key: &str) -> Vec<String> {
    let mut child = path.to_vec();
    child.push(key.to_string());
    child
}

fn report(errors: &mut Vec<FieldError>, error: &ExecutionError, path: &[String], key: &str) {
    let error = FieldError::new(error, child_path(path, key));
    tracing::warn!(path = ?error.path, error = %error.message, "field resolution failed");
    errors.push(error);
}
