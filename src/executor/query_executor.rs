//! Query execution: root fields resolved independently

use futures::future::join_all;
use serde_json::{Map, Value};

use super::field_resolver::{Walker, resolve_level};
use super::request::FieldRequest;
use super::response::FieldError;
use crate::core::adapter::JoinAdapter;
use crate::schema::TypeKey;

/// Value and errors of one root field
pub(crate) struct RootOutcome {
    pub key: String,
    pub value: Value,
    pub errors: Vec<FieldError>,
}

impl RootOutcome {
    pub fn failed(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Resolve one root field with its whole subtree
pub(crate) async fn resolve_root_field<A: JoinAdapter>(
    walker: &Walker<'_, A>,
    root: TypeKey,
    field: &FieldRequest,
) -> RootOutcome {
    tracing::debug!(field = %field.key, "resolving root field");

    match resolve_level(walker, root, std::slice::from_ref(field), None, &[], &[]).await {
        Ok(mut level) => {
            let value = level
                .records
                .pop()
                .and_then(|mut record| record.value.remove(&field.key))
                .unwrap_or(Value::Null);
            RootOutcome {
                key: field.key.clone(),
                value,
                errors: level.errors,
            }
        }
        Err(error) => {
            tracing::warn!(field = %field.key, error = %error, "root field failed");
            RootOutcome {
                key: field.key.clone(),
                value: Value::Null,
                errors: vec![FieldError::new(&error, vec![field.key.clone()])],
            }
        }
    }
}

/// Resolve the root fields of a query
///
/// Fields run concurrently when `concurrent` is set; the output keeps
/// document order either way.
pub(crate) async fn execute_query<A: JoinAdapter>(
    walker: &Walker<'_, A>,
    root: TypeKey,
    fields: &[FieldRequest],
    concurrent: bool,
) -> (Map<String, Value>, Vec<FieldError>) {
    let outcomes = if concurrent {
        join_all(
            fields
                .iter()
                .map(|field| resolve_root_field(walker, root, field)),
        )
        .await
    } else {
        let mut outcomes = Vec::with_capacity(fields.len());
        for field in fields {
            outcomes.push(resolve_root_field(walker, root, field).await);
        }
        outcomes
    };

    let mut data = Map::new();
    let mut errors = Vec::new();
    for outcome in outcomes {
        data.insert(outcome.key, outcome.value);
        errors.extend(outcome.errors);
    }

    (data, errors)
}
