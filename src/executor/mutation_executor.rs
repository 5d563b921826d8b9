//! Mutation sequencer
//!
//! Root mutation fields run strictly one after another: a field's whole
//! subtree, writes included, completes before the next field starts. A
//! failed field does not stop the sequence unless the adapter reports the
//! request context as no longer usable, in which case every remaining field
//! is reported as skipped.

use serde_json::{Map, Value};

use super::field_resolver::Walker;
use super::query_executor::resolve_root_field;
use super::request::FieldRequest;
use super::response::FieldError;
use crate::core::adapter::JoinAdapter;
use crate::core::error::ExecutionError;
use crate::schema::TypeKey;

/// Resolve the root fields of a mutation in document order
pub(crate) async fn execute_mutation<A: JoinAdapter>(
    walker: &Walker<'_, A>,
    root: TypeKey,
    fields: &[FieldRequest],
) -> (Map<String, Value>, Vec<FieldError>) {
    let mut data = Map::new();
    let mut errors = Vec::new();
    let mut halted = false;

    for field in fields {
        if halted {
            let error = ExecutionError::Skipped {
                field: field.key.clone(),
            };
            data.insert(field.key.clone(), Value::Null);
            errors.push(FieldError::new(&error, vec![field.key.clone()]));
            continue;
        }

        let outcome = resolve_root_field(walker, root, field).await;
        if outcome.failed() && !walker.schema.adapter().context_usable(walker.context) {
            tracing::info!(
                field = %field.key,
                "request context no longer usable, skipping remaining mutations"
            );
            halted = true;
        }

        data.insert(outcome.key, outcome.value);
        errors.extend(outcome.errors);
    }

    (data, errors)
}
