//! Core executor orchestration

use serde_json::Value;
use std::sync::Arc;

use super::field_resolver::Walker;
use super::mutation_executor;
use super::query_executor;
use super::request::{OperationKind, Request};
use super::response::{FieldError, Response};
use crate::config::JoinConfig;
use crate::core::adapter::JoinAdapter;
use crate::core::error::ExecutionError;
use crate::schema::Schema;

/// Executes requests against a built [`Schema`]
pub struct Executor<A: JoinAdapter> {
    schema: Arc<Schema<A>>,
    config: JoinConfig,
}

impl<A: JoinAdapter> Executor<A> {
    /// Create an executor with the default configuration
    pub fn new(schema: impl Into<Arc<Schema<A>>>) -> Self {
        Self::with_config(schema, JoinConfig::default())
    }

    pub fn with_config(schema: impl Into<Arc<Schema<A>>>, config: JoinConfig) -> Self {
        Self {
            schema: schema.into(),
            config,
        }
    }

    pub fn schema(&self) -> &Schema<A> {
        &self.schema
    }

    pub fn config(&self) -> &JoinConfig {
        &self.config
    }

    /// Execute a request
    ///
    /// Failures never abort the request: a failed field resolves to null and
    /// its error is reported in [`Response::errors`] under the field's path.
    pub async fn execute(&self, request: &Request, context: &A::Context) -> Response {
        let walker = Walker {
            schema: &self.schema,
            context,
            concurrent_relationships: self.config.concurrent_relationships,
        };

        let root = match request.operation {
            OperationKind::Query => Some(self.schema.query_root),
            OperationKind::Mutation => self.schema.mutation_root,
        };
        let Some(root) = root else {
            let error = ExecutionError::MissingRoot(request.operation.as_str());
            tracing::warn!(error = %error, "request rejected");
            return Response {
                data: Value::Null,
                errors: vec![FieldError::new(&error, Vec::new())],
            };
        };

        tracing::debug!(
            operation = request.operation.as_str(),
            fields = request.fields.len(),
            "executing request"
        );

        let (data, errors) = match request.operation {
            OperationKind::Query => {
                query_executor::execute_query(
                    &walker,
                    root,
                    &request.fields,
                    self.config.concurrent_root_fields,
                )
                .await
            }
            OperationKind::Mutation => {
                mutation_executor::execute_mutation(&walker, root, &request.fields).await
            }
        };

        Response {
            data: Value::Object(data),
            errors,
        }
    }

    /// Parse a GraphQL document and execute one of its operations
    #[cfg(feature = "graphql")]
    pub async fn execute_document(
        &self,
        query: &str,
        operation_name: Option<&str>,
        variables: &serde_json::Map<String, Value>,
        context: &A::Context,
    ) -> Result<Response, crate::core::error::DocumentError> {
        let request = Request::from_document(query, operation_name, variables)?;
        Ok(self.execute(&request, context).await)
    }
}
