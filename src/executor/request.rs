//! Request model: the selection tree handed to the executor
//!
//! Arguments are expected to be bound and coerced already. The optional
//! `graphql` feature builds a [`Request`] from a GraphQL document.

use serde_json::{Map, Value};

/// Kind of root operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
        }
    }
}

/// One requested field with its bound arguments and sub-selections
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRequest {
    /// Output key, the alias if one was given
    pub key: String,

    /// Public name of the field on its type
    pub name: String,

    pub args: Map<String, Value>,

    pub selections: Vec<FieldRequest>,
}

impl FieldRequest {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            key: name.clone(),
            name,
            args: Map::new(),
            selections: Vec::new(),
        }
    }

    /// Output the field under `key` instead of its name
    pub fn alias(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }

    /// Add a sub-selection, merged into any selection with the same key
    pub fn select(mut self, field: FieldRequest) -> Self {
        merge_field(&mut self.selections, field);
        self
    }

    /// Select several leaf fields at once
    pub fn fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            merge_field(&mut self.selections, FieldRequest::new(name));
        }
        self
    }
}

/// Append `field` to `fields`, or fold it into the field already output
/// under the same key
///
/// The first occurrence keeps its position and arguments; sub-selections
/// are merged recursively.
pub(crate) fn merge_field(fields: &mut Vec<FieldRequest>, field: FieldRequest) {
    match fields.iter_mut().find(|existing| existing.key == field.key) {
        Some(existing) => {
            for selection in field.selections {
                merge_field(&mut existing.selections, selection);
            }
        }
        None => fields.push(field),
    }
}

/// A complete operation
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub operation: OperationKind,
    pub fields: Vec<FieldRequest>,
}

impl Request {
    pub fn query() -> Self {
        Self {
            operation: OperationKind::Query,
            fields: Vec::new(),
        }
    }

    pub fn mutation() -> Self {
        Self {
            operation: OperationKind::Mutation,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldRequest) -> Self {
        merge_field(&mut self.fields, field);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_request_builder() {
        let field = FieldRequest::new("books")
            .alias("firstBooks")
            .arg("limit", 2)
            .fields(["id", "title"])
            .select(FieldRequest::new("author").fields(["name"]));

        assert_eq!(field.key, "firstBooks");
        assert_eq!(field.name, "books");
        assert_eq!(field.args.get("limit"), Some(&json!(2)));
        assert_eq!(field.selections.len(), 3);
        assert_eq!(field.selections[2].selections[0].name, "name");
    }

    #[test]
    fn test_same_key_selections_are_merged() {
        let field = FieldRequest::new("books")
            .select(FieldRequest::new("author").fields(["name"]))
            .fields(["title"])
            .select(FieldRequest::new("author").fields(["id", "name"]))
            .select(FieldRequest::new("author").alias("writer").fields(["id"]));

        let keys: Vec<_> = field.selections.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["author", "title", "writer"]);

        let author: Vec<_> = field.selections[0]
            .selections
            .iter()
            .map(|s| s.key.as_str())
            .collect();
        assert_eq!(author, vec!["name", "id"]);
    }

    #[test]
    fn test_request_kind() {
        let request = Request::mutation().field(FieldRequest::new("updateBook"));

        assert_eq!(request.operation, OperationKind::Mutation);
        assert_eq!(request.operation.as_str(), "mutation");
        assert_eq!(request.fields.len(), 1);
    }
}
