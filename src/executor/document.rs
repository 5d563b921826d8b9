//! GraphQL document front: turns a query document into a [`Request`]
//!
//! Aliases, variables (with defaults), fragment spreads, inline fragments and
//! the `@skip` / `@include` directives are resolved here, so the executor only
//! ever sees a plain selection tree.

use graphql_parser::query::{
    Definition, Directive, Document, FragmentDefinition, OperationDefinition, Selection,
    SelectionSet, Value as GqlValue, VariableDefinition, parse_query,
};
use serde_json::{Map, Value, json};
use std::collections::HashMap;

use super::request::{FieldRequest, OperationKind, Request, merge_field};
use crate::core::error::DocumentError;

type Fragments<'r, 'a> = HashMap<&'r str, &'r FragmentDefinition<'a, String>>;

/// Variable values of one operation, defaults applied
struct Variables<'v> {
    values: &'v Map<String, Value>,
    defaults: HashMap<String, Value>,
    declared: Vec<String>,
}

impl<'v> Variables<'v> {
    fn new(values: &'v Map<String, Value>, definitions: &[VariableDefinition<'_, String>]) -> Self {
        Self {
            values,
            defaults: definitions
                .iter()
                .filter_map(|definition| {
                    definition
                        .default_value
                        .as_ref()
                        .map(|value| (definition.name.clone(), constant_to_json(value)))
                })
                .collect(),
            declared: definitions
                .iter()
                .map(|definition| definition.name.clone())
                .collect(),
        }
    }

    /// Bound value; `None` for a declared variable that was not supplied
    fn get(&self, name: &str) -> Result<Option<Value>, DocumentError> {
        if let Some(value) = self.values.get(name) {
            return Ok(Some(value.clone()));
        }
        if let Some(value) = self.defaults.get(name) {
            return Ok(Some(value.clone()));
        }
        if self.declared.iter().any(|declared| declared == name) {
            return Ok(None);
        }
        Err(DocumentError::UnboundVariable(name.to_string()))
    }
}

impl Request {
    /// Parse a GraphQL document and build the request for one of its operations
    ///
    /// Without `operation_name` the first operation of the document is used.
    pub fn from_document(
        query: &str,
        operation_name: Option<&str>,
        variables: &Map<String, Value>,
    ) -> Result<Self, DocumentError> {
        let document = parse_query::<String>(query)
            .map_err(|e| DocumentError::Parse(e.to_string()))?;
        Self::from_parsed(&document, operation_name, variables)
    }

    fn from_parsed<'a>(
        document: &Document<'a, String>,
        operation_name: Option<&str>,
        variables: &Map<String, Value>,
    ) -> Result<Self, DocumentError> {
        let fragments: Fragments<'_, 'a> = document
            .definitions
            .iter()
            .filter_map(|definition| match definition {
                Definition::Fragment(fragment) => Some((fragment.name.as_str(), fragment)),
                Definition::Operation(_) => None,
            })
            .collect();

        let operation = find_operation(document, operation_name)?;
        let (operation, definitions, selection_set) = match operation {
            OperationDefinition::SelectionSet(selection_set) => {
                (OperationKind::Query, &[][..], selection_set)
            }
            OperationDefinition::Query(query) => (
                OperationKind::Query,
                query.variable_definitions.as_slice(),
                &query.selection_set,
            ),
            OperationDefinition::Mutation(mutation) => (
                OperationKind::Mutation,
                mutation.variable_definitions.as_slice(),
                &mutation.selection_set,
            ),
            OperationDefinition::Subscription(_) => return Err(DocumentError::Subscription),
        };

        let variables = Variables::new(variables, definitions);
        let mut fields = Vec::new();
        collect_fields(
            selection_set,
            &fragments,
            &variables,
            &mut Vec::new(),
            &mut fields,
        )?;

        Ok(Self { operation, fields })
    }
}

fn find_operation<'r, 'a>(
    document: &'r Document<'a, String>,
    operation_name: Option<&str>,
) -> Result<&'r OperationDefinition<'a, String>, DocumentError> {
    let mut operations = document
        .definitions
        .iter()
        .filter_map(|definition| match definition {
            Definition::Operation(operation) => Some(operation),
            Definition::Fragment(_) => None,
        });

    let Some(wanted) = operation_name else {
        return operations.next().ok_or(DocumentError::NoOperation);
    };

    operations
        .find(|operation| {
            let name = match operation {
                OperationDefinition::Query(query) => query.name.as_deref(),
                OperationDefinition::Mutation(mutation) => mutation.name.as_deref(),
                OperationDefinition::Subscription(subscription) => subscription.name.as_deref(),
                OperationDefinition::SelectionSet(_) => None,
            };
            name == Some(wanted)
        })
        .ok_or_else(|| DocumentError::UnknownOperation(wanted.to_string()))
}

/// Flatten a selection set into field requests, expanding fragments in place
///
/// Fields sharing a response key are merged into one request.
fn collect_fields<'a>(
    selection_set: &SelectionSet<'a, String>,
    fragments: &Fragments<'_, 'a>,
    variables: &Variables<'_>,
    spreading: &mut Vec<String>,
    fields: &mut Vec<FieldRequest>,
) -> Result<(), DocumentError> {
    for selection in &selection_set.items {
        match selection {
            Selection::Field(field) => {
                if !included(&field.directives, variables)? {
                    continue;
                }

                let mut args = Map::new();
                for (name, value) in &field.arguments {
                    if let Some(value) = gql_value_to_json(value, variables)? {
                        args.insert(name.clone(), value);
                    }
                }

                let mut selections = Vec::new();
                collect_fields(
                    &field.selection_set,
                    fragments,
                    variables,
                    spreading,
                    &mut selections,
                )?;

                merge_field(
                    fields,
                    FieldRequest {
                        key: field.alias.clone().unwrap_or_else(|| field.name.clone()),
                        name: field.name.clone(),
                        args,
                        selections,
                    },
                );
            }
            Selection::FragmentSpread(spread) => {
                if !included(&spread.directives, variables)? {
                    continue;
                }
                let fragment = fragments
                    .get(spread.fragment_name.as_str())
                    .ok_or_else(|| DocumentError::UnknownFragment(spread.fragment_name.clone()))?;
                if spreading.contains(&spread.fragment_name) {
                    return Err(DocumentError::FragmentCycle(spread.fragment_name.clone()));
                }
                spreading.push(spread.fragment_name.clone());
                collect_fields(&fragment.selection_set, fragments, variables, spreading, fields)?;
                spreading.pop();
            }
            Selection::InlineFragment(inline) => {
                if !included(&inline.directives, variables)? {
                    continue;
                }
                collect_fields(&inline.selection_set, fragments, variables, spreading, fields)?;
            }
        }
    }

    Ok(())
}

/// Evaluate `@skip(if:)` and `@include(if:)`
fn included(
    directives: &[Directive<'_, String>],
    variables: &Variables<'_>,
) -> Result<bool, DocumentError> {
    for directive in directives {
        let condition = directive
            .arguments
            .iter()
            .find(|(name, _)| name == "if")
            .map(|(_, value)| gql_value_to_json(value, variables))
            .transpose()?
            .flatten();
        let condition = matches!(condition, Some(Value::Bool(true)));

        match directive.name.as_str() {
            "skip" if condition => return Ok(false),
            "include" if !condition => return Ok(false),
            _ => {}
        }
    }

    Ok(true)
}

/// Convert GraphQL value to JSON
///
/// `None` means the value is an unsupplied variable and the argument is absent.
fn gql_value_to_json(
    value: &GqlValue<'_, String>,
    variables: &Variables<'_>,
) -> Result<Option<Value>, DocumentError> {
    let value = match value {
        GqlValue::Variable(name) => return variables.get(name),
        GqlValue::List(list) => {
            let mut values = Vec::with_capacity(list.len());
            for item in list {
                values.push(gql_value_to_json(item, variables)?.unwrap_or(Value::Null));
            }
            Value::Array(values)
        }
        GqlValue::Object(object) => {
            let mut map = Map::new();
            for (key, item) in object {
                if let Some(item) = gql_value_to_json(item, variables)? {
                    map.insert(key.clone(), item);
                }
            }
            Value::Object(map)
        }
        constant => constant_to_json(constant),
    };

    Ok(Some(value))
}

/// Convert a GraphQL literal to JSON; variables inside defaults become null
fn constant_to_json(value: &GqlValue<'_, String>) -> Value {
    match value {
        GqlValue::Null | GqlValue::Variable(_) => Value::Null,
        GqlValue::Int(i) => i.as_i64().map(Value::from).unwrap_or(Value::Null),
        GqlValue::Float(f) => json!(f),
        GqlValue::String(s) => json!(s),
        GqlValue::Boolean(b) => json!(b),
        GqlValue::Enum(e) => json!(e),
        GqlValue::List(list) => Value::Array(list.iter().map(constant_to_json).collect()),
        GqlValue::Object(object) => Value::Object(
            object
                .iter()
                .map(|(key, item)| (key.clone(), constant_to_json(item)))
                .collect(),
        ),
    }
}
