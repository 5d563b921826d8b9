//! GraphQL documents executed end to end against the bookstore
#![cfg(all(feature = "graphql", feature = "in-memory"))]

mod bookstore_harness;

use bookstore_harness::*;
use joiner::core::error::DocumentError;
use joiner::storage::in_memory::Session;
use serde_json::{Map, json};

#[tokio::test]
async fn test_document_with_fragments_and_variables() {
    let store = bookstore();
    let executor = executor(&store);

    let query = r#"
        query Shelf($genre: String = "novel") {
            shelf: books(genre: $genre, orderBy: "-published") {
                ...BookParts
                author { name }
            }
        }

        fragment BookParts on Book {
            title
            year: published
        }
    "#;
    let response = executor
        .execute_document(query, None, &Map::new(), &Session::new())
        .await
        .unwrap();

    assert!(response.is_ok(), "{:?}", response.errors);
    assert_eq!(
        response.data["shelf"],
        json!([
            {"title": "Orlando", "year": 1928, "author": {"name": "Woolf"}},
            {"title": "Anna Karenina", "year": 1878, "author": {"name": "Tolstoy"}},
            {"title": "War and Peace", "year": 1869, "author": {"name": "Tolstoy"}},
        ])
    );
    assert_eq!(store.fetch_log(), vec!["book".to_string(), "author".to_string()]);
}

#[tokio::test]
async fn test_fields_selected_twice_are_merged() {
    let store = bookstore();
    let executor = executor(&store);

    let query = r#"
        { books(genre: "essay") { ...Writer author { id } } }
        fragment Writer on Book { author { name } }
    "#;
    let response = executor
        .execute_document(query, None, &Map::new(), &Session::new())
        .await
        .unwrap();

    assert!(response.is_ok(), "{:?}", response.errors);
    assert_eq!(
        response.data,
        json!({"books": [{"author": {"name": "Woolf", "id": 2}}]})
    );
    assert_eq!(store.fetch_log(), vec!["book".to_string(), "author".to_string()]);
}

#[tokio::test]
async fn test_named_mutation_operation() {
    let store = bookstore();
    let executor = executor(&store);

    let document = r#"
        query Read { counter(id: 1) { value } }
        mutation Write($value: Int!) {
            first: setCounter(id: 1, value: $value) { value }
            second: setCounter(id: 1, value: 9) { value }
        }
    "#;
    let mut variables = Map::new();
    variables.insert("value".to_string(), json!(4));

    let response = executor
        .execute_document(document, Some("Write"), &variables, &Session::new())
        .await
        .unwrap();

    assert_eq!(
        response.data,
        json!({"first": {"value": 4}, "second": {"value": 9}})
    );
}

#[tokio::test]
async fn test_document_errors_surface_before_execution() {
    let store = bookstore();
    let executor = executor(&store);

    let err = executor
        .execute_document("{ books { title ", None, &Map::new(), &Session::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentError::Parse(_)));

    let err = executor
        .execute_document("{ books { ...Missing } }", None, &Map::new(), &Session::new())
        .await
        .unwrap_err();
    assert_eq!(err, DocumentError::UnknownFragment("Missing".to_string()));

    assert_eq!(store.fetch_count(), 0);
}
