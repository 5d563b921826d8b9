//! Shared bookstore fixture for integration tests
//!
//! Provides an `InMemoryStore` with authors, books and a counter table, and
//! the schema exercised by every integration test.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! mod bookstore_harness;
//! use bookstore_harness::*;
//! ```

#![allow(dead_code)]

use anyhow::{Result, anyhow, bail};
use serde_json::Value;
use std::sync::Arc;

use joiner::config::JoinConfig;
use joiner::core::field::{ArgumentType, ColumnType, FieldValue};
use joiner::executor::{Executor, Request, Response};
use joiner::row;
use joiner::schema::{Schema, SchemaBuilder};
use joiner::storage::in_memory::{InMemoryStore, MemoryQuery, Session, SortOrder, TableDef};

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Store with the bookstore tables and no records
pub fn empty_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    create_tables(&store);
    store
}

fn create_tables(store: &InMemoryStore) {
    store
        .create_table(
            TableDef::new("author")
                .column("id", ColumnType::Integer)
                .column("name", ColumnType::Text)
                .primary_key(["id"]),
        )
        .expect("create author");
    store
        .create_table(
            TableDef::new("book")
                .column("id", ColumnType::Integer)
                .column("title", ColumnType::Text)
                .column("genre", ColumnType::Varchar)
                .column("published", ColumnType::SmallInt)
                .column("author_id", ColumnType::Integer)
                .primary_key(["id"])
                .foreign_key("author_id", "author", "id"),
        )
        .expect("create book");
    store
        .create_table(
            TableDef::new("counter")
                .column("id", ColumnType::Integer)
                .column("value", ColumnType::BigInt)
                .primary_key(["id"]),
        )
        .expect("create counter");
}

/// Store seeded with three authors, five books and one counter
///
/// Borges has no books; "Anonymous Chronicle" has no author.
pub fn bookstore() -> InMemoryStore {
    let store = empty_store();
    seed(&store);
    store
}

fn seed(store: &InMemoryStore) {
    for author in [row![1, "Tolstoy"], row![2, "Woolf"], row![3, "Borges"]] {
        store.insert("author", author).expect("insert author");
    }
    for book in [
        row![1, "War and Peace", "novel", 1869, 1],
        row![2, "Anna Karenina", "novel", 1878, 1],
        row![3, "Orlando", "novel", 1928, 2],
        row![4, "A Room of One's Own", "essay", 1929, 2],
        row![5, "Anonymous Chronicle", "chronicle", 1100, None::<i64>],
    ] {
        store.insert("book", book).expect("insert book");
    }
    store.insert("counter", row![1, 0]).expect("insert counter");
}

/// Store with `authors` authors, each with `books_each` books
pub fn generated_store(authors: i64, books_each: i64) -> InMemoryStore {
    let store = empty_store();
    let mut book_id = 1;
    for author_id in 1..=authors {
        store
            .insert("author", row![author_id, format!("Author {}", author_id)])
            .expect("insert author");
        for _ in 0..books_each {
            store
                .insert(
                    "book",
                    row![book_id, format!("Book {}", book_id), "novel", 2000, author_id],
                )
                .expect("insert book");
            book_id += 1;
        }
    }
    store
}

// ---------------------------------------------------------------------------
// Argument helpers
// ---------------------------------------------------------------------------

pub fn field_value(value: &Value) -> Result<FieldValue> {
    FieldValue::from_json(value).ok_or_else(|| anyhow!("Unsupported argument value: {}", value))
}

pub fn text(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => bail!("Expected a string argument, got {}", other),
    }
}

fn filter_by(column: &'static str) -> impl Fn(MemoryQuery, &Value) -> Result<MemoryQuery> {
    move |query, value| Ok(query.filter_eq(column, field_value(value)?))
}

fn sort_by(query: MemoryQuery, value: &Value) -> Result<MemoryQuery> {
    let column = text(value)?;
    Ok(match column.strip_prefix('-') {
        Some(column) => query.order_by(column, SortOrder::Descending),
        None => query.order_by(column, SortOrder::Ascending),
    })
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// The bookstore schema
///
/// ```graphql
/// type Query {
///   authors(id: Int, name: String): [Author!]!
///   books(genre: String, orderBy: String, thenBy: String): [Book!]!
///   book(id: Int!): Book
///   counter(id: Int!): Counter
/// }
/// type Mutation {
///   setCounter(id: Int!, value: Int!): Counter
///   renameAuthor(id: Int!, name: String!): Author
///   reject: Counter           # always fails
///   abort: Counter            # invalidates the session, then fails
/// }
/// ```
pub fn schema(store: &InMemoryStore) -> Schema<InMemoryStore> {
    schema_builder(store).build().expect("bookstore schema")
}

pub fn schema_builder(store: &InMemoryStore) -> SchemaBuilder<InMemoryStore> {
    SchemaBuilder::new(Arc::new(store.clone()))
        .object_type("Author", "author", |t| {
            t.column("id", "id")
                .column("name", "name")
                .many("books", "Book", |r| {
                    r.arg("orderBy", ArgumentType::string(), sort_by)
                })
                .single("sole_book", "Book", |r| r)
        })
        .object_type("Book", "book", |t| {
            t.column("id", "id")
                .column("title", "title")
                .column("genre", "genre")
                .column("published", "published")
                .column("author_id", "author_id")
                .single("author", "Author", |r| r)
                .extract("author_name", "author", "name")
                .extract("author_key", "author", "id")
        })
        .object_type("Counter", "counter", |t| {
            t.column("id", "id").column("value", "value")
        })
        .query_root("Query", |t| {
            t.many("authors", "Author", |r| {
                r.arg("id", ArgumentType::int(), filter_by("id"))
                    .arg("name", ArgumentType::string(), filter_by("name"))
            })
            .many("books", "Book", |r| {
                r.arg("genre", ArgumentType::string(), filter_by("genre"))
                    .arg("orderBy", ArgumentType::string(), sort_by)
                    .arg("thenBy", ArgumentType::string(), sort_by)
            })
            .single("book", "Book", |r| {
                r.arg("id", ArgumentType::int().non_null(), filter_by("id"))
            })
            .single("counter", "Counter", |r| {
                r.arg("id", ArgumentType::int().non_null(), filter_by("id"))
            })
        })
        .mutation_root("Mutation", |t| {
            t.single("set_counter", "Counter", |r| {
                r.arg("id", ArgumentType::int().non_null(), filter_by("id"))
                    .arg("value", ArgumentType::int().non_null(), |query, value| {
                        Ok(query.assign("value", field_value(value)?))
                    })
            })
            .single("rename_author", "Author", |r| {
                r.arg("id", ArgumentType::int().non_null(), filter_by("id"))
                    .arg("name", ArgumentType::string().non_null(), |query, value| {
                        Ok(query.assign("name", text(value)?))
                    })
            })
            .single("reject", "Counter", |r| {
                r.select_with(|_, _, _| Err(anyhow!("write rejected")))
            })
            .single("abort", "Counter", |r| {
                r.select_with(|_, _, session: &Session| {
                    session.invalidate();
                    Err(anyhow!("transaction aborted"))
                })
            })
        })
}

pub fn executor(store: &InMemoryStore) -> Executor<InMemoryStore> {
    Executor::new(schema(store))
}

pub fn sequential_executor(store: &InMemoryStore) -> Executor<InMemoryStore> {
    Executor::with_config(schema(store), JoinConfig::sequential())
}

/// Execute `request` in a fresh session
pub async fn run(executor: &Executor<InMemoryStore>, request: &Request) -> Response {
    executor.execute(request, &Session::new()).await
}
