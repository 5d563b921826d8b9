//! Schema construction: foreign-key inference, cycles and SDL rendering

mod bookstore_harness;

use bookstore_harness::*;
use joiner::core::error::SchemaError;
use joiner::core::field::ColumnType;
use joiner::schema::{BaseSelect, Cardinality, SchemaBuilder};
use joiner::storage::in_memory::{InMemoryStore, TableDef};
use std::sync::Arc;

/// `book` references `person` twice: as author and as editor
fn two_key_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    store
        .create_table(
            TableDef::new("person")
                .column("id", ColumnType::Integer)
                .primary_key(["id"]),
        )
        .unwrap();
    store
        .create_table(
            TableDef::new("book")
                .column("id", ColumnType::Integer)
                .column("author_id", ColumnType::Integer)
                .column("editor_id", ColumnType::Integer)
                .primary_key(["id"])
                .foreign_key("author_id", "person", "id")
                .foreign_key("editor_id", "person", "id"),
        )
        .unwrap();
    store
}

#[test]
fn test_foreign_key_inferred_in_both_directions() {
    let store = bookstore();
    let schema = schema(&store);

    let book = schema.type_by_name("Book").unwrap();
    let author = book.field("author").unwrap().as_relationship().unwrap();
    assert_eq!(author.cardinality(), Cardinality::Single);
    assert_eq!(schema.join_type(author.target()).name(), "Author");
    assert_eq!(author.keys().len(), 1);
    assert_eq!(author.keys()[0].local, "authorId");
    assert_eq!(author.keys()[0].remote, "id");

    let books = schema
        .type_by_name("Author")
        .unwrap()
        .field("books")
        .unwrap()
        .as_relationship()
        .unwrap();
    assert_eq!(books.keys()[0].local, "id");
    assert_eq!(books.keys()[0].remote, "authorId");
}

#[test]
fn test_root_relationships_select_everything() {
    let store = bookstore();
    let schema = schema(&store);

    let books = schema.query_root().field("books").unwrap().as_relationship().unwrap();
    assert!(books.keys().is_empty());
    assert!(matches!(books.base(), BaseSelect::All));
    assert_eq!(books.arguments().len(), 3);
    assert_eq!(books.arguments()[0].name, "genre");
}

#[test]
fn test_two_foreign_keys_are_ambiguous() {
    let store = two_key_store();
    let err = SchemaBuilder::new(Arc::new(store))
        .object_type("Person", "person", |t| t.column("id", "id"))
        .object_type("Book", "book", |t| {
            t.column("author_id", "author_id")
                .column("editor_id", "editor_id")
                .single("author", "Person", |r| r)
        })
        .query_root("Query", |t| t.many("books", "Book", |r| r))
        .build()
        .unwrap_err();

    assert_eq!(
        err,
        SchemaError::AmbiguousForeignKey {
            owner: "Book".to_string(),
            target: "Person".to_string(),
            candidates: 2,
        }
    );
}

#[test]
fn test_explicit_join_resolves_ambiguity() {
    let store = two_key_store();
    let schema = SchemaBuilder::new(Arc::new(store))
        .object_type("Person", "person", |t| {
            t.column("id", "id").many("edited", "Book", |r| {
                r.join_on([("id", "editor_id")])
            })
        })
        .object_type("Book", "book", |t| {
            t.column("author_id", "author_id")
                .column("editor_id", "editor_id")
                .single("editor", "Person", |r| r.join_on([("editor_id", "id")]))
        })
        .query_root("Query", |t| t.many("books", "Book", |r| r))
        .build()
        .unwrap();

    let editor = schema
        .type_by_name("Book")
        .unwrap()
        .field("editor")
        .unwrap()
        .as_relationship()
        .unwrap();
    assert_eq!(editor.keys()[0].local, "editorId");
    assert!(matches!(editor.base(), BaseSelect::Join));
}

#[test]
fn test_missing_foreign_key() {
    let store = bookstore();
    let err = SchemaBuilder::new(Arc::new(store))
        .object_type("Counter", "counter", |t| t.column("id", "id"))
        .object_type("Author", "author", |t| {
            t.column("id", "id").many("counters", "Counter", |r| r)
        })
        .query_root("Query", |t| t.many("authors", "Author", |r| r))
        .build()
        .unwrap_err();

    assert_eq!(
        err,
        SchemaError::NoForeignKey {
            owner: "Author".to_string(),
            target: "Counter".to_string(),
        }
    );
}

#[test]
fn test_mutually_referential_types_build() {
    let store = bookstore();
    let schema = schema(&store);

    let author = schema.type_by_name("Author").unwrap();
    let book = schema.type_by_name("Book").unwrap();
    let to_books = author.field("books").unwrap().as_relationship().unwrap();
    let to_author = book.field("author").unwrap().as_relationship().unwrap();

    assert_eq!(to_books.target(), book.key());
    assert_eq!(to_author.target(), author.key());
}

#[test]
fn test_sdl_rendering() {
    let store = bookstore();
    let sdl = schema(&store).to_sdl();

    assert!(sdl.starts_with("schema {\n  query: Query\n  mutation: Mutation\n}\n"));
    assert!(sdl.contains(
        "type Author {\n  id: Int\n  name: String\n  books(orderBy: String): [Book!]!\n  soleBook: Book\n}\n"
    ));
    assert!(sdl.contains("  authorName: String\n"));
    assert!(sdl.contains("  authorKey: Int\n"));
    assert!(sdl.contains("  published: Int\n"));
    assert!(sdl.contains("  book(id: Int!): Book\n"));
    assert!(sdl.contains("  setCounter(id: Int!, value: Int!): Counter\n"));
}
