//! Foreign-key join inference
//!
//! When a relationship between two object types declares no join, the
//! column fields of both sides are scanned for a foreign key pointing at the
//! other side's primary key. Owner → target is tried first; only when it
//! yields nothing is target → owner tried. The chosen direction must yield
//! exactly one candidate.

use crate::core::adapter::JoinAdapter;
use crate::core::error::SchemaError;

/// A column field as seen by inference
#[derive(Debug, Clone)]
pub(crate) struct ColumnField<C> {
    pub name: String,
    pub column: C,
}

/// The column fields of one object type
pub(crate) struct TableFields<'a, C> {
    pub type_name: &'a str,
    pub table: &'a str,
    pub fields: &'a [ColumnField<C>],
}

/// An inferred (owner field, target field) pair
pub(crate) type Candidate<C> = (ColumnField<C>, ColumnField<C>);

/// Infer the single correlation pair between `owner` and `target`
pub(crate) fn infer_join<A: JoinAdapter>(
    adapter: &A,
    owner: &TableFields<'_, A::Column>,
    target: &TableFields<'_, A::Column>,
) -> Result<Candidate<A::Column>, SchemaError> {
    let mut candidates = directional(adapter, owner, target)?;

    if candidates.is_empty() {
        candidates = directional(adapter, target, owner)?
            .into_iter()
            .map(|(target_field, owner_field)| (owner_field, target_field))
            .collect();
    }

    match candidates.len() {
        0 => Err(SchemaError::NoForeignKey {
            owner: owner.type_name.to_string(),
            target: target.type_name.to_string(),
        }),
        1 => Ok(candidates.remove(0)),
        n => Err(SchemaError::AmbiguousForeignKey {
            owner: owner.type_name.to_string(),
            target: target.type_name.to_string(),
            candidates: n,
        }),
    }
}

/// Foreign keys on `local` columns that reference `remote`'s primary key
fn directional<A: JoinAdapter>(
    adapter: &A,
    local: &TableFields<'_, A::Column>,
    remote: &TableFields<'_, A::Column>,
) -> Result<Vec<Candidate<A::Column>>, SchemaError> {
    let foreign_keys = adapter.foreign_keys_of(local.table);
    let remote_primary_key = adapter.primary_key_of(remote.table);
    let mut candidates = Vec::new();

    for local_field in local.fields {
        for foreign_key in &foreign_keys {
            if foreign_key.column != local_field.column
                || foreign_key.references_table != remote.table
                || !remote_primary_key.contains(&foreign_key.references_column)
            {
                continue;
            }

            let remote_field = remote
                .fields
                .iter()
                .find(|field| field.column == foreign_key.references_column)
                .ok_or_else(|| SchemaError::UnexposedColumn {
                    type_name: remote.type_name.to_string(),
                    column: foreign_key.references_column.to_string(),
                })?;

            candidates.push((local_field.clone(), remote_field.clone()));
        }
    }

    Ok(candidates)
}

#[cfg(test)]
#[cfg(feature = "in-memory")]
mod tests {
    use super::*;
    use crate::core::field::ColumnType;
    use crate::storage::in_memory::{InMemoryStore, TableDef};

    fn store() -> InMemoryStore {
        let store = InMemoryStore::new();
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
                    .column("author_id", ColumnType::Integer)
                    .column("editor_id", ColumnType::Integer)
                    .primary_key(["id"])
                    .foreign_key("author_id", "author", "id")
                    .foreign_key("editor_id", "author", "id"),
            )
            .expect("create book");
        store
    }

    fn field(name: &str) -> ColumnField<String> {
        ColumnField {
            name: name.to_string(),
            column: name.to_string(),
        }
    }

    #[test]
    fn test_infers_owner_to_target() {
        let store = store();
        let book_fields = vec![field("id"), field("author_id")];
        let author_fields = vec![field("id"), field("name")];
        let book = TableFields {
            type_name: "Book",
            table: "book",
            fields: &book_fields,
        };
        let author = TableFields {
            type_name: "Author",
            table: "author",
            fields: &author_fields,
        };

        let (local, remote) = infer_join(&store, &book, &author).expect("one candidate");
        assert_eq!(local.name, "author_id");
        assert_eq!(remote.name, "id");
    }

    #[test]
    fn test_infers_target_to_owner() {
        let store = store();
        let book_fields = vec![field("id"), field("author_id")];
        let author_fields = vec![field("id")];
        let book = TableFields {
            type_name: "Book",
            table: "book",
            fields: &book_fields,
        };
        let author = TableFields {
            type_name: "Author",
            table: "author",
            fields: &author_fields,
        };

        let (local, remote) = infer_join(&store, &author, &book).expect("one candidate");
        assert_eq!(local.name, "id");
        assert_eq!(remote.name, "author_id");
    }

    #[test]
    fn test_two_candidates_are_ambiguous() {
        let store = store();
        let book_fields = vec![field("author_id"), field("editor_id")];
        let author_fields = vec![field("id")];
        let book = TableFields {
            type_name: "Book",
            table: "book",
            fields: &book_fields,
        };
        let author = TableFields {
            type_name: "Author",
            table: "author",
            fields: &author_fields,
        };

        let err = infer_join(&store, &book, &author).expect_err("ambiguous");
        assert_eq!(
            err,
            SchemaError::AmbiguousForeignKey {
                owner: "Book".to_string(),
                target: "Author".to_string(),
                candidates: 2,
            }
        );
    }

    #[test]
    fn test_no_candidate() {
        let store = store();
        let book_fields = vec![field("id"), field("title")];
        let author_fields = vec![field("id")];
        let book = TableFields {
            type_name: "Book",
            table: "book",
            fields: &book_fields,
        };
        let author = TableFields {
            type_name: "Author",
            table: "author",
            fields: &author_fields,
        };

        let err = infer_join(&store, &book, &author).expect_err("no candidate");
        assert_eq!(err.error_code(), "NO_FOREIGN_KEY");
    }

    #[test]
    fn test_referenced_column_must_be_exposed() {
        let store = store();
        let book_fields = vec![field("author_id")];
        let author_fields = vec![field("name")];
        let book = TableFields {
            type_name: "Book",
            table: "book",
            fields: &book_fields,
        };
        let author = TableFields {
            type_name: "Author",
            table: "author",
            fields: &author_fields,
        };

        let err = infer_join(&store, &book, &author).expect_err("id not exposed");
        assert_eq!(err.error_code(), "UNEXPOSED_COLUMN");
    }
}
