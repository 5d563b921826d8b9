//! Bookstore example: nested reads batched per level, then an ordered mutation
//!
//! Run with `RUST_LOG=joiner=debug` to watch one fetch per level.

use joiner::prelude::*;
use tracing_subscriber::EnvFilter;

fn build_store() -> Result<InMemoryStore> {
    let store = InMemoryStore::new();

    store.create_table(
        TableDef::new("author")
            .column("id", ColumnType::Integer)
            .column("name", ColumnType::Text)
            .primary_key(["id"]),
    )?;
    store.create_table(
        TableDef::new("book")
            .column("id", ColumnType::Integer)
            .column("title", ColumnType::Text)
            .column("published", ColumnType::Integer)
            .column("author_id", ColumnType::Integer)
            .primary_key(["id"])
            .foreign_key("author_id", "author", "id"),
    )?;

    store.insert("author", row![1, "Ursula K. Le Guin"])?;
    store.insert("author", row![2, "Italo Calvino"])?;
    store.insert("book", row![1, "The Dispossessed", 1974, 1])?;
    store.insert("book", row![2, "The Left Hand of Darkness", 1969, 1])?;
    store.insert("book", row![3, "Invisible Cities", 1972, 2])?;

    Ok(store)
}

fn by_id(query: MemoryQuery, value: &Value) -> Result<MemoryQuery> {
    let id = value
        .as_i64()
        .ok_or_else(|| anyhow::anyhow!("id must be an integer"))?;
    Ok(query.filter_eq("id", id))
}

fn build_schema(store: &InMemoryStore) -> Result<Schema<InMemoryStore>> {
    let schema = SchemaBuilder::new(Arc::new(store.clone()))
        .object_type("Author", "author", |t| {
            t.column("id", "id")
                .column("name", "name")
                .many("books", "Book", |r| r)
        })
        .object_type("Book", "book", |t| {
            t.column("id", "id")
                .column("title", "title")
                .column("published", "published")
                .column("author_id", "author_id")
                .single("author", "Author", |r| r)
                .extract("author_name", "author", "name")
        })
        .query_root("Query", |t| {
            t.many("authors", "Author", |r| r)
                .single("book", "Book", |r| r.arg("id", ArgumentType::int().non_null(), by_id))
        })
        .mutation_root("Mutation", |t| {
            t.single("retitle_book", "Book", |r| {
                r.arg("id", ArgumentType::int().non_null(), by_id).arg(
                    "title",
                    ArgumentType::string().non_null(),
                    |query, value| {
                        let title = value
                            .as_str()
                            .ok_or_else(|| anyhow::anyhow!("title must be a string"))?;
                        Ok(query.assign("title", title))
                    },
                )
            })
        })
        .build()?;

    Ok(schema)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("joiner=info")),
        )
        .init();

    println!("📚 Joiner Bookstore Example\n");

    let store = build_store()?;
    let schema = build_schema(&store)?;
    println!("{}", schema.to_sdl());

    let executor = Executor::with_config(schema, JoinConfig::default());
    let session = Session::new();

    println!("🔎 Authors with their books...\n");
    let query = Request::query().field(
        FieldRequest::new("authors").fields(["name"]).select(
            FieldRequest::new("books")
                .fields(["title", "published", "authorName"]),
        ),
    );
    let response = executor.execute(&query, &session).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    println!("   fetches: {:?}\n", store.fetch_log());

    store.clear_fetch_log();

    println!("✏️  Retitling a book...\n");
    let mutation = Request::mutation().field(
        FieldRequest::new("retitleBook")
            .arg("id", 3)
            .arg("title", "Le città invisibili")
            .fields(["title"])
            .select(FieldRequest::new("author").fields(["name"])),
    );
    let response = executor.execute(&mutation, &session).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    println!("   fetches: {:?}", store.fetch_log());

    Ok(())
}
