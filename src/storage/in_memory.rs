//! In-memory relational adapter for testing and development
//!
//! Tables hold typed columns, a primary key and foreign keys. A
//! [`MemoryQuery`] cursor carries equality filters, correlated restrictions
//! against a parent query, an ordering and pending assignments. Assignments
//! are written to every matched record inside
//! [`fetch_immediates`](JoinAdapter::fetch_immediates) before the values are
//! read back, which is how mutating bindings are expressed.

use crate::core::adapter::{ForeignKey, JoinAdapter};
use crate::core::field::{ColumnType, CorrelationKey, FieldValue, Row};
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

/// Build a [`Row`] from heterogeneous values
///
/// ```
/// use joiner::row;
/// use joiner::core::field::FieldValue;
///
/// let row = row![1, "Leo Tolstoy", None::<i64>];
/// assert_eq!(row[2], FieldValue::Null);
/// ```
#[macro_export]
macro_rules! row {
    ($($value:expr),* $(,)?) => {
        vec![$($crate::core::field::FieldValue::from($value)),*]
    };
}

/// Column declaration of a table
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
}

/// Declaration of a table
#[derive(Debug, Clone, PartialEq)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKey<String>>,
}

impl TableDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.push(ColumnDef {
            name: name.into(),
            column_type,
        });
        self
    }

    pub fn primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn foreign_key(
        mut self,
        column: impl Into<String>,
        references_table: impl Into<String>,
        references_column: impl Into<String>,
    ) -> Self {
        self.foreign_keys.push(ForeignKey::new(
            column.into(),
            references_table,
            references_column.into(),
        ));
        self
    }
}

/// Sort direction of a [`MemoryQuery`] ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// A restriction of a [`MemoryQuery`]
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`
    Equals { column: String, value: FieldValue },

    /// `column IN (values)`
    OneOf {
        column: String,
        values: Vec<FieldValue>,
    },

    /// `(columns) IN (SELECT parent_columns FROM parent)`
    Correlated {
        columns: Vec<String>,
        parent: Box<MemoryQuery>,
        parent_columns: Vec<String>,
    },
}

/// Cursor of the in-memory store
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryQuery {
    pub table: String,
    pub filters: Vec<Filter>,
    pub order_by: Vec<(String, SortOrder)>,
    pub assignments: Vec<(String, FieldValue)>,
}

impl MemoryQuery {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            order_by: Vec::new(),
            assignments: Vec::new(),
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filter_eq(self, column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.filter(Filter::Equals {
            column: column.into(),
            value: value.into(),
        })
    }

    pub fn filter_in<I, V>(self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        self.filter(Filter::OneOf {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    pub fn order_by(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.order_by.push((column.into(), order));
        self
    }

    /// Write `value` into `column` of every matched record when fetched
    pub fn assign(mut self, column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.assignments.push((column.into(), value.into()));
        self
    }

    fn read_only(&self) -> Self {
        Self {
            assignments: Vec::new(),
            ..self.clone()
        }
    }
}

/// Request context of the in-memory store
///
/// A session models a transaction: once invalidated, fetches fail and the
/// mutation sequencer stops running later root fields.
#[derive(Debug)]
pub struct Session {
    usable: AtomicBool,
}

impl Session {
    pub fn new() -> Self {
        Self {
            usable: AtomicBool::new(true),
        }
    }

    pub fn invalidate(&self) {
        self.usable.store(false, AtomicOrdering::SeqCst);
    }

    pub fn is_usable(&self) -> bool {
        self.usable.load(AtomicOrdering::SeqCst)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct TableData {
    def: TableDef,
    records: Vec<Row>,
}

impl TableData {
    fn column_index(&self, column: &str) -> Result<usize> {
        self.def
            .columns
            .iter()
            .position(|def| def.name == column)
            .ok_or_else(|| anyhow!("Unknown column '{}' in table '{}'", column, self.def.name))
    }

    fn column_indexes(&self, columns: &[String]) -> Result<Vec<usize>> {
        columns
            .iter()
            .map(|column| self.column_index(column))
            .collect()
    }
}

/// In-memory relational store implementing [`JoinAdapter`]
///
/// Uses RwLock for thread-safe access. Every `fetch_immediates` call is
/// recorded in a fetch log so tests can count round-trips.
#[derive(Clone)]
pub struct InMemoryStore {
    tables: Arc<RwLock<HashMap<String, TableData>>>,
    fetch_log: Arc<Mutex<Vec<String>>>,
    fetch_delay: Option<Duration>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(HashMap::new())),
            fetch_log: Arc::new(Mutex::new(Vec::new())),
            fetch_delay: None,
        }
    }

    /// Sleep for `delay` at the start of every fetch
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    pub fn create_table(&self, def: TableDef) -> Result<()> {
        let mut tables = self
            .tables
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        if tables.contains_key(&def.name) {
            bail!("Table '{}' already exists", def.name);
        }
        tables.insert(
            def.name.clone(),
            TableData {
                def,
                records: Vec::new(),
            },
        );

        Ok(())
    }

    /// Append a record; values follow the table's column order
    pub fn insert(&self, table: &str, row: Row) -> Result<()> {
        let mut tables = self
            .tables
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let data = tables
            .get_mut(table)
            .ok_or_else(|| anyhow!("Unknown table '{}'", table))?;
        if row.len() != data.def.columns.len() {
            bail!(
                "Table '{}' has {} columns, got {} values",
                table,
                data.def.columns.len(),
                row.len()
            );
        }
        data.records.push(row);

        Ok(())
    }

    /// All records of a table, in insertion order
    pub fn records(&self, table: &str) -> Result<Vec<Row>> {
        let tables = self
            .tables
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        tables
            .get(table)
            .map(|data| data.records.clone())
            .ok_or_else(|| anyhow!("Unknown table '{}'", table))
    }

    /// Tables fetched so far, one entry per `fetch_immediates` call
    pub fn fetch_log(&self) -> Vec<String> {
        self.fetch_log
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_log.lock().map(|log| log.len()).unwrap_or(0)
    }

    pub fn clear_fetch_log(&self) {
        if let Ok(mut log) = self.fetch_log.lock() {
            log.clear();
        }
    }

    fn with_table<T>(&self, table: &str, f: impl FnOnce(&TableData) -> T) -> Option<T> {
        let tables = self.tables.read().ok()?;
        tables.get(table).map(f)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Indexes of the records of `query.table` matched by `query`, in output order
fn matching(tables: &HashMap<String, TableData>, query: &MemoryQuery) -> Result<Vec<usize>> {
    let data = tables
        .get(&query.table)
        .ok_or_else(|| anyhow!("Unknown table '{}'", query.table))?;
    let mut matched: Vec<usize> = (0..data.records.len()).collect();

    for filter in &query.filters {
        match filter {
            Filter::Equals { column, value } => {
                let index = data.column_index(column)?;
                matched.retain(|&record| &data.records[record][index] == value);
            }
            Filter::OneOf { column, values } => {
                let index = data.column_index(column)?;
                matched.retain(|&record| values.contains(&data.records[record][index]));
            }
            Filter::Correlated {
                columns,
                parent,
                parent_columns,
            } => {
                let parent_data = tables
                    .get(&parent.table)
                    .ok_or_else(|| anyhow!("Unknown table '{}'", parent.table))?;
                let parent_indexes = parent_data.column_indexes(parent_columns)?;
                let keys: HashSet<CorrelationKey> = matching(tables, parent)?
                    .into_iter()
                    .filter_map(|record| {
                        CorrelationKey::from_row(&parent_data.records[record], &parent_indexes)
                    })
                    .collect();

                let indexes = data.column_indexes(columns)?;
                matched.retain(|&record| {
                    CorrelationKey::from_row(&data.records[record], &indexes)
                        .is_some_and(|key| keys.contains(&key))
                });
            }
        }
    }

    if !query.order_by.is_empty() {
        let order = query
            .order_by
            .iter()
            .map(|(column, direction)| Ok((data.column_index(column)?, *direction)))
            .collect::<Result<Vec<_>>>()?;
        matched.sort_by(|&a, &b| {
            order
                .iter()
                .map(|&(index, direction)| {
                    let ordering = compare_values(&data.records[a][index], &data.records[b][index]);
                    match direction {
                        SortOrder::Ascending => ordering,
                        SortOrder::Descending => ordering.reverse(),
                    }
                })
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
    }

    Ok(matched)
}

/// Nulls first, numbers numerically, then strings, then booleans
fn compare_values(a: &FieldValue, b: &FieldValue) -> Ordering {
    fn rank(value: &FieldValue) -> u8 {
        match value {
            FieldValue::Null => 0,
            FieldValue::Integer(_) | FieldValue::Float(_) => 1,
            FieldValue::String(_) => 2,
            FieldValue::Boolean(_) => 3,
        }
    }

    match (a, b) {
        (FieldValue::Integer(x), FieldValue::Integer(y)) => x.cmp(y),
        (FieldValue::Integer(x), FieldValue::Float(y)) => (*x as f64).total_cmp(y),
        (FieldValue::Float(x), FieldValue::Integer(y)) => x.total_cmp(&(*y as f64)),
        (FieldValue::Float(x), FieldValue::Float(y)) => x.total_cmp(y),
        (FieldValue::String(x), FieldValue::String(y)) => x.cmp(y),
        (FieldValue::Boolean(x), FieldValue::Boolean(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[async_trait]
impl JoinAdapter for InMemoryStore {
    type Column = String;
    type Cursor = MemoryQuery;
    type Context = Session;

    fn select_all(&self, table: &str) -> MemoryQuery {
        MemoryQuery::new(table)
    }

    fn restrict_to_parent(
        &self,
        cursor: MemoryQuery,
        parent: &MemoryQuery,
        keys: &[(String, String)],
    ) -> Result<MemoryQuery> {
        let (parent_columns, columns) = keys.iter().cloned().unzip();

        Ok(cursor.filter(Filter::Correlated {
            columns,
            parent: Box::new(parent.read_only()),
            parent_columns,
        }))
    }

    async fn fetch_immediates(
        &self,
        table: &str,
        columns: &[String],
        cursor: &MemoryQuery,
        context: &Session,
    ) -> Result<Vec<Row>> {
        if !context.is_usable() {
            bail!("Session is no longer usable");
        }
        if cursor.table != table {
            bail!(
                "Cursor over '{}' cannot fetch from '{}'",
                cursor.table,
                table
            );
        }
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }

        self.fetch_log
            .lock()
            .map_err(|e| anyhow!("Failed to acquire fetch log: {}", e))?
            .push(table.to_string());

        let mut tables = self
            .tables
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let matched = matching(&tables, cursor)?;

        if !cursor.assignments.is_empty() {
            let data = tables
                .get_mut(table)
                .ok_or_else(|| anyhow!("Unknown table '{}'", table))?;
            for (column, value) in &cursor.assignments {
                let index = data.column_index(column)?;
                for &record in &matched {
                    data.records[record][index] = value.clone();
                }
            }
        }

        let data = tables
            .get(table)
            .ok_or_else(|| anyhow!("Unknown table '{}'", table))?;
        let indexes = data.column_indexes(columns)?;

        Ok(matched
            .iter()
            .map(|&record| {
                indexes
                    .iter()
                    .map(|&index| data.records[record][index].clone())
                    .collect()
            })
            .collect())
    }

    fn column_type(&self, table: &str, column: &String) -> Option<ColumnType> {
        self.with_table(table, |data| {
            data.def
                .columns
                .iter()
                .find(|def| &def.name == column)
                .map(|def| def.column_type)
        })
        .flatten()
    }

    fn primary_key_of(&self, table: &str) -> Vec<String> {
        self.with_table(table, |data| data.def.primary_key.clone())
            .unwrap_or_default()
    }

    fn foreign_keys_of(&self, table: &str) -> Vec<ForeignKey<String>> {
        self.with_table(table, |data| data.def.foreign_keys.clone())
            .unwrap_or_default()
    }

    fn context_usable(&self, context: &Session) -> bool {
        context.is_usable()
    }
}
