use crate::app::ports::{Row, TableStorePort};
use crate::error::Result;
use anyhow::anyhow;
use async_trait::async_trait;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params, params_from_iter, Connection};
use serde_json::{Map, Number, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// SQLite-backed table store. Every write drops and recreates the table, so the stored
/// contents always mirror the latest run.
///
/// Statements run on the blocking thread pool, never on an async worker.
pub struct SqliteTableStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl SqliteTableStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)?;
        info!("Opened SQLite database at {}", db_path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(db_path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Arc::new(Mutex::new(Connection::open_in_memory()?)),
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn replace_table_blocking(
    conn: &Mutex<Connection>,
    table: &str,
    rows: &[Row],
) -> anyhow::Result<()> {
    let columns = collect_columns(rows);
    let mut conn = conn
        .lock()
        .map_err(|_| anyhow!("SQLite connection lock poisoned"))?;
    let tx = conn.transaction()?;

    tx.execute_batch(&format!("DROP TABLE IF EXISTS {};", quote_ident(table)))?;

    // SQLite has no zero-column tables; an empty row set leaves the table absent,
    // which readers treat as an empty dataset.
    if !columns.is_empty() {
        let column_list = columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        tx.execute_batch(&format!(
            "CREATE TABLE {} ({});",
            quote_ident(table),
            column_list
        ))?;

        let placeholders = (1..=columns.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let insert_sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table),
            column_list,
            placeholders
        );
        let mut stmt = tx.prepare(&insert_sql)?;
        for row in rows {
            let values = columns
                .iter()
                .map(|c| to_sql_value(row.get(c.as_str()).unwrap_or(&Value::Null)));
            stmt.execute(params_from_iter(values))?;
        }
    }

    tx.commit()?;
    debug!(
        "Replaced table '{}' with {} rows and {} columns",
        table,
        rows.len(),
        columns.len()
    );
    Ok(())
}

fn load_table_blocking(conn: &Mutex<Connection>, table: &str) -> anyhow::Result<Vec<Row>> {
    let conn = conn
        .lock()
        .map_err(|_| anyhow!("SQLite connection lock poisoned"))?;

    let exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![table],
        |row| row.get(0),
    )?;
    if exists == 0 {
        debug!("Table '{}' does not exist yet, treating as empty", table);
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare(&format!("SELECT * FROM {}", quote_ident(table)))?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut map = Map::new();
        for (i, name) in names.iter().enumerate() {
            map.insert(name.clone(), from_sql_value(row.get_ref(i)?));
        }
        out.push(map);
    }
    Ok(out)
}

#[async_trait]
impl TableStorePort for SqliteTableStore {
    async fn replace_table(&self, table: &str, rows: &[Row]) -> anyhow::Result<()> {
        let conn = Arc::clone(&self.conn);
        let table = table.to_string();
        let rows = rows.to_vec();
        tokio::task::spawn_blocking(move || replace_table_blocking(&conn, &table, &rows)).await?
    }

    async fn load_table(&self, table: &str) -> anyhow::Result<Vec<Row>> {
        let conn = Arc::clone(&self.conn);
        let table = table.to_string();
        tokio::task::spawn_blocking(move || load_table_blocking(&conn, &table)).await?
    }
}

/// Union of row keys in first-seen order
fn collect_columns(rows: &[Row]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map(SqlValue::Real).unwrap_or(SqlValue::Null),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        nested @ (Value::Array(_) | Value::Object(_)) => SqlValue::Text(nested.to_string()),
    }
}

fn from_sql_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_missing_table_loads_empty() {
        let store = SqliteTableStore::open_in_memory().unwrap();
        assert!(store.load_table("breweries").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_round_trip_preserves_scalar_types() {
        let store = SqliteTableStore::open_in_memory().unwrap();
        let rows = vec![
            row(json!({ "id": "a", "latitude": 45.5, "count": 3, "flag": true, "tags": ["x"] })),
            row(json!({ "id": "b", "latitude": null, "extra": "only here" })),
        ];
        store.replace_table("t", &rows).await.unwrap();

        let loaded = store.load_table("t").await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0]["id"], json!("a"));
        assert_eq!(loaded[0]["latitude"], json!(45.5));
        assert_eq!(loaded[0]["count"], json!(3));
        assert_eq!(loaded[0]["flag"], json!(1));
        assert_eq!(loaded[0]["tags"], json!("[\"x\"]"));
        assert_eq!(loaded[0]["extra"], Value::Null);
        assert_eq!(loaded[1]["extra"], json!("only here"));
        assert_eq!(loaded[1]["count"], Value::Null);

        let columns: Vec<&String> = loaded[0].keys().collect();
        assert_eq!(columns.len(), 6);
    }

    #[tokio::test]
    async fn test_replace_drops_previous_contents_and_columns() {
        let store = SqliteTableStore::open_in_memory().unwrap();
        store
            .replace_table("t", &[row(json!({ "id": 1, "old": "x" })), row(json!({ "id": 2 }))])
            .await
            .unwrap();
        store
            .replace_table("t", &[row(json!({ "id": 3, "new": "y" }))])
            .await
            .unwrap();

        let loaded = store.load_table("t").await.unwrap();
        assert_eq!(loaded, vec![row(json!({ "id": 3, "new": "y" }))]);
    }

    #[tokio::test]
    async fn test_empty_rows_leave_no_table() {
        let store = SqliteTableStore::open_in_memory().unwrap();
        store.replace_table("t", &[row(json!({ "id": 1 }))]).await.unwrap();
        store.replace_table("t", &[]).await.unwrap();
        assert!(store.load_table("t").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_awkward_identifiers_are_quoted() {
        let store = SqliteTableStore::open_in_memory().unwrap();
        store
            .replace_table("odd \"table\"", &[row(json!({ "select": 1, "a\"b": "c" }))])
            .await
            .unwrap();
        let loaded = store.load_table("odd \"table\"").await.unwrap();
        assert_eq!(loaded[0]["a\"b"], json!("c"));
    }

    #[tokio::test]
    async fn test_file_database_persists_across_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("brewery.db");
        {
            let store = SqliteTableStore::open(&path).unwrap();
            store.replace_table("breweries", &[row(json!({ "id": "a" }))]).await.unwrap();
            assert_eq!(store.path(), Some(path.as_path()));
        }
        let reopened = SqliteTableStore::open(&path).unwrap();
        assert_eq!(reopened.load_table("breweries").await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_calls_on_multi_thread_runtime() {
        let store = SqliteTableStore::open_in_memory().unwrap();
        store.replace_table("a", &[row(json!({ "id": 1 }))]).await.unwrap();

        let rows_b = [row(json!({ "id": 2 })), row(json!({ "id": 3 }))];
        let (written, loaded) = tokio::join!(
            store.replace_table("b", &rows_b),
            store.load_table("a"),
        );
        written.unwrap();
        assert_eq!(loaded.unwrap().len(), 1);
        assert_eq!(store.load_table("b").await.unwrap().len(), 2);
    }
}
