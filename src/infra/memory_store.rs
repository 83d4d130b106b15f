use crate::app::ports::{Row, TableStorePort};
use anyhow::anyhow;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// In-memory table store for dry runs and tests. Clones share the same tables.
#[derive(Clone, Default)]
pub struct InMemoryTableStore {
    tables: Arc<Mutex<HashMap<String, Vec<Row>>>>,
}

impl InMemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table_names(&self) -> anyhow::Result<Vec<String>> {
        let tables = self
            .tables
            .lock()
            .map_err(|_| anyhow!("table store lock poisoned"))?;
        let mut names: Vec<String> = tables.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

#[async_trait]
impl TableStorePort for InMemoryTableStore {
    async fn replace_table(&self, table: &str, rows: &[Row]) -> anyhow::Result<()> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| anyhow!("table store lock poisoned"))?;
        tables.insert(table.to_string(), rows.to_vec());
        debug!("Replaced in-memory table '{}' with {} rows", table, rows.len());
        Ok(())
    }

    async fn load_table(&self, table: &str) -> anyhow::Result<Vec<Row>> {
        let tables = self
            .tables
            .lock()
            .map_err(|_| anyhow!("table store lock poisoned"))?;
        Ok(tables.get(table).cloned().unwrap_or_default())
    }
}
