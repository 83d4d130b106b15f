use async_trait::async_trait;
use serde_json::{Map, Value};

/// One row of a persisted table, keyed by column name
pub type Row = Map<String, Value>;

// Ingest-side ports
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    async fn get(&self, url: &str) -> anyhow::Result<HttpGetResult>;
}

#[derive(Clone, Debug)]
pub struct HttpGetResult {
    pub status: u16,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl HttpGetResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Storage for named tables. Writing a table replaces whatever was stored under that
/// name; reading a table that was never written yields no rows.
#[async_trait]
pub trait TableStorePort: Send + Sync {
    async fn replace_table(&self, table: &str, rows: &[Row]) -> anyhow::Result<()>;
    async fn load_table(&self, table: &str) -> anyhow::Result<Vec<Row>>;
}
