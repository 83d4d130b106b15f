use anyhow::Context;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::app::ports::HttpClientPort;
use crate::config::ApiConfig;
use crate::domain::RawRecord;
use crate::error::PipelineError;
use crate::metrics::IngestMetrics;

/// How the upstream API is paged
#[derive(Debug, Clone)]
pub struct PaginationSettings {
    pub base_url: String,
    pub per_page: u32,
    pub max_pages: Option<u32>,
}

impl From<&ApiConfig> for PaginationSettings {
    fn from(api: &ApiConfig) -> Self {
        Self {
            base_url: api.base_url.clone(),
            per_page: api.per_page,
            max_pages: api.max_pages,
        }
    }
}

impl PaginationSettings {
    /// URL for a 1-based page number, preserving any query already on the base URL
    pub fn page_url(&self, page: u32) -> anyhow::Result<String> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .with_context(|| format!("invalid API base URL '{}'", self.base_url))?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &self.per_page.to_string());
        Ok(url.to_string())
    }
}

/// Fetches the whole dataset by walking pages until the API returns an empty one
pub struct IngestUseCase<H: HttpClientPort + ?Sized> {
    http: Box<H>,
    settings: PaginationSettings,
}

impl<H: HttpClientPort + ?Sized> IngestUseCase<H> {
    pub fn new(http: Box<H>, settings: PaginationSettings) -> Self {
        Self { http, settings }
    }

    #[instrument(skip(self), fields(base_url = %self.settings.base_url))]
    pub async fn fetch_all(&self) -> anyhow::Result<Vec<RawRecord>> {
        let started = Instant::now();
        let mut all_records = Vec::new();
        let mut page = 1;

        loop {
            if let Some(max_pages) = self.settings.max_pages {
                if page > max_pages {
                    warn!("Stopping after {} pages (max_pages reached)", max_pages);
                    break;
                }
            }

            let records = self.fetch_page(page).await?;
            if records.is_empty() {
                debug!("Page {} is empty, pagination finished", page);
                break;
            }
            debug!("Page {} returned {} records", page, records.len());
            IngestMetrics::record_page(records.len());
            all_records.extend(records);
            page += 1;
        }

        IngestMetrics::record_fetch_complete(all_records.len(), started.elapsed().as_secs_f64());
        info!(
            "Finished fetching data. Total breweries found: {}",
            all_records.len()
        );
        Ok(all_records)
    }

    async fn fetch_page(&self, page: u32) -> anyhow::Result<Vec<RawRecord>> {
        let url = self.settings.page_url(page)?;
        let resp = self.http.get(&url).await?;

        if !resp.is_success() {
            IngestMetrics::record_fetch_error(resp.status);
            let body = String::from_utf8_lossy(&resp.bytes);
            let snippet: String = body.chars().take(200).collect();
            return Err(PipelineError::Api {
                status: resp.status,
                message: format!("GET {} failed: {}", url, snippet),
            }
            .into());
        }

        let data: Value = serde_json::from_slice(&resp.bytes).map_err(PipelineError::from)?;
        match data {
            Value::Array(records) => Ok(records),
            other => Err(PipelineError::Api {
                status: resp.status,
                message: format!(
                    "expected a JSON array from {}, got {} ({})",
                    url,
                    json_kind(&other),
                    resp.content_type
                ),
            }
            .into()),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::HttpGetResult;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Serves the given pages in order, then empty arrays
    struct MockHttp {
        pages: Vec<Value>,
        status: u16,
        requested: Arc<Mutex<Vec<String>>>,
    }

    impl MockHttp {
        fn new(pages: Vec<Value>) -> Self {
            Self {
                pages,
                status: 200,
                requested: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl HttpClientPort for MockHttp {
        async fn get(&self, url: &str) -> anyhow::Result<HttpGetResult> {
            let mut requested = self.requested.lock().await;
            let index = requested.len();
            requested.push(url.to_string());
            let body = self.pages.get(index).cloned().unwrap_or_else(|| json!([]));
            Ok(HttpGetResult {
                status: self.status,
                bytes: serde_json::to_vec(&body)?,
                content_type: "application/json".to_string(),
            })
        }
    }

    fn settings(per_page: u32, max_pages: Option<u32>) -> PaginationSettings {
        PaginationSettings {
            base_url: "https://api.example.com/v1/breweries".to_string(),
            per_page,
            max_pages,
        }
    }

    #[test]
    fn test_page_url() {
        let url = settings(200, None).page_url(3).unwrap();
        assert_eq!(url, "https://api.example.com/v1/breweries?page=3&per_page=200");

        let with_query = PaginationSettings {
            base_url: "https://api.example.com/v1/breweries?by_state=ohio".to_string(),
            per_page: 50,
            max_pages: None,
        };
        assert_eq!(
            with_query.page_url(1).unwrap(),
            "https://api.example.com/v1/breweries?by_state=ohio&page=1&per_page=50"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let bad = PaginationSettings {
            base_url: "not a url".to_string(),
            per_page: 1,
            max_pages: None,
        };
        assert!(bad.page_url(1).is_err());
    }

    #[tokio::test]
    async fn test_fetch_all_stops_on_empty_page() {
        let http = MockHttp::new(vec![
            json!([{ "id": "a" }, { "id": "b" }]),
            json!([{ "id": "c" }]),
            json!([]),
            json!([{ "id": "never" }]),
        ]);
        let requested = http.requested.clone();
        let use_case = IngestUseCase::new(Box::new(http), settings(2, None));

        let records = use_case.fetch_all().await.unwrap();
        let ids: Vec<&str> = records.iter().filter_map(|r| r["id"].as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let requested = requested.lock().await;
        assert_eq!(requested.len(), 3);
        assert!(requested[0].ends_with("page=1&per_page=2"));
        assert!(requested[2].ends_with("page=3&per_page=2"));
    }

    #[tokio::test]
    async fn test_fetch_all_empty_dataset() {
        let use_case = IngestUseCase::new(Box::new(MockHttp::new(vec![])), settings(200, None));
        assert!(use_case.fetch_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_max_pages_caps_the_walk() {
        let http = MockHttp::new(vec![json!([{ "id": 1 }]), json!([{ "id": 2 }]), json!([{ "id": 3 }])]);
        let use_case = IngestUseCase::new(Box::new(http), settings(1, Some(2)));
        assert_eq!(use_case.fetch_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_http_error_status_is_fatal() {
        let mut http = MockHttp::new(vec![json!({ "message": "rate limited" })]);
        http.status = 429;
        let use_case = IngestUseCase::new(Box::new(http), settings(200, None));

        let err = use_case.fetch_all().await.unwrap_err();
        match err.downcast_ref::<PipelineError>() {
            Some(PipelineError::Api { status, .. }) => assert_eq!(*status, 429),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_array_body_is_fatal() {
        let http = MockHttp::new(vec![json!({ "data": [] })]);
        let use_case = IngestUseCase::new(Box::new(http), settings(200, None));
        let err = use_case.fetch_all().await.unwrap_err();
        assert!(err.to_string().contains("expected a JSON array"));
    }
}
