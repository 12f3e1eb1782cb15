use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, error};

use crate::config::{StoreConfig, CREDENTIAL_HEADER};
use crate::error::{Result, StoreError};
use crate::gateway::CodeStore;
use crate::record::CodeRecord;

/// Envelope returned by the `/latest` read. A missing or null `record` is an
/// empty collection.
#[derive(Deserialize)]
struct LatestDocument {
    #[serde(default)]
    record: Option<Vec<CodeRecord>>,
}

pub struct HttpStore {
    client: Client,
    config: StoreConfig,
}

impl HttpStore {
    pub fn new(config: StoreConfig) -> Result<Self> {
        if config.endpoint.is_empty() {
            return Err(StoreError::Config("Store endpoint is empty".into()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Config(format!("Failed to build client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn ensure_success(response: Response, op: &str) -> Result<Response> {
        let status = response.status();
        if !status.is_success() {
            error!("Store {} returned {}", op, status);
            return Err(StoreError::Unavailable(format!(
                "{} returned status {}",
                op, status
            )));
        }
        Ok(response)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}

#[async_trait]
impl CodeStore for HttpStore {
    async fn fetch_all(&self) -> Result<Vec<CodeRecord>> {
        let url = self.config.latest_url();
        let response = self
            .client
            .get(&url)
            .header(CREDENTIAL_HEADER, &self.config.credential)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(format!("GET request failed: {}", e)))?;
        let response = Self::ensure_success(response, "read")?;

        let body = response
            .bytes()
            .await
            .map_err(|e| StoreError::Unavailable(format!("Failed to read body: {}", e)))?;
        let document: LatestDocument = serde_json::from_slice(&body)
            .map_err(|e| StoreError::Corrupt(format!("Invalid record collection: {}", e)))?;

        let records = document.record.unwrap_or_default();
        debug!("Fetched {} code records", records.len());
        Ok(records)
    }

    async fn replace_all(&self, records: &[CodeRecord]) -> Result<()> {
        let url = self.config.document_url();
        let response = self
            .client
            .put(&url)
            .header(CREDENTIAL_HEADER, &self.config.credential)
            .json(records)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(format!("PUT request failed: {}", e)))?;
        Self::ensure_success(response, "write")?;

        debug!("Replaced collection with {} code records", records.len());
        Ok(())
    }
}
