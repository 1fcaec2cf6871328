//! HTTP client for the spreadsheet CRUD endpoint.
//!
//! Every request is addressed as `{base}?tabId={tab}`; row-level writes add
//! `&rowIndex={n}`. Write bodies are always an array of 7-cell rows.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::models::SheetRow;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Wrapper field most store responses put the row array under.
const DATA_FIELD: &str = "data";

/// Operations the lookup and admin layers need from the remote store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch every row of the tab, in store order. Rows are returned raw.
    async fn fetch_rows(&self) -> Result<Vec<Value>, ApiError>;

    /// Append rows at the end of the tab.
    async fn append_rows(&self, rows: &[SheetRow]) -> Result<(), ApiError>;

    /// Overwrite the row at `row_index` (1-based).
    async fn update_row(&self, row_index: usize, row: &SheetRow) -> Result<(), ApiError>;

    /// Remove the row at `row_index` (1-based).
    async fn delete_row(&self, row_index: usize) -> Result<(), ApiError>;
}

/// Pull the row array out of a store response body.
///
/// Accepts a bare array, `{ "data": [...] }`, or any object holding an
/// array-valued field (the first such field wins). Anything else yields no rows.
pub fn extract_rows(body: Value) -> Vec<Value> {
    match body {
        Value::Array(rows) => rows,
        Value::Object(mut map) => {
            if let Some(Value::Array(rows)) = map.remove(DATA_FIELD) {
                return rows;
            }
            for (key, value) in map {
                if let Value::Array(rows) = value {
                    debug!(field = %key, "Using first array-valued field as row set");
                    return rows;
                }
            }
            warn!("Store response object has no array-valued field");
            Vec::new()
        }
        other => {
            warn!(kind = value_kind(&other), "Unexpected store response shape");
            Vec::new()
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// HTTP implementation of `RemoteStore`.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct SheetClient {
    client: Client,
    base_url: String,
    tab: String,
}

impl SheetClient {
    pub fn new(base_url: impl Into<String>, tab: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            tab: tab.into(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ApiError> {
        Self::new(settings.base_url.clone(), settings.tab.clone())
    }

    fn tab_query(&self) -> [(&'static str, String); 1] {
        [("tabId", self.tab.clone())]
    }

    fn row_query(&self, row_index: usize) -> [(&'static str, String); 2] {
        [("tabId", self.tab.clone()), ("rowIndex", row_index.to_string())]
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }
}

#[async_trait]
impl RemoteStore for SheetClient {
    async fn fetch_rows(&self) -> Result<Vec<Value>, ApiError> {
        debug!(url = %self.base_url, tab = %self.tab, "Fetching shipment rows");

        let response = self
            .client
            .get(&self.base_url)
            .query(&self.tab_query())
            .send()
            .await?;

        let response = Self::check_response(response).await?;

        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Body is not JSON: {}", e)))?;

        let rows = extract_rows(body);
        debug!(rows = rows.len(), "Fetched shipment rows");
        Ok(rows)
    }

    async fn append_rows(&self, rows: &[SheetRow]) -> Result<(), ApiError> {
        debug!(rows = rows.len(), "Appending rows");

        let response = self
            .client
            .post(&self.base_url)
            .query(&self.tab_query())
            .json(rows)
            .send()
            .await?;

        Self::check_response(response).await?;
        Ok(())
    }

    async fn update_row(&self, row_index: usize, row: &SheetRow) -> Result<(), ApiError> {
        debug!(row_index, "Patching row");

        let response = self
            .client
            .patch(&self.base_url)
            .query(&self.row_query(row_index))
            .json(&[row])
            .send()
            .await?;

        Self::check_response(response).await?;
        Ok(())
    }

    async fn delete_row(&self, row_index: usize) -> Result<(), ApiError> {
        debug!(row_index, "Deleting row");

        let response = self
            .client
            .delete(&self.base_url)
            .query(&self.row_query(row_index))
            .send()
            .await?;

        Self::check_response(response).await?;
        Ok(())
    }
}
