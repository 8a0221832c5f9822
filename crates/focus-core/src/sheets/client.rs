//! HTTP client for the deployed Apps Script web app.

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::{SheetsError, SheetsResult};
use super::wire::{
    ApiResponse, BatchOperation, BatchOutcome, BatchRequest, ConnectionCheck, DeleteAck, ItemRow,
    PromptRow, WriteAck,
};
use super::RemoteStore;
use crate::models::SheetsCredentials;
use crate::services::DatabaseService;
use crate::util::compact_text;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the spreadsheet web app
///
/// Credentials are read from the settings table on every call, so a changed
/// endpoint or secret applies to the next request.
#[derive(Clone)]
pub struct SheetsClient {
    http: reqwest::Client,
    store: DatabaseService,
}

impl SheetsClient {
    pub fn new(store: DatabaseService) -> SheetsResult<Self> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            store,
        })
    }

    async fn credentials(&self) -> SheetsResult<SheetsCredentials> {
        let settings = self
            .store
            .load_settings()
            .await
            .map_err(|error| SheetsError::Settings(error.to_string()))?;
        settings
            .sheets_credentials()
            .ok_or(SheetsError::NotConfigured)
    }

    /// Send one request and unwrap the `{success, data, error}` envelope.
    ///
    /// The secret always travels in the query string.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        params: &[(&str, String)],
        body: Option<Value>,
    ) -> SheetsResult<T> {
        let credentials = self.credentials().await?;

        let mut query = Vec::with_capacity(params.len() + 1);
        query.push(("secret", credentials.secret.as_str()));
        query.extend(params.iter().map(|(key, value)| (*key, value.as_str())));

        let mut request = self
            .http
            .request(method.clone(), &credentials.url)
            .query(&query)
            .header("Accept", "application/json");
        if let Some(body) = body {
            request = request.json(&body);
        }

        tracing::debug!(
            "Sheets {method} {}",
            params
                .iter()
                .find(|(key, _)| *key == "action")
                .map_or("(post)", |(_, action)| action.as_str())
        );

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        parse_envelope(status, &text)
    }

    async fn get<T: DeserializeOwned>(&self, params: &[(&str, String)]) -> SheetsResult<T> {
        self.request(Method::GET, params, None).await
    }

    async fn post<T: DeserializeOwned>(&self, body: Value) -> SheetsResult<T> {
        self.request(Method::POST, &[], Some(body)).await
    }
}

fn parse_envelope<T: DeserializeOwned>(status: StatusCode, text: &str) -> SheetsResult<T> {
    let envelope = match serde_json::from_str::<ApiResponse<T>>(text) {
        Ok(envelope) => envelope,
        Err(error) if status.is_success() => {
            return Err(SheetsError::InvalidPayload(format!(
                "{error}: {}",
                compact_text(text)
            )));
        }
        Err(_) => {
            let body = compact_text(text);
            return Err(SheetsError::Api {
                status: status.as_u16(),
                message: if body.is_empty() {
                    format!("HTTP {}", status.as_u16())
                } else {
                    body
                },
            });
        }
    };

    if !envelope.success || !status.is_success() {
        return Err(SheetsError::Api {
            status: status.as_u16(),
            message: envelope
                .error
                .or(envelope.message)
                .unwrap_or_else(|| "Unknown error".to_string()),
        });
    }

    envelope
        .data
        .ok_or_else(|| SheetsError::InvalidPayload("response did not include data".to_string()))
}

fn action(name: &str) -> (&'static str, String) {
    ("action", name.to_string())
}

impl RemoteStore for SheetsClient {
    async fn get_all_items(&self) -> SheetsResult<Vec<ItemRow>> {
        self.get(&[action("getItems")]).await
    }

    async fn get_modified_items_since(&self, since_ms: i64) -> SheetsResult<Vec<ItemRow>> {
        self.get(&[action("getItems"), ("since", since_ms.to_string())])
            .await
    }

    async fn create_item(&self, row: ItemRow) -> SheetsResult<WriteAck> {
        self.post(serde_json::to_value(BatchOperation::CreateItem { data: row })?)
            .await
    }

    async fn update_item(&self, row: ItemRow) -> SheetsResult<WriteAck> {
        self.post(serde_json::to_value(BatchOperation::UpdateItem { data: row })?)
            .await
    }

    async fn delete_item(&self, id: &str) -> SheetsResult<DeleteAck> {
        self.post(serde_json::to_value(BatchOperation::DeleteItem {
            id: id.to_string(),
        })?)
        .await
    }

    async fn get_all_prompts(&self) -> SheetsResult<Vec<PromptRow>> {
        self.get(&[action("getPrompts")]).await
    }

    async fn get_modified_prompts_since(&self, since_ms: i64) -> SheetsResult<Vec<PromptRow>> {
        self.get(&[action("getPrompts"), ("since", since_ms.to_string())])
            .await
    }

    async fn create_prompt(&self, row: PromptRow) -> SheetsResult<WriteAck> {
        self.post(serde_json::to_value(BatchOperation::CreatePrompt {
            data: row,
        })?)
        .await
    }

    async fn update_prompt(&self, row: PromptRow) -> SheetsResult<WriteAck> {
        self.post(serde_json::to_value(BatchOperation::UpdatePrompt {
            data: row,
        })?)
        .await
    }

    async fn delete_prompt(&self, id: &str) -> SheetsResult<DeleteAck> {
        self.post(serde_json::to_value(BatchOperation::DeletePrompt {
            id: id.to_string(),
        })?)
        .await
    }

    async fn batch(&self, operations: Vec<BatchOperation>) -> SheetsResult<Vec<BatchOutcome>> {
        self.post(serde_json::to_value(BatchRequest {
            action: "batch",
            operations: &operations,
        })?)
        .await
    }

    async fn test_connection(&self) -> bool {
        match self.get::<ConnectionCheck>(&[action("test")]).await {
            Ok(check) => {
                tracing::debug!(
                    "Sheets connection ok={} version={}",
                    check.ok,
                    check.version.as_deref().unwrap_or("unknown")
                );
                check.ok
            }
            Err(error) => {
                tracing::warn!("Sheets connection test failed: {error}");
                false
            }
        }
    }
}
