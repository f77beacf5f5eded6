// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Firestore REST backed [`DocumentStore`].
//!
//! Documents are created with `createDocument` without a document id, so
//! Firestore assigns one. Field values are sent in Firestore's typed value
//! encoding, see [`to_firestore_value`].

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::error::StoreError;
use crate::store::DocumentStore;
use crate::token::TokenSource;

pub const DEFAULT_ENDPOINT: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_DATABASE: &str = "(default)";

#[derive(Deserialize)]
struct CreatedDocument {
    name: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Debug, Clone)]
pub struct FirestoreStore {
    client: reqwest::Client,
    endpoint: String,
    project_id: String,
    database_id: String,
    token_source: TokenSource,
}

impl FirestoreStore {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        project_id: impl Into<String>,
        database_id: impl Into<String>,
        token_source: TokenSource,
    ) -> Self {
        FirestoreStore {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            database_id: database_id.into(),
            token_source,
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/projects/{}/databases/{}/documents/{}",
            self.endpoint, self.project_id, self.database_id, collection
        )
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn add(
        &self,
        collection: &str,
        document: &Map<String, Value>,
    ) -> Result<String, StoreError> {
        let url = self.collection_url(collection);
        let body = json!({ "fields": to_firestore_fields(document) });

        let mut request = self.client.post(&url).json(&body);
        if let Some(token) = self.token_source.token(&self.client).await? {
            request = request.bearer_auth(token);
        }

        debug!("Creating document in {url}");
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.error.message)
                .unwrap_or(text);
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let created: CreatedDocument = response
            .json()
            .await
            .map_err(|e| StoreError::MalformedResponse(e.to_string()))?;
        document_id(&created.name)
            .map(str::to_string)
            .ok_or_else(|| StoreError::MalformedResponse(format!("invalid name {}", created.name)))
    }
}

/// Last path segment of a Firestore document resource name.
pub fn document_id(name: &str) -> Option<&str> {
    name.rsplit('/').next().filter(|id| !id.is_empty())
}

pub fn to_firestore_fields(document: &Map<String, Value>) -> Map<String, Value> {
    document
        .iter()
        .map(|(key, value)| (key.clone(), to_firestore_value(value)))
        .collect()
}

/// Encodes a JSON value as a Firestore `Value`.
///
/// Integers that fit in an `i64` become `integerValue` (sent as a decimal
/// string), every other number becomes `doubleValue`.
pub fn to_firestore_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(values) => {
            if values.is_empty() {
                json!({ "arrayValue": {} })
            } else {
                let values: Vec<Value> = values.iter().map(to_firestore_value).collect();
                json!({ "arrayValue": { "values": values } })
            }
        }
        Value::Object(fields) => json!({ "mapValue": { "fields": to_firestore_fields(fields) } }),
    }
}
