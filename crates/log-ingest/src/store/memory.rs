// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Mutex;

use crate::error::StoreError;
use crate::store::DocumentStore;

#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub collection: String,
    pub id: String,
    pub fields: Map<String, Value>,
}

/// Keeps written documents in memory. Ids are random v4 UUIDs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<Vec<StoredDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every document written so far, in write order.
    pub fn documents(&self) -> Vec<StoredDocument> {
        match self.documents.lock() {
            Ok(documents) => documents.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn add(
        &self,
        collection: &str,
        document: &Map<String, Value>,
    ) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let stored = StoredDocument {
            collection: collection.to_string(),
            id: id.clone(),
            fields: document.clone(),
        };
        match self.documents.lock() {
            Ok(mut documents) => documents.push(stored),
            Err(poisoned) => poisoned.into_inner().push(stored),
        }
        Ok(id)
    }
}
