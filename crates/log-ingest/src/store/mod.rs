// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Append-only document persistence.

pub mod firestore;
pub mod memory;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::StoreError;

/// Collection processed logs are written to unless configured otherwise.
pub const DEFAULT_COLLECTION: &str = "processed-logs";

#[async_trait]
pub trait DocumentStore {
    /// Appends `document` to `collection` as a new document and returns the
    /// identifier the store assigned. Every call creates a new document.
    async fn add(
        &self,
        collection: &str,
        document: &Map<String, Value>,
    ) -> Result<String, StoreError>;
}
