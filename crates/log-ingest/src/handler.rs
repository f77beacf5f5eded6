// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The log event callback.
//!
//! ```text
//!   RawEvent ──base64/utf-8──> text ──json──> LogEnvelope
//!                                                 │ jsonPayload.message
//!                                                 v
//!   DocumentStore <──annotate── LogPayload <──resolve── NestedPayload
//! ```
//!
//! Every step can end the invocation early. A missing nested payload or a
//! missing required key is a skip: nothing is written and the invocation
//! still succeeds. Decode, parse and store failures are terminal as well and
//! are never retried here. The single store write is always the last step.

use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::{FailureKind, IngestError};
use crate::event::{EventContext, RawEvent};
use crate::payload::LogEnvelope;
use crate::store::DocumentStore;

/// Why an invocation ended without writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// `jsonPayload.message` is absent from the envelope.
    MissingNestedPayload,
    /// The nested payload did not resolve to a JSON object.
    PayloadNotAnObject,
    /// The payload lacks some of `message`, `level`, `timestamp`.
    MissingRequiredKeys(Vec<&'static str>),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingNestedPayload => write!(f, "no nested JSON payload"),
            SkipReason::PayloadNotAnObject => write!(f, "nested payload is not a JSON object"),
            SkipReason::MissingRequiredKeys(keys) => {
                write!(f, "payload is missing {}", keys.join(", "))
            }
        }
    }
}

/// Result of a successful invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Stored { id: String, is_anomaly: bool },
    Skipped(SkipReason),
}

#[derive(Clone)]
pub struct LogEventHandler {
    store: Arc<dyn DocumentStore + Send + Sync>,
    collection: String,
}

impl LogEventHandler {
    pub fn new(store: Arc<dyn DocumentStore + Send + Sync>, collection: impl Into<String>) -> Self {
        LogEventHandler {
            store,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Runs one invocation and logs how it ended.
    ///
    /// Failures are logged according to their [`FailureKind`] and returned for
    /// the caller to report; they are never retried.
    pub async fn process(
        &self,
        event: &RawEvent,
        context: &EventContext,
    ) -> Result<Outcome, IngestError> {
        debug!(
            "Processing event {}",
            context.event_id.as_deref().unwrap_or("<unknown>")
        );
        let result = self.handle(event).await;
        if let Err(e) = &result {
            match e.kind() {
                FailureKind::Decode => error!("Error decoding event data: {e}"),
                FailureKind::Parse => error!("Error decoding JSON: {e}"),
                FailureKind::Unexpected => error!("An unexpected error occurred: {e}"),
            }
        }
        result
    }

    /// Decodes, validates, annotates and stores one event.
    pub async fn handle(&self, event: &RawEvent) -> Result<Outcome, IngestError> {
        let text = event.decode_text()?;
        debug!("Received raw message: {text}");

        let envelope = LogEnvelope::parse(&text)?;
        let Some(nested) = envelope.nested_payload() else {
            warn!("Skipping log entry without a valid nested JSON payload. Entry: {text}");
            return Ok(Outcome::Skipped(SkipReason::MissingNestedPayload));
        };

        let Some(mut payload) = nested.resolve()? else {
            warn!("Skipping log entry whose nested payload is not a JSON object. Entry: {text}");
            return Ok(Outcome::Skipped(SkipReason::PayloadNotAnObject));
        };

        let missing = payload.missing_required_keys();
        if !missing.is_empty() {
            warn!(
                "Skipping malformed payload missing {}: {}",
                missing.join(", "),
                serde_json::Value::Object(payload.into_fields())
            );
            return Ok(Outcome::Skipped(SkipReason::MissingRequiredKeys(missing)));
        }

        let is_anomaly = payload.annotate()?;
        let id = self.store.add(&self.collection, payload.fields()).await?;
        info!("Successfully processed and stored log with ID: {id}");

        Ok(Outcome::Stored { id, is_anomaly })
    }
}
