// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Envelope navigation and payload validation.
//!
//! The decoded event text is a log entry envelope of the form
//! `{"jsonPayload": {"message": <payload>}}`. The payload is either a JSON
//! object or a string holding JSON text, so it is modelled as
//! [`NestedPayload`] and resolved once before validation.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::anomaly;
use crate::error::IngestError;

/// Field of the envelope holding the structured log content.
pub const JSON_PAYLOAD_FIELD: &str = "jsonPayload";
/// Field of `jsonPayload` holding the log payload.
pub const NESTED_MESSAGE_FIELD: &str = "message";
/// Keys every payload must carry before it is stored.
pub const REQUIRED_KEYS: [&str; 3] = ["message", "level", "timestamp"];
/// Key added to every stored payload.
pub const IS_ANOMALY_FIELD: &str = "is_anomaly";

/// The parsed outer log entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEnvelope(Value);

impl LogEnvelope {
    pub fn parse(text: &str) -> Result<Self, IngestError> {
        Ok(LogEnvelope(serde_json::from_str(text)?))
    }

    /// Returns `jsonPayload.message`, or `None` if any level of that path is
    /// missing or not an object.
    pub fn nested_payload(&self) -> Option<NestedPayload> {
        self.0
            .as_object()?
            .get(JSON_PAYLOAD_FIELD)?
            .as_object()?
            .get(NESTED_MESSAGE_FIELD)
            .cloned()
            .map(NestedPayload::from)
    }
}

/// The candidate payload as found in the envelope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NestedPayload {
    Structured(Map<String, Value>),
    EncodedText(String),
    Unsupported(Value),
}

impl From<Value> for NestedPayload {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(fields) => NestedPayload::Structured(fields),
            Value::String(text) => NestedPayload::EncodedText(text),
            other => NestedPayload::Unsupported(other),
        }
    }
}

impl NestedPayload {
    /// Resolves the payload into a JSON object.
    ///
    /// Text is parsed as JSON; invalid text is an error. `Ok(None)` means the
    /// payload (possibly after parsing) is not an object.
    pub fn resolve(self) -> Result<Option<LogPayload>, IngestError> {
        match self {
            NestedPayload::Structured(fields) => Ok(Some(LogPayload(fields))),
            NestedPayload::EncodedText(text) => match serde_json::from_str(&text)? {
                Value::Object(fields) => Ok(Some(LogPayload(fields))),
                _ => Ok(None),
            },
            NestedPayload::Unsupported(_) => Ok(None),
        }
    }
}

/// A log payload carrying at least `message`, `level` and `timestamp` once
/// validated.
#[derive(Debug, Clone, PartialEq)]
pub struct LogPayload(Map<String, Value>);

impl LogPayload {
    pub fn new(fields: Map<String, Value>) -> Self {
        LogPayload(fields)
    }

    /// Required keys absent from the payload, in [`REQUIRED_KEYS`] order.
    pub fn missing_required_keys(&self) -> Vec<&'static str> {
        REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| !self.0.contains_key(*key))
            .collect()
    }

    /// Computes the anomaly flag from `message` and stores it under
    /// [`IS_ANOMALY_FIELD`], replacing any previous value.
    pub fn annotate(&mut self) -> Result<bool, IngestError> {
        let is_anomaly = match self.0.get("message") {
            Some(Value::String(message)) => anomaly::is_anomaly(message),
            Some(other) => return Err(IngestError::NonTextMessage(other.clone())),
            None => return Err(IngestError::NonTextMessage(Value::Null)),
        };
        self.0
            .insert(IS_ANOMALY_FIELD.to_string(), Value::Bool(is_anomaly));
        Ok(is_anomaly)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }
}
