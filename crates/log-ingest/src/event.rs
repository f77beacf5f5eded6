// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Trigger request shapes and their normalized form.

use base64::Engine;
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::IngestError;

/// One delivered message. `data` holds the base64 encoded log entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl RawEvent {
    pub fn from_data(data: impl Into<String>) -> Self {
        RawEvent {
            data: Some(data.into()),
            attributes: HashMap::new(),
        }
    }

    /// Decodes `data` from standard base64 and then from UTF-8.
    pub fn decode_text(&self) -> Result<String, IngestError> {
        let data = self.data.as_deref().ok_or(IngestError::MissingData)?;
        let bytes = base64::engine::general_purpose::STANDARD.decode(data)?;
        Ok(String::from_utf8(bytes)?)
    }
}

/// Invocation metadata. Only used to correlate diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventContext {
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub resource: Option<String>,
}

/// A normalized trigger request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub event: RawEvent,
    pub context: EventContext,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PushMessage {
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    attributes: HashMap<String, String>,
    #[serde(default, alias = "message_id")]
    message_id: Option<String>,
    #[serde(default, alias = "publish_time")]
    publish_time: Option<String>,
}

/// Body of an HTTP trigger request.
///
/// Variants are tried in order; `Direct` accepts any object so it must stay last.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TriggerRequest {
    /// Pub/Sub push subscription delivery.
    Push {
        message: PushMessage,
        #[serde(default)]
        subscription: Option<String>,
    },
    /// Legacy background function delivery: `{"context": {...}, "data": {...}}`.
    Background { context: EventContext, data: RawEvent },
    /// The event object itself.
    Direct(RawEvent),
}

impl From<TriggerRequest> for Invocation {
    fn from(request: TriggerRequest) -> Self {
        match request {
            TriggerRequest::Push {
                message,
                subscription,
            } => Invocation {
                event: RawEvent {
                    data: message.data,
                    attributes: message.attributes,
                },
                context: EventContext {
                    event_id: message.message_id,
                    timestamp: message.publish_time,
                    event_type: Some("google.pubsub.topic.publish".to_string()),
                    resource: subscription,
                },
            },
            TriggerRequest::Background { context, data } => Invocation {
                event: data,
                context,
            },
            TriggerRequest::Direct(event) => Invocation {
                event,
                context: EventContext::default(),
            },
        }
    }
}

/// Parses an HTTP trigger request body into an [`Invocation`].
pub fn parse_trigger_request(body: &[u8]) -> Result<Invocation, serde_json::Error> {
    let request: TriggerRequest = serde_json::from_slice(body)?;
    Ok(request.into())
}
