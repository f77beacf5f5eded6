// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Helpers for building trigger events and starting the server

use base64::Engine;
use log_ingest::{
    config::IngestConfig, event::RawEvent, handler::LogEventHandler, server::IngestServer,
    store::DocumentStore,
};
use serde_json::{json, Map, Value};
use std::net::SocketAddr;
use std::sync::Arc;

pub const ACCESS_DENIED_ENVELOPE: &str = r#"{"jsonPayload":{"message":"{\"message\":\"Access denied\",\"level\":\"ERROR\",\"timestamp\":\"2024-01-01T00:00:00Z\"}"}}"#;

pub fn encode(text: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(text)
}

pub fn raw_event(envelope: &str) -> RawEvent {
    RawEvent::from_data(encode(envelope))
}

/// Wraps `payload` as JSON text inside `jsonPayload.message`, the way the
/// log router delivers entries written as stringified JSON.
pub fn double_encoded_envelope(payload: &Value) -> String {
    json!({ "jsonPayload": { "message": payload.to_string() } }).to_string()
}

pub fn as_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(fields) => fields,
        other => panic!("expected a JSON object, got {other}"),
    }
}

pub fn push_request_body(envelope: &str, message_id: &str) -> String {
    json!({
        "message": {
            "data": encode(envelope),
            "messageId": message_id,
            "publishTime": "2024-01-01T00:00:01Z"
        },
        "subscription": "projects/demo/subscriptions/processed-logs-push"
    })
    .to_string()
}

/// Starts the server on an ephemeral port and returns its address.
pub async fn start_server(store: Arc<dyn DocumentStore + Send + Sync>) -> SocketAddr {
    let config = Arc::new(IngestConfig {
        project_id: "demo".to_string(),
        ..Default::default()
    });
    let handler = Arc::new(LogEventHandler::new(store, config.collection.clone()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().expect("no local address");

    let server = IngestServer { config, handler };
    tokio::spawn(async move {
        if let Err(e) = server.serve(listener).await {
            panic!("test server stopped: {e}");
        }
    });
    addr
}
