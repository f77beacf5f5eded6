// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Errors raised while starting the ingestion service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("Failed to bind listener: {0}")]
    Bind(#[from] std::io::Error),
}

/// Errors raised by a [`DocumentStore`](crate::store::DocumentStore) write.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("HTTP request to document store failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Document store returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to obtain access token: {0}")]
    Token(String),

    #[error("Malformed document store response: {0}")]
    MalformedResponse(String),
}

/// Broad category of an [`IngestError`], used to pick the diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The event data was not valid base64 or not valid UTF-8.
    Decode,
    /// The envelope or the nested payload was not valid JSON.
    Parse,
    /// Anything else, including store failures.
    Unexpected,
}

/// Terminal failure of a single invocation. Nothing is written when one of
/// these is returned.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("event carries no data field")]
    MissingData,

    #[error("invalid base64 in event data: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("event data is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("payload message is not text: {0}")]
    NonTextMessage(serde_json::Value),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IngestError {
    pub fn kind(&self) -> FailureKind {
        match self {
            IngestError::Base64(_) | IngestError::Utf8(_) => FailureKind::Decode,
            IngestError::Json(_) => FailureKind::Parse,
            IngestError::MissingData | IngestError::NonTextMessage(_) | IngestError::Store(_) => {
                FailureKind::Unexpected
            }
        }
    }
}
