// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::Deserialize;
use std::fmt::Debug;
use tracing::debug;

use crate::error::StoreError;

pub const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";
const TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";
const METADATA_FLAVOR_HEADER: &str = "Metadata-Flavor";

#[derive(Deserialize)]
struct MetadataToken {
    access_token: String,
}

/// Where the bearer token for document store requests comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// No `Authorization` header is sent.
    Anonymous,
    Static(String),
    /// The default service account token from the instance metadata server.
    /// A token is requested for every write.
    MetadataServer { url: String },
}

impl TokenSource {
    pub fn metadata_server(host: &str) -> Self {
        TokenSource::MetadataServer {
            url: format!("http://{host}{TOKEN_PATH}"),
        }
    }

    pub async fn token(&self, client: &reqwest::Client) -> Result<Option<String>, StoreError> {
        match self {
            TokenSource::Anonymous => Ok(None),
            TokenSource::Static(token) => Ok(Some(token.clone())),
            TokenSource::MetadataServer { url } => {
                debug!("Requesting access token from metadata server");
                let response = client
                    .get(url)
                    .header(METADATA_FLAVOR_HEADER, "Google")
                    .send()
                    .await
                    .map_err(|e| StoreError::Token(e.to_string()))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(StoreError::Token(format!(
                        "metadata server returned {status}"
                    )));
                }

                let token: MetadataToken = response
                    .json()
                    .await
                    .map_err(|e| StoreError::Token(e.to_string()))?;
                Ok(Some(token.access_token))
            }
        }
    }
}

impl Debug for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenSource::Anonymous => write!(f, "Anonymous"),
            TokenSource::Static(_) => write!(f, "Static(<redacted>)"),
            TokenSource::MetadataServer { url } => write!(f, "MetadataServer({url})"),
        }
    }
}
