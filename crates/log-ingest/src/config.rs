// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::time::Duration;

use crate::error::ServiceError;
use crate::store::firestore::{DEFAULT_DATABASE, DEFAULT_ENDPOINT};
use crate::store::DEFAULT_COLLECTION;
use crate::token::{TokenSource, DEFAULT_METADATA_HOST};

const DEFAULT_PORT: u16 = 8080;
/// Token the Firestore emulator accepts as an admin credential.
const EMULATOR_TOKEN: &str = "owner";
const PROJECT_ID_VARS: [&str; 3] = ["GOOGLE_CLOUD_PROJECT", "GCP_PROJECT", "GCLOUD_PROJECT"];

/// Configuration for the ingestion function
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Google Cloud project owning the Firestore database
    pub project_id: String,
    /// Firestore database id
    pub database_id: String,
    /// Collection processed logs are appended to
    pub collection: String,
    /// Firestore REST base URL, including the API version
    pub firestore_endpoint: String,
    /// Where store requests get their bearer token
    pub token_source: TokenSource,
    /// Port the HTTP trigger listens on
    pub port: u16,
    /// Log level (e.g., trace, debug, info, warn, error)
    pub log_level: String,
    /// Maximum accepted trigger request body, in bytes
    pub max_request_content_length: usize,
    /// Timeout for each store request. None leaves the platform timeout as the only bound.
    pub request_timeout: Option<Duration>,
    /// HTTPS proxy URL
    pub https_proxy: Option<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            database_id: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            firestore_endpoint: DEFAULT_ENDPOINT.to_string(),
            token_source: TokenSource::metadata_server(DEFAULT_METADATA_HOST),
            port: DEFAULT_PORT,
            log_level: "info".to_string(),
            max_request_content_length: 10 * 1024 * 1024, // 10MB in Bytes
            request_timeout: None,
            https_proxy: None,
        }
    }
}

impl IngestConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ServiceError> {
        let defaults = Self::default();

        let project_id = PROJECT_ID_VARS
            .iter()
            .find_map(|var| env::var(var).ok().filter(|val| !val.trim().is_empty()))
            .unwrap_or_default();
        let database_id = env::var("FIRESTORE_DATABASE").unwrap_or(defaults.database_id);
        let collection = env::var("LOG_INGEST_COLLECTION").unwrap_or(defaults.collection);

        // the emulator speaks plain HTTP and needs no real credentials
        let (firestore_endpoint, token_source) = match env::var("FIRESTORE_EMULATOR_HOST") {
            Ok(host) => (
                format!("http://{host}/v1"),
                TokenSource::Static(EMULATOR_TOKEN.to_string()),
            ),
            Err(_) => {
                let metadata_host = env::var("GCE_METADATA_HOST")
                    .unwrap_or_else(|_| DEFAULT_METADATA_HOST.to_string());
                (
                    defaults.firestore_endpoint,
                    TokenSource::metadata_server(&metadata_host),
                )
            }
        };

        let port = env::var("PORT")
            .ok()
            .and_then(|port| port.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let log_level = env::var("LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or_else(|_| "info".to_string());
        let request_timeout = env::var("FIRESTORE_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|secs| secs.parse::<u64>().ok())
            .map(Duration::from_secs);
        let https_proxy = env::var("HTTPS_PROXY").ok();

        let config = Self {
            project_id,
            database_id,
            collection,
            firestore_endpoint,
            token_source,
            port,
            log_level,
            max_request_content_length: defaults.max_request_content_length,
            request_timeout,
            https_proxy,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.project_id.trim().is_empty() {
            return Err(ServiceError::InvalidConfig(
                "project id is not set, expected one of GOOGLE_CLOUD_PROJECT, GCP_PROJECT or GCLOUD_PROJECT".to_string(),
            ));
        }

        if self.database_id.trim().is_empty() {
            return Err(ServiceError::InvalidConfig(
                "FIRESTORE_DATABASE cannot be empty".to_string(),
            ));
        }

        // collection ids cannot contain a path separator
        if self.collection.trim().is_empty() || self.collection.contains('/') {
            return Err(ServiceError::InvalidConfig(format!(
                "Invalid collection '{}'",
                self.collection
            )));
        }

        if self.port == 0 {
            return Err(ServiceError::InvalidConfig(
                "PORT must be greater than 0".to_string(),
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(ServiceError::InvalidConfig(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ALL_VARS: [&str; 11] = [
        "GOOGLE_CLOUD_PROJECT",
        "GCP_PROJECT",
        "GCLOUD_PROJECT",
        "FIRESTORE_DATABASE",
        "LOG_INGEST_COLLECTION",
        "FIRESTORE_EMULATOR_HOST",
        "GCE_METADATA_HOST",
        "PORT",
        "LOG_LEVEL",
        "FIRESTORE_REQUEST_TIMEOUT_SECS",
        "HTTPS_PROXY",
    ];

    fn clear_env() {
        for var in ALL_VARS {
            env::remove_var(var);
        }
    }

    fn valid_config() -> IngestConfig {
        IngestConfig {
            project_id: "demo".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config_needs_project() {
        assert!(IngestConfig::default().validate().is_err());
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_port() {
        let config = IngestConfig {
            port: 0,
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_invalid_collection() {
        for collection in ["", "  ", "processed-logs/extra"] {
            let config = IngestConfig {
                collection: collection.to_string(),
                ..valid_config()
            };
            assert!(config.validate().is_err(), "{collection:?} should be invalid");
        }
    }

    #[test]
    fn test_validate_empty_database() {
        let config = IngestConfig {
            database_id: " ".to_string(),
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_log_levels() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            let config = IngestConfig {
                log_level: level.to_string(),
                ..valid_config()
            };
            assert!(
                config.validate().is_ok(),
                "Log level '{}' should be valid",
                level
            );
        }

        let config = IngestConfig {
            log_level: "verbose".to_string(),
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        env::set_var("GOOGLE_CLOUD_PROJECT", "demo");

        let config = IngestConfig::from_env().unwrap();
        assert_eq!(config.project_id, "demo");
        assert_eq!(config.database_id, "(default)");
        assert_eq!(config.collection, "processed-logs");
        assert_eq!(config.firestore_endpoint, DEFAULT_ENDPOINT);
        assert_eq!(
            config.token_source,
            TokenSource::metadata_server(DEFAULT_METADATA_HOST)
        );
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.https_proxy, None);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_missing_project() {
        clear_env();
        let result = IngestConfig::from_env();
        assert!(matches!(result, Err(ServiceError::InvalidConfig(_))));
    }

    #[test]
    #[serial]
    fn test_from_env_project_fallbacks() {
        clear_env();
        env::set_var("GOOGLE_CLOUD_PROJECT", "");
        env::set_var("GCP_PROJECT", "legacy-project");
        let config = IngestConfig::from_env().unwrap();
        assert_eq!(config.project_id, "legacy-project");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_emulator() {
        clear_env();
        env::set_var("GCLOUD_PROJECT", "demo");
        env::set_var("FIRESTORE_EMULATOR_HOST", "localhost:8081");

        let config = IngestConfig::from_env().unwrap();
        assert_eq!(config.firestore_endpoint, "http://localhost:8081/v1");
        assert_eq!(config.token_source, TokenSource::Static("owner".to_string()));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        env::set_var("GOOGLE_CLOUD_PROJECT", "demo");
        env::set_var("FIRESTORE_DATABASE", "logs-db");
        env::set_var("LOG_INGEST_COLLECTION", "flagged-logs");
        env::set_var("GCE_METADATA_HOST", "169.254.169.254");
        env::set_var("PORT", "9090");
        env::set_var("LOG_LEVEL", "DEBUG");
        env::set_var("FIRESTORE_REQUEST_TIMEOUT_SECS", "5");
        env::set_var("HTTPS_PROXY", "http://proxy:3128");

        let config = IngestConfig::from_env().unwrap();
        assert_eq!(config.database_id, "logs-db");
        assert_eq!(config.collection, "flagged-logs");
        assert_eq!(
            config.token_source,
            TokenSource::metadata_server("169.254.169.254")
        );
        assert_eq!(config.port, 9090);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.request_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.https_proxy.as_deref(), Some("http://proxy:3128"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_log_level() {
        clear_env();
        env::set_var("GOOGLE_CLOUD_PROJECT", "demo");
        env::set_var("LOG_LEVEL", "loud");
        assert!(IngestConfig::from_env().is_err());
        clear_env();
    }
}
