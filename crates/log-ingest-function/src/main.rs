// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::{env, sync::Arc};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use log_ingest::{
    config::IngestConfig,
    handler::LogEventHandler,
    http_utils::build_client,
    server::IngestServer,
    store::firestore::FirestoreStore,
};

#[tokio::main]
pub async fn main() {
    let log_level = env::var("LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());

    let env_filter = format!("h2=off,hyper=off,rustls=off,reqwest=off,{}", log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let config = match IngestConfig::from_env() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Error creating config on log ingest function startup: {e}");
            return;
        }
    };

    // the store client lives for the whole process and is shared by every invocation
    let client = match build_client(config.https_proxy.as_deref(), config.request_timeout) {
        Ok(client) => client,
        Err(e) => {
            error!("{e}");
            return;
        }
    };
    let store = Arc::new(FirestoreStore::new(
        client,
        config.firestore_endpoint.clone(),
        config.project_id.clone(),
        config.database_id.clone(),
        config.token_source.clone(),
    ));
    let handler = Arc::new(LogEventHandler::new(store, config.collection.clone()));

    info!(
        "Writing processed logs to {}/{} in project {}",
        config.database_id, config.collection, config.project_id
    );

    let server = IngestServer {
        config: Arc::clone(&config),
        handler,
    };
    if let Err(e) = server.start().await {
        error!("Error when running log ingest function: {e}");
    }
}
