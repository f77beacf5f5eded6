// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Body;
use hyper::service::service_fn;
use hyper::{http, Method, Request, Response, StatusCode};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, info_span, Instrument};

use crate::config::IngestConfig;
use crate::error::ServiceError;
use crate::event::parse_trigger_request;
use crate::handler::{LogEventHandler, Outcome};
use crate::http_utils::{
    create_http_response, log_and_create_http_response, verify_request_content_length,
    HttpResponse,
};

pub const TRIGGER_ENDPOINT_PATH: &str = "/";

pub struct IngestServer {
    pub config: Arc<IngestConfig>,
    pub handler: Arc<LogEventHandler>,
}

impl IngestServer {
    /// Binds `0.0.0.0:{port}` and serves trigger requests until the listener fails.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(ServiceError::Bind)?;
        debug!("Log ingest function listening on port {}", self.config.port);
        self.serve(listener).await
    }

    /// Serves trigger requests on an already bound listener.
    pub async fn serve(
        &self,
        listener: tokio::net::TcpListener,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let config = self.config.clone();
        let handler = self.handler.clone();
        let service = service_fn(move |req| {
            // called for each http request
            let config = config.clone();
            let handler = handler.clone();
            IngestServer::endpoint_handler(config, handler, req)
        });

        let server = hyper::server::conn::http1::Builder::new();
        let mut joinset = tokio::task::JoinSet::new();

        loop {
            let conn = tokio::select! {
                con_res = listener.accept() => match con_res {
                    Err(e)
                        if matches!(
                            e.kind(),
                            io::ErrorKind::ConnectionAborted
                                | io::ErrorKind::ConnectionReset
                                | io::ErrorKind::ConnectionRefused
                        ) =>
                    {
                        continue;
                    }
                    Err(e) => {
                        error!("Server error: {e}");
                        return Err(e.into());
                    }
                    Ok((conn, _)) => conn,
                },
                finished = async {
                    match joinset.join_next().await {
                        Some(finished) => finished,
                        None => std::future::pending().await,
                    }
                } => match finished {
                    Err(e) if e.is_panic() => {
                        // Don't kill server on panic - log and continue
                        error!("Connection handler panicked: {:?}", e);
                        continue;
                    },
                    Ok(()) | Err(_) => continue,
                },
            };
            let conn = hyper_util::rt::TokioIo::new(conn);
            let server = server.clone();
            let service = service.clone();
            joinset.spawn(async move {
                if let Err(e) = server.serve_connection(conn, service).await {
                    error!("Connection error: {e}");
                }
            });
        }
    }

    pub async fn endpoint_handler<B>(
        config: Arc<IngestConfig>,
        handler: Arc<LogEventHandler>,
        req: Request<B>,
    ) -> http::Result<HttpResponse>
    where
        B: Body<Data = Bytes>,
        B::Error: std::fmt::Display,
    {
        match (req.method(), req.uri().path()) {
            (&Method::POST, TRIGGER_ENDPOINT_PATH) => {
                Self::trigger_handler(config, handler, req).await
            }
            _ => {
                let mut not_found = Response::default();
                *not_found.status_mut() = StatusCode::NOT_FOUND;
                Ok(not_found)
            }
        }
    }

    async fn trigger_handler<B>(
        config: Arc<IngestConfig>,
        handler: Arc<LogEventHandler>,
        req: Request<B>,
    ) -> http::Result<HttpResponse>
    where
        B: Body<Data = Bytes>,
        B::Error: std::fmt::Display,
    {
        let (parts, body) = req.into_parts();
        if let Some(response) = verify_request_content_length(
            &parts.headers,
            config.max_request_content_length,
            "Error processing trigger request",
        ) {
            return response;
        }

        let body_bytes = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                return log_and_create_http_response(
                    &format!("Error reading trigger request body: {e}"),
                    StatusCode::BAD_REQUEST,
                );
            }
        };

        // double check body size in case transfer encoding is used
        if body_bytes.len() > config.max_request_content_length {
            return log_and_create_http_response(
                "Error processing trigger request: Payload too large",
                StatusCode::PAYLOAD_TOO_LARGE,
            );
        }

        let invocation = match parse_trigger_request(&body_bytes) {
            Ok(invocation) => invocation,
            Err(e) => {
                return log_and_create_http_response(
                    &format!("Error deserializing trigger request body: {e}"),
                    StatusCode::BAD_REQUEST,
                );
            }
        };

        let span = info_span!(
            "invocation",
            event_id = invocation.context.event_id.as_deref().unwrap_or_default()
        );
        let result = handler
            .process(&invocation.event, &invocation.context)
            .instrument(span)
            .await;

        // the event is acknowledged whatever the outcome, the handler already logged it
        let message = match result {
            Ok(Outcome::Stored { id, .. }) => format!("Stored log with ID: {id}"),
            Ok(Outcome::Skipped(reason)) => format!("Skipped log entry: {reason}"),
            Err(e) => format!("Dropped log entry: {e}"),
        };
        create_http_response(&message, StatusCode::OK)
    }
}
