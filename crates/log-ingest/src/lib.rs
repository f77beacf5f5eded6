// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Log ingestion callback for push-triggered serverless functions.
//!
//! Each trigger request carries one base64 encoded log entry. The entry's
//! nested payload is validated, flagged with `is_anomaly` when its message
//! mentions an exception, a failure or a denial, and appended to a document
//! collection (Firestore `processed-logs` by default).
//!
//! Invocations are independent. The only state shared between them is the
//! read-only [`LogEventHandler`](handler::LogEventHandler) holding the store
//! client, created once at process start.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod anomaly;
pub mod config;
pub mod error;
pub mod event;
pub mod handler;
pub mod http_utils;
pub mod payload;
pub mod server;
pub mod store;
pub mod token;
