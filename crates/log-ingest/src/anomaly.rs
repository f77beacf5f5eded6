// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Keyword based anomaly flagging.
//!
//! A log line is flagged when its message, lower-cased, contains any of
//! [`ANOMALY_KEYWORDS`]. The result is a plain boolean: keywords carry no
//! priority and the order of the list does not matter.

/// Substrings that mark a message as anomalous. All lower-case.
pub const ANOMALY_KEYWORDS: [&str; 3] = ["exception", "failed", "denied"];

/// Returns true if `message` contains one of [`ANOMALY_KEYWORDS`], ignoring case.
pub fn is_anomaly(message: &str) -> bool {
    let message = message.to_lowercase();
    ANOMALY_KEYWORDS
        .iter()
        .any(|keyword| message.contains(keyword))
}
