// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Label keys carried on generated endpoints.
//!
//! Providers persist these labels next to the records they publish, so the
//! values must stay stable across releases.

/// Label recording which Kubernetes object produced an endpoint
pub const RESOURCE_LABEL_KEY: &str = "resource";

/// Build the ownership label value for a Service.
///
/// # Example
///
/// ```
/// assert_eq!(svcdns::labels::service_resource_label("ns", "web"), "service/ns/web");
/// ```
#[must_use]
pub fn service_resource_label(namespace: &str, name: &str) -> String {
    format!("service/{namespace}/{name}")
}
