// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Service source configuration.
//!
//! Loaded from a YAML file and overridden by command-line flags. Keys are
//! accepted in snake case or kebab case.
//!
//! ```yaml
//! namespace: production
//! annotation-filter: "team=dns"
//! fqdn-template: "{{.Name}}.{{.Namespace}}.example.com"
//! publish-internal: true
//! service-type-filter: [LoadBalancer, NodePort]
//! ```
//!
//! Nothing here is validated; [`crate::source::ServiceSource::new`] rejects
//! bad templates, selectors and Service types.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Namespace to read Services from; empty means all namespaces
    pub namespace: String,

    /// Label-selector expression matched against Service annotations
    #[serde(alias = "annotation-filter")]
    pub annotation_filter: String,

    /// Template rendering hostnames for Services without annotations
    #[serde(alias = "fqdn-template")]
    pub fqdn_template: String,

    /// Add template hostnames to annotation hostnames instead of replacing
    #[serde(alias = "combine-fqdn-annotation")]
    pub combine_fqdn_annotation: bool,

    /// Legacy annotation format (`mate`, `molecule`, `kops-dns-controller`);
    /// empty disables it
    pub compatibility: String,

    /// Publish cluster IPs of ClusterIP Services
    #[serde(alias = "publish-internal")]
    pub publish_internal: bool,

    /// Publish Pod host IPs for headless Services
    #[serde(alias = "publish-host-ip")]
    pub publish_host_ip: bool,

    /// Publish not-ready addresses of headless Services
    #[serde(alias = "always-publish-not-ready-addresses")]
    pub always_publish_not_ready_addresses: bool,

    /// Service types to consider; empty means all
    #[serde(alias = "service-type-filter")]
    pub service_type_filter: Vec<String>,

    /// Ignore the hostname annotations
    #[serde(alias = "ignore-hostname-annotation")]
    pub ignore_hostname_annotation: bool,

    /// Label selector restricting the Services considered
    #[serde(alias = "label-selector")]
    pub label_selector: String,

    /// Replace load balancer hostnames with their resolved addresses
    #[serde(alias = "resolve-load-balancer-hostname")]
    pub resolve_load_balancer_hostname: bool,
}

impl SourceConfig {
    /// Load a YAML configuration file, returning the default if the file
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML for
    /// this structure.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = match std::fs::read_to_string(path.as_ref()) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
