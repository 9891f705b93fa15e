// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for svcdns.
//!
//! Configuration problems (bad template, bad selector, unknown service type)
//! surface from [`crate::source::ServiceSource::new`] and are fatal to startup.
//! Lookup and resolution errors are produced by the cluster state provider and
//! the hostname resolver; the source logs them and skips the affected unit of
//! work instead of failing the pass.

use thiserror::Error;

/// Errors produced while configuring or running the Service source.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The FQDN template could not be parsed
    #[error("Invalid FQDN template '{template}': {reason}")]
    InvalidTemplate {
        /// The template text as configured
        template: String,
        /// What the parser rejected
        reason: String,
    },

    /// A label selector or annotation filter expression could not be parsed
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector {
        /// The selector expression as configured
        selector: String,
        /// What the parser rejected
        reason: String,
    },

    /// The service type filter names a type Kubernetes does not define
    #[error("Unknown service type '{0}' in service type filter")]
    InvalidServiceType(String),

    /// A cluster object was not present in the provider's cache
    #[error("{kind} '{name}' not found in namespace '{namespace}'")]
    NotFound {
        /// Kind of the missing object (e.g. `Endpoints`, `Node`)
        kind: &'static str,
        /// Namespace searched; empty for cluster-scoped kinds
        namespace: String,
        /// Name of the missing object
        name: String,
    },

    /// A forward lookup of a load balancer hostname failed
    #[error("Unable to resolve '{host}': {reason}")]
    Resolution {
        /// Hostname that was looked up
        host: String,
        /// Resolver error text
        reason: String,
    },

    /// The Kubernetes API returned an error
    #[error(transparent)]
    Kube(#[from] kube::Error),
}

impl SourceError {
    /// Short label for metrics and structured logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::InvalidTemplate { .. } => "invalid_template",
            SourceError::InvalidSelector { .. } => "invalid_selector",
            SourceError::InvalidServiceType(_) => "invalid_service_type",
            SourceError::NotFound { .. } => "not_found",
            SourceError::Resolution { .. } => "resolution",
            SourceError::Kube(_) => "kube",
        }
    }

    /// Convenience constructor for cache misses.
    pub fn not_found(kind: &'static str, namespace: &str, name: &str) -> Self {
        SourceError::NotFound {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

/// Result alias used across the crate.
pub type Result<T, E = SourceError> = std::result::Result<T, E>;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
