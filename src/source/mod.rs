// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DNS records derived from Kubernetes Services.
//!
//! [`ServiceSource`] runs one reconciliation pass over the cached cluster
//! state and returns the record sets that should exist.
//!
//! # Pass Architecture
//!
//! 1. **List** - Services in the configured namespace matching the label selector
//! 2. **Filter** - Drop Services failing the annotation filter or type filter
//! 3. **Gate** - Skip Services assigned to another controller
//! 4. **Synthesize** - Hostname annotations, then legacy formats, then the FQDN template
//! 5. **Label** - Stamp `service/<namespace>/<name>` on every record
//! 6. **Merge** - Combine duplicate record sets and order the output
//!
//! # Modules
//!
//! - [`classify`] - Record type of a target string
//! - [`annotations`] - Typed annotation extraction
//! - [`targets`] - Targets per Service type
//! - [`resolver`] - Load balancer hostname resolution
//! - [`headless`] - Per-Pod records for headless Services
//! - [`nodeport`] - Node addresses and SRV records for NodePort Services
//! - [`legacy`] - Older controller annotation formats
//! - [`merge`] - Merge and ordering of all candidates
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use svcdns::config::SourceConfig;
//! use svcdns::context::Stores;
//! use svcdns::source::{NoopResolver, ServiceSource};
//!
//! async fn run(client: kube::Client) -> anyhow::Result<()> {
//!     let config = SourceConfig {
//!         publish_internal: true,
//!         ..SourceConfig::default()
//!     };
//!     let stores = Stores::start(client, &config.namespace).await?;
//!     let source = ServiceSource::new(config, stores, Arc::new(NoopResolver))?;
//!     for endpoint in source.endpoints()? {
//!         println!("{endpoint}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod annotations;
pub mod classify;
pub mod headless;
pub mod legacy;
pub mod merge;
pub mod nodeport;
pub mod resolver;
mod synth;
pub mod targets;

pub use classify::suitable_type;
pub use resolver::{HostnameResolver, NoopResolver, SystemResolver};

use crate::config::SourceConfig;
use crate::constants::{
    CONTROLLER_ANNOTATION_VALUE, SERVICE_TYPE_CLUSTER_IP, SERVICE_TYPE_EXTERNAL_NAME,
    SERVICE_TYPE_LOAD_BALANCER, SERVICE_TYPE_NODE_PORT,
};
use crate::context::{ClusterState, EventHandler};
use crate::endpoint::Endpoint;
use crate::errors::{Result, SourceError};
use crate::labels::service_resource_label;
use crate::selector::Selector;
use crate::template::FqdnTemplate;
use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

const KNOWN_SERVICE_TYPES: [&str; 4] = [
    SERVICE_TYPE_CLUSTER_IP,
    SERVICE_TYPE_NODE_PORT,
    SERVICE_TYPE_LOAD_BALANCER,
    SERVICE_TYPE_EXTERNAL_NAME,
];

/// Computes DNS records from the Services in a [`ClusterState`].
pub struct ServiceSource<S: ClusterState> {
    config: SourceConfig,
    state: S,
    resolver: Arc<dyn HostnameResolver>,
    fqdn_template: Option<FqdnTemplate>,
    annotation_filter: Selector,
    label_selector: Selector,
    service_types: BTreeSet<String>,
}

impl<S: ClusterState> ServiceSource<S> {
    /// Build a source, validating the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidTemplate`] for a bad FQDN template,
    /// [`SourceError::InvalidSelector`] for a bad annotation filter or label
    /// selector, and [`SourceError::InvalidServiceType`] for an unknown entry
    /// in the Service type filter.
    pub fn new(
        config: SourceConfig,
        state: S,
        resolver: Arc<dyn HostnameResolver>,
    ) -> Result<Self> {
        let fqdn_template = if config.fqdn_template.trim().is_empty() {
            None
        } else {
            Some(FqdnTemplate::parse(&config.fqdn_template)?)
        };
        let annotation_filter = Selector::parse(&config.annotation_filter)?;
        let label_selector = Selector::parse(&config.label_selector)?;

        let mut service_types = BTreeSet::new();
        for service_type in &config.service_type_filter {
            if !KNOWN_SERVICE_TYPES.contains(&service_type.as_str()) {
                return Err(SourceError::InvalidServiceType(service_type.clone()));
            }
            service_types.insert(service_type.clone());
        }

        if !config.compatibility.is_empty() {
            debug!(mode = %config.compatibility, "Legacy compatibility enabled");
        }

        Ok(Self {
            config,
            state,
            resolver,
            fqdn_template,
            annotation_filter,
            label_selector,
            service_types,
        })
    }

    #[must_use]
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Register `handler` to run whenever the Service set changes.
    ///
    /// The source does no work of its own on a change; callers decide when
    /// to run the next pass.
    pub fn add_event_handler(&self, handler: EventHandler) {
        self.state.add_service_handler(handler);
    }

    /// Run one reconciliation pass.
    ///
    /// # Errors
    ///
    /// Returns an error only when a legacy compatibility lookup fails;
    /// per-Service lookup failures are logged and skipped.
    pub fn endpoints(&self) -> Result<Vec<Endpoint>> {
        let start = Instant::now();
        match self.compute_endpoints() {
            Ok(endpoints) => {
                crate::metrics::record_pass_success(start.elapsed(), endpoints.len());
                info!(
                    endpoints = endpoints.len(),
                    duration_ms = start.elapsed().as_millis(),
                    "Service pass complete"
                );
                Ok(endpoints)
            }
            Err(e) => {
                crate::metrics::record_pass_error(start.elapsed());
                warn!(error = %e, "Service pass failed");
                Err(e)
            }
        }
    }

    fn compute_endpoints(&self) -> Result<Vec<Endpoint>> {
        let services: Vec<Arc<Service>> = self
            .state
            .list_services(&self.config.namespace, &self.label_selector)
            .into_iter()
            .filter(|svc| self.matches_annotation_filter(svc))
            .filter(|svc| self.matches_service_type(svc))
            .collect();

        let mut endpoints = Vec::new();
        for svc in &services {
            let namespace = svc.namespace().unwrap_or_default();
            let name = svc.name_any();

            if !is_own_controller(svc) {
                debug!(
                    namespace = %namespace,
                    service = %name,
                    required = CONTROLLER_ANNOTATION_VALUE,
                    "Skipping service because controller value does not match"
                );
                crate::metrics::record_service_skipped("controller");
                continue;
            }

            let mut svc_endpoints = self.annotation_endpoints(svc);

            if svc_endpoints.is_empty() && !self.config.compatibility.is_empty() {
                svc_endpoints = legacy::legacy_endpoints(&self.config.compatibility, &self.state, svc)?;
            }

            if let Some(template) = &self.fqdn_template {
                if self.config.combine_fqdn_annotation || svc_endpoints.is_empty() {
                    let templated = self.template_endpoints(template, svc);
                    if self.config.combine_fqdn_annotation {
                        svc_endpoints.extend(templated);
                    } else {
                        svc_endpoints = templated;
                    }
                }
            }

            if svc_endpoints.is_empty() {
                debug!(namespace = %namespace, service = %name, "No endpoints could be generated from service");
                crate::metrics::record_service_skipped("no_endpoints");
                continue;
            }

            debug!(
                namespace = %namespace,
                service = %name,
                count = svc_endpoints.len(),
                "Endpoints generated from service"
            );
            merge::set_resource_label(&mut svc_endpoints, &service_resource_label(&namespace, &name));
            endpoints.extend(svc_endpoints);
        }

        Ok(merge::merge_endpoints(endpoints))
    }

    fn matches_annotation_filter(&self, svc: &Service) -> bool {
        self.annotation_filter.is_empty() || self.annotation_filter.matches(svc.annotations())
    }

    fn matches_service_type(&self, svc: &Service) -> bool {
        self.service_types.is_empty() || self.service_types.contains(targets::service_type(svc))
    }
}

/// False when the Service names a controller other than this one.
fn is_own_controller(svc: &Service) -> bool {
    annotations::controller(svc.annotations()).is_none_or(|c| c == CONTROLLER_ANNOTATION_VALUE)
}
