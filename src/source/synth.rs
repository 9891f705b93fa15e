// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Per-Service record synthesis.

use super::annotations;
use super::classify::suitable_type;
use super::headless::{headless_endpoints, HeadlessOptions};
use super::nodeport::{nodeport_srv_endpoints, nodeport_targets};
use super::targets::{
    external_name, is_headless, load_balancer_targets, service_ips, service_type,
};
use super::ServiceSource;
use crate::constants::{
    SERVICE_TYPE_CLUSTER_IP, SERVICE_TYPE_EXTERNAL_NAME, SERVICE_TYPE_LOAD_BALANCER,
    SERVICE_TYPE_NODE_PORT,
};
use crate::context::ClusterState;
use crate::endpoint::{Endpoint, ProviderSpecific, RecordType};
use crate::labels::service_resource_label;
use crate::template::{FqdnTemplate, TemplateView};
use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;
use tracing::error;

impl<S: ClusterState> ServiceSource<S> {
    /// Records for the hostname and internal-hostname annotations.
    pub(crate) fn annotation_endpoints(&self, svc: &Service) -> Vec<Endpoint> {
        if self.config.ignore_hostname_annotation {
            return Vec::new();
        }
        let (provider_specific, set_identifier) =
            annotations::provider_specific_and_set_identifier(svc.annotations());

        let mut endpoints = Vec::new();
        for hostname in annotations::hostnames(svc.annotations()) {
            endpoints.extend(self.generate_endpoints(
                svc,
                &hostname,
                &provider_specific,
                &set_identifier,
                false,
            ));
        }
        for hostname in annotations::internal_hostnames(svc.annotations()) {
            endpoints.extend(self.generate_endpoints(
                svc,
                &hostname,
                &provider_specific,
                &set_identifier,
                true,
            ));
        }
        endpoints
    }

    /// Records for the hostnames rendered from the FQDN template.
    pub(crate) fn template_endpoints(&self, template: &FqdnTemplate, svc: &Service) -> Vec<Endpoint> {
        let name = svc.name_any();
        let namespace = svc.namespace().unwrap_or_default();
        let view = TemplateView {
            name: &name,
            namespace: &namespace,
            labels: svc.labels(),
            annotations: svc.annotations(),
        };
        let (provider_specific, set_identifier) =
            annotations::provider_specific_and_set_identifier(svc.annotations());

        template
            .render(&view)
            .iter()
            .flat_map(|hostname| {
                self.generate_endpoints(svc, hostname, &provider_specific, &set_identifier, false)
            })
            .collect()
    }

    /// Records for one hostname of one Service.
    ///
    /// The target annotation overrides type-specific targets. Headless and
    /// NodePort Services may contribute extra whole records (per-Pod and SRV).
    /// `use_cluster_ip` forces cluster IP targets, as internal hostnames do.
    pub(crate) fn generate_endpoints(
        &self,
        svc: &Service,
        hostname: &str,
        provider_specific: &ProviderSpecific,
        set_identifier: &str,
        use_cluster_ip: bool,
    ) -> Vec<Endpoint> {
        let hostname = hostname.trim_end_matches('.');
        if hostname.is_empty() {
            return Vec::new();
        }
        let namespace = svc.namespace().unwrap_or_default();
        let name = svc.name_any();
        let ttl = annotations::ttl(svc.annotations(), &service_resource_label(&namespace, &name));

        let mut endpoints = Vec::new();
        let mut targets = annotations::targets(svc.annotations());

        if targets.is_empty() {
            match service_type(svc) {
                SERVICE_TYPE_LOAD_BALANCER => {
                    targets = if use_cluster_ip {
                        service_ips(svc)
                    } else {
                        load_balancer_targets(
                            svc,
                            self.config.resolve_load_balancer_hostname,
                            self.resolver.as_ref(),
                        )
                    };
                }
                SERVICE_TYPE_CLUSTER_IP => {
                    if is_headless(svc) {
                        let options = HeadlessOptions {
                            publish_host_ip: self.config.publish_host_ip,
                            always_publish_not_ready_addresses: self
                                .config
                                .always_publish_not_ready_addresses,
                        };
                        endpoints.extend(headless_endpoints(&self.state, svc, hostname, ttl, options));
                    } else if use_cluster_ip || self.config.publish_internal {
                        targets = service_ips(svc);
                    }
                }
                SERVICE_TYPE_NODE_PORT => match nodeport_targets(&self.state, svc) {
                    Ok(node_targets) => {
                        targets = node_targets;
                        endpoints.extend(nodeport_srv_endpoints(svc, hostname, ttl));
                    }
                    Err(e) => {
                        crate::metrics::record_lookup_error(e.kind());
                        error!(namespace = %namespace, service = %name, error = %e, "Unable to extract targets from service");
                        return Vec::new();
                    }
                },
                SERVICE_TYPE_EXTERNAL_NAME => targets = external_name(svc),
                _ => {}
            }
        }

        let mut shells = [RecordType::A, RecordType::AAAA, RecordType::CNAME]
            .map(|record_type| Endpoint::new(hostname, record_type, Vec::new()).with_ttl(ttl));
        for target in targets {
            let target = target.trim_end_matches('.');
            let record_type = suitable_type(target);
            if let Some(shell) = shells.iter_mut().find(|s| s.record_type == record_type) {
                shell.targets.push(target.to_string());
            }
        }
        endpoints.extend(shells.into_iter().filter(|s| !s.targets.is_empty()));

        for ep in &mut endpoints {
            ep.provider_specific.clone_from(provider_specific);
            set_identifier.clone_into(&mut ep.set_identifier);
        }
        endpoints
    }
}

#[cfg(test)]
#[path = "synth_tests.rs"]
mod synth_tests;
