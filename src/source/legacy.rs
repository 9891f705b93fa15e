// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Records from annotation formats used by older DNS controllers.
//!
//! | Mode                  | Reads                                                          |
//! |-----------------------|----------------------------------------------------------------|
//! | `mate`                | `zalando.org/dnsname` on LoadBalancer Services                 |
//! | `molecule`            | `domainName` on LoadBalancer Services labelled `dns=route53`   |
//! | `kops-dns-controller` | `dns.alpha.kubernetes.io/{internal,external}` on NodePort and LoadBalancer Services |
//!
//! Only consulted when a Service produced nothing from the regular
//! annotations.

use super::annotations::split_list;
use super::classify::suitable_type;
use super::targets::service_type;
use crate::constants::{
    COMPATIBILITY_KOPS_DNS_CONTROLLER, COMPATIBILITY_MATE, COMPATIBILITY_MOLECULE,
    KOPS_EXTERNAL_ANNOTATION, KOPS_INTERNAL_ANNOTATION, MATE_ANNOTATION, MOLECULE_ANNOTATION,
    MOLECULE_LABEL_KEY, MOLECULE_LABEL_VALUE, NODE_EXTERNAL_IP, NODE_INTERNAL_IP,
    SERVICE_TYPE_LOAD_BALANCER, SERVICE_TYPE_NODE_PORT,
};
use crate::context::ClusterState;
use crate::endpoint::{Endpoint, RecordType};
use crate::errors::Result;
use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;
use tracing::warn;

/// Records for `svc` under the legacy annotation format named by `mode`.
///
/// Unknown modes produce nothing.
///
/// # Errors
///
/// Returns an error if Nodes cannot be listed for a `kops-dns-controller`
/// NodePort Service.
pub fn legacy_endpoints(
    mode: &str,
    state: &dyn ClusterState,
    svc: &Service,
) -> Result<Vec<Endpoint>> {
    match mode {
        COMPATIBILITY_MATE => Ok(mate_endpoints(svc)),
        COMPATIBILITY_MOLECULE => Ok(molecule_endpoints(svc)),
        COMPATIBILITY_KOPS_DNS_CONTROLLER => kops_endpoints(state, svc),
        other => {
            warn!(mode = other, "Unknown compatibility mode; ignoring");
            Ok(Vec::new())
        }
    }
}

fn mate_endpoints(svc: &Service) -> Vec<Endpoint> {
    let Some(hostname) = svc.annotations().get(MATE_ANNOTATION) else {
        return Vec::new();
    };
    if service_type(svc) != SERVICE_TYPE_LOAD_BALANCER {
        return Vec::new();
    }
    ingress_endpoints(svc, hostname)
}

fn molecule_endpoints(svc: &Service) -> Vec<Endpoint> {
    if svc.labels().get(MOLECULE_LABEL_KEY).map(String::as_str) != Some(MOLECULE_LABEL_VALUE) {
        return Vec::new();
    }
    if service_type(svc) != SERVICE_TYPE_LOAD_BALANCER {
        return Vec::new();
    }
    split_list(svc.annotations().get(MOLECULE_ANNOTATION))
        .iter()
        .flat_map(|hostname| ingress_endpoints(svc, hostname))
        .collect()
}

fn kops_endpoints(state: &dyn ClusterState, svc: &Service) -> Result<Vec<Endpoint>> {
    let internal = split_list(svc.annotations().get(KOPS_INTERNAL_ANNOTATION));
    let external = split_list(svc.annotations().get(KOPS_EXTERNAL_ANNOTATION));
    if internal.is_empty() && external.is_empty() {
        return Ok(Vec::new());
    }

    match service_type(svc) {
        SERVICE_TYPE_NODE_PORT => {
            let nodes = state.list_nodes()?;
            let mut endpoints = Vec::new();
            for node in &nodes {
                let addresses = node.status.as_ref().and_then(|s| s.addresses.as_ref());
                for address in addresses.into_iter().flatten() {
                    let record_type = suitable_type(&address.address);
                    let is_external = address.type_ == NODE_EXTERNAL_IP
                        || (address.type_ == NODE_INTERNAL_IP && record_type == RecordType::AAAA);
                    if is_external {
                        endpoints.extend(external.iter().map(|hostname| {
                            Endpoint::new(hostname, record_type, vec![address.address.clone()])
                        }));
                    }
                    if address.type_ == NODE_INTERNAL_IP {
                        endpoints.extend(internal.iter().map(|hostname| {
                            Endpoint::new(hostname, record_type, vec![address.address.clone()])
                        }));
                    }
                }
            }
            Ok(endpoints)
        }
        SERVICE_TYPE_LOAD_BALANCER => Ok(internal
            .iter()
            .chain(&external)
            .flat_map(|hostname| ingress_endpoints(svc, hostname))
            .collect()),
        _ => Ok(Vec::new()),
    }
}

/// One record per load balancer ingress point: IP as A/AAAA, hostname as
/// CNAME.
fn ingress_endpoints(svc: &Service, hostname: &str) -> Vec<Endpoint> {
    let ingress = svc
        .status
        .as_ref()
        .and_then(|s| s.load_balancer.as_ref())
        .and_then(|lb| lb.ingress.as_ref());

    let mut endpoints = Vec::new();
    for lb in ingress.into_iter().flatten() {
        if let Some(ip) = lb.ip.as_deref().filter(|ip| !ip.is_empty()) {
            endpoints.push(Endpoint::new(hostname, suitable_type(ip), vec![ip.to_string()]));
        }
        if let Some(target) = lb.hostname.as_deref().filter(|h| !h.is_empty()) {
            endpoints.push(Endpoint::new(hostname, RecordType::CNAME, vec![target.to_string()]));
        }
    }
    endpoints
}

#[cfg(test)]
#[path = "legacy_tests.rs"]
mod legacy_tests;
