// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Raw target extraction per Service type.
//!
//! These functions return unclassified target strings. NodePort targets live
//! in [`super::nodeport`] because they need cluster state.

use super::resolver::HostnameResolver;
use crate::constants::{CLUSTER_IP_NONE, SERVICE_TYPE_CLUSTER_IP};
use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;
use tracing::{debug, error};

/// The Service type, defaulting to `ClusterIP` like the API server does.
#[must_use]
pub fn service_type(svc: &Service) -> &str {
    svc.spec
        .as_ref()
        .and_then(|s| s.type_.as_deref())
        .unwrap_or(SERVICE_TYPE_CLUSTER_IP)
}

/// The allocated cluster IP, empty when unset.
#[must_use]
pub fn cluster_ip(svc: &Service) -> &str {
    svc.spec
        .as_ref()
        .and_then(|s| s.cluster_ip.as_deref())
        .unwrap_or_default()
}

/// True for ClusterIP Services without an allocated cluster IP.
#[must_use]
pub fn is_headless(svc: &Service) -> bool {
    cluster_ip(svc) == CLUSTER_IP_NONE
}

/// The cluster IP as a target. Headless Services yield nothing.
#[must_use]
pub fn service_ips(svc: &Service) -> Vec<String> {
    let ip = cluster_ip(svc);
    if ip == CLUSTER_IP_NONE {
        debug!(service = %svc.name_any(), "Unable to associate headless service with a cluster IP");
        return Vec::new();
    }
    if ip.is_empty() {
        return Vec::new();
    }
    vec![ip.to_string()]
}

/// The declared external name of an ExternalName Service.
#[must_use]
pub fn external_name(svc: &Service) -> Vec<String> {
    svc.spec
        .as_ref()
        .and_then(|s| s.external_name.clone())
        .filter(|name| !name.is_empty())
        .into_iter()
        .collect()
}

/// Targets for a LoadBalancer Service.
///
/// Explicit external IPs take precedence over ingress status. Ingress
/// hostnames are emitted as-is unless `resolve_hostnames` is set, in which
/// case each is replaced by its resolved addresses; a failed lookup drops that
/// ingress point only.
#[must_use]
pub fn load_balancer_targets(
    svc: &Service,
    resolve_hostnames: bool,
    resolver: &dyn HostnameResolver,
) -> Vec<String> {
    let external_ips = svc
        .spec
        .as_ref()
        .and_then(|s| s.external_ips.as_ref())
        .filter(|ips| !ips.is_empty());
    if let Some(ips) = external_ips {
        return ips.clone();
    }

    let ingress = svc
        .status
        .as_ref()
        .and_then(|s| s.load_balancer.as_ref())
        .and_then(|lb| lb.ingress.as_ref());

    let mut targets = Vec::new();
    for lb in ingress.into_iter().flatten() {
        if let Some(ip) = lb.ip.as_deref().filter(|ip| !ip.is_empty()) {
            targets.push(ip.to_string());
        }
        let Some(hostname) = lb.hostname.as_deref().filter(|h| !h.is_empty()) else {
            continue;
        };
        if !resolve_hostnames {
            targets.push(hostname.to_string());
            continue;
        }
        match resolver.lookup_ip(hostname) {
            Ok(ips) => targets.extend(ips.iter().map(ToString::to_string)),
            Err(e) => {
                crate::metrics::record_lookup_error(e.kind());
                error!(hostname, error = %e, "Unable to resolve load balancer hostname");
            }
        }
    }
    targets
}

#[cfg(test)]
#[path = "targets_tests.rs"]
mod targets_tests;
