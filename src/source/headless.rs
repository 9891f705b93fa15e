// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Headless Services: per-Pod address records and SRV records.
//!
//! A headless Service has no cluster IP, so records are built from the
//! addresses in its Endpoints object. Every address must reference a Pod
//! selected by the Service. For each such Pod this module emits:
//!
//! - one SRV record per named container port, under
//!   `_<port>._<protocol>.<service>.<namespace>.svc.<hostname>`
//! - address records for `<hostname>` and, when the Pod sets its own
//!   hostname, for `<pod-hostname>.<hostname>`
//!
//! Address targets come from, in order: the Pod's target annotation, the
//! Node's external addresses (`endpoints-type: NodeExternalIP`), the Pod's
//! host IP (`endpoints-type: HostIP` or host IP publishing), and finally the
//! Endpoints address itself.

use super::annotations::{self, EndpointsType};
use super::classify::suitable_type;
use super::nodeport::pod_node_name;
use crate::constants::{
    DEFAULT_SRV_PROTOCOL, NODE_EXTERNAL_IP, NODE_INTERNAL_IP, SRV_PRIORITY, SRV_WEIGHT,
    TARGET_REF_KIND_POD,
};
use crate::context::ClusterState;
use crate::endpoint::{Endpoint, EndpointKey, RecordType, Ttl};
use crate::errors::Result;
use crate::selector::Selector;
use k8s_openapi::api::core::v1::{EndpointAddress, Pod, Service};
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Options that change which addresses a headless Service publishes.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeadlessOptions {
    /// Publish the Pod host IP instead of the Pod IP
    pub publish_host_ip: bool,
    /// Include not-ready addresses regardless of the Service setting
    pub always_publish_not_ready_addresses: bool,
}

/// Targets grouped by (domain, record type), first-seen order, no duplicates.
#[derive(Default)]
struct HeadlessTargets(BTreeMap<EndpointKey, Vec<String>>);

impl HeadlessTargets {
    fn add(&mut self, domain: &str, target: String) {
        let key = EndpointKey {
            dns_name: domain.to_string(),
            record_type: suitable_type(&target),
        };
        let targets = self.0.entry(key).or_default();
        if targets.contains(&target) {
            debug!(domain, target = %target, "Removing duplicate target");
        } else {
            targets.push(target);
        }
    }

    /// One endpoint per key, ordered by (domain, record type).
    fn into_endpoints(self, ttl: Ttl) -> impl Iterator<Item = Endpoint> {
        self.0.into_iter().map(move |(key, targets)| {
            Endpoint::new(&key.dns_name, key.record_type, targets).with_ttl(ttl)
        })
    }
}

/// Records for a headless Service under `hostname`.
///
/// Lookup failures are logged and yield whatever was produced so far; they
/// never fail the pass.
#[must_use]
pub fn headless_endpoints(
    state: &dyn ClusterState,
    svc: &Service,
    hostname: &str,
    ttl: Ttl,
    options: HeadlessOptions,
) -> Vec<Endpoint> {
    let namespace = svc.namespace().unwrap_or_default();
    let service_name = svc.name_any();

    let endpoints_object = match state.get_endpoints(&namespace, &service_name) {
        Ok(ep) => ep,
        Err(e) => {
            crate::metrics::record_lookup_error(e.kind());
            error!(namespace = %namespace, service = %service_name, error = %e, "Unable to get endpoints of service");
            return Vec::new();
        }
    };

    let selector = svc
        .spec
        .as_ref()
        .and_then(|s| s.selector.as_ref())
        .map(Selector::from_map)
        .unwrap_or_default();
    let pods = match state.list_pods(&namespace, &selector) {
        Ok(pods) => pods,
        Err(e) => {
            crate::metrics::record_lookup_error(e.kind());
            error!(namespace = %namespace, service = %service_name, error = %e, "Unable to list pods of service");
            return Vec::new();
        }
    };

    let endpoints_type = annotations::endpoints_type(svc.annotations());
    let publish_not_ready = options.always_publish_not_ready_addresses
        || svc
            .spec
            .as_ref()
            .and_then(|s| s.publish_not_ready_addresses)
            .unwrap_or(false);

    let mut endpoints = Vec::new();
    let mut targets = HeadlessTargets::default();

    for subset in endpoints_object.subsets.iter().flatten() {
        let mut addresses: Vec<&EndpointAddress> = subset.addresses.iter().flatten().collect();
        if publish_not_ready {
            addresses.extend(subset.not_ready_addresses.iter().flatten());
        }

        for address in addresses {
            let Some(pod) = backing_pod(address, &pods) else {
                continue;
            };

            endpoints.extend(pod_srv_endpoints(svc, pod, hostname, ttl));

            let mut domains = vec![hostname.to_string()];
            if let Some(pod_hostname) = pod_hostname(pod) {
                domains.push(format!("{pod_hostname}.{hostname}"));
            }

            let address_targets =
                match address_targets(state, pod, address, endpoints_type, options.publish_host_ip) {
                    Ok(t) => t,
                    Err(e) => {
                        crate::metrics::record_lookup_error(e.kind());
                        error!(
                            pod = %pod.name_any(),
                            node = pod_node_name(pod),
                            error = %e,
                            "Unable to get node of pod; not adding any NodeExternalIP endpoints for this subset"
                        );
                        break;
                    }
                };

            for domain in &domains {
                for target in &address_targets {
                    debug!(domain = %domain, target = %target, "Generating matching endpoint");
                    targets.add(domain, target.clone());
                }
            }
        }
    }

    endpoints.extend(targets.into_endpoints(ttl));

    for ep in &endpoints {
        info!(
            dns_name = %ep.dns_name,
            record_type = %ep.record_type,
            targets = ?ep.targets,
            ttl = ?ep.record_ttl.value(),
            "Generated endpoint"
        );
    }
    endpoints
}

/// The selected Pod an address points at, if it points at one.
fn backing_pod<'a>(address: &EndpointAddress, pods: &'a [Arc<Pod>]) -> Option<&'a Arc<Pod>> {
    let target_ref = address.target_ref.as_ref().filter(|r| {
        r.kind.as_deref() == Some(TARGET_REF_KIND_POD)
            && matches!(r.api_version.as_deref(), None | Some("" | "v1"))
    });
    let Some(target_ref) = target_ref else {
        debug!(ip = %address.ip, "Skipping address because its target is not a pod");
        return None;
    };

    let name = target_ref.name.as_deref().unwrap_or_default();
    let pod = pods.iter().find(|p| p.name_any() == name);
    if pod.is_none() {
        error!(pod = name, ip = %address.ip, "Pod not found for address");
    }
    pod
}

fn pod_hostname(pod: &Pod) -> Option<&str> {
    pod.spec
        .as_ref()
        .and_then(|s| s.hostname.as_deref())
        .filter(|h| !h.is_empty())
}

/// SRV records for every named container port of `pod`.
fn pod_srv_endpoints(svc: &Service, pod: &Pod, hostname: &str, ttl: Ttl) -> Vec<Endpoint> {
    let service_name = svc.name_any();
    let namespace = svc.namespace().unwrap_or_default();
    let pod_host = pod_hostname(pod).map_or_else(|| pod.name_any(), str::to_string);
    let containers = pod.spec.as_ref().map(|s| s.containers.as_slice()).unwrap_or_default();

    containers
        .iter()
        .flat_map(|c| c.ports.iter().flatten())
        .filter_map(|port| {
            let port_name = port.name.as_deref().filter(|n| !n.is_empty())?;
            let protocol = port
                .protocol
                .as_deref()
                .filter(|p| !p.is_empty())
                .map_or_else(|| DEFAULT_SRV_PROTOCOL.to_string(), str::to_lowercase);
            let target = format!(
                "{SRV_PRIORITY} {SRV_WEIGHT} {} {pod_host}.{service_name}.{namespace}.svc.{hostname}",
                port.container_port
            );
            let record_name =
                format!("_{port_name}._{protocol}.{service_name}.{namespace}.svc.{hostname}");
            Some(Endpoint::new(&record_name, RecordType::SRV, vec![target]).with_ttl(ttl))
        })
        .collect()
}

/// Targets for the address records of one Pod.
fn address_targets(
    state: &dyn ClusterState,
    pod: &Pod,
    address: &EndpointAddress,
    endpoints_type: EndpointsType,
    publish_host_ip: bool,
) -> Result<Vec<String>> {
    let overrides = annotations::targets(pod.annotations());
    if !overrides.is_empty() {
        return Ok(overrides);
    }

    if endpoints_type == EndpointsType::NodeExternalIP {
        let node = state.get_node(pod_node_name(pod))?;
        let addresses = node.status.as_ref().and_then(|s| s.addresses.as_ref());
        return Ok(addresses
            .into_iter()
            .flatten()
            .filter(|a| {
                a.type_ == NODE_EXTERNAL_IP
                    || (a.type_ == NODE_INTERNAL_IP && suitable_type(&a.address) == RecordType::AAAA)
            })
            .map(|a| a.address.clone())
            .collect());
    }

    if endpoints_type == EndpointsType::HostIP || publish_host_ip {
        let host_ip = pod
            .status
            .as_ref()
            .and_then(|s| s.host_ip.clone())
            .unwrap_or_default();
        return Ok(vec![host_ip].into_iter().filter(|ip| !ip.is_empty()).collect());
    }

    Ok(vec![address.ip.clone()])
}

#[cfg(test)]
#[path = "headless_tests.rs"]
mod headless_tests;
