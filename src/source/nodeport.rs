// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! NodePort Services: node address targets and SRV records.
//!
//! # Node selection
//!
//! With `externalTrafficPolicy: Local` only nodes running a matching Pod
//! receive traffic, so only those nodes are published. Nodes are picked from
//! the best non-empty tier:
//!
//! 1. nodes with a Running, Ready Pod that is not terminating
//! 2. nodes with a Running, Ready Pod
//! 3. nodes with a Running Pod
//!
//! Any other policy publishes every node.

use super::annotations::{self, AccessScope};
use super::classify::suitable_type;
use crate::constants::{
    DEFAULT_SRV_PROTOCOL, NODE_EXTERNAL_IP, NODE_INTERNAL_IP, POD_CONDITION_READY,
    POD_PHASE_RUNNING, SRV_PRIORITY, SRV_WEIGHT, TRAFFIC_POLICY_LOCAL,
};
use crate::context::ClusterState;
use crate::endpoint::{Endpoint, RecordType, Ttl};
use crate::errors::Result;
use crate::selector::Selector;
use k8s_openapi::api::core::v1::{Node, Pod, Service};
use kube::ResourceExt;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Nodes in first-seen order, deduplicated by name.
#[derive(Default)]
struct NodeSet {
    seen: HashSet<String>,
    nodes: Vec<Arc<Node>>,
}

impl NodeSet {
    fn insert(&mut self, node: &Arc<Node>) {
        if self.seen.insert(node.name_any()) {
            self.nodes.push(node.clone());
        }
    }

    fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

pub(crate) fn pod_is_running(pod: &Pod) -> bool {
    pod.status.as_ref().and_then(|s| s.phase.as_deref()) == Some(POD_PHASE_RUNNING)
}

pub(crate) fn pod_is_ready(pod: &Pod) -> bool {
    pod.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .and_then(|conditions| conditions.iter().find(|c| c.type_ == POD_CONDITION_READY))
        .is_some_and(|c| c.status == "True")
}

pub(crate) fn pod_is_terminating(pod: &Pod) -> bool {
    pod.metadata.deletion_timestamp.is_some()
}

pub(crate) fn pod_node_name(pod: &Pod) -> &str {
    pod.spec
        .as_ref()
        .and_then(|s| s.node_name.as_deref())
        .unwrap_or_default()
}

fn traffic_policy(svc: &Service) -> &str {
    svc.spec
        .as_ref()
        .and_then(|s| s.external_traffic_policy.as_deref())
        .unwrap_or_default()
}

/// Nodes hosting matching Pods, for the Local traffic policy.
fn local_nodes(state: &dyn ClusterState, svc: &Service) -> Result<Vec<Arc<Node>>> {
    let namespace = svc.namespace().unwrap_or_default();
    let selector = svc
        .spec
        .as_ref()
        .and_then(|s| s.selector.as_ref())
        .map(Selector::from_map)
        .unwrap_or_default();
    let pods = state.list_pods(&namespace, &selector)?;

    let mut live = NodeSet::default();
    let mut ready = NodeSet::default();
    let mut running = NodeSet::default();

    for pod in pods.iter().filter(|p| pod_is_running(p)) {
        let node = match state.get_node(pod_node_name(pod)) {
            Ok(node) => node,
            Err(e) => {
                debug!(pod = %pod.name_any(), error = %e, "Unable to find node where pod is running");
                continue;
            }
        };
        running.insert(&node);
        if pod_is_ready(pod) {
            ready.insert(&node);
            if !pod_is_terminating(pod) {
                live.insert(&node);
            }
        }
    }

    if !live.is_empty() {
        Ok(live.nodes)
    } else if !ready.is_empty() {
        debug!(service = %svc.name_any(), "All ready pods are terminating, using ready nodes");
        Ok(ready.nodes)
    } else {
        debug!(service = %svc.name_any(), "No pods ready, using nodes with running pods");
        Ok(running.nodes)
    }
}

/// Node addresses to publish for a NodePort Service.
///
/// # Errors
///
/// Returns an error if the cluster state provider cannot list Pods or Nodes.
pub fn nodeport_targets(state: &dyn ClusterState, svc: &Service) -> Result<Vec<String>> {
    let nodes = if traffic_policy(svc) == TRAFFIC_POLICY_LOCAL {
        local_nodes(state, svc)?
    } else {
        state.list_nodes()?
    };

    let mut external = Vec::new();
    let mut internal = Vec::new();
    let mut internal_v6 = Vec::new();
    for node in &nodes {
        let addresses = node.status.as_ref().and_then(|s| s.addresses.as_ref());
        for address in addresses.into_iter().flatten() {
            match address.type_.as_str() {
                NODE_EXTERNAL_IP => external.push(address.address.clone()),
                NODE_INTERNAL_IP => {
                    internal.push(address.address.clone());
                    if suitable_type(&address.address) == RecordType::AAAA {
                        internal_v6.push(address.address.clone());
                    }
                }
                _ => {}
            }
        }
    }

    let public = |mut external: Vec<String>| {
        external.extend(internal_v6.iter().cloned());
        external
    };
    Ok(match annotations::access_scope(svc.annotations()) {
        AccessScope::Public => public(external),
        AccessScope::Private => internal,
        AccessScope::Unset if !external.is_empty() => public(external),
        AccessScope::Unset => internal,
    })
}

/// One SRV record per Service port with a node port.
///
/// Records are named `_<service>._<protocol>.<hostname>` and point at
/// `0 50 <nodePort> <hostname>`.
#[must_use]
pub fn nodeport_srv_endpoints(svc: &Service, hostname: &str, ttl: Ttl) -> Vec<Endpoint> {
    let service_name = svc.name_any();
    let ports = svc.spec.as_ref().and_then(|s| s.ports.as_ref());

    let endpoints: Vec<Endpoint> = ports
        .into_iter()
        .flatten()
        .filter_map(|port| {
            let node_port = port.node_port.filter(|p| *p > 0)?;
            let protocol = port
                .protocol
                .as_deref()
                .filter(|p| !p.is_empty())
                .map_or_else(|| DEFAULT_SRV_PROTOCOL.to_string(), str::to_lowercase);
            let target = format!("{SRV_PRIORITY} {SRV_WEIGHT} {node_port} {hostname}");
            let record_name = format!("_{service_name}._{protocol}.{hostname}");
            Some(Endpoint::new(&record_name, RecordType::SRV, vec![target]).with_ttl(ttl))
        })
        .collect();

    for ep in &endpoints {
        info!(
            dns_name = %ep.dns_name,
            record_type = %ep.record_type,
            targets = ?ep.targets,
            ttl = ?ep.record_ttl.value(),
            "Generated node port endpoint"
        );
    }
    endpoints
}

#[cfg(test)]
#[path = "nodeport_tests.rs"]
mod nodeport_tests;
