// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Builders for Kubernetes objects shared by unit tests.

use crate::context::Stores;
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EndpointAddress, EndpointSubset, Endpoints, LoadBalancerIngress,
    LoadBalancerStatus, Node, NodeAddress, NodeStatus, ObjectReference, Pod, PodCondition,
    PodSpec, PodStatus, Service, ServicePort, ServiceSpec, ServiceStatus,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use k8s_openapi::jiff::Timestamp;
use kube::runtime::reflector;
use kube::runtime::watcher::Event;
use std::collections::BTreeMap;

pub fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

pub fn service(namespace: &str, name: &str, service_type: &str, cluster_ip: &str) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some(service_type.to_string()),
            cluster_ip: Some(cluster_ip.to_string()),
            ..Default::default()
        }),
        status: None,
    }
}

pub fn annotate(mut svc: Service, pairs: &[(&str, &str)]) -> Service {
    svc.metadata
        .annotations
        .get_or_insert_with(BTreeMap::new)
        .extend(map(pairs));
    svc
}

pub fn with_selector(mut svc: Service, pairs: &[(&str, &str)]) -> Service {
    if let Some(spec) = svc.spec.as_mut() {
        spec.selector = Some(map(pairs));
    }
    svc
}

pub fn with_ingress(mut svc: Service, ingress: &[(Option<&str>, Option<&str>)]) -> Service {
    svc.status = Some(ServiceStatus {
        load_balancer: Some(LoadBalancerStatus {
            ingress: Some(
                ingress
                    .iter()
                    .map(|(ip, hostname)| LoadBalancerIngress {
                        ip: ip.map(str::to_string),
                        hostname: hostname.map(str::to_string),
                        ..Default::default()
                    })
                    .collect(),
            ),
        }),
        ..Default::default()
    });
    svc
}

pub fn with_ports(mut svc: Service, ports: &[(&str, Option<&str>, i32)]) -> Service {
    if let Some(spec) = svc.spec.as_mut() {
        spec.ports = Some(
            ports
                .iter()
                .map(|(name, protocol, node_port)| ServicePort {
                    name: Some((*name).to_string()),
                    protocol: protocol.map(str::to_string),
                    node_port: Some(*node_port),
                    port: 80,
                    ..Default::default()
                })
                .collect(),
        );
    }
    svc
}

pub fn pod(namespace: &str, name: &str, node_name: &str, labels: &[(&str, &str)]) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(map(labels)),
            ..Default::default()
        },
        spec: Some(PodSpec {
            node_name: Some(node_name.to_string()),
            containers: vec![Container {
                name: "main".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }),
        status: Some(PodStatus {
            phase: Some("Running".to_string()),
            conditions: Some(vec![PodCondition {
                type_: "Ready".to_string(),
                status: "True".to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        }),
    }
}

pub fn with_pod_hostname(mut pod: Pod, hostname: &str) -> Pod {
    if let Some(spec) = pod.spec.as_mut() {
        spec.hostname = Some(hostname.to_string());
    }
    pod
}

pub fn with_host_ip(mut pod: Pod, host_ip: &str) -> Pod {
    if let Some(status) = pod.status.as_mut() {
        status.host_ip = Some(host_ip.to_string());
    }
    pod
}

pub fn with_container_ports(mut pod: Pod, ports: &[(&str, Option<&str>, i32)]) -> Pod {
    if let Some(spec) = pod.spec.as_mut() {
        spec.containers[0].ports = Some(
            ports
                .iter()
                .map(|(name, protocol, port)| ContainerPort {
                    name: Some((*name).to_string()).filter(|n| !n.is_empty()),
                    protocol: protocol.map(str::to_string),
                    container_port: *port,
                    ..Default::default()
                })
                .collect(),
        );
    }
    pod
}

pub fn not_ready(mut pod: Pod) -> Pod {
    if let Some(status) = pod.status.as_mut() {
        status.conditions = Some(vec![PodCondition {
            type_: "Ready".to_string(),
            status: "False".to_string(),
            ..Default::default()
        }]);
    }
    pod
}

pub fn with_phase(mut pod: Pod, phase: &str) -> Pod {
    if let Some(status) = pod.status.as_mut() {
        status.phase = Some(phase.to_string());
    }
    pod
}

pub fn terminating(mut pod: Pod) -> Pod {
    pod.metadata.deletion_timestamp = Some(Time(Timestamp::now()));
    pod
}

pub fn node(name: &str, addresses: &[(&str, &str)]) -> Node {
    Node {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        spec: None,
        status: Some(NodeStatus {
            addresses: Some(
                addresses
                    .iter()
                    .map(|(type_, address)| NodeAddress {
                        type_: (*type_).to_string(),
                        address: (*address).to_string(),
                    })
                    .collect(),
            ),
            ..Default::default()
        }),
    }
}

fn address(ip: &str, pod_name: Option<&str>) -> EndpointAddress {
    EndpointAddress {
        ip: ip.to_string(),
        target_ref: pod_name.map(|name| ObjectReference {
            kind: Some("Pod".to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Endpoints with one subset; `ready` and `not_ready` are `(ip, pod name)`.
pub fn endpoints(
    namespace: &str,
    name: &str,
    ready: &[(&str, Option<&str>)],
    not_ready: &[(&str, Option<&str>)],
) -> Endpoints {
    Endpoints {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        subsets: Some(vec![EndpointSubset {
            addresses: Some(ready.iter().map(|(ip, p)| address(ip, *p)).collect()),
            not_ready_addresses: Some(not_ready.iter().map(|(ip, p)| address(ip, *p)).collect()),
            ports: None,
        }]),
    }
}

/// Populate reflector stores the way a synced watcher would.
pub fn stores(
    services: Vec<Service>,
    endpoints: Vec<Endpoints>,
    pods: Vec<Pod>,
    nodes: Vec<Node>,
) -> Stores {
    let (svc_reader, mut svc_writer) = reflector::store::<Service>();
    for obj in services {
        svc_writer.apply_watcher_event(&Event::Apply(obj));
    }
    let (ep_reader, mut ep_writer) = reflector::store::<Endpoints>();
    for obj in endpoints {
        ep_writer.apply_watcher_event(&Event::Apply(obj));
    }
    let (pod_reader, mut pod_writer) = reflector::store::<Pod>();
    for obj in pods {
        pod_writer.apply_watcher_event(&Event::Apply(obj));
    }
    let (node_reader, mut node_writer) = reflector::store::<Node>();
    for obj in nodes {
        node_writer.apply_watcher_event(&Event::Apply(obj));
    }
    Stores::new(svc_reader, ep_reader, pod_reader, node_reader)
}
