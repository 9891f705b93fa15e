// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

// Common test utilities for integration tests

#![allow(dead_code)]

use k8s_openapi::api::core::v1::{Endpoints, Node, Pod, Service};
use kube::client::Client;
use kube::runtime::reflector;
use kube::runtime::watcher::Event;
use serde_json::json;
use svcdns::context::Stores;

/// Get a Kubernetes client or skip the test if not in a cluster
pub async fn get_kube_client_or_skip() -> Option<Client> {
    match Client::try_default().await {
        Ok(client) => Some(client),
        Err(e) => {
            eprintln!("Skipping integration test: not running in Kubernetes cluster: {e}");
            None
        }
    }
}

/// A Service built from JSON, the way manifests describe them
pub fn service(namespace: &str, name: &str, spec: serde_json::Value) -> Service {
    serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "Service",
        "metadata": { "name": name, "namespace": namespace },
        "spec": spec,
    }))
    .expect("valid Service")
}

pub fn annotated(mut svc: Service, pairs: &[(&str, &str)]) -> Service {
    let annotations = svc.metadata.annotations.get_or_insert_with(Default::default);
    for (k, v) in pairs {
        annotations.insert((*k).to_string(), (*v).to_string());
    }
    svc
}

pub fn with_status(mut svc: Service, status: serde_json::Value) -> Service {
    svc.status = Some(serde_json::from_value(status).expect("valid ServiceStatus"));
    svc
}

pub fn pod(namespace: &str, name: &str, mut value: serde_json::Value) -> Pod {
    value["apiVersion"] = json!("v1");
    value["kind"] = json!("Pod");
    let mut pod: Pod = serde_json::from_value(value).expect("valid Pod");
    pod.metadata.name = Some(name.to_string());
    pod.metadata.namespace = Some(namespace.to_string());
    pod
}

pub fn node(name: &str, addresses: &[(&str, &str)]) -> Node {
    let addresses: Vec<_> = addresses
        .iter()
        .map(|(t, a)| json!({ "type": t, "address": a }))
        .collect();
    serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "Node",
        "metadata": { "name": name },
        "status": { "addresses": addresses },
    }))
    .expect("valid Node")
}

pub fn endpoints(namespace: &str, name: &str, subsets: serde_json::Value) -> Endpoints {
    serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "Endpoints",
        "metadata": { "name": name, "namespace": namespace },
        "subsets": subsets,
    }))
    .expect("valid Endpoints")
}

/// Reflector stores populated as if their watchers had synced
pub fn cluster(
    services: Vec<Service>,
    endpoints: Vec<Endpoints>,
    pods: Vec<Pod>,
    nodes: Vec<Node>,
) -> Stores {
    let (services_reader, mut writer) = reflector::store::<Service>();
    services
        .into_iter()
        .for_each(|o| writer.apply_watcher_event(&Event::Apply(o)));
    let (endpoints_reader, mut writer) = reflector::store::<Endpoints>();
    endpoints
        .into_iter()
        .for_each(|o| writer.apply_watcher_event(&Event::Apply(o)));
    let (pods_reader, mut writer) = reflector::store::<Pod>();
    pods.into_iter()
        .for_each(|o| writer.apply_watcher_event(&Event::Apply(o)));
    let (nodes_reader, mut writer) = reflector::store::<Node>();
    nodes
        .into_iter()
        .for_each(|o| writer.apply_watcher_event(&Event::Apply(o)));
    Stores::new(services_reader, endpoints_reader, pods_reader, nodes_reader)
}
