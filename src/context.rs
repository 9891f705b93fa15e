// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Cluster state provider backed by reflector stores.
//!
//! The Service source never talks to the API server directly. It reads a
//! cached, watch-driven mirror of Services, Endpoints, Pods and Nodes through
//! the [`ClusterState`] trait. [`Stores`] implements that trait on top of
//! kube-rs reflector stores, giving synchronous in-memory lookups.
//!
//! Listings are returned sorted by namespace and name so a pass does not
//! depend on the hash order of the underlying caches.

use crate::constants::REFLECTOR_RETRY_DELAY_SECS;
use crate::errors::{Result, SourceError};
use crate::selector::Selector;
use futures::TryStreamExt;
use k8s_openapi::api::core::v1::{Endpoints, Node, Pod, Service};
use kube::runtime::reflector::{self, Store};
use kube::runtime::watcher;
use kube::{Api, Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Callback invoked with no arguments when the Service set changes.
pub type EventHandler = Arc<dyn Fn() + Send + Sync>;

/// Read-only view of cluster state used by a reconciliation pass.
///
/// An empty `namespace` means all namespaces.
pub trait ClusterState {
    /// Services in `namespace` whose labels match `selector`.
    fn list_services(&self, namespace: &str, selector: &Selector) -> Vec<Arc<Service>>;

    /// The Endpoints object backing a Service.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::NotFound`] when no such object is cached.
    fn get_endpoints(&self, namespace: &str, name: &str) -> Result<Arc<Endpoints>>;

    /// Pods in `namespace` whose labels match `selector`.
    ///
    /// # Errors
    ///
    /// Implementations backed by a remote API may fail; the cache never does.
    fn list_pods(&self, namespace: &str, selector: &Selector) -> Result<Vec<Arc<Pod>>>;

    /// Every Node in the cluster.
    ///
    /// # Errors
    ///
    /// Implementations backed by a remote API may fail; the cache never does.
    fn list_nodes(&self) -> Result<Vec<Arc<Node>>>;

    /// A single Node by name.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::NotFound`] when no such Node is cached.
    fn get_node(&self, name: &str) -> Result<Arc<Node>>;

    /// Register a callback fired whenever the Service set changes.
    fn add_service_handler(&self, handler: EventHandler);
}

/// Registered change callbacks, shared with the Service reflector task.
#[derive(Clone, Default)]
pub struct EventHandlers(Arc<RwLock<Vec<EventHandler>>>);

impl EventHandlers {
    pub fn register(&self, handler: EventHandler) {
        match self.0.write() {
            Ok(mut handlers) => handlers.push(handler),
            Err(poisoned) => poisoned.into_inner().push(handler),
        }
    }

    /// Invoke every registered handler.
    pub fn notify(&self) {
        let handlers = match self.0.read() {
            Ok(handlers) => handlers.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        for handler in handlers {
            handler();
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.read().map_or(0, |h| h.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reflector stores for the four resource kinds a pass reads.
#[derive(Clone)]
pub struct Stores {
    pub services: Store<Service>,
    pub endpoints: Store<Endpoints>,
    pub pods: Store<Pod>,
    pub nodes: Store<Node>,
    pub handlers: EventHandlers,
}

impl Stores {
    /// Wrap existing stores. Used by tests and by [`Stores::start`].
    #[must_use]
    pub fn new(
        services: Store<Service>,
        endpoints: Store<Endpoints>,
        pods: Store<Pod>,
        nodes: Store<Node>,
    ) -> Self {
        Self {
            services,
            endpoints,
            pods,
            nodes,
            handlers: EventHandlers::default(),
        }
    }

    /// Start reflectors for Services, Endpoints and Pods in `namespace`
    /// (all namespaces when empty) and for Nodes cluster-wide, then wait for
    /// the initial list of each to complete.
    ///
    /// # Errors
    ///
    /// Returns an error if a store is dropped before it becomes ready.
    pub async fn start(client: Client, namespace: &str) -> anyhow::Result<Self> {
        let handlers = EventHandlers::default();

        let services = spawn_reflector(
            namespaced_api::<Service>(&client, namespace),
            Some(handlers.clone()),
        );
        let endpoints = spawn_reflector(namespaced_api::<Endpoints>(&client, namespace), None);
        let pods = spawn_reflector(namespaced_api::<Pod>(&client, namespace), None);
        let nodes = spawn_reflector(Api::<Node>::all(client), None);

        services.wait_until_ready().await?;
        endpoints.wait_until_ready().await?;
        pods.wait_until_ready().await?;
        nodes.wait_until_ready().await?;
        info!(
            services = services.state().len(),
            endpoints = endpoints.state().len(),
            pods = pods.state().len(),
            nodes = nodes.state().len(),
            "Cluster state caches synced"
        );

        Ok(Self {
            services,
            endpoints,
            pods,
            nodes,
            handlers,
        })
    }
}

impl ClusterState for Stores {
    fn list_services(&self, namespace: &str, selector: &Selector) -> Vec<Arc<Service>> {
        let mut services: Vec<Arc<Service>> = self
            .services
            .state()
            .into_iter()
            .filter(|svc| in_namespace(svc.as_ref(), namespace) && selector.matches(svc.labels()))
            .collect();
        sort_by_identity(&mut services);
        services
    }

    fn get_endpoints(&self, namespace: &str, name: &str) -> Result<Arc<Endpoints>> {
        self.endpoints
            .state()
            .into_iter()
            .find(|ep| ep.name_any() == name && ep.namespace().as_deref() == Some(namespace))
            .ok_or_else(|| SourceError::not_found("Endpoints", namespace, name))
    }

    fn list_pods(&self, namespace: &str, selector: &Selector) -> Result<Vec<Arc<Pod>>> {
        let mut pods: Vec<Arc<Pod>> = self
            .pods
            .state()
            .into_iter()
            .filter(|pod| in_namespace(pod.as_ref(), namespace) && selector.matches(pod.labels()))
            .collect();
        sort_by_identity(&mut pods);
        Ok(pods)
    }

    fn list_nodes(&self) -> Result<Vec<Arc<Node>>> {
        let mut nodes = self.nodes.state();
        sort_by_identity(&mut nodes);
        Ok(nodes)
    }

    fn get_node(&self, name: &str) -> Result<Arc<Node>> {
        self.nodes
            .state()
            .into_iter()
            .find(|node| node.name_any() == name)
            .ok_or_else(|| SourceError::not_found("Node", "", name))
    }

    fn add_service_handler(&self, handler: EventHandler) {
        debug!("Adding event handler for services");
        self.handlers.register(handler);
    }
}

fn in_namespace<K: ResourceExt>(obj: &K, namespace: &str) -> bool {
    namespace.is_empty() || obj.namespace().as_deref() == Some(namespace)
}

fn sort_by_identity<K: ResourceExt>(objs: &mut [Arc<K>]) {
    objs.sort_by(|a, b| {
        (a.namespace(), a.name_any()).cmp(&(b.namespace(), b.name_any()))
    });
}

fn namespaced_api<K>(client: &Client, namespace: &str) -> Api<K>
where
    K: Resource<Scope = k8s_openapi::NamespaceResourceScope>,
    K::DynamicType: Default,
{
    if namespace.is_empty() {
        Api::all(client.clone())
    } else {
        Api::namespaced(client.clone(), namespace)
    }
}

/// Run a reflector for `api` on the current runtime and return its store.
///
/// Stream errors are logged and retried after a short delay. When `on_change`
/// is set, it is notified after every event that alters the cached set.
fn spawn_reflector<K>(api: Api<K>, on_change: Option<EventHandlers>) -> Store<K>
where
    K: Resource + Clone + Debug + Send + Sync + DeserializeOwned + 'static,
    K::DynamicType: Default + Eq + Hash + Clone,
{
    let kind = K::kind(&K::DynamicType::default()).to_string();
    let (reader, writer) = reflector::store();
    let stream = reflector::reflector(writer, watcher(api, watcher::Config::default()));

    tokio::spawn(async move {
        let mut stream = Box::pin(stream);
        loop {
            match stream.try_next().await {
                Ok(Some(event)) => {
                    let changed = matches!(
                        event,
                        watcher::Event::Apply(_)
                            | watcher::Event::Delete(_)
                            | watcher::Event::InitDone
                    );
                    if changed {
                        if let Some(handlers) = &on_change {
                            handlers.notify();
                        }
                    }
                }
                Ok(None) => {
                    warn!(kind = %kind, "Reflector stream terminated");
                    break;
                }
                Err(e) => {
                    error!(kind = %kind, error = %e, "Reflector error; retrying");
                    tokio::time::sleep(Duration::from_secs(REFLECTOR_RETRY_DELAY_SECS)).await;
                }
            }
        }
    });

    reader
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod context_tests;
