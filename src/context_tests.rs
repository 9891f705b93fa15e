// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `context.rs`

#[cfg(test)]
mod tests {
    use crate::context::{ClusterState, EventHandlers};
    use crate::errors::SourceError;
    use crate::selector::Selector;
    use crate::test_fixtures::{endpoints, node, pod, service, stores};
    use kube::ResourceExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_list_services_filters_namespace_and_labels() {
        let mut labelled = service("ns", "b", "ClusterIP", "10.0.0.2");
        labelled.metadata.labels = Some(crate::test_fixtures::map(&[("team", "x")]));
        let stores = stores(
            vec![
                labelled,
                service("ns", "a", "ClusterIP", "10.0.0.1"),
                service("other", "c", "ClusterIP", "10.0.0.3"),
            ],
            vec![],
            vec![],
            vec![],
        );

        let all = stores.list_services("", &Selector::default());
        let names: Vec<String> = all.iter().map(|s| s.name_any()).collect();
        assert_eq!(names, vec!["a", "b", "c"], "sorted by namespace then name");

        let ns = stores.list_services("ns", &Selector::default());
        assert_eq!(ns.len(), 2);

        let team = stores.list_services("ns", &Selector::parse("team=x").unwrap());
        assert_eq!(team.len(), 1);
        assert_eq!(team[0].name_any(), "b");
    }

    #[test]
    fn test_get_endpoints_not_found() {
        let stores = stores(
            vec![],
            vec![endpoints("ns", "web", &[("10.1.0.1", Some("web-0"))], &[])],
            vec![],
            vec![],
        );
        assert!(stores.get_endpoints("ns", "web").is_ok());
        let err = stores.get_endpoints("other", "web").unwrap_err();
        assert!(matches!(err, SourceError::NotFound { kind: "Endpoints", .. }));
    }

    #[test]
    fn test_list_pods_by_selector() {
        let stores = stores(
            vec![],
            vec![],
            vec![
                pod("ns", "web-1", "node-1", &[("app", "web")]),
                pod("ns", "web-0", "node-2", &[("app", "web")]),
                pod("ns", "db-0", "node-1", &[("app", "db")]),
            ],
            vec![],
        );
        let selector = Selector::from_map(&crate::test_fixtures::map(&[("app", "web")]));
        let pods = stores.list_pods("ns", &selector).unwrap();
        let names: Vec<String> = pods.iter().map(|p| p.name_any()).collect();
        assert_eq!(names, vec!["web-0", "web-1"]);
    }

    #[test]
    fn test_nodes() {
        let stores = stores(
            vec![],
            vec![],
            vec![],
            vec![
                node("node-2", &[("InternalIP", "10.0.0.2")]),
                node("node-1", &[("InternalIP", "10.0.0.1")]),
            ],
        );
        let nodes = stores.list_nodes().unwrap();
        assert_eq!(nodes[0].name_any(), "node-1");
        assert!(stores.get_node("node-2").is_ok());
        assert!(matches!(
            stores.get_node("node-3"),
            Err(SourceError::NotFound { kind: "Node", .. })
        ));
    }

    #[test]
    fn test_event_handlers_notify_all() {
        let handlers = EventHandlers::default();
        assert!(handlers.is_empty());

        let calls = Arc::new(AtomicUsize::new(0));
        for _ in 0..2 {
            let calls = calls.clone();
            handlers.register(Arc::new(move || {
                calls.fetch_add(1, Ordering::SeqCst);
            }));
        }
        handlers.notify();
        assert_eq!(handlers.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_add_service_handler_registers() {
        let stores = stores(vec![], vec![], vec![], vec![]);
        stores.add_service_handler(Arc::new(|| {}));
        assert_eq!(stores.handlers.len(), 1);
    }
}
