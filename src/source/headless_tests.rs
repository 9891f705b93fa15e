// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `headless.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::test_fixtures::{
        annotate, endpoints, node, pod, service, stores, with_container_ports, with_host_ip,
        with_pod_hostname, with_selector,
    };
    use k8s_openapi::api::core::v1::{Endpoints, Node, Pod};

    const HOST: &str = "svc.ns.svc.cluster.local";

    fn headless(annotations: &[(&str, &str)]) -> Service {
        annotate(
            with_selector(service("ns", "svc", "ClusterIP", "None"), &[("app", "db")]),
            annotations,
        )
    }

    fn db_pod(name: &str, node_name: &str) -> Pod {
        pod("ns", name, node_name, &[("app", "db")])
    }

    fn run(
        svc: &Service,
        eps: Vec<Endpoints>,
        pods: Vec<Pod>,
        nodes: Vec<Node>,
        options: HeadlessOptions,
    ) -> Vec<Endpoint> {
        let state = stores(vec![], eps, pods, nodes);
        headless_endpoints(&state, svc, HOST, Ttl::UNCONFIGURED, options)
    }

    #[test]
    fn test_node_external_ip_endpoints_type() {
        let svc = headless(&[("external-dns.alpha.kubernetes.io/endpoints-type", "NodeExternalIP")]);
        let result = run(
            &svc,
            vec![endpoints("ns", "svc", &[("10.1.0.1", Some("pod-1"))], &[])],
            vec![db_pod("pod-1", "node-1")],
            vec![node("node-1", &[("ExternalIP", "1.2.3.4"), ("InternalIP", "10.0.0.1")])],
            HeadlessOptions::default(),
        );

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].dns_name, HOST);
        assert_eq!(result[0].record_type, RecordType::A);
        assert_eq!(result[0].targets, vec!["1.2.3.4"]);
    }

    #[test]
    fn test_node_external_ip_includes_ipv6_internal() {
        let svc = headless(&[("external-dns.alpha.kubernetes.io/endpoints-type", "NodeExternalIP")]);
        let result = run(
            &svc,
            vec![endpoints("ns", "svc", &[("10.1.0.1", Some("pod-1"))], &[])],
            vec![db_pod("pod-1", "node-1")],
            vec![node(
                "node-1",
                &[("ExternalIP", "1.2.3.4"), ("InternalIP", "2001:db8::1")],
            )],
            HeadlessOptions::default(),
        );

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].record_type, RecordType::A);
        assert_eq!(result[1].record_type, RecordType::AAAA);
        assert_eq!(result[1].targets, vec!["2001:db8::1"]);
    }

    #[test]
    fn test_default_uses_endpoint_address_and_pod_hostname_domain() {
        let svc = headless(&[]);
        let result = run(
            &svc,
            vec![endpoints(
                "ns",
                "svc",
                &[("10.1.0.1", Some("pod-1")), ("10.1.0.2", Some("pod-2"))],
                &[],
            )],
            vec![
                with_pod_hostname(db_pod("pod-1", "node-1"), "db-0"),
                db_pod("pod-2", "node-1"),
            ],
            vec![],
            HeadlessOptions::default(),
        );

        let names: Vec<_> = result.iter().map(|e| e.dns_name.as_str()).collect();
        assert_eq!(names, vec![format!("db-0.{HOST}"), HOST.to_string()]);
        assert_eq!(result[0].targets, vec!["10.1.0.1"]);
        assert_eq!(result[1].targets, vec!["10.1.0.1", "10.1.0.2"]);
    }

    #[test]
    fn test_host_ip_publishing() {
        let svc = headless(&[]);
        let eps = vec![endpoints(
            "ns",
            "svc",
            &[("10.1.0.1", Some("pod-1")), ("10.1.0.2", Some("pod-2"))],
            &[],
        )];
        let pods = vec![
            with_host_ip(db_pod("pod-1", "node-1"), "192.168.0.1"),
            with_host_ip(db_pod("pod-2", "node-1"), "192.168.0.1"),
        ];

        let result = run(
            &svc,
            eps.clone(),
            pods.clone(),
            vec![],
            HeadlessOptions {
                publish_host_ip: true,
                ..HeadlessOptions::default()
            },
        );
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].targets, vec!["192.168.0.1"], "duplicates are removed");

        let annotated = headless(&[("external-dns.alpha.kubernetes.io/endpoints-type", "HostIP")]);
        let result = run(&annotated, eps, pods, vec![], HeadlessOptions::default());
        assert_eq!(result[0].targets, vec!["192.168.0.1"]);
    }

    #[test]
    fn test_pod_target_annotation_wins() {
        let svc = headless(&[("external-dns.alpha.kubernetes.io/endpoints-type", "NodeExternalIP")]);
        let mut p = db_pod("pod-1", "missing-node");
        p.metadata.annotations = Some(crate::test_fixtures::map(&[(
            "external-dns.alpha.kubernetes.io/target",
            "edge.example.com.",
        )]));

        let result = run(
            &svc,
            vec![endpoints("ns", "svc", &[("10.1.0.1", Some("pod-1"))], &[])],
            vec![p],
            vec![],
            HeadlessOptions::default(),
        );
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].record_type, RecordType::CNAME);
        assert_eq!(result[0].targets, vec!["edge.example.com"]);
    }

    #[test]
    fn test_not_ready_addresses() {
        let svc = headless(&[]);
        let eps = vec![endpoints(
            "ns",
            "svc",
            &[("10.1.0.1", Some("pod-1"))],
            &[("10.1.0.2", Some("pod-2"))],
        )];
        let pods = vec![db_pod("pod-1", "node-1"), db_pod("pod-2", "node-1")];

        let result = run(&svc, eps.clone(), pods.clone(), vec![], HeadlessOptions::default());
        assert_eq!(result[0].targets, vec!["10.1.0.1"]);

        let result = run(
            &svc,
            eps.clone(),
            pods.clone(),
            vec![],
            HeadlessOptions {
                always_publish_not_ready_addresses: true,
                ..HeadlessOptions::default()
            },
        );
        assert_eq!(result[0].targets, vec!["10.1.0.1", "10.1.0.2"]);

        let mut publishing = svc.clone();
        publishing.spec.as_mut().unwrap().publish_not_ready_addresses = Some(true);
        let result = run(&publishing, eps, pods, vec![], HeadlessOptions::default());
        assert_eq!(result[0].targets, vec!["10.1.0.1", "10.1.0.2"]);
    }

    #[test]
    fn test_addresses_without_pod_reference_are_skipped() {
        let svc = headless(&[]);
        let result = run(
            &svc,
            vec![endpoints(
                "ns",
                "svc",
                &[("10.1.0.1", None), ("10.1.0.2", Some("unknown-pod"))],
                &[],
            )],
            vec![db_pod("pod-1", "node-1")],
            vec![],
            HeadlessOptions::default(),
        );
        assert!(result.is_empty());
    }

    #[test]
    fn test_srv_for_named_container_ports() {
        let svc = headless(&[]);
        let p = with_container_ports(
            with_pod_hostname(db_pod("pod-1", "node-1"), "db-0"),
            &[("pg", None, 5432), ("metrics", Some("UDP"), 9100), ("", None, 8080)],
        );
        let result = run(
            &svc,
            vec![endpoints("ns", "svc", &[("10.1.0.1", Some("pod-1"))], &[])],
            vec![p],
            vec![],
            HeadlessOptions::default(),
        );

        let srv: Vec<_> = result
            .iter()
            .filter(|e| e.record_type == RecordType::SRV)
            .collect();
        assert_eq!(srv.len(), 2);
        assert_eq!(srv[0].dns_name, format!("_pg._tcp.svc.ns.svc.{HOST}"));
        assert_eq!(
            srv[0].targets,
            vec![format!("0 50 5432 db-0.svc.ns.svc.{HOST}")]
        );
        assert_eq!(srv[1].dns_name, format!("_metrics._udp.svc.ns.svc.{HOST}"));
    }

    #[test]
    fn test_missing_endpoints_object_yields_nothing() {
        let svc = headless(&[]);
        let result = run(&svc, vec![], vec![db_pod("pod-1", "node-1")], vec![], HeadlessOptions::default());
        assert!(result.is_empty());
    }

    #[test]
    fn test_missing_node_stops_subset() {
        let svc = headless(&[("external-dns.alpha.kubernetes.io/endpoints-type", "NodeExternalIP")]);
        let result = run(
            &svc,
            vec![endpoints(
                "ns",
                "svc",
                &[("10.1.0.1", Some("pod-1")), ("10.1.0.2", Some("pod-2"))],
                &[],
            )],
            vec![db_pod("pod-1", "missing"), db_pod("pod-2", "node-1")],
            vec![node("node-1", &[("ExternalIP", "1.2.3.4")])],
            HeadlessOptions::default(),
        );
        assert!(result.is_empty());
    }

    #[test]
    fn test_ttl_is_applied() {
        let svc = headless(&[]);
        let state = stores(
            vec![],
            vec![endpoints("ns", "svc", &[("10.1.0.1", Some("pod-1"))], &[])],
            vec![db_pod("pod-1", "node-1")],
            vec![],
        );
        let result = headless_endpoints(&state, &svc, HOST, Ttl::seconds(30), HeadlessOptions::default());
        assert_eq!(result[0].record_ttl, Ttl::seconds(30));
    }
}
