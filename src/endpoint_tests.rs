// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `endpoint.rs`

#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_record_type_order_matches_text() {
        let mut types = vec![RecordType::SRV, RecordType::CNAME, RecordType::AAAA, RecordType::A];
        types.sort();
        let mut names: Vec<&str> = types.iter().map(|t| t.as_str()).collect();
        let sorted_names = names.clone();
        names.sort_unstable();
        assert_eq!(names, sorted_names);
        assert_eq!(types[0], RecordType::A);
        assert_eq!(types[3], RecordType::SRV);
    }

    #[test]
    fn test_new_strips_trailing_dots() {
        let ep = Endpoint::new(
            "_http._tcp.web.ns.svc.cluster.local.",
            RecordType::SRV,
            vec!["0 50 80 web-0.web.ns.svc.cluster.local.".to_string()],
        );
        assert_eq!(ep.dns_name, "_http._tcp.web.ns.svc.cluster.local");
        assert_eq!(ep.targets, vec!["0 50 80 web-0.web.ns.svc.cluster.local"]);
        assert!(!ep.record_ttl.is_configured());
    }

    #[test]
    fn test_ttl_states() {
        assert_eq!(Ttl::default(), Ttl::UNCONFIGURED);
        assert_ne!(Ttl::UNCONFIGURED, Ttl::seconds(0));
        assert_eq!(Ttl::seconds(60).value(), Some(60));
    }

    #[test]
    fn test_resource_label_empty_until_stamped() {
        let mut ep = Endpoint::new("a.example.com", RecordType::A, vec!["10.0.0.1".into()]);
        assert_eq!(ep.resource_label(), "");
        ep.labels.insert(
            crate::labels::RESOURCE_LABEL_KEY.to_string(),
            "service/ns/a".to_string(),
        );
        assert_eq!(ep.resource_label(), "service/ns/a");
    }

    #[test]
    fn test_serialize_camel_case() {
        let ep = Endpoint::new("a.example.com", RecordType::CNAME, vec!["lb.example.com".into()])
            .with_ttl(Ttl::seconds(300));
        let json = serde_json::to_value(&ep).unwrap();
        assert_eq!(json["dnsName"], "a.example.com");
        assert_eq!(json["recordType"], "CNAME");
        assert_eq!(json["recordTTL"], 300);
        assert!(json.get("setIdentifier").is_none());
        assert!(json.get("providerSpecific").is_none());
    }

    #[test]
    fn test_display() {
        let ep = Endpoint::new("a.example.com", RecordType::A, vec!["10.0.0.1".into()])
            .with_ttl(Ttl::seconds(60));
        assert_eq!(ep.to_string(), "a.example.com 60 IN A  [10.0.0.1]");
    }
}
