// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Merge and ordering of the candidates from every Service.
//!
//! When two Services claim the same record set, the one with the smaller
//! ownership label must win on every pass, or providers would see the owner
//! flip and recreate the record. Candidates are therefore sorted by
//! ownership label first, then stably by (name, type), so ties keep the
//! ownership order.
//!
//! Duplicates of a kept record contribute only their first target.

use crate::endpoint::Endpoint;
use crate::labels::RESOURCE_LABEL_KEY;
use tracing::debug;

/// Stamp the ownership label on every endpoint.
pub fn set_resource_label(endpoints: &mut [Endpoint], resource: &str) {
    for ep in endpoints {
        ep.labels
            .insert(RESOURCE_LABEL_KEY.to_string(), resource.to_string());
    }
}

fn same_record_set(a: &Endpoint, b: &Endpoint) -> bool {
    a.dns_name == b.dns_name
        && a.record_type == b.record_type
        && a.set_identifier == b.set_identifier
        && a.record_ttl == b.record_ttl
}

/// Merge duplicate record sets and order the result.
///
/// The output is sorted by (name, type), holds one endpoint per
/// (name, type, set identifier, TTL) run, and every target list is sorted
/// and free of duplicates.
#[must_use]
pub fn merge_endpoints(mut endpoints: Vec<Endpoint>) -> Vec<Endpoint> {
    if endpoints.len() > 1 {
        endpoints.sort_unstable_by(|a, b| a.resource_label().cmp(b.resource_label()));
        endpoints.sort_by(|a, b| {
            (a.dns_name.as_str(), a.record_type).cmp(&(b.dns_name.as_str(), b.record_type))
        });
    }

    let mut merged: Vec<Endpoint> = Vec::with_capacity(endpoints.len());
    for ep in endpoints {
        let last = merged
            .last_mut()
            .filter(|last| same_record_set(last, &ep));
        let Some(last) = last else {
            merged.push(ep);
            continue;
        };
        debug!(
            dns_name = %ep.dns_name,
            record_type = %ep.record_type,
            kept = last.resource_label(),
            merged = ep.resource_label(),
            "Merging duplicate endpoint"
        );
        if let Some(first) = ep.targets.into_iter().next() {
            last.targets.push(first);
        }
    }

    for ep in &mut merged {
        ep.targets.sort();
        ep.targets.dedup();
    }
    merged
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod merge_tests;
