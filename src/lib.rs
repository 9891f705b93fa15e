// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # svcdns - DNS records from Kubernetes Services
//!
//! svcdns decides which DNS records should exist for the Services in a
//! Kubernetes cluster. It reads Services, Endpoints, Pods and Nodes from
//! watch-driven caches and produces a deduplicated, stably ordered list of
//! A, AAAA, CNAME and SRV record sets.
//!
//! ## Overview
//!
//! - Hostnames come from Service annotations, legacy controller annotations,
//!   or an FQDN template
//! - Targets depend on the Service type: cluster IPs, load balancer ingress,
//!   node addresses, external names, or per-Pod addresses for headless Services
//! - Records claimed by several Services are merged so the same Service owns
//!   the result on every pass
//!
//! Publishing the records to a DNS provider is left to the caller.
//!
//! ## Modules
//!
//! - [`source`] - The reconciliation pass and its building blocks
//! - [`context`] - Cluster state provider backed by reflector stores
//! - [`endpoint`] - Output record model
//! - [`config`] - Source configuration
//! - [`selector`] - Label selector parsing and matching
//! - [`template`] - FQDN template rendering
//! - [`metrics`] - Prometheus metrics
//!
//! ## Example
//!
//! ```rust
//! use svcdns::endpoint::RecordType;
//! use svcdns::source::suitable_type;
//!
//! assert_eq!(suitable_type("10.0.0.1"), RecordType::A);
//! assert_eq!(suitable_type("::1"), RecordType::AAAA);
//! assert_eq!(suitable_type("example.com"), RecordType::CNAME);
//! ```

pub mod config;
pub mod constants;
pub mod context;
pub mod endpoint;
pub mod errors;
pub mod labels;
pub mod metrics;
pub mod selector;
pub mod source;
pub mod template;

#[cfg(test)]
mod test_fixtures;
