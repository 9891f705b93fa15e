// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DNS record model produced by a reconciliation pass.
//!
//! An [`Endpoint`] is one record set: a DNS name, a record type, and the
//! targets it points to, plus the metadata providers need (TTL, set
//! identifier, provider-specific properties, ownership labels).
//!
//! # Example
//!
//! ```
//! use svcdns::endpoint::{Endpoint, RecordType, Ttl};
//!
//! let ep = Endpoint::new("www.example.com.", RecordType::A, vec!["192.0.2.1".to_string()])
//!     .with_ttl(Ttl::seconds(300));
//! assert_eq!(ep.dns_name, "www.example.com");
//! assert_eq!(ep.record_ttl, Ttl::seconds(300));
//! ```

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// DNS record types this crate produces.
///
/// Variants are declared in the order of their textual names so the derived
/// `Ord` agrees with a string comparison of [`RecordType::as_str`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RecordType {
    /// IPv4 address record
    A,
    /// IPv6 address record
    AAAA,
    /// Canonical name (alias) record
    CNAME,
    /// Service locator record
    SRV,
}

impl RecordType {
    /// Textual record type as it appears in zone files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::AAAA => "AAAA",
            RecordType::CNAME => "CNAME",
            RecordType::SRV => "SRV",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record TTL in seconds.
///
/// `Ttl::UNCONFIGURED` means the provider default applies, which is a
/// different state from any explicit value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Ttl(Option<u32>);

impl Ttl {
    /// No TTL configured
    pub const UNCONFIGURED: Ttl = Ttl(None);

    /// An explicit TTL
    #[must_use]
    pub const fn seconds(value: u32) -> Self {
        Ttl(Some(value))
    }

    #[must_use]
    pub fn is_configured(self) -> bool {
        self.0.is_some()
    }

    #[must_use]
    pub fn value(self) -> Option<u32> {
        self.0
    }
}

/// One provider-specific key/value pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProviderSpecificProperty {
    pub name: String,
    pub value: String,
}

/// Ordered provider-specific properties attached to an endpoint.
pub type ProviderSpecific = Vec<ProviderSpecificProperty>;

/// Key used to group headless targets by DNS name and record type.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EndpointKey {
    pub dns_name: String,
    pub record_type: RecordType,
}

/// A DNS record set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Fully qualified name, without trailing dot
    pub dns_name: String,

    /// Targets; meaning depends on `record_type`. SRV targets are
    /// `<priority> <weight> <port> <host>`.
    pub targets: Vec<String>,

    /// Record type
    pub record_type: RecordType,

    /// Set identifier, empty when none
    #[serde(skip_serializing_if = "String::is_empty")]
    pub set_identifier: String,

    /// TTL; unconfigured serializes as `null`
    #[serde(rename = "recordTTL")]
    pub record_ttl: Ttl,

    /// Labels, including the ownership label once stamped
    pub labels: BTreeMap<String, String>,

    /// Provider-specific properties
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub provider_specific: ProviderSpecific,
}

impl Endpoint {
    /// Create an endpoint, stripping trailing dots from the name and targets.
    pub fn new(dns_name: &str, record_type: RecordType, targets: Vec<String>) -> Self {
        Self {
            dns_name: dns_name.trim_end_matches('.').to_string(),
            targets: targets
                .into_iter()
                .map(|t| t.trim_end_matches('.').to_string())
                .collect(),
            record_type,
            set_identifier: String::new(),
            record_ttl: Ttl::UNCONFIGURED,
            labels: BTreeMap::new(),
            provider_specific: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Ttl) -> Self {
        self.record_ttl = ttl;
        self
    }

    /// The ownership label, if stamped.
    #[must_use]
    pub fn resource_label(&self) -> &str {
        self.labels
            .get(crate::labels::RESOURCE_LABEL_KEY)
            .map_or("", String::as_str)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.dns_name)?;
        if let Some(ttl) = self.record_ttl.value() {
            write!(f, "{ttl} ")?;
        }
        write!(f, "IN {} {}", self.record_type, self.set_identifier)?;
        write!(f, " [{}]", self.targets.join(";"))
    }
}

#[cfg(test)]
#[path = "endpoint_tests.rs"]
mod endpoint_tests;
