// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Forward lookup of load balancer hostnames.
//!
//! Only used when load balancer hostname resolution is enabled. The lookup is
//! blocking; callers running inside an async runtime must run the pass on a
//! blocking thread.

use crate::errors::{Result, SourceError};
use hickory_resolver::Resolver;
use std::net::IpAddr;

/// Blocking hostname to address resolution.
pub trait HostnameResolver: Send + Sync {
    /// Resolve `host` to every address it has.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Resolution`] when the lookup fails.
    fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>>;
}

/// Resolver using the host's system DNS configuration.
pub struct SystemResolver {
    inner: Resolver,
}

impl SystemResolver {
    /// Build a resolver from `/etc/resolv.conf` (or the platform equivalent).
    ///
    /// # Errors
    ///
    /// Returns an error if the system configuration cannot be read.
    pub fn from_system_conf() -> Result<Self> {
        let inner = Resolver::from_system_conf().map_err(|e| SourceError::Resolution {
            host: String::new(),
            reason: format!("reading system resolver configuration: {e}"),
        })?;
        Ok(Self { inner })
    }
}

impl HostnameResolver for SystemResolver {
    fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>> {
        self.inner
            .lookup_ip(host)
            .map(|lookup| lookup.iter().collect())
            .map_err(|e| SourceError::Resolution {
                host: host.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Resolver that never resolves anything; used when hostname resolution is
/// disabled so no system configuration is read.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopResolver;

impl HostnameResolver for NoopResolver {
    fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>> {
        Err(SourceError::Resolution {
            host: host.to_string(),
            reason: "hostname resolution is disabled".to_string(),
        })
    }
}
