// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Target classification by address family.

use crate::endpoint::RecordType;
use std::net::IpAddr;

/// Record type a target belongs in.
///
/// IPv4 literals are A, IPv6 literals are AAAA, anything else is a CNAME
/// target. IPv4-mapped IPv6 literals (`::ffff:a.b.c.d`) count as IPv4.
///
/// ```
/// use svcdns::endpoint::RecordType;
/// use svcdns::source::suitable_type;
///
/// assert_eq!(suitable_type("10.0.0.1"), RecordType::A);
/// assert_eq!(suitable_type("::1"), RecordType::AAAA);
/// assert_eq!(suitable_type("example.com"), RecordType::CNAME);
/// ```
#[must_use]
pub fn suitable_type(target: &str) -> RecordType {
    match target.parse::<IpAddr>() {
        Ok(IpAddr::V4(_)) => RecordType::A,
        Ok(IpAddr::V6(v6)) if v6.to_ipv4_mapped().is_some() => RecordType::A,
        Ok(IpAddr::V6(_)) => RecordType::AAAA,
        Err(_) => RecordType::CNAME,
    }
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod classify_tests;
