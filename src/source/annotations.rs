// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Typed extraction of the annotations that steer record generation.
//!
//! Each function reads one documented key from an annotation map and returns
//! a typed value. Nothing outside this module indexes annotation maps with
//! `external-dns` keys.

use crate::constants::{
    ACCESS_ANNOTATION, ACCESS_PRIVATE, ACCESS_PUBLIC, ALIAS_ANNOTATION, AWS_ANNOTATION_PREFIX,
    CLOUDFLARE_PROXIED_ANNOTATION, CONTROLLER_ANNOTATION, ENDPOINTS_TYPE_ANNOTATION,
    ENDPOINTS_TYPE_HOST_IP, ENDPOINTS_TYPE_NODE_EXTERNAL_IP, HOSTNAME_ANNOTATION,
    IBMCLOUD_ANNOTATION_PREFIX, INTERNAL_HOSTNAME_ANNOTATION, SCW_ANNOTATION_PREFIX,
    SET_IDENTIFIER_ANNOTATION, TARGET_ANNOTATION, TTL_ANNOTATION, TTL_MAXIMUM, TTL_MINIMUM,
};
use crate::endpoint::{ProviderSpecific, ProviderSpecificProperty, Ttl};
use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use tracing::warn;

const NANOS_PER_SECOND: f64 = 1e9;

/// NodePort address preference from the `access` annotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessScope {
    Public,
    Private,
    Unset,
}

/// Address source for headless Services from the `endpoints-type` annotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndpointsType {
    Default,
    NodeExternalIP,
    HostIP,
}

/// Public hostnames, from a comma-separated annotation.
#[must_use]
pub fn hostnames(annotations: &BTreeMap<String, String>) -> Vec<String> {
    split_list(annotations.get(HOSTNAME_ANNOTATION))
}

/// Hostnames that always point at the cluster IP.
#[must_use]
pub fn internal_hostnames(annotations: &BTreeMap<String, String>) -> Vec<String> {
    split_list(annotations.get(INTERNAL_HOSTNAME_ANNOTATION))
}

/// Explicit target override, trailing dots removed.
#[must_use]
pub fn targets(annotations: &BTreeMap<String, String>) -> Vec<String> {
    split_list(annotations.get(TARGET_ANNOTATION))
        .into_iter()
        .map(|t| t.trim_end_matches('.').to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// The controller a Service is assigned to, if any.
#[must_use]
pub fn controller(annotations: &BTreeMap<String, String>) -> Option<&str> {
    annotations.get(CONTROLLER_ANNOTATION).map(String::as_str)
}

/// Provider-specific properties and the set identifier.
///
/// Properties are ordered: Cloudflare proxy flag, alias flag, then prefixed
/// provider keys in key order.
#[must_use]
pub fn provider_specific_and_set_identifier(
    annotations: &BTreeMap<String, String>,
) -> (ProviderSpecific, String) {
    let mut properties = ProviderSpecific::new();

    if let Some(proxied) = annotations.get(CLOUDFLARE_PROXIED_ANNOTATION) {
        properties.push(ProviderSpecificProperty {
            name: CLOUDFLARE_PROXIED_ANNOTATION.to_string(),
            value: proxied.clone(),
        });
    }
    if annotations.get(ALIAS_ANNOTATION).map(String::as_str) == Some("true") {
        properties.push(ProviderSpecificProperty {
            name: "alias".to_string(),
            value: "true".to_string(),
        });
    }

    let mut set_identifier = String::new();
    for (key, value) in annotations {
        if key == SET_IDENTIFIER_ANNOTATION {
            set_identifier.clone_from(value);
        } else if let Some(attr) = key.strip_prefix(AWS_ANNOTATION_PREFIX) {
            properties.push(ProviderSpecificProperty {
                name: format!("aws/{attr}"),
                value: value.clone(),
            });
        } else if let Some(attr) = key.strip_prefix(SCW_ANNOTATION_PREFIX) {
            properties.push(ProviderSpecificProperty {
                name: format!("scw/{attr}"),
                value: value.clone(),
            });
        } else if let Some(attr) = key.strip_prefix(IBMCLOUD_ANNOTATION_PREFIX) {
            properties.push(ProviderSpecificProperty {
                name: format!("ibmcloud-{attr}"),
                value: value.clone(),
            });
        }
    }

    (properties, set_identifier)
}

/// TTL from the `ttl` annotation.
///
/// Absent values are unconfigured. Invalid or out-of-range values are logged
/// against `resource` and also treated as unconfigured.
#[must_use]
pub fn ttl(annotations: &BTreeMap<String, String>, resource: &str) -> Ttl {
    let Some(raw) = annotations.get(TTL_ANNOTATION) else {
        return Ttl::UNCONFIGURED;
    };
    match parse_ttl(raw) {
        Ok(seconds) => Ttl::seconds(seconds),
        Err(e) => {
            warn!(resource, value = %raw, error = %e, "Ignoring invalid TTL annotation");
            Ttl::UNCONFIGURED
        }
    }
}

/// NodePort address preference.
#[must_use]
pub fn access_scope(annotations: &BTreeMap<String, String>) -> AccessScope {
    match annotations.get(ACCESS_ANNOTATION).map(String::as_str) {
        Some(ACCESS_PUBLIC) => AccessScope::Public,
        Some(ACCESS_PRIVATE) => AccessScope::Private,
        _ => AccessScope::Unset,
    }
}

/// Address source for headless Services.
#[must_use]
pub fn endpoints_type(annotations: &BTreeMap<String, String>) -> EndpointsType {
    match annotations.get(ENDPOINTS_TYPE_ANNOTATION).map(String::as_str) {
        Some(ENDPOINTS_TYPE_NODE_EXTERNAL_IP) => EndpointsType::NodeExternalIP,
        Some(ENDPOINTS_TYPE_HOST_IP) => EndpointsType::HostIP,
        _ => EndpointsType::Default,
    }
}

/// Split a comma-separated annotation, trimming entries and dropping empties.
pub(crate) fn split_list(value: Option<&String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Parse a TTL given as a duration (`90s`, `1h30m`) or as integer seconds.
///
/// Durations are truncated to whole seconds.
///
/// # Errors
///
/// Returns an error if the value is neither form or falls outside
/// `[1, 2147483647]` seconds.
pub fn parse_ttl(value: &str) -> Result<u32> {
    let seconds = match parse_duration_nanos(value) {
        Ok(nanos) => (nanos / NANOS_PER_SECOND).trunc() as i64,
        Err(_) => value
            .parse::<i64>()
            .with_context(|| format!("'{value}' is neither a duration nor an integer"))?,
    };

    if !(TTL_MINIMUM..=TTL_MAXIMUM).contains(&seconds) {
        bail!("TTL value must be between [{TTL_MINIMUM}, {TTL_MAXIMUM}], got {seconds}");
    }
    u32::try_from(seconds).context("TTL value out of range")
}

/// Parse a Go-style duration (`300ms`, `1.5h`, `2h45m`) into nanoseconds.
fn parse_duration_nanos(value: &str) -> Result<f64> {
    let (negative, mut rest) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };
    if rest == "0" {
        return Ok(0.0);
    }
    if rest.is_empty() {
        bail!("Duration string cannot be empty");
    }

    let mut total = 0.0;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .context("Duration must end with a unit")?;
        if number_end == 0 {
            bail!("Duration '{value}' is missing a number");
        }
        let number: f64 = rest[..number_end]
            .parse()
            .with_context(|| format!("Invalid number in duration '{value}'"))?;
        rest = &rest[number_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_end] {
            "ns" => 1.0,
            "us" | "\u{b5}s" | "\u{3bc}s" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            unit => bail!("Unknown unit '{unit}' in duration '{value}'"),
        };
        total += number * scale;
        rest = &rest[unit_end..];
    }

    Ok(if negative { -total } else { total })
}

#[cfg(test)]
#[path = "annotations_tests.rs"]
mod annotations_tests;
