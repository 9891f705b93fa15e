// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for svcdns.
//!
//! Annotation keys are a compatibility surface shared with other DNS
//! controllers and must not change.

// ============================================================================
// Annotation Keys
// ============================================================================

/// Comma-separated list of public hostnames for a Service
pub const HOSTNAME_ANNOTATION: &str = "external-dns.alpha.kubernetes.io/hostname";

/// Comma-separated list of hostnames that always resolve to the cluster IP
pub const INTERNAL_HOSTNAME_ANNOTATION: &str = "external-dns.alpha.kubernetes.io/internal-hostname";

/// Explicit target override (Service or Pod)
pub const TARGET_ANNOTATION: &str = "external-dns.alpha.kubernetes.io/target";

/// Record TTL, either integer seconds or a duration like `1m30s`
pub const TTL_ANNOTATION: &str = "external-dns.alpha.kubernetes.io/ttl";

/// NodePort address preference (`public` or `private`)
pub const ACCESS_ANNOTATION: &str = "external-dns.alpha.kubernetes.io/access";

/// Discriminator for multiple record sets at the same name and type
pub const SET_IDENTIFIER_ANNOTATION: &str = "external-dns.alpha.kubernetes.io/set-identifier";

/// Names the controller responsible for a Service
pub const CONTROLLER_ANNOTATION: &str = "external-dns.alpha.kubernetes.io/controller";

/// Address source for headless Services (`NodeExternalIP` or `HostIP`)
pub const ENDPOINTS_TYPE_ANNOTATION: &str = "external-dns.alpha.kubernetes.io/endpoints-type";

/// Requests an alias record from providers that support it
pub const ALIAS_ANNOTATION: &str = "external-dns.alpha.kubernetes.io/alias";

/// Cloudflare proxy toggle, passed through verbatim as provider-specific data
pub const CLOUDFLARE_PROXIED_ANNOTATION: &str = "external-dns.alpha.kubernetes.io/cloudflare-proxied";

/// AWS provider-specific prefix, mapped to `aws/<attr>`
pub const AWS_ANNOTATION_PREFIX: &str = "external-dns.alpha.kubernetes.io/aws-";

/// Scaleway provider-specific prefix, mapped to `scw/<attr>`
pub const SCW_ANNOTATION_PREFIX: &str = "external-dns.alpha.kubernetes.io/scw-";

/// IBM Cloud provider-specific prefix, mapped to `ibmcloud-<attr>`
pub const IBMCLOUD_ANNOTATION_PREFIX: &str = "external-dns.alpha.kubernetes.io/ibmcloud-";

// ============================================================================
// Annotation Values
// ============================================================================

/// Controller annotation value identifying this system
pub const CONTROLLER_ANNOTATION_VALUE: &str = "dns-controller";

/// `endpoints-type` value selecting Node external addresses
pub const ENDPOINTS_TYPE_NODE_EXTERNAL_IP: &str = "NodeExternalIP";

/// `endpoints-type` value selecting the Pod host IP
pub const ENDPOINTS_TYPE_HOST_IP: &str = "HostIP";

/// `access` value preferring external node addresses
pub const ACCESS_PUBLIC: &str = "public";

/// `access` value preferring internal node addresses
pub const ACCESS_PRIVATE: &str = "private";

// ============================================================================
// Legacy Compatibility
// ============================================================================

/// Compatibility mode reading `zalando.org/dnsname`
pub const COMPATIBILITY_MATE: &str = "mate";

/// Compatibility mode reading `domainName` on `dns=route53` Services
pub const COMPATIBILITY_MOLECULE: &str = "molecule";

/// Compatibility mode reading the kops dns-controller annotations
pub const COMPATIBILITY_KOPS_DNS_CONTROLLER: &str = "kops-dns-controller";

/// Hostname annotation used by mate
pub const MATE_ANNOTATION: &str = "zalando.org/dnsname";

/// Hostname annotation used by molecule
pub const MOLECULE_ANNOTATION: &str = "domainName";

/// Label key/value molecule requires on a Service
pub const MOLECULE_LABEL_KEY: &str = "dns";
pub const MOLECULE_LABEL_VALUE: &str = "route53";

/// kops dns-controller annotation for names resolving to internal node addresses
pub const KOPS_INTERNAL_ANNOTATION: &str = "dns.alpha.kubernetes.io/internal";

/// kops dns-controller annotation for names resolving to external node addresses
pub const KOPS_EXTERNAL_ANNOTATION: &str = "dns.alpha.kubernetes.io/external";

// ============================================================================
// Kubernetes Constants
// ============================================================================

/// Cluster IP sentinel marking a headless Service
pub const CLUSTER_IP_NONE: &str = "None";

/// Service types accepted by the type filter
pub const SERVICE_TYPE_CLUSTER_IP: &str = "ClusterIP";
pub const SERVICE_TYPE_NODE_PORT: &str = "NodePort";
pub const SERVICE_TYPE_LOAD_BALANCER: &str = "LoadBalancer";
pub const SERVICE_TYPE_EXTERNAL_NAME: &str = "ExternalName";

/// External traffic policy restricting NodePort traffic to local backends
pub const TRAFFIC_POLICY_LOCAL: &str = "Local";

/// Pod phase for running Pods
pub const POD_PHASE_RUNNING: &str = "Running";

/// Pod condition type for readiness
pub const POD_CONDITION_READY: &str = "Ready";

/// Node address types
pub const NODE_EXTERNAL_IP: &str = "ExternalIP";
pub const NODE_INTERNAL_IP: &str = "InternalIP";

/// Endpoints target reference kind for Pods
pub const TARGET_REF_KIND_POD: &str = "Pod";

/// Protocol used for SRV names when a port declares none
pub const DEFAULT_SRV_PROTOCOL: &str = "tcp";

// ============================================================================
// SRV Constants
// ============================================================================

/// SRV priority for synthesized records
pub const SRV_PRIORITY: u16 = 0;

/// SRV weight for synthesized records
pub const SRV_WEIGHT: u16 = 50;

// ============================================================================
// TTL Bounds
// ============================================================================

/// Smallest TTL accepted from annotations
pub const TTL_MINIMUM: i64 = 1;

/// Largest TTL accepted from annotations
pub const TTL_MAXIMUM: i64 = i32::MAX as i64;

// ============================================================================
// Runtime Defaults
// ============================================================================

/// Default interval between full passes when no change arrives (seconds)
pub const DEFAULT_PASS_INTERVAL_SECS: u64 = 60;

/// Delay before retrying a failed reflector stream (seconds)
pub const REFLECTOR_RETRY_DELAY_SECS: u64 = 5;
