// # Load Balancer API Trait
//
// Defines the slice of the ELB (classic) and ELBv2 (network) APIs the
// alias resolver consumes.
//
// The two services differ in how tags are addressed: classic load balancers
// are keyed by name, network load balancers by ARN. `LoadBalancerKind::tag_key`
// captures that difference so the resolver does not branch on it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::route53::AliasTarget;

/// Which load-balancing service a resource belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadBalancerKind {
    /// Classic ELB
    Classic,
    /// ELBv2 network load balancer
    Network,
}

impl LoadBalancerKind {
    /// Service name used in logs and API errors
    pub fn service_name(&self) -> &'static str {
        match self {
            LoadBalancerKind::Classic => "elb",
            LoadBalancerKind::Network => "elbv2",
        }
    }

    /// Logical name of a load balancer of this kind, given its `Name` tag
    ///
    /// Network load balancer names cannot contain dots, so they are
    /// replaced with dashes. Idempotent.
    pub fn logical_name(&self, name_tag: &str) -> String {
        match self {
            LoadBalancerKind::Classic => name_tag.to_string(),
            LoadBalancerKind::Network => name_tag.replace('.', "-"),
        }
    }

    /// The key `describe_tags` expects for this kind of load balancer
    ///
    /// Returns `None` for a network load balancer without an ARN.
    pub fn tag_key<'a>(&self, lb: &'a LoadBalancerDescription) -> Option<&'a str> {
        match self {
            LoadBalancerKind::Classic => Some(lb.name.as_str()),
            LoadBalancerKind::Network => lb.arn.as_deref(),
        }
    }
}

impl fmt::Display for LoadBalancerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadBalancerKind::Classic => f.write_str("ELB"),
            LoadBalancerKind::Network => f.write_str("NLB"),
        }
    }
}

/// A load balancer as described by its service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerDescription {
    /// Load balancer name
    pub name: String,
    /// ARN (ELBv2 only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    /// Public DNS name
    pub dns_name: String,
    /// Hosted zone that alias records pointing at this load balancer must use
    pub canonical_hosted_zone_id: String,
}

/// A resource tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag key
    pub key: String,
    /// Tag value
    pub value: String,
}

impl Tag {
    /// Create a tag
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Look up a tag value by key
pub fn find_tag<'a>(tags: &'a [Tag], key: &str) -> Option<&'a str> {
    tags.iter()
        .find(|t| t.key == key)
        .map(|t| t.value.as_str())
}

/// Whether a load balancer is the one an alias target points at
///
/// The hosted-zone id must match exactly. DNS names are compared
/// case-insensitively without the trailing dot, and the alias may carry a
/// `dualstack.` prefix that the load balancer's own name lacks.
pub fn matches_alias(lb: &LoadBalancerDescription, alias: &AliasTarget) -> bool {
    if lb.canonical_hosted_zone_id != alias.hosted_zone_id {
        return false;
    }

    let want = alias.dns_name.trim_end_matches('.').to_ascii_lowercase();
    let have = lb.dns_name.trim_end_matches('.').to_ascii_lowercase();
    if have.is_empty() {
        return false;
    }

    want == have || want.strip_prefix("dualstack.") == Some(have.as_str())
}

/// Trait for a load-balancing service collaborator
///
/// One implementation per [`LoadBalancerKind`]. Like every collaborator, an
/// implementation makes one API call per method and returns failures
/// unretried.
#[async_trait]
pub trait LoadBalancerApi: Send + Sync {
    /// Which service this is
    fn kind(&self) -> LoadBalancerKind;

    /// Describe all load balancers visible to the caller
    async fn describe_load_balancers(&self) -> Result<Vec<LoadBalancerDescription>, crate::Error>;

    /// Describe tags for a set of load balancers
    ///
    /// # Parameters
    ///
    /// - `keys`: Load balancer names (classic) or ARNs (network)
    ///
    /// # Returns
    ///
    /// A map from each requested key to its tags. Keys with no tags may be absent.
    async fn describe_tags(
        &self,
        keys: &[String],
    ) -> Result<HashMap<String, Vec<Tag>>, crate::Error>;

    /// Find the load balancer an alias target points at
    ///
    /// Returns `Ok(None)` when no load balancer of this kind matches.
    async fn find_by_alias(
        &self,
        alias: &AliasTarget,
    ) -> Result<Option<LoadBalancerDescription>, crate::Error> {
        let lbs = self.describe_load_balancers().await?;
        Ok(lbs.into_iter().find(|lb| matches_alias(lb, alias)))
    }
}
