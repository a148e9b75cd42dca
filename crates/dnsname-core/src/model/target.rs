// # DNS Target
//
// What currently answers for an alias record. Exactly two kinds exist, so
// this is a closed enum rather than a trait: adding a third kind is a
// deliberate change that must touch every render backend.

use serde::{Deserialize, Serialize};

use crate::render::{cloudformation, terraform};
use crate::traits::LoadBalancerKind;

/// Identity of a load balancer, plus its alias coordinates once known
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerRef {
    /// Logical name, recovered from the `Name` tag
    pub name: String,
    /// Public DNS name
    #[serde(default)]
    pub dns_name: Option<String>,
    /// Canonical hosted zone id
    #[serde(default)]
    pub hosted_zone_id: Option<String>,
}

impl LoadBalancerRef {
    /// A reference by logical name only
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dns_name: None,
            hosted_zone_id: None,
        }
    }

    /// Set the alias coordinates
    pub fn with_alias(
        mut self,
        dns_name: impl Into<String>,
        hosted_zone_id: impl Into<String>,
    ) -> Self {
        self.dns_name = Some(dns_name.into());
        self.hosted_zone_id = Some(hosted_zone_id.into());
        self
    }
}

/// The load balancer an alias record points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DnsTarget {
    /// Classic ELB
    ClassicLoadBalancer(LoadBalancerRef),
    /// ELBv2 network load balancer
    NetworkLoadBalancer(LoadBalancerRef),
}

impl DnsTarget {
    /// Build a target of the given kind
    pub fn new(kind: LoadBalancerKind, lb: LoadBalancerRef) -> Self {
        match kind {
            LoadBalancerKind::Classic => DnsTarget::ClassicLoadBalancer(lb),
            LoadBalancerKind::Network => DnsTarget::NetworkLoadBalancer(lb),
        }
    }

    /// Which service the load balancer belongs to
    pub fn kind(&self) -> LoadBalancerKind {
        match self {
            DnsTarget::ClassicLoadBalancer(_) => LoadBalancerKind::Classic,
            DnsTarget::NetworkLoadBalancer(_) => LoadBalancerKind::Network,
        }
    }

    fn lb(&self) -> &LoadBalancerRef {
        match self {
            DnsTarget::ClassicLoadBalancer(lb) | DnsTarget::NetworkLoadBalancer(lb) => lb,
        }
    }

    /// Logical name
    pub fn name(&self) -> &str {
        &self.lb().name
    }

    /// Public DNS name, if resolved
    pub fn dns_name(&self) -> Option<&str> {
        self.lb().dns_name.as_deref().filter(|s| !s.is_empty())
    }

    /// Canonical hosted zone id, if resolved
    pub fn hosted_zone_id(&self) -> Option<&str> {
        self.lb().hosted_zone_id.as_deref().filter(|s| !s.is_empty())
    }

    /// Whether two targets name the same load balancer
    ///
    /// Alias coordinates are ignored: a desired target usually carries none,
    /// while a discovered one always does. Names are compared in their
    /// logical form, so a dotted network name matches its dashed form.
    pub fn same_identity(&self, other: &DnsTarget) -> bool {
        let kind = self.kind();
        kind == other.kind() && kind.logical_name(self.name()) == kind.logical_name(other.name())
    }

    /// Replace the alias coordinates, keeping the identity
    pub fn with_alias(
        self,
        dns_name: impl Into<String>,
        hosted_zone_id: impl Into<String>,
    ) -> Self {
        let kind = self.kind();
        let lb = match self {
            DnsTarget::ClassicLoadBalancer(lb) | DnsTarget::NetworkLoadBalancer(lb) => lb,
        };
        DnsTarget::new(kind, lb.with_alias(dns_name, hosted_zone_id))
    }

    /// Terraform resource type of the load balancer
    pub fn terraform_type(&self) -> &'static str {
        match self {
            DnsTarget::ClassicLoadBalancer(_) => "aws_elb",
            DnsTarget::NetworkLoadBalancer(_) => "aws_lb",
        }
    }

    /// CloudFormation resource type of the load balancer
    pub fn cloudformation_type(&self) -> &'static str {
        match self {
            DnsTarget::ClassicLoadBalancer(_) => "AWS::ElasticLoadBalancing::LoadBalancer",
            DnsTarget::NetworkLoadBalancer(_) => "AWS::ElasticLoadBalancingV2::LoadBalancer",
        }
    }

    /// Terraform reference to an attribute of the load balancer
    pub fn terraform_link(&self, attribute: &str) -> terraform::Literal {
        terraform::Literal::property(self.terraform_type(), self.name(), attribute)
    }

    /// CloudFormation reference to the load balancer's DNS name
    pub fn cloudformation_attr_dns_name(&self) -> cloudformation::Literal {
        cloudformation::Literal::get_att(self.cloudformation_type(), self.name(), "DNSName")
    }

    /// CloudFormation reference to the load balancer's canonical hosted zone id
    ///
    /// The attribute is spelled differently by the two services.
    pub fn cloudformation_attr_canonical_hosted_zone_name_id(&self) -> cloudformation::Literal {
        let attribute = match self {
            DnsTarget::ClassicLoadBalancer(_) => "CanonicalHostedZoneNameID",
            DnsTarget::NetworkLoadBalancer(_) => "CanonicalHostedZoneID",
        };
        cloudformation::Literal::get_att(self.cloudformation_type(), self.name(), attribute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_links() {
        let target = DnsTarget::ClassicLoadBalancer(LoadBalancerRef::named("api.cluster1.example.com"));
        assert_eq!(
            target.terraform_link("dns_name").value(),
            "${aws_elb.api-cluster1-example-com.dns_name}"
        );
        assert_eq!(
            target.cloudformation_attr_canonical_hosted_zone_name_id(),
            cloudformation::Literal::GetAtt {
                logical_id: "AWSElasticLoadBalancingLoadBalancerapicluster1examplecom".to_string(),
                attribute: "CanonicalHostedZoneNameID".to_string(),
            }
        );
    }

    #[test]
    fn test_network_links() {
        let target = DnsTarget::NetworkLoadBalancer(LoadBalancerRef::named("api-cluster1-example-com"));
        assert_eq!(
            target.terraform_link("zone_id").value(),
            "${aws_lb.api-cluster1-example-com.zone_id}"
        );
        assert_eq!(
            target.cloudformation_attr_canonical_hosted_zone_name_id(),
            cloudformation::Literal::GetAtt {
                logical_id: "AWSElasticLoadBalancingV2LoadBalancerapicluster1examplecom".to_string(),
                attribute: "CanonicalHostedZoneID".to_string(),
            }
        );
    }

    #[test]
    fn test_same_identity_ignores_alias_coordinates() {
        let desired = DnsTarget::ClassicLoadBalancer(LoadBalancerRef::named("api"));
        let found = DnsTarget::ClassicLoadBalancer(
            LoadBalancerRef::named("api").with_alias("lb1.elb.amazonaws.com", "ZABC"),
        );
        let other_kind = DnsTarget::NetworkLoadBalancer(LoadBalancerRef::named("api"));

        assert!(desired.same_identity(&found));
        assert!(!desired.same_identity(&other_kind));
    }

    #[test]
    fn test_same_identity_normalizes_network_names() {
        let dotted = DnsTarget::NetworkLoadBalancer(LoadBalancerRef::named("api.cluster1.example.com"));
        let dashed = DnsTarget::NetworkLoadBalancer(LoadBalancerRef::named("api-cluster1-example-com"));
        assert!(dotted.same_identity(&dashed));

        let classic = DnsTarget::ClassicLoadBalancer(LoadBalancerRef::named("api.cluster1.example.com"));
        let classic_dashed =
            DnsTarget::ClassicLoadBalancer(LoadBalancerRef::named("api-cluster1-example-com"));
        assert!(!classic.same_identity(&classic_dashed));
    }

    #[test]
    fn test_with_alias_keeps_identity() {
        let target = DnsTarget::NetworkLoadBalancer(LoadBalancerRef::named("api"))
            .with_alias("nlb.elb.amazonaws.com", "ZNLB");
        assert_eq!(target.kind(), LoadBalancerKind::Network);
        assert_eq!(target.name(), "api");
        assert_eq!(target.dns_name(), Some("nlb.elb.amazonaws.com"));
        assert_eq!(target.hosted_zone_id(), Some("ZNLB"));
    }

    #[test]
    fn test_blank_alias_coordinates_are_unresolved() {
        let target = DnsTarget::ClassicLoadBalancer(LoadBalancerRef::named("api").with_alias("", ""));
        assert_eq!(target.dns_name(), None);
        assert_eq!(target.hosted_zone_id(), None);
    }
}
