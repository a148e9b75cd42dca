use serde::{Deserialize, Serialize};

use crate::render::{cloudformation, terraform};

/// Terraform resource type of a hosted zone
pub const TERRAFORM_ZONE_TYPE: &str = "aws_route53_zone";

/// CloudFormation resource type of a hosted zone
pub const CLOUDFORMATION_ZONE_TYPE: &str = "AWS::Route53::HostedZone";

/// Handle to the hosted zone a record lives in
///
/// A zone without a `zone_id` has not been created yet; discovery cannot
/// run against it. A `shared` zone is managed outside this tool, so
/// generated configuration refers to it by literal id instead of by resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsZone {
    /// Zone DNS name
    pub name: String,
    /// Hosted zone id, once known
    #[serde(default)]
    pub zone_id: Option<String>,
    /// Whether the zone is owned by another tool
    #[serde(default)]
    pub shared: bool,
}

impl DnsZone {
    /// Create a zone handle with no known id
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            zone_id: None,
            shared: false,
        }
    }

    /// Set the hosted zone id
    pub fn with_zone_id(mut self, zone_id: impl Into<String>) -> Self {
        self.zone_id = Some(zone_id.into());
        self
    }

    /// Mark the zone as managed elsewhere
    pub fn with_shared(mut self, shared: bool) -> Self {
        self.shared = shared;
        self
    }

    /// Non-empty hosted zone id, if known
    pub fn id(&self) -> Option<&str> {
        self.zone_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Terraform value for `zone_id` fields of records in this zone
    pub fn terraform_link(&self) -> terraform::Literal {
        match (self.shared, self.id()) {
            (true, Some(id)) => terraform::Literal::from_string(id),
            _ => terraform::Literal::property(TERRAFORM_ZONE_TYPE, &self.name, "zone_id"),
        }
    }

    /// CloudFormation value for `HostedZoneId` properties of records in this zone
    pub fn cloudformation_link(&self) -> cloudformation::Literal {
        match (self.shared, self.id()) {
            (true, Some(id)) => cloudformation::Literal::from_string(id),
            _ => cloudformation::Literal::reference(CLOUDFORMATION_ZONE_TYPE, &self.name),
        }
    }
}
