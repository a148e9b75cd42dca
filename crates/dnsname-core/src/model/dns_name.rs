// # DNS Name
//
// A DNS alias record intent. Within one reconciliation pass the engine:
//
// 1. calls `find` to discover the record's actual state,
// 2. diffs actual against desired with `DnsNameChanges::between`,
// 3. validates with `check_changes`,
// 4. calls exactly one `render_*` for the configured backend.
//
// The three document/API renderers are projections of the same fields; the
// alias sub-object always carries the target's DNS name and hosted-zone id
// with health evaluation disabled, only the literal form differs.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::{DnsTarget, DnsZone, Lifecycle};
use crate::discovery;
use crate::engine::{Context, Delta};
use crate::error::{Error, Result};
use crate::render::{
    AwsApiTarget, Backend, CloudformationTarget, DryRunTarget, PlannedChange, ReferenceLiteral,
    TerraformTarget, cloudformation, terraform,
};
use crate::resolver;
use crate::traits::{AliasTarget, Change, ChangeBatch, ResourceRecordSet};

/// Terraform resource type of a record
pub const TERRAFORM_RECORD_TYPE: &str = "aws_route53_record";

/// CloudFormation resource type of a record
pub const CLOUDFORMATION_RECORD_TYPE: &str = "AWS::Route53::RecordSet";

/// DNS alias record intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsName {
    /// Record name; required when the record does not exist yet
    pub name: String,
    /// Record type (A, AAAA, ...); required for discovery
    pub resource_type: String,
    /// Hosted zone the record lives in
    pub zone: Option<DnsZone>,
    /// Load balancer the alias points at
    pub target_load_balancer: Option<DnsTarget>,
    /// How differences are handled
    pub lifecycle: Lifecycle,
}

/// Fields that differ between the actual and desired record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DnsNameChanges {
    /// Record name differs
    pub name: bool,
    /// Record type differs
    pub resource_type: bool,
    /// Hosted zone differs
    pub zone: bool,
    /// Alias target differs
    pub target_load_balancer: bool,
}

impl DnsNameChanges {
    /// Diff actual against desired
    ///
    /// With no actual record, every field set on the desired record counts
    /// as changed. Targets are compared by identity (kind and logical
    /// name), never by their resolved alias coordinates.
    pub fn between(actual: Option<&DnsName>, expected: &DnsName) -> Self {
        let Some(a) = actual else {
            return Self {
                name: !expected.name.is_empty(),
                resource_type: !expected.resource_type.is_empty(),
                zone: expected.zone.is_some(),
                target_load_balancer: expected.target_load_balancer.is_some(),
            };
        };

        let zone_name = |z: &Option<DnsZone>| z.as_ref().map(|z| z.name.clone());
        let target_changed = match (&a.target_load_balancer, &expected.target_load_balancer) {
            (None, None) => false,
            (Some(have), Some(want)) => !have.same_identity(want),
            _ => true,
        };

        Self {
            name: a.name != expected.name,
            resource_type: a.resource_type != expected.resource_type,
            zone: zone_name(&a.zone) != zone_name(&expected.zone),
            target_load_balancer: target_changed,
        }
    }

    /// Whether nothing differs
    pub fn is_empty(&self) -> bool {
        self.changed_fields().is_empty()
    }

    /// Names of the differing fields
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.name {
            fields.push("Name");
        }
        if self.resource_type {
            fields.push("ResourceType");
        }
        if self.zone {
            fields.push("Zone");
        }
        if self.target_load_balancer {
            fields.push("TargetLoadBalancer");
        }
        fields
    }
}

#[derive(Debug, Serialize)]
struct TerraformRoute53Record {
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    zone_id: terraform::Literal,
    #[serde(skip_serializing_if = "Option::is_none")]
    alias: Option<TerraformAlias>,
}

#[derive(Debug, Serialize)]
struct TerraformAlias {
    name: terraform::Literal,
    zone_id: terraform::Literal,
    evaluate_target_health: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CloudformationRoute53Record {
    name: String,
    #[serde(rename = "Type")]
    record_type: String,
    hosted_zone_id: cloudformation::Literal,
    #[serde(skip_serializing_if = "Option::is_none")]
    alias_target: Option<CloudformationAlias>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CloudformationAlias {
    #[serde(rename = "DNSName")]
    dns_name: cloudformation::Literal,
    hosted_zone_id: cloudformation::Literal,
    evaluate_target_health: bool,
}

impl DnsName {
    /// Create an intent with no zone or target
    pub fn new(name: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resource_type: resource_type.into(),
            zone: None,
            target_load_balancer: None,
            lifecycle: Lifecycle::Sync,
        }
    }

    /// Set the hosted zone
    pub fn with_zone(mut self, zone: DnsZone) -> Self {
        self.zone = Some(zone);
        self
    }

    /// Set the alias target
    pub fn with_target(mut self, target: DnsTarget) -> Self {
        self.target_load_balancer = Some(target);
        self
    }

    /// Set the lifecycle
    pub fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    /// Discover the record's actual state
    ///
    /// Returns `Ok(None)` without calling the cloud when the zone id, name
    /// or type is unset: an unreconciled record is not a failure.
    pub async fn find(&self, ctx: &Context) -> Result<Option<DnsName>> {
        let cloud = ctx.cloud();

        let Some(zone_id) = self.zone.as_ref().and_then(DnsZone::id) else {
            debug!("Zone / ZoneID not found for {:?}, skipping Find", self.name);
            return Ok(None);
        };

        if self.name.is_empty() || self.resource_type.is_empty() {
            return Ok(None);
        }

        let Some(found) =
            discovery::find_record_set(cloud.route53(), zone_id, &self.name, &self.resource_type)
                .await?
        else {
            return Ok(None);
        };

        let mut actual = DnsName {
            name: self.name.clone(),
            resource_type: self.resource_type.clone(),
            zone: self.zone.clone(),
            target_load_balancer: None,
            lifecycle: self.lifecycle,
        };

        if let Some(alias) = &found.alias_target {
            info!("AliasTarget for {:?} is {:?}", found.name, alias.dns_name);
            if alias.dns_name.is_empty() {
                warn!("AliasTarget for {:?} has no DNS name, leaving target unresolved", found.name);
            } else {
                actual.target_load_balancer =
                    resolver::find_dns_target(cloud, alias, &alias.dns_name, &self.name).await?;
            }
        }

        Ok(Some(actual))
    }

    /// Validate a planned change
    ///
    /// Only the create path is checked: a record that does not exist yet
    /// must have a name.
    pub fn check_changes(
        actual: Option<&DnsName>,
        expected: &DnsName,
        _changes: &DnsNameChanges,
    ) -> Result<()> {
        if actual.is_none() && expected.name.is_empty() {
            return Err(Error::required_field("Name"));
        }
        Ok(())
    }

    fn hosted_zone_id(&self) -> Result<&str> {
        self.zone.as_ref().and_then(DnsZone::id).ok_or_else(|| {
            Error::invalid_input(format!("DNS record {:?} has no hosted zone id", self.name))
        })
    }

    fn require_zone(&self, backend: Backend) -> Result<&DnsZone> {
        self.zone.as_ref().ok_or_else(|| {
            Error::render(&self.name, backend, "record has no hosted zone")
        })
    }

    /// The UPSERT batch live rendering submits
    ///
    /// Pure: the same intent always yields an identical batch.
    pub fn live_change_batch(&self) -> Result<ChangeBatch> {
        let mut rrs = ResourceRecordSet::new(&self.name, &self.resource_type);

        if let Some(target) = &self.target_load_balancer {
            let (Some(dns_name), Some(hosted_zone_id)) =
                (target.dns_name(), target.hosted_zone_id())
            else {
                return Err(Error::render(
                    &self.name,
                    Backend::Live,
                    format!(
                        "target {} {:?} has no resolved DNS name / hosted zone id",
                        target.kind(),
                        target.name()
                    ),
                ));
            };
            rrs = rrs.with_alias_target(AliasTarget::new(dns_name, hosted_zone_id));
        }

        Ok(ChangeBatch::single(Change::upsert(rrs)))
    }

    /// Apply the record to Route 53 with an UPSERT
    ///
    /// A target configured by name only is resolved through its load
    /// balancer's `Name` tag first.
    pub async fn render_aws(
        t: &mut AwsApiTarget,
        _a: Option<&DnsName>,
        e: &DnsName,
        _changes: &DnsNameChanges,
    ) -> Result<()> {
        let hosted_zone_id = e
            .hosted_zone_id()
            .map_err(|err| Error::render(&e.name, Backend::Live, err.to_string()))?;

        let mut intent = e.clone();
        if let Some(target) = intent.target_load_balancer.take() {
            let resolved = resolver::resolve_target(t.cloud(), target)
                .await
                .map_err(|err| Error::render(&e.name, Backend::Live, err.to_string()))?;
            intent.target_load_balancer = Some(resolved);
        }
        let batch = intent.live_change_batch()?;

        info!("Updating DNS record {:?}", e.name);

        let change = t
            .submit(hosted_zone_id, &batch)
            .await
            .map_err(|err| Error::render(&e.name, Backend::Live, err.to_string()))?;

        info!("Change id is {:?}", change.id);
        Ok(())
    }

    /// Record what a live run would do
    pub fn render_dry_run(
        t: &mut DryRunTarget,
        delta: Delta,
        e: &DnsName,
        changes: &DnsNameChanges,
    ) -> Result<()> {
        t.record(PlannedChange {
            record: e.name.clone(),
            delta,
            changed_fields: changes.changed_fields(),
        });
        Ok(())
    }

    /// Emit the record as a Terraform `aws_route53_record`
    pub fn render_terraform(
        t: &mut TerraformTarget,
        _a: Option<&DnsName>,
        e: &DnsName,
        _changes: &DnsNameChanges,
    ) -> Result<()> {
        let zone = e.require_zone(Backend::Terraform)?;

        let tf = TerraformRoute53Record {
            name: e.name.clone(),
            record_type: e.resource_type.clone(),
            zone_id: zone.terraform_link(),
            alias: e.target_load_balancer.as_ref().map(|target| TerraformAlias {
                name: target.terraform_link("dns_name"),
                zone_id: target.terraform_link("zone_id"),
                evaluate_target_health: false,
            }),
        };

        t.render_resource(TERRAFORM_RECORD_TYPE, &e.name, &tf)
            .map_err(|err| Error::render(&e.name, Backend::Terraform, err.to_string()))
    }

    /// Emit the record as a CloudFormation `AWS::Route53::RecordSet`
    pub fn render_cloudformation(
        t: &mut CloudformationTarget,
        _a: Option<&DnsName>,
        e: &DnsName,
        _changes: &DnsNameChanges,
    ) -> Result<()> {
        let zone = e.require_zone(Backend::CloudFormation)?;

        let cf = CloudformationRoute53Record {
            name: e.name.clone(),
            record_type: e.resource_type.clone(),
            hosted_zone_id: zone.cloudformation_link(),
            alias_target: e.target_load_balancer.as_ref().map(|target| CloudformationAlias {
                dns_name: target.cloudformation_attr_dns_name(),
                hosted_zone_id: target.cloudformation_attr_canonical_hosted_zone_name_id(),
                evaluate_target_health: false,
            }),
        };

        t.render_resource(CLOUDFORMATION_RECORD_TYPE, &e.name, &cf)
            .map_err(|err| Error::render(&e.name, Backend::CloudFormation, err.to_string()))
    }

    /// Terraform reference to this record
    pub fn terraform_link(&self) -> terraform::Literal {
        terraform::Literal::self_link(TERRAFORM_RECORD_TYPE, &self.name)
    }

    /// CloudFormation reference to this record
    pub fn cloudformation_link(&self) -> cloudformation::Literal {
        cloudformation::Literal::reference(CLOUDFORMATION_RECORD_TYPE, &self.name)
    }

    /// Reference to this record in the given backend
    pub fn self_reference(&self, backend: Backend) -> ReferenceLiteral {
        match backend {
            Backend::Live | Backend::DryRun => ReferenceLiteral::Name(self.name.clone()),
            Backend::Terraform => ReferenceLiteral::Terraform(self.terraform_link()),
            Backend::CloudFormation => ReferenceLiteral::CloudFormation(self.cloudformation_link()),
        }
    }
}
