//! Alias target resolution
//!
//! An alias record only carries a DNS name and hosted-zone id; it does not
//! say which service the aliased load balancer belongs to, and the DNS names
//! of classic and network load balancers share the `.elb.` substring. So
//! both services are probed in a fixed order, classic first, and the first
//! hit wins.
//!
//! A hit whose load balancer has no `Name` tag is an error, not a miss:
//! without the tag there is no stable logical name to render references
//! against.
//!
//! The reverse direction, from a configured target name to the load
//! balancer's alias coordinates, goes through the same `Name` tag.

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{DnsTarget, LoadBalancerRef};
use crate::traits::{
    AliasTarget, AwsCloud, LoadBalancerApi, LoadBalancerDescription, LoadBalancerKind, find_tag,
};

/// Tag holding a load balancer's logical name
pub const NAME_TAG: &str = "Name";

/// Resolve an alias target to the load balancer that answers for it
///
/// # Parameters
///
/// - `alias`: Alias target of the discovered record set
/// - `dns_name`: The alias DNS name, for diagnostics
/// - `record_name`: The desired record name, for diagnostics
///
/// # Returns
///
/// - `Ok(Some(target))`: The classic or network load balancer behind the alias
/// - `Ok(None)`: Neither service knows the alias; it may point at something not modelled here
/// - `Err(Error)`: A lookup failed, or the load balancer has no `Name` tag
pub async fn find_dns_target(
    cloud: &AwsCloud,
    alias: &AliasTarget,
    dns_name: &str,
    record_name: &str,
) -> Result<Option<DnsTarget>> {
    if let Some(target) =
        probe(cloud.elb(), LoadBalancerKind::Classic, alias, dns_name, record_name).await?
    {
        return Ok(Some(target));
    }

    if let Some(target) =
        probe(cloud.elbv2(), LoadBalancerKind::Network, alias, dns_name, record_name).await?
    {
        return Ok(Some(target));
    }

    debug!("No load balancer found for alias {:?}", dns_name);
    Ok(None)
}

async fn probe(
    api: &dyn LoadBalancerApi,
    kind: LoadBalancerKind,
    alias: &AliasTarget,
    dns_name: &str,
    record_name: &str,
) -> Result<Option<DnsTarget>> {
    let Some(lb) = api
        .find_by_alias(alias)
        .await
        .map_err(|e| Error::lookup(dns_name, e.to_string()))?
    else {
        debug!("No {} matches alias {:?}", kind, dns_name);
        return Ok(None);
    };

    let key = kind
        .tag_key(&lb)
        .ok_or_else(|| Error::lookup(dns_name, format!("{} {:?} has no ARN", kind, lb.name)))?
        .to_string();

    let tag_map = api.describe_tags(std::slice::from_ref(&key)).await?;
    let name_tag = tag_map
        .get(&key)
        .and_then(|tags| find_tag(tags, NAME_TAG))
        .unwrap_or_default();

    if name_tag.is_empty() {
        return Err(Error::missing_identity_tag(kind, lb.name, record_name));
    }

    let name = kind.logical_name(name_tag);

    debug!("Resolved alias {:?} to {} {:?}", dns_name, kind, name);
    Ok(Some(DnsTarget::new(
        kind,
        LoadBalancerRef::named(name).with_alias(lb.dns_name, lb.canonical_hosted_zone_id),
    )))
}

/// Find the load balancer of a kind whose `Name` tag names it
///
/// The tag is compared in its logical form, so a network load balancer
/// tagged `api.example.com` is found as `api-example-com`.
///
/// # Returns
///
/// - `Ok(Some(lb))`: The first tagged load balancer with that name
/// - `Ok(None)`: No load balancer of this kind carries the name
/// - `Err(Error)`: The service could not be queried
pub async fn find_load_balancer_by_name_tag(
    cloud: &AwsCloud,
    kind: LoadBalancerKind,
    name: &str,
) -> Result<Option<LoadBalancerDescription>> {
    let api = cloud.load_balancers(kind);
    let wanted = kind.logical_name(name);

    let lbs = api.describe_load_balancers().await?;

    let keys: Vec<String> = lbs
        .iter()
        .filter_map(|lb| kind.tag_key(lb))
        .map(str::to_string)
        .collect();
    if keys.is_empty() {
        debug!("No {} load balancers to search for {:?}", kind, name);
        return Ok(None);
    }

    let tag_map = api.describe_tags(&keys).await?;

    Ok(lbs.into_iter().find(|lb| {
        kind.tag_key(lb)
            .and_then(|key| tag_map.get(key))
            .and_then(|tags| find_tag(tags, NAME_TAG))
            .is_some_and(|tag| kind.logical_name(tag) == wanted)
    }))
}

/// Fill in a target's alias coordinates from the load balancer it names
///
/// Targets that already carry both coordinates are returned unchanged.
///
/// # Returns
///
/// - `Ok(target)`: The target, resolved when its load balancer was found
/// - `Err(Error::Api)`: The service could not be queried, or the load balancer has no DNS name
pub async fn resolve_target(cloud: &AwsCloud, target: DnsTarget) -> Result<DnsTarget> {
    if target.dns_name().is_some() && target.hosted_zone_id().is_some() {
        return Ok(target);
    }

    let kind = target.kind();
    let Some(lb) = find_load_balancer_by_name_tag(cloud, kind, target.name()).await? else {
        debug!("No {} tagged {:?}, leaving target unresolved", kind, target.name());
        return Ok(target);
    };

    if lb.dns_name.is_empty() {
        return Err(Error::api(
            kind.service_name(),
            format!("found {} {:?}, but it did not have a DNSName", kind, target.name()),
        ));
    }

    debug!("Resolved {} {:?} to {:?}", kind, target.name(), lb.dns_name);
    Ok(target.with_alias(lb.dns_name, lb.canonical_hosted_zone_id))
}
