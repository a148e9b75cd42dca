//! Contract Test: Alias Target Resolution
//!
//! Constraints verified:
//! - An alias is resolved to the load balancer whose `Name` tag names it
//! - Classic load balancers are probed first and win a tie
//! - Network load balancer names have dots replaced with dashes
//! - A matching load balancer without a `Name` tag is a terminal error
//! - A blank alias DNS name leaves the target unresolved without lookups
//!
//! If this test fails, discovered records point at the wrong load balancer
//! or none at all.

mod common;

use common::*;
use dnsname_core::Error;
use dnsname_core::engine::Context;
use dnsname_core::model::{DnsName, DnsTarget, LoadBalancerRef};
use dnsname_core::render::Backend;
use dnsname_core::traits::{LoadBalancerKind, Tag};

async fn find_scenario(
    route53: &ScriptedRoute53,
    elb: &ScriptedLoadBalancers,
    elbv2: &ScriptedLoadBalancers,
) -> dnsname_core::Result<Option<DnsName>> {
    let ctx = Context::new(aws_cloud(route53, elb, elbv2), Backend::DryRun);
    DnsName::new(RECORD_NAME, "A").with_zone(zone()).find(&ctx).await
}

fn scenario_route53() -> ScriptedRoute53 {
    ScriptedRoute53::with_records(vec![alias_record(
        "api.cluster1.example.com.",
        LB_DNS_NAME,
        LB_ZONE_ID,
    )])
}

#[tokio::test]
async fn classic_alias_resolves_to_tagged_load_balancer() {
    let route53 = scenario_route53();
    let elb = ScriptedLoadBalancers::new(LoadBalancerKind::Classic)
        .with_load_balancer(classic_lb(), name_tag());
    let elbv2 = ScriptedLoadBalancers::new(LoadBalancerKind::Network);

    let actual = find_scenario(&route53, &elb, &elbv2)
        .await
        .expect("find succeeds")
        .expect("record exists");

    assert_eq!(
        actual.target_load_balancer,
        Some(DnsTarget::ClassicLoadBalancer(
            LoadBalancerRef::named(RECORD_NAME).with_alias(LB_DNS_NAME, LB_ZONE_ID)
        ))
    );
    assert_eq!(elb.requested_tag_keys(), vec!["lb1".to_string()]);
    assert_eq!(elbv2.describe_call_count(), 0);
}

#[tokio::test]
async fn network_alias_resolves_with_dashes_in_name() {
    let route53 = scenario_route53();
    let elb = ScriptedLoadBalancers::new(LoadBalancerKind::Classic);
    let elbv2 = ScriptedLoadBalancers::new(LoadBalancerKind::Network)
        .with_load_balancer(network_lb(), name_tag());

    let actual = find_scenario(&route53, &elb, &elbv2)
        .await
        .expect("find succeeds")
        .expect("record exists");

    let target = actual.target_load_balancer.expect("target resolved");
    assert_eq!(target.kind(), LoadBalancerKind::Network);
    assert_eq!(target.name(), "api-cluster1-example-com");
    assert_eq!(target.dns_name(), Some(LB_DNS_NAME));
    assert_eq!(target.hosted_zone_id(), Some(LB_ZONE_ID));

    assert_eq!(elb.describe_call_count(), 1);
    assert_eq!(elbv2.requested_tag_keys(), vec![NLB_ARN.to_string()]);
}

#[tokio::test]
async fn classic_wins_when_both_services_match() {
    let route53 = scenario_route53();
    let elb = ScriptedLoadBalancers::new(LoadBalancerKind::Classic)
        .with_load_balancer(classic_lb(), name_tag());
    let elbv2 = ScriptedLoadBalancers::new(LoadBalancerKind::Network)
        .with_load_balancer(network_lb(), name_tag());

    let actual = find_scenario(&route53, &elb, &elbv2)
        .await
        .expect("find succeeds")
        .expect("record exists");

    assert_eq!(
        actual.target_load_balancer.map(|t| t.kind()),
        Some(LoadBalancerKind::Classic)
    );
    assert_eq!(elbv2.describe_call_count(), 0);
    assert!(elbv2.requested_tag_keys().is_empty());
}

#[tokio::test]
async fn missing_name_tag_is_terminal() {
    let route53 = scenario_route53();
    let elb = ScriptedLoadBalancers::new(LoadBalancerKind::Classic)
        .with_load_balancer(classic_lb(), vec![Tag::new("KubernetesCluster", ZONE_NAME)]);
    let elbv2 = ScriptedLoadBalancers::new(LoadBalancerKind::Network)
        .with_load_balancer(network_lb(), name_tag());

    let err = find_scenario(&route53, &elb, &elbv2)
        .await
        .expect_err("untagged load balancer must fail");

    assert!(err.is_terminal());
    match &err {
        Error::MissingIdentityTag {
            kind,
            load_balancer,
            record,
        } => {
            assert_eq!(*kind, LoadBalancerKind::Classic);
            assert_eq!(load_balancer, "lb1");
            assert_eq!(record, RECORD_NAME);
        }
        other => panic!("expected missing tag error, got {other:?}"),
    }
    // The classic hit is final; a tagged network balancer does not rescue it
    assert_eq!(elbv2.describe_call_count(), 0);
}

#[tokio::test]
async fn blank_alias_dns_name_leaves_target_unresolved() {
    let route53 =
        ScriptedRoute53::with_records(vec![alias_record("api.cluster1.example.com.", "", LB_ZONE_ID)]);
    let elb = ScriptedLoadBalancers::new(LoadBalancerKind::Classic)
        .with_load_balancer(classic_lb(), name_tag());
    let elbv2 = ScriptedLoadBalancers::new(LoadBalancerKind::Network);

    let actual = find_scenario(&route53, &elb, &elbv2)
        .await
        .expect("find succeeds")
        .expect("record exists");

    assert_eq!(actual.target_load_balancer, None);
    assert_eq!(elb.describe_call_count(), 0);
    assert_eq!(elbv2.describe_call_count(), 0);
}

#[tokio::test]
async fn unknown_alias_leaves_target_unresolved() {
    let route53 = ScriptedRoute53::with_records(vec![alias_record(
        "api.cluster1.example.com.",
        "d111111abcdef8.cloudfront.net",
        "Z2FDTNDATAQYW2",
    )]);
    let elb = ScriptedLoadBalancers::new(LoadBalancerKind::Classic)
        .with_load_balancer(classic_lb(), name_tag());
    let elbv2 = ScriptedLoadBalancers::new(LoadBalancerKind::Network)
        .with_load_balancer(network_lb(), name_tag());

    let actual = find_scenario(&route53, &elb, &elbv2)
        .await
        .expect("find succeeds")
        .expect("record exists");

    assert_eq!(actual.target_load_balancer, None);
    assert_eq!(elb.describe_call_count(), 1);
    assert_eq!(elbv2.describe_call_count(), 1);
}

#[tokio::test]
async fn dualstack_alias_matches_load_balancer() {
    let route53 = ScriptedRoute53::with_records(vec![alias_record(
        "api.cluster1.example.com.",
        "dualstack.LB1.elb.amazonaws.com.",
        LB_ZONE_ID,
    )]);
    let elb = ScriptedLoadBalancers::new(LoadBalancerKind::Classic)
        .with_load_balancer(classic_lb(), name_tag());
    let elbv2 = ScriptedLoadBalancers::new(LoadBalancerKind::Network);

    let actual = find_scenario(&route53, &elb, &elbv2)
        .await
        .expect("find succeeds")
        .expect("record exists");

    assert_eq!(
        actual.target_load_balancer.as_ref().map(|t| t.name()),
        Some(RECORD_NAME)
    );
}

#[tokio::test]
async fn load_balancer_service_failure_is_a_lookup_error() {
    let route53 = scenario_route53();
    let elb = ScriptedLoadBalancers::new(LoadBalancerKind::Classic).failing();
    let elbv2 = ScriptedLoadBalancers::new(LoadBalancerKind::Network)
        .with_load_balancer(network_lb(), name_tag());

    let err = find_scenario(&route53, &elb, &elbv2)
        .await
        .expect_err("lookup failure surfaces");

    assert!(matches!(err, Error::LoadBalancerLookup { ref dns_name, .. } if dns_name == LB_DNS_NAME));
    assert!(!err.is_terminal());
}
