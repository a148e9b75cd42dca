//! Test doubles and common utilities for contract tests
//!
//! The doubles script cloud responses and record every call so tests can
//! assert on exactly what the reconciler asked the cloud for.

#![allow(dead_code)]

use dnsname_core::engine::EngineEvent;
use dnsname_core::error::{Error, Result};
use dnsname_core::model::{DnsName, DnsTarget, DnsZone, LoadBalancerRef};
use dnsname_core::traits::{
    AliasTarget, AwsCloud, ChangeBatch, ChangeInfo, ChangeStatus, LoadBalancerApi,
    LoadBalancerDescription, LoadBalancerKind, PageToken, RecordSetPage, ResourceRecordSet,
    Route53Api, Tag,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;

pub const ZONE_ID: &str = "Z1";
pub const ZONE_NAME: &str = "cluster1.example.com";
pub const RECORD_NAME: &str = "api.cluster1.example.com";
pub const LB_DNS_NAME: &str = "lb1.elb.amazonaws.com";
pub const LB_ZONE_ID: &str = "ZABC";
pub const NLB_ARN: &str =
    "arn:aws:elasticloadbalancing:us-east-1:123456789012:loadbalancer/net/api/50dc6c495c0c9188";

/// A Route 53 that serves preset pages and records submitted batches
pub struct ScriptedRoute53 {
    /// Pages served in order; each page's first record is its start token
    pages: Arc<Vec<Vec<ResourceRecordSet>>>,
    /// Page index whose fetch fails
    failing_page: Option<usize>,
    /// Whether change submission fails
    fail_changes: bool,
    /// Call counter for list_resource_record_sets()
    list_call_count: Arc<AtomicUsize>,
    /// Page indexes requested, in order
    requested_pages: Arc<Mutex<Vec<usize>>>,
    /// Batches submitted, with their zone
    submitted: Arc<Mutex<Vec<(String, ChangeBatch)>>>,
}

impl ScriptedRoute53 {
    /// Serve the given pages
    pub fn with_pages(pages: Vec<Vec<ResourceRecordSet>>) -> Self {
        Self {
            pages: Arc::new(pages),
            failing_page: None,
            fail_changes: false,
            list_call_count: Arc::new(AtomicUsize::new(0)),
            requested_pages: Arc::new(Mutex::new(Vec::new())),
            submitted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Serve one page
    pub fn with_records(records: Vec<ResourceRecordSet>) -> Self {
        Self::with_pages(vec![records])
    }

    /// Fail when the page at `index` is requested
    pub fn failing_on_page(mut self, index: usize) -> Self {
        self.failing_page = Some(index);
        self
    }

    /// Reject every change batch
    pub fn failing_changes(mut self) -> Self {
        self.fail_changes = true;
        self
    }

    /// Create a double that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            pages: Arc::clone(&other.pages),
            failing_page: other.failing_page,
            fail_changes: other.fail_changes,
            list_call_count: Arc::clone(&other.list_call_count),
            requested_pages: Arc::clone(&other.requested_pages),
            submitted: Arc::clone(&other.submitted),
        }
    }

    /// Get the number of times list_resource_record_sets() was called
    pub fn list_call_count(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }

    /// Page indexes requested, in order
    pub fn requested_pages(&self) -> Vec<usize> {
        self.requested_pages.lock().unwrap().clone()
    }

    /// Batches submitted so far
    pub fn submitted(&self) -> Vec<(String, ChangeBatch)> {
        self.submitted.lock().unwrap().clone()
    }

    fn page_index(&self, start: Option<&PageToken>) -> usize {
        let Some(token) = start else {
            return 0;
        };
        self.pages
            .iter()
            .position(|page| {
                page.first().is_some_and(|rrs| {
                    rrs.name == token.start_record_name && rrs.record_type == token.start_record_type
                })
            })
            .expect("token points at a scripted page")
    }
}

#[async_trait::async_trait]
impl Route53Api for ScriptedRoute53 {
    async fn list_resource_record_sets(
        &self,
        _hosted_zone_id: &str,
        start: Option<&PageToken>,
    ) -> Result<RecordSetPage> {
        self.list_call_count.fetch_add(1, Ordering::SeqCst);
        let index = self.page_index(start);
        self.requested_pages.lock().unwrap().push(index);

        if self.failing_page == Some(index) {
            return Err(Error::api("route53", "throttled"));
        }

        let next = self
            .pages
            .get(index + 1)
            .and_then(|page| page.first())
            .map(|rrs| PageToken {
                start_record_name: rrs.name.clone(),
                start_record_type: rrs.record_type.clone(),
            });

        Ok(RecordSetPage {
            resource_record_sets: self.pages.get(index).cloned().unwrap_or_default(),
            next,
        })
    }

    async fn change_resource_record_sets(
        &self,
        hosted_zone_id: &str,
        batch: &ChangeBatch,
    ) -> Result<ChangeInfo> {
        if self.fail_changes {
            return Err(Error::api("route53", "InvalidChangeBatch"));
        }

        let mut submitted = self.submitted.lock().unwrap();
        submitted.push((hosted_zone_id.to_string(), batch.clone()));
        Ok(ChangeInfo {
            id: format!("/change/C{}", submitted.len()),
            status: ChangeStatus::Pending,
        })
    }
}

/// A load-balancing service with preset load balancers and tags
pub struct ScriptedLoadBalancers {
    kind: LoadBalancerKind,
    load_balancers: Arc<Vec<LoadBalancerDescription>>,
    tags: Arc<HashMap<String, Vec<Tag>>>,
    fail: bool,
    /// Call counter for describe_load_balancers()
    describe_call_count: Arc<AtomicUsize>,
    /// Keys passed to describe_tags()
    requested_tag_keys: Arc<Mutex<Vec<String>>>,
}

impl ScriptedLoadBalancers {
    /// An empty service of the given kind
    pub fn new(kind: LoadBalancerKind) -> Self {
        Self {
            kind,
            load_balancers: Arc::new(Vec::new()),
            tags: Arc::new(HashMap::new()),
            fail: false,
            describe_call_count: Arc::new(AtomicUsize::new(0)),
            requested_tag_keys: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a load balancer and its tags
    ///
    /// Tags are keyed the way the service keys them: by name for classic,
    /// by ARN for network.
    pub fn with_load_balancer(mut self, lb: LoadBalancerDescription, tags: Vec<Tag>) -> Self {
        if let Some(key) = self.kind.tag_key(&lb) {
            Arc::make_mut(&mut self.tags).insert(key.to_string(), tags);
        }
        Arc::make_mut(&mut self.load_balancers).push(lb);
        self
    }

    /// Fail every describe call
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Create a double that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            kind: other.kind,
            load_balancers: Arc::clone(&other.load_balancers),
            tags: Arc::clone(&other.tags),
            fail: other.fail,
            describe_call_count: Arc::clone(&other.describe_call_count),
            requested_tag_keys: Arc::clone(&other.requested_tag_keys),
        }
    }

    /// Get the number of times describe_load_balancers() was called
    pub fn describe_call_count(&self) -> usize {
        self.describe_call_count.load(Ordering::SeqCst)
    }

    /// Keys passed to describe_tags(), in order
    pub fn requested_tag_keys(&self) -> Vec<String> {
        self.requested_tag_keys.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LoadBalancerApi for ScriptedLoadBalancers {
    fn kind(&self) -> LoadBalancerKind {
        self.kind
    }

    async fn describe_load_balancers(&self) -> Result<Vec<LoadBalancerDescription>> {
        self.describe_call_count.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::api(self.kind.service_name(), "AccessDenied"));
        }
        Ok(self.load_balancers.as_ref().clone())
    }

    async fn describe_tags(&self, keys: &[String]) -> Result<HashMap<String, Vec<Tag>>> {
        self.requested_tag_keys
            .lock()
            .unwrap()
            .extend(keys.iter().cloned());
        Ok(keys
            .iter()
            .filter_map(|k| self.tags.get(k).map(|t| (k.clone(), t.clone())))
            .collect())
    }
}

/// Build a cloud handle over doubles that share counters with the given ones
pub fn aws_cloud(
    route53: &ScriptedRoute53,
    elb: &ScriptedLoadBalancers,
    elbv2: &ScriptedLoadBalancers,
) -> AwsCloud {
    AwsCloud::new(
        Arc::new(ScriptedRoute53::sharing_counters_with(route53)),
        Arc::new(ScriptedLoadBalancers::sharing_counters_with(elb)),
        Arc::new(ScriptedLoadBalancers::sharing_counters_with(elbv2)),
    )
}

/// An alias record set as Route 53 lists it
pub fn alias_record(name: &str, dns_name: &str, hosted_zone_id: &str) -> ResourceRecordSet {
    ResourceRecordSet::new(name, "A").with_alias_target(AliasTarget::new(dns_name, hosted_zone_id))
}

/// A plain A record
pub fn a_record(name: &str) -> ResourceRecordSet {
    ResourceRecordSet::new(name, "A").with_records(300, vec!["10.0.0.1".to_string()])
}

/// The classic load balancer behind the `ZABC` alias
pub fn classic_lb() -> LoadBalancerDescription {
    LoadBalancerDescription {
        name: "lb1".to_string(),
        arn: None,
        dns_name: LB_DNS_NAME.to_string(),
        canonical_hosted_zone_id: LB_ZONE_ID.to_string(),
    }
}

/// The network load balancer behind the `ZABC` alias
pub fn network_lb() -> LoadBalancerDescription {
    LoadBalancerDescription {
        name: "api-50dc6c49".to_string(),
        arn: Some(NLB_ARN.to_string()),
        dns_name: LB_DNS_NAME.to_string(),
        canonical_hosted_zone_id: LB_ZONE_ID.to_string(),
    }
}

/// The `Name` tag pointing back at the record
pub fn name_tag() -> Vec<Tag> {
    vec![
        Tag::new("KubernetesCluster", ZONE_NAME),
        Tag::new("Name", RECORD_NAME),
    ]
}

/// The hosted zone of the scenario
pub fn zone() -> DnsZone {
    DnsZone::new(ZONE_NAME).with_zone_id(ZONE_ID)
}

/// The desired record of the scenario, pointing at a classic load balancer
pub fn desired_classic() -> DnsName {
    DnsName::new(RECORD_NAME, "A").with_zone(zone()).with_target(
        DnsTarget::ClassicLoadBalancer(
            LoadBalancerRef::named(RECORD_NAME).with_alias(LB_DNS_NAME, LB_ZONE_ID),
        ),
    )
}

/// The desired record of the scenario, pointing at a network load balancer
pub fn desired_network() -> DnsName {
    DnsName::new(RECORD_NAME, "A").with_zone(zone()).with_target(
        DnsTarget::NetworkLoadBalancer(
            LoadBalancerRef::named("api-cluster1-example-com").with_alias(LB_DNS_NAME, LB_ZONE_ID),
        ),
    )
}

/// Collect every event once the engine has been dropped
pub async fn collect_events(events: mpsc::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    ReceiverStream::new(events).collect().await
}
