// # Memory Cloud
//
// In-memory implementations of the cloud collaborator traits.
//
// ## Purpose
//
// Lets the reconciler run end to end without AWS credentials: the binary
// loads one from a snapshot file, and tests seed one directly.
//
// ## Semantics
//
// - Record sets are kept sorted by (name, type), the order Route 53 lists in.
// - Stored names are fully qualified with a trailing dot.
// - Listing is paginated; the continuation token is the first key of the
//   next page.
// - A change batch applies atomically: if any change fails, none apply.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::{
    AwsCloud, ChangeAction, ChangeBatch, ChangeInfo, ChangeStatus, LoadBalancerApi,
    LoadBalancerDescription, LoadBalancerKind, PageToken, RecordSetPage, ResourceRecordSet,
    Route53Api, Tag,
};

/// Default number of record sets per listing page
pub const DEFAULT_PAGE_SIZE: usize = 100;

type RecordKey = (String, String);
type Zone = BTreeMap<RecordKey, ResourceRecordSet>;

fn fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{}.", name)
    }
}

/// In-memory Route 53
#[derive(Debug, Clone)]
pub struct MemoryRoute53 {
    zones: Arc<RwLock<BTreeMap<String, Zone>>>,
    page_size: usize,
    change_counter: Arc<AtomicU64>,
}

impl MemoryRoute53 {
    /// Create an empty Route 53 with the default page size
    pub fn new() -> Self {
        Self {
            zones: Arc::new(RwLock::new(BTreeMap::new())),
            page_size: DEFAULT_PAGE_SIZE,
            change_counter: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Set the listing page size (minimum 1)
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Create an empty hosted zone; existing zones are left untouched
    pub async fn add_zone(&self, hosted_zone_id: impl Into<String>) {
        self.zones
            .write()
            .await
            .entry(hosted_zone_id.into())
            .or_default();
    }

    /// Insert or replace a record set, creating the zone if needed
    pub async fn insert(&self, hosted_zone_id: impl Into<String>, mut rrs: ResourceRecordSet) {
        rrs.name = fqdn(&rrs.name);
        let key = (rrs.name.clone(), rrs.record_type.clone());
        self.zones
            .write()
            .await
            .entry(hosted_zone_id.into())
            .or_default()
            .insert(key, rrs);
    }

    /// Ids of every hosted zone
    pub async fn zone_ids(&self) -> Vec<String> {
        self.zones.read().await.keys().cloned().collect()
    }

    /// All record sets of a zone, in listing order
    pub async fn record_sets(&self, hosted_zone_id: &str) -> Vec<ResourceRecordSet> {
        self.zones
            .read()
            .await
            .get(hosted_zone_id)
            .map(|zone| zone.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of change batches applied so far
    pub fn change_count(&self) -> u64 {
        self.change_counter.load(Ordering::SeqCst)
    }

    fn apply(zone: &mut Zone, batch: &ChangeBatch) -> Result<(), Error> {
        for change in &batch.changes {
            let mut rrs = change.resource_record_set.clone();
            rrs.name = fqdn(&rrs.name);
            let key = (rrs.name.clone(), rrs.record_type.clone());

            match change.action {
                ChangeAction::Create => {
                    if zone.contains_key(&key) {
                        return Err(Error::api(
                            "route53",
                            format!("record set {} {} already exists", key.0, key.1),
                        ));
                    }
                    zone.insert(key, rrs);
                }
                ChangeAction::Delete => {
                    if zone.remove(&key).is_none() {
                        return Err(Error::api(
                            "route53",
                            format!("record set {} {} not found", key.0, key.1),
                        ));
                    }
                }
                ChangeAction::Upsert => {
                    zone.insert(key, rrs);
                }
            }
        }
        Ok(())
    }
}

impl Default for MemoryRoute53 {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Route53Api for MemoryRoute53 {
    async fn list_resource_record_sets(
        &self,
        hosted_zone_id: &str,
        start: Option<&PageToken>,
    ) -> Result<RecordSetPage, Error> {
        let zones = self.zones.read().await;
        let zone = zones.get(hosted_zone_id).ok_or_else(|| {
            Error::api("route53", format!("no such hosted zone: {}", hosted_zone_id))
        })?;

        let from: RecordKey = match start {
            Some(token) => (
                token.start_record_name.clone(),
                token.start_record_type.clone(),
            ),
            None => (String::new(), String::new()),
        };

        let mut iter = zone.range(from..);
        let resource_record_sets: Vec<ResourceRecordSet> = iter
            .by_ref()
            .take(self.page_size)
            .map(|(_, rrs)| rrs.clone())
            .collect();
        let next = iter.next().map(|((name, record_type), _)| PageToken {
            start_record_name: name.clone(),
            start_record_type: record_type.clone(),
        });

        Ok(RecordSetPage {
            resource_record_sets,
            next,
        })
    }

    async fn change_resource_record_sets(
        &self,
        hosted_zone_id: &str,
        batch: &ChangeBatch,
    ) -> Result<ChangeInfo, Error> {
        let mut zones = self.zones.write().await;
        let zone = zones.get_mut(hosted_zone_id).ok_or_else(|| {
            Error::api("route53", format!("no such hosted zone: {}", hosted_zone_id))
        })?;

        let mut staged = zone.clone();
        Self::apply(&mut staged, batch)?;
        *zone = staged;

        let n = self.change_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("/change/C{:010}", n);
        tracing::debug!("Applied change batch {} to zone {}", id, hosted_zone_id);

        Ok(ChangeInfo {
            id,
            status: ChangeStatus::Insync,
        })
    }
}

/// A load balancer together with its tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerEntry {
    /// Service description
    #[serde(flatten)]
    pub description: LoadBalancerDescription,
    /// Resource tags
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// In-memory ELB or ELBv2 service
#[derive(Debug, Clone)]
pub struct MemoryLoadBalancers {
    kind: LoadBalancerKind,
    entries: Arc<RwLock<Vec<LoadBalancerEntry>>>,
}

impl MemoryLoadBalancers {
    /// Create an empty service of the given kind
    pub fn new(kind: LoadBalancerKind) -> Self {
        Self {
            kind,
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Add a load balancer
    pub async fn insert(&self, entry: LoadBalancerEntry) {
        self.entries.write().await.push(entry);
    }

    /// All load balancers with their tags
    pub async fn entries(&self) -> Vec<LoadBalancerEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl LoadBalancerApi for MemoryLoadBalancers {
    fn kind(&self) -> LoadBalancerKind {
        self.kind
    }

    async fn describe_load_balancers(&self) -> Result<Vec<LoadBalancerDescription>, Error> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .map(|e| e.description.clone())
            .collect())
    }

    async fn describe_tags(&self, keys: &[String]) -> Result<HashMap<String, Vec<Tag>>, Error> {
        let entries = self.entries.read().await;
        let mut tags = HashMap::new();
        for key in keys {
            if let Some(entry) = entries
                .iter()
                .find(|e| self.kind.tag_key(&e.description) == Some(key.as_str()))
            {
                tags.insert(key.clone(), entry.tags.clone());
            }
        }
        Ok(tags)
    }
}

/// Complete in-memory cloud: Route 53 plus both load-balancing services
///
/// Clones share state.
#[derive(Debug, Clone)]
pub struct MemoryCloud {
    /// Route 53
    pub route53: MemoryRoute53,
    /// Classic ELB
    pub elb: MemoryLoadBalancers,
    /// ELBv2
    pub elbv2: MemoryLoadBalancers,
}

impl MemoryCloud {
    /// Create an empty cloud
    pub fn new() -> Self {
        Self {
            route53: MemoryRoute53::new(),
            elb: MemoryLoadBalancers::new(LoadBalancerKind::Classic),
            elbv2: MemoryLoadBalancers::new(LoadBalancerKind::Network),
        }
    }

    /// A client handle backed by this cloud
    pub fn handle(&self) -> AwsCloud {
        AwsCloud::new(
            Arc::new(self.route53.clone()),
            Arc::new(self.elb.clone()),
            Arc::new(self.elbv2.clone()),
        )
    }
}

impl Default for MemoryCloud {
    fn default() -> Self {
        Self::new()
    }
}
