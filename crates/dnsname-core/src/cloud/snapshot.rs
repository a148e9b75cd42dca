// # Cloud Snapshot
//
// JSON file capturing the state of an in-memory cloud.
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "updated_at": "2026-01-09T12:00:00Z",
//   "hosted_zones": [
//     { "id": "Z1", "resource_record_sets": [ { "Name": "api.example.com.", "Type": "A", ... } ] }
//   ],
//   "classic_load_balancers": [
//     { "name": "lb1", "dns_name": "lb1.elb.amazonaws.com", "canonical_hosted_zone_id": "ZABC",
//       "tags": [ { "key": "Name", "value": "api.example.com" } ] }
//   ],
//   "network_load_balancers": []
// }
// ```
//
// Record sets use the Route 53 wire names. Writes are atomic
// (write-then-rename).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

use super::memory::{LoadBalancerEntry, MemoryCloud};
use crate::Error;
use crate::render::write_atomic;
use crate::traits::ResourceRecordSet;

/// Snapshot file format version
const SNAPSHOT_VERSION: &str = "1.0";

/// One hosted zone and its record sets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedZoneSnapshot {
    /// Hosted zone id
    pub id: String,
    /// Record sets, in listing order
    #[serde(default)]
    pub resource_record_sets: Vec<ResourceRecordSet>,
}

/// Serializable state of a whole cloud
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudSnapshot {
    /// File format version
    pub version: String,

    /// When the snapshot was last written
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    /// Route 53 hosted zones
    #[serde(default)]
    pub hosted_zones: Vec<HostedZoneSnapshot>,

    /// Classic ELBs
    #[serde(default)]
    pub classic_load_balancers: Vec<LoadBalancerEntry>,

    /// ELBv2 network load balancers
    #[serde(default)]
    pub network_load_balancers: Vec<LoadBalancerEntry>,
}

impl Default for CloudSnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION.to_string(),
            updated_at: None,
            hosted_zones: Vec::new(),
            classic_load_balancers: Vec::new(),
            network_load_balancers: Vec::new(),
        }
    }
}

impl CloudSnapshot {
    /// Load a snapshot file
    pub async fn load(path: &Path) -> Result<Self, Error> {
        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::config(format!(
                "Failed to read snapshot file {}: {}",
                path.display(),
                e
            ))
        })?;

        let snapshot: CloudSnapshot = serde_json::from_str(&content).map_err(|e| {
            Error::config(format!(
                "Failed to parse snapshot file {}: {}",
                path.display(),
                e
            ))
        })?;

        if snapshot.version != SNAPSHOT_VERSION {
            tracing::warn!(
                "Snapshot version mismatch: expected {}, got {}. Attempting to load anyway.",
                SNAPSHOT_VERSION,
                snapshot.version
            );
        }

        tracing::debug!(
            "Loaded snapshot {}: {} zones, {} classic and {} network load balancers",
            path.display(),
            snapshot.hosted_zones.len(),
            snapshot.classic_load_balancers.len(),
            snapshot.network_load_balancers.len()
        );
        Ok(snapshot)
    }

    /// Write the snapshot atomically, stamping `updated_at`
    pub async fn save(&mut self, path: &Path) -> Result<(), Error> {
        self.version = SNAPSHOT_VERSION.to_string();
        self.updated_at = Some(Utc::now());
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(path, json.as_bytes()).await
    }

    /// Build an in-memory cloud seeded with this snapshot
    pub async fn into_memory_cloud(self) -> MemoryCloud {
        let cloud = MemoryCloud::new();

        for zone in self.hosted_zones {
            cloud.route53.add_zone(&zone.id).await;
            for rrs in zone.resource_record_sets {
                cloud.route53.insert(&zone.id, rrs).await;
            }
        }
        for entry in self.classic_load_balancers {
            cloud.elb.insert(entry).await;
        }
        for entry in self.network_load_balancers {
            cloud.elbv2.insert(entry).await;
        }

        cloud
    }

    /// Capture the current state of an in-memory cloud
    pub async fn capture(cloud: &MemoryCloud) -> Self {
        let mut hosted_zones = Vec::new();
        for id in cloud.route53.zone_ids().await {
            let resource_record_sets = cloud.route53.record_sets(&id).await;
            hosted_zones.push(HostedZoneSnapshot {
                id,
                resource_record_sets,
            });
        }

        Self {
            hosted_zones,
            classic_load_balancers: cloud.elb.entries().await,
            network_load_balancers: cloud.elbv2.entries().await,
            ..Self::default()
        }
    }
}
