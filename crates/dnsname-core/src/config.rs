//! Configuration types for the DNS name reconciler
//!
//! A [`ReconcileConfig`] names the execution mode, the hosted zones records
//! live in, and the desired alias records. Records reference zones by name;
//! [`ReconcileConfig::intents`] resolves those references into [`DnsName`]
//! values for the engine.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::discovery::trim_trailing_dot;
use crate::model::{DnsName, DnsTarget, DnsZone, Lifecycle, LoadBalancerRef};
use crate::render::Backend;
use crate::traits::LoadBalancerKind;

/// Main reconcile configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Execution mode / render backend
    #[serde(default = "default_mode")]
    pub mode: Backend,

    /// Hosted zones records may live in
    #[serde(default)]
    pub zones: Vec<ZoneConfig>,

    /// DNS records to reconcile
    pub records: Vec<RecordConfig>,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl ReconcileConfig {
    /// Create an empty configuration for a mode
    pub fn new(mode: Backend) -> Self {
        Self {
            mode,
            zones: Vec::new(),
            records: Vec::new(),
            engine: EngineConfig::default(),
        }
    }

    /// Add a zone
    pub fn with_zone(mut self, zone: ZoneConfig) -> Self {
        self.zones.push(zone);
        self
    }

    /// Add a record
    pub fn with_record(mut self, record: RecordConfig) -> Self {
        self.records.push(record);
        self
    }

    /// Load a configuration from a JSON file
    pub async fn load(path: &Path) -> Result<Self, crate::Error> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            crate::Error::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            crate::Error::config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Validate the configuration
    ///
    /// Record names may be empty here: an unnamed record is rejected by
    /// CheckChanges on the create path, and accepted when it already exists.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.records.is_empty() {
            return Err(crate::Error::config("No records configured"));
        }

        if self.engine.event_channel_capacity == 0 {
            return Err(crate::Error::config("event_channel_capacity must be > 0"));
        }

        let mut zone_names = HashSet::new();
        for zone in &self.zones {
            zone.validate()?;
            if !zone_names.insert(zone.name.as_str()) {
                return Err(crate::Error::config(format!(
                    "Zone {} is configured more than once",
                    zone.name
                )));
            }
        }

        let mut keys = HashSet::new();
        for record in &self.records {
            if let Some(zone) = &record.zone
                && !zone_names.contains(zone.as_str())
            {
                return Err(crate::Error::config(format!(
                    "Record {:?} references unknown zone {}",
                    record.name, zone
                )));
            }

            if let Some(target) = &record.target {
                target.validate()?;
            }

            if !record.name.is_empty()
                && !keys.insert((
                    trim_trailing_dot(&record.name),
                    record.resource_type.as_str(),
                ))
            {
                return Err(crate::Error::config(format!(
                    "Record {} {} is configured more than once",
                    record.name, record.resource_type
                )));
            }
        }

        Ok(())
    }

    /// Build the desired records, resolving zone references
    pub fn intents(&self) -> Result<Vec<DnsName>, crate::Error> {
        self.records
            .iter()
            .map(|record| {
                let mut intent = DnsName::new(&record.name, &record.resource_type)
                    .with_lifecycle(record.lifecycle);

                if let Some(zone_name) = &record.zone {
                    let zone = self
                        .zones
                        .iter()
                        .find(|z| &z.name == zone_name)
                        .ok_or_else(|| {
                            crate::Error::config(format!("Unknown zone {}", zone_name))
                        })?;
                    intent = intent.with_zone(zone.to_dns_zone());
                }

                if let Some(target) = &record.target {
                    intent = intent.with_target(target.to_dns_target());
                }

                Ok(intent)
            })
            .collect()
    }
}

/// Hosted zone configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Zone DNS name
    pub name: String,

    /// Hosted zone id; unset for a zone that does not exist yet
    #[serde(default)]
    pub zone_id: Option<String>,

    /// Whether the zone is managed by another tool
    #[serde(default)]
    pub shared: bool,
}

impl ZoneConfig {
    /// Create a zone configuration
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

    /// Mark the zone as shared
    pub fn with_shared(mut self, shared: bool) -> Self {
        self.shared = shared;
        self
    }

    fn validate(&self) -> Result<(), crate::Error> {
        if self.name.is_empty() {
            return Err(crate::Error::config("Zone name cannot be empty"));
        }
        if self.shared && self.zone_id.as_deref().unwrap_or_default().is_empty() {
            return Err(crate::Error::config(format!(
                "Shared zone {} needs a zone_id",
                self.name
            )));
        }
        Ok(())
    }

    fn to_dns_zone(&self) -> DnsZone {
        let mut zone = DnsZone::new(&self.name).with_shared(self.shared);
        zone.zone_id = self.zone_id.clone();
        zone
    }
}

/// DNS record configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordConfig {
    /// DNS record name (e.g., "api.cluster1.example.com")
    #[serde(default)]
    pub name: String,

    /// Record type
    #[serde(default = "default_resource_type")]
    pub resource_type: String,

    /// Name of the zone the record lives in
    #[serde(default)]
    pub zone: Option<String>,

    /// Load balancer the alias should point at
    #[serde(default)]
    pub target: Option<TargetConfig>,

    /// How differences are handled
    #[serde(default)]
    pub lifecycle: Lifecycle,
}

impl RecordConfig {
    /// Create a new record configuration
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resource_type: default_resource_type(),
            zone: None,
            target: None,
            lifecycle: Lifecycle::default(),
        }
    }

    /// Set the record type
    pub fn with_resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = resource_type.into();
        self
    }

    /// Place the record in a configured zone
    pub fn in_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    /// Set the alias target
    pub fn with_target(mut self, target: TargetConfig) -> Self {
        self.target = Some(target);
        self
    }

    /// Set the lifecycle
    pub fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }
}

/// Alias target configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Classic or network load balancer
    pub kind: LoadBalancerKind,

    /// Logical name, matching the load balancer's `Name` tag
    pub name: String,

    /// Public DNS name, required for live rendering
    #[serde(default)]
    pub dns_name: Option<String>,

    /// Canonical hosted zone id, required for live rendering
    #[serde(default)]
    pub hosted_zone_id: Option<String>,
}

impl TargetConfig {
    /// Create a target configuration
    pub fn new(kind: LoadBalancerKind, name: impl Into<String>) -> Self {
        Self {
            kind,
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

    fn validate(&self) -> Result<(), crate::Error> {
        if self.name.is_empty() {
            return Err(crate::Error::config(format!(
                "{} target name cannot be empty",
                self.kind
            )));
        }
        Ok(())
    }

    fn to_dns_target(&self) -> DnsTarget {
        let lb = LoadBalancerRef {
            name: self.kind.logical_name(&self.name),
            dns_name: self.dns_name.clone(),
            hosted_zone_id: self.hosted_zone_id.clone(),
        };
        DnsTarget::new(self.kind, lb)
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Capacity of the engine event channel
    ///
    /// When full, events are dropped with a warning log.
    ///
    /// Default: 100 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_mode() -> Backend {
    Backend::DryRun
}

fn default_resource_type() -> String {
    "A".to_string()
}

fn default_event_channel_capacity() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ReconcileConfig {
        ReconcileConfig::new(Backend::Terraform)
            .with_zone(ZoneConfig::new("cluster1.example.com").with_zone_id("Z1"))
            .with_record(
                RecordConfig::new("api.cluster1.example.com")
                    .in_zone("cluster1.example.com")
                    .with_target(TargetConfig::new(
                        LoadBalancerKind::Classic,
                        "api.cluster1.example.com",
                    )),
            )
    }

    #[test]
    fn test_valid_config() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn test_no_records_rejected() {
        let config = ReconcileConfig::new(Backend::Live);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_zone_rejected() {
        let config = base().with_record(RecordConfig::new("www.other.com").in_zone("other.com"));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("unknown zone other.com"));
    }

    #[test]
    fn test_duplicate_record_rejected() {
        let config = base().with_record(RecordConfig::new("api.cluster1.example.com"));
        assert!(config.validate().is_err());

        let fqdn = base().with_record(RecordConfig::new("api.cluster1.example.com."));
        let err = fqdn.validate().unwrap_err();
        assert!(err.to_string().contains("configured more than once"));

        let aaaa = base()
            .with_record(RecordConfig::new("api.cluster1.example.com").with_resource_type("AAAA"));
        assert!(aaaa.validate().is_ok());
    }

    #[test]
    fn test_shared_zone_needs_id() {
        let config = base().with_zone(ZoneConfig::new("example.com").with_shared(true));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_record_name_allowed() {
        let config = base().with_record(RecordConfig::new(""));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_intents_resolve_zones() {
        let intents = base().intents().unwrap();
        assert_eq!(intents.len(), 1);

        let intent = &intents[0];
        assert_eq!(intent.resource_type, "A");
        assert_eq!(intent.lifecycle, Lifecycle::Sync);
        assert_eq!(intent.zone.as_ref().and_then(DnsZone::id), Some("Z1"));
        assert_eq!(
            intent.target_load_balancer,
            Some(DnsTarget::ClassicLoadBalancer(LoadBalancerRef::named(
                "api.cluster1.example.com"
            )))
        );
    }

    #[test]
    fn test_network_target_names_are_normalized() {
        let config = ReconcileConfig::new(Backend::Live)
            .with_zone(ZoneConfig::new("cluster1.example.com").with_zone_id("Z1"))
            .with_record(
                RecordConfig::new("api.cluster1.example.com")
                    .in_zone("cluster1.example.com")
                    .with_target(TargetConfig::new(
                        LoadBalancerKind::Network,
                        "api.cluster1.example.com",
                    )),
            );

        let intents = config.intents().unwrap();
        assert_eq!(
            intents[0].target_load_balancer,
            Some(DnsTarget::NetworkLoadBalancer(LoadBalancerRef::named(
                "api-cluster1-example-com"
            )))
        );
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: ReconcileConfig = serde_json::from_value(serde_json::json!({
            "mode": "cloudformation",
            "zones": [{ "name": "example.com", "zone_id": "Z1" }],
            "records": [{
                "name": "api.example.com",
                "zone": "example.com",
                "target": { "kind": "network", "name": "api-example-com" },
                "lifecycle": "exists_and_warn_if_changes"
            }]
        }))
        .unwrap();

        assert_eq!(config.mode, Backend::CloudFormation);
        assert_eq!(config.engine.event_channel_capacity, 100);
        let record = &config.records[0];
        assert_eq!(record.resource_type, "A");
        assert_eq!(record.lifecycle, Lifecycle::ExistsAndWarnIfChanges);
        assert_eq!(record.target.as_ref().unwrap().kind, LoadBalancerKind::Network);
    }
}
