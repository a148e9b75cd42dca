//! Desired-state model
//!
//! - [`DnsName`]: the DNS alias record intent and its Find / CheckChanges / Render operations
//! - [`DnsZone`]: handle to the hosted zone that owns the record
//! - [`DnsTarget`]: the load balancer the alias answers for

pub mod dns_name;
pub mod dns_zone;
pub mod target;

pub use dns_name::{DnsName, DnsNameChanges};
pub use dns_zone::DnsZone;
pub use target::{DnsTarget, LoadBalancerRef};

use serde::{Deserialize, Serialize};

/// How the engine treats a record's differences from the cloud
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// Create or update the record to match
    #[default]
    Sync,
    /// Skip the record entirely, not even Find runs
    Ignore,
    /// The record must already exist and match; any difference is an error
    ExistsAndValidates,
    /// The record is owned elsewhere; differences are logged, never applied
    ExistsAndWarnIfChanges,
}

impl Lifecycle {
    /// Whether the engine may create or modify the record
    pub fn may_mutate(&self) -> bool {
        matches!(self, Lifecycle::Sync)
    }
}
