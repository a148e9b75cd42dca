// # Route 53 API Trait
//
// Defines the slice of the Route 53 API the reconciler consumes:
// paginated record-set listing and change submission.
//
// ## Usage
//
// ```rust,ignore
// use dnsname_core::traits::{Route53Api, ChangeBatch, Change, ChangeAction};
//
// let page = route53.list_resource_record_sets("Z1", None).await?;
// for rrs in &page.resource_record_sets {
//     println!("{} {}", rrs.name, rrs.record_type);
// }
//
// let batch = ChangeBatch::single(Change::upsert(rrs));
// let info = route53.change_resource_record_sets("Z1", &batch).await?;
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Alias target of a resource record set
///
/// Points the record at another AWS resource by DNS name and hosted-zone id
/// instead of a literal value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AliasTarget {
    /// DNS name of the aliased resource
    #[serde(rename = "DNSName")]
    pub dns_name: String,
    /// Hosted zone the aliased resource lives in
    pub hosted_zone_id: String,
    /// Whether Route 53 evaluates the health of the aliased resource
    #[serde(default)]
    pub evaluate_target_health: bool,
}

impl AliasTarget {
    /// Create an alias target with health evaluation disabled
    pub fn new(dns_name: impl Into<String>, hosted_zone_id: impl Into<String>) -> Self {
        Self {
            dns_name: dns_name.into(),
            hosted_zone_id: hosted_zone_id.into(),
            evaluate_target_health: false,
        }
    }
}

/// One DNS entry within a hosted zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceRecordSet {
    /// Record name, usually fully qualified with a trailing dot
    pub name: String,
    /// Record type (A, AAAA, CNAME, ...)
    #[serde(rename = "Type")]
    pub record_type: String,
    /// Time-to-live, absent for alias records
    #[serde(default, rename = "TTL", skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
    /// Literal values, empty for alias records
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_records: Vec<String>,
    /// Alias target, if this is an alias record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias_target: Option<AliasTarget>,
}

impl ResourceRecordSet {
    /// Create a record set with no values
    pub fn new(name: impl Into<String>, record_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.into(),
            ttl: None,
            resource_records: Vec::new(),
            alias_target: None,
        }
    }

    /// Set the alias target
    pub fn with_alias_target(mut self, alias_target: AliasTarget) -> Self {
        self.alias_target = Some(alias_target);
        self
    }

    /// Set literal values and TTL
    pub fn with_records(mut self, ttl: i64, records: Vec<String>) -> Self {
        self.ttl = Some(ttl);
        self.resource_records = records;
        self
    }
}

/// Continuation token for record-set listing
///
/// Route 53 resumes listing at a (name, type) pair rather than an opaque cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageToken {
    /// Name to start the next page at
    pub start_record_name: String,
    /// Type to start the next page at
    pub start_record_type: String,
}

/// One page of a record-set listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSetPage {
    /// Record sets in this page, in API order
    pub resource_record_sets: Vec<ResourceRecordSet>,
    /// Where the next page starts; `None` when the listing is exhausted
    pub next: Option<PageToken>,
}

/// Change verb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeAction {
    /// Fail if the record already exists
    Create,
    /// Remove the record
    Delete,
    /// Update-or-insert
    Upsert,
}

impl ChangeAction {
    /// Wire representation of the verb
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Create => "CREATE",
            ChangeAction::Delete => "DELETE",
            ChangeAction::Upsert => "UPSERT",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single change to a record set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Change {
    /// Change verb
    pub action: ChangeAction,
    /// Record set payload
    pub resource_record_set: ResourceRecordSet,
}

impl Change {
    /// Create an UPSERT change
    pub fn upsert(resource_record_set: ResourceRecordSet) -> Self {
        Self {
            action: ChangeAction::Upsert,
            resource_record_set,
        }
    }
}

/// A batch of changes applied atomically to one hosted zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChangeBatch {
    /// Optional operator comment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Changes in submission order
    pub changes: Vec<Change>,
}

impl ChangeBatch {
    /// Wrap a single change in a batch
    pub fn single(change: Change) -> Self {
        Self {
            comment: None,
            changes: vec![change],
        }
    }
}

/// Propagation status of a submitted change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeStatus {
    /// Not yet propagated to all authoritative servers
    Pending,
    /// Propagated
    Insync,
}

/// Change-tracking information returned for a submitted batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChangeInfo {
    /// Change-tracking identifier
    pub id: String,
    /// Propagation status
    pub status: ChangeStatus,
}

/// Trait for the Route 53 API collaborator
///
/// Implementations perform one API call per method invocation. They must not
/// retry, back off or cache: a failed call is returned to the caller and the
/// whole reconciliation pass is re-attempted by whoever scheduled it.
#[async_trait]
pub trait Route53Api: Send + Sync {
    /// List one page of record sets in a hosted zone
    ///
    /// # Parameters
    ///
    /// - `hosted_zone_id`: Zone to list
    /// - `start`: Continuation token from the previous page, `None` for the first page
    ///
    /// # Returns
    ///
    /// - `Ok(RecordSetPage)`: The page; `next` is `None` on the last page
    /// - `Err(Error)`: If the call failed
    async fn list_resource_record_sets(
        &self,
        hosted_zone_id: &str,
        start: Option<&PageToken>,
    ) -> Result<RecordSetPage, crate::Error>;

    /// Submit a change batch to a hosted zone
    ///
    /// # Returns
    ///
    /// - `Ok(ChangeInfo)`: Change-tracking information
    /// - `Err(Error)`: If the batch was rejected or the call failed
    async fn change_resource_record_sets(
        &self,
        hosted_zone_id: &str,
        batch: &ChangeBatch,
    ) -> Result<ChangeInfo, crate::Error>;
}
