// # AWS API Target
//
// Live-mutation render target: records are pushed straight to Route 53.

use crate::traits::{AwsCloud, ChangeBatch, ChangeInfo};
use crate::error::Result;

/// Render target that applies changes to the cloud
#[derive(Debug, Clone)]
pub struct AwsApiTarget {
    cloud: AwsCloud,
    submitted: Vec<ChangeInfo>,
}

impl AwsApiTarget {
    /// Create a live target over a cloud handle
    pub fn new(cloud: AwsCloud) -> Self {
        Self {
            cloud,
            submitted: Vec::new(),
        }
    }

    /// The cloud handle changes are submitted through
    pub fn cloud(&self) -> &AwsCloud {
        &self.cloud
    }

    /// Submit a change batch to a hosted zone and remember its change id
    pub async fn submit(&mut self, hosted_zone_id: &str, batch: &ChangeBatch) -> Result<ChangeInfo> {
        let info = self
            .cloud
            .route53()
            .change_resource_record_sets(hosted_zone_id, batch)
            .await?;
        self.submitted.push(info.clone());
        Ok(info)
    }

    /// Change-tracking ids of every batch submitted through this target
    pub fn change_ids(&self) -> Vec<String> {
        self.submitted.iter().map(|c| c.id.clone()).collect()
    }
}
