//! Cloud API collaborator traits
//!
//! This module defines the abstract interfaces the reconciler consumes.
//!
//! - [`Route53Api`]: List and change record sets in a hosted zone
//! - [`LoadBalancerApi`]: Describe classic and network load balancers and their tags
//! - [`AwsCloud`]: The explicit client handle bundling all three services

pub mod load_balancer;
pub mod route53;

pub use load_balancer::{
    LoadBalancerApi, LoadBalancerDescription, LoadBalancerKind, Tag, find_tag, matches_alias,
};
pub use route53::{
    AliasTarget, Change, ChangeAction, ChangeBatch, ChangeInfo, ChangeStatus, PageToken,
    RecordSetPage, ResourceRecordSet, Route53Api,
};

use std::sync::Arc;

/// Cloud client handle threaded through every reconcile operation
///
/// Cloning is cheap; all clones share the same underlying clients.
#[derive(Clone)]
pub struct AwsCloud {
    route53: Arc<dyn Route53Api>,
    elb: Arc<dyn LoadBalancerApi>,
    elbv2: Arc<dyn LoadBalancerApi>,
}

impl AwsCloud {
    /// Bundle the three service clients
    pub fn new(
        route53: Arc<dyn Route53Api>,
        elb: Arc<dyn LoadBalancerApi>,
        elbv2: Arc<dyn LoadBalancerApi>,
    ) -> Self {
        Self {
            route53,
            elb,
            elbv2,
        }
    }

    /// Route 53 client
    pub fn route53(&self) -> &dyn Route53Api {
        self.route53.as_ref()
    }

    /// Classic ELB client
    pub fn elb(&self) -> &dyn LoadBalancerApi {
        self.elb.as_ref()
    }

    /// ELBv2 client
    pub fn elbv2(&self) -> &dyn LoadBalancerApi {
        self.elbv2.as_ref()
    }

    /// Client for the given load-balancing service
    pub fn load_balancers(&self, kind: LoadBalancerKind) -> &dyn LoadBalancerApi {
        match kind {
            LoadBalancerKind::Classic => self.elb(),
            LoadBalancerKind::Network => self.elbv2(),
        }
    }
}

impl std::fmt::Debug for AwsCloud {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCloud")
            .field("elb", &self.elb.kind())
            .field("elbv2", &self.elbv2.kind())
            .finish_non_exhaustive()
    }
}
