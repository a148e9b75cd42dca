//! Error types for the DNS name reconciler
//!
//! Every failure surfaces to the caller; nothing in this crate retries.

use thiserror::Error;

use crate::render::Backend;
use crate::traits::LoadBalancerKind;

/// Result type alias for reconcile operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DNS name reconciler
#[derive(Error, Debug)]
pub enum Error {
    /// The record-set listing of a hosted zone failed
    #[error("error listing DNS ResourceRecords in zone {zone_id}: {message}")]
    Listing {
        /// Hosted zone being listed
        zone_id: String,
        /// Underlying transport error
        message: String,
    },

    /// A load balancer answered for an alias but carries no `Name` tag
    #[error(
        "found {kind} {load_balancer:?} linked to DNS name {record:?}, but it did not have a Name tag"
    )]
    MissingIdentityTag {
        /// Classic or network load balancer
        kind: LoadBalancerKind,
        /// Cloud-side load balancer name
        load_balancer: String,
        /// Desired record name the alias was discovered for
        record: String,
    },

    /// A required field is missing on the create path
    #[error("field is required: {0}")]
    RequiredField(String),

    /// Submitting or emitting a rendered record failed
    #[error("error rendering DNS record {record:?} for {backend}: {message}")]
    RenderSubmission {
        /// Record name
        record: String,
        /// Backend the record was rendered for
        backend: Backend,
        /// Underlying failure
        message: String,
    },

    /// Mapping an alias DNS name to a load balancer failed
    #[error("error mapping DNSName {dns_name:?} to LoadBalancer: {message}")]
    LoadBalancerLookup {
        /// Alias DNS name being resolved
        dns_name: String,
        /// Underlying failure
        message: String,
    },

    /// The record's lifecycle forbids the planned change
    #[error("lifecycle violation for {record:?}: {message}")]
    Lifecycle {
        /// Record name
        record: String,
        /// What the lifecycle rejected
        message: String,
    },

    /// Cloud API collaborator failure
    #[error("{service} API error: {message}")]
    Api {
        /// Service name (route53, elb, elbv2)
        service: String,
        /// Error message
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a listing error for a hosted zone
    pub fn listing(zone_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Listing {
            zone_id: zone_id.into(),
            message: message.into(),
        }
    }

    /// Create a missing `Name` tag error
    pub fn missing_identity_tag(
        kind: LoadBalancerKind,
        load_balancer: impl Into<String>,
        record: impl Into<String>,
    ) -> Self {
        Self::MissingIdentityTag {
            kind,
            load_balancer: load_balancer.into(),
            record: record.into(),
        }
    }

    /// Create a required field error
    pub fn required_field(field: impl Into<String>) -> Self {
        Self::RequiredField(field.into())
    }

    /// Create a render submission error
    pub fn render(record: impl Into<String>, backend: Backend, message: impl Into<String>) -> Self {
        Self::RenderSubmission {
            record: record.into(),
            backend,
            message: message.into(),
        }
    }

    /// Create a load balancer lookup error
    pub fn lookup(dns_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LoadBalancerLookup {
            dns_name: dns_name.into(),
            message: message.into(),
        }
    }

    /// Create a lifecycle error
    pub fn lifecycle(record: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Lifecycle {
            record: record.into(),
            message: message.into(),
        }
    }

    /// Create a cloud API error
    pub fn api(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether retrying the same pass can never succeed without a change in
    /// the cloud or in the desired state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::MissingIdentityTag { .. }
                | Self::RequiredField(_)
                | Self::Lifecycle { .. }
                | Self::Config(_)
                | Self::InvalidInput(_)
        )
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
