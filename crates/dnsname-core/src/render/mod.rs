//! Render targets
//!
//! One desired record can be rendered into four shapes:
//!
//! - [`AwsApiTarget`]: applied live through the Route 53 API
//! - [`DryRunTarget`]: collected as planned changes, nothing applied
//! - [`TerraformTarget`]: emitted as a Terraform JSON resource
//! - [`CloudformationTarget`]: emitted as a CloudFormation template resource
//!
//! The backend is chosen once, when the engine is built, and every record in
//! the pass is rendered into the same [`RenderTarget`].

pub mod aws;
pub mod cloudformation;
pub mod dry_run;
pub mod terraform;

pub use aws::AwsApiTarget;
pub use cloudformation::CloudformationTarget;
pub use dry_run::{DryRunTarget, PlannedChange};
pub use terraform::TerraformTarget;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::traits::AwsCloud;

/// Execution mode / render backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Mutate Route 53 directly
    Live,
    /// Report what live mode would do
    DryRun,
    /// Emit Terraform JSON
    Terraform,
    /// Emit a CloudFormation template
    #[serde(rename = "cloudformation")]
    CloudFormation,
}

impl Backend {
    /// Whether this backend produces a configuration document
    ///
    /// Document backends render every record, unchanged ones included, since
    /// the document must describe the complete desired state.
    pub fn is_generator(&self) -> bool {
        matches!(self, Backend::Terraform | Backend::CloudFormation)
    }

    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Live => "live",
            Backend::DryRun => "dry-run",
            Backend::Terraform => "terraform",
            Backend::CloudFormation => "cloudformation",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "live" | "aws" => Ok(Backend::Live),
            "dry-run" | "dry_run" | "dryrun" => Ok(Backend::DryRun),
            "terraform" => Ok(Backend::Terraform),
            "cloudformation" => Ok(Backend::CloudFormation),
            other => Err(Error::config(format!(
                "unknown execution mode '{}'. Valid modes: live, dry-run, terraform, cloudformation",
                other
            ))),
        }
    }
}

/// Backend-specific symbolic identifier other resources use to reference a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceLiteral {
    /// Live and dry-run: the record name itself
    Name(String),
    /// `${aws_route53_record.<name>.id}`
    Terraform(terraform::Literal),
    /// `{"Ref": <logical id>}`
    CloudFormation(cloudformation::Literal),
}

/// The render target for one reconciliation pass
#[derive(Debug)]
pub enum RenderTarget {
    /// Live Route 53 mutation
    Aws(AwsApiTarget),
    /// Planned changes only
    DryRun(DryRunTarget),
    /// Terraform JSON document
    Terraform(TerraformTarget),
    /// CloudFormation template
    CloudFormation(CloudformationTarget),
}

impl RenderTarget {
    /// Build the target for a backend
    pub fn for_backend(backend: Backend, cloud: &AwsCloud) -> Self {
        match backend {
            Backend::Live => RenderTarget::Aws(AwsApiTarget::new(cloud.clone())),
            Backend::DryRun => RenderTarget::DryRun(DryRunTarget::new()),
            Backend::Terraform => RenderTarget::Terraform(TerraformTarget::new()),
            Backend::CloudFormation => RenderTarget::CloudFormation(CloudformationTarget::new()),
        }
    }

    /// The backend this target renders for
    pub fn backend(&self) -> Backend {
        match self {
            RenderTarget::Aws(_) => Backend::Live,
            RenderTarget::DryRun(_) => Backend::DryRun,
            RenderTarget::Terraform(_) => Backend::Terraform,
            RenderTarget::CloudFormation(_) => Backend::CloudFormation,
        }
    }
}

/// Write a file atomically: write to a sibling temp file, then rename over
/// the destination
pub(crate) async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).await?;
    }

    let tmp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&tmp_path).await?;
    file.write_all(contents).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(&tmp_path, path).await?;
    tracing::debug!("Wrote {}", path.display());
    Ok(())
}
