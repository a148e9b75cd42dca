// # dnsname-core
//
// Core library for reconciling DNS alias records and rendering them into
// several backends.
//
// ## Architecture Overview
//
// - **Route53Api / LoadBalancerApi**: Traits for the cloud services consumed
// - **DnsName**: The alias record intent with Find / CheckChanges / Render
// - **Discovery**: Paginated record-set lookup by (name, type)
// - **Resolver**: Maps an alias target back to the load balancer behind it
// - **Render targets**: Live Route 53, dry-run, Terraform JSON, CloudFormation
// - **ReconcileEngine**: Runs one pass per record and reports the outcome
// - **MemoryCloud**: In-memory cloud, loadable from a snapshot file
//
// ## Design Principles
//
// 1. **Explicit context**: Cloud clients travel in a `Context`, never a global
// 2. **Closed target set**: Classic and network load balancers form a tagged enum
// 3. **Mode fixed at startup**: The render backend is chosen once per engine
// 4. **No retries**: Every failure surfaces; passes are re-run by the caller

pub mod cloud;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod model;
pub mod render;
pub mod resolver;
pub mod traits;

// Re-export core types for convenience
pub use cloud::{CloudSnapshot, MemoryCloud};
pub use config::{RecordConfig, ReconcileConfig, TargetConfig, ZoneConfig};
pub use engine::{Context, Delta, EngineEvent, ReconcileEngine, ReconcileReport, RunOutcome};
pub use error::{Error, Result};
pub use model::{DnsName, DnsNameChanges, DnsTarget, DnsZone, Lifecycle, LoadBalancerRef};
pub use render::{Backend, ReferenceLiteral, RenderTarget};
pub use traits::{AwsCloud, LoadBalancerApi, LoadBalancerKind, Route53Api};
