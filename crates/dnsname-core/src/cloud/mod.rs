//! In-memory cloud backend
//!
//! - [`MemoryCloud`]: Route 53, ELB and ELBv2 held in memory
//! - [`CloudSnapshot`]: JSON file a memory cloud is loaded from and saved to

pub mod memory;
pub mod snapshot;

pub use memory::{LoadBalancerEntry, MemoryCloud, MemoryLoadBalancers, MemoryRoute53};
pub use snapshot::{CloudSnapshot, HostedZoneSnapshot};
