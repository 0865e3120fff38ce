//! AWS fleet backends for FleetPool
//!
//! This crate implements the FleetBackend trait for the three AWS
//! provisioning primitives and routes fleet ids to them.
//!
//! # Features
//!
//! - Spot Fleet requests (`sfr-` ids)
//! - EC2 Fleets (`fleet-` ids)
//! - Auto Scaling groups (any other id)
//!
//! # Requirements
//!
//! - AWS credentials resolvable by the default provider chain, or a named
//!   profile passed as `credentials_ref`
//!
//! # Example
//!
//! ```ignore
//! use fleetpool_cloud::{CapacityRequest, Connection, RetryConfig};
//! use fleetpool_cloud_aws::FleetRegistry;
//!
//! let registry = FleetRegistry::with_sdk(RetryConfig::default());
//! let conn = Connection::new("us-east-1");
//!
//! let backend = registry.resolve("sfr-0123456789");
//! let snapshot = backend.get_state(&conn, "sfr-0123456789").await?;
//! backend
//!     .modify(&conn, "sfr-0123456789", CapacityRequest::new(5, 0, 10))
//!     .await?;
//! ```

pub mod api;
pub mod auto_scaling;
pub mod ec2_fleet;
pub mod regions;
pub mod registry;
pub mod sdk;
pub mod spot_fleet;

#[cfg(test)]
pub mod testing;

pub use api::{
    AutoScalingApi, ClientFactory, Ec2Api, ExcessCapacityPolicy, FleetRecord, LaunchWeight,
    ScalingGroupRecord,
};
pub use auto_scaling::AutoScalingGroupBackend;
pub use ec2_fleet::Ec2FleetBackend;
pub use regions::available_regions;
pub use registry::FleetRegistry;
pub use sdk::SdkClientFactory;
pub use spot_fleet::SpotFleetBackend;
