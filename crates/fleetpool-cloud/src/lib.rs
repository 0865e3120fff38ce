//! FleetPool Cloud Backends
//!
//! This crate provides the provider-neutral layer of FleetPool: one contract
//! for resizing and inspecting elastic compute fleets, regardless of which
//! provisioning primitive backs them.
//!
//! # Supported Backends
//!
//! - **Spot Fleet**: spot-priced batch fleets (`sfr-` ids)
//! - **EC2 Fleet**: capacity-managed fleets (`fleet-` ids)
//! - **Auto Scaling Group**: everything else
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │            Autoscaling control loop              │
//! └─────────────────┬───────────────────────────────┘
//!                   │ resolve(id)
//! ┌─────────────────▼───────────────────────────────┐
//! │               fleetpool-cloud                    │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │          Backend Abstraction              │   │
//! │  │  trait FleetBackend { ... }               │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │  Pagination  │  │   Weights    │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────┬──────────────┬────────┘
//!         │                 │              │
//! ┌───────▼──────┐ ┌────────▼─────┐ ┌──────▼───────┐
//! │  spot fleet  │ │  EC2 fleet   │ │ scaling group│
//! └──────────────┘ └──────────────┘ └──────────────┘
//! ```

pub mod backend;
pub mod error;
pub mod kind;
pub mod pagination;
pub mod snapshot;
pub mod weights;

// Re-exports
pub use backend::{
    CapacityRequest, Connection, FleetBackend, FleetCandidate, RetryConfig, require_id,
};
pub use error::{FleetError, Result};
pub use kind::{BackendKind, EC2_FLEET_PREFIX, SPOT_FLEET_PREFIX};
pub use pagination::{Page, collect_pages};
pub use snapshot::{FleetSnapshot, FleetStatus, is_fleet_active, is_fleet_modifying};
pub use weights::resolve_weights;
