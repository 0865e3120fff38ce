//! Remote call seam
//!
//! Backends talk to AWS only through these traits. The SDK-backed
//! implementations live in [`crate::sdk`]; tests substitute in-memory fakes.

use async_trait::async_trait;
use fleetpool_cloud::{
    CapacityRequest, Connection, FleetError, Page, Result, collect_pages, is_fleet_active,
};
use std::collections::HashMap;
use std::sync::Arc;

const FLEET_TYPE_MAINTAIN: &str = "maintain";

/// Empty id filter: list everything
pub const LIST_ALL: &[String] = &[];

/// Whether shrinking a fleet may terminate running instances
///
/// Scaling groups express `NoTermination` as scale-in protection for the
/// instances they launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExcessCapacityPolicy {
    /// Let the fleet terminate instances above the new target
    Default,
    /// Never terminate running instances on shrink
    NoTermination,
}

/// One instance-type entry of a fleet's launch configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchWeight {
    pub instance_type: String,
    pub weighted_capacity: Option<f64>,
}

impl LaunchWeight {
    pub fn new(instance_type: impl Into<String>, weighted_capacity: Option<f64>) -> Self {
        Self {
            instance_type: instance_type.into(),
            weighted_capacity,
        }
    }
}

/// Description of a spot fleet request or an EC2 fleet
#[derive(Debug, Clone, PartialEq)]
pub struct FleetRecord {
    pub id: String,

    /// Native state label (`submitted`, `active`, `modifying`, ...)
    pub state: String,

    /// Native request type (`maintain`, `request`, `instant`)
    pub fleet_type: String,

    pub target_capacity: u32,

    /// Launch specification and override entries, in remote order
    pub launch_weights: Vec<LaunchWeight>,
}

impl FleetRecord {
    pub fn new(
        id: impl Into<String>,
        state: impl Into<String>,
        fleet_type: impl Into<String>,
        target_capacity: u32,
    ) -> Self {
        Self {
            id: id.into(),
            state: state.into(),
            fleet_type: fleet_type.into(),
            target_capacity,
            launch_weights: Vec::new(),
        }
    }

    pub fn with_weight(mut self, instance_type: impl Into<String>, weight: Option<f64>) -> Self {
        self.launch_weights.push(LaunchWeight::new(instance_type, weight));
        self
    }

    /// A maintain-type fleet in an active-ish state
    pub fn is_active_maintain(&self) -> bool {
        self.fleet_type.eq_ignore_ascii_case(FLEET_TYPE_MAINTAIN) && is_fleet_active(&self.state)
    }

    /// Weight entries as `(instance_type, weight)` pairs
    pub fn weight_entries(&self) -> impl Iterator<Item = (String, Option<f64>)> + '_ {
        self.launch_weights
            .iter()
            .map(|w| (w.instance_type.clone(), w.weighted_capacity))
    }
}

/// Description of an Auto Scaling group
#[derive(Debug, Clone, PartialEq)]
pub struct ScalingGroupRecord {
    pub name: String,

    /// Only reported while the group is in an unusual state
    pub status: Option<String>,

    pub desired_capacity: u32,
    pub min_size: u32,
    pub max_size: u32,
    pub instance_ids: Vec<String>,
}

impl ScalingGroupRecord {
    pub fn new(name: impl Into<String>, desired_capacity: u32) -> Self {
        Self {
            name: name.into(),
            status: None,
            desired_capacity,
            min_size: 0,
            max_size: desired_capacity,
            instance_ids: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_instances<I, S>(mut self, instance_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instance_ids = instance_ids.into_iter().map(Into::into).collect();
        self
    }
}

/// EC2 calls used by the spot fleet and EC2 fleet backends
#[async_trait]
pub trait Ec2Api: Send + Sync {
    /// List spot fleet requests; an empty `ids` lists every request
    async fn describe_spot_fleet_requests(
        &self,
        ids: &[String],
        next_token: Option<String>,
    ) -> Result<Page<FleetRecord>>;

    async fn describe_spot_fleet_instances(
        &self,
        request_id: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>>;

    async fn modify_spot_fleet_request(
        &self,
        request_id: &str,
        target_capacity: u32,
        policy: ExcessCapacityPolicy,
    ) -> Result<()>;

    /// List EC2 fleets; an empty `ids` lists every fleet
    async fn describe_fleets(
        &self,
        ids: &[String],
        next_token: Option<String>,
    ) -> Result<Page<FleetRecord>>;

    async fn describe_fleet_instances(
        &self,
        fleet_id: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>>;

    async fn modify_fleet(
        &self,
        fleet_id: &str,
        target_capacity: u32,
        policy: ExcessCapacityPolicy,
    ) -> Result<()>;

    /// Names of the regions enabled for the account
    async fn describe_regions(&self) -> Result<Vec<String>>;
}

/// Auto Scaling calls used by the scaling group backend
#[async_trait]
pub trait AutoScalingApi: Send + Sync {
    /// List groups; an empty `names` lists every group
    async fn describe_auto_scaling_groups(
        &self,
        names: &[String],
        next_token: Option<String>,
    ) -> Result<Page<ScalingGroupRecord>>;

    async fn update_auto_scaling_group(
        &self,
        name: &str,
        request: CapacityRequest,
        policy: ExcessCapacityPolicy,
    ) -> Result<()>;
}

/// Which EC2 fleet listing to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FleetListing {
    SpotFleetRequests,
    Fleets,
}

impl FleetListing {
    async fn describe(
        self,
        ec2: &dyn Ec2Api,
        ids: &[String],
        next_token: Option<String>,
    ) -> Result<Page<FleetRecord>> {
        match self {
            FleetListing::SpotFleetRequests => {
                ec2.describe_spot_fleet_requests(ids, next_token).await
            }
            FleetListing::Fleets => ec2.describe_fleets(ids, next_token).await,
        }
    }
}

/// Describe exactly `ids`, keyed by id
///
/// EC2 rejects a filtered describe as a whole when any one id is unknown, so
/// the listing can come back short without saying which id was at fault. Ids
/// missing from a multi-id listing are described one at a time; the first
/// that still has no record is reported as NotFound.
pub async fn describe_fleet_records(
    ec2: &dyn Ec2Api,
    listing: FleetListing,
    ids: &[String],
    region: &str,
) -> Result<HashMap<String, FleetRecord>> {
    let records = collect_pages(|token| listing.describe(ec2, ids, token)).await?;
    let mut by_id: HashMap<String, FleetRecord> = records
        .into_iter()
        .filter(|r| ids.contains(&r.id))
        .map(|r| (r.id.clone(), r))
        .collect();

    for id in ids {
        if by_id.contains_key(id) {
            continue;
        }
        if ids.len() == 1 {
            return Err(FleetError::not_found(id.as_str(), region));
        }

        tracing::debug!(fleet_id = %id, "Describing fleet on its own");
        let single = [id.clone()];
        let record = collect_pages(|token| listing.describe(ec2, &single, token))
            .await?
            .into_iter()
            .find(|r| r.id == *id)
            .ok_or_else(|| FleetError::not_found(id.as_str(), region))?;
        by_id.insert(id.clone(), record);
    }

    Ok(by_id)
}

/// Builds remote clients for a connection
///
/// Called once per backend operation; implementations must not cache state
/// that would make two operations observe each other.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn ec2(&self, conn: &Connection) -> Result<Arc<dyn Ec2Api>>;

    async fn auto_scaling(&self, conn: &Connection) -> Result<Arc<dyn AutoScalingApi>>;
}
