//! EC2 Fleet backend
//!
//! Drives capacity-managed EC2 fleets (`fleet-` ids). Weights come from the
//! launch template overrides returned by the fleet description.

use crate::api::{
    ClientFactory, Ec2Api, ExcessCapacityPolicy, FleetListing, FleetRecord, LIST_ALL,
    describe_fleet_records,
};
use async_trait::async_trait;
use fleetpool_cloud::{
    BackendKind, CapacityRequest, Connection, FleetBackend, FleetCandidate, FleetError,
    FleetSnapshot, FleetStatus, Result, collect_pages, require_id, resolve_weights,
};
use std::collections::HashMap;
use std::sync::Arc;

/// EC2 Fleet backend
pub struct Ec2FleetBackend {
    factory: Arc<dyn ClientFactory>,
}

impl Ec2FleetBackend {
    pub fn new(factory: Arc<dyn ClientFactory>) -> Self {
        Self { factory }
    }
}

async fn list_members(ec2: &dyn Ec2Api, fleet_id: &str) -> Result<Vec<String>> {
    collect_pages(|token| ec2.describe_fleet_instances(fleet_id, token)).await
}

#[async_trait]
impl FleetBackend for Ec2FleetBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Ec2Fleet
    }

    #[tracing::instrument(skip(self, conn), fields(region = %conn.region))]
    async fn describe(
        &self,
        conn: &Connection,
        selected: Option<&str>,
        show_all: bool,
    ) -> Result<Vec<FleetCandidate>> {
        let ec2 = self.factory.ec2(conn).await?;
        let fleets: Vec<FleetRecord> =
            collect_pages(|token| ec2.describe_fleets(LIST_ALL, token)).await?;
        tracing::debug!(count = fleets.len(), "Listed EC2 fleets");

        let mut candidates = Vec::new();
        for fleet in fleets {
            let is_selected = selected == Some(fleet.id.as_str());
            if !(is_selected || show_all || fleet.is_active_maintain()) {
                continue;
            }
            let label = format!(
                "{} - {} ({}) ({})",
                BackendKind::Ec2Fleet.display_name(),
                fleet.id,
                fleet.state,
                fleet.fleet_type
            );
            candidates.push(FleetCandidate::new(label, fleet.id, is_selected));
        }
        Ok(candidates)
    }

    #[tracing::instrument(skip(self, conn), fields(region = %conn.region))]
    async fn modify(&self, conn: &Connection, id: &str, request: CapacityRequest) -> Result<()> {
        require_id(id)?;
        let ec2 = self.factory.ec2(conn).await?;

        tracing::info!(fleet_id = id, target = request.target, "Resizing EC2 fleet");
        ec2.modify_fleet(id, request.target, ExcessCapacityPolicy::NoTermination)
            .await
    }

    #[tracing::instrument(skip(self, conn), fields(region = %conn.region))]
    async fn get_state(&self, conn: &Connection, id: &str) -> Result<FleetSnapshot> {
        require_id(id)?;
        let ec2 = self.factory.ec2(conn).await?;

        let instance_ids = list_members(ec2.as_ref(), id).await?;

        let fleet = ec2
            .describe_fleets(&[id.to_string()], None)
            .await?
            .items
            .into_iter()
            .find(|f| f.id == id)
            .ok_or_else(|| FleetError::not_found(id, &conn.region))?;

        let weights = resolve_weights(fleet.weight_entries());

        Ok(FleetSnapshot::new(
            id,
            fleet.target_capacity,
            FleetStatus::from_fleet_state(fleet.state),
        )
        .with_instances(instance_ids)
        .with_weights(weights))
    }

    #[tracing::instrument(skip(self, conn), fields(region = %conn.region))]
    async fn get_state_batch(
        &self,
        conn: &Connection,
        ids: &[String],
    ) -> Result<HashMap<String, FleetSnapshot>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        ids.iter().try_for_each(|id| require_id(id))?;
        let ec2 = self.factory.ec2(conn).await?;

        let by_id =
            describe_fleet_records(ec2.as_ref(), FleetListing::Fleets, ids, &conn.region).await?;

        let mut states = HashMap::with_capacity(by_id.len());
        for id in ids {
            if states.contains_key(id) {
                continue;
            }
            let fleet = &by_id[id];
            let instance_ids = list_members(ec2.as_ref(), id).await?;
            states.insert(
                id.clone(),
                FleetSnapshot::new(
                    id.as_str(),
                    fleet.target_capacity,
                    FleetStatus::from_fleet_state(fleet.state.as_str()),
                )
                .with_instances(instance_ids),
            );
        }

        tracing::debug!(count = states.len(), "Read EC2 fleet states");
        Ok(states)
    }
}
