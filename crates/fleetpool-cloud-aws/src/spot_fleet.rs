//! Spot Fleet backend
//!
//! Drives spot fleet requests (`sfr-` ids). Requests and their active
//! instances are listed through separate token-paginated calls.

use crate::api::{
    ClientFactory, ExcessCapacityPolicy, FleetListing, FleetRecord, LIST_ALL, describe_fleet_records,
};
use async_trait::async_trait;
use fleetpool_cloud::{
    BackendKind, CapacityRequest, Connection, FleetBackend, FleetCandidate, FleetError,
    FleetSnapshot, FleetStatus, Result, collect_pages, require_id, resolve_weights,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Spot Fleet backend
pub struct SpotFleetBackend {
    factory: Arc<dyn ClientFactory>,
}

impl SpotFleetBackend {
    pub fn new(factory: Arc<dyn ClientFactory>) -> Self {
        Self { factory }
    }
}

fn candidate_label(record: &FleetRecord) -> String {
    format!(
        "{} - {} ({}) ({})",
        BackendKind::SpotFleet.display_name(),
        record.id,
        record.state,
        record.fleet_type
    )
}

#[async_trait]
impl FleetBackend for SpotFleetBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::SpotFleet
    }

    #[tracing::instrument(skip(self, conn), fields(region = %conn.region))]
    async fn describe(
        &self,
        conn: &Connection,
        selected: Option<&str>,
        show_all: bool,
    ) -> Result<Vec<FleetCandidate>> {
        let ec2 = self.factory.ec2(conn).await?;
        let records =
            collect_pages(|token| ec2.describe_spot_fleet_requests(LIST_ALL, token)).await?;
        tracing::debug!(count = records.len(), "Listed spot fleet requests");

        Ok(records
            .iter()
            .filter_map(|record| {
                let is_selected = selected == Some(record.id.as_str());
                (is_selected || show_all || record.is_active_maintain()).then(|| {
                    FleetCandidate::new(candidate_label(record), record.id.clone(), is_selected)
                })
            })
            .collect())
    }

    #[tracing::instrument(skip(self, conn), fields(region = %conn.region))]
    async fn modify(&self, conn: &Connection, id: &str, request: CapacityRequest) -> Result<()> {
        require_id(id)?;
        let ec2 = self.factory.ec2(conn).await?;

        tracing::info!(fleet_id = id, target = request.target, "Resizing spot fleet");
        ec2.modify_spot_fleet_request(id, request.target, ExcessCapacityPolicy::NoTermination)
            .await
    }

    #[tracing::instrument(skip(self, conn), fields(region = %conn.region))]
    async fn get_state(&self, conn: &Connection, id: &str) -> Result<FleetSnapshot> {
        require_id(id)?;
        let ec2 = self.factory.ec2(conn).await?;

        let instance_ids =
            collect_pages(|token| ec2.describe_spot_fleet_instances(id, token)).await?;

        let ids = [id.to_string()];
        let record = ec2
            .describe_spot_fleet_requests(&ids, None)
            .await?
            .items
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| FleetError::not_found(id, &conn.region))?;

        let weights = resolve_weights(record.weight_entries());
        tracing::debug!(
            fleet_id = id,
            instances = instance_ids.len(),
            weights = weights.len(),
            "Read spot fleet state"
        );

        Ok(FleetSnapshot::new(
            id,
            record.target_capacity,
            FleetStatus::from_fleet_state(record.state),
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
        for id in ids {
            require_id(id)?;
        }
        let ec2 = self.factory.ec2(conn).await?;

        let by_id = describe_fleet_records(
            ec2.as_ref(),
            FleetListing::SpotFleetRequests,
            ids,
            &conn.region,
        )
        .await?;

        // One membership listing per fleet
        let mut states = HashMap::with_capacity(by_id.len());
        for id in ids {
            if states.contains_key(id) {
                continue;
            }
            let record = &by_id[id];
            let instance_ids =
                collect_pages(|token| ec2.describe_spot_fleet_instances(id, token)).await?;
            let snapshot = FleetSnapshot::new(
                id.as_str(),
                record.target_capacity,
                FleetStatus::from_fleet_state(record.state.as_str()),
            )
            .with_instances(instance_ids);
            states.insert(id.clone(), snapshot);
        }

        Ok(states)
    }
}
