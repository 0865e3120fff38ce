//! Auto Scaling group backend
//!
//! Any id without a fleet prefix is treated as a group name. Group members
//! come embedded in the group description, so there is no separate instance
//! listing. Groups have no weighted capacity.

use crate::api::{ClientFactory, ExcessCapacityPolicy, LIST_ALL, ScalingGroupRecord};
use async_trait::async_trait;
use fleetpool_cloud::{
    BackendKind, CapacityRequest, Connection, FleetBackend, FleetCandidate, FleetError,
    FleetSnapshot, FleetStatus, Result, collect_pages, require_id,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Auto Scaling group backend
pub struct AutoScalingGroupBackend {
    factory: Arc<dyn ClientFactory>,
}

impl AutoScalingGroupBackend {
    pub fn new(factory: Arc<dyn ClientFactory>) -> Self {
        Self { factory }
    }
}

fn to_snapshot(group: ScalingGroupRecord) -> FleetSnapshot {
    FleetSnapshot::new(
        group.name,
        group.desired_capacity,
        FleetStatus::from_group_status(group.status.as_deref()),
    )
    .with_instances(group.instance_ids)
}

#[async_trait]
impl FleetBackend for AutoScalingGroupBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::AutoScalingGroup
    }

    /// Every group is offered; there is no eligibility filter
    #[tracing::instrument(skip(self, conn), fields(region = %conn.region))]
    async fn describe(
        &self,
        conn: &Connection,
        selected: Option<&str>,
        _show_all: bool,
    ) -> Result<Vec<FleetCandidate>> {
        let client = self.factory.auto_scaling(conn).await?;
        let groups =
            collect_pages(|token| client.describe_auto_scaling_groups(LIST_ALL, token)).await?;
        tracing::debug!(count = groups.len(), "Listed Auto Scaling groups");

        Ok(groups
            .into_iter()
            .map(|group| {
                let is_selected = selected == Some(group.name.as_str());
                FleetCandidate::new(
                    format!(
                        "{} - {}",
                        BackendKind::AutoScalingGroup.display_name(),
                        group.name
                    ),
                    group.name,
                    is_selected,
                )
            })
            .collect())
    }

    #[tracing::instrument(skip(self, conn), fields(region = %conn.region))]
    async fn modify(&self, conn: &Connection, id: &str, request: CapacityRequest) -> Result<()> {
        require_id(id)?;
        request.validate_bounds()?;
        let client = self.factory.auto_scaling(conn).await?;

        tracing::info!(
            group = id,
            desired = request.target,
            min = request.min,
            max = request.max,
            "Updating Auto Scaling group"
        );
        client
            .update_auto_scaling_group(id, request, ExcessCapacityPolicy::NoTermination)
            .await
    }

    #[tracing::instrument(skip(self, conn), fields(region = %conn.region))]
    async fn get_state(&self, conn: &Connection, id: &str) -> Result<FleetSnapshot> {
        require_id(id)?;
        let client = self.factory.auto_scaling(conn).await?;

        let names = [id.to_string()];
        let group = collect_pages(|token| client.describe_auto_scaling_groups(&names, token))
            .await?
            .into_iter()
            .find(|g| g.name == id)
            .ok_or_else(|| FleetError::not_found(id, &conn.region))?;

        Ok(to_snapshot(group))
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
        let client = self.factory.auto_scaling(conn).await?;

        let groups = collect_pages(|token| client.describe_auto_scaling_groups(ids, token)).await?;
        let states: HashMap<String, FleetSnapshot> = groups
            .into_iter()
            .filter(|g| ids.contains(&g.name))
            .map(|g| (g.name.clone(), to_snapshot(g)))
            .collect();

        match ids.iter().find(|id| !states.contains_key(*id)) {
            Some(missing) => Err(FleetError::not_found(missing.as_str(), &conn.region)),
            None => Ok(states),
        }
    }
}
