//! Fleet id routing
//!
//! Maps an opaque fleet id to the backend that owns it. Routing is a pure
//! function of the id prefix and never makes a remote call.

use crate::api::ClientFactory;
use crate::auto_scaling::AutoScalingGroupBackend;
use crate::ec2_fleet::Ec2FleetBackend;
use crate::sdk::SdkClientFactory;
use crate::spot_fleet::SpotFleetBackend;
use fleetpool_cloud::{
    BackendKind, Connection, FleetBackend, FleetCandidate, FleetSnapshot, Result, RetryConfig,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of the known fleet backends
#[derive(Clone)]
pub struct FleetRegistry {
    spot_fleet: Arc<dyn FleetBackend>,
    ec2_fleet: Arc<dyn FleetBackend>,
    auto_scaling: Arc<dyn FleetBackend>,

    /// When set, every id resolves to this backend
    forced: Option<Arc<dyn FleetBackend>>,
}

impl FleetRegistry {
    /// Build the three backends over one client factory
    pub fn new(factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            spot_fleet: Arc::new(SpotFleetBackend::new(factory.clone())),
            ec2_fleet: Arc::new(Ec2FleetBackend::new(factory.clone())),
            auto_scaling: Arc::new(AutoScalingGroupBackend::new(factory)),
            forced: None,
        }
    }

    /// Registry backed by the AWS SDK with the given transport retry policy
    pub fn with_sdk(retry: RetryConfig) -> Self {
        Self::new(Arc::new(SdkClientFactory::new(retry)))
    }

    /// Route every id to `backend` instead of classifying it
    pub fn with_override(mut self, backend: Arc<dyn FleetBackend>) -> Self {
        self.forced = Some(backend);
        self
    }

    /// The backend for one variant, ignoring any override
    pub fn backend(&self, kind: BackendKind) -> Arc<dyn FleetBackend> {
        match kind {
            BackendKind::SpotFleet => self.spot_fleet.clone(),
            BackendKind::Ec2Fleet => self.ec2_fleet.clone(),
            BackendKind::AutoScalingGroup => self.auto_scaling.clone(),
        }
    }

    /// The backend owning `id`
    pub fn resolve(&self, id: &str) -> Arc<dyn FleetBackend> {
        match &self.forced {
            Some(backend) => backend.clone(),
            None => self.backend(BackendKind::classify(id)),
        }
    }

    /// Every backend variant, in [`BackendKind::ALL`] order
    pub fn all_variants(&self) -> Vec<Arc<dyn FleetBackend>> {
        match &self.forced {
            Some(backend) => vec![backend.clone()],
            None => BackendKind::ALL
                .iter()
                .map(|kind| self.backend(*kind))
                .collect(),
        }
    }

    /// Candidates from every variant, concatenated in variant order
    pub async fn describe_all(
        &self,
        conn: &Connection,
        selected: Option<&str>,
        show_all: bool,
    ) -> Result<Vec<FleetCandidate>> {
        let mut candidates = Vec::new();
        for backend in self.all_variants() {
            candidates.extend(backend.describe(conn, selected, show_all).await?);
        }
        Ok(candidates)
    }

    /// Read snapshots for ids of mixed kinds, one batch per backend
    pub async fn get_state_batch(
        &self,
        conn: &Connection,
        ids: &[String],
    ) -> Result<HashMap<String, FleetSnapshot>> {
        let mut groups: Vec<(Arc<dyn FleetBackend>, Vec<String>)> = Vec::new();
        for id in ids {
            let backend = self.resolve(id);
            match groups.iter_mut().find(|(b, _)| b.kind() == backend.kind()) {
                Some((_, group)) => group.push(id.clone()),
                None => groups.push((backend, vec![id.clone()])),
            }
        }

        let mut states = HashMap::with_capacity(ids.len());
        for (backend, group) in groups {
            tracing::debug!(kind = %backend.kind(), count = group.len(), "Reading batch");
            states.extend(backend.get_state_batch(conn, &group).await?);
        }
        Ok(states)
    }
}
