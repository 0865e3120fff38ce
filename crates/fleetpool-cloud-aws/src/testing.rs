//! In-memory fakes of the remote APIs
//!
//! Listings are served as numbered pages (`page-1`, `page-2`, ...) so callers
//! can observe pagination. Every call is recorded in a shared log.

use crate::api::{
    AutoScalingApi, ClientFactory, Ec2Api, ExcessCapacityPolicy, FleetRecord, ScalingGroupRecord,
};
use async_trait::async_trait;
use fleetpool_cloud::{CapacityRequest, Connection, FleetError, Page, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A recorded remote call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    DescribeSpotFleetRequests {
        ids: Vec<String>,
        token: Option<String>,
    },
    DescribeSpotFleetInstances {
        id: String,
        token: Option<String>,
    },
    ModifySpotFleetRequest {
        id: String,
        target: u32,
        policy: ExcessCapacityPolicy,
    },
    DescribeFleets {
        ids: Vec<String>,
        token: Option<String>,
    },
    DescribeFleetInstances {
        id: String,
        token: Option<String>,
    },
    ModifyFleet {
        id: String,
        target: u32,
        policy: ExcessCapacityPolicy,
    },
    DescribeRegions,
    DescribeAutoScalingGroups {
        names: Vec<String>,
        token: Option<String>,
    },
    UpdateAutoScalingGroup {
        name: String,
        request: CapacityRequest,
        policy: ExcessCapacityPolicy,
    },
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

fn page_index(token: Option<&str>) -> Result<usize> {
    match token {
        None => Ok(0),
        Some(t) => t
            .strip_prefix("page-")
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| FleetError::RemoteUnavailable(format!("invalid token {t}"))),
    }
}

/// Serve `pages[index]` with a token pointing at the next page
fn serve<T: Clone>(pages: &[Vec<T>], token: Option<&str>) -> Result<Page<T>> {
    let index = page_index(token)?;
    let items = pages.get(index).cloned().unwrap_or_default();
    let next_token = (index + 1 < pages.len()).then(|| format!("page-{}", index + 1));
    Ok(Page::new(items, next_token))
}

/// How a fake answers a describe filtered by ids
#[derive(Debug, Clone, Copy, Default)]
struct FilterMode {
    /// Split matches into pages of this size; one page when unset
    page_size: Option<usize>,

    /// Answer with an empty page when any requested id is unknown, the way the
    /// SDK adapter maps EC2's `*.NotFound` rejection
    reject_unknown: bool,
}

fn filter_records<T: Clone>(
    pages: &[Vec<T>],
    ids: &[String],
    id_of: impl Fn(&T) -> &str,
    mode: FilterMode,
    token: Option<&str>,
) -> Result<Page<T>> {
    let matches: Vec<T> = pages
        .iter()
        .flatten()
        .filter(|r| ids.iter().any(|id| id == id_of(r)))
        .cloned()
        .collect();

    if mode.reject_unknown && !ids.iter().all(|id| matches.iter().any(|r| id_of(r) == id)) {
        return Ok(Page::last(Vec::new()));
    }
    match mode.page_size {
        Some(size) => {
            let chunks: Vec<Vec<T>> = matches.chunks(size.max(1)).map(<[T]>::to_vec).collect();
            serve(&chunks, token)
        }
        None => Ok(Page::last(matches)),
    }
}

#[derive(Default)]
struct Ec2State {
    spot_fleets: Vec<Vec<FleetRecord>>,
    spot_instances: HashMap<String, Vec<Vec<String>>>,
    fleets: Vec<Vec<FleetRecord>>,
    fleet_instances: HashMap<String, Vec<Vec<String>>>,
    regions: Option<Vec<String>>,
    filter: FilterMode,
    failure: Option<String>,
}

/// Fake EC2 API
pub struct FakeEc2 {
    state: Mutex<Ec2State>,
    log: CallLog,
}

impl FakeEc2 {
    pub fn new(log: CallLog) -> Self {
        Self {
            state: Mutex::new(Ec2State::default()),
            log,
        }
    }

    /// Spot fleet request listing, one inner vec per page
    pub fn with_spot_fleet_pages(self, pages: Vec<Vec<FleetRecord>>) -> Self {
        self.lock().spot_fleets = pages;
        self
    }

    pub fn with_spot_instances(self, id: &str, pages: Vec<Vec<&str>>) -> Self {
        self.lock()
            .spot_instances
            .insert(id.to_string(), to_owned_pages(pages));
        self
    }

    /// EC2 fleet listing, one inner vec per page
    pub fn with_fleet_pages(self, pages: Vec<Vec<FleetRecord>>) -> Self {
        self.lock().fleets = pages;
        self
    }

    pub fn with_fleet_instances(self, id: &str, pages: Vec<Vec<&str>>) -> Self {
        self.lock()
            .fleet_instances
            .insert(id.to_string(), to_owned_pages(pages));
        self
    }

    pub fn with_regions(self, regions: &[&str]) -> Self {
        self.lock().regions = Some(regions.iter().map(|r| r.to_string()).collect());
        self
    }

    /// Page filtered describes `size` records at a time
    pub fn with_filter_page_size(self, size: usize) -> Self {
        self.lock().filter.page_size = Some(size);
        self
    }

    /// Answer a filtered describe naming any unknown id with an empty page
    pub fn rejecting_unknown_ids(self) -> Self {
        self.lock().filter.reject_unknown = true;
        self
    }

    /// Make every call fail with a remote error
    pub fn failing(self, message: &str) -> Self {
        self.lock().failure = Some(message.to_string());
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Ec2State> {
        self.state.lock().unwrap()
    }

    fn record(&self, call: Call) -> Result<()> {
        self.log.lock().unwrap().push(call);
        let failure = self.lock().failure.clone();
        match failure {
            Some(message) => Err(FleetError::RemoteUnavailable(message)),
            None => Ok(()),
        }
    }
}

fn to_owned_pages(pages: Vec<Vec<&str>>) -> Vec<Vec<String>> {
    pages
        .into_iter()
        .map(|p| p.into_iter().map(str::to_string).collect())
        .collect()
}

fn set_target(pages: &mut [Vec<FleetRecord>], id: &str, target: u32) -> Result<()> {
    let record = pages
        .iter_mut()
        .flatten()
        .find(|r| r.id == id)
        .ok_or_else(|| FleetError::RemoteUnavailable(format!("unknown fleet {id}")))?;
    record.target_capacity = target;
    record.state = "modifying".to_string();
    Ok(())
}

#[async_trait]
impl Ec2Api for FakeEc2 {
    async fn describe_spot_fleet_requests(
        &self,
        ids: &[String],
        next_token: Option<String>,
    ) -> Result<Page<FleetRecord>> {
        self.record(Call::DescribeSpotFleetRequests {
            ids: ids.to_vec(),
            token: next_token.clone(),
        })?;
        let state = self.lock();
        if ids.is_empty() {
            serve(&state.spot_fleets, next_token.as_deref())
        } else {
            filter_records(
                &state.spot_fleets,
                ids,
                |r| r.id.as_str(),
                state.filter,
                next_token.as_deref(),
            )
        }
    }

    async fn describe_spot_fleet_instances(
        &self,
        request_id: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>> {
        self.record(Call::DescribeSpotFleetInstances {
            id: request_id.to_string(),
            token: next_token.clone(),
        })?;
        let state = self.lock();
        let pages = state.spot_instances.get(request_id).cloned().unwrap_or_default();
        serve(&pages, next_token.as_deref())
    }

    async fn modify_spot_fleet_request(
        &self,
        request_id: &str,
        target_capacity: u32,
        policy: ExcessCapacityPolicy,
    ) -> Result<()> {
        self.record(Call::ModifySpotFleetRequest {
            id: request_id.to_string(),
            target: target_capacity,
            policy,
        })?;
        set_target(&mut self.lock().spot_fleets, request_id, target_capacity)
    }

    async fn describe_fleets(
        &self,
        ids: &[String],
        next_token: Option<String>,
    ) -> Result<Page<FleetRecord>> {
        self.record(Call::DescribeFleets {
            ids: ids.to_vec(),
            token: next_token.clone(),
        })?;
        let state = self.lock();
        if ids.is_empty() {
            serve(&state.fleets, next_token.as_deref())
        } else {
            filter_records(
                &state.fleets,
                ids,
                |r| r.id.as_str(),
                state.filter,
                next_token.as_deref(),
            )
        }
    }

    async fn describe_fleet_instances(
        &self,
        fleet_id: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>> {
        self.record(Call::DescribeFleetInstances {
            id: fleet_id.to_string(),
            token: next_token.clone(),
        })?;
        let state = self.lock();
        let pages = state.fleet_instances.get(fleet_id).cloned().unwrap_or_default();
        serve(&pages, next_token.as_deref())
    }

    async fn modify_fleet(
        &self,
        fleet_id: &str,
        target_capacity: u32,
        policy: ExcessCapacityPolicy,
    ) -> Result<()> {
        self.record(Call::ModifyFleet {
            id: fleet_id.to_string(),
            target: target_capacity,
            policy,
        })?;
        set_target(&mut self.lock().fleets, fleet_id, target_capacity)
    }

    async fn describe_regions(&self) -> Result<Vec<String>> {
        self.record(Call::DescribeRegions)?;
        self.lock()
            .regions
            .clone()
            .ok_or_else(|| FleetError::RemoteUnavailable("UnauthorizedOperation".to_string()))
    }
}

#[derive(Default)]
struct AutoScalingState {
    groups: Vec<Vec<ScalingGroupRecord>>,
    filter: FilterMode,
    failure: Option<String>,
}

/// Fake Auto Scaling API
pub struct FakeAutoScaling {
    state: Mutex<AutoScalingState>,
    log: CallLog,
}

impl FakeAutoScaling {
    pub fn new(log: CallLog) -> Self {
        Self {
            state: Mutex::new(AutoScalingState::default()),
            log,
        }
    }

    /// Group listing, one inner vec per page
    pub fn with_group_pages(self, pages: Vec<Vec<ScalingGroupRecord>>) -> Self {
        self.lock().groups = pages;
        self
    }

    /// Page filtered describes `size` groups at a time
    pub fn with_filter_page_size(self, size: usize) -> Self {
        self.lock().filter.page_size = Some(size);
        self
    }

    pub fn failing(self, message: &str) -> Self {
        self.lock().failure = Some(message.to_string());
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AutoScalingState> {
        self.state.lock().unwrap()
    }

    fn record(&self, call: Call) -> Result<()> {
        self.log.lock().unwrap().push(call);
        let failure = self.lock().failure.clone();
        match failure {
            Some(message) => Err(FleetError::RemoteUnavailable(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AutoScalingApi for FakeAutoScaling {
    async fn describe_auto_scaling_groups(
        &self,
        names: &[String],
        next_token: Option<String>,
    ) -> Result<Page<ScalingGroupRecord>> {
        self.record(Call::DescribeAutoScalingGroups {
            names: names.to_vec(),
            token: next_token.clone(),
        })?;
        let state = self.lock();
        if names.is_empty() {
            serve(&state.groups, next_token.as_deref())
        } else {
            filter_records(
                &state.groups,
                names,
                |g| g.name.as_str(),
                state.filter,
                next_token.as_deref(),
            )
        }
    }

    async fn update_auto_scaling_group(
        &self,
        name: &str,
        request: CapacityRequest,
        policy: ExcessCapacityPolicy,
    ) -> Result<()> {
        self.record(Call::UpdateAutoScalingGroup {
            name: name.to_string(),
            request,
            policy,
        })?;
        let mut state = self.lock();
        let group = state
            .groups
            .iter_mut()
            .flatten()
            .find(|g| g.name == name)
            .ok_or_else(|| FleetError::RemoteUnavailable(format!("unknown group {name}")))?;
        group.desired_capacity = request.target;
        group.min_size = request.min;
        group.max_size = request.max;
        Ok(())
    }
}

/// Factory handing out the same fakes for every connection
pub struct FakeFactory {
    pub ec2: Arc<FakeEc2>,
    pub auto_scaling: Arc<FakeAutoScaling>,
    pub log: CallLog,
    connections: Mutex<Vec<Connection>>,
}

impl FakeFactory {
    pub fn new() -> Self {
        let log = CallLog::default();
        Self::from_parts(
            FakeEc2::new(log.clone()),
            FakeAutoScaling::new(log.clone()),
            log,
        )
    }

    /// Build from fakes that share `log`
    pub fn from_parts(ec2: FakeEc2, auto_scaling: FakeAutoScaling, log: CallLog) -> Self {
        Self {
            ec2: Arc::new(ec2),
            auto_scaling: Arc::new(auto_scaling),
            log,
            connections: Mutex::new(Vec::new()),
        }
    }

    /// Shorthand for a factory serving only the given EC2 fake
    pub fn with_ec2(build: impl FnOnce(FakeEc2) -> FakeEc2) -> Self {
        let log = CallLog::default();
        Self::from_parts(
            build(FakeEc2::new(log.clone())),
            FakeAutoScaling::new(log.clone()),
            log,
        )
    }

    /// Shorthand for a factory serving only the given Auto Scaling fake
    pub fn with_auto_scaling(build: impl FnOnce(FakeAutoScaling) -> FakeAutoScaling) -> Self {
        let log = CallLog::default();
        Self::from_parts(
            FakeEc2::new(log.clone()),
            build(FakeAutoScaling::new(log.clone())),
            log,
        )
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.lock().unwrap().clone()
    }

    /// Connections passed to the factory, in order
    pub fn connections(&self) -> Vec<Connection> {
        self.connections.lock().unwrap().clone()
    }
}

impl Default for FakeFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClientFactory for FakeFactory {
    async fn ec2(&self, conn: &Connection) -> Result<Arc<dyn Ec2Api>> {
        self.connections.lock().unwrap().push(conn.clone());
        Ok(self.ec2.clone())
    }

    async fn auto_scaling(&self, conn: &Connection) -> Result<Arc<dyn AutoScalingApi>> {
        self.connections.lock().unwrap().push(conn.clone());
        Ok(self.auto_scaling.clone())
    }
}
