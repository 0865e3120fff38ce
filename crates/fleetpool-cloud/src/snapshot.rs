//! Point-in-time fleet snapshots
//!
//! A [`FleetSnapshot`] is produced fresh by every state read. It has no
//! backing store and exposes no mutating accessors.

use serde::{Serialize, Serializer};
use std::collections::{BTreeSet, HashMap, HashSet};

const STATE_SUBMITTED: &str = "submitted";
const STATE_ACTIVE: &str = "active";
const STATE_MODIFYING: &str = "modifying";

/// Normalized health state of a fleet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FleetStatus {
    /// Fleet can currently accept and serve load
    pub is_active: bool,

    /// A capacity change is in flight
    pub is_modifying: bool,

    /// Backend-native state label, kept for diagnostics only
    pub raw_state: String,
}

impl FleetStatus {
    /// Classify a spot fleet or EC2 fleet state label.
    ///
    /// `submitted` and `modifying` are both active and modifying, `active` is
    /// active only, anything else is neither.
    pub fn from_fleet_state(raw_state: impl Into<String>) -> Self {
        let raw_state = raw_state.into();
        let is_active = is_fleet_active(&raw_state);
        let is_modifying = is_fleet_modifying(&raw_state);
        Self {
            is_active,
            is_modifying,
            raw_state,
        }
    }

    /// Classify a scaling group status.
    ///
    /// Groups only report a status while something unusual is happening
    /// (e.g. "Delete in progress"), so an absent or empty status is active.
    pub fn from_group_status(status: Option<&str>) -> Self {
        match status {
            None | Some("") => Self {
                is_active: true,
                is_modifying: false,
                raw_state: STATE_ACTIVE.to_string(),
            },
            Some(label) => Self {
                is_active: label == STATE_ACTIVE,
                is_modifying: false,
                raw_state: label.to_string(),
            },
        }
    }
}

/// Active predicate shared by the two fleet-style backends
pub fn is_fleet_active(state: &str) -> bool {
    [STATE_ACTIVE, STATE_MODIFYING, STATE_SUBMITTED]
        .iter()
        .any(|s| state.eq_ignore_ascii_case(s))
}

/// Modifying predicate shared by the two fleet-style backends
pub fn is_fleet_modifying(state: &str) -> bool {
    [STATE_MODIFYING, STATE_SUBMITTED]
        .iter()
        .any(|s| state.eq_ignore_ascii_case(s))
}

/// Instance ids in lexical order, so output is stable across reads
fn serialize_sorted<S>(ids: &HashSet<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(ids.iter().collect::<BTreeSet<_>>())
}

/// Result of a state read for one fleet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetSnapshot {
    fleet_id: String,
    target_capacity: u32,
    status: FleetStatus,
    #[serde(serialize_with = "serialize_sorted")]
    instance_ids: HashSet<String>,
    instance_type_weights: HashMap<String, f64>,
}

impl FleetSnapshot {
    pub fn new(fleet_id: impl Into<String>, target_capacity: u32, status: FleetStatus) -> Self {
        Self {
            fleet_id: fleet_id.into(),
            target_capacity,
            status,
            instance_ids: HashSet::new(),
            instance_type_weights: HashMap::new(),
        }
    }

    /// Set the member instances; duplicates collapse
    pub fn with_instances<I, S>(mut self, instance_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instance_ids = instance_ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_weights(mut self, weights: HashMap<String, f64>) -> Self {
        self.instance_type_weights = weights;
        self
    }

    pub fn fleet_id(&self) -> &str {
        &self.fleet_id
    }

    pub fn target_capacity(&self) -> u32 {
        self.target_capacity
    }

    pub fn status(&self) -> &FleetStatus {
        &self.status
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active
    }

    pub fn is_modifying(&self) -> bool {
        self.status.is_modifying
    }

    pub fn instance_ids(&self) -> &HashSet<String> {
        &self.instance_ids
    }

    /// Instance-type weights; a type with no entry counts as weight 1
    pub fn instance_type_weights(&self) -> &HashMap<String, f64> {
        &self.instance_type_weights
    }

    /// Weight of one instance of `instance_type`, defaulting to 1
    pub fn weight_of(&self, instance_type: &str) -> f64 {
        self.instance_type_weights
            .get(instance_type)
            .copied()
            .unwrap_or(1.0)
    }
}
