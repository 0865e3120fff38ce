//! Backend variants and id-based routing

use serde::{Deserialize, Serialize};

/// Id prefix of spot fleet requests
pub const SPOT_FLEET_PREFIX: &str = "sfr-";

/// Id prefix of EC2 fleets
pub const EC2_FLEET_PREFIX: &str = "fleet-";

/// The closed set of provisioning primitives a fleet can be backed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Spot-priced batch fleet (spot fleet request)
    SpotFleet,
    /// Capacity-managed fleet (EC2 Fleet)
    Ec2Fleet,
    /// Auto Scaling group
    AutoScalingGroup,
}

impl BackendKind {
    /// Every variant, in listing order
    pub const ALL: [BackendKind; 3] = [
        BackendKind::SpotFleet,
        BackendKind::Ec2Fleet,
        BackendKind::AutoScalingGroup,
    ];

    /// Pick the backend for a fleet id from its literal prefix.
    ///
    /// Total and pure: ids without a known prefix are scaling group names.
    pub fn classify(id: &str) -> Self {
        if id.starts_with(SPOT_FLEET_PREFIX) {
            BackendKind::SpotFleet
        } else if id.starts_with(EC2_FLEET_PREFIX) {
            BackendKind::Ec2Fleet
        } else {
            BackendKind::AutoScalingGroup
        }
    }

    /// Display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            BackendKind::SpotFleet => "EC2 Spot Fleet",
            BackendKind::Ec2Fleet => "EC2 Fleet",
            BackendKind::AutoScalingGroup => "Auto Scaling Group",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::SpotFleet => write!(f, "spot-fleet"),
            BackendKind::Ec2Fleet => write!(f, "ec2-fleet"),
            BackendKind::AutoScalingGroup => write!(f, "auto-scaling-group"),
        }
    }
}
