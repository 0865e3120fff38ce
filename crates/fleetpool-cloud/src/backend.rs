//! Fleet backend contract
//!
//! All backends (spot fleets, EC2 fleets, scaling groups) implement
//! [`FleetBackend`] so callers get one uniform operation set regardless of
//! the provisioning primitive behind a fleet id.

use crate::error::{FleetError, Result};
use crate::kind::BackendKind;
use crate::snapshot::FleetSnapshot;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fleet backend abstraction trait
///
/// Implementations hold no mutable state; every call builds its own remote
/// client, so a backend can be shared across tasks freely.
#[async_trait]
pub trait FleetBackend: Send + Sync {
    /// Which provisioning primitive this backend drives
    fn kind(&self) -> BackendKind;

    /// List remote fleets as selection candidates.
    ///
    /// A fleet is included when it is `selected`, when `show_all` is set, or
    /// when the backend judges it eligible.
    async fn describe(
        &self,
        conn: &Connection,
        selected: Option<&str>,
        show_all: bool,
    ) -> Result<Vec<FleetCandidate>>;

    /// Request a new target capacity without waiting for convergence
    async fn modify(&self, conn: &Connection, id: &str, request: CapacityRequest) -> Result<()>;

    /// Read the current snapshot of one fleet
    async fn get_state(&self, conn: &Connection, id: &str) -> Result<FleetSnapshot>;

    /// Read snapshots for several fleets with a single describe call.
    ///
    /// Membership is still listed once per id. Batch snapshots carry no
    /// instance-type weights.
    async fn get_state_batch(
        &self,
        conn: &Connection,
        ids: &[String],
    ) -> Result<HashMap<String, FleetSnapshot>>;
}

/// Where and as whom a remote call is made
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Named credentials (shared-config profile); ambient credentials when `None`
    pub credentials_ref: Option<String>,

    pub region: String,

    /// Endpoint URL override (e.g. a VPC endpoint or local emulator)
    pub endpoint: Option<String>,
}

impl Connection {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            credentials_ref: None,
            region: region.into(),
            endpoint: None,
        }
    }

    pub fn with_credentials(mut self, credentials_ref: impl Into<String>) -> Self {
        self.credentials_ref = Some(credentials_ref.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

/// Arguments of a resize request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityRequest {
    pub target: u32,
    pub min: u32,
    pub max: u32,
}

impl CapacityRequest {
    pub fn new(target: u32, min: u32, max: u32) -> Self {
        Self { target, min, max }
    }

    /// Check that `min <= target <= max`
    pub fn validate_bounds(&self) -> Result<()> {
        if self.min > self.max {
            return Err(FleetError::invalid(format!(
                "min size {} is greater than max size {}",
                self.min, self.max
            )));
        }
        if self.target < self.min || self.target > self.max {
            return Err(FleetError::invalid(format!(
                "target capacity {} is outside [{}, {}]",
                self.target, self.min, self.max
            )));
        }
        Ok(())
    }
}

/// One row of a [`FleetBackend::describe`] listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetCandidate {
    /// Human readable label
    pub label: String,

    pub id: String,

    /// Whether this is the caller's currently selected fleet
    pub selected: bool,
}

impl FleetCandidate {
    pub fn new(label: impl Into<String>, id: impl Into<String>, selected: bool) -> Self {
        Self {
            label: label.into(),
            id: id.into(),
            selected,
        }
    }
}

/// Reject an empty fleet id before any remote call is made
pub fn require_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(FleetError::invalid("fleet id must not be empty"));
    }
    Ok(())
}

/// Retry configuration handed to the remote call layer
///
/// Backends never retry on their own; this policy is applied by the client
/// transport before an error surfaces.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,

    /// Initial delay between retries
    pub initial_delay: std::time::Duration,

    /// Maximum delay between retries
    pub max_delay: std::time::Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: std::time::Duration::from_secs(1),
            max_delay: std::time::Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_bounds() {
        assert!(CapacityRequest::new(5, 0, 10).validate_bounds().is_ok());
        assert!(CapacityRequest::new(0, 0, 0).validate_bounds().is_ok());

        let err = CapacityRequest::new(5, 6, 4).validate_bounds().unwrap_err();
        assert!(matches!(err, FleetError::ConfigurationInvalid(_)));

        let err = CapacityRequest::new(11, 0, 10).validate_bounds().unwrap_err();
        assert!(err.to_string().contains("outside"));
    }

    #[test]
    fn test_require_id() {
        assert!(require_id("sfr-1").is_ok());
        assert!(matches!(
            require_id(""),
            Err(FleetError::ConfigurationInvalid(_))
        ));
        assert!(require_id("   ").is_err());
    }

    #[test]
    fn test_connection_builder() {
        let conn = Connection::new("ap-northeast-1")
            .with_credentials("ops")
            .with_endpoint("http://localhost:4566");

        assert_eq!(conn.region, "ap-northeast-1");
        assert_eq!(conn.credentials_ref.as_deref(), Some("ops"));
        assert_eq!(conn.endpoint.as_deref(), Some("http://localhost:4566"));
    }
}
