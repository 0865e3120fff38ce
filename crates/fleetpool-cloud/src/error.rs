//! Fleet backend error types

use thiserror::Error;

/// Errors surfaced by fleet backends
#[derive(Error, Debug)]
pub enum FleetError {
    /// A state read matched no remote fleet for the requested id
    #[error("Fleet not found: {id} (region: {region})")]
    NotFound { id: String, region: String },

    /// The remote call layer failed (network, auth, throttling, rejected request)
    #[error("Remote call failed: {0}")]
    RemoteUnavailable(String),

    /// Input the backend cannot act on, rejected before any remote call
    #[error("Invalid configuration: {0}")]
    ConfigurationInvalid(String),
}

impl FleetError {
    pub fn not_found(id: impl Into<String>, region: impl Into<String>) -> Self {
        Self::NotFound {
            id: id.into(),
            region: region.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::ConfigurationInvalid(message.into())
    }

    /// Whether the error came from the remote call layer rather than this crate
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, FleetError>;
