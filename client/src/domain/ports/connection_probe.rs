//! Driven port for checking that the remote service is configured and reachable.

use async_trait::async_trait;
use serde::Serialize;

/// Outcome of a connectivity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// The service answered.
    Connected,
    /// Configuration is missing; no request was made.
    NotConfigured,
    /// The check failed with `message`.
    Unreachable {
        /// Why the check failed.
        message: String,
    },
}

impl ConnectionStatus {
    /// Whether the service answered.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// Port for the startup connectivity check.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionProbe: Send + Sync {
    /// Issue one lightweight request and report the result.
    async fn check_connection(&self) -> ConnectionStatus;
}
