//! Liveness of observer loops.

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Whether a watch loop is still alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HealthStatus {
    /// The loop is running.
    #[default]
    Ok,
    /// The loop has exited and no longer observes changes.
    Error,
}

impl HealthStatus {
    /// Short message reported alongside the status.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Result of a synchronous health query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthCheck {
    /// Aggregated status
    pub status: HealthStatus,
    /// Human-readable message for `status`
    pub message: &'static str,
}

impl From<HealthStatus> for HealthCheck {
    fn from(status: HealthStatus) -> Self {
        Self {
            status,
            message: status.message(),
        }
    }
}

/// Shared status holder.
///
/// Handed to the observer loop, which writes it once when it exits, and to
/// whoever answers health queries. Clones share the same value.
#[derive(Debug, Clone, Default)]
pub struct HealthState {
    inner: Arc<RwLock<HealthStatus>>,
}

impl HealthState {
    /// Create a holder starting at [`HealthStatus::Ok`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status.
    pub fn status(&self) -> HealthStatus {
        *self.inner.read()
    }

    pub(crate) fn set(&self, status: HealthStatus) {
        *self.inner.write() = status;
    }
}
