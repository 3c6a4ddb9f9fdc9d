//! Observer composition, dispatch and lifecycle.

mod dispatch;
mod health;
mod lifecycle;
mod observer;
mod scope;
mod supervisor;

pub use dispatch::DEFAULT_TICK_INTERVAL;
pub use health::{HealthCheck, HealthState, HealthStatus};
pub use lifecycle::{DEFAULT_SHUTDOWN_TIMEOUT, TaskHandle};
pub use observer::{Observer, ObserverOptions};
pub use scope::Scope;
pub use supervisor::Supervisor;
