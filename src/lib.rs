//! # provisioning-reloader
//!
//! Watches provisioned configuration files and triggers debounced remote reloads.
//!
//! ## Overview
//!
//! Editors and deployment tools rewrite provisioning files in bursts.
//! `provisioning-reloader` turns any such burst into at most one
//! `POST {base}/api/admin/provisioning/{scope}/reload` per tick:
//! - One [`Observer`](crate::core::Observer) per scope (dashboards, datasources,
//!   plugins, access control, alerting)
//! - A bounded, drop-on-full queue between the filesystem watcher and the
//!   dispatch loop, so watching never blocks
//! - Best-effort reloads: failures are logged, never retried
//! - Cooperative shutdown with a bounded wait
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use provisioning_reloader::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let settings = ReloaderSettings::from_json(
//!     br#"{
//!         "grafanaURL": "http://localhost:3000",
//!         "dashboards": ["/etc/grafana/provisioning/dashboards"],
//!         "datasources": ["/etc/grafana/provisioning/datasources"]
//!     }"#,
//! )?;
//!
//! let supervisor = Supervisor::start(&settings, bearer_client("service-account-token")?)?;
//!
//! // ... later
//! supervisor.shutdown(settings.shutdown_timeout()).await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod notify;
pub mod reload;
pub mod settings;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{HealthCheck, HealthStatus, Observer, ObserverOptions, Scope, Supervisor};
    pub use crate::error::{ReloaderError, Result};
    pub use crate::reload::{ReloadClient, bearer_client};
    pub use crate::settings::ReloaderSettings;
}
