//! One observer per configured scope, started and stopped together.

use crate::core::health::{HealthCheck, HealthState, HealthStatus};
use crate::core::lifecycle::TaskHandle;
use crate::core::observer::Observer;
use crate::core::scope::Scope;
use crate::error::Result;
use crate::settings::ReloaderSettings;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;

struct Supervised {
    scope: Scope,
    health: HealthState,
    handle: TaskHandle,
}

/// Runs an [`Observer`] for every scope that has paths configured.
///
/// All observers share one parent cancellation token. Startup is all or
/// nothing: every observer is constructed before any of them runs.
///
/// # Examples
///
/// ```rust,no_run
/// use provisioning_reloader::prelude::*;
///
/// # async fn example() -> Result<()> {
/// let settings = ReloaderSettings::from_json(br#"{"dashboards": ["/etc/grafana/provisioning/dashboards"]}"#)?;
/// let supervisor = Supervisor::start(&settings, bearer_client("token")?)?;
///
/// assert_eq!(supervisor.check_health().status, HealthStatus::Ok);
/// supervisor.shutdown(settings.shutdown_timeout()).await;
/// # Ok(())
/// # }
/// ```
pub struct Supervisor {
    token: CancellationToken,
    observers: Vec<Supervised>,
}

impl Supervisor {
    /// Construct and start observers for every non-empty scope.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns the first construction error. Nothing is started in that case.
    pub fn start(settings: &ReloaderSettings, client: reqwest::Client) -> Result<Self> {
        let base_url = settings.base_url();
        let options = settings.observer_options();

        let mut observers = Vec::new();
        for scope in Scope::ALL {
            let paths = settings.paths(scope);
            if paths.is_empty() {
                continue;
            }

            let observer = Observer::with_options(
                client.clone(),
                scope.as_str(),
                scope.endpoint(&base_url),
                paths,
                options,
            )?;
            observers.push((scope, observer));
        }

        let token = CancellationToken::new();
        let observers = observers
            .into_iter()
            .map(|(scope, observer)| {
                info!(scope = %scope, endpoint = %observer.endpoint(), "starting observer");
                let health = observer.health();
                let handle = observer.spawn(token.child_token());
                Supervised {
                    scope,
                    health,
                    handle,
                }
            })
            .collect();

        Ok(Self { token, observers })
    }

    /// Scopes with a running (or stopped) observer, in startup order.
    pub fn scopes(&self) -> Vec<Scope> {
        self.observers.iter().map(|o| o.scope).collect()
    }

    /// Healthy only while every observer loop is alive.
    pub fn check_health(&self) -> HealthCheck {
        let status = if self
            .observers
            .iter()
            .all(|o| o.health.status() == HealthStatus::Ok)
        {
            HealthStatus::Ok
        } else {
            HealthStatus::Error
        };
        HealthCheck::from(status)
    }

    /// Health of a single scope, if it is being observed.
    pub fn scope_health(&self, scope: Scope) -> Option<HealthStatus> {
        self.observers
            .iter()
            .find(|o| o.scope == scope)
            .map(|o| o.health.status())
    }

    /// Cancel every observer and wait for all of them, within `timeout` in
    /// total.
    ///
    /// Returns `true` if every observer stopped in time. Safe to call more
    /// than once.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.token.cancel();

        let deadline = Instant::now() + timeout;
        let mut all_stopped = true;
        for observer in &self.observers {
            let remaining = deadline.saturating_duration_since(Instant::now());
            all_stopped &= observer.handle.shutdown(remaining).await;
        }
        all_stopped
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
