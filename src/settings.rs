//! Reloader settings.
//!
//! Settings arrive either as the JSON blob a host hands over at instance
//! creation ([`ReloaderSettings::from_json`]) or layered from an optional file
//! plus environment overrides ([`ReloaderSettings::load`]).

use crate::core::{DEFAULT_SHUTDOWN_TIMEOUT, ObserverOptions, Scope};
use crate::error::{ReloaderError, Result};
use config::{Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Base URL used when none is configured.
pub const DEFAULT_GRAFANA_URL: &str = "http://localhost:3000";

const LIST_KEYS: [&str; 5] = [
    "dashboards",
    "datasources",
    "plugins",
    "access_control",
    "alerting",
];

/// Everything needed to start a [`Supervisor`](crate::core::Supervisor).
///
/// Keys are snake_case; the camelCase spellings used in host JSON
/// (`grafanaURL`, `accessControl`, `tickIntervalMs`, ...) are accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReloaderSettings {
    /// Base URL of the configuration-management host
    #[serde(alias = "grafanaURL", alias = "grafanaUrl")]
    pub grafana_url: String,
    /// Dashboard provisioning paths
    #[serde(alias = "fsWatcher")]
    pub dashboards: Vec<PathBuf>,
    /// Datasource provisioning paths
    pub datasources: Vec<PathBuf>,
    /// Plugin provisioning paths
    pub plugins: Vec<PathBuf>,
    /// Access-control provisioning paths
    #[serde(alias = "accessControl")]
    pub access_control: Vec<PathBuf>,
    /// Alerting provisioning paths
    pub alerting: Vec<PathBuf>,
    /// Interval between dispatch passes, in milliseconds
    #[serde(alias = "tickIntervalMs")]
    pub tick_interval_ms: u64,
    /// Pending signals held per observer
    #[serde(alias = "queueCapacity")]
    pub queue_capacity: usize,
    /// Bound on a single reload call, in milliseconds
    #[serde(alias = "requestTimeoutMs")]
    pub request_timeout_ms: u64,
    /// Bound on waiting for observers to stop, in milliseconds
    #[serde(alias = "shutdownTimeoutMs")]
    pub shutdown_timeout_ms: u64,
}

impl Default for ReloaderSettings {
    fn default() -> Self {
        let options = ObserverOptions::default();
        Self {
            grafana_url: String::new(),
            dashboards: Vec::new(),
            datasources: Vec::new(),
            plugins: Vec::new(),
            access_control: Vec::new(),
            alerting: Vec::new(),
            tick_interval_ms: options.tick_interval.as_millis() as u64,
            queue_capacity: options.queue_capacity,
            request_timeout_ms: options.request_timeout.as_millis() as u64,
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT.as_millis() as u64,
        }
    }
}

impl ReloaderSettings {
    /// Parse the JSON settings blob provided by the host.
    ///
    /// # Errors
    ///
    /// Returns [`ReloaderError::Settings`] if the JSON is malformed or the
    /// values fail [`validate`](Self::validate).
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let settings: Self = serde_json::from_slice(data)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from an optional file, then apply environment overrides.
    ///
    /// The file format is detected from its extension (YAML, TOML, JSON).
    /// Environment variables use `prefix` and `__` as separator, e.g.
    /// `RELOADER__GRAFANA_URL` or `RELOADER__DASHBOARDS=/a,/b`.
    ///
    /// # Errors
    ///
    /// Returns [`ReloaderError::Settings`] if a source cannot be read or
    /// deserialized, or the values fail [`validate`](Self::validate).
    pub fn load(path: Option<&Path>, prefix: &str) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let mut env = Environment::with_prefix(prefix)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .list_separator(",");
        for key in LIST_KEYS {
            env = env.with_list_parse_key(key);
        }

        let settings: Self = builder.add_source(env).build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that would stall or disable the observers.
    ///
    /// # Errors
    ///
    /// Returns [`ReloaderError::Settings`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("tick_interval_ms", self.tick_interval_ms == 0),
            ("queue_capacity", self.queue_capacity == 0),
            ("request_timeout_ms", self.request_timeout_ms == 0),
            ("shutdown_timeout_ms", self.shutdown_timeout_ms == 0),
        ];

        for (field, zero) in checks {
            if zero {
                return Err(ReloaderError::Settings(format!("{} must be greater than 0", field)));
            }
        }
        Ok(())
    }

    /// The configured base URL without a trailing slash, or
    /// [`DEFAULT_GRAFANA_URL`] when none is set.
    pub fn base_url(&self) -> String {
        let url = self.grafana_url.trim();
        if url.is_empty() {
            return DEFAULT_GRAFANA_URL.to_string();
        }
        url.trim_end_matches('/').to_string()
    }

    /// Paths configured for `scope`.
    pub fn paths(&self, scope: Scope) -> &[PathBuf] {
        match scope {
            Scope::Dashboards => &self.dashboards,
            Scope::Datasources => &self.datasources,
            Scope::Plugins => &self.plugins,
            Scope::AccessControl => &self.access_control,
            Scope::Alerting => &self.alerting,
        }
    }

    /// Observer tuning derived from these settings.
    pub fn observer_options(&self) -> ObserverOptions {
        ObserverOptions {
            tick_interval: Duration::from_millis(self.tick_interval_ms),
            queue_capacity: self.queue_capacity,
            request_timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }

    /// Bound on waiting for observers to stop.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = ReloaderSettings::default();
        assert_eq!(settings.base_url(), DEFAULT_GRAFANA_URL);
        assert_eq!(settings.observer_options(), ObserverOptions::default());
        assert_eq!(settings.shutdown_timeout(), Duration::from_secs(5));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_configured_url_wins() {
        let settings = ReloaderSettings {
            grafana_url: "https://grafana.example.com/".to_string(),
            ..ReloaderSettings::default()
        };
        assert_eq!(settings.base_url(), "https://grafana.example.com");
    }

    #[test]
    fn test_blank_url_falls_back_to_default() {
        let settings = ReloaderSettings {
            grafana_url: "   ".to_string(),
            ..ReloaderSettings::default()
        };
        assert_eq!(settings.base_url(), DEFAULT_GRAFANA_URL);
    }

    #[test]
    fn test_from_host_json() {
        let settings = ReloaderSettings::from_json(
            br#"{
                "grafanaURL": "http://grafana:3000/",
                "dashboards": ["/etc/grafana/provisioning/dashboards"],
                "accessControl": ["/etc/grafana/provisioning/access-control"],
                "tickIntervalMs": 1000
            }"#,
        )
        .unwrap();

        assert_eq!(settings.base_url(), "http://grafana:3000");
        assert_eq!(settings.paths(Scope::Dashboards).len(), 1);
        assert_eq!(settings.paths(Scope::AccessControl).len(), 1);
        assert!(settings.paths(Scope::Alerting).is_empty());
        assert_eq!(
            settings.observer_options().tick_interval,
            Duration::from_secs(1)
        );
        assert_eq!(settings.queue_capacity, 50);
    }

    #[test]
    fn test_from_json_rejects_zero_capacity() {
        let result = ReloaderSettings::from_json(br#"{"queueCapacity": 0}"#);
        assert!(matches!(result, Err(ReloaderError::Settings(msg)) if msg.contains("queue_capacity")));
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        let result = ReloaderSettings::from_json(b"{not json");
        assert!(matches!(result, Err(ReloaderError::Settings(_))));
    }

    #[test]
    fn test_load_from_yaml_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("reloader.yaml");
        fs::write(
            &path,
            r#"
grafana_url: "http://grafana.internal:3000"
datasources:
  - /etc/grafana/provisioning/datasources
alerting:
  - /etc/grafana/provisioning/alerting
request_timeout_ms: 2500
"#,
        )
        .unwrap();

        let settings = ReloaderSettings::load(Some(&path), "RELOADER_TEST_YAML").unwrap();
        assert_eq!(settings.base_url(), "http://grafana.internal:3000");
        assert_eq!(settings.paths(Scope::Datasources).len(), 1);
        assert_eq!(settings.paths(Scope::Alerting).len(), 1);
        assert_eq!(
            settings.observer_options().request_timeout,
            Duration::from_millis(2500)
        );
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = ReloaderSettings::load(Some(Path::new("/nonexistent/reloader.yaml")), "RELOADER_TEST_MISSING");
        assert!(matches!(result, Err(ReloaderError::Settings(_))));
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let settings = ReloaderSettings::load(None, "RELOADER_TEST_EMPTY").unwrap();
        assert_eq!(settings, ReloaderSettings::default());
    }
}
