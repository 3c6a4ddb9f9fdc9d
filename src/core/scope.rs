//! Provisioning scopes and their reload endpoints.

use std::fmt;

/// One category of provisioned configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Dashboard providers
    Dashboards,
    /// Datasources
    Datasources,
    /// Plugin (app) configuration
    Plugins,
    /// Access-control roles and assignments
    AccessControl,
    /// Alerting rules, contact points and policies
    Alerting,
}

impl Scope {
    /// Every scope, in startup order.
    pub const ALL: [Scope; 5] = [
        Scope::Dashboards,
        Scope::Datasources,
        Scope::Plugins,
        Scope::AccessControl,
        Scope::Alerting,
    ];

    /// Path segment used by the reload API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dashboards => "dashboards",
            Self::Datasources => "datasources",
            Self::Plugins => "plugins",
            Self::AccessControl => "accesscontrol",
            Self::Alerting => "alerting",
        }
    }

    /// Reload endpoint for this scope under `base`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use provisioning_reloader::core::Scope;
    ///
    /// assert_eq!(
    ///     Scope::AccessControl.endpoint("http://localhost:3000"),
    ///     "http://localhost:3000/api/admin/provisioning/accesscontrol/reload"
    /// );
    /// ```
    pub fn endpoint(&self, base: &str) -> String {
        format!("{}/api/admin/provisioning/{}/reload", base, self.as_str())
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
