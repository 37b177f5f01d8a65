//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;

use crate::settings::{AppSettings, HostEnvironment, SettingsError};

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) environment: HostEnvironment,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Construct a server configuration.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, environment: HostEnvironment) -> Self {
        Self {
            bind_addr,
            environment,
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    /// Derive the configuration from loaded settings.
    ///
    /// # Errors
    /// Returns [`SettingsError::InvalidBindAddr`] when the bind address does
    /// not parse.
    pub fn from_settings(settings: &AppSettings) -> Result<Self, SettingsError> {
        Ok(Self::new(settings.bind_addr()?, settings.environment()))
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Return the host environment handlers and middleware run under.
    #[must_use]
    pub fn environment(&self) -> &HostEnvironment {
        &self.environment
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware to the configuration.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn from_settings_applies_defaults() {
        let settings = AppSettings {
            bind_addr: None,
            environment: HostEnvironment::PRODUCTION.to_owned(),
        };

        let config = ServerConfig::from_settings(&settings).expect("defaults are valid");
        assert_eq!(config.bind_addr().port(), 8080);
        assert!(!config.environment().is_development());
    }

    #[rstest]
    fn from_settings_propagates_bad_address() {
        let settings = AppSettings {
            bind_addr: Some("nowhere".to_owned()),
            environment: HostEnvironment::DEVELOPMENT.to_owned(),
        };

        assert!(matches!(
            ServerConfig::from_settings(&settings),
            Err(SettingsError::InvalidBindAddr { .. })
        ));
    }
}
