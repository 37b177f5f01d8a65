//! Application settings loaded via OrthoConfig.
//!
//! Values come from command-line flags, `MICROSERVICE_*` environment
//! variables, and configuration files, in that order of precedence.

use std::ffi::OsString;
use std::net::{AddrParseError, SocketAddr};

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Name of the environment the process is hosted in.
///
/// Only the development check carries behaviour: development-like hosts
/// expose raw failure messages and the Swagger UI.
///
/// # Examples
/// ```
/// use microservice::settings::HostEnvironment;
///
/// assert!(HostEnvironment::new("development").is_development());
/// assert!(!HostEnvironment::default().is_development());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEnvironment(String);

impl HostEnvironment {
    /// Conventional name of the development environment.
    pub const DEVELOPMENT: &'static str = "Development";
    /// Conventional name of the production environment.
    pub const PRODUCTION: &'static str = "Production";

    /// Wrap an environment name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Shorthand for the development environment.
    #[must_use]
    pub fn development() -> Self {
        Self::new(Self::DEVELOPMENT)
    }

    /// Shorthand for the production environment.
    #[must_use]
    pub fn production() -> Self {
        Self::new(Self::PRODUCTION)
    }

    /// Environment name as configured.
    pub fn name(&self) -> &str {
        self.0.as_str()
    }

    /// Whether this is the development environment, ignoring case.
    pub fn is_development(&self) -> bool {
        self.0.trim().eq_ignore_ascii_case(Self::DEVELOPMENT)
    }
}

impl Default for HostEnvironment {
    fn default() -> Self {
        Self::production()
    }
}

/// Errors raised while loading or interpreting settings.
#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    /// Sources could not be read or merged.
    #[error("failed to load settings: {0}")]
    Load(String),
    /// The bind address does not parse as `host:port`.
    #[error("invalid bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        #[source]
        source: AddrParseError,
    },
}

/// Process-wide settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "MICROSERVICE")]
pub struct AppSettings {
    /// Socket address the HTTP server listens on.
    pub bind_addr: Option<String>,
    /// Host environment name, e.g. `Development` or `Production`.
    #[ortho_config(default = String::from(HostEnvironment::PRODUCTION))]
    pub environment: String,
}

impl AppSettings {
    /// Load settings from the given arguments plus environment and files.
    ///
    /// # Errors
    /// Returns [`SettingsError::Load`] when any source is malformed.
    pub fn load_from_args<I>(args: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = OsString>,
    {
        Self::load_from_iter(args).map_err(|error| SettingsError::Load(error.to_string()))
    }

    /// Parsed bind address, falling back to `0.0.0.0:8080`.
    ///
    /// # Errors
    /// Returns [`SettingsError::InvalidBindAddr`] when the value is not a
    /// socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value
            .parse()
            .map_err(|source| SettingsError::InvalidBindAddr {
                value: value.to_owned(),
                source,
            })
    }

    /// Configured host environment, production unless overridden.
    pub fn environment(&self) -> HostEnvironment {
        HostEnvironment::new(self.environment.as_str())
    }
}
