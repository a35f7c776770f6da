//! Application configuration.
//!
//! Loaded once at startup from a TOML document or assembled with the
//! builder setters. The router core itself takes plain values, not the
//! whole config, so this stays at the application edge.

use serde::Deserialize;

/// Application-level settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application name.
    pub name: String,
    /// Environment name (`production`, `testing`, ...).
    pub env: String,
    /// Whether debug output is enabled.
    pub debug: bool,
    /// Public base URL.
    pub url: String,
    /// Default locale.
    pub locale: String,
    /// Path unauthenticated requests are redirected to.
    pub login_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "Larix".to_string(),
            env: "production".to_string(),
            debug: false,
            url: "http://localhost".to_string(),
            locale: "en".to_string(),
            login_path: "/login".to_string(),
        }
    }
}

impl AppConfig {
    /// A default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the application name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the environment name.
    #[must_use]
    pub fn env(mut self, env: impl Into<String>) -> Self {
        self.env = env.into();
        self
    }

    /// Enable or disable debug output.
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the public base URL.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the default locale.
    #[must_use]
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Set the login redirect path.
    #[must_use]
    pub fn login_path(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }

    /// Parse from a TOML document; unknown keys are ignored.
    pub fn from_toml_str(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }
}
