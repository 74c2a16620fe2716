// Configuration module
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GateError, Result};

/// Main gate configuration, read from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub backend: BackendSettings,
    #[serde(default)]
    pub gate: GateSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Worker threads (0 = actix default, one per core)
    #[serde(default)]
    pub workers: usize,
}

/// Where the wallet backend lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Timeout for the per-request `GET /users/me` check, in seconds
    #[serde(default = "default_validation_timeout")]
    pub validation_timeout_secs: u64,
}

/// Route classification and session cookie settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateSettings {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default)]
    pub cookie_secure: bool,
    #[serde(default = "default_cookie_path")]
    pub cookie_path: String,
    /// Path prefixes that need a session
    #[serde(default = "default_protected_routes")]
    pub protected_routes: Vec<String>,
    /// Path prefixes only meant for signed-out visitors
    #[serde(default = "default_auth_routes")]
    pub auth_routes: Vec<String>,
    #[serde(default = "default_login_route")]
    pub login_route: String,
    #[serde(default = "default_landing_route")]
    pub landing_route: String,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_file")]
    pub file_path: String,
    #[serde(default = "default_true")]
    pub log_to_console: bool,
    /// "compact" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Per-target level overrides, e.g. `wallet_link = "debug"`
    #[serde(default)]
    pub targets: HashMap<String, String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            validation_timeout_secs: default_validation_timeout(),
        }
    }
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            cookie_secure: false,
            cookie_path: default_cookie_path(),
            protected_routes: default_protected_routes(),
            auth_routes: default_auth_routes(),
            login_route: default_login_route(),
            landing_route: default_landing_route(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_path: default_log_file(),
            log_to_console: true,
            format: default_log_format(),
            targets: HashMap::new(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5173
}

fn default_api_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_validation_timeout() -> u64 {
    10
}

fn default_cookie_name() -> String {
    "jwt".to_string()
}

fn default_cookie_path() -> String {
    "/".to_string()
}

fn default_protected_routes() -> Vec<String> {
    ["/wallet", "/history", "/profile", "/transaction"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_auth_routes() -> Vec<String> {
    ["/login", "/signup"].iter().map(|s| s.to_string()).collect()
}

fn default_login_route() -> String {
    "/login".to_string()
}

fn default_landing_route() -> String {
    "/wallet".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/gate.log".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

fn default_true() -> bool {
    true
}

impl ServerConfig {
    /// Load configuration from a TOML file, then apply `WALLET_GATE_*`
    /// environment overrides and validate.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| GateError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;

        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration without touching the environment.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment variable overrides.
    ///
    /// Supported environment variables:
    /// - WALLET_GATE_HOST: Override server.host
    /// - WALLET_GATE_PORT: Override server.port
    /// - WALLET_GATE_API_BASE_URL: Override backend.api_base_url
    /// - WALLET_GATE_LOG_LEVEL: Override logging.level
    /// - WALLET_GATE_COOKIE_SECURE: Override gate.cookie_secure
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|name| std::env::var(name).ok())
    }

    /// Same as [`apply_env_overrides`](Self::apply_env_overrides) with a
    /// custom variable lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("WALLET_GATE_HOST") {
            self.server.host = host;
        }

        if let Some(port) = lookup("WALLET_GATE_PORT") {
            self.server.port = port.parse().map_err(|_| GateError::InvalidEnv {
                name: "WALLET_GATE_PORT",
                value: port.clone(),
            })?;
        }

        if let Some(url) = lookup("WALLET_GATE_API_BASE_URL") {
            self.backend.api_base_url = url;
        }

        if let Some(level) = lookup("WALLET_GATE_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(val) = lookup("WALLET_GATE_COOKIE_SECURE") {
            self.gate.cookie_secure =
                val.eq_ignore_ascii_case("true") || val == "1" || val.eq_ignore_ascii_case("yes");
        }

        Ok(())
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(GateError::InvalidConfig("Server port cannot be 0".to_string()));
        }

        if self.backend.api_base_url.trim().is_empty() {
            return Err(GateError::InvalidConfig(
                "backend.api_base_url cannot be empty".to_string(),
            ));
        }

        if self.gate.cookie_name.trim().is_empty() {
            return Err(GateError::InvalidConfig("gate.cookie_name cannot be empty".to_string()));
        }

        for route in [&self.gate.login_route, &self.gate.landing_route]
            .into_iter()
            .chain(&self.gate.protected_routes)
            .chain(&self.gate.auth_routes)
        {
            if !route.starts_with('/') {
                return Err(GateError::InvalidConfig(format!(
                    "Route '{}' must start with '/'",
                    route
                )));
            }
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(GateError::InvalidConfig(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            )));
        }

        let valid_formats = ["compact", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(GateError::InvalidConfig(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_formats.join(", ")
            )));
        }

        Ok(())
    }

    /// `host:port` for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
