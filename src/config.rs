//! # Configuration Module
//!
//! Application settings loaded from a YAML or TOML file and then adjusted
//! by environment variables.
//!
//! ## File format
//!
//! ```yaml
//! env: development        # production (default) | development
//! debug: true
//! encoding: utf-8
//! signature: zest         # X-Zest header value, null to hide it
//! session: zest           # session cookie name, null to disable sessions
//! views_dir: ./views
//! public_dir: ./public
//! layout: layout.html
//! routes:
//!   - { method: GET, path: "/hello/:name", handler: "view:hello.html" }
//!   - { method: GET, path: "/assets/**", handler: public }
//!   - path: "^/archive/(\\d+)/(\\d+)"
//!     names: [year, month]
//!     handler: echo
//!     params: { month: "01" }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Effect |
//! |---|---|
//! | `ZEST_ENV` | `production` or `development` |
//! | `ZEST_DEBUG` | `1`/`true`/`yes`/`on` or `0`/`false`/`no`/`off` |
//! | `ZEST_VIEWS_DIR` | template directory |
//! | `ZEST_PUBLIC_DIR` | static file directory |
//! | `ZEST_STACK_SIZE` | coroutine stack size, decimal or `0x` hex (default `0x4000`) |
//!
//! Notices are only rendered into responses when `debug` is on **and** the
//! environment is `development`.

use crate::pattern::RoutePath;
use crate::router::{RouteError, RouteOptions, RouteTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default coroutine stack size.
pub const DEFAULT_STACK_SIZE: usize = 0x4000;

/// Deployment environment. `Development` ranks above `Production`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Development,
}

impl std::str::FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" => Ok(Environment::Development),
            other => Err(ConfigError::Invalid(format!("unknown environment '{other}'"))),
        }
    }
}

/// Errors raised while loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, message: String },
    UnsupportedFormat { path: PathBuf },
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "cannot read config '{}': {source}", path.display())
            }
            ConfigError::Parse { path, message } => {
                write!(f, "cannot parse config '{}': {message}", path.display())
            }
            ConfigError::UnsupportedFormat { path } => write!(
                f,
                "unsupported config format '{}' (expected .yaml, .yml or .toml)",
                path.display()
            ),
            ConfigError::Invalid(message) => write!(f, "invalid configuration: {message}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// One declarative route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    #[serde(default = "default_method")]
    pub method: String,
    pub path: String,
    /// Explicit parameter names, mostly for raw patterns.
    #[serde(default)]
    pub names: Vec<String>,
    pub handler: String,
    /// Default bindings.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl RouteConfig {
    fn route_path(&self) -> RoutePath {
        RoutePath::with_names(self.path.as_str(), self.names.iter().map(String::as_str))
    }

    fn options(&self) -> RouteOptions {
        self.params
            .iter()
            .fold(RouteOptions::new(), |opts, (k, v)| opts.param(k.as_str(), v.as_str()))
    }
}

fn default_method() -> String {
    "GET".to_owned()
}

fn default_encoding() -> String {
    "utf-8".to_owned()
}

fn default_name() -> Option<String> {
    Some("zest".to_owned())
}

fn default_true() -> bool {
    true
}

fn default_stack_size() -> usize {
    DEFAULT_STACK_SIZE
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub env: Environment,
    #[serde(default = "default_true")]
    pub debug: bool,
    #[serde(default = "default_encoding")]
    pub encoding: String,
    /// Value of the `X-Zest` response header; `None` hides it.
    #[serde(default = "default_name")]
    pub signature: Option<String>,
    /// Session cookie name; `None` disables sessions.
    #[serde(default = "default_name")]
    pub session: Option<String>,
    #[serde(default)]
    pub views_dir: Option<PathBuf>,
    #[serde(default)]
    pub public_dir: Option<PathBuf>,
    /// Default layout template for rendered views.
    #[serde(default)]
    pub layout: Option<String>,
    #[serde(default = "default_stack_size")]
    pub stack_size: usize,
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            env: Environment::default(),
            debug: true,
            encoding: default_encoding(),
            signature: default_name(),
            session: default_name(),
            views_dir: None,
            public_dir: None,
            layout: None,
            stack_size: DEFAULT_STACK_SIZE,
            routes: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load a YAML (`.yaml`/`.yml`) or TOML (`.toml`) file.
    ///
    /// # Errors
    ///
    /// The file cannot be read, has an unknown extension or does not parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let parsed = match ext.as_deref() {
            Some("yaml" | "yml") => Self::from_yaml_str(&content),
            Some("toml") => Self::from_toml_str(&content),
            _ => {
                return Err(ConfigError::UnsupportedFormat {
                    path: path.to_path_buf(),
                })
            }
        };
        let config = parsed.map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })?;
        info!(
            path = %path.display(),
            env = ?config.env,
            debug = config.debug,
            routes_count = config.routes.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// # Errors
    ///
    /// The YAML parser's message.
    pub fn from_yaml_str(content: &str) -> Result<Self, String> {
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    }

    /// # Errors
    ///
    /// The TOML parser's message.
    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Apply `ZEST_*` overrides from the process environment.
    ///
    /// # Errors
    ///
    /// An override holds an unparsable value.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `ZEST_*` overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// An override holds an unparsable value.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(env) = lookup("ZEST_ENV") {
            self.env = env.parse()?;
        }
        if let Some(flag) = lookup("ZEST_DEBUG") {
            self.debug = parse_flag(&flag)
                .ok_or_else(|| ConfigError::Invalid(format!("ZEST_DEBUG='{flag}'")))?;
        }
        if let Some(dir) = lookup("ZEST_VIEWS_DIR") {
            self.views_dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = lookup("ZEST_PUBLIC_DIR") {
            self.public_dir = Some(PathBuf::from(dir));
        }
        if let Some(size) = lookup("ZEST_STACK_SIZE") {
            self.stack_size = parse_size(&size)
                .ok_or_else(|| ConfigError::Invalid(format!("ZEST_STACK_SIZE='{size}'")))?;
        }
        debug!(env = ?self.env, debug = self.debug, stack_size = self.stack_size, "Environment overrides applied");
        Ok(())
    }

    /// Whether notices are rendered into responses.
    #[inline]
    #[must_use]
    pub fn shows_notices(&self) -> bool {
        self.debug && self.env > Environment::Production
    }

    /// `Content-Type` value for `mime` with the configured charset.
    #[must_use]
    pub fn content_type(&self, mime: &str) -> String {
        format!("{mime}; charset={}", self.encoding.to_ascii_lowercase())
    }

    /// Build a route table from the declarative routes. GET routes get
    /// their HEAD mirror.
    ///
    /// # Errors
    ///
    /// The first route that fails to compile.
    pub fn build_routes(&self) -> Result<RouteTable, RouteError> {
        let mut table = RouteTable::new();
        for route in &self.routes {
            if route.method.eq_ignore_ascii_case("GET") {
                table.dispatch_get(route.route_path(), &route.handler, route.options())?;
            } else {
                table.route(&route.method, route.route_path(), &route.handler, route.options())?;
            }
        }
        Ok(table)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_size(value: &str) -> Option<usize> {
    let value = value.trim();
    match value.strip_prefix("0x") {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}
