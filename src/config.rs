// Configuration management for the route monitor
// Supports CLI arguments, environment variables and a TOML expectation file

use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::Level;

use crate::error::{AppError, AppResult};

/// Route monitor - check that the host routes destinations the way you expect
#[derive(Parser, Debug, Clone)]
#[command(name = "route-monitor")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the route expectation file
    #[arg(short, long, env = "ROUTE_MONITOR_CONFIG")]
    pub config: PathBuf,

    /// Log progress (info level) instead of errors only
    #[arg(short, long, env = "ROUTE_MONITOR_VERBOSE")]
    pub verbose: bool,

    /// Emit log lines as JSON
    #[arg(long, env = "ROUTE_MONITOR_JSON")]
    pub json: bool,

    /// Logging level (error, warn, info, debug, trace); overrides --verbose
    #[arg(short, long, env = "ROUTE_MONITOR_LOG_LEVEL")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the effective log level from --log-level and --verbose
    pub fn level(&self) -> anyhow::Result<Level> {
        match &self.log_level {
            Some(level) => parse_log_level(level),
            None if self.verbose => Ok(Level::INFO),
            None => Ok(Level::ERROR),
        }
    }

    /// Config path with a leading `~/` expanded to the home directory
    pub fn config_path(&self) -> PathBuf {
        expand_tilde(&self.config, std::env::var_os("HOME").map(PathBuf::from))
    }
}

/// Top-level expectation file
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct VerificationConfig {
    /// Stop at the first mismatch instead of collecting all of them
    #[serde(default)]
    pub fail_fast: bool,

    /// Routes to verify, in order
    #[serde(rename = "route")]
    pub routes: Vec<RouteSpec>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RouteSpec {
    pub name: String,

    /// Single address or CIDR range
    #[serde(rename = "ip")]
    pub target: String,

    #[serde(rename = "expect", default)]
    pub expectations: Vec<Expectation>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Expectation {
    pub when: ExpectationClause,
}

/// One set of conditions; each field present is an equality check
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ExpectationClause {
    #[serde(default)]
    pub device: Option<String>,

    #[serde(default)]
    pub gateway: Option<String>,

    #[serde(default)]
    pub source: Option<String>,
}

impl ExpectationClause {
    pub fn is_empty(&self) -> bool {
        self.device.is_none() && self.gateway.is_none() && self.source.is_none()
    }
}

impl RouteSpec {
    /// Iterate the `when` clauses in declared order
    pub fn clauses(&self) -> impl ExactSizeIterator<Item = &ExpectationClause> {
        self.expectations.iter().map(|e| &e.when)
    }
}

impl VerificationConfig {
    /// Read and parse an expectation file
    pub fn load(path: &Path) -> AppResult<Self> {
        tracing::info!("Loading configuration from: {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|source| AppError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content).map_err(|source| AppError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;

        for route in &config.routes {
            if route.clauses().any(ExpectationClause::is_empty) {
                tracing::warn!("Route {} has an expectation without conditions", route.name);
            }
        }

        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

fn expand_tilde(path: &Path, home: Option<PathBuf>) -> PathBuf {
    match (path.strip_prefix("~"), home) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

fn parse_log_level(level_str: &str) -> anyhow::Result<Level> {
    match level_str.to_lowercase().as_str() {
        "error" => Ok(Level::ERROR),
        "warn" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        _ => Err(anyhow::anyhow!("Invalid log level: {}", level_str)),
    }
}
