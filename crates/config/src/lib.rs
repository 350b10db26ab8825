use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use custody_common::{StakeholderId, Weight, MAX_EVENT_BUFFER};

/// Errors that can occur in configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidEnvVar(String, String),

    #[error("Failed to read file: {0}")]
    FileReadError(String),

    #[error("Failed to parse YAML: {0}")]
    YamlParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Environment variable naming a YAML file that takes precedence over the
/// individual `CUSTODY_*` variables
pub const CONFIG_FILE_VAR: &str = "CUSTODY_CONFIG_FILE";

/// Treasury configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryConfig {
    /// The only identity allowed to open withdrawal proposals
    pub administrator: StakeholderId,
    /// Payee for executed proposals; the administrator when unset
    #[serde(default)]
    pub beneficiary: Option<StakeholderId>,
    /// Upper bound on a proposal's voting window, in seconds
    #[serde(default)]
    pub max_voting_period_secs: Option<u64>,
    /// Capacity of the broadcast notification channel
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for rolling log files; console only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    /// Initial voting weight per stakeholder
    #[serde(default)]
    pub allocations: BTreeMap<StakeholderId, Weight>,
    /// How often the service sweeps for proposals past their deadline
    #[serde(default = "default_finalize_interval")]
    pub finalize_interval_secs: u64,
}

fn default_event_buffer() -> usize {
    1024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_finalize_interval() -> u64 {
    30
}

impl TreasuryConfig {
    /// Minimal configuration with defaults for everything but the administrator
    pub fn new(administrator: impl Into<StakeholderId>) -> Self {
        Self {
            administrator: administrator.into(),
            beneficiary: None,
            max_voting_period_secs: None,
            event_buffer: default_event_buffer(),
            log_level: default_log_level(),
            log_dir: None,
            allocations: BTreeMap::new(),
            finalize_interval_secs: default_finalize_interval(),
        }
    }

    /// Identity executed proposals pay out to
    pub fn payee(&self) -> &StakeholderId {
        self.beneficiary.as_ref().unwrap_or(&self.administrator)
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value.
    ///
    /// If `CUSTODY_CONFIG_FILE` is set, that file is used and every other
    /// variable is ignored; a missing file is an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(CONFIG_FILE_VAR) {
            if !Path::new(&path).exists() {
                return Err(ConfigError::FileReadError(format!(
                    "{} points to {}, which does not exist",
                    CONFIG_FILE_VAR, path
                )));
            }
            debug!(path = %path, "Loading treasury configuration from file");
            return Self::from_file(&path);
        }

        let administrator = lookup("CUSTODY_ADMINISTRATOR")
            .ok_or_else(|| ConfigError::EnvVarNotFound("CUSTODY_ADMINISTRATOR".to_string()))?;

        let mut config = Self::new(administrator);
        config.beneficiary = lookup("CUSTODY_BENEFICIARY").map(StakeholderId::from);
        config.max_voting_period_secs = lookup("CUSTODY_MAX_VOTING_PERIOD_SECS")
            .map(|v| parse_var("CUSTODY_MAX_VOTING_PERIOD_SECS", &v))
            .transpose()?;
        if let Some(v) = lookup("CUSTODY_EVENT_BUFFER") {
            config.event_buffer = parse_var("CUSTODY_EVENT_BUFFER", &v)?;
        }
        if let Some(level) = lookup("CUSTODY_LOG_LEVEL") {
            config.log_level = level;
        }
        config.log_dir = lookup("CUSTODY_LOG_DIR").map(PathBuf::from);
        if let Some(v) = lookup("CUSTODY_ALLOCATIONS") {
            config.allocations = parse_allocations(&v)?;
        }
        if let Some(v) = lookup("CUSTODY_FINALIZE_INTERVAL_SECS") {
            config.finalize_interval_secs = parse_var("CUSTODY_FINALIZE_INTERVAL_SECS", &v)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            ConfigError::FileReadError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: TreasuryConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.administrator.is_empty() {
            return Err(ConfigError::Invalid("administrator must not be empty".to_string()));
        }
        if self.beneficiary.as_ref().map_or(false, |b| b.is_empty()) {
            return Err(ConfigError::Invalid("beneficiary must not be empty".to_string()));
        }
        if self.max_voting_period_secs == Some(0) {
            return Err(ConfigError::Invalid("max_voting_period_secs must be > 0".to_string()));
        }
        if self.event_buffer == 0 || self.event_buffer > MAX_EVENT_BUFFER {
            return Err(ConfigError::Invalid(format!(
                "event_buffer must be between 1 and {}",
                MAX_EVENT_BUFFER
            )));
        }
        if self.finalize_interval_secs == 0 {
            return Err(ConfigError::Invalid("finalize_interval_secs must be > 0".to_string()));
        }
        if self.allocations.keys().any(|k| k.is_empty()) {
            return Err(ConfigError::Invalid("allocation holder must not be empty".to_string()));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(name.to_string(), e.to_string()))
}

/// Parse `alice=10,bob=5`; repeated holders accumulate
fn parse_allocations(value: &str) -> Result<BTreeMap<StakeholderId, Weight>> {
    let mut allocations: BTreeMap<StakeholderId, Weight> = BTreeMap::new();
    for pair in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (holder, weight) = pair.split_once('=').ok_or_else(|| {
            ConfigError::InvalidEnvVar(
                "CUSTODY_ALLOCATIONS".to_string(),
                format!("expected holder=weight, got {}", pair),
            )
        })?;
        let weight: Weight = parse_var("CUSTODY_ALLOCATIONS", weight.trim())?;
        let entry = allocations.entry(StakeholderId::from(holder.trim())).or_insert(0);
        *entry = entry.saturating_add(weight);
    }
    Ok(allocations)
}
