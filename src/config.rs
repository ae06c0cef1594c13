use crate::error::{AppError, Result};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub stretch: StretchConfig,
    #[serde(default)]
    pub poll: PollConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StretchConfig {
    /// Gateway address, optionally with a port ("192.168.1.20" or "stretch.local:80")
    pub host: String,
    /// The gateway password (the 8-character ID printed on the device)
    pub password: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_throttle_secs")]
    pub throttle_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_throttle_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub interval_secs: u64,
}

fn default_poll_interval_secs() -> u64 {
    60
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval_secs(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file with environment variable substitution
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    /// Parse YAML after expanding $(VAR)/${VAR} placeholders.
    /// STRETCH_HOST and STRETCH_PASSWORD, when set, win over the file.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let expanded = expand_env_placeholders(raw)?;
        let mut cfg: Config = serde_yaml::from_str(&expanded)?;

        if let Ok(host) = std::env::var("STRETCH_HOST") {
            cfg.stretch.host = host;
        }
        if let Ok(password) = std::env::var("STRETCH_PASSWORD") {
            cfg.stretch.password = password;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.stretch.host.trim().is_empty() {
            return Err(AppError::Config("stretch.host cannot be empty".to_string()));
        }

        if self.stretch.timeout_secs == 0 {
            return Err(AppError::Config(
                "stretch.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.poll.interval_secs == 0 {
            return Err(AppError::Config(
                "poll.interval_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Expand $(VAR) and ${VAR} from the environment; "$$" is a literal "$".
/// Any other "$" is left alone. An unset variable is an error.
fn expand_env_placeholders(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\$|\$\(([A-Za-z_][A-Za-z0-9_]*)\)|\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
        .map_err(|e| AppError::Config(e.to_string()))?;

    let mut missing: Option<String> = None;
    let expanded = re.replace_all(input, |caps: &Captures| {
        match caps.get(1).or_else(|| caps.get(2)) {
            None => "$".to_string(),
            Some(var) => std::env::var(var.as_str()).unwrap_or_else(|_| {
                missing.get_or_insert_with(|| var.as_str().to_string());
                String::new()
            }),
        }
    });

    if let Some(var) = missing {
        return Err(AppError::Config(format!(
            "missing environment variable: {var}"
        )));
    }
    Ok(expanded.into_owned())
}
