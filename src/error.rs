use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection failure or timeout while talking to the gateway.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The gateway answered, but not with a success status. The body is never parsed.
    #[error("Gateway returned HTTP status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Appliance {0} not found in latest snapshot")]
    UnknownAppliance(String),

    #[error("No appliance snapshot available yet")]
    NoSnapshot,

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
