use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use validator::Validate;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Record fields holding a node's coordinates
#[derive(Clone, Debug, PartialEq, Eq, Validate, Serialize, Deserialize)]
pub struct GeomConfig {
    #[validate(length(min = 1, message = "Latitude field cannot be empty"))]
    pub lat: String,

    #[validate(length(min = 1, message = "Longitude field cannot be empty"))]
    pub lon: String,
}

/// Connection to one Cypher HTTP server
#[derive(Clone, Debug, PartialEq, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Name the connection is registered under
    #[validate(length(min = 1, message = "Connection identity cannot be empty"))]
    pub identity: String,

    /// URL scheme including the separator, e.g. `http://`
    #[validate(length(min = 1, message = "Protocol cannot be empty"))]
    pub protocol: String,

    #[validate(length(min = 1, message = "Host cannot be empty"))]
    pub host: String,

    /// Server port (1-65535)
    #[validate(range(min = 1, max = 65535, message = "Port must be between 1 and 65535"))]
    pub port: u16,

    /// Path of the REST service root
    pub base: String,

    /// Log every compiled statement at debug level
    pub debug: bool,

    /// Coordinate fields; enables proximity search and spatial indexing
    #[validate(nested)]
    pub geom: Option<GeomConfig>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            identity: "default".to_string(),
            protocol: "http://".to_string(),
            host: "localhost".to_string(),
            port: 7474,
            base: "/db/data".to_string(),
            debug: true,
            geom: None,
        }
    }
}

impl ConnectionConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let geom = match (env::var("NEO4J_GEOM_LAT"), env::var("NEO4J_GEOM_LON")) {
            (Ok(lat), Ok(lon)) => Some(GeomConfig { lat, lon }),
            _ => None,
        };

        let config = Self {
            identity: env::var("NEO4J_IDENTITY").unwrap_or_else(|_| "default".to_string()),
            protocol: env::var("NEO4J_PROTOCOL").unwrap_or_else(|_| "http://".to_string()),
            host: env::var("NEO4J_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: parse_env_var("NEO4J_PORT", "7474")?,
            base: env::var("NEO4J_BASE").unwrap_or_else(|_| "/db/data".to_string()),
            debug: parse_env_var("NEO4J_DEBUG", "true")?,
            geom,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from CLI arguments with validation
    pub fn from_cli(cli: CliConfig) -> Result<Self, ConfigError> {
        let geom = match (cli.geom_lat, cli.geom_lon) {
            (Some(lat), Some(lon)) => Some(GeomConfig { lat, lon }),
            _ => None,
        };

        let config = Self {
            identity: cli.identity,
            protocol: cli.protocol,
            host: cli.host,
            port: cli.port,
            base: cli.base,
            debug: cli.debug,
            geom,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Service root URI, e.g. `http://localhost:7474/db/data`
    pub fn endpoint(&self) -> String {
        format!("{}{}:{}{}", self.protocol, self.host, self.port, self.base)
    }
}

/// CLI configuration (parsed from command line arguments)
#[derive(Clone, Debug)]
pub struct CliConfig {
    pub identity: String,
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub base: String,
    pub debug: bool,
    pub geom_lat: Option<String>,
    pub geom_lon: Option<String>,
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}
