//! Service configuration.
//!
//! Settings come from an optional TOML file, then environment
//! variables override individual values. Credentials are normally
//! supplied through the environment only.

use crate::sensors::DEFAULT_IIO_ROOT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default port of the biosensor service.
pub const BIOSENSOR_DEFAULT_PORT: u16 = 5001;
/// Default port of the quantum entropy service.
pub const QUANTUM_DEFAULT_PORT: u16 = 5000;
/// IBM Quantum Runtime API root.
pub const DEFAULT_IBM_API_URL: &str = "https://api.quantum-computing.ibm.com/runtime";

/// Configuration errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// Config file is not valid TOML.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {key}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Offending value.
        value: String,
    },
    /// Listen port is zero.
    #[error("port must be non-zero")]
    InvalidPort,
    /// `min_qubits` is zero.
    #[error("min_qubits must be at least 1")]
    InvalidMinQubits,
    /// `requests_per_minute` is zero.
    #[error("requests_per_minute must be at least 1")]
    InvalidRateLimit,
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServiceConfig {
    /// Listener settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Biosensor node settings.
    #[serde(default)]
    pub biosensor: BiosensorConfig,
    /// Quantum entropy settings.
    #[serde(default)]
    pub quantum: QuantumConfig,
    /// Entropy endpoint admission control.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Listener settings shared by both services.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Overrides the per-service default port.
    pub port: Option<u16>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: None,
        }
    }
}

/// Biosensor node settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BiosensorConfig {
    /// Shared secret expected in `X-API-Key`; authentication is off when unset.
    pub api_key: Option<String>,
    /// Directory holding IIO devices.
    pub iio_root: PathBuf,
    /// Use simulated sensors instead of hardware.
    pub mock: bool,
}

impl Default for BiosensorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            iio_root: PathBuf::from(DEFAULT_IIO_ROOT),
            mock: false,
        }
    }
}

/// Quantum entropy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantumConfig {
    /// Attempt real hardware at startup.
    pub use_hardware: bool,
    /// IBM Quantum API token.
    pub api_token: Option<String>,
    /// IBM Quantum Runtime API root.
    pub api_url: String,
    /// Smallest device accepted during backend selection.
    pub min_qubits: u32,
    /// Skip circuits and use the OS CSPRNG.
    pub mock: bool,
}

impl Default for QuantumConfig {
    fn default() -> Self {
        Self {
            use_hardware: false,
            api_token: None,
            api_url: DEFAULT_IBM_API_URL.to_string(),
            min_qubits: 5,
            mock: false,
        }
    }
}

/// Admission control ahead of entropy generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Entropy requests admitted per client per minute.
    pub requests_per_minute: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 10,
        }
    }
}

impl ServiceConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Loads the file (if any), applies process environment overrides and validates.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies environment overrides read through `lookup`.
    ///
    /// A present `QISKIT_API_TOKEN` requests hardware unless
    /// `QUANTUM_USE_HARDWARE` says otherwise.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some((_, host)) = lookup_first(&lookup, HOST_VARS) {
            self.server.host = host;
        }
        if let Some((key, port)) = lookup_first(&lookup, PORT_VARS) {
            self.server.port = Some(parse(key, &port)?);
        }
        if let Some(key) = lookup("BIOSENSOR_API_KEY").filter(|k| !k.is_empty()) {
            self.biosensor.api_key = Some(key);
        }
        if let Some(root) = lookup("BIOSENSOR_IIO_ROOT") {
            self.biosensor.iio_root = PathBuf::from(root);
        }
        if let Some(token) = lookup("QISKIT_API_TOKEN").filter(|t| !t.is_empty()) {
            self.quantum.api_token = Some(token);
            self.quantum.use_hardware = true;
        }
        if let Some(flag) = lookup("QUANTUM_USE_HARDWARE") {
            self.quantum.use_hardware = parse_bool("QUANTUM_USE_HARDWARE", &flag)?;
        }
        Ok(())
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == Some(0) {
            return Err(ConfigError::InvalidPort);
        }
        if self.quantum.min_qubits == 0 {
            return Err(ConfigError::InvalidMinQubits);
        }
        if self.rate_limit.requests_per_minute == 0 {
            return Err(ConfigError::InvalidRateLimit);
        }
        Ok(())
    }
}

/// Listen host variables, most specific first; `FLASK_*` names are legacy.
const HOST_VARS: &[&str] = &["SERVICE_HOST", "FLASK_HOST"];
const PORT_VARS: &[&str] = &["SERVICE_PORT", "FLASK_PORT"];

fn lookup_first<F>(lookup: &F, keys: &[&'static str]) -> Option<(&'static str, String)>
where
    F: Fn(&str) -> Option<String>,
{
    keys.iter().find_map(|&key| lookup(key).map(|value| (key, value)))
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config_valid() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rate_limit.requests_per_minute, 10);
        assert_eq!(config.quantum.min_qubits, 5);
        assert!(!config.quantum.use_hardware);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [server]
            port = 8080

            [quantum]
            mock = true
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, Some(8080));
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.quantum.mock);
        assert_eq!(config.quantum.api_url, DEFAULT_IBM_API_URL);
        assert_eq!(config.biosensor.iio_root, PathBuf::from(DEFAULT_IIO_ROOT));
    }

    #[test]
    fn test_token_enables_hardware() {
        let mut config = ServiceConfig::default();
        config
            .apply_env(env(&[("QISKIT_API_TOKEN", "secret")]))
            .unwrap();
        assert!(config.quantum.use_hardware);
        assert_eq!(config.quantum.api_token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_explicit_flag_overrides_token() {
        let mut config = ServiceConfig::default();
        config
            .apply_env(env(&[
                ("QISKIT_API_TOKEN", "secret"),
                ("QUANTUM_USE_HARDWARE", "false"),
            ]))
            .unwrap();
        assert!(!config.quantum.use_hardware);
    }

    #[test]
    fn test_bad_env_values_rejected() {
        let mut config = ServiceConfig::default();
        assert!(matches!(
            config.apply_env(env(&[("SERVICE_PORT", "http")])),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            config.apply_env(env(&[("QUANTUM_USE_HARDWARE", "maybe")])),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_legacy_listen_variables() {
        let mut config = ServiceConfig::default();
        config
            .apply_env(env(&[("FLASK_HOST", "127.0.0.1"), ("FLASK_PORT", "8000")]))
            .unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, Some(8000));

        // SERVICE_* wins when both are set.
        let mut config = ServiceConfig::default();
        config
            .apply_env(env(&[
                ("FLASK_PORT", "8000"),
                ("SERVICE_PORT", "9000"),
                ("SERVICE_HOST", "::1"),
                ("FLASK_HOST", "127.0.0.1"),
            ]))
            .unwrap();
        assert_eq!(config.server.port, Some(9000));
        assert_eq!(config.server.host, "::1");

        let mut config = ServiceConfig::default();
        assert!(matches!(
            config.apply_env(env(&[("FLASK_PORT", "web")])),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "FLASK_PORT"
        ));
    }

    #[test]
    fn test_zero_rate_limit_invalid() {
        let mut config = ServiceConfig::default();
        config.rate_limit.requests_per_minute = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRateLimit)
        ));
    }

    #[test]
    fn test_from_file_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chimera.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();
        assert!(matches!(
            ServiceConfig::from_file(&path),
            Err(ConfigError::ParseError(_))
        ));
        assert!(matches!(
            ServiceConfig::from_file(dir.path().join("missing.toml")),
            Err(ConfigError::FileReadError(_))
        ));
    }
}
