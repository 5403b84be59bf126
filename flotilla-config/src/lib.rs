use flotilla_core::{validate_roster, Coordinate, FleetError, PathRetention, VesselSeed};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use std::{fs, io};
use thiserror::Error;

// --- Error Type ---
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse JSON config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid vessel roster: {0}")]
    Roster(#[from] FleetError),

    #[error("invalid configuration: {0}")]
    Validation(String),
}

// --- Enums for Choices ---
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MotionType {
    /// Persisted heading, nudged every tick.
    #[default]
    Heading,
    /// Fresh random offset per axis every tick, no heading.
    IndependentAxis,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SerializerType {
    #[default]
    Json,
    Binary,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SenderType {
    #[default]
    Stdio,
    WebSocket,
    Null,
}

// --- Configuration Sections ---

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SerializerConfig {
    #[serde(rename = "type")]
    pub serializer_type: SerializerType,
    pub options: Option<serde_json::Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SenderConfig {
    #[serde(rename = "type")]
    pub sender_type: SenderType,
    pub options: Option<serde_json::Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct TransportConfig {
    #[serde(default)]
    pub serializer: SerializerConfig,
    #[serde(default)]
    pub sender: SenderConfig,
}

// --- Top-Level Config Struct ---

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Displacement per tick in coordinate units, before the speed factor.
    #[serde(default = "default_step")]
    pub step: f64,
    /// Largest heading change per tick, in radians.
    #[serde(default = "default_max_turn")]
    pub max_turn: f64,
    #[serde(default)]
    pub motion: MotionType,
    /// Seeds the random source for a reproducible run.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub retention: PathRetention,
    #[serde(default = "default_roster")]
    pub vessels: Vec<VesselSeed>,
    #[serde(default)]
    pub transport: TransportConfig,
}

fn default_tick_interval_ms() -> u64 { 5000 }
fn default_step() -> f64 { 0.01 }
fn default_max_turn() -> f64 { 0.1 }

/// The New York harbour roster; vessel 4 runs at double speed.
pub fn default_roster() -> Vec<VesselSeed> {
    vec![
        VesselSeed::new(1, "Vessel 1", Coordinate::new(-74.0060152, 40.7127281)),
        VesselSeed::new(2, "Vessel 2", Coordinate::new(-74.1, 40.8)),
        VesselSeed::new(3, "Vessel 3", Coordinate::new(-73.9, 40.6)),
        VesselSeed::new(4, "Vessel 4", Coordinate::new(-73.5, 40.4)).with_speed_factor(2.0),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            step: default_step(),
            max_turn: default_max_turn(),
            motion: MotionType::default(),
            seed: None,
            retention: PathRetention::default(),
            vessels: default_roster(),
            transport: TransportConfig::default(),
        }
    }
}

impl Config {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

// --- WebSocket Configuration ---
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WebSocketOptions {
    /// IP literal or a host name resolved when the server binds.
    #[serde(default = "default_ws_host")]
    pub host: String,
    #[serde(default = "default_ws_port")]
    pub port: u16,
}

fn default_ws_host() -> String { "127.0.0.1".to_string() }
fn default_ws_port() -> u16 { 8080 }

impl Default for WebSocketOptions {
    fn default() -> Self {
        Self {
            host: default_ws_host(),
            port: default_ws_port(),
        }
    }
}

impl WebSocketOptions {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// Helper methods for extracting options
impl SenderConfig {
    /// Websocket options from the `options` table; defaults when absent.
    pub fn get_websocket_options(&self) -> Result<WebSocketOptions, ConfigError> {
        let options: WebSocketOptions = match &self.options {
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| ConfigError::Validation(format!("Invalid websocket options: {}", e)))?,
            None => WebSocketOptions::default(),
        };

        if options.host.trim().is_empty() {
            return Err(ConfigError::Validation("Websocket host cannot be empty.".to_string()));
        }
        Ok(options)
    }
}

// --- Loading Functions ---

/// Reads and validates a config file. `.toml` files are parsed as TOML,
/// anything else as JSON.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    let is_toml = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("toml"));

    let config: Config = if is_toml {
        toml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };

    validate(&config)?;
    info!("Loaded configuration from {} ({} vessels)", path.display(), config.vessels.len());
    Ok(config)
}

/// Loads `path` when given, otherwise validates and returns the defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let config = Config::default();
            validate(&config)?;
            Ok(config)
        }
    }
}

pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.tick_interval_ms == 0 {
        return Err(ConfigError::Validation("Tick interval cannot be zero.".to_string()));
    }

    if !config.step.is_finite() || config.step < 0.0 {
        return Err(ConfigError::Validation(format!(
            "Step must be a finite, non-negative number (got {}).",
            config.step
        )));
    }

    if !config.max_turn.is_finite() || config.max_turn < 0.0 {
        return Err(ConfigError::Validation(format!(
            "Max turn must be a finite, non-negative number of radians (got {}).",
            config.max_turn
        )));
    }

    if config.vessels.is_empty() {
        return Err(ConfigError::Validation("The vessel roster is empty.".to_string()));
    }
    validate_roster(&config.vessels)?;

    if config.retention.max_points == Some(0) {
        return Err(ConfigError::Validation("retention.max_points must be at least 1.".to_string()));
    }

    if config.transport.sender.sender_type == SenderType::WebSocket {
        config.transport.sender.get_websocket_options()?;
    }

    if config.transport.serializer.serializer_type == SerializerType::Binary
        && config.transport.sender.sender_type == SenderType::Stdio
    {
        return Err(ConfigError::Validation(
            "The binary serializer needs a websocket or null sender; stdio is line-oriented JSON.".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flotilla_core::VesselId;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn load_valid_json_config() {
        let file = write_config(r#"{
          "tick_interval_ms": 20000,
          "step": 0.02,
          "motion": "independent_axis",
          "seed": 99,
          "retention": { "max_points": 500 },
          "vessels": [
            { "id": 1, "name": "Vessel 1", "position": [-74.006, 40.713] },
            { "id": 4, "name": "Vessel 4", "position": [-73.5, 40.4], "speed_factor": 2.0, "heading": 0.0 }
          ],
          "transport": {
            "serializer": { "type": "json", "options": null },
            "sender": { "type": "websocket", "options": { "port": 9001 } }
          }
        }"#);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.tick_interval(), Duration::from_secs(20));
        assert_eq!(config.step, 0.02);
        assert_eq!(config.max_turn, 0.1);
        assert_eq!(config.motion, MotionType::IndependentAxis);
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.retention.max_points, Some(500));
        assert_eq!(config.vessels.len(), 2);
        assert_eq!(config.vessels[0].speed_factor, 1.0);
        assert_eq!(config.vessels[1].id, VesselId(4));
        assert_eq!(config.vessels[1].heading, Some(0.0));
        assert_eq!(config.transport.sender.sender_type, SenderType::WebSocket);

        let ws = config.transport.sender.get_websocket_options().unwrap();
        assert_eq!(ws.host, "127.0.0.1");
        assert_eq!(ws.port, 9001);
        assert_eq!(ws.address(), "127.0.0.1:9001");
    }

    #[test]
    fn empty_json_object_uses_defaults() {
        let file = write_config("{}");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.tick_interval_ms, 5000);
        assert_eq!(config.step, 0.01);
        assert_eq!(config.motion, MotionType::Heading);
        assert_eq!(config.vessels, default_roster());
        assert!(config.retention.is_unbounded());
        assert_eq!(config.transport.serializer.serializer_type, SerializerType::Json);
        assert_eq!(config.transport.sender.sender_type, SenderType::Stdio);
    }

    #[test]
    fn load_toml_config() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        write!(file, r#"
tick_interval_ms = 250
max_turn = 0.05

[[vessels]]
id = 7
name = "Tug"
position = [-74.0, 40.7]

[transport.sender]
type = "null"
"#).unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.tick_interval_ms, 250);
        assert_eq!(config.max_turn, 0.05);
        assert_eq!(config.vessels.len(), 1);
        assert_eq!(config.vessels[0].name, "Tug");
        assert_eq!(config.transport.sender.sender_type, SenderType::Null);
    }

    #[test]
    fn load_invalid_tick_interval() {
        let file = write_config(r#"{ "tick_interval_ms": 0 }"#);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn duplicate_vessel_ids_fail_fast() {
        let file = write_config(r#"{
          "vessels": [
            { "id": 1, "name": "A", "position": [0.0, 0.0] },
            { "id": 1, "name": "B", "position": [1.0, 1.0] }
          ]
        }"#);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Roster(FleetError::DuplicateId(VesselId(1))))));
    }

    #[test]
    fn rejects_bad_numbers_and_combinations() {
        let mut config = Config::default();
        config.step = f64::INFINITY;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));

        let mut config = Config::default();
        config.retention.max_points = Some(0);
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));

        let mut config = Config::default();
        config.vessels.clear();
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));

        let mut config = Config::default();
        config.transport.serializer.serializer_type = SerializerType::Binary;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
        config.transport.sender.sender_type = SenderType::WebSocket;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn bundled_config_matches_default_roster() {
        let config: Config = serde_json::from_str(include_str!("../../config.json")).unwrap();
        validate(&config).unwrap();
        assert_eq!(config.vessels, default_roster());
        assert_eq!(config.retention.max_points, Some(2000));
        assert_eq!(config.transport.sender.get_websocket_options().unwrap(), WebSocketOptions::default());
    }

    #[test]
    fn bad_websocket_options_fail_validation() {
        let file = write_config(r#"{
          "transport": {
            "sender": { "type": "websocket", "options": { "host": "0.0.0.0", "port": 70000 } }
          }
        }"#);
        assert!(matches!(load_config(file.path()), Err(ConfigError::Validation(_))));

        let mut config = Config::default();
        config.transport.sender.sender_type = SenderType::WebSocket;
        config.transport.sender.options = Some(serde_json::json!({ "host": "", "port": 9001 }));
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));

        config.transport.sender.options = Some(serde_json::json!({ "host": "localhost", "port": 9001 }));
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let file = write_config("{ not json");
        assert!(matches!(load_config(file.path()), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = load_or_default(Some(Path::new("/definitely/not/here.json")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
        assert!(load_or_default(None).is_ok());
    }
}
