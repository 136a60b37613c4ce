//! Configuration loading and typed config structures for the Tods simulation.
//!
//! The configuration lives in `tods-config.yaml` next to the binaries. Every
//! field has a default, so a missing section (or a missing file, via
//! [`TodsConfig::load_or_default`]) yields a playable setup.

use std::path::Path;

use serde::Deserialize;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "tods-config.yaml";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TodsConfig {
    /// World timing, map bounds, and player setup.
    #[serde(default)]
    pub world: WorldConfig,

    /// Durations and damage rules of the ship actions.
    #[serde(default)]
    pub actions: ActionConfig,

    /// HTTP transport settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Observer client settings.
    #[serde(default)]
    pub client: ClientConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TodsConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// The environment is not consulted; callers apply
    /// [`apply_env_overrides`](Self::apply_env_overrides) once after loading.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Like [`from_file`](Self::from_file), but falls back to defaults
    /// when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply `TODS_*` environment variable overrides. Unparseable values
    /// are ignored.
    ///
    /// - `TODS_API_HOST` overrides `api.host`
    /// - `TODS_API_PORT` overrides `api.port`
    /// - `TODS_SERVER_URL` overrides `client.server_url`
    /// - `TODS_SEED` overrides `world.seed`
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("TODS_API_HOST") {
            self.api.host = val;
        }
        if let Some(port) = std::env::var("TODS_API_PORT").ok().and_then(|v| v.parse().ok()) {
            self.api.port = port;
        }
        if let Ok(val) = std::env::var("TODS_SERVER_URL") {
            self.client.server_url = val;
        }
        if let Some(seed) = std::env::var("TODS_SEED").ok().and_then(|v| v.parse().ok()) {
            self.world.seed = Some(seed);
        }
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Real-time milliseconds between server scheduler ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// How long a player's command drain sleeps between commands.
    #[serde(default = "default_command_poll_interval_ms")]
    pub command_poll_interval_ms: u64,

    /// Ships spawned for every player that registers.
    #[serde(default = "default_ships_per_player")]
    pub ships_per_player: usize,

    /// Health of a freshly spawned ship.
    #[serde(default = "default_initial_health")]
    pub initial_health: i32,

    /// Columns available for spawning.
    #[serde(default = "default_map_width")]
    pub map_width: i32,

    /// Rows available for spawning.
    #[serde(default = "default_map_height")]
    pub map_height: i32,

    /// Seed for spawn placement. Random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            command_poll_interval_ms: default_command_poll_interval_ms(),
            ships_per_player: default_ships_per_player(),
            initial_health: default_initial_health(),
            map_width: default_map_width(),
            map_height: default_map_height(),
            seed: None,
        }
    }
}

/// Timing and damage of the ship actions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActionConfig {
    /// Gap between Spawn Begin and Spawn End.
    #[serde(default = "default_spawn_ms")]
    pub spawn_ms: u64,

    /// Duration of a move to an adjacent tile.
    #[serde(default = "default_move_ms")]
    pub move_ms: u64,

    /// Duration of a single strike.
    #[serde(default = "default_attack_ms")]
    pub attack_ms: u64,

    /// Pause between two strikes of the same attack.
    #[serde(default = "default_attack_cooldown_ms")]
    pub attack_cooldown_ms: u64,

    /// Gap between Despawn Begin and Despawn End.
    #[serde(default = "default_despawn_ms")]
    pub despawn_ms: u64,

    /// A strike deals `attacker.health / damage_divisor` damage.
    #[serde(default = "default_damage_divisor")]
    pub damage_divisor: i32,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            spawn_ms: default_spawn_ms(),
            move_ms: default_move_ms(),
            attack_ms: default_attack_ms(),
            attack_cooldown_ms: default_attack_cooldown_ms(),
            despawn_ms: default_despawn_ms(),
            damage_divisor: default_damage_divisor(),
        }
    }
}

/// HTTP transport configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiConfig {
    /// Bind address.
    #[serde(default = "default_api_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
        }
    }
}

/// Observer client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the authoritative server.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Render tick quantum fed to the observer scheduler.
    #[serde(default = "default_render_tick_ms")]
    pub render_tick_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            render_tick_ms: default_render_tick_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

const fn default_tick_interval_ms() -> u64 {
    128
}

const fn default_command_poll_interval_ms() -> u64 {
    32
}

const fn default_ships_per_player() -> usize {
    5
}

const fn default_initial_health() -> i32 {
    10_000
}

const fn default_map_width() -> i32 {
    20
}

const fn default_map_height() -> i32 {
    12
}

const fn default_spawn_ms() -> u64 {
    100
}

const fn default_move_ms() -> u64 {
    500
}

const fn default_attack_ms() -> u64 {
    200
}

const fn default_attack_cooldown_ms() -> u64 {
    100
}

const fn default_despawn_ms() -> u64 {
    100
}

const fn default_damage_divisor() -> i32 {
    5
}

fn default_api_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_api_port() -> u16 {
    13579
}

fn default_server_url() -> String {
    "http://127.0.0.1:13579".to_owned()
}

const fn default_render_tick_ms() -> u64 {
    16
}

fn default_log_level() -> String {
    "info".to_owned()
}
