//! Configuration management with validation and defaults
//!
//! Sections are loaded from TOML, then overridden from the environment, then
//! validated as a whole.

use crate::errors::{ConfigurationError, HallResult};
use crate::games::{BonusRule, CardPoolError, CardRegistry, PatternKind};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HallConfig {
    pub game: GameConfig,
    pub settlement: SettlementConfig,
    pub api: ApiConfig,
    pub monitoring: MonitoringConfig,
}

/// Card pool and round defaults
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    /// JSON card pool; when unset a pool is generated from the seed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_pool_path: Option<PathBuf>,
    pub generated_pool_size: u32,
    pub pool_seed: u64,
    pub default_pattern: PatternKind,
    pub bet_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bonus: Option<BonusRule>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            card_pool_path: None,
            generated_pool_size: 100,
            pool_seed: 75,
            default_pattern: PatternKind::AnyLine,
            bet_amount: 10.0,
            bonus: None,
        }
    }
}

impl GameConfig {
    pub fn load_cards(&self) -> Result<CardRegistry, CardPoolError> {
        match &self.card_pool_path {
            Some(path) => CardRegistry::load_json(path),
            None => Ok(CardRegistry::generate(self.generated_pool_size, self.pool_seed)),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SettlementConfig {
    /// Auto-lock flag given to accounts created without one
    pub default_auto_lock: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            allowed_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(ConfigurationError::InvalidValue {
                field: "monitoring.log_level".to_string(),
                value: s.to_string(),
                reason: "expected one of error, warn, info, debug, trace".to_string(),
            }),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enable_metrics: bool,
    pub log_level: LogLevel,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enable_metrics: true,
            log_level: LogLevel::Info,
        }
    }
}

impl HallConfig {
    /// Verbose logging and a small generated pool
    pub fn development() -> Self {
        Self {
            game: GameConfig {
                generated_pool_size: 20,
                ..Default::default()
            },
            monitoring: MonitoringConfig {
                log_level: LogLevel::Debug,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Listen on all interfaces and refuse settlements that would create debt
    pub fn production() -> Self {
        Self {
            game: GameConfig {
                generated_pool_size: 500,
                ..Default::default()
            },
            settlement: SettlementConfig {
                default_auto_lock: true,
            },
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                request_timeout_secs: 15,
                ..Default::default()
            },
            monitoring: MonitoringConfig {
                log_level: LogLevel::Info,
                ..Default::default()
            },
        }
    }

    /// Validate configuration for logical consistency
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.game.card_pool_path.is_none() && self.game.generated_pool_size == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "game.generated_pool_size".to_string(),
                value: "0".to_string(),
                reason: "a generated pool needs at least one card".to_string(),
            });
        }
        if !self.game.bet_amount.is_finite() || self.game.bet_amount < 0.0 {
            return Err(ConfigurationError::InvalidValue {
                field: "game.bet_amount".to_string(),
                value: self.game.bet_amount.to_string(),
                reason: "bet must be a non-negative number".to_string(),
            });
        }
        if let Some(bonus) = &self.game.bonus {
            if bonus.max_calls == 0 || !bonus.amount.is_finite() || bonus.amount < 0.0 {
                return Err(ConfigurationError::ValidationFailed(format!(
                    "bonus needs max_calls > 0 and a non-negative amount, got {:?}",
                    bonus
                )));
            }
        }
        if self.api.port == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "api.port".to_string(),
                value: "0".to_string(),
                reason: "Port cannot be zero".to_string(),
            });
        }
        if self.api.host.trim().is_empty() {
            return Err(ConfigurationError::ValidationFailed(
                "api.host cannot be empty".to_string(),
            ));
        }
        if self.api.request_timeout_secs == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "api.request_timeout_secs".to_string(),
                value: "0".to_string(),
                reason: "Timeout must be at least one second".to_string(),
            });
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

/// Configuration loader with environment variable support
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Load from file (or defaults), apply environment overrides, validate
    pub fn load(&self) -> HallResult<HallConfig> {
        let base = match &self.config_path {
            Some(path) => Self::load_from_file(path)?,
            None => HallConfig::default(),
        };
        self.load_with_base(base)
    }

    /// Apply environment overrides on top of an already built config (a preset)
    pub fn load_with_base(&self, mut config: HallConfig) -> HallResult<HallConfig> {
        Self::apply_env_overrides(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    fn load_from_file(path: &Path) -> Result<HallConfig, ConfigurationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigurationError::LoadFailed(format!("Failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to parse TOML: {}", e)))
    }

    fn apply_env_overrides(config: &mut HallConfig) -> Result<(), ConfigurationError> {
        if let Ok(host) = env::var("BINGOHALL_API_HOST") {
            config.api.host = host;
        }
        if let Ok(port) = env::var("BINGOHALL_API_PORT") {
            config.api.port = port.parse().map_err(|_| ConfigurationError::InvalidValue {
                field: "BINGOHALL_API_PORT".to_string(),
                value: port,
                reason: "Invalid port number".to_string(),
            })?;
        }
        if let Ok(path) = env::var("BINGOHALL_CARD_POOL") {
            config.game.card_pool_path = Some(PathBuf::from(path));
        }
        if let Ok(level) = env::var("BINGOHALL_LOG_LEVEL") {
            config.monitoring.log_level = level.parse()?;
        }
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, config: &HallConfig, path: P) -> HallResult<()> {
        let toml_string = toml::to_string_pretty(config).map_err(|e| {
            ConfigurationError::SaveFailed(format!("Failed to serialize config: {}", e))
        })?;
        std::fs::write(path.as_ref(), toml_string).map_err(|e| {
            ConfigurationError::SaveFailed(format!(
                "Failed to write to {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_presets_are_valid() {
        assert!(HallConfig::default().validate().is_ok());
        assert!(HallConfig::development().validate().is_ok());
        assert!(HallConfig::production().validate().is_ok());
        assert!(HallConfig::production().settlement.default_auto_lock);
    }

    #[test]
    fn test_invalid_config_validation() {
        let mut config = HallConfig::default();
        config.api.port = 0;
        assert!(config.validate().is_err());

        let mut config = HallConfig::default();
        config.game.generated_pool_size = 0;
        assert!(config.validate().is_err());

        let mut config = HallConfig::default();
        config.game.bonus = Some(BonusRule {
            max_calls: 0,
            amount: 5.0,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_config() -> HallResult<()> {
        let temp_file = NamedTempFile::new()?;
        let mut original = HallConfig::development();
        original.game.default_pattern = PatternKind::X;
        original.game.bonus = Some(BonusRule {
            max_calls: 10,
            amount: 50.0,
        });

        let loader = ConfigLoader::new();
        loader.save(&original, temp_file.path())?;
        let loaded = ConfigLoader::load_from_file(temp_file.path())?;

        assert_eq!(loaded, original);
        Ok(())
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(
            temp_file.path(),
            "[game]\ndefault_pattern = \"outerSquare\"\n\n[api]\nport = 9100\n",
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(temp_file.path()).unwrap();
        assert_eq!(config.game.default_pattern, PatternKind::OuterSquare);
        assert_eq!(config.api.port, 9100);
        assert_eq!(config.api.host, "127.0.0.1");
        assert_eq!(config.game.generated_pool_size, 100);
    }

    #[test]
    fn test_unparsable_file_is_load_error() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "[api\nport = ").unwrap();
        assert!(matches!(
            ConfigLoader::load_from_file(temp_file.path()),
            Err(ConfigurationError::LoadFailed(_))
        ));
    }

    // only test in the crate that touches BINGOHALL_* variables
    #[test]
    fn test_env_overrides_apply_to_presets() {
        env::set_var("BINGOHALL_API_PORT", "9443");
        env::set_var("BINGOHALL_LOG_LEVEL", "warn");
        let loaded = ConfigLoader::new().load_with_base(HallConfig::production());
        env::set_var("BINGOHALL_API_PORT", "not-a-port");
        let bad_port = ConfigLoader::new().load_with_base(HallConfig::development());
        env::remove_var("BINGOHALL_API_PORT");
        env::remove_var("BINGOHALL_LOG_LEVEL");

        let config = loaded.unwrap();
        assert_eq!(config.api.port, 9443);
        assert_eq!(config.monitoring.log_level, LogLevel::Warn);
        assert_eq!(config.api.host, "0.0.0.0");
        assert!(config.settlement.default_auto_lock);
        assert!(bad_port.is_err());
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_generated_pool_from_config() {
        let config = HallConfig::development();
        let cards = config.game.load_cards().unwrap();
        assert_eq!(cards.len(), 20);
    }
}
