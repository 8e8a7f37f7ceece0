//! Monitor configuration
//!
//! Loaded from TOML. Every field has a default, so an empty file is a
//! valid configuration.
//!
//! ```toml
//! [limits]
//! max_tokens = 64
//!
//! [watch]
//! capacity = 16
//!
//! [machine.registers]
//! sp = 0x80001000
//!
//! [[machine.memory]]
//! address = 0x80000000
//! value = 0x00000297
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::expr::token::{MAX_TOKENS, MAX_TOKEN_LEN};
use crate::machine::{register_index, SimpleMachine, UnknownRegister};
use crate::watch::DEFAULT_CAPACITY;

/// Largest accepted `limits.max_tokens`; evaluation recurses once per
/// nesting level, so this also bounds its stack depth
pub const MAX_TOKENS_LIMIT: usize = 1024;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error(transparent)]
    Register(#[from] UnknownRegister),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub limits: LimitsConfig,
    pub watch: WatchConfig,
    pub machine: MachineConfig,
}

/// Tokenizer capacity bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_tokens: usize,
    pub max_token_len: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_tokens: MAX_TOKENS,
            max_token_len: MAX_TOKEN_LEN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub capacity: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Initial state for the built-in machine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub registers: BTreeMap<String, u32>,
    pub memory: Vec<MemoryWord>,
}

/// One 4-byte word of memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryWord {
    pub address: u32,
    pub value: u32,
}

impl MonitorConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: MonitorConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_tokens == 0 {
            return Err(ConfigError::Invalid("limits.max_tokens must be positive".into()));
        }
        if self.limits.max_tokens > MAX_TOKENS_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "limits.max_tokens must be at most {}",
                MAX_TOKENS_LIMIT
            )));
        }
        if self.limits.max_token_len == 0 {
            return Err(ConfigError::Invalid("limits.max_token_len must be positive".into()));
        }
        if self.watch.capacity == 0 {
            return Err(ConfigError::Invalid("watch.capacity must be positive".into()));
        }
        Ok(())
    }

    /// Build a [`SimpleMachine`] holding the configured initial state.
    pub fn build_machine(&self) -> Result<SimpleMachine, ConfigError> {
        let mut machine = SimpleMachine::new();
        for (name, value) in &self.machine.registers {
            // Accept both `sp` and `$sp`; `$0` is itself a register name
            let name = match register_index(name) {
                Some(_) => name.as_str(),
                None => name.strip_prefix('$').unwrap_or(name),
            };
            machine.set_register(name, *value)?;
        }
        for word in &self.machine.memory {
            machine.write_word(word.address, word.value);
        }
        Ok(machine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::Machine;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = MonitorConfig::from_toml_str("").unwrap();
        assert_eq!(config, MonitorConfig::default());
        assert_eq!(config.limits.max_tokens, 32);
        assert_eq!(config.limits.max_token_len, 32);
        assert_eq!(config.watch.capacity, 32);
    }

    #[test]
    fn test_parse_full_config() {
        let config = MonitorConfig::from_toml_str(
            r#"
            [limits]
            max_tokens = 64

            [watch]
            capacity = 4

            [machine.registers]
            a0 = 5
            "$sp" = 0x80001000

            [[machine.memory]]
            address = 0x80000000
            value = 7
            "#,
        )
        .unwrap();

        assert_eq!(config.limits.max_tokens, 64);
        assert_eq!(config.limits.max_token_len, 32);
        assert_eq!(config.watch.capacity, 4);

        let machine = config.build_machine().unwrap();
        assert_eq!(machine.read_register("a0").unwrap(), 5);
        assert_eq!(machine.read_register("sp").unwrap(), 0x8000_1000);
        assert_eq!(machine.read_memory(0x8000_0000, 4), 7);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = MonitorConfig::from_toml_str("[watch]\ncapacity = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_token_limit_ceiling() {
        let at_limit = format!("[limits]\nmax_tokens = {}", MAX_TOKENS_LIMIT);
        assert!(MonitorConfig::from_toml_str(&at_limit).is_ok());

        let err = MonitorConfig::from_toml_str("[limits]\nmax_tokens = 400000").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_unknown_register_rejected() {
        let config = MonitorConfig::from_toml_str("[machine.registers]\npc = 1").unwrap();
        assert!(matches!(
            config.build_machine(),
            Err(ConfigError::Register(_))
        ));
    }

    #[test]
    fn test_parse_error() {
        let err = MonitorConfig::from_toml_str("[watch\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[watch]\ncapacity = 8").unwrap();
        let config = MonitorConfig::load(file.path()).unwrap();
        assert_eq!(config.watch.capacity, 8);

        let missing = MonitorConfig::load(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
