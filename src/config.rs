use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core_types::{Address, Amount, ParseError, parse_units};
use crate::tokens::{TokenInfo, TokenRegistry};
use crate::transfer::WaitConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config yaml {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "CONFIG_READ",
            ConfigError::Parse { .. } => "CONFIG_PARSE",
            ConfigError::Invalid { .. } => "CONFIG_INVALID",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub confirmation: ConfirmationConfig,
    /// Symbol -> token address
    #[serde(default = "default_tokens")]
    pub tokens: BTreeMap<String, Address>,
    #[serde(default)]
    pub transfer: TransferConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub explorer_tx_base: String,
    pub request_timeout_ms: u64,
    /// Use the in-process simulated chain
    #[serde(default)]
    pub mock: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://rpc.moderato.tempo.xyz".to_string(),
            explorer_tx_base: "https://explore.tempo.xyz/tx/".to_string(),
            request_timeout_ms: 30_000,
            mock: false,
        }
    }
}

impl ChainConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct ConfirmationConfig {
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 120_000,
            poll_interval_ms: 1_000,
        }
    }
}

impl ConfirmationConfig {
    pub fn wait_config(&self) -> WaitConfig {
        WaitConfig::from_millis(self.timeout_ms, self.poll_interval_ms)
    }
}

/// Demo transfer defaults
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TransferConfig {
    pub recipient: Address,
    /// Human units, e.g. "10"
    pub amount: String,
    pub decimals: u32,
}

impl Default for TransferConfig {
    fn default() -> Self {
        let mut dead = [0u8; 20];
        dead[18] = 0xde;
        dead[19] = 0xad;
        Self {
            recipient: Address::new(dead),
            amount: "10".to_string(),
            decimals: 6,
        }
    }
}

impl TransferConfig {
    /// Default amount in smallest units
    pub fn amount_units(&self) -> Result<Amount, ParseError> {
        parse_units(&self.amount, self.decimals)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionConfig {
    pub store_path: String,
    pub rp_id: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            store_path: "./data/session.json".to_string(),
            rp_id: "localhost".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub dist_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            dist_dir: "./dist".to_string(),
        }
    }
}

fn default_tokens() -> BTreeMap<String, Address> {
    TokenRegistry::moderato()
        .tokens()
        .iter()
        .map(|t| (t.symbol.clone(), t.address))
        .collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "./logs".to_string(),
            log_file: "tempo-fees.log".to_string(),
            use_json: false,
            rotation: "daily".to_string(),
            chain: ChainConfig::default(),
            confirmation: ConfirmationConfig::default(),
            tokens: default_tokens(),
            transfer: TransferConfig::default(),
            session: SessionConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read `config/<env>.yaml`, then apply environment overrides.
    pub fn load(env: &str) -> Result<Self, ConfigError> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
            path: config_path.clone(),
            source,
        })?;
        let mut config = Self::from_yaml(&config_path, &content)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_yaml(path: &str, content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// `TEMPO_RPC_URL`, `TEMPO_EXPLORER_TX_BASE`, `PORT`
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("TEMPO_RPC_URL").filter(|v| !v.is_empty()) {
            self.chain.rpc_url = url;
        }
        if let Some(base) = lookup("TEMPO_EXPLORER_TX_BASE").filter(|v| !v.is_empty()) {
            self.chain.explorer_tx_base = base;
        }
        if let Some(port) = lookup("PORT").filter(|v| !v.is_empty()) {
            self.server.port = port.parse().map_err(|_| ConfigError::Invalid {
                field: "PORT",
                reason: format!("not a port number: {}", port),
            })?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tokens.is_empty() {
            return Err(ConfigError::Invalid {
                field: "tokens",
                reason: "at least one token is required".to_string(),
            });
        }
        if self.confirmation.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "confirmation.poll_interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        self.transfer
            .amount_units()
            .map_err(|e| ConfigError::Invalid {
                field: "transfer.amount",
                reason: e.to_string(),
            })?;
        Ok(())
    }

    pub fn token_registry(&self) -> TokenRegistry {
        TokenRegistry::new(
            self.tokens
                .iter()
                .map(|(symbol, address)| TokenInfo {
                    symbol: symbol.clone(),
                    address: *address,
                })
                .collect(),
        )
    }

    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(&self.session.store_path)
    }
}
