//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! API credentials are referenced by env-var name in the config and
//! resolved at runtime, never stored in the file.

use anyhow::{Context, Result};
use rust_decimal::prelude::*;
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::time::Duration;

use crate::engine::executor::ExecutionSettings;
use crate::engine::monitor::MonitorSettings;
use crate::engine::runner::BotSettings;
use crate::engine::scanner::ScanSettings;
use crate::storage::DEFAULT_TRADE_LOG;
use crate::types::{BotError, ANCHOR_ASSET, FEE_RATE};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub bot: BotConfig,
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BotConfig {
    /// Anchor-asset amount committed to each trade cycle.
    pub usdt_amount: f64,
    /// Minimum estimated profit, in percent, for a triangle to execute.
    pub threshold_percent: f64,
    #[serde(default)]
    pub use_limit_entry: bool,
    #[serde(default = "default_max_deviation")]
    pub max_deviation_percent: f64,
    #[serde(default = "default_anchor")]
    pub anchor_asset: String,
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,
    #[serde(default = "default_error_backoff")]
    pub error_backoff_secs: u64,
    #[serde(default)]
    pub cache_triangles: bool,
    #[serde(default = "default_refresh_ticks")]
    pub triangle_refresh_ticks: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExchangeConfig {
    /// Override for the REST endpoint, e.g. the spot testnet.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_api_secret_env")]
    pub api_secret_env: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_recv_window")]
    pub recv_window_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExecutionConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub limit_order_timeout_secs: Option<u64>,
    #[serde(default = "default_trade_log")]
    pub trade_log_path: String,
}

fn default_max_deviation() -> f64 {
    1.0
}
fn default_anchor() -> String {
    ANCHOR_ASSET.to_string()
}
fn default_scan_interval() -> u64 {
    5
}
fn default_error_backoff() -> u64 {
    5
}
fn default_refresh_ticks() -> u64 {
    60
}
fn default_api_key_env() -> String {
    "BINANCE_API_KEY".to_string()
}
fn default_api_secret_env() -> String {
    "BINANCE_API_SECRET".to_string()
}
fn default_request_timeout() -> u64 {
    10
}
fn default_recv_window() -> u64 {
    5000
}
fn default_poll_interval() -> u64 {
    1000
}
fn default_trade_log() -> String {
    DEFAULT_TRADE_LOG.to_string()
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key_env: default_api_key_env(),
            api_secret_env: default_api_secret_env(),
            request_timeout_secs: default_request_timeout(),
            recv_window_ms: default_recv_window(),
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            limit_order_timeout_secs: None,
            trade_log_path: default_trade_log(),
        }
    }
}

/// API key and secret read from the environment.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: SecretString,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"[REDACTED]")
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// Reject numeric inputs the bot cannot run with.
    pub fn validate(&self) -> Result<(), BotError> {
        let bot = &self.bot;
        if !bot.usdt_amount.is_finite() || bot.usdt_amount <= 0.0 {
            return Err(BotError::Config(format!(
                "usdt_amount must be positive, got {}",
                bot.usdt_amount
            )));
        }
        if !bot.threshold_percent.is_finite() {
            return Err(BotError::Config("threshold_percent must be a number".into()));
        }
        if !bot.max_deviation_percent.is_finite() || bot.max_deviation_percent <= 0.0 {
            return Err(BotError::Config(format!(
                "max_deviation_percent must be positive, got {}",
                bot.max_deviation_percent
            )));
        }
        if bot.anchor_asset.trim().is_empty() {
            return Err(BotError::Config("anchor_asset must not be empty".into()));
        }
        if bot.cache_triangles && bot.triangle_refresh_ticks == 0 {
            return Err(BotError::Config(
                "triangle_refresh_ticks must be at least 1 when caching".into(),
            ));
        }
        if self.execution.poll_interval_ms == 0 {
            return Err(BotError::Config("poll_interval_ms must be positive".into()));
        }
        if self.exchange.request_timeout_secs == 0 {
            return Err(BotError::Config("request_timeout_secs must be positive".into()));
        }
        Ok(())
    }

    /// Read the API key and secret from the configured env vars.
    pub fn credentials(&self) -> Result<Credentials, BotError> {
        let read = |name: &str| {
            Self::resolve_env(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| BotError::Config(format!("Environment variable not set: {name}")))
        };
        Ok(Credentials {
            api_key: read(&self.exchange.api_key_env)?,
            api_secret: SecretString::new(read(&self.exchange.api_secret_env)?),
        })
    }

    /// Runtime settings for the scan loop.
    pub fn bot_settings(&self) -> Result<BotSettings, BotError> {
        let usdt_amount = Decimal::from_f64(self.bot.usdt_amount)
            .filter(|a| *a > Decimal::ZERO)
            .ok_or_else(|| {
                BotError::Config(format!(
                    "usdt_amount {} is not a valid amount",
                    self.bot.usdt_amount
                ))
            })?;
        Ok(BotSettings {
            usdt_amount,
            scan_interval: Duration::from_secs(self.bot.scan_interval_secs),
            error_backoff: Duration::from_secs(self.bot.error_backoff_secs),
            scan: self.scan_settings(),
            execution: self.execution_settings(),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.exchange.request_timeout_secs)
    }

    pub fn scan_settings(&self) -> ScanSettings {
        ScanSettings {
            anchor: self.bot.anchor_asset.clone(),
            fee_rate: FEE_RATE,
            threshold_percent: self.bot.threshold_percent,
            cache_triangles: self.bot.cache_triangles,
            triangle_refresh_ticks: self.bot.triangle_refresh_ticks,
        }
    }

    pub fn execution_settings(&self) -> ExecutionSettings {
        ExecutionSettings {
            anchor: self.bot.anchor_asset.clone(),
            use_limit_entry: self.bot.use_limit_entry,
            monitor: MonitorSettings {
                poll_interval: Duration::from_millis(self.execution.poll_interval_ms),
                timeout: self.execution.limit_order_timeout_secs.map(Duration::from_secs),
                max_deviation_percent: self.bot.max_deviation_percent,
            },
        }
    }
}
