//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.staybook/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;

use crate::core::pricing::{PricingCalculator, default_nightly_rate, default_service_fee_rate};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct StaybookConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub hotel: HotelConfig,
    #[serde(default)]
    pub feed: FeedConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct BackendConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct HotelConfig {
    pub name: Option<String>,
    pub nightly_rate: Option<Decimal>,
    pub service_fee_rate: Option<Decimal>,
    pub currency: Option<String>,
    pub max_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct FeedConfig {
    pub poll_interval_secs: Option<u64>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_HOTEL_NAME: &str = "Pousada Vale Verde";
pub const DEFAULT_CURRENCY: &str = "R$";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub backend_url: Option<String>,
    pub anon_key: Option<String>,
    pub email: Option<String>,
    pub hotel_name: String,
    pub pricing: PricingCalculator,
    pub currency: String,
    pub max_date: Option<NaiveDate>,
    pub poll_interval: Duration,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns `~/.staybook`.
pub fn app_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".staybook"))
}

/// Returns the path to `~/.staybook/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    app_dir().map(|d| d.join("config.toml"))
}

/// Load config from `~/.staybook/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `StaybookConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<StaybookConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(StaybookConfig::default());
        }
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<StaybookConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(StaybookConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: StaybookConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# staybook configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [backend]
# url = "https://your-project.supabase.co"   # Or STAYBOOK_BACKEND_URL
# anon_key = "eyJhbGciOi..."                 # Or STAYBOOK_ANON_KEY
# email = "you@example.com"                  # Or STAYBOOK_EMAIL / --email
# The password is only read from STAYBOOK_PASSWORD.

# [hotel]
# name = "Pousada Vale Verde"
# nightly_rate = "145.00"
# service_fee_rate = "0.10"
# currency = "R$"
# max_date = "2026-12-31"                    # Last bookable day

# [feed]
# poll_interval_secs = 5
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Values coming from CLI flags (None = not specified).
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub email: Option<String>,
    pub backend_url: Option<String>,
}

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &StaybookConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_with_env(config, cli, |key| std::env::var(key).ok())
}

/// Same as [`resolve`] with an injectable env lookup.
pub fn resolve_with_env(
    config: &StaybookConfig,
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // Backend URL: CLI → env → config
    let backend_url = cli
        .backend_url
        .clone()
        .or_else(|| env("STAYBOOK_BACKEND_URL"))
        .or_else(|| config.backend.url.clone());

    // Anon key: env → config
    let anon_key = env("STAYBOOK_ANON_KEY").or_else(|| config.backend.anon_key.clone());

    // Email: CLI → env → config
    let email = cli
        .email
        .clone()
        .or_else(|| env("STAYBOOK_EMAIL"))
        .or_else(|| config.backend.email.clone());

    let pricing = PricingCalculator::new(
        config.hotel.nightly_rate.unwrap_or_else(default_nightly_rate),
        config
            .hotel
            .service_fee_rate
            .unwrap_or_else(default_service_fee_rate),
    );

    ResolvedConfig {
        backend_url,
        anon_key,
        email,
        hotel_name: config
            .hotel
            .name
            .clone()
            .unwrap_or_else(|| DEFAULT_HOTEL_NAME.to_string()),
        pricing,
        currency: config
            .hotel
            .currency
            .clone()
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        max_date: config.hotel.max_date,
        poll_interval: Duration::from_secs(
            config
                .feed
                .poll_interval_secs
                .unwrap_or(DEFAULT_POLL_INTERVAL_SECS)
                .max(1),
        ),
    }
}
