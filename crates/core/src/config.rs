use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validate::{Setting, SettingSource};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub conversations: ConversationsConfig,
    pub pricing: PricingConfig,
    pub bridge: BridgeConfig,
    pub catalog: CatalogConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ConversationsConfig {
    pub base_url: Option<String>,
    pub api_key: Option<SecretString>,
    pub default_channel_id: Option<String>,
    pub default_channel_account_id: Option<String>,
    pub default_sender_id: Option<String>,
    pub comment_markers: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct PricingConfig {
    pub base_url: Option<String>,
    pub api_key: Option<SecretString>,
    pub default_country: String,
    pub default_currency: String,
}

#[derive(Clone, Debug)]
pub struct BridgeConfig {
    pub timeout_secs: u64,
    pub max_in_flight: usize,
}

#[derive(Clone, Debug, Default)]
pub struct CatalogConfig {
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

/// Base URL and credential of a configured backend.
#[derive(Clone, Debug)]
pub struct Endpoint {
    pub base_url: String,
    pub api_key: SecretString,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub conversations_base_url: Option<String>,
    pub pricing_base_url: Option<String>,
    pub bridge_timeout_secs: Option<u64>,
    pub catalog_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("`{key}` is not configured (set it in toolgate.toml or via `{env}`)")]
    Unconfigured { key: &'static str, env: &'static str },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

pub const DEFAULT_COMMENT_MARKERS: [&str; 2] = ["HANDOFF:", "[comment]"];

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            conversations: ConversationsConfig {
                base_url: None,
                api_key: None,
                default_channel_id: None,
                default_channel_account_id: None,
                default_sender_id: None,
                comment_markers: DEFAULT_COMMENT_MARKERS.iter().map(|m| m.to_string()).collect(),
            },
            pricing: PricingConfig {
                base_url: None,
                api_key: None,
                default_country: "US".to_string(),
                default_currency: "USD".to_string(),
            },
            bridge: BridgeConfig { timeout_secs: 30, max_in_flight: 16 },
            catalog: CatalogConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl ConversationsConfig {
    pub fn endpoint(&self) -> Result<Endpoint, ConfigError> {
        endpoint(
            self.base_url.as_deref(),
            self.api_key.as_ref(),
            ("conversations.base_url", "TOOLGATE_CONVERSATIONS_BASE_URL"),
            ("conversations.api_key", "TOOLGATE_CONVERSATIONS_API_KEY"),
        )
    }
}

impl PricingConfig {
    pub fn endpoint(&self) -> Result<Endpoint, ConfigError> {
        endpoint(
            self.base_url.as_deref(),
            self.api_key.as_ref(),
            ("pricing.base_url", "TOOLGATE_PRICING_BASE_URL"),
            ("pricing.api_key", "TOOLGATE_PRICING_API_KEY"),
        )
    }
}

fn endpoint(
    base_url: Option<&str>,
    api_key: Option<&SecretString>,
    url_key: (&'static str, &'static str),
    api_key_key: (&'static str, &'static str),
) -> Result<Endpoint, ConfigError> {
    let base_url = base_url
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or(ConfigError::Unconfigured { key: url_key.0, env: url_key.1 })?;
    let api_key = api_key
        .filter(|key| !key.expose_secret().trim().is_empty())
        .cloned()
        .ok_or(ConfigError::Unconfigured { key: api_key_key.0, env: api_key_key.1 })?;

    Ok(Endpoint { base_url: base_url.trim_end_matches('/').to_string(), api_key })
}

impl SettingSource for AppConfig {
    fn setting(&self, setting: Setting) -> Option<String> {
        match setting {
            Setting::DefaultChannelId => self.conversations.default_channel_id.clone(),
            Setting::DefaultChannelAccountId => {
                self.conversations.default_channel_account_id.clone()
            }
            Setting::DefaultSenderId => self.conversations.default_sender_id.clone(),
            Setting::DefaultCountry => Some(self.pricing.default_country.clone()),
            Setting::DefaultCurrency => Some(self.pricing.default_currency.clone()),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATHS[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(conversations) = patch.conversations {
            if let Some(base_url) = conversations.base_url {
                self.conversations.base_url = Some(base_url);
            }
            if let Some(api_key) = conversations.api_key {
                self.conversations.api_key = Some(secret_value(api_key));
            }
            if let Some(channel_id) = conversations.default_channel_id {
                self.conversations.default_channel_id = Some(channel_id);
            }
            if let Some(channel_account_id) = conversations.default_channel_account_id {
                self.conversations.default_channel_account_id = Some(channel_account_id);
            }
            if let Some(sender_id) = conversations.default_sender_id {
                self.conversations.default_sender_id = Some(sender_id);
            }
            if let Some(comment_markers) = conversations.comment_markers {
                self.conversations.comment_markers = comment_markers;
            }
        }

        if let Some(pricing) = patch.pricing {
            if let Some(base_url) = pricing.base_url {
                self.pricing.base_url = Some(base_url);
            }
            if let Some(api_key) = pricing.api_key {
                self.pricing.api_key = Some(secret_value(api_key));
            }
            if let Some(country) = pricing.default_country {
                self.pricing.default_country = country;
            }
            if let Some(currency) = pricing.default_currency {
                self.pricing.default_currency = currency;
            }
        }

        if let Some(bridge) = patch.bridge {
            if let Some(timeout_secs) = bridge.timeout_secs {
                self.bridge.timeout_secs = timeout_secs;
            }
            if let Some(max_in_flight) = bridge.max_in_flight {
                self.bridge.max_in_flight = max_in_flight;
            }
        }

        if let Some(catalog) = patch.catalog {
            if let Some(path) = catalog.path {
                self.catalog.path = Some(path);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("TOOLGATE_CONVERSATIONS_BASE_URL") {
            self.conversations.base_url = Some(value);
        }
        if let Some(value) = read_env("TOOLGATE_CONVERSATIONS_API_KEY") {
            self.conversations.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("TOOLGATE_CONVERSATIONS_DEFAULT_CHANNEL_ID") {
            self.conversations.default_channel_id = Some(value);
        }
        if let Some(value) = read_env("TOOLGATE_CONVERSATIONS_DEFAULT_CHANNEL_ACCOUNT_ID") {
            self.conversations.default_channel_account_id = Some(value);
        }
        if let Some(value) = read_env("TOOLGATE_CONVERSATIONS_DEFAULT_SENDER_ID") {
            self.conversations.default_sender_id = Some(value);
        }
        if let Some(value) = read_env("TOOLGATE_CONVERSATIONS_COMMENT_MARKERS") {
            self.conversations.comment_markers = value
                .split(',')
                .map(str::trim)
                .filter(|marker| !marker.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(value) = read_env("TOOLGATE_PRICING_BASE_URL") {
            self.pricing.base_url = Some(value);
        }
        if let Some(value) = read_env("TOOLGATE_PRICING_API_KEY") {
            self.pricing.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("TOOLGATE_PRICING_DEFAULT_COUNTRY") {
            self.pricing.default_country = value;
        }
        if let Some(value) = read_env("TOOLGATE_PRICING_DEFAULT_CURRENCY") {
            self.pricing.default_currency = value;
        }

        if let Some(value) = read_env("TOOLGATE_BRIDGE_TIMEOUT_SECS") {
            self.bridge.timeout_secs = parse_u64("TOOLGATE_BRIDGE_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("TOOLGATE_BRIDGE_MAX_IN_FLIGHT") {
            self.bridge.max_in_flight = parse_usize("TOOLGATE_BRIDGE_MAX_IN_FLIGHT", &value)?;
        }

        if let Some(value) = read_env("TOOLGATE_CATALOG_PATH") {
            self.catalog.path = Some(PathBuf::from(value));
        }

        let log_level =
            read_env("TOOLGATE_LOGGING_LEVEL").or_else(|| read_env("TOOLGATE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("TOOLGATE_LOGGING_FORMAT").or_else(|| read_env("TOOLGATE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(base_url) = overrides.conversations_base_url {
            self.conversations.base_url = Some(base_url);
        }
        if let Some(base_url) = overrides.pricing_base_url {
            self.pricing.base_url = Some(base_url);
        }
        if let Some(timeout_secs) = overrides.bridge_timeout_secs {
            self.bridge.timeout_secs = timeout_secs;
        }
        if let Some(path) = overrides.catalog_path {
            self.catalog.path = Some(path);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_conversations(&self.conversations)?;
        validate_pricing(&self.pricing)?;
        validate_bridge(&self.bridge)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// Files searched, in order, when no explicit config path is given.
pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["toolgate.toml", "config/toolgate.toml"];

/// The config file `load` would read: the explicit path if it exists, otherwise
/// the first existing entry of [`DEFAULT_CONFIG_PATHS`].
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    DEFAULT_CONFIG_PATHS.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_base_url(key: &str, base_url: Option<&str>) -> Result<(), ConfigError> {
    if let Some(url) = base_url.map(str::trim).filter(|url| !url.is_empty()) {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "{key} must start with http:// or https://"
            )));
        }
    }
    Ok(())
}

fn validate_conversations(conversations: &ConversationsConfig) -> Result<(), ConfigError> {
    validate_base_url("conversations.base_url", conversations.base_url.as_deref())?;

    if conversations.comment_markers.iter().any(|marker| marker.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "conversations.comment_markers must not contain empty markers".to_string(),
        ));
    }

    Ok(())
}

fn validate_pricing(pricing: &PricingConfig) -> Result<(), ConfigError> {
    validate_base_url("pricing.base_url", pricing.base_url.as_deref())?;

    if !is_letter_code(&pricing.default_country, 2) {
        return Err(ConfigError::Validation(
            "pricing.default_country must be a two-letter country code (e.g. `US`)".to_string(),
        ));
    }
    if !is_letter_code(&pricing.default_currency, 3) {
        return Err(ConfigError::Validation(
            "pricing.default_currency must be a three-letter currency code (e.g. `USD`)"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_bridge(bridge: &BridgeConfig) -> Result<(), ConfigError> {
    if bridge.timeout_secs == 0 || bridge.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "bridge.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if bridge.max_in_flight == 0 {
        return Err(ConfigError::Validation(
            "bridge.max_in_flight must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn is_letter_code(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|ch| ch.is_ascii_alphabetic())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    conversations: Option<ConversationsPatch>,
    pricing: Option<PricingPatch>,
    bridge: Option<BridgePatch>,
    catalog: Option<CatalogPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ConversationsPatch {
    base_url: Option<String>,
    api_key: Option<String>,
    default_channel_id: Option<String>,
    default_channel_account_id: Option<String>,
    default_sender_id: Option<String>,
    comment_markers: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct PricingPatch {
    base_url: Option<String>,
    api_key: Option<String>,
    default_country: Option<String>,
    default_currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BridgePatch {
    timeout_secs: Option<u64>,
    max_in_flight: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
