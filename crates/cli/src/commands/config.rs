use std::env;
use std::fs;
use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use toml::Value;
use toolgate_core::config::{resolve_config_path, AppConfig};

struct Field<'a> {
    key: &'static str,
    env: &'static [&'static str],
    value: &'a str,
}

pub fn run(config: &AppConfig, explicit_path: Option<&Path>) -> String {
    let config_file_path = resolve_config_path(explicit_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let conversations_key = redact_secret(config.conversations.api_key.as_ref());
    let pricing_key = redact_secret(config.pricing.api_key.as_ref());
    let markers = config.conversations.comment_markers.join(", ");
    let timeout = config.bridge.timeout_secs.to_string();
    let max_in_flight = config.bridge.max_in_flight.to_string();
    let catalog_path = config
        .catalog
        .path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<builtin>".to_string());
    let log_format = format!("{:?}", config.logging.format);

    let fields = [
        Field {
            key: "conversations.base_url",
            env: &["TOOLGATE_CONVERSATIONS_BASE_URL"],
            value: config.conversations.base_url.as_deref().unwrap_or("<unset>"),
        },
        Field {
            key: "conversations.api_key",
            env: &["TOOLGATE_CONVERSATIONS_API_KEY"],
            value: &conversations_key,
        },
        Field {
            key: "conversations.default_channel_id",
            env: &["TOOLGATE_CONVERSATIONS_DEFAULT_CHANNEL_ID"],
            value: config.conversations.default_channel_id.as_deref().unwrap_or("<unset>"),
        },
        Field {
            key: "conversations.default_channel_account_id",
            env: &["TOOLGATE_CONVERSATIONS_DEFAULT_CHANNEL_ACCOUNT_ID"],
            value: config
                .conversations
                .default_channel_account_id
                .as_deref()
                .unwrap_or("<unset>"),
        },
        Field {
            key: "conversations.default_sender_id",
            env: &["TOOLGATE_CONVERSATIONS_DEFAULT_SENDER_ID"],
            value: config.conversations.default_sender_id.as_deref().unwrap_or("<unset>"),
        },
        Field {
            key: "conversations.comment_markers",
            env: &["TOOLGATE_CONVERSATIONS_COMMENT_MARKERS"],
            value: &markers,
        },
        Field {
            key: "pricing.base_url",
            env: &["TOOLGATE_PRICING_BASE_URL"],
            value: config.pricing.base_url.as_deref().unwrap_or("<unset>"),
        },
        Field { key: "pricing.api_key", env: &["TOOLGATE_PRICING_API_KEY"], value: &pricing_key },
        Field {
            key: "pricing.default_country",
            env: &["TOOLGATE_PRICING_DEFAULT_COUNTRY"],
            value: &config.pricing.default_country,
        },
        Field {
            key: "pricing.default_currency",
            env: &["TOOLGATE_PRICING_DEFAULT_CURRENCY"],
            value: &config.pricing.default_currency,
        },
        Field {
            key: "bridge.timeout_secs",
            env: &["TOOLGATE_BRIDGE_TIMEOUT_SECS"],
            value: &timeout,
        },
        Field {
            key: "bridge.max_in_flight",
            env: &["TOOLGATE_BRIDGE_MAX_IN_FLIGHT"],
            value: &max_in_flight,
        },
        Field { key: "catalog.path", env: &["TOOLGATE_CATALOG_PATH"], value: &catalog_path },
        Field {
            key: "logging.level",
            env: &["TOOLGATE_LOGGING_LEVEL", "TOOLGATE_LOG_LEVEL"],
            value: &config.logging.level,
        },
        Field {
            key: "logging.format",
            env: &["TOOLGATE_LOGGING_FORMAT", "TOOLGATE_LOG_FORMAT"],
            value: &log_format,
        },
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in &fields {
        let source = field_source(
            field.key,
            field.env,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, field.value, source));
    }

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_secret(secret: Option<&SecretString>) -> String {
    let Some(secret) = secret else {
        return "<unset>".to_string();
    };
    let trimmed = secret.expose_secret().trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
