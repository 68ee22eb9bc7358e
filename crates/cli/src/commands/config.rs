use std::env;
use std::fs;
use std::path::Path;

use smartcart_core::config::{resolve_config_path, LoadOptions};
use toml::Value;

use crate::commands::{load_config, CommandResult};

const COMMAND: &str = "config";

struct Field {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
    overridden: bool,
}

pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match load_config(COMMAND, options) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let overrides = &options.overrides;

    let fields = [
        Field {
            key: "catalog.path",
            value: config.catalog.path.display().to_string(),
            env_keys: &["SMARTCART_CATALOG_PATH"],
            overridden: overrides.catalog_path.is_some(),
        },
        Field {
            key: "catalog.has_header",
            value: config.catalog.has_header.to_string(),
            env_keys: &["SMARTCART_CATALOG_HAS_HEADER"],
            overridden: false,
        },
        Field {
            key: "artifacts.dir",
            value: config.artifacts.dir.display().to_string(),
            env_keys: &["SMARTCART_ARTIFACTS_DIR"],
            overridden: overrides.artifacts_dir.is_some(),
        },
        Field {
            key: "artifacts.encoder_file",
            value: config.artifacts.encoder_file.clone(),
            env_keys: &["SMARTCART_ARTIFACTS_ENCODER_FILE"],
            overridden: false,
        },
        Field {
            key: "artifacts.scaler_file",
            value: config.artifacts.scaler_file.clone(),
            env_keys: &["SMARTCART_ARTIFACTS_SCALER_FILE"],
            overridden: false,
        },
        Field {
            key: "artifacts.classifier_file",
            value: config.artifacts.classifier_file.clone(),
            env_keys: &["SMARTCART_ARTIFACTS_CLASSIFIER_FILE"],
            overridden: false,
        },
        Field {
            key: "training.max_depth",
            value: config
                .training
                .max_depth
                .map_or_else(|| "<unlimited>".to_string(), |depth| depth.to_string()),
            env_keys: &["SMARTCART_TRAINING_MAX_DEPTH"],
            overridden: false,
        },
        Field {
            key: "training.min_samples_split",
            value: config.training.min_samples_split.to_string(),
            env_keys: &["SMARTCART_TRAINING_MIN_SAMPLES_SPLIT"],
            overridden: false,
        },
        Field {
            key: "recommendation.seed",
            value: config
                .recommendation
                .seed
                .map_or_else(|| "<entropy>".to_string(), |seed| seed.to_string()),
            env_keys: &["SMARTCART_RECOMMENDATION_SEED"],
            overridden: overrides.recommendation_seed.is_some(),
        },
        Field {
            key: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["SMARTCART_LOGGING_LEVEL", "SMARTCART_LOG_LEVEL"],
            overridden: overrides.log_level.is_some(),
        },
        Field {
            key: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["SMARTCART_LOGGING_FORMAT", "SMARTCART_LOG_FORMAT"],
            overridden: overrides.log_format.is_some(),
        },
    ];

    let mut lines = vec![
        "effective config (source precedence: override > env > file > default):".to_string(),
    ];
    for field in &fields {
        let source =
            field_source(field, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(field.key, &field.value, source));
    }

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    field: &Field,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if field.overridden {
        return "override (command line)".to_string();
    }

    let set_env = field
        .env_keys
        .iter()
        .find(|env_key| env::var(env_key).is_ok_and(|value| !value.trim().is_empty()));
    if let Some(env_key) = set_env {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, field.key) {
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
